use crate::dom::describe;
use tether_client::{Channel, ChannelError};
use web_sys::WebSocket;

pub struct WebSocketChannel {
    socket: WebSocket,
}

impl WebSocketChannel {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

impl Channel for WebSocketChannel {
    fn send(&mut self, message: &str) -> Result<(), ChannelError> {
        match self.socket.ready_state() {
            WebSocket::OPEN => self
                .socket
                .send_with_str(message)
                .map_err(|e| ChannelError::Send(describe(&e))),
            WebSocket::CONNECTING => Err(ChannelError::Send("socket still connecting".to_string())),
            _ => Err(ChannelError::Closed),
        }
    }

    fn close(&mut self) -> Result<(), ChannelError> {
        self.socket
            .close()
            .map_err(|e| ChannelError::Close(describe(&e)))
    }
}
