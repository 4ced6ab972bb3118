// SPDX-FileCopyrightText: 2026 PeerLink Contributors
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Real transport implementation using tungstenite for WebSocket
//! connections. Supports both ws:// (plaintext) and wss:// (TLS via
//! native-tls) relay URLs.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use native_tls::TlsConnector;
use tungstenite::client::IntoClientRequest;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::error::NetworkError;
use super::message::MessageEnvelope;
use super::protocol::{decode_message, encode_message, read_frame_length, FRAME_HEADER_SIZE};
use super::transport::{ConnectionState, Transport, TransportConfig, TransportResult};

/// WebSocket transport for relay communication.
///
/// # Example
///
/// ```ignore
/// use peerlink_core::network::{WebSocketTransport, TransportConfig};
///
/// let mut transport = WebSocketTransport::new();
/// let config = TransportConfig::for_url("wss://relay.example.com");
/// transport.connect(&config)?;
/// ```
pub struct WebSocketTransport {
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    config: TransportConfig,
    state: ConnectionState,
}

impl WebSocketTransport {
    /// Creates a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport {
            socket: None,
            config: TransportConfig::default(),
            state: ConnectionState::Disconnected,
        }
    }

    /// Parses a WebSocket URL into host, port, and TLS flag.
    fn parse_url(url: &str) -> Result<(String, u16, bool), NetworkError> {
        let is_tls = url.starts_with("wss://");
        let url_without_scheme = url
            .strip_prefix("wss://")
            .or_else(|| url.strip_prefix("ws://"))
            .ok_or_else(|| {
                NetworkError::ConnectionFailed(
                    "Invalid URL scheme (expected ws:// or wss://)".into(),
                )
            })?;

        let host_port = url_without_scheme
            .split('/')
            .next()
            .unwrap_or(url_without_scheme);

        let (host, port) = if let Some(colon_pos) = host_port.rfind(':') {
            let host = &host_port[..colon_pos];
            let port_str = &host_port[colon_pos + 1..];
            let port: u16 = port_str.parse().map_err(|_| {
                NetworkError::ConnectionFailed(format!("Invalid port: {}", port_str))
            })?;
            (host.to_string(), port)
        } else {
            let default_port = if is_tls { 443 } else { 80 };
            (host_port.to_string(), default_port)
        };

        Ok((host, port, is_tls))
    }

    fn create_tls_stream(
        host: &str,
        tcp_stream: TcpStream,
    ) -> Result<MaybeTlsStream<TcpStream>, NetworkError> {
        let connector = TlsConnector::new()
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS error: {}", e)))?;
        let tls_stream = connector
            .connect(host, tcp_stream)
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS handshake failed: {}", e)))?;
        Ok(MaybeTlsStream::NativeTls(tls_stream))
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()> {
        if matches!(self.state, ConnectionState::Connected) {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        self.config = config.clone();

        let (host, port, is_tls) = Self::parse_url(&config.server_url)?;
        let addr = format!("{}:{}", host, port);

        let socket_addr = addr
            .to_socket_addrs()
            .map_err(|e| {
                self.state = ConnectionState::Disconnected;
                NetworkError::ConnectionFailed(e.to_string())
            })?
            .next()
            .ok_or_else(|| {
                self.state = ConnectionState::Disconnected;
                NetworkError::ConnectionFailed(format!("Could not resolve {}", addr))
            })?;

        let tcp_stream = TcpStream::connect_timeout(
            &socket_addr,
            Duration::from_millis(config.connect_timeout_ms),
        )
        .map_err(|e| {
            self.state = ConnectionState::Disconnected;
            NetworkError::ConnectionFailed(e.to_string())
        })?;

        tcp_stream
            .set_read_timeout(Some(Duration::from_millis(config.io_timeout_ms)))
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;
        tcp_stream
            .set_write_timeout(Some(Duration::from_millis(config.io_timeout_ms)))
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        let stream: MaybeTlsStream<TcpStream> = if is_tls {
            Self::create_tls_stream(&host, tcp_stream).inspect_err(|_| {
                self.state = ConnectionState::Disconnected;
            })?
        } else {
            MaybeTlsStream::Plain(tcp_stream)
        };

        let request = config
            .server_url
            .as_str()
            .into_client_request()
            .map_err(|e| {
                self.state = ConnectionState::Disconnected;
                NetworkError::ConnectionFailed(format!("Invalid WebSocket request: {}", e))
            })?;

        let (socket, _response) = tungstenite::client(request, stream).map_err(|e| {
            self.state = ConnectionState::Disconnected;
            NetworkError::ConnectionFailed(format!("WebSocket handshake failed: {}", e))
        })?;

        self.socket = Some(socket);
        self.state = ConnectionState::Connected;

        Ok(())
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None); // Ignore errors on close
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state.clone()
    }

    fn send(&mut self, message: &MessageEnvelope) -> TransportResult<()> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;

        let encoded = encode_message(message)?;
        let ws_message = Message::Binary(encoded);

        socket.send(ws_message).map_err(|e| {
            if matches!(
                e,
                tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed
            ) {
                self.state = ConnectionState::Disconnected;
                NetworkError::ConnectionClosed
            } else {
                NetworkError::SendFailed(e.to_string())
            }
        })?;

        socket
            .flush()
            .map_err(|e| NetworkError::SendFailed(format!("Flush failed: {}", e)))?;

        Ok(())
    }

    fn receive(&mut self) -> TransportResult<Option<MessageEnvelope>> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;

        match socket.read() {
            Ok(Message::Binary(data)) => {
                // Data includes the length prefix, skip it
                if data.len() < FRAME_HEADER_SIZE {
                    return Err(NetworkError::InvalidMessage("Frame too short".into()));
                }

                let header: [u8; FRAME_HEADER_SIZE] = data[..FRAME_HEADER_SIZE]
                    .try_into()
                    .map_err(|_| NetworkError::InvalidMessage("Invalid header".into()))?;
                let expected_len = read_frame_length(&header);

                if data.len() - FRAME_HEADER_SIZE != expected_len {
                    return Err(NetworkError::InvalidMessage(format!(
                        "Length mismatch: expected {}, got {}",
                        expected_len,
                        data.len() - FRAME_HEADER_SIZE
                    )));
                }

                let envelope = decode_message(&data[FRAME_HEADER_SIZE..])?;
                Ok(Some(envelope))
            }
            Ok(Message::Ping(data)) => {
                let _ = socket.send(Message::Pong(data));
                Ok(None)
            }
            Ok(Message::Pong(_)) => Ok(None),
            Ok(Message::Close(_)) => {
                self.state = ConnectionState::Disconnected;
                Err(NetworkError::ConnectionClosed)
            }
            Ok(Message::Text(_)) => Err(NetworkError::InvalidMessage(
                "Unexpected text message".into(),
            )),
            Ok(Message::Frame(_)) => Ok(None),
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // No message available before the read timeout
                Ok(None)
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                self.state = ConnectionState::Disconnected;
                Err(NetworkError::ConnectionClosed)
            }
            Err(e) => Err(NetworkError::ReceiveFailed(e.to_string())),
        }
    }

    fn has_pending(&self) -> bool {
        // The underlying socket gives no cheap peek; callers poll receive()
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_variants() {
        assert_eq!(
            WebSocketTransport::parse_url("ws://localhost:8080").unwrap(),
            ("localhost".to_string(), 8080, false)
        );
        assert_eq!(
            WebSocketTransport::parse_url("wss://relay.example.com").unwrap(),
            ("relay.example.com".to_string(), 443, true)
        );
        assert_eq!(
            WebSocketTransport::parse_url("ws://relay.example.com/socket").unwrap(),
            ("relay.example.com".to_string(), 80, false)
        );
        assert!(WebSocketTransport::parse_url("http://example.com").is_err());
    }

    #[test]
    fn test_send_without_connection_fails() {
        use crate::network::message::{RelayPayload, Register};
        use crate::network::protocol::create_envelope;

        let mut transport = WebSocketTransport::new();
        let envelope = create_envelope(RelayPayload::Register(Register {
            user_id: "a1".into(),
        }));

        assert!(matches!(
            transport.send(&envelope),
            Err(NetworkError::NotConnected)
        ));
    }
}
