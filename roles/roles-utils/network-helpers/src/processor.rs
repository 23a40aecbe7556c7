//! Per connection message processing.
//!
//! A [`ConnectionProcessor`] only lets catalog messages through once its noise handshake has
//! completed. Outgoing requests get a correlation id from the [`RequestRegistry`] before they are
//! written, so a response can never arrive before its request is known.
use crate::{
    next_connection_id,
    noise_connection::{Connection, IncomingFrame},
    Error,
};
use async_channel::{Receiver, Sender};
use core::fmt;
use framing_sv2::Sv2Frame;
use handlers_sv2::SendTo;
use noise_sv2::HandshakeRole;
use parsers_sv2::{AnyMessage, IsSv2Message};
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Init,
    AwaitingHandshake,
    Ready,
    Terminated,
}

/// Outstanding requests of one connection, keyed by correlation id.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    next_request_id: u32,
    pending: HashMap<u32, u8>,
}

impl RequestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next correlation id to `request` and records it. Returns `None`, leaving the
    /// message untouched, if it carries no request id.
    pub fn register(&mut self, request: &mut AnyMessage) -> Option<u32> {
        let id = self.next_request_id;
        if !request.set_request_id(id) {
            return None;
        }
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.pending.insert(id, request.message_type());
        Some(id)
    }

    /// Removes a pending request, returning the message type it was sent with.
    pub fn complete(&mut self, request_id: u32) -> Option<u8> {
        self.pending.remove(&request_id)
    }

    pub fn is_pending(&self, request_id: u32) -> bool {
        self.pending.contains_key(&request_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn is_request(message: &AnyMessage) -> bool {
    match message {
        AnyMessage::Mining(m) => m.request_id().is_some() && !m.is_response(),
        AnyMessage::Common(_) => false,
    }
}

fn is_response(message: &AnyMessage) -> bool {
    match message {
        AnyMessage::Mining(m) => m.is_response(),
        AnyMessage::Common(_) => false,
    }
}

#[derive(Debug)]
pub struct ConnectionProcessor {
    uid: u32,
    state: ConnectionState,
    channels: Option<(Receiver<IncomingFrame>, Sender<Sv2Frame>)>,
    requests: RequestRegistry,
}

impl Default for ConnectionProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionProcessor {
    pub fn new() -> Self {
        Self {
            uid: next_connection_id(),
            state: ConnectionState::Init,
            channels: None,
            requests: RequestRegistry::new(),
        }
    }

    /// Runs the handshake on `stream`. The processor is `Ready` on success and `Terminated`
    /// otherwise.
    pub async fn connect<S>(&mut self, stream: S, role: HandshakeRole) -> Result<(), Error>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        if self.state != ConnectionState::Init {
            return Err(Error::ProtocolViolation(format!(
                "connection {} is already {:?}",
                self.uid, self.state
            )));
        }
        self.state = ConnectionState::AwaitingHandshake;
        match Connection::new(stream, role, self.uid).await {
            Ok(channels) => {
                self.channels = Some(channels);
                self.state = ConnectionState::Ready;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Terminated;
                Err(e)
            }
        }
    }

    pub fn uid(&self) -> u32 {
        self.uid
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    /// Raw frame sender, used by tasks that push messages to this connection on their own.
    pub fn sender(&self) -> Result<Sender<Sv2Frame>, Error> {
        match (&self.channels, self.state) {
            (Some((_, sender)), ConnectionState::Ready) => Ok(sender.clone()),
            _ => Err(Error::TransportError(noise_sv2::Error::NotInTransportMode)),
        }
    }

    pub async fn send(&mut self, message: AnyMessage) -> Result<(), Error> {
        let frame = message.to_frame()?;
        let sender = self.sender()?;
        debug!(
            "Connection {}: sending message 0x{:02x}",
            self.uid,
            message.message_type()
        );
        if sender.send(frame).await.is_err() {
            self.state = ConnectionState::Terminated;
            return Err(Error::SocketClosed);
        }
        Ok(())
    }

    /// Assigns a correlation id to `request`, records it and then sends it.
    pub async fn send_request(&mut self, mut request: AnyMessage) -> Result<u32, Error> {
        let id = self.requests.register(&mut request).ok_or_else(|| {
            Error::ProtocolViolation(format!(
                "message 0x{:02x} is not a request",
                request.message_type()
            ))
        })?;
        self.send(request).await?;
        Ok(id)
    }

    /// Sends everything a handler asked for, in order. Requests go through
    /// [`ConnectionProcessor::send_request`].
    pub async fn send_all(&mut self, send_to: SendTo) -> Result<(), Error> {
        for message in send_to.into_messages() {
            if is_request(&message) {
                self.send_request(message).await?;
            } else {
                self.send(message).await?;
            }
        }
        Ok(())
    }

    /// Waits for the next message. Fails with `TransportError` before the handshake completed
    /// and with `SocketClosed` once the peer went away. A datagram that failed to decrypt or to
    /// parse terminates the connection with the reader's error.
    pub async fn receive(&mut self) -> Result<AnyMessage, Error> {
        let frame = match (&self.channels, self.state) {
            (Some((receiver, _)), ConnectionState::Ready) => receiver.recv().await,
            _ => return Err(Error::TransportError(noise_sv2::Error::NotInTransportMode)),
        };
        let frame = match frame {
            Ok(Ok(frame)) => frame,
            Ok(Err(e)) => {
                warn!("Connection {}: terminated: {}", self.uid, e);
                self.close();
                return Err(e);
            }
            Err(_) => {
                info!("Connection {}: terminated", self.uid);
                self.close();
                return Err(Error::SocketClosed);
            }
        };
        let message = AnyMessage::from_frame(&frame)?;
        debug!(
            "Connection {}: received message 0x{:02x}",
            self.uid,
            message.message_type()
        );
        if is_response(&message) {
            if let Some(id) = message.request_id() {
                if self.requests.complete(id).is_none() {
                    return Err(Error::ProtocolViolation(format!(
                        "response 0x{:02x} to unknown request {}",
                        message.message_type(),
                        id
                    )));
                }
            }
        }
        Ok(message)
    }

    /// Receives one message, hands it to `handle` and sends back what the handler returned.
    ///
    /// A handler error is a non fatal `ProtocolViolation`.
    pub async fn process_next<F, E>(&mut self, handle: F) -> Result<(), Error>
    where
        F: FnOnce(AnyMessage) -> Result<SendTo, E>,
        E: fmt::Display,
    {
        let message = self.receive().await?;
        let message_type = message.message_type();
        match handle(message) {
            Ok(send_to) => self.send_all(send_to).await,
            Err(e) => {
                warn!(
                    "Connection {}: message 0x{:02x} not handled: {}",
                    self.uid, message_type, e
                );
                Err(Error::ProtocolViolation(format!(
                    "message 0x{:02x}: {}",
                    message_type, e
                )))
            }
        }
    }

    pub fn close(&mut self) {
        if let Some((receiver, sender)) = self.channels.take() {
            receiver.close();
            sender.close();
        }
        self.state = ConnectionState::Terminated;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use binary_sv2::{Str0255, B032, U256};
    use core::convert::TryInto;
    use mining_sv2::{OpenStandardMiningChannel, OpenStandardMiningChannelSuccess, Target};
    use noise_sv2::{keys::Ed25519SecretKey, Initiator, Responder};
    use std::time::Duration;

    async fn connected_pair() -> (ConnectionProcessor, ConnectionProcessor) {
        let authority = Ed25519SecretKey::generate();
        let initiator = HandshakeRole::Initiator(Box::new(
            Initiator::new(authority.public_key()).unwrap(),
        ));
        let responder = HandshakeRole::Responder(Box::new(
            Responder::new(authority, Duration::from_secs(60)).unwrap(),
        ));
        let (a, b) = tokio::io::duplex(1 << 16);
        let mut downstream = ConnectionProcessor::new();
        let mut upstream = ConnectionProcessor::new();
        let (down, up) = tokio::join!(
            downstream.connect(a, initiator),
            upstream.connect(b, responder)
        );
        down.unwrap();
        up.unwrap();
        (downstream, upstream)
    }

    fn open_channel() -> AnyMessage {
        OpenStandardMiningChannel {
            request_id: 42,
            user_identity: "user".try_into().unwrap(),
            nominal_hash_rate: 1e9,
            max_target: Target::max_value().into(),
        }
        .into()
    }

    fn open_channel_success(request_id: u32) -> AnyMessage {
        OpenStandardMiningChannelSuccess {
            request_id,
            channel_id: 0,
            target: U256::from([0xff; 32]),
            extranonce_prefix: B032::default(),
            group_channel_id: 0,
        }
        .into()
    }

    #[test]
    fn request_ids_start_at_zero() {
        let mut registry = RequestRegistry::new();
        let mut request = open_channel();
        assert_eq!(registry.register(&mut request), Some(0));
        assert_eq!(request.request_id(), Some(0));
        assert_eq!(registry.register(&mut open_channel()), Some(1));

        let mut not_a_request: AnyMessage = mining_sv2::SetTarget {
            channel_id: 0,
            maximum_target: U256::default(),
        }
        .into();
        assert_eq!(registry.register(&mut not_a_request), None);
        assert_eq!(registry.complete(0), Some(0x10));
        assert!(!registry.is_pending(0) && registry.is_pending(1));
    }

    #[tokio::test]
    async fn nothing_is_received_before_the_handshake() {
        let mut processor = ConnectionProcessor::new();
        assert_eq!(processor.state(), ConnectionState::Init);
        let err = processor.receive().await.unwrap_err();
        assert!(matches!(
            err,
            Error::TransportError(noise_sv2::Error::NotInTransportMode)
        ));
    }

    #[tokio::test]
    async fn responses_are_matched_to_requests() {
        let (mut downstream, mut upstream) = connected_pair().await;
        assert_eq!(downstream.state(), ConnectionState::Ready);

        let id = downstream.send_request(open_channel()).await.unwrap();
        assert_eq!(id, 0);
        let received = upstream.receive().await.unwrap();
        assert_eq!(received.request_id(), Some(0));

        upstream.send(open_channel_success(id)).await.unwrap();
        downstream.receive().await.unwrap();
        assert!(downstream.requests().is_empty());

        upstream.send(open_channel_success(5)).await.unwrap();
        let err = downstream.receive().await.unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
        assert!(!err.is_fatal());
        assert_eq!(downstream.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn handler_output_is_sent_back() {
        let (mut downstream, mut upstream) = connected_pair().await;
        downstream.send_request(open_channel()).await.unwrap();
        upstream
            .process_next(|m| -> Result<SendTo, String> {
                let id = m.request_id().unwrap_or_default();
                Ok(SendTo::Respond(open_channel_success(id)))
            })
            .await
            .unwrap();
        let reply = downstream.receive().await.unwrap();
        assert_eq!(reply, open_channel_success(0));

        downstream
            .send(
                mining_sv2::CloseChannel {
                    channel_id: 0,
                    reason_code: Str0255::default(),
                }
                .into(),
            )
            .await
            .unwrap();
        let err = upstream
            .process_next(|_| Err::<SendTo, _>("not supported"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
    }

    /// Connects a processor as initiator to a raw responder, returning the write half and noise
    /// state of the responder so datagrams can be forged on it.
    async fn processor_and_raw_upstream() -> (
        ConnectionProcessor,
        tokio::io::WriteHalf<tokio::io::DuplexStream>,
        noise_sv2::State,
    ) {
        let authority = Ed25519SecretKey::generate();
        let initiator = HandshakeRole::Initiator(Box::new(
            Initiator::new(authority.public_key()).unwrap(),
        ));
        let responder = HandshakeRole::Responder(Box::new(
            Responder::new(authority, Duration::from_secs(60)).unwrap(),
        ));
        let (a, b) = tokio::io::duplex(1 << 16);
        let (mut read_half, mut write_half) = tokio::io::split(b);
        let mut downstream = ConnectionProcessor::new();
        let (down, up) = tokio::join!(
            downstream.connect(a, initiator),
            crate::noise_connection::handshake(&mut read_half, &mut write_half, responder, 1)
        );
        down.unwrap();
        (downstream, write_half, up.unwrap())
    }

    async fn write_ciphertext(
        writer: &mut tokio::io::WriteHalf<tokio::io::DuplexStream>,
        ciphertext: &[u8],
    ) {
        use tokio::io::AsyncWriteExt;
        let datagram = noise_sv2::wrap_datagram(ciphertext).unwrap();
        writer.write_all(&datagram).await.unwrap();
    }

    #[tokio::test]
    async fn tampered_datagram_is_a_transport_error() {
        let (mut downstream, mut writer, mut state) = processor_and_raw_upstream().await;
        let frame = open_channel_success(0).to_frame().unwrap();
        let mut ciphertext = state.encrypt(&frame.serialize()).unwrap();
        ciphertext[0] ^= 0x01;
        write_ciphertext(&mut writer, &ciphertext).await;

        let err = downstream.receive().await.unwrap_err();
        assert!(matches!(err, Error::TransportError(_)));
        assert!(err.is_fatal());
        assert_eq!(downstream.state(), ConnectionState::Terminated);
    }

    #[tokio::test]
    async fn undecodable_frame_is_a_malformed_message() {
        let (mut downstream, mut writer, mut state) = processor_and_raw_upstream().await;
        // shorter than a frame header
        let ciphertext = state.encrypt(&[0x00, 0x00, 0x15]).unwrap();
        write_ciphertext(&mut writer, &ciphertext).await;

        let err = downstream.receive().await.unwrap_err();
        assert!(matches!(err, Error::MalformedMessage(_)));
        assert_eq!(downstream.state(), ConnectionState::Terminated);
    }

    #[tokio::test]
    async fn peer_disconnect_terminates() {
        let (mut downstream, mut upstream) = connected_pair().await;
        upstream.close();
        let err = downstream.receive().await.unwrap_err();
        assert!(matches!(err, Error::SocketClosed));
        assert!(err.is_fatal());
        assert_eq!(downstream.state(), ConnectionState::Terminated);
    }
}
