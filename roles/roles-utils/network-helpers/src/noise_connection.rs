use crate::Error;
use async_channel::{unbounded, Receiver, Sender};
use const_sv2::NOISE_FRAME_HEADER_SIZE;
use framing_sv2::Sv2Frame;
use futures::lock::Mutex;
use noise_sv2::{HandshakeRole, State};
use parsers_sv2::ParserError;
use std::sync::Arc;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    task,
};
use tracing::{debug, error, info};

/// Reads one transport datagram and returns its body. End of stream is `SocketClosed`.
async fn read_datagram<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, Error> {
    let mut header = [0_u8; NOISE_FRAME_HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|_| Error::SocketClosed)?;
    let mut body = vec![0_u8; noise_sv2::datagram_len(header)];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|_| Error::SocketClosed)?;
    Ok(body)
}

async fn write_datagram<W: AsyncWrite + Unpin>(writer: &mut W, body: &[u8]) -> Result<(), Error> {
    let datagram = noise_sv2::wrap_datagram(body).map_err(Error::TransportError)?;
    writer
        .write_all(&datagram)
        .await
        .map_err(|_| Error::SocketClosed)
}

/// Runs the NX handshake. On success the returned state is in transport mode.
pub async fn handshake<R, W>(
    reader: &mut R,
    writer: &mut W,
    role: HandshakeRole,
    conn_uid: u32,
) -> Result<State, Error>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let is_initiator = matches!(role, HandshakeRole::Initiator(_));
    let mut state = State::initialized(role);
    let interrupted = |e: Error| match e {
        Error::SocketClosed => Error::HandshakeInterrupted,
        e => e,
    };

    if is_initiator {
        debug!("Connection {}: initializing as downstream", conn_uid);
        let first = state.step_0().map_err(Error::from_handshake)?;
        write_datagram(writer, &first).await.map_err(interrupted)?;
        debug!("Connection {}: first handshake message sent", conn_uid);
        let second = read_datagram(reader).await.map_err(interrupted)?;
        state.step_2(&second).map_err(Error::from_handshake)?;
        debug!("Connection {}: responder certificate verified", conn_uid);
    } else {
        debug!("Connection {}: initializing as upstream", conn_uid);
        let first = read_datagram(reader).await.map_err(interrupted)?;
        let second = state.step_1(&first).map_err(Error::from_handshake)?;
        write_datagram(writer, &second).await.map_err(interrupted)?;
        debug!("Connection {}: second handshake message sent", conn_uid);
    }
    Ok(state)
}

/// What the reader task delivers: a decrypted frame, or the error that ended the connection.
pub type IncomingFrame = Result<Sv2Frame, Error>;

/// Ends of the frame channels owned by the connection tasks. Closing them tells the owner of
/// the other ends that the connection is gone.
struct ConnectionState {
    sender_incoming: Sender<IncomingFrame>,
    receiver_outgoing: Receiver<Sv2Frame>,
}

impl ConnectionState {
    fn close_all(&self, conn_uid: u32) {
        debug!("Connection {}: closing all channels", conn_uid);
        self.sender_incoming.close();
        self.receiver_outgoing.close();
    }
}

pub struct Connection;

impl Connection {
    /// Runs the handshake on `stream`, then spawns a reader and a writer task.
    ///
    /// Returns the receiver of the decrypted incoming frames and the sender for outgoing frames.
    /// A datagram that can not be decrypted or parsed is delivered as the last item before both
    /// channels are closed. A peer that goes away only closes them.
    pub async fn new<S>(
        stream: S,
        role: HandshakeRole,
        conn_uid: u32,
    ) -> Result<(Receiver<IncomingFrame>, Sender<Sv2Frame>), Error>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);
        let state = match handshake(&mut reader, &mut writer, role, conn_uid).await {
            Ok(state) => state,
            Err(e) => {
                error!("Connection {}: handshake failed: {}", conn_uid, e);
                return Err(e);
            }
        };
        info!("Connection {}: handshake completed", conn_uid);

        let (sender_incoming, receiver_incoming) = unbounded();
        let (sender_outgoing, receiver_outgoing) = unbounded();
        let conn_state = Arc::new(ConnectionState {
            sender_incoming,
            receiver_outgoing,
        });
        Self::spawn_connection_tasks(
            reader,
            writer,
            Arc::new(Mutex::new(state)),
            conn_state,
            conn_uid,
        );

        Ok((receiver_incoming, sender_outgoing))
    }

    fn spawn_connection_tasks<S>(
        mut reader: ReadHalf<S>,
        mut writer: WriteHalf<S>,
        state: Arc<Mutex<State>>,
        conn_state: Arc<ConnectionState>,
        conn_uid: u32,
    ) where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let read_state = state.clone();
        let read_conn_state = conn_state.clone();
        let reader_task = task::spawn(async move {
            loop {
                let res = match read_datagram(&mut reader).await {
                    Ok(ciphertext) => {
                        let plaintext = read_state.lock().await.decrypt(&ciphertext);
                        plaintext
                            .map_err(Error::TransportError)
                            .and_then(|p| {
                                Sv2Frame::from_bytes(&p)
                                    .map_err(|e| Error::MalformedMessage(ParserError::from(e)))
                            })
                    }
                    Err(e) => Err(e),
                };
                match res {
                    Ok(frame) => {
                        if read_conn_state.sender_incoming.send(Ok(frame)).await.is_err() {
                            debug!("Connection {}: receiver dropped", conn_uid);
                            break;
                        }
                    }
                    Err(Error::SocketClosed) => {
                        info!("Connection {}: closed by peer", conn_uid);
                        break;
                    }
                    Err(e) => {
                        error!("Connection {}: read error: {}, shutting down", conn_uid, e);
                        let _ = read_conn_state.sender_incoming.send(Err(e)).await;
                        break;
                    }
                }
            }
            read_conn_state.close_all(conn_uid);
        });

        let reader_abort = reader_task.abort_handle();
        task::spawn(async move {
            while let Ok(frame) = conn_state.receiver_outgoing.recv().await {
                let ciphertext = state.lock().await.encrypt(&frame.serialize());
                let res = match ciphertext {
                    Ok(ciphertext) => write_datagram(&mut writer, &ciphertext).await,
                    Err(e) => Err(Error::TransportError(e)),
                };
                if let Err(e) = res {
                    error!("Connection {}: write error: {}, shutting down", conn_uid, e);
                    break;
                }
            }
            let _ = writer.shutdown().await;
            reader_abort.abort();
            conn_state.close_all(conn_uid);
            info!("Connection {} shut down", conn_uid);
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use noise_sv2::{keys::Ed25519SecretKey, Initiator, Responder};
    use std::time::Duration;

    fn roles(trusted: bool) -> (HandshakeRole, HandshakeRole) {
        let authority = Ed25519SecretKey::generate();
        let pinned = if trusted {
            authority.public_key()
        } else {
            Ed25519SecretKey::generate().public_key()
        };
        (
            HandshakeRole::Initiator(Box::new(Initiator::new(pinned).unwrap())),
            HandshakeRole::Responder(Box::new(
                Responder::new(authority, Duration::from_secs(60)).unwrap(),
            )),
        )
    }

    #[tokio::test]
    async fn frames_cross_the_connection() {
        let (initiator, responder) = roles(true);
        let (a, b) = tokio::io::duplex(1 << 16);
        let (down, up) = tokio::join!(
            Connection::new(a, initiator, 0),
            Connection::new(b, responder, 1)
        );
        let (_down_rx, down_tx) = down.unwrap();
        let (up_rx, _up_tx) = up.unwrap();

        let frame = Sv2Frame::from_message(&7_u32, 0x21, 0, true).unwrap();
        down_tx.send(frame.clone()).await.unwrap();
        assert_eq!(up_rx.recv().await.unwrap().unwrap(), frame);
    }

    #[tokio::test]
    async fn untrusted_responder_never_reaches_transport() {
        let (initiator, responder) = roles(false);
        let (a, b) = tokio::io::duplex(1 << 16);
        let (down, _up) = tokio::join!(
            Connection::new(a, initiator, 0),
            Connection::new(b, responder, 1)
        );
        assert!(matches!(down, Err(Error::UntrustedPeer(_))));
    }

    #[tokio::test]
    async fn peer_gone_before_handshake() {
        let (initiator, _) = roles(true);
        let (a, b) = tokio::io::duplex(1 << 16);
        drop(b);
        let res = Connection::new(a, initiator, 0).await;
        assert!(matches!(res, Err(Error::HandshakeInterrupted)));
    }
}
