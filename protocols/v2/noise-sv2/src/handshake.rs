// NX handshake on top of `snow`.
//
// ```txt
// initiator                         responder
//   step_0  --  -> e  ------------------>
//                                     step_1
//           <-  e, ee, s, es, [cert] --
//   step_2
// ```
//
// The responder proves it owns a static key certified by the pool authority by sending a
// `SignatureNoiseMessage` as the encrypted payload of the second message. The initiator checks
// it against the static key the handshake actually authenticated.
use crate::{
    auth::SignatureNoiseMessage,
    error::{Error, Result},
    keys::{Ed25519PublicKey, Ed25519SecretKey},
    NoiseCodec,
};
use const_sv2::{NOISE_FRAME_MAX_SIZE, NOISE_PARAMS};
use core::{convert::TryFrom, time::Duration};
use snow::{params::NoiseParams, Builder, HandshakeState};
use std::time::SystemTime;

fn noise_params() -> Result<NoiseParams> {
    Ok(NOISE_PARAMS.parse()?)
}

pub struct Initiator {
    handshake: HandshakeState,
    authority_public_key: Ed25519PublicKey,
}

impl std::fmt::Debug for Initiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Initiator")
            .field("authority_public_key", &self.authority_public_key.to_string())
            .finish()
    }
}

impl Initiator {
    /// Initiator that only trusts responders certified by `authority_public_key`.
    pub fn new(authority_public_key: Ed25519PublicKey) -> Result<Self> {
        let handshake = Builder::new(noise_params()?).build_initiator()?;
        Ok(Self {
            handshake,
            authority_public_key,
        })
    }

    /// Produces the first handshake message.
    pub fn step_0(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0_u8; NOISE_FRAME_MAX_SIZE];
        let len = self.handshake.write_message(&[], &mut buf)?;
        buf.truncate(len);
        Ok(buf)
    }

    /// Consumes the responder message, verifies its certificate and switches to transport mode.
    pub fn step_2(self, message: &[u8]) -> Result<NoiseCodec> {
        self.step_2_with_now(message, SystemTime::now())
    }

    pub fn step_2_with_now(mut self, message: &[u8], now: SystemTime) -> Result<NoiseCodec> {
        let mut payload = vec![0_u8; NOISE_FRAME_MAX_SIZE];
        let len = self.handshake.read_message(message, &mut payload)?;
        let certificate = SignatureNoiseMessage::try_from(&payload[..len])?;
        let remote_static = self
            .handshake
            .get_remote_static()
            .ok_or(Error::MissingRemoteStatic)?;
        certificate.verify(remote_static, &self.authority_public_key, now)?;
        Ok(NoiseCodec::new(self.handshake.into_transport_mode()?))
    }
}

pub struct Responder {
    handshake: HandshakeState,
    static_public_key: Vec<u8>,
    authority: Ed25519SecretKey,
    cert_validity: Duration,
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("cert_validity", &self.cert_validity)
            .finish()
    }
}

impl Responder {
    /// Responder with a fresh static key certified by `authority` for `cert_validity`.
    pub fn new(authority: Ed25519SecretKey, cert_validity: Duration) -> Result<Self> {
        let builder = Builder::new(noise_params()?);
        let static_keypair = builder.generate_keypair()?;
        let handshake = builder
            .local_private_key(&static_keypair.private)
            .build_responder()?;
        Ok(Self {
            handshake,
            static_public_key: static_keypair.public,
            authority,
            cert_validity,
        })
    }

    /// Consumes the initiator message and returns the reply together with the transport codec.
    pub fn step_1(mut self, message: &[u8]) -> Result<(Vec<u8>, NoiseCodec)> {
        let mut payload = vec![0_u8; NOISE_FRAME_MAX_SIZE];
        let read = self.handshake.read_message(message, &mut payload)?;
        if read != 0 {
            return Err(Error::InvalidMessageLength(read));
        }
        let certificate = SignatureNoiseMessage::sign(
            &self.static_public_key,
            &self.authority,
            self.cert_validity,
        )?;
        let mut buf = vec![0_u8; NOISE_FRAME_MAX_SIZE];
        let len = self
            .handshake
            .write_message(&certificate.serialize_to_vec(), &mut buf)?;
        buf.truncate(len);
        Ok((buf, NoiseCodec::new(self.handshake.into_transport_mode()?)))
    }
}

#[derive(Debug)]
pub enum HandshakeRole {
    Initiator(Box<Initiator>),
    Responder(Box<Responder>),
}

/// Noise state of one connection. The handshake state is consumed exactly once: after a
/// successful step the state is `Transport`, after a failed one it is `NotInitialized`.
#[derive(Debug)]
pub enum State {
    NotInitialized,
    HandShake(HandshakeRole),
    Transport(NoiseCodec),
}

impl State {
    pub fn initialized(role: HandshakeRole) -> Self {
        Self::HandShake(role)
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Initiator only: first handshake message.
    pub fn step_0(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::HandShake(HandshakeRole::Initiator(initiator)) => initiator.step_0(),
            _ => Err(Error::InvalidState),
        }
    }

    /// Responder only: reply to the first message and switch to transport mode.
    pub fn step_1(&mut self, message: &[u8]) -> Result<Vec<u8>> {
        match std::mem::replace(self, Self::NotInitialized) {
            Self::HandShake(HandshakeRole::Responder(responder)) => {
                let (reply, codec) = (*responder).step_1(message)?;
                *self = Self::Transport(codec);
                Ok(reply)
            }
            other => {
                *self = other;
                Err(Error::InvalidState)
            }
        }
    }

    /// Initiator only: verify the responder and switch to transport mode.
    pub fn step_2(&mut self, message: &[u8]) -> Result<()> {
        match std::mem::replace(self, Self::NotInitialized) {
            Self::HandShake(HandshakeRole::Initiator(initiator)) => {
                *self = Self::Transport((*initiator).step_2(message)?);
                Ok(())
            }
            other => {
                *self = other;
                Err(Error::InvalidState)
            }
        }
    }

    pub fn encrypt(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Transport(codec) => codec.encrypt(plaintext),
            _ => Err(Error::NotInTransportMode),
        }
    }

    pub fn decrypt(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Transport(codec) => codec.decrypt(ciphertext),
            _ => Err(Error::NotInTransportMode),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const VALIDITY: Duration = Duration::from_secs(3600);

    fn roles() -> (Initiator, Responder) {
        let authority = Ed25519SecretKey::generate();
        let initiator =
            Initiator::new(authority.public_key()).expect("BUG: cannot build initiator");
        let responder = Responder::new(authority, VALIDITY).expect("BUG: cannot build responder");
        (initiator, responder)
    }

    #[test]
    fn handshake_and_transport() {
        let (mut initiator, responder) = roles();
        let first = initiator.step_0().expect("BUG: step 0 failed");
        let (second, mut responder_codec) = responder.step_1(&first).expect("BUG: step 1 failed");
        let mut initiator_codec = initiator.step_2(&second).expect("BUG: step 2 failed");

        let ciphertext = initiator_codec.encrypt(b"setup").expect("BUG: encrypt");
        assert_eq!(ciphertext.len(), 5 + const_sv2::SNOW_TAGLEN);
        assert_eq!(responder_codec.decrypt(&ciphertext).expect("BUG: decrypt"), b"setup");

        let ciphertext = responder_codec.encrypt(b"success").expect("BUG: encrypt");
        assert_eq!(initiator_codec.decrypt(&ciphertext).expect("BUG: decrypt"), b"success");
    }

    #[test]
    fn untrusted_authority_is_rejected() {
        let mut initiator = Initiator::new(Ed25519SecretKey::generate().public_key())
            .expect("BUG: cannot build initiator");
        let responder = Responder::new(Ed25519SecretKey::generate(), VALIDITY)
            .expect("BUG: cannot build responder");
        let first = initiator.step_0().expect("BUG: step 0 failed");
        let (second, _) = responder.step_1(&first).expect("BUG: step 1 failed");
        let err = initiator.step_2(&second).expect_err("BUG: untrusted responder accepted");
        assert!(err.is_untrusted_peer(), "unexpected error {}", err);
    }

    #[test]
    fn expired_certificate_is_rejected() {
        let (mut initiator, responder) = roles();
        let first = initiator.step_0().expect("BUG: step 0 failed");
        let (second, _) = responder.step_1(&first).expect("BUG: step 1 failed");
        let later = SystemTime::now() + VALIDITY + Duration::from_secs(1);
        let err = initiator
            .step_2_with_now(&second, later)
            .expect_err("BUG: expired certificate accepted");
        assert!(matches!(err, Error::CertificateExpired(..)));
    }

    #[test]
    fn truncated_handshake_message() {
        let (mut initiator, responder) = roles();
        let first = initiator.step_0().expect("BUG: step 0 failed");
        assert!(matches!(
            responder.step_1(&first[..first.len() - 1]),
            Err(Error::Snow(_))
        ));
    }

    #[test]
    fn state_is_gated_until_transport() {
        let (initiator, responder) = roles();
        let mut initiator = State::initialized(HandshakeRole::Initiator(Box::new(initiator)));
        let mut responder = State::initialized(HandshakeRole::Responder(Box::new(responder)));

        assert!(matches!(initiator.decrypt(&[0; 32]), Err(Error::NotInTransportMode)));
        assert!(matches!(responder.encrypt(b"early"), Err(Error::NotInTransportMode)));
        assert!(matches!(responder.step_0(), Err(Error::InvalidState)));

        let first = initiator.step_0().expect("BUG: step 0 failed");
        let second = responder.step_1(&first).expect("BUG: step 1 failed");
        assert!(responder.is_transport());
        initiator.step_2(&second).expect("BUG: step 2 failed");
        assert!(initiator.is_transport());

        let ciphertext = initiator.encrypt(b"hello").expect("BUG: encrypt");
        assert_eq!(responder.decrypt(&ciphertext).expect("BUG: decrypt"), b"hello");
        // A consumed handshake can not be stepped again
        assert!(matches!(initiator.step_2(&second), Err(Error::InvalidState)));
    }

    #[test]
    fn failed_handshake_is_not_reused() {
        let (initiator, _) = roles();
        let mut state = State::initialized(HandshakeRole::Initiator(Box::new(initiator)));
        assert!(state.step_2(&[1, 2, 3]).is_err());
        assert!(matches!(state, State::NotInitialized));
    }
}
