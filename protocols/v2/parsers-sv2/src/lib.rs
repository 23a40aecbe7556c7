//! The message catalog: turns `(message type, payload)` pairs into typed Sv2 messages and typed
//! messages back into [`Sv2Frame`]s.
//!
//! Every message knows its type tag and its channel bit. When a message is parsed from a frame
//! the channel bit in the header must agree with the catalog, a frame that disagrees is
//! malformed.
mod error;

pub use error::ParserError;

use binary_sv2::{from_bytes, Encodable, GetSize};
use common_messages_sv2::{
    ChannelEndpointChanged, SetupConnection, SetupConnectionError, SetupConnectionSuccess,
};
use const_sv2::*;
use core::convert::TryFrom;
use framing_sv2::Sv2Frame;
use mining_sv2::{
    CloseChannel, NewExtendedMiningJob, NewMiningJob, OpenExtendedMiningChannel,
    OpenExtendedMiningChannelSuccess, OpenMiningChannelError, OpenStandardMiningChannel,
    OpenStandardMiningChannelSuccess, Reconnect, SetCustomMiningJob, SetCustomMiningJobError,
    SetCustomMiningJobSuccess, SetExtranoncePrefix, SetGroupChannel, SetNewPrevHash, SetTarget,
    SubmitSharesError, SubmitSharesExtended, SubmitSharesStandard, SubmitSharesSuccess,
    UpdateChannel, UpdateChannelError,
};

/// Type tag and channel bit of a message
pub trait IsSv2Message {
    fn message_type(&self) -> u8;
    fn channel_bit(&self) -> bool;
}

macro_rules! impl_catalog {
    (
        $(#[$doc:meta])*
        $parser:ident, $types:ident, AnyMessage::$any:ident {
            $($variant:ident = ($tag:ident, $bit:ident),)*
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub enum $parser {
            $($variant($variant),)*
        }

        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        #[allow(clippy::enum_variant_names)]
        pub enum $types {
            $($variant = $tag,)*
        }

        impl $types {
            pub fn channel_bit(self) -> bool {
                match self {
                    $($types::$variant => $bit,)*
                }
            }
        }

        impl TryFrom<u8> for $types {
            type Error = ParserError;

            fn try_from(v: u8) -> Result<Self, ParserError> {
                $(
                    if v == $tag {
                        return Ok($types::$variant);
                    }
                )*
                Err(ParserError::UnexpectedMessage(v))
            }
        }

        impl IsSv2Message for $parser {
            fn message_type(&self) -> u8 {
                match self {
                    $($parser::$variant(_) => $tag,)*
                }
            }

            fn channel_bit(&self) -> bool {
                match self {
                    $($parser::$variant(_) => $bit,)*
                }
            }
        }

        impl<'a> TryFrom<(u8, &'a [u8])> for $parser {
            type Error = ParserError;

            fn try_from(v: (u8, &'a [u8])) -> Result<Self, Self::Error> {
                match $types::try_from(v.0)? {
                    $($types::$variant => Ok($parser::$variant(from_bytes(v.1)?)),)*
                }
            }
        }

        impl GetSize for $parser {
            fn get_size(&self) -> usize {
                match self {
                    $($parser::$variant(m) => m.get_size(),)*
                }
            }
        }

        impl Encodable for $parser {
            fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), binary_sv2::Error> {
                match self {
                    $($parser::$variant(m) => m.encode_to(dst),)*
                }
            }
        }

        $(
            impl From<$variant> for $parser {
                fn from(v: $variant) -> Self {
                    $parser::$variant(v)
                }
            }

            impl From<$variant> for AnyMessage {
                fn from(v: $variant) -> Self {
                    AnyMessage::$any($parser::$variant(v))
                }
            }
        )*
    };
}

impl_catalog!(
    /// Messages shared by every sub-protocol
    CommonMessages, CommonMessageTypes, AnyMessage::Common {
        SetupConnection = (MESSAGE_TYPE_SETUP_CONNECTION, CHANNEL_BIT_SETUP_CONNECTION),
        SetupConnectionSuccess = (
            MESSAGE_TYPE_SETUP_CONNECTION_SUCCESS,
            CHANNEL_BIT_SETUP_CONNECTION_SUCCESS
        ),
        SetupConnectionError = (
            MESSAGE_TYPE_SETUP_CONNECTION_ERROR,
            CHANNEL_BIT_SETUP_CONNECTION_ERROR
        ),
        ChannelEndpointChanged = (
            MESSAGE_TYPE_CHANNEL_ENDPOINT_CHANGED,
            CHANNEL_BIT_CHANNEL_ENDPOINT_CHANGED
        ),
    }
);

impl_catalog!(
    /// Messages of the mining sub-protocol
    Mining, MiningTypes, AnyMessage::Mining {
        OpenStandardMiningChannel = (
            MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL,
            CHANNEL_BIT_OPEN_STANDARD_MINING_CHANNEL
        ),
        OpenStandardMiningChannelSuccess = (
            MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL_SUCCESS,
            CHANNEL_BIT_OPEN_STANDARD_MINING_CHANNEL_SUCCESS
        ),
        OpenMiningChannelError = (
            MESSAGE_TYPE_OPEN_MINING_CHANNEL_ERROR,
            CHANNEL_BIT_OPEN_MINING_CHANNEL_ERROR
        ),
        OpenExtendedMiningChannel = (
            MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL,
            CHANNEL_BIT_OPEN_EXTENDED_MINING_CHANNEL
        ),
        OpenExtendedMiningChannelSuccess = (
            MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL_SUCCESS,
            CHANNEL_BIT_OPEN_EXTENDED_MINING_CHANNEL_SUCCESS
        ),
        UpdateChannel = (MESSAGE_TYPE_UPDATE_CHANNEL, CHANNEL_BIT_UPDATE_CHANNEL),
        UpdateChannelError = (MESSAGE_TYPE_UPDATE_CHANNEL_ERROR, CHANNEL_BIT_UPDATE_CHANNEL_ERROR),
        CloseChannel = (MESSAGE_TYPE_CLOSE_CHANNEL, CHANNEL_BIT_CLOSE_CHANNEL),
        SetExtranoncePrefix = (
            MESSAGE_TYPE_SET_EXTRANONCE_PREFIX,
            CHANNEL_BIT_SET_EXTRANONCE_PREFIX
        ),
        SubmitSharesStandard = (
            MESSAGE_TYPE_SUBMIT_SHARES_STANDARD,
            CHANNEL_BIT_SUBMIT_SHARES_STANDARD
        ),
        SubmitSharesExtended = (
            MESSAGE_TYPE_SUBMIT_SHARES_EXTENDED,
            CHANNEL_BIT_SUBMIT_SHARES_EXTENDED
        ),
        SubmitSharesSuccess = (
            MESSAGE_TYPE_SUBMIT_SHARES_SUCCESS,
            CHANNEL_BIT_SUBMIT_SHARES_SUCCESS
        ),
        SubmitSharesError = (MESSAGE_TYPE_SUBMIT_SHARES_ERROR, CHANNEL_BIT_SUBMIT_SHARES_ERROR),
        NewMiningJob = (MESSAGE_TYPE_NEW_MINING_JOB, CHANNEL_BIT_NEW_MINING_JOB),
        NewExtendedMiningJob = (
            MESSAGE_TYPE_NEW_EXTENDED_MINING_JOB,
            CHANNEL_BIT_NEW_EXTENDED_MINING_JOB
        ),
        SetNewPrevHash = (MESSAGE_TYPE_SET_NEW_PREV_HASH, CHANNEL_BIT_SET_NEW_PREV_HASH),
        SetTarget = (MESSAGE_TYPE_SET_TARGET, CHANNEL_BIT_SET_TARGET),
        SetCustomMiningJob = (
            MESSAGE_TYPE_SET_CUSTOM_MINING_JOB,
            CHANNEL_BIT_SET_CUSTOM_MINING_JOB
        ),
        SetCustomMiningJobSuccess = (
            MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_SUCCESS,
            CHANNEL_BIT_SET_CUSTOM_MINING_JOB_SUCCESS
        ),
        SetCustomMiningJobError = (
            MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_ERROR,
            CHANNEL_BIT_SET_CUSTOM_MINING_JOB_ERROR
        ),
        Reconnect = (MESSAGE_TYPE_RECONNECT, CHANNEL_BIT_RECONNECT),
        SetGroupChannel = (MESSAGE_TYPE_SET_GROUP_CHANNEL, CHANNEL_BIT_SET_GROUP_CHANNEL),
    }
);

impl Mining {
    /// Correlation id of request/response messages, `None` for every other message.
    pub fn request_id(&self) -> Option<u32> {
        match self {
            Mining::OpenStandardMiningChannel(m) => Some(m.request_id),
            Mining::OpenStandardMiningChannelSuccess(m) => Some(m.request_id),
            Mining::OpenExtendedMiningChannel(m) => Some(m.request_id),
            Mining::OpenExtendedMiningChannelSuccess(m) => Some(m.request_id),
            Mining::OpenMiningChannelError(m) => Some(m.request_id),
            Mining::SetCustomMiningJob(m) => Some(m.request_id),
            Mining::SetCustomMiningJobSuccess(m) => Some(m.request_id),
            Mining::SetCustomMiningJobError(m) => Some(m.request_id),
            _ => None,
        }
    }

    /// Overwrites the correlation id. Returns false if the message does not carry one.
    pub fn set_request_id(&mut self, id: u32) -> bool {
        let request_id = match self {
            Mining::OpenStandardMiningChannel(m) => &mut m.request_id,
            Mining::OpenStandardMiningChannelSuccess(m) => &mut m.request_id,
            Mining::OpenExtendedMiningChannel(m) => &mut m.request_id,
            Mining::OpenExtendedMiningChannelSuccess(m) => &mut m.request_id,
            Mining::OpenMiningChannelError(m) => &mut m.request_id,
            Mining::SetCustomMiningJob(m) => &mut m.request_id,
            Mining::SetCustomMiningJobSuccess(m) => &mut m.request_id,
            Mining::SetCustomMiningJobError(m) => &mut m.request_id,
            _ => return false,
        };
        *request_id = id;
        true
    }

    /// True for messages that answer a request, their id must match a pending request.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Mining::OpenStandardMiningChannelSuccess(_)
                | Mining::OpenExtendedMiningChannelSuccess(_)
                | Mining::OpenMiningChannelError(_)
                | Mining::SetCustomMiningJobSuccess(_)
                | Mining::SetCustomMiningJobError(_)
        )
    }
}

/// Any message of the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum AnyMessage {
    Common(CommonMessages),
    Mining(Mining),
}

impl AnyMessage {
    /// Channel bit the catalog assigns to `msg_type`.
    pub fn channel_bit_of(msg_type: u8) -> Result<bool, ParserError> {
        match CommonMessageTypes::try_from(msg_type) {
            Ok(t) => Ok(t.channel_bit()),
            Err(_) => Ok(MiningTypes::try_from(msg_type)?.channel_bit()),
        }
    }

    /// Parses the payload of `frame`. The tag must be known and the header channel bit must
    /// match the catalog.
    pub fn from_frame(frame: &Sv2Frame) -> Result<Self, ParserError> {
        let header = frame.header();
        let msg_type = header.msg_type();
        if Self::channel_bit_of(msg_type)? != header.channel_msg() {
            return Err(ParserError::ChannelBitMismatch(
                msg_type,
                header.channel_msg(),
            ));
        }
        Self::try_from((msg_type, frame.payload()))
    }

    /// Encodes the message in a frame with the catalog channel bit and no extension.
    pub fn to_frame(&self) -> Result<Sv2Frame, ParserError> {
        Ok(Sv2Frame::from_message(
            self,
            self.message_type(),
            EXTENSION_TYPE_NO_EXTENSION,
            self.channel_bit(),
        )?)
    }

    pub fn request_id(&self) -> Option<u32> {
        match self {
            AnyMessage::Common(_) => None,
            AnyMessage::Mining(m) => m.request_id(),
        }
    }

    pub fn set_request_id(&mut self, id: u32) -> bool {
        match self {
            AnyMessage::Common(_) => false,
            AnyMessage::Mining(m) => m.set_request_id(id),
        }
    }
}

impl IsSv2Message for AnyMessage {
    fn message_type(&self) -> u8 {
        match self {
            AnyMessage::Common(m) => m.message_type(),
            AnyMessage::Mining(m) => m.message_type(),
        }
    }

    fn channel_bit(&self) -> bool {
        match self {
            AnyMessage::Common(m) => m.channel_bit(),
            AnyMessage::Mining(m) => m.channel_bit(),
        }
    }
}

impl<'a> TryFrom<(u8, &'a [u8])> for AnyMessage {
    type Error = ParserError;

    fn try_from(v: (u8, &'a [u8])) -> Result<Self, Self::Error> {
        if CommonMessageTypes::try_from(v.0).is_ok() {
            Ok(AnyMessage::Common(CommonMessages::try_from(v)?))
        } else {
            Ok(AnyMessage::Mining(Mining::try_from(v)?))
        }
    }
}

impl From<CommonMessages> for AnyMessage {
    fn from(v: CommonMessages) -> Self {
        AnyMessage::Common(v)
    }
}

impl From<Mining> for AnyMessage {
    fn from(v: Mining) -> Self {
        AnyMessage::Mining(v)
    }
}

impl GetSize for AnyMessage {
    fn get_size(&self) -> usize {
        match self {
            AnyMessage::Common(m) => m.get_size(),
            AnyMessage::Mining(m) => m.get_size(),
        }
    }
}

impl Encodable for AnyMessage {
    fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), binary_sv2::Error> {
        match self {
            AnyMessage::Common(m) => m.encode_to(dst),
            AnyMessage::Mining(m) => m.encode_to(dst),
        }
    }
}

impl TryFrom<AnyMessage> for Sv2Frame {
    type Error = ParserError;

    fn try_from(v: AnyMessage) -> Result<Self, ParserError> {
        v.to_frame()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use binary_sv2::{u256_from_int, Seq0255, Str0255, B032, U256};
    use common_messages_sv2::Protocol;
    use core::convert::TryInto;
    use std::collections::BTreeSet;

    fn setup_connection() -> AnyMessage {
        SetupConnection {
            protocol: Protocol::MiningProtocol,
            min_version: 2,
            max_version: 2,
            flags: 0,
            endpoint_host: "0.0.0.0".try_into().unwrap(),
            endpoint_port: 8545,
            vendor: "sim".try_into().unwrap(),
            hardware_version: Str0255::default(),
            firmware: Str0255::default(),
            device_id: "device".try_into().unwrap(),
        }
        .into()
    }

    fn submit() -> AnyMessage {
        SubmitSharesStandard {
            channel_id: 3,
            sequence_number: 0,
            job_id: 1,
            nonce: 0xdead_beef,
            ntime: 1,
            version: 2,
        }
        .into()
    }

    fn through_frame(message: &AnyMessage) -> AnyMessage {
        let frame = message.to_frame().unwrap();
        let frame = Sv2Frame::from_bytes(&frame.serialize()).unwrap();
        AnyMessage::from_frame(&frame).unwrap()
    }

    #[test]
    fn messages_survive_frames() {
        let messages: Vec<AnyMessage> = vec![
            setup_connection(),
            SetupConnectionSuccess {
                used_version: 2,
                flags: 0,
            }
            .into(),
            submit(),
            NewMiningJob {
                channel_id: 3,
                job_id: 1,
                future_job: true,
                version: 2,
                merkle_root: u256_from_int(7_u32),
            }
            .into(),
            SetTarget {
                channel_id: 3,
                maximum_target: [0xff; 32].into(),
            }
            .into(),
            OpenMiningChannelError::new_max_target_out_of_range(9).into(),
        ];
        for message in messages {
            assert_eq!(through_frame(&message), message);
        }
    }

    fn bytes<T: TryFrom<Vec<u8>>>(len: usize) -> T
    where
        T::Error: core::fmt::Debug,
    {
        T::try_from(vec![0xab; len]).unwrap()
    }

    fn string(len: usize) -> Str0255 {
        "x".repeat(len).try_into().unwrap()
    }

    /// One message per catalog entry, filled with the limits of their field types.
    fn whole_catalog() -> Vec<AnyMessage> {
        let max = U256::from([0xff; 32]);
        vec![
            SetupConnection {
                protocol: Protocol::MiningProtocol,
                min_version: 0,
                max_version: u16::MAX,
                flags: u32::MAX,
                endpoint_host: string(255),
                endpoint_port: u16::MAX,
                vendor: string(0),
                hardware_version: string(1),
                firmware: string(254),
                device_id: string(255),
            }
            .into(),
            SetupConnectionSuccess {
                used_version: 2,
                flags: u32::MAX,
            }
            .into(),
            SetupConnectionError {
                flags: 0,
                error_code: string(255),
            }
            .into(),
            ChannelEndpointChanged {
                channel_id: u32::MAX,
            }
            .into(),
            OpenStandardMiningChannel {
                request_id: u32::MAX,
                user_identity: string(255),
                nominal_hash_rate: f32::MAX,
                max_target: max,
            }
            .into(),
            OpenStandardMiningChannelSuccess {
                request_id: 1,
                channel_id: 2,
                target: max,
                extranonce_prefix: bytes(32),
                group_channel_id: u32::MAX,
            }
            .into(),
            OpenMiningChannelError {
                request_id: 0,
                error_code: string(0),
            }
            .into(),
            OpenExtendedMiningChannel {
                request_id: 3,
                user_identity: string(0),
                nominal_hash_rate: 0.0,
                max_target: U256::default(),
                min_extranonce_size: u16::MAX,
            }
            .into(),
            OpenExtendedMiningChannelSuccess {
                request_id: 3,
                channel_id: 4,
                target: max,
                extranonce_size: 16,
                extranonce_prefix: bytes(0),
            }
            .into(),
            UpdateChannel {
                channel_id: 4,
                nominal_hash_rate: 1.5e12,
                maximum_target: max,
            }
            .into(),
            UpdateChannelError {
                channel_id: 4,
                error_code: string(255),
            }
            .into(),
            CloseChannel {
                channel_id: u32::MAX,
                reason_code: string(255),
            }
            .into(),
            SetExtranoncePrefix {
                channel_id: 4,
                extranonce_prefix: bytes(32),
            }
            .into(),
            SubmitSharesStandard {
                channel_id: u32::MAX,
                sequence_number: u32::MAX,
                job_id: u32::MAX,
                nonce: u32::MAX,
                ntime: u32::MAX,
                version: u32::MAX,
            }
            .into(),
            SubmitSharesExtended {
                channel_id: 4,
                sequence_number: 0,
                job_id: 1,
                nonce: 2,
                ntime: 3,
                version: 4,
                extranonce: bytes(32),
            }
            .into(),
            SubmitSharesSuccess {
                channel_id: 4,
                last_sequence_number: 9,
                new_submits_accepted_count: 3,
                new_shares_sum: u32::MAX,
            }
            .into(),
            SubmitSharesError::new(4, 9, SubmitSharesError::stale_share_error_code()).into(),
            NewMiningJob {
                channel_id: 4,
                job_id: 0,
                future_job: false,
                version: 0x2000_0000,
                merkle_root: max,
            }
            .into(),
            NewExtendedMiningJob {
                channel_id: 4,
                job_id: 1,
                future_job: true,
                version: 0x2000_0000,
                version_rolling_allowed: true,
                merkle_path: vec![max; 255].try_into().unwrap(),
                coinbase_tx_prefix: bytes(0),
                coinbase_tx_suffix: bytes(300),
            }
            .into(),
            SetNewPrevHash {
                channel_id: 4,
                job_id: 1,
                prev_hash: max,
                min_ntime: u32::MAX,
                nbits: 0x1d00_ffff,
            }
            .into(),
            SetTarget {
                channel_id: 4,
                maximum_target: U256::default(),
            }
            .into(),
            SetCustomMiningJob {
                channel_id: 4,
                request_id: 5,
                mining_job_token: bytes(255),
                version: 2,
                prev_hash: max,
                min_ntime: 1,
                nbits: 2,
                coinbase_tx_version: 2,
                coinbase_prefix: bytes(0),
                coinbase_tx_input_n_sequence: u32::MAX,
                coinbase_tx_value_remaining: u64::MAX,
                coinbase_tx_outputs: bytes(64),
                coinbase_tx_locktime: 0,
                merkle_path: Default::default(),
                extranonce_size: 8,
                future_job: true,
            }
            .into(),
            SetCustomMiningJobSuccess {
                channel_id: 4,
                request_id: 5,
                job_id: 6,
            }
            .into(),
            SetCustomMiningJobError {
                channel_id: 4,
                request_id: 5,
                error_code: string(17),
            }
            .into(),
            Reconnect {
                new_host: string(0),
                new_port: 0,
            }
            .into(),
            SetGroupChannel {
                group_channel_id: 7,
                channel_ids: vec![0, 1, u32::MAX].try_into().unwrap(),
            }
            .into(),
        ]
    }

    #[test]
    fn whole_catalog_survives_frames() {
        let catalog = whole_catalog();
        let tags: BTreeSet<u8> = catalog.iter().map(|m| m.message_type()).collect();
        let known: BTreeSet<u8> = (0..=u8::MAX)
            .filter(|t| AnyMessage::channel_bit_of(*t).is_ok())
            .collect();
        assert_eq!(tags, known);
        assert_eq!(tags.len(), catalog.len());

        for message in catalog {
            let frame = message.to_frame().unwrap();
            assert_eq!(frame.header().msg_type(), message.message_type());
            assert_eq!(frame.header().channel_msg(), message.channel_bit());
            assert_eq!(frame.header().len(), message.get_size());
            assert_eq!(through_frame(&message), message);
        }
    }

    #[test]
    fn oversized_fields_can_not_be_built() {
        assert!(Str0255::try_from("x".repeat(256)).is_err());
        assert!(B032::try_from(vec![0; 33]).is_err());
        assert!(Seq0255::<U256>::new(vec![U256::default(); 256]).is_err());
    }

    #[test]
    fn frame_header_follows_catalog() {
        let frame = Sv2Frame::try_from(submit()).unwrap();
        assert_eq!(frame.header().msg_type(), MESSAGE_TYPE_SUBMIT_SHARES_STANDARD);
        assert!(frame.header().channel_msg());
        assert_eq!(frame.header().len(), 24);
        assert_eq!(&frame.serialize()[..3], &[0x00, 0x80, 0x1a]);

        let frame = setup_connection().to_frame().unwrap();
        assert!(!frame.header().channel_msg());
    }

    #[test]
    fn channel_bit_mismatch_is_rejected() {
        let mut bytes = submit().to_frame().unwrap().serialize();
        bytes[1] &= 0x7f;
        let frame = Sv2Frame::from_bytes(&bytes).unwrap();
        assert_eq!(
            AnyMessage::from_frame(&frame),
            Err(ParserError::ChannelBitMismatch(
                MESSAGE_TYPE_SUBMIT_SHARES_STANDARD,
                false
            ))
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert_eq!(
            AnyMessage::try_from((0x15, &[][..])),
            Err(ParserError::UnexpectedMessage(0x15))
        );
        assert_eq!(
            AnyMessage::channel_bit_of(0x70),
            Err(ParserError::UnexpectedMessage(0x70))
        );
    }

    #[test]
    fn short_payload_is_rejected() {
        let frame = submit().to_frame().unwrap();
        let payload = frame.payload();
        assert!(matches!(
            AnyMessage::try_from((
                MESSAGE_TYPE_SUBMIT_SHARES_STANDARD,
                &payload[..payload.len() - 1]
            )),
            Err(ParserError::BinaryError(_))
        ));
    }

    #[test]
    fn request_ids() {
        let mut open: AnyMessage = OpenStandardMiningChannel {
            request_id: 0,
            user_identity: "user".try_into().unwrap(),
            nominal_hash_rate: 10.0,
            max_target: [0xff; 32].into(),
        }
        .into();
        assert!(open.set_request_id(42));
        assert_eq!(open.request_id(), Some(42));
        assert_eq!(through_frame(&open).request_id(), Some(42));

        let mut submit = submit();
        assert!(!submit.set_request_id(1));
        assert_eq!(submit.request_id(), None);
    }

    #[test]
    fn every_tag_has_one_variant() {
        for tag in 0..=u8::MAX {
            let common = CommonMessageTypes::try_from(tag).is_ok();
            let mining = MiningTypes::try_from(tag).is_ok();
            assert!(!(common && mining), "tag {tag:#04x} in two sub-protocols");
            if let Ok(t) = MiningTypes::try_from(tag) {
                assert_eq!(t as u8, tag);
            }
        }
    }
}
