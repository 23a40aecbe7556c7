//! # Handlers
//!
//! Traits a role implements to react to Sv2 messages, one trait per sub-protocol and direction:
//! `...FromDownstream` for upstream roles (a pool) and `...FromUpstream` for downstream roles (a
//! mining device).
//!
//! Dispatch is a `match` over the message catalog. Every per message method has a default body
//! returning [`HandlerErrorType::unexpected_message`], so a role only implements what it handles
//! and everything else is reported instead of silently dropped.
//!
//! Handlers return [`SendTo`], telling the caller what has to be written back to the remote.
mod common;
mod error;
mod mining;

pub use common::{HandleCommonMessagesFromDownstream, HandleCommonMessagesFromUpstream};
pub use error::{HandlerError, HandlerErrorType};
pub use mining::{
    HandleMiningMessagesFromDownstream, HandleMiningMessagesFromUpstream, SupportedChannelTypes,
};

use framing_sv2::Sv2Frame;
use parsers_sv2::AnyMessage;

/// What to do after a message has been handled.
#[derive(Debug, Clone, PartialEq)]
pub enum SendTo {
    /// Write the message back to the remote that sent the handled one
    Respond(AnyMessage),
    /// Several actions, performed in order
    Multiple(Vec<SendTo>),
    /// Nothing to write. The message, if any, is kept for later processing
    None(Option<AnyMessage>),
}

impl SendTo {
    /// Messages to write to the remote, in order.
    pub fn into_messages(self) -> Vec<AnyMessage> {
        match self {
            SendTo::Respond(m) => vec![m],
            SendTo::Multiple(all) => all.into_iter().flat_map(SendTo::into_messages).collect(),
            SendTo::None(_) => vec![],
        }
    }
}

/// Every message an upstream role can receive.
pub trait HandleMessagesFromDownstream:
    HandleCommonMessagesFromDownstream
    + HandleMiningMessagesFromDownstream<Error = <Self as HandleCommonMessagesFromDownstream>::Error>
{
    fn handle_message_from_downstream(
        &mut self,
        message: AnyMessage,
    ) -> Result<SendTo, <Self as HandleCommonMessagesFromDownstream>::Error> {
        match message {
            AnyMessage::Common(m) => self.handle_common_message_from_downstream(m),
            AnyMessage::Mining(m) => self.handle_mining_message_from_downstream(m),
        }
    }

    /// Parses the frame (tag, channel bit and payload) and dispatches the message.
    fn handle_frame_from_downstream(
        &mut self,
        frame: &Sv2Frame,
    ) -> Result<SendTo, <Self as HandleCommonMessagesFromDownstream>::Error> {
        let message = AnyMessage::from_frame(frame)
            .map_err(<Self as HandleCommonMessagesFromDownstream>::Error::parse_error)?;
        self.handle_message_from_downstream(message)
    }
}

impl<T> HandleMessagesFromDownstream for T where
    T: HandleCommonMessagesFromDownstream
        + HandleMiningMessagesFromDownstream<
            Error = <T as HandleCommonMessagesFromDownstream>::Error,
        >
{
}

/// Every message a downstream role can receive.
pub trait HandleMessagesFromUpstream:
    HandleCommonMessagesFromUpstream
    + HandleMiningMessagesFromUpstream<Error = <Self as HandleCommonMessagesFromUpstream>::Error>
{
    fn handle_message_from_upstream(
        &mut self,
        message: AnyMessage,
    ) -> Result<SendTo, <Self as HandleCommonMessagesFromUpstream>::Error> {
        match message {
            AnyMessage::Common(m) => self.handle_common_message_from_upstream(m),
            AnyMessage::Mining(m) => self.handle_mining_message_from_upstream(m),
        }
    }

    fn handle_frame_from_upstream(
        &mut self,
        frame: &Sv2Frame,
    ) -> Result<SendTo, <Self as HandleCommonMessagesFromUpstream>::Error> {
        let message = AnyMessage::from_frame(frame)
            .map_err(<Self as HandleCommonMessagesFromUpstream>::Error::parse_error)?;
        self.handle_message_from_upstream(message)
    }
}

impl<T> HandleMessagesFromUpstream for T where
    T: HandleCommonMessagesFromUpstream
        + HandleMiningMessagesFromUpstream<Error = <T as HandleCommonMessagesFromUpstream>::Error>
{
}

#[cfg(test)]
mod test {
    use super::*;
    use binary_sv2::Str0255;
    use common_messages_sv2::{Protocol, SetupConnection, SetupConnectionSuccess};
    use const_sv2::{MESSAGE_TYPE_SET_TARGET, MESSAGE_TYPE_SUBMIT_SHARES_EXTENDED};
    use core::convert::TryInto;
    use mining_sv2::{SetTarget, SubmitSharesExtended};
    use parsers_sv2::ParserError;

    #[derive(Default)]
    struct SetupOnly {
        setups: usize,
    }

    impl HandleCommonMessagesFromDownstream for SetupOnly {
        type Error = HandlerError;

        fn handle_setup_connection(&mut self, msg: SetupConnection) -> Result<SendTo, HandlerError> {
            self.setups += 1;
            Ok(SendTo::Respond(
                SetupConnectionSuccess {
                    used_version: msg.used_version(),
                    flags: 0,
                }
                .into(),
            ))
        }
    }

    impl HandleMiningMessagesFromDownstream for SetupOnly {
        type Error = HandlerError;

        fn get_channel_type_for_downstream(&self) -> SupportedChannelTypes {
            SupportedChannelTypes::Standard
        }

        fn is_work_selection_enabled_for_downstream(&self) -> bool {
            false
        }
    }

    fn setup_connection() -> AnyMessage {
        SetupConnection {
            protocol: Protocol::MiningProtocol,
            min_version: 2,
            max_version: 2,
            flags: 0,
            endpoint_host: "pool".try_into().unwrap(),
            endpoint_port: 3333,
            vendor: Str0255::default(),
            hardware_version: Str0255::default(),
            firmware: Str0255::default(),
            device_id: Str0255::default(),
        }
        .into()
    }

    #[test]
    fn dispatches_to_implemented_method() {
        let mut handler = SetupOnly::default();
        let frame = setup_connection().to_frame().unwrap();
        let reply = handler.handle_frame_from_downstream(&frame).unwrap();
        assert_eq!(handler.setups, 1);
        assert_eq!(
            reply.into_messages(),
            vec![AnyMessage::from(SetupConnectionSuccess {
                used_version: 2,
                flags: 0
            })]
        );
    }

    #[test]
    fn unimplemented_method_is_unexpected() {
        let mut handler = SetupOnly::default();
        let submit = SubmitSharesExtended {
            channel_id: 1,
            sequence_number: 0,
            job_id: 0,
            nonce: 0,
            ntime: 0,
            version: 0,
            extranonce: vec![0; 4].try_into().unwrap(),
        };
        assert!(matches!(
            handler.handle_message_from_downstream(submit.into()),
            Err(HandlerError::UnexpectedMessage(MESSAGE_TYPE_SUBMIT_SHARES_EXTENDED))
        ));
        // flows the other way
        let set_target = SetTarget {
            channel_id: 1,
            maximum_target: [0; 32].into(),
        };
        assert!(matches!(
            handler.handle_message_from_downstream(set_target.into()),
            Err(HandlerError::UnexpectedMessage(MESSAGE_TYPE_SET_TARGET))
        ));
    }

    #[test]
    fn malformed_frame_is_a_parse_error() {
        let mut handler = SetupOnly::default();
        let bytes = setup_connection().to_frame().unwrap().serialize();
        let truncated = Sv2Frame::from_bytes(&[&[0, 0, 0, 3, 0, 0][..], &bytes[6..9]].concat())
            .unwrap();
        assert!(matches!(
            handler.handle_frame_from_downstream(&truncated),
            Err(HandlerError::ParserError(ParserError::BinaryError(_)))
        ));
    }

    #[test]
    fn multiple_flattens_in_order() {
        let first: AnyMessage = setup_connection();
        let second: AnyMessage = SetupConnectionSuccess {
            used_version: 2,
            flags: 1,
        }
        .into();
        let send_to = SendTo::Multiple(vec![
            SendTo::Respond(first.clone()),
            SendTo::None(None),
            SendTo::Multiple(vec![SendTo::Respond(second.clone())]),
        ]);
        assert_eq!(send_to.into_messages(), vec![first, second]);
    }
}
