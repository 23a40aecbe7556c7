use crate::{error::HandlerErrorType, SendTo};
use common_messages_sv2::{
    ChannelEndpointChanged, SetupConnection, SetupConnectionError, SetupConnectionSuccess,
};
use const_sv2::{
    MESSAGE_TYPE_CHANNEL_ENDPOINT_CHANGED, MESSAGE_TYPE_SETUP_CONNECTION,
    MESSAGE_TYPE_SETUP_CONNECTION_ERROR, MESSAGE_TYPE_SETUP_CONNECTION_SUCCESS,
};
use core::convert::TryInto;
use parsers_sv2::CommonMessages;

/// Common messages as seen by an upstream (the responder of `SetupConnection`).
pub trait HandleCommonMessagesFromDownstream {
    type Error: HandlerErrorType;

    fn handle_common_message_frame_from_downstream(
        &mut self,
        message_type: u8,
        payload: &[u8],
    ) -> Result<SendTo, Self::Error> {
        let parsed: CommonMessages = (message_type, payload)
            .try_into()
            .map_err(Self::Error::parse_error)?;
        self.handle_common_message_from_downstream(parsed)
    }

    fn handle_common_message_from_downstream(
        &mut self,
        message: CommonMessages,
    ) -> Result<SendTo, Self::Error> {
        match message {
            CommonMessages::SetupConnection(m) => self.handle_setup_connection(m),
            CommonMessages::SetupConnectionSuccess(_) => Err(Self::Error::unexpected_message(
                MESSAGE_TYPE_SETUP_CONNECTION_SUCCESS,
            )),
            CommonMessages::SetupConnectionError(_) => Err(Self::Error::unexpected_message(
                MESSAGE_TYPE_SETUP_CONNECTION_ERROR,
            )),
            CommonMessages::ChannelEndpointChanged(_) => Err(Self::Error::unexpected_message(
                MESSAGE_TYPE_CHANNEL_ENDPOINT_CHANGED,
            )),
        }
    }

    fn handle_setup_connection(&mut self, _msg: SetupConnection) -> Result<SendTo, Self::Error> {
        Err(Self::Error::unexpected_message(MESSAGE_TYPE_SETUP_CONNECTION))
    }
}

/// Common messages as seen by a downstream (the initiator of `SetupConnection`).
pub trait HandleCommonMessagesFromUpstream {
    type Error: HandlerErrorType;

    fn handle_common_message_frame_from_upstream(
        &mut self,
        message_type: u8,
        payload: &[u8],
    ) -> Result<SendTo, Self::Error> {
        let parsed: CommonMessages = (message_type, payload)
            .try_into()
            .map_err(Self::Error::parse_error)?;
        self.handle_common_message_from_upstream(parsed)
    }

    fn handle_common_message_from_upstream(
        &mut self,
        message: CommonMessages,
    ) -> Result<SendTo, Self::Error> {
        match message {
            CommonMessages::SetupConnectionSuccess(m) => self.handle_setup_connection_success(m),
            CommonMessages::SetupConnectionError(m) => self.handle_setup_connection_error(m),
            CommonMessages::ChannelEndpointChanged(m) => self.handle_channel_endpoint_changed(m),
            CommonMessages::SetupConnection(_) => Err(Self::Error::unexpected_message(
                MESSAGE_TYPE_SETUP_CONNECTION,
            )),
        }
    }

    fn handle_setup_connection_success(
        &mut self,
        _msg: SetupConnectionSuccess,
    ) -> Result<SendTo, Self::Error> {
        Err(Self::Error::unexpected_message(
            MESSAGE_TYPE_SETUP_CONNECTION_SUCCESS,
        ))
    }

    fn handle_setup_connection_error(
        &mut self,
        _msg: SetupConnectionError,
    ) -> Result<SendTo, Self::Error> {
        Err(Self::Error::unexpected_message(
            MESSAGE_TYPE_SETUP_CONNECTION_ERROR,
        ))
    }

    fn handle_channel_endpoint_changed(
        &mut self,
        _msg: ChannelEndpointChanged,
    ) -> Result<SendTo, Self::Error> {
        Err(Self::Error::unexpected_message(
            MESSAGE_TYPE_CHANNEL_ENDPOINT_CHANGED,
        ))
    }
}
