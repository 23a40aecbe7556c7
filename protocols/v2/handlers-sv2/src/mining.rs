use crate::{error::HandlerErrorType, SendTo};
use const_sv2::*;
use core::convert::TryInto;
use mining_sv2::{
    CloseChannel, NewExtendedMiningJob, NewMiningJob, OpenExtendedMiningChannel,
    OpenExtendedMiningChannelSuccess, OpenMiningChannelError, OpenStandardMiningChannel,
    OpenStandardMiningChannelSuccess, Reconnect, SetCustomMiningJob, SetCustomMiningJobError,
    SetCustomMiningJobSuccess, SetExtranoncePrefix, SetGroupChannel, SetNewPrevHash, SetTarget,
    SubmitSharesError, SubmitSharesExtended, SubmitSharesStandard, SubmitSharesSuccess,
    UpdateChannel, UpdateChannelError,
};
use parsers_sv2::{IsSv2Message, Mining};

macro_rules! unexpected {
    ($message_type:ident) => {
        Err(Self::Error::unexpected_message($message_type))
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedChannelTypes {
    Standard,
    Extended,
    Group,
    GroupAndExtended,
}

/// Mining messages as seen by an upstream. Messages that only flow downstream, or that need a
/// channel type the role does not support, are unexpected.
pub trait HandleMiningMessagesFromDownstream {
    type Error: HandlerErrorType;

    fn get_channel_type_for_downstream(&self) -> SupportedChannelTypes;
    fn is_work_selection_enabled_for_downstream(&self) -> bool;

    fn handle_mining_message_frame_from_downstream(
        &mut self,
        message_type: u8,
        payload: &[u8],
    ) -> Result<SendTo, Self::Error> {
        let parsed: Mining = (message_type, payload)
            .try_into()
            .map_err(Self::Error::parse_error)?;
        self.handle_mining_message_from_downstream(parsed)
    }

    fn handle_mining_message_from_downstream(
        &mut self,
        message: Mining,
    ) -> Result<SendTo, Self::Error> {
        let (channel_type, work_selection) = (
            self.get_channel_type_for_downstream(),
            self.is_work_selection_enabled_for_downstream(),
        );

        use SupportedChannelTypes::*;
        match message {
            Mining::OpenStandardMiningChannel(m) => match channel_type {
                Standard | Group | GroupAndExtended => self.handle_open_standard_mining_channel(m),
                Extended => unexpected!(MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL),
            },
            Mining::OpenExtendedMiningChannel(m) => match channel_type {
                Extended | GroupAndExtended => self.handle_open_extended_mining_channel(m),
                Standard | Group => unexpected!(MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL),
            },
            Mining::UpdateChannel(m) => self.handle_update_channel(m),
            Mining::CloseChannel(m) => self.handle_close_channel(m),
            Mining::SubmitSharesStandard(m) => match channel_type {
                Standard | Group | GroupAndExtended => self.handle_submit_shares_standard(m),
                Extended => unexpected!(MESSAGE_TYPE_SUBMIT_SHARES_STANDARD),
            },
            Mining::SubmitSharesExtended(m) => match channel_type {
                Extended | GroupAndExtended => self.handle_submit_shares_extended(m),
                Standard | Group => unexpected!(MESSAGE_TYPE_SUBMIT_SHARES_EXTENDED),
            },
            Mining::SetCustomMiningJob(m) => match (channel_type, work_selection) {
                (Extended, true) | (GroupAndExtended, true) => self.handle_set_custom_mining_job(m),
                _ => unexpected!(MESSAGE_TYPE_SET_CUSTOM_MINING_JOB),
            },
            other => Err(Self::Error::unexpected_message(other.message_type())),
        }
    }

    fn handle_open_standard_mining_channel(
        &mut self,
        _msg: OpenStandardMiningChannel,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL)
    }

    fn handle_open_extended_mining_channel(
        &mut self,
        _msg: OpenExtendedMiningChannel,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL)
    }

    fn handle_update_channel(&mut self, _msg: UpdateChannel) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_UPDATE_CHANNEL)
    }

    fn handle_close_channel(&mut self, _msg: CloseChannel) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_CLOSE_CHANNEL)
    }

    fn handle_submit_shares_standard(
        &mut self,
        _msg: SubmitSharesStandard,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SUBMIT_SHARES_STANDARD)
    }

    fn handle_submit_shares_extended(
        &mut self,
        _msg: SubmitSharesExtended,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SUBMIT_SHARES_EXTENDED)
    }

    fn handle_set_custom_mining_job(
        &mut self,
        _msg: SetCustomMiningJob,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SET_CUSTOM_MINING_JOB)
    }
}

/// Mining messages as seen by a downstream.
pub trait HandleMiningMessagesFromUpstream {
    type Error: HandlerErrorType;

    fn get_channel_type_for_upstream(&self) -> SupportedChannelTypes;
    fn is_work_selection_enabled_for_upstream(&self) -> bool;

    fn handle_mining_message_frame_from_upstream(
        &mut self,
        message_type: u8,
        payload: &[u8],
    ) -> Result<SendTo, Self::Error> {
        let parsed: Mining = (message_type, payload)
            .try_into()
            .map_err(Self::Error::parse_error)?;
        self.handle_mining_message_from_upstream(parsed)
    }

    fn handle_mining_message_from_upstream(
        &mut self,
        message: Mining,
    ) -> Result<SendTo, Self::Error> {
        let (channel_type, work_selection) = (
            self.get_channel_type_for_upstream(),
            self.is_work_selection_enabled_for_upstream(),
        );

        use SupportedChannelTypes::*;
        match message {
            Mining::OpenStandardMiningChannelSuccess(m) => match channel_type {
                Standard | Group | GroupAndExtended => {
                    self.handle_open_standard_mining_channel_success(m)
                }
                Extended => unexpected!(MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL_SUCCESS),
            },
            Mining::OpenExtendedMiningChannelSuccess(m) => match channel_type {
                Extended | GroupAndExtended => self.handle_open_extended_mining_channel_success(m),
                Standard | Group => unexpected!(MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL_SUCCESS),
            },
            Mining::OpenMiningChannelError(m) => self.handle_open_mining_channel_error(m),
            Mining::UpdateChannelError(m) => self.handle_update_channel_error(m),
            Mining::CloseChannel(m) => self.handle_close_channel(m),
            Mining::SetExtranoncePrefix(m) => self.handle_set_extranonce_prefix(m),
            Mining::SubmitSharesSuccess(m) => self.handle_submit_shares_success(m),
            Mining::SubmitSharesError(m) => self.handle_submit_shares_error(m),
            Mining::NewMiningJob(m) => match channel_type {
                Standard | Group => self.handle_new_mining_job(m),
                Extended | GroupAndExtended => unexpected!(MESSAGE_TYPE_NEW_MINING_JOB),
            },
            Mining::NewExtendedMiningJob(m) => match channel_type {
                Extended | Group | GroupAndExtended => self.handle_new_extended_mining_job(m),
                Standard => unexpected!(MESSAGE_TYPE_NEW_EXTENDED_MINING_JOB),
            },
            Mining::SetNewPrevHash(m) => self.handle_set_new_prev_hash(m),
            Mining::SetCustomMiningJobSuccess(m) => match (channel_type, work_selection) {
                (Extended, true) | (GroupAndExtended, true) => {
                    self.handle_set_custom_mining_job_success(m)
                }
                _ => unexpected!(MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_SUCCESS),
            },
            Mining::SetCustomMiningJobError(m) => match (channel_type, work_selection) {
                (Extended, true) | (Group, true) | (GroupAndExtended, true) => {
                    self.handle_set_custom_mining_job_error(m)
                }
                _ => unexpected!(MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_ERROR),
            },
            Mining::SetTarget(m) => self.handle_set_target(m),
            Mining::Reconnect(m) => self.handle_reconnect(m),
            Mining::SetGroupChannel(m) => match channel_type {
                Group | GroupAndExtended => self.handle_set_group_channel(m),
                Standard | Extended => unexpected!(MESSAGE_TYPE_SET_GROUP_CHANNEL),
            },
            other => Err(Self::Error::unexpected_message(other.message_type())),
        }
    }

    fn handle_open_standard_mining_channel_success(
        &mut self,
        _msg: OpenStandardMiningChannelSuccess,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL_SUCCESS)
    }

    fn handle_open_extended_mining_channel_success(
        &mut self,
        _msg: OpenExtendedMiningChannelSuccess,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL_SUCCESS)
    }

    fn handle_open_mining_channel_error(
        &mut self,
        _msg: OpenMiningChannelError,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_OPEN_MINING_CHANNEL_ERROR)
    }

    fn handle_update_channel_error(
        &mut self,
        _msg: UpdateChannelError,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_UPDATE_CHANNEL_ERROR)
    }

    fn handle_close_channel(&mut self, _msg: CloseChannel) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_CLOSE_CHANNEL)
    }

    fn handle_set_extranonce_prefix(
        &mut self,
        _msg: SetExtranoncePrefix,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SET_EXTRANONCE_PREFIX)
    }

    fn handle_submit_shares_success(
        &mut self,
        _msg: SubmitSharesSuccess,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SUBMIT_SHARES_SUCCESS)
    }

    fn handle_submit_shares_error(
        &mut self,
        _msg: SubmitSharesError,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SUBMIT_SHARES_ERROR)
    }

    fn handle_new_mining_job(&mut self, _msg: NewMiningJob) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_NEW_MINING_JOB)
    }

    fn handle_new_extended_mining_job(
        &mut self,
        _msg: NewExtendedMiningJob,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_NEW_EXTENDED_MINING_JOB)
    }

    fn handle_set_new_prev_hash(&mut self, _msg: SetNewPrevHash) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SET_NEW_PREV_HASH)
    }

    fn handle_set_custom_mining_job_success(
        &mut self,
        _msg: SetCustomMiningJobSuccess,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_SUCCESS)
    }

    fn handle_set_custom_mining_job_error(
        &mut self,
        _msg: SetCustomMiningJobError,
    ) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_ERROR)
    }

    fn handle_set_target(&mut self, _msg: SetTarget) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SET_TARGET)
    }

    fn handle_reconnect(&mut self, _msg: Reconnect) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_RECONNECT)
    }

    fn handle_set_group_channel(&mut self, _msg: SetGroupChannel) -> Result<SendTo, Self::Error> {
        unexpected!(MESSAGE_TYPE_SET_GROUP_CHANNEL)
    }
}
