use binary_sv2::{impl_sv2_codec, Decodable, Encodable, Fixed, Str0255};
use const_sv2::{
    SV2_JOB_DISTR_PROTOCOL_DISCRIMINANT, SV2_JOB_NEG_PROTOCOL_DISCRIMINANT,
    SV2_MINING_PROTOCOL_DISCRIMINANT, SV2_TEMPLATE_DISTR_PROTOCOL_DISCRIMINANT,
};
use core::convert::TryFrom;

/// First message sent by the initiator of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConnection {
    pub protocol: Protocol,
    pub min_version: u16,
    pub max_version: u16,
    /// Optional protocol features, meaning depends on `protocol`
    pub flags: u32,
    pub endpoint_host: Str0255,
    pub endpoint_port: u16,
    pub vendor: Str0255,
    pub hardware_version: Str0255,
    pub firmware: Str0255,
    pub device_id: Str0255,
}

impl_sv2_codec!(SetupConnection {
    protocol,
    min_version,
    max_version,
    flags,
    endpoint_host,
    endpoint_port,
    vendor,
    hardware_version,
    firmware,
    device_id,
});

impl SetupConnection {
    /// Version the responder will use: the lowest one the initiator accepts.
    pub fn used_version(&self) -> u16 {
        self.min_version.min(self.max_version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConnectionSuccess {
    pub used_version: u16,
    pub flags: u32,
}

impl_sv2_codec!(SetupConnectionSuccess { used_version, flags });

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConnectionError {
    pub flags: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(SetupConnectionError { flags, error_code });

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[allow(clippy::enum_variant_names)]
pub enum Protocol {
    MiningProtocol = SV2_MINING_PROTOCOL_DISCRIMINANT,
    JobNegotiationProtocol = SV2_JOB_NEG_PROTOCOL_DISCRIMINANT,
    TemplateDistributionProtocol = SV2_TEMPLATE_DISTR_PROTOCOL_DISCRIMINANT,
    JobDistributionProtocol = SV2_JOB_DISTR_PROTOCOL_DISCRIMINANT,
}

impl TryFrom<u8> for Protocol {
    type Error = binary_sv2::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            SV2_MINING_PROTOCOL_DISCRIMINANT => Ok(Protocol::MiningProtocol),
            SV2_JOB_NEG_PROTOCOL_DISCRIMINANT => Ok(Protocol::JobNegotiationProtocol),
            SV2_TEMPLATE_DISTR_PROTOCOL_DISCRIMINANT => Ok(Protocol::TemplateDistributionProtocol),
            SV2_JOB_DISTR_PROTOCOL_DISCRIMINANT => Ok(Protocol::JobDistributionProtocol),
            _ => Err(binary_sv2::Error::ValueIsNotAValidProtocol(value)),
        }
    }
}

impl Fixed for Protocol {
    const SIZE: usize = 1;
}

impl Encodable for Protocol {
    fn encode_to(&self, dst: &mut Vec<u8>) -> Result<(), binary_sv2::Error> {
        (*self as u8).encode_to(dst)
    }
}

impl Decodable for Protocol {
    fn decode_from(data: &mut &[u8]) -> Result<Self, binary_sv2::Error> {
        Protocol::try_from(u8::decode_from(data)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use core::convert::TryInto;

    fn setup_connection(endpoint_host: &str) -> SetupConnection {
        SetupConnection {
            protocol: Protocol::MiningProtocol,
            min_version: 2,
            max_version: 2,
            flags: 0,
            endpoint_host: endpoint_host.try_into().unwrap(),
            endpoint_port: 34254,
            vendor: "sim".try_into().unwrap(),
            hardware_version: Str0255::default(),
            firmware: Str0255::default(),
            device_id: "device-0".try_into().unwrap(),
        }
    }

    #[test]
    fn setup_connection_layout() {
        let message = setup_connection("");
        let bytes = binary_sv2::to_bytes(&message).unwrap();
        // protocol, min, max, flags, host len, port
        assert_eq!(&bytes[..12], &[0, 2, 0, 2, 0, 0, 0, 0, 0, 0, 0xce, 0x85]);
        assert_eq!(binary_sv2::from_bytes::<SetupConnection>(&bytes).unwrap(), message);
    }

    #[test]
    fn setup_connection_boundary_strings() {
        let message = setup_connection(&"h".repeat(255));
        let bytes = binary_sv2::to_bytes(&message).unwrap();
        assert_eq!(binary_sv2::from_bytes::<SetupConnection>(&bytes).unwrap(), message);
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let mut bytes = binary_sv2::to_bytes(&setup_connection("pool")).unwrap();
        bytes[0] = 9;
        assert_eq!(
            binary_sv2::from_bytes::<SetupConnection>(&bytes),
            Err(binary_sv2::Error::ValueIsNotAValidProtocol(9))
        );
    }

    #[test]
    fn used_version_is_min() {
        let mut message = setup_connection("pool");
        assert_eq!(message.used_version(), 2);
        message.min_version = 1;
        message.max_version = 3;
        assert_eq!(message.used_version(), 1);
    }
}
