use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    BinarySv2Error(binary_sv2::Error),
    /// Number of bytes missing to complete the header
    UnexpectedHeaderLength(usize),
    /// Declared payload length and received payload length
    PayloadLengthMismatch(usize, usize),
    PayloadTooBig(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            BinarySv2Error(ref e) => {
                write!(f, "BinarySv2Error: `{}`", e)
            }
            UnexpectedHeaderLength(i) => {
                write!(f, "Unexpected `Header` length, `{}` bytes missing", i)
            }
            PayloadLengthMismatch(declared, actual) => {
                write!(
                    f,
                    "Header declares a `{}` bytes payload, received `{}`",
                    declared, actual
                )
            }
            PayloadTooBig(len) => {
                write!(f, "Payload of `{}` bytes does not fit in a frame", len)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<binary_sv2::Error> for Error {
    fn from(e: binary_sv2::Error) -> Self {
        Error::BinarySv2Error(e)
    }
}
