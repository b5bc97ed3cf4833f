use crate::frame::Command;
use core::fmt;

#[derive(Debug)]
pub enum Error {
    ///Input file not understood.
    Unsupported(&'static str),
    ///Intel HEX line checksum mismatch.
    BadChecksum,
    ///The device rejected the VERIFY frame, flash content doesn't match the image.
    VerifyFailed,
    ///Command not confirmed.
    BadResponse { command: Command, status: Option<u8> },
    ///Every candidate byte was rejected while reading back flash.
    NoPossibleMatch { address: u16 },
    Encode,
    Transmission,
    Io(std::io::Error),
}

impl Error {
    /// Both a bad HEX line and a failed VERIFY are checksum mismatches.
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, Error::BadChecksum | Error::VerifyFailed)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Unsupported(reason) => write!(f, "unsupported input: {}", reason),
            Error::BadChecksum => write!(f, "Intel HEX checksum mismatch"),
            Error::VerifyFailed => write!(f, "device flash checksum mismatch"),
            Error::BadResponse {
                command,
                status: Some(status),
            } => write!(f, "{:?} not confirmed, device answered {:#04x}", command, status),
            Error::BadResponse {
                command,
                status: None,
            } => write!(f, "{:?} not confirmed, empty report", command),
            Error::NoPossibleMatch { address } => {
                write!(f, "no possible CRC matches at {:#06x}", address)
            }
            Error::Encode => write!(f, "frame encoding failed"),
            Error::Transmission => write!(f, "HID transmission failed"),
            Error::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<scroll::Error> for Error {
    fn from(_err: scroll::Error) -> Self {
        Error::Encode
    }
}
