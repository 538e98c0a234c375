use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::packet::ErrorResponse;

/// Modbus exception codes, as carried in the last byte of an error response.
///
/// `Unknown` keeps the original wire byte for codes outside the closed set
/// the application protocol defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionCode {
    IllegalFunction,
    IllegalDataAddress,
    IllegalDataValue,
    ServerFailure,
    Acknowledge,
    ServerBusy,
    MemoryParityError,
    GatewayPathUnavailable,
    GatewayTargetFailedToRespond,
    Unknown(u8),
}

impl ExceptionCode {
    pub fn code(&self) -> u8 {
        match self {
            Self::IllegalFunction => 0x01,
            Self::IllegalDataAddress => 0x02,
            Self::IllegalDataValue => 0x03,
            Self::ServerFailure => 0x04,
            Self::Acknowledge => 0x05,
            Self::ServerBusy => 0x06,
            Self::MemoryParityError => 0x08,
            Self::GatewayPathUnavailable => 0x0A,
            Self::GatewayTargetFailedToRespond => 0x0B,
            Self::Unknown(code) => *code,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Self::IllegalFunction,
            0x02 => Self::IllegalDataAddress,
            0x03 => Self::IllegalDataValue,
            0x04 => Self::ServerFailure,
            0x05 => Self::Acknowledge,
            0x06 => Self::ServerBusy,
            0x08 => Self::MemoryParityError,
            0x0A => Self::GatewayPathUnavailable,
            0x0B => Self::GatewayTargetFailedToRespond,
            other => Self::Unknown(other),
        }
    }
}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IllegalFunction => write!(f, "Illegal function"),
            Self::IllegalDataAddress => write!(f, "Illegal data address"),
            Self::IllegalDataValue => write!(f, "Illegal data value"),
            Self::ServerFailure => write!(f, "Server failure"),
            Self::Acknowledge => write!(f, "Acknowledge"),
            Self::ServerBusy => write!(f, "Server busy"),
            Self::MemoryParityError => write!(f, "Memory parity error"),
            Self::GatewayPathUnavailable => write!(f, "Gateway path unavailable"),
            Self::GatewayTargetFailedToRespond => {
                write!(f, "Gateway targeted device failed to respond")
            }
            Self::Unknown(code) => write!(f, "Unknown error code: {code}"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ModbusError {
    /// Parse or validation failure, classified with the Modbus exception a
    /// server would answer with. Structural failures (short buffers, length
    /// mismatches, bad protocol id) carry `ServerFailure`.
    #[error("Protocol error: {kind} - {details}")]
    Protocol { kind: ExceptionCode, details: String },

    /// RTU frame failed its CRC check. Never converted into a Modbus
    /// exception; a server drops the frame without replying.
    #[error("CRC error: calculated={calculated:04X}, received={received:04X}, frame={frame_hex}")]
    InvalidCrc {
        calculated: u16,
        received: u16,
        frame_hex: String,
    },

    /// Well-formed exception frame received from the remote side.
    #[error("{0}")]
    Exception(ErrorResponse),

    /// Register-view or coil addressing failure. Client-side only, has no
    /// wire representation.
    #[error("Out of range: {details}")]
    OutOfRange { details: String },
}

impl ModbusError {
    pub fn protocol(kind: ExceptionCode, details: impl Into<String>) -> Self {
        ModbusError::Protocol {
            kind,
            details: details.into(),
        }
    }

    pub fn out_of_range(details: impl Into<String>) -> Self {
        ModbusError::OutOfRange {
            details: details.into(),
        }
    }

    /// The exception a server should answer with, when one applies.
    ///
    /// CRC and register-view failures have no wire mapping and return `None`.
    pub fn exception_code(&self) -> Option<ExceptionCode> {
        match self {
            Self::Protocol { kind, .. } => Some(*kind),
            Self::Exception(response) => Some(response.exception),
            Self::InvalidCrc { .. } | Self::OutOfRange { .. } => None,
        }
    }
}

/// Failure while parsing a request on the server side.
///
/// Carries the diagnostic for logs plus the exception frame to send back, in
/// the framing the request arrived in.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct RequestError {
    pub error: ModbusError,
    /// `None` exactly when the frame failed its CRC check and must be
    /// dropped without a reply.
    pub response: Option<ErrorResponse>,
}
