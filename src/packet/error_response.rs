use serde::{Deserialize, Serialize};

use crate::errors::ExceptionCode;
use crate::frame::append_crc;

/// A Modbus exception frame.
///
/// On the wire the original function code is transmitted with its high bit
/// set; `function_code` stores it without the bit. `transaction_id` is
/// present for TCP framing only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub transaction_id: Option<u16>,
    pub unit_id: u8,
    pub function_code: u8,
    pub exception: ExceptionCode,
}

impl ErrorResponse {
    pub fn tcp(transaction_id: u16, unit_id: u8, function_code: u8, exception: ExceptionCode) -> Self {
        Self {
            transaction_id: Some(transaction_id),
            unit_id,
            function_code: function_code & 0x7F,
            exception,
        }
    }

    pub fn rtu(unit_id: u8, function_code: u8, exception: ExceptionCode) -> Self {
        Self {
            transaction_id: None,
            unit_id,
            function_code: function_code & 0x7F,
            exception,
        }
    }

    /// Encodes as a 9-byte TCP exception frame. A missing transaction id
    /// serializes as 0.
    pub fn bytes_tcp(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(9);
        out.extend_from_slice(&self.transaction_id.unwrap_or(0).to_be_bytes());
        out.extend_from_slice(&[0x00, 0x00, 0x00, 0x03]);
        out.push(self.unit_id);
        out.push(self.function_code | 0x80);
        out.push(self.exception.code());
        out
    }

    /// Encodes as a 5-byte RTU exception frame, CRC low byte first.
    pub fn bytes_rtu(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5);
        out.push(self.unit_id);
        out.push(self.function_code | 0x80);
        out.push(self.exception.code());
        append_crc(&mut out);
        out
    }

    /// Quick check for the 9-byte TCP exception shape: protocol id 0 and the
    /// error bit set on the function code at offset 7.
    pub fn detect_tcp(data: &[u8]) -> Option<Self> {
        if data.len() != 9 {
            return None;
        }
        if data[2] != 0 || data[3] != 0 {
            return None;
        }
        if data[7] & 0x80 == 0 {
            return None;
        }
        Some(Self {
            transaction_id: Some(u16::from_be_bytes([data[0], data[1]])),
            unit_id: data[6],
            function_code: data[7] & 0x7F,
            exception: ExceptionCode::from_code(data[8]),
        })
    }

    /// Quick check for the 5-byte RTU exception shape. The trailing CRC is
    /// not verified here.
    pub fn detect_rtu(data: &[u8]) -> Option<Self> {
        if data.len() != 5 {
            return None;
        }
        if data[1] & 0x80 == 0 {
            return None;
        }
        Some(Self {
            transaction_id: None,
            unit_id: data[0],
            function_code: data[1] & 0x7F,
            exception: ExceptionCode::from_code(data[2]),
        })
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "exception {} ({}) from unit {}, function {}",
            self.exception.code(),
            self.exception,
            self.unit_id,
            self.function_code
        )
    }
}
