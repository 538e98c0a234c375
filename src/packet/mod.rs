mod error_response;
mod read_coils;
mod read_discrete_inputs;
mod read_holding_registers;
mod read_input_registers;
mod read_server_id;
mod read_write_multiple_registers;
mod write_multiple_coils;
mod write_multiple_registers;
mod write_single_coil;
mod write_single_register;

pub use error_response::ErrorResponse;
pub use read_coils::{ReadCoilsRequest, ReadCoilsResponse};
pub use read_discrete_inputs::{ReadDiscreteInputsRequest, ReadDiscreteInputsResponse};
pub use read_holding_registers::{ReadHoldingRegistersRequest, ReadHoldingRegistersResponse};
pub use read_input_registers::{ReadInputRegistersRequest, ReadInputRegistersResponse};
pub use read_server_id::{ReadServerIdRequest, ReadServerIdResponse};
pub use read_write_multiple_registers::{
    ReadWriteMultipleRegistersRequest, ReadWriteMultipleRegistersResponse,
};
pub use write_multiple_coils::{WriteMultipleCoilsRequest, WriteMultipleCoilsResponse};
pub use write_multiple_registers::{WriteMultipleRegistersRequest, WriteMultipleRegistersResponse};
pub use write_single_coil::{WriteSingleCoilRequest, WriteSingleCoilResponse};
pub use write_single_register::{WriteSingleRegisterRequest, WriteSingleRegisterResponse};

use crate::errors::{ExceptionCode, ModbusError, RequestError};

/// Function codes this codec speaks.
pub const SUPPORTED_FUNCTION_CODES: [u8; 10] = [1, 2, 3, 4, 5, 6, 15, 16, 17, 23];

/// Construction-side limit for bit reads (FC01/FC02).
pub const MAX_READ_BITS: u16 = 2000;
/// Parse-side quantity limit for read requests.
pub const MAX_READ_QUANTITY: u16 = 125;
/// Limit for coils written in one FC15 request (246 data bytes).
pub const MAX_WRITE_COILS: u16 = 1968;
/// Limit for registers written in one FC16 request.
pub const MAX_WRITE_REGISTERS: u16 = 123;
/// Limit for registers written in one FC23 request.
pub const MAX_READ_WRITE_WRITE_REGISTERS: u16 = 121;

pub fn supported_function_code(function_code: u8) -> bool {
    SUPPORTED_FUNCTION_CODES.contains(&function_code)
}

/// A framing-independent PDU: the bytes between the function code and the
/// end of the PDU, plus the unit id both framings carry.
pub trait Packet: Sized {
    const FUNCTION_CODE: u8;

    fn unit_id(&self) -> u8;

    /// Length of the encoded body, excluding unit id and function code.
    fn body_len(&self) -> usize;

    fn write_body(&self, dst: &mut Vec<u8>);

    /// Parses the body bytes. For RTU input the trailing CRC has already
    /// been stripped. Variable-length payloads are copied out of `body`.
    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError>;
}

/// Request-side extension: the size of the reply this request solicits.
pub trait RequestPacket: Packet {
    /// Body length of the matching successful response (minimum, for
    /// variable-length replies).
    fn response_body_len(&self) -> usize;
}

/// Wraps a TCP request-parse failure with the exception frame to answer
/// with, recovering what header fields the buffer still holds.
pub(crate) fn tcp_request_error(error: ModbusError, data: &[u8]) -> RequestError {
    let transaction_id = if data.len() >= 2 {
        u16::from_be_bytes([data[0], data[1]])
    } else {
        0
    };
    let unit_id = if data.len() >= 7 { data[6] } else { 0 };
    let function_code = if data.len() >= 8 { data[7] & 0x7F } else { 0 };
    let exception = error
        .exception_code()
        .unwrap_or(ExceptionCode::ServerFailure);
    RequestError {
        error,
        response: Some(ErrorResponse::tcp(
            transaction_id,
            unit_id,
            function_code,
            exception,
        )),
    }
}

/// RTU analogue of [`tcp_request_error`]. CRC failures produce no response
/// frame; the server stays silent.
pub(crate) fn rtu_request_error(error: ModbusError, data: &[u8]) -> RequestError {
    if matches!(error, ModbusError::InvalidCrc { .. }) {
        return RequestError {
            error,
            response: None,
        };
    }
    let unit_id = if !data.is_empty() { data[0] } else { 0 };
    let function_code = if data.len() >= 2 { data[1] & 0x7F } else { 0 };
    let exception = error
        .exception_code()
        .unwrap_or(ExceptionCode::ServerFailure);
    RequestError {
        error,
        response: Some(ErrorResponse::rtu(unit_id, function_code, exception)),
    }
}

/// Byte-count bookkeeping shared by the responses that carry a length
/// prefix: short payloads are truncation, long ones are a lying length
/// field.
pub(crate) fn check_declared_len(
    declared: usize,
    actual: usize,
    what: &str,
) -> Result<(), ModbusError> {
    if actual < declared {
        return Err(ModbusError::protocol(
            ExceptionCode::ServerFailure,
            format!("{what} is truncated: byte count {declared}, got {actual} bytes"),
        ));
    }
    if actual > declared {
        return Err(ModbusError::protocol(
            ExceptionCode::IllegalDataValue,
            format!("{what} length does not match byte count {declared}: got {actual} bytes"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_function_codes() {
        for code in SUPPORTED_FUNCTION_CODES {
            assert!(supported_function_code(code));
        }
        for code in [0u8, 7, 8, 0x1E, 0x80, 0x81] {
            assert!(!supported_function_code(code));
        }
    }

    #[test]
    fn test_rtu_request_error_keeps_crc_failures_silent() {
        let err = rtu_request_error(
            ModbusError::InvalidCrc {
                calculated: 1,
                received: 2,
                frame_hex: String::new(),
            },
            &[0x01, 0x03],
        );
        assert!(err.response.is_none());
    }

    #[test]
    fn test_tcp_request_error_recovers_header_fields() {
        let data = [
            0xDA, 0x87, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00,
        ];
        let err = tcp_request_error(
            ModbusError::protocol(ExceptionCode::IllegalDataValue, "quantity is zero"),
            &data,
        );
        let response = err.response.unwrap();
        assert_eq!(response.transaction_id, Some(0xDA87));
        assert_eq!(response.unit_id, 1);
        assert_eq!(response.function_code, 3);
        assert_eq!(response.exception, ExceptionCode::IllegalDataValue);
    }
}
