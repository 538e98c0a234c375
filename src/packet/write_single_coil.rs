use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{rtu_request_error, tcp_request_error, Packet, RequestPacket};

const COIL_ON: [u8; 2] = [0xFF, 0x00];
const COIL_OFF: [u8; 2] = [0x00, 0x00];

fn write_coil_body(address: u16, state: bool, dst: &mut Vec<u8>) {
    dst.extend_from_slice(&address.to_be_bytes());
    dst.extend_from_slice(if state { &COIL_ON } else { &COIL_OFF });
}

fn parse_coil_body(body: &[u8], what: &str) -> Result<(u16, bool), ModbusError> {
    if body.len() != 4 {
        return Err(ModbusError::protocol(
            ExceptionCode::ServerFailure,
            format!("{what} body must be 4 bytes, got {}", body.len()),
        ));
    }
    let address = u16::from_be_bytes([body[0], body[1]]);
    let state = match [body[2], body[3]] {
        COIL_ON => true,
        COIL_OFF => false,
        _ => {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                "coil state has invalid value",
            ))
        }
    };
    Ok((address, state))
}

/// Write Single Coil request (function code 0x05). The coil state is
/// encoded as the two-byte sentinel 0xFF00 (on) or 0x0000 (off).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSingleCoilRequest {
    pub unit_id: u8,
    pub address: u16,
    pub state: bool,
}

impl WriteSingleCoilRequest {
    pub fn new(unit_id: u8, address: u16, state: bool) -> Self {
        Self {
            unit_id,
            address,
            state,
        }
    }

    pub fn parse_tcp(data: &[u8]) -> Result<TcpFrame<Self>, RequestError> {
        TcpFrame::parse(data).map_err(|err| tcp_request_error(err, data))
    }

    pub fn parse_rtu(data: &[u8]) -> Result<RtuFrame<Self>, RequestError> {
        RtuFrame::parse(data).map_err(|err| rtu_request_error(err, data))
    }

    pub fn parse_rtu_with_crc(data: &[u8]) -> Result<RtuFrame<Self>, RequestError> {
        RtuFrame::parse_with_crc(data).map_err(|err| rtu_request_error(err, data))
    }
}

impl Packet for WriteSingleCoilRequest {
    const FUNCTION_CODE: u8 = 0x05;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        write_coil_body(self.address, self.state, dst);
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        let (address, state) = parse_coil_body(body, "write single coil request")?;
        Ok(Self {
            unit_id,
            address,
            state,
        })
    }
}

impl RequestPacket for WriteSingleCoilRequest {
    fn response_body_len(&self) -> usize {
        4
    }
}

/// Write Single Coil response, an echo of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSingleCoilResponse {
    pub unit_id: u8,
    pub address: u16,
    pub state: bool,
}

impl WriteSingleCoilResponse {
    pub fn parse_tcp(data: &[u8]) -> Result<TcpFrame<Self>, ModbusError> {
        TcpFrame::parse(data)
    }

    pub fn parse_rtu(data: &[u8]) -> Result<RtuFrame<Self>, ModbusError> {
        RtuFrame::parse(data)
    }

    pub fn parse_rtu_with_crc(data: &[u8]) -> Result<RtuFrame<Self>, ModbusError> {
        RtuFrame::parse_with_crc(data)
    }
}

impl Packet for WriteSingleCoilResponse {
    const FUNCTION_CODE: u8 = 0x05;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        write_coil_body(self.address, self.state, dst);
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        let (address, state) = parse_coil_body(body, "write single coil response")?;
        Ok(Self {
            unit_id,
            address,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        let request = WriteSingleCoilRequest::new(0x11, 0x0410, true);
        let rtu = RtuFrame::new(request.clone());
        assert_eq!(
            rtu.bytes(),
            [0x11, 0x05, 0x04, 0x10, 0xFF, 0x00, 0x8E, 0x5F]
        );
        assert_eq!(rtu.expected_response_length(), 8);

        let tcp = TcpFrame::with_transaction_id(1, request);
        assert_eq!(tcp.bytes().len(), 12);
        assert_eq!(tcp.expected_response_length(), 12);
    }

    #[test]
    fn test_round_trip_both_states() {
        for state in [true, false] {
            let request = WriteSingleCoilRequest::new(1, 0x00AB, state);
            let tcp = TcpFrame::with_transaction_id(3, request.clone());
            assert_eq!(WriteSingleCoilRequest::parse_tcp(&tcp.bytes()).unwrap(), tcp);
            let rtu = RtuFrame::new(request);
            assert_eq!(
                WriteSingleCoilRequest::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
                rtu
            );
        }
    }

    #[test]
    fn test_rejects_invalid_coil_sentinel() {
        // Value 0x0001 is neither 0xFF00 nor 0x0000.
        let mut frame =
            TcpFrame::with_transaction_id(1, WriteSingleCoilRequest::new(1, 0x00AB, false)).bytes();
        frame[11] = 0x01;
        let err = WriteSingleCoilRequest::parse_tcp(&frame).unwrap_err();
        assert_eq!(
            err.error.exception_code(),
            Some(ExceptionCode::IllegalDataValue)
        );
        assert!(err.to_string().contains("coil state has invalid value"));

        // 0xFF01 is rejected too.
        frame[10] = 0xFF;
        assert!(WriteSingleCoilRequest::parse_tcp(&frame).is_err());
    }

    #[test]
    fn test_response_round_trip() {
        let response = WriteSingleCoilResponse {
            unit_id: 0x11,
            address: 0x0410,
            state: true,
        };
        let rtu = RtuFrame::new(response);
        assert_eq!(
            WriteSingleCoilResponse::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
    }
}
