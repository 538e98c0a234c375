use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{rtu_request_error, tcp_request_error, Packet, RequestPacket};

/// Write Single Register request (function code 0x06). The register value
/// is transmitted big-endian; any 16-bit value is legal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSingleRegisterRequest {
    pub unit_id: u8,
    pub address: u16,
    pub value: u16,
}

impl WriteSingleRegisterRequest {
    pub fn new(unit_id: u8, address: u16, value: u16) -> Self {
        Self {
            unit_id,
            address,
            value,
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

impl Packet for WriteSingleRegisterRequest {
    const FUNCTION_CODE: u8 = 0x06;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.address.to_be_bytes());
        dst.extend_from_slice(&self.value.to_be_bytes());
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() != 4 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "write single register body must be 4 bytes, got {}",
                    body.len()
                ),
            ));
        }
        Ok(Self {
            unit_id,
            address: u16::from_be_bytes([body[0], body[1]]),
            value: u16::from_be_bytes([body[2], body[3]]),
        })
    }
}

impl RequestPacket for WriteSingleRegisterRequest {
    fn response_body_len(&self) -> usize {
        4
    }
}

/// Write Single Register response, an echo of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSingleRegisterResponse {
    pub unit_id: u8,
    pub address: u16,
    pub value: u16,
}

impl WriteSingleRegisterResponse {
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

impl Packet for WriteSingleRegisterResponse {
    const FUNCTION_CODE: u8 = 0x06;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.address.to_be_bytes());
        dst.extend_from_slice(&self.value.to_be_bytes());
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() != 4 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "write single register body must be 4 bytes, got {}",
                    body.len()
                ),
            ));
        }
        Ok(Self {
            unit_id,
            address: u16::from_be_bytes([body[0], body[1]]),
            value: u16::from_be_bytes([body[2], body[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        let request = WriteSingleRegisterRequest::new(0x11, 0x0410, 0xABCD);
        let rtu = RtuFrame::new(request.clone());
        assert_eq!(
            rtu.bytes(),
            [0x11, 0x06, 0x04, 0x10, 0xAB, 0xCD, 0x35, 0x0A]
        );
        assert_eq!(rtu.expected_response_length(), 8);

        let tcp = TcpFrame::with_transaction_id(1, request);
        assert_eq!(tcp.expected_response_length(), 12);
    }

    #[test]
    fn test_round_trip() {
        let request = WriteSingleRegisterRequest::new(1, 0x00AB, 0x0102);
        let tcp = TcpFrame::with_transaction_id(4, request.clone());
        assert_eq!(
            WriteSingleRegisterRequest::parse_tcp(&tcp.bytes()).unwrap(),
            tcp
        );
        let rtu = RtuFrame::new(request);
        assert_eq!(
            WriteSingleRegisterRequest::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );

        let response = WriteSingleRegisterResponse {
            unit_id: 1,
            address: 0x00AB,
            value: 0xFFFF,
        };
        let rtu = RtuFrame::new(response);
        assert_eq!(
            WriteSingleRegisterResponse::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
    }
}
