use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{
    check_declared_len, rtu_request_error, tcp_request_error, Packet, RequestPacket,
    MAX_READ_BITS, MAX_READ_QUANTITY,
};
use crate::view;

/// Read Discrete Inputs request (function code 0x02). Same wire shape as
/// Read Coils, addressing the read-only bit space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadDiscreteInputsRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadDiscreteInputsRequest {
    pub fn new(unit_id: u8, start_address: u16, quantity: u16) -> Result<Self, ModbusError> {
        if quantity == 0 || quantity > MAX_READ_BITS {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("inputs quantity is out of range (1-{MAX_READ_BITS}): {quantity}"),
            ));
        }
        Ok(Self {
            unit_id,
            start_address,
            quantity,
        })
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

impl Packet for ReadDiscreteInputsRequest {
    const FUNCTION_CODE: u8 = 0x02;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.start_address.to_be_bytes());
        dst.extend_from_slice(&self.quantity.to_be_bytes());
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() != 4 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "read discrete inputs request body must be 4 bytes, got {}",
                    body.len()
                ),
            ));
        }
        let start_address = u16::from_be_bytes([body[0], body[1]]);
        let quantity = u16::from_be_bytes([body[2], body[3]]);
        if quantity == 0 || quantity > MAX_READ_QUANTITY {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("invalid quantity. valid range 1..{MAX_READ_QUANTITY}: {quantity}"),
            ));
        }
        Ok(Self {
            unit_id,
            start_address,
            quantity,
        })
    }
}

impl RequestPacket for ReadDiscreteInputsRequest {
    fn response_body_len(&self) -> usize {
        1 + (self.quantity as usize).div_ceil(8)
    }
}

/// Read Discrete Inputs response, bit layout identical to Read Coils.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadDiscreteInputsResponse {
    pub unit_id: u8,
    pub data: Vec<u8>,
}

impl ReadDiscreteInputsResponse {
    pub fn byte_count(&self) -> u8 {
        self.data.len() as u8
    }

    pub fn is_bit_set(&self, start_address: u16, bit_address: u16) -> Result<bool, ModbusError> {
        view::is_bit_set(&self.data, start_address, bit_address)
    }

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

impl Packet for ReadDiscreteInputsResponse {
    const FUNCTION_CODE: u8 = 0x02;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        1 + self.data.len()
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.push(self.data.len() as u8);
        dst.extend_from_slice(&self.data);
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        let Some((&byte_count, payload)) = body.split_first() else {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                "read discrete inputs response is missing its byte count",
            ));
        };
        if byte_count == 0 {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                "read discrete inputs response byte count must be at least 1",
            ));
        }
        check_declared_len(byte_count as usize, payload.len(), "input data")?;
        Ok(Self {
            unit_id,
            data: payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_round_trip() {
        let request = ReadDiscreteInputsRequest::new(1, 200, 10).unwrap();
        let tcp = TcpFrame::with_transaction_id(0x1234, request.clone());
        assert_eq!(tcp.bytes()[7], 0x02);
        assert_eq!(ReadDiscreteInputsRequest::parse_tcp(&tcp.bytes()).unwrap(), tcp);
        assert_eq!(tcp.expected_response_length(), 11);

        let rtu = RtuFrame::new(request);
        assert_eq!(
            rtu.bytes(),
            [0x01, 0x02, 0x00, 0xC8, 0x00, 0x0A, 0x79, 0xF3]
        );
        assert_eq!(
            ReadDiscreteInputsRequest::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
    }

    #[test]
    fn test_request_quantity_bounds() {
        assert!(ReadDiscreteInputsRequest::new(1, 0, 0).is_err());
        assert!(ReadDiscreteInputsRequest::new(1, 0, 2001).is_err());
    }

    #[test]
    fn test_response_round_trip() {
        let response = ReadDiscreteInputsResponse {
            unit_id: 3,
            data: vec![0xAC, 0xDB],
        };
        let rtu = RtuFrame::new(response.clone());
        assert_eq!(rtu.bytes(), [0x03, 0x02, 0x02, 0xAC, 0xDB, 0xFD, 0x23]);
        assert_eq!(
            ReadDiscreteInputsResponse::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );

        let tcp = TcpFrame::with_transaction_id(9, response);
        assert_eq!(ReadDiscreteInputsResponse::parse_tcp(&tcp.bytes()).unwrap(), tcp);
    }
}
