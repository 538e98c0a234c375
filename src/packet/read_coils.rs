use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{
    check_declared_len, rtu_request_error, tcp_request_error, Packet, RequestPacket,
    MAX_READ_BITS, MAX_READ_QUANTITY,
};
use crate::view;

/// Read Coils request (function code 0x01).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCoilsRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadCoilsRequest {
    pub fn new(unit_id: u8, start_address: u16, quantity: u16) -> Result<Self, ModbusError> {
        if quantity == 0 || quantity > MAX_READ_BITS {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("coils quantity is out of range (1-{MAX_READ_BITS}): {quantity}"),
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

impl Packet for ReadCoilsRequest {
    const FUNCTION_CODE: u8 = 0x01;

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
                format!("read coils request body must be 4 bytes, got {}", body.len()),
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

impl RequestPacket for ReadCoilsRequest {
    fn response_body_len(&self) -> usize {
        1 + (self.quantity as usize).div_ceil(8)
    }
}

/// Read Coils response: one bit per coil, packed LSB-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCoilsResponse {
    pub unit_id: u8,
    pub data: Vec<u8>,
}

impl ReadCoilsResponse {
    pub fn byte_count(&self) -> u8 {
        self.data.len() as u8
    }

    /// Whether the coil at `bit_address` is on, given the start address the
    /// originating request used.
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

impl Packet for ReadCoilsResponse {
    const FUNCTION_CODE: u8 = 0x01;

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
                "read coils response is missing its byte count",
            ));
        };
        if byte_count == 0 {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                "read coils response byte count must be at least 1",
            ));
        }
        check_declared_len(byte_count as usize, payload.len(), "coil data")?;
        Ok(Self {
            unit_id,
            data: payload.to_vec(),
        })
    }
}
