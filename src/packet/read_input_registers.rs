use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{
    check_declared_len, rtu_request_error, tcp_request_error, Packet, RequestPacket,
    MAX_READ_QUANTITY,
};
use crate::view::{ByteOrder, RegisterView};

/// Read Input Registers request (function code 0x04). Same wire shape as
/// Read Holding Registers, addressing the read-only register space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadInputRegistersRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadInputRegistersRequest {
    pub fn new(unit_id: u8, start_address: u16, quantity: u16) -> Result<Self, ModbusError> {
        if quantity == 0 || quantity > MAX_READ_QUANTITY {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("registers quantity is out of range (1-{MAX_READ_QUANTITY}): {quantity}"),
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

impl Packet for ReadInputRegistersRequest {
    const FUNCTION_CODE: u8 = 0x04;

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
                    "read input registers request body must be 4 bytes, got {}",
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

impl RequestPacket for ReadInputRegistersRequest {
    fn response_body_len(&self) -> usize {
        1 + 2 * self.quantity as usize
    }
}

/// Read Input Registers response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadInputRegistersResponse {
    pub unit_id: u8,
    pub data: Vec<u8>,
}

impl ReadInputRegistersResponse {
    pub fn byte_count(&self) -> u8 {
        self.data.len() as u8
    }

    pub fn registers(&self) -> Vec<u16> {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }

    pub fn register_view(
        &self,
        start_address: u16,
        byte_order: ByteOrder,
    ) -> Result<RegisterView, ModbusError> {
        RegisterView::new(self.data.clone(), start_address, byte_order)
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

impl Packet for ReadInputRegistersResponse {
    const FUNCTION_CODE: u8 = 0x04;

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
                "read input registers response is missing its byte count",
            ));
        };
        if byte_count == 0 || byte_count % 2 != 0 {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("register data byte count must be a positive even number: {byte_count}"),
            ));
        }
        check_declared_len(byte_count as usize, payload.len(), "register data")?;
        Ok(Self {
            unit_id,
            data: payload.to_vec(),
        })
    }
}
