use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{
    check_declared_len, rtu_request_error, tcp_request_error, Packet, RequestPacket,
    MAX_READ_QUANTITY, MAX_READ_WRITE_WRITE_REGISTERS,
};
use crate::view::{ByteOrder, RegisterView};

/// Read/Write Multiple Registers request (function code 0x17). The write
/// happens before the read on the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWriteMultipleRegistersRequest {
    pub unit_id: u8,
    pub read_start_address: u16,
    pub read_quantity: u16,
    pub write_start_address: u16,
    pub write_register_count: u16,
    /// Registers to write, big-endian, two bytes each.
    pub write_data: Vec<u8>,
}

impl ReadWriteMultipleRegistersRequest {
    pub fn new(
        unit_id: u8,
        read_start_address: u16,
        read_quantity: u16,
        write_start_address: u16,
        write_registers: &[u16],
    ) -> Result<Self, ModbusError> {
        if read_quantity == 0 || read_quantity > MAX_READ_QUANTITY {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!(
                    "read quantity is out of range (1-{MAX_READ_QUANTITY}): {read_quantity}"
                ),
            ));
        }
        if write_registers.is_empty()
            || write_registers.len() > MAX_READ_WRITE_WRITE_REGISTERS as usize
        {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!(
                    "write registers count is out of range (1-{MAX_READ_WRITE_WRITE_REGISTERS}): {}",
                    write_registers.len()
                ),
            ));
        }
        let mut write_data = Vec::with_capacity(write_registers.len() * 2);
        for register in write_registers {
            write_data.extend_from_slice(&register.to_be_bytes());
        }
        Ok(Self {
            unit_id,
            read_start_address,
            read_quantity,
            write_start_address,
            write_register_count: write_registers.len() as u16,
            write_data,
        })
    }

    pub fn write_registers(&self) -> Vec<u16> {
        self.write_data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
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

impl Packet for ReadWriteMultipleRegistersRequest {
    const FUNCTION_CODE: u8 = 0x17;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        9 + self.write_data.len()
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.read_start_address.to_be_bytes());
        dst.extend_from_slice(&self.read_quantity.to_be_bytes());
        dst.extend_from_slice(&self.write_start_address.to_be_bytes());
        dst.extend_from_slice(&self.write_register_count.to_be_bytes());
        dst.push(self.write_data.len() as u8);
        dst.extend_from_slice(&self.write_data);
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() < 9 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "read/write multiple registers request body must be at least 9 bytes, got {}",
                    body.len()
                ),
            ));
        }
        let read_start_address = u16::from_be_bytes([body[0], body[1]]);
        let read_quantity = u16::from_be_bytes([body[2], body[3]]);
        let write_start_address = u16::from_be_bytes([body[4], body[5]]);
        let write_register_count = u16::from_be_bytes([body[6], body[7]]);
        let byte_count = body[8];
        if read_quantity == 0 || read_quantity > MAX_READ_QUANTITY {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("read quantity is out of range (1-{MAX_READ_QUANTITY}): {read_quantity}"),
            ));
        }
        if write_register_count == 0
            || write_register_count > MAX_READ_WRITE_WRITE_REGISTERS
        {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!(
                    "write registers count is out of range (1-{MAX_READ_WRITE_WRITE_REGISTERS}): {write_register_count}"
                ),
            ));
        }
        if usize::from(byte_count) != write_register_count as usize * 2 {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!(
                    "byte count {byte_count} does not match write registers count {write_register_count}"
                ),
            ));
        }
        check_declared_len(byte_count as usize, body.len() - 9, "write register data")?;
        Ok(Self {
            unit_id,
            read_start_address,
            read_quantity,
            write_start_address,
            write_register_count,
            write_data: body[9..].to_vec(),
        })
    }
}

impl RequestPacket for ReadWriteMultipleRegistersRequest {
    fn response_body_len(&self) -> usize {
        1 + 2 * self.read_quantity as usize
    }
}

/// Read/Write Multiple Registers response, same shape as a Read Holding
/// Registers response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadWriteMultipleRegistersResponse {
    pub unit_id: u8,
    pub data: Vec<u8>,
}

impl ReadWriteMultipleRegistersResponse {
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

impl Packet for ReadWriteMultipleRegistersResponse {
    const FUNCTION_CODE: u8 = 0x17;

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
                "read/write multiple registers response is missing its byte count",
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
