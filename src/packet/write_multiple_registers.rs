use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{
    check_declared_len, rtu_request_error, tcp_request_error, Packet, RequestPacket,
    MAX_WRITE_REGISTERS,
};

/// Write Multiple Registers request (function code 0x10).
///
/// `data` holds the register values big-endian, two bytes each, exactly as
/// transmitted. The count limit of 123 registers applies on construction and
/// on parse alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteMultipleRegistersRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub register_count: u16,
    pub data: Vec<u8>,
}

impl WriteMultipleRegistersRequest {
    pub fn new(unit_id: u8, start_address: u16, registers: &[u16]) -> Result<Self, ModbusError> {
        if registers.is_empty() || registers.len() > MAX_WRITE_REGISTERS as usize {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!(
                    "registers count is out of range (1-{MAX_WRITE_REGISTERS}): {}",
                    registers.len()
                ),
            ));
        }
        let mut data = Vec::with_capacity(registers.len() * 2);
        for register in registers {
            data.extend_from_slice(&register.to_be_bytes());
        }
        Ok(Self {
            unit_id,
            start_address,
            register_count: registers.len() as u16,
            data,
        })
    }

    pub fn registers(&self) -> Vec<u16> {
        self.data
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

impl Packet for WriteMultipleRegistersRequest {
    const FUNCTION_CODE: u8 = 0x10;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        5 + self.data.len()
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.start_address.to_be_bytes());
        dst.extend_from_slice(&self.register_count.to_be_bytes());
        dst.push(self.data.len() as u8);
        dst.extend_from_slice(&self.data);
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() < 5 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "write multiple registers request body must be at least 5 bytes, got {}",
                    body.len()
                ),
            ));
        }
        let start_address = u16::from_be_bytes([body[0], body[1]]);
        let register_count = u16::from_be_bytes([body[2], body[3]]);
        let byte_count = body[4];
        if register_count == 0 || register_count > MAX_WRITE_REGISTERS {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!(
                    "registers count is out of range (1-{MAX_WRITE_REGISTERS}): {register_count}"
                ),
            ));
        }
        if usize::from(byte_count) != register_count as usize * 2 {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("byte count {byte_count} does not match registers count {register_count}"),
            ));
        }
        check_declared_len(byte_count as usize, body.len() - 5, "register data")?;
        Ok(Self {
            unit_id,
            start_address,
            register_count,
            data: body[5..].to_vec(),
        })
    }
}

impl RequestPacket for WriteMultipleRegistersRequest {
    fn response_body_len(&self) -> usize {
        4
    }
}

/// Write Multiple Registers response: start address and count written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteMultipleRegistersResponse {
    pub unit_id: u8,
    pub start_address: u16,
    pub register_count: u16,
}

impl WriteMultipleRegistersResponse {
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

impl Packet for WriteMultipleRegistersResponse {
    const FUNCTION_CODE: u8 = 0x10;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.start_address.to_be_bytes());
        dst.extend_from_slice(&self.register_count.to_be_bytes());
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() != 4 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "write multiple registers response body must be 4 bytes, got {}",
                    body.len()
                ),
            ));
        }
        Ok(Self {
            unit_id,
            start_address: u16::from_be_bytes([body[0], body[1]]),
            register_count: u16::from_be_bytes([body[2], body[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        let request =
            WriteMultipleRegistersRequest::new(0x11, 0x0001, &[0x000A, 0x0102]).unwrap();
        assert_eq!(request.registers(), [0x000A, 0x0102]);
        let rtu = RtuFrame::new(request);
        assert_eq!(
            rtu.bytes(),
            [0x11, 0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02, 0xC6, 0xF0]
        );
        assert_eq!(rtu.expected_response_length(), 8);
    }

    #[test]
    fn test_request_round_trip() {
        let request = WriteMultipleRegistersRequest::new(1, 0x0001, &[1, 2, 3]).unwrap();
        let tcp = TcpFrame::with_transaction_id(6, request.clone());
        assert_eq!(tcp.expected_response_length(), 12);
        assert_eq!(
            WriteMultipleRegistersRequest::parse_tcp(&tcp.bytes()).unwrap(),
            tcp
        );
        let rtu = RtuFrame::new(request);
        assert_eq!(
            WriteMultipleRegistersRequest::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
    }

    #[test]
    fn test_count_bound_is_123_on_both_sides() {
        assert!(WriteMultipleRegistersRequest::new(1, 0, &[]).is_err());
        assert!(WriteMultipleRegistersRequest::new(1, 0, &vec![0u16; 124]).is_err());
        let request = WriteMultipleRegistersRequest::new(1, 0, &vec![0u16; 123]).unwrap();

        let mut frame = TcpFrame::with_transaction_id(1, request).bytes();
        assert!(WriteMultipleRegistersRequest::parse_tcp(&frame).is_ok());

        // Bump the declared count to 124 and extend the data to match; the
        // parser still refuses.
        frame[11] = 124;
        frame[12] = 248;
        frame.extend_from_slice(&[0x00, 0x00]);
        let length = (frame.len() - 6) as u16;
        frame[4..6].copy_from_slice(&length.to_be_bytes());
        let err = WriteMultipleRegistersRequest::parse_tcp(&frame).unwrap_err();
        assert_eq!(
            err.error.exception_code(),
            Some(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn test_response_round_trip() {
        let response = WriteMultipleRegistersResponse {
            unit_id: 0x11,
            start_address: 0x0410,
            register_count: 2,
        };
        let rtu = RtuFrame::new(response.clone());
        assert_eq!(
            rtu.bytes(),
            [0x11, 0x10, 0x04, 0x10, 0x00, 0x02, 0x43, 0xAD]
        );
        let tcp = TcpFrame::with_transaction_id(3, response);
        assert_eq!(
            WriteMultipleRegistersResponse::parse_tcp(&tcp.bytes()).unwrap(),
            tcp
        );
    }
}
