use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{
    check_declared_len, rtu_request_error, tcp_request_error, Packet, RequestPacket,
    MAX_READ_QUANTITY,
};
use crate::view::{ByteOrder, RegisterView};

/// Read Holding Registers request (function code 0x03).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadHoldingRegistersRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub quantity: u16,
}

impl ReadHoldingRegistersRequest {
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

impl Packet for ReadHoldingRegistersRequest {
    const FUNCTION_CODE: u8 = 0x03;

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
                    "read holding registers request body must be 4 bytes, got {}",
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

impl RequestPacket for ReadHoldingRegistersRequest {
    fn response_body_len(&self) -> usize {
        1 + 2 * self.quantity as usize
    }
}

/// Read Holding Registers response: registers transmitted big-endian, two
/// bytes each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadHoldingRegistersResponse {
    pub unit_id: u8,
    pub data: Vec<u8>,
}

impl ReadHoldingRegistersResponse {
    pub fn byte_count(&self) -> u8 {
        self.data.len() as u8
    }

    /// Raw register values in transmission order.
    pub fn registers(&self) -> Vec<u16> {
        self.data
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }

    /// Typed view over the payload, addressed from the start address the
    /// originating request used.
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

impl Packet for ReadHoldingRegistersResponse {
    const FUNCTION_CODE: u8 = 0x03;

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
                "read holding registers response is missing its byte count",
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_tcp_encoding() {
        // txid=1, unit=1, start=0x006B, qty=1.
        let request = ReadHoldingRegistersRequest::new(1, 0x006B, 1).unwrap();
        let frame = TcpFrame::with_transaction_id(1, request);
        assert_eq!(
            frame.bytes(),
            [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x6B, 0x00, 0x01]
        );
        assert_eq!(frame.expected_response_length(), 11);
    }

    #[test]
    fn test_request_round_trip() {
        let request = ReadHoldingRegistersRequest::new(1, 0x006B, 2).unwrap();
        let tcp = TcpFrame::with_transaction_id(0x0102, request.clone());
        assert_eq!(
            ReadHoldingRegistersRequest::parse_tcp(&tcp.bytes()).unwrap(),
            tcp
        );
        let rtu = RtuFrame::new(request);
        assert_eq!(
            ReadHoldingRegistersRequest::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
        assert_eq!(rtu.expected_response_length(), 9);
    }

    #[test]
    fn test_quantity_bounds_match_on_both_sides() {
        assert!(ReadHoldingRegistersRequest::new(1, 0, 0).is_err());
        assert!(ReadHoldingRegistersRequest::new(1, 0, 126).is_err());
        assert!(ReadHoldingRegistersRequest::new(1, 0, 125).is_ok());

        let mut frame =
            TcpFrame::with_transaction_id(1, ReadHoldingRegistersRequest::new(1, 0, 1).unwrap())
                .bytes();
        frame[11] = 0x00; // quantity 0
        let err = ReadHoldingRegistersRequest::parse_tcp(&frame).unwrap_err();
        assert_eq!(
            err.error.exception_code(),
            Some(ExceptionCode::IllegalDataValue)
        );
        frame[11] = 0x7E; // quantity 126
        assert!(ReadHoldingRegistersRequest::parse_tcp(&frame).is_err());
    }

    #[test]
    fn test_response_round_trip_and_registers() {
        let response = ReadHoldingRegistersResponse {
            unit_id: 1,
            data: vec![0x01, 0x02, 0x03, 0x04],
        };
        assert_eq!(response.registers(), [0x0102, 0x0304]);

        let rtu = RtuFrame::new(response.clone());
        assert_eq!(
            rtu.bytes(),
            [0x01, 0x03, 0x04, 0x01, 0x02, 0x03, 0x04, 0x5B, 0x3C]
        );
        assert_eq!(
            ReadHoldingRegistersResponse::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );

        let tcp = TcpFrame::with_transaction_id(2, response);
        assert_eq!(
            ReadHoldingRegistersResponse::parse_tcp(&tcp.bytes()).unwrap(),
            tcp
        );
    }

    #[test]
    fn test_response_rejects_odd_byte_count() {
        let data = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x03, 0x01, 0x02, 0x03,
        ];
        let err = ReadHoldingRegistersResponse::parse_tcp(&data).unwrap_err();
        assert_eq!(err.exception_code(), Some(ExceptionCode::IllegalDataValue));
    }

    #[test]
    fn test_register_view_from_response() {
        let response = ReadHoldingRegistersResponse {
            unit_id: 1,
            data: vec![0x01, 0x02, 0x03, 0x04],
        };
        let view = response
            .register_view(10, ByteOrder::BigEndianHighWordFirst)
            .unwrap();
        assert_eq!(view.read_u32(10).unwrap(), 0x0102_0304);
    }
}
