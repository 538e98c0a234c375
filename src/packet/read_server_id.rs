use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{rtu_request_error, tcp_request_error, Packet, RequestPacket};

/// Read Server ID request (function code 0x11). The PDU has no body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadServerIdRequest {
    pub unit_id: u8,
}

impl ReadServerIdRequest {
    pub fn new(unit_id: u8) -> Self {
        Self { unit_id }
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

impl Packet for ReadServerIdRequest {
    const FUNCTION_CODE: u8 = 0x11;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        0
    }

    fn write_body(&self, _dst: &mut Vec<u8>) {}

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if !body.is_empty() {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("read server id request carries no body, got {} bytes", body.len()),
            ));
        }
        Ok(Self { unit_id })
    }
}

impl RequestPacket for ReadServerIdRequest {
    /// The response is variable length; this is the minimum (1-byte server
    /// id, no additional data).
    fn response_body_len(&self) -> usize {
        3
    }
}

/// Read Server ID response: device-specific identifier, run status, and any
/// extra bytes the device appends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadServerIdResponse {
    pub unit_id: u8,
    pub server_id: Vec<u8>,
    pub run_status: u8,
    pub additional_data: Vec<u8>,
}

impl ReadServerIdResponse {
    pub fn is_running(&self) -> bool {
        self.run_status == 0xFF
    }

    pub fn parse_tcp(data: &[u8]) -> Result<TcpFrame<Self>, ModbusError> {
        TcpFrame::parse(data)
    }

    /// RTU parse; the trailing CRC is excluded from `additional_data`.
    pub fn parse_rtu(data: &[u8]) -> Result<RtuFrame<Self>, ModbusError> {
        RtuFrame::parse(data)
    }

    pub fn parse_rtu_with_crc(data: &[u8]) -> Result<RtuFrame<Self>, ModbusError> {
        RtuFrame::parse_with_crc(data)
    }
}

impl Packet for ReadServerIdResponse {
    const FUNCTION_CODE: u8 = 0x11;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        2 + self.server_id.len() + self.additional_data.len()
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.push(self.server_id.len() as u8);
        dst.extend_from_slice(&self.server_id);
        dst.push(self.run_status);
        dst.extend_from_slice(&self.additional_data);
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        let Some((&server_id_len, rest)) = body.split_first() else {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                "read server id response is missing its length byte",
            ));
        };
        if server_id_len == 0 {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                "server id length must be at least 1",
            ));
        }
        if rest.len() < server_id_len as usize + 1 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "read server id response is truncated: server id length {server_id_len}, got {} bytes",
                    rest.len()
                ),
            ));
        }
        let (server_id, rest) = rest.split_at(server_id_len as usize);
        Ok(Self {
            unit_id,
            server_id: server_id.to_vec(),
            run_status: rest[0],
            additional_data: rest[1..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_encoding() {
        let request = ReadServerIdRequest::new(0x11);
        let rtu = RtuFrame::new(request.clone());
        assert_eq!(rtu.bytes(), [0x11, 0x11, 0xCD, 0xEC]);
        assert_eq!(rtu.expected_response_length(), 7);

        let tcp = TcpFrame::with_transaction_id(1, request);
        assert_eq!(
            tcp.bytes(),
            [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x11, 0x11]
        );
        assert_eq!(tcp.expected_response_length(), 11);
    }

    #[test]
    fn test_request_round_trip() {
        let request = ReadServerIdRequest::new(7);
        let tcp = TcpFrame::with_transaction_id(2, request.clone());
        assert_eq!(ReadServerIdRequest::parse_tcp(&tcp.bytes()).unwrap(), tcp);
        let rtu = RtuFrame::new(request);
        assert_eq!(
            ReadServerIdRequest::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
    }

    #[test]
    fn test_response_rtu_excludes_crc_from_additional_data() {
        // unit=0x11, id=[AB CD], status=0x00, no additional data.
        let data = [0x11, 0x11, 0x02, 0xAB, 0xCD, 0x00, 0xDB, 0x91];
        let frame = ReadServerIdResponse::parse_rtu_with_crc(&data).unwrap();
        assert_eq!(frame.body.server_id, [0xAB, 0xCD]);
        assert_eq!(frame.body.run_status, 0x00);
        assert!(frame.body.additional_data.is_empty());
        assert!(!frame.body.is_running());
        assert_eq!(frame.bytes(), data);
    }

    #[test]
    fn test_response_with_additional_data() {
        let response = ReadServerIdResponse {
            unit_id: 1,
            server_id: vec![0x42],
            run_status: 0xFF,
            additional_data: vec![0x01, 0x02, 0x03],
        };
        let tcp = TcpFrame::with_transaction_id(9, response.clone());
        let parsed = ReadServerIdResponse::parse_tcp(&tcp.bytes()).unwrap();
        assert_eq!(parsed, tcp);
        assert!(parsed.body.is_running());

        let rtu = RtuFrame::new(response);
        assert_eq!(
            ReadServerIdResponse::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
    }

    #[test]
    fn test_response_rejects_zero_length_server_id() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x00, 0x04, 0x01, 0x11, 0x00, 0xFF];
        let err = ReadServerIdResponse::parse_tcp(&data).unwrap_err();
        assert_eq!(err.exception_code(), Some(ExceptionCode::IllegalDataValue));
    }

    #[test]
    fn test_response_rejects_truncated_server_id() {
        // Declares a 5-byte id but carries 2 bytes and no run status.
        let data = [0x00, 0x01, 0x00, 0x00, 0x00, 0x05, 0x01, 0x11, 0x05, 0xAB, 0xCD];
        let err = ReadServerIdResponse::parse_tcp(&data).unwrap_err();
        assert_eq!(err.exception_code(), Some(ExceptionCode::ServerFailure));
    }
}
