use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{RtuFrame, TcpFrame};
use crate::packet::{
    check_declared_len, rtu_request_error, tcp_request_error, Packet, RequestPacket,
    MAX_WRITE_COILS,
};

/// Write Multiple Coils request (function code 0x0F).
///
/// `data` holds the coil states packed eight per byte, lowest bit first,
/// exactly as transmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteMultipleCoilsRequest {
    pub unit_id: u8,
    pub start_address: u16,
    pub coil_count: u16,
    pub data: Vec<u8>,
}

impl WriteMultipleCoilsRequest {
    pub fn new(unit_id: u8, start_address: u16, coils: &[bool]) -> Result<Self, ModbusError> {
        if coils.is_empty() || coils.len() > MAX_WRITE_COILS as usize {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!(
                    "coils count is out of range (1-{MAX_WRITE_COILS}): {}",
                    coils.len()
                ),
            ));
        }
        let mut data = vec![0u8; coils.len().div_ceil(8)];
        for (index, &coil) in coils.iter().enumerate() {
            if coil {
                data[index / 8] |= 1 << (index % 8);
            }
        }
        Ok(Self {
            unit_id,
            start_address,
            coil_count: coils.len() as u16,
            data,
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

impl Packet for WriteMultipleCoilsRequest {
    const FUNCTION_CODE: u8 = 0x0F;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        5 + self.data.len()
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.start_address.to_be_bytes());
        dst.extend_from_slice(&self.coil_count.to_be_bytes());
        dst.push(self.data.len() as u8);
        dst.extend_from_slice(&self.data);
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() < 5 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "write multiple coils request body must be at least 5 bytes, got {}",
                    body.len()
                ),
            ));
        }
        let start_address = u16::from_be_bytes([body[0], body[1]]);
        let coil_count = u16::from_be_bytes([body[2], body[3]]);
        let byte_count = body[4];
        if coil_count == 0 || coil_count > MAX_WRITE_COILS {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("coils count is out of range (1-{MAX_WRITE_COILS}): {coil_count}"),
            ));
        }
        if usize::from(byte_count) != (coil_count as usize).div_ceil(8) {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("byte count {byte_count} does not match coils count {coil_count}"),
            ));
        }
        check_declared_len(byte_count as usize, body.len() - 5, "coil data")?;
        Ok(Self {
            unit_id,
            start_address,
            coil_count,
            data: body[5..].to_vec(),
        })
    }
}

impl RequestPacket for WriteMultipleCoilsRequest {
    fn response_body_len(&self) -> usize {
        4
    }
}

/// Write Multiple Coils response: start address and count of coils written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteMultipleCoilsResponse {
    pub unit_id: u8,
    pub start_address: u16,
    pub coil_count: u16,
}

impl WriteMultipleCoilsResponse {
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

impl Packet for WriteMultipleCoilsResponse {
    const FUNCTION_CODE: u8 = 0x0F;

    fn unit_id(&self) -> u8 {
        self.unit_id
    }

    fn body_len(&self) -> usize {
        4
    }

    fn write_body(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.start_address.to_be_bytes());
        dst.extend_from_slice(&self.coil_count.to_be_bytes());
    }

    fn parse_body(unit_id: u8, body: &[u8]) -> Result<Self, ModbusError> {
        if body.len() != 4 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "write multiple coils response body must be 4 bytes, got {}",
                    body.len()
                ),
            ));
        }
        Ok(Self {
            unit_id,
            start_address: u16::from_be_bytes([body[0], body[1]]),
            coil_count: u16::from_be_bytes([body[2], body[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_packs_bits_lsb_first() {
        let request =
            WriteMultipleCoilsRequest::new(0x11, 0x0410, &[true, false, true]).unwrap();
        assert_eq!(request.coil_count, 3);
        assert_eq!(request.data, [0x05]);

        let rtu = RtuFrame::new(request);
        assert_eq!(
            rtu.bytes(),
            [0x11, 0x0F, 0x04, 0x10, 0x00, 0x03, 0x01, 0x05, 0x8E, 0x1F]
        );
        assert_eq!(rtu.expected_response_length(), 8);
    }

    #[test]
    fn test_request_round_trip() {
        let coils: Vec<bool> = (0..10).map(|i| i % 3 == 0).collect();
        let request = WriteMultipleCoilsRequest::new(1, 0x0020, &coils).unwrap();
        let tcp = TcpFrame::with_transaction_id(8, request.clone());
        assert_eq!(tcp.expected_response_length(), 12);
        assert_eq!(
            WriteMultipleCoilsRequest::parse_tcp(&tcp.bytes()).unwrap(),
            tcp
        );
        let rtu = RtuFrame::new(request);
        assert_eq!(
            WriteMultipleCoilsRequest::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
    }

    #[test]
    fn test_request_count_bounds() {
        assert!(WriteMultipleCoilsRequest::new(1, 0, &[]).is_err());
        assert!(WriteMultipleCoilsRequest::new(1, 0, &vec![false; 1969]).is_err());
        assert!(WriteMultipleCoilsRequest::new(1, 0, &vec![false; 1968]).is_ok());
    }

    #[test]
    fn test_parse_count_bounds() {
        use crate::frame::append_crc;

        // Zero coils.
        let mut frame = vec![0x01, 0x0F, 0x00, 0x10, 0x00, 0x00, 0x01, 0x00];
        append_crc(&mut frame);
        let err = WriteMultipleCoilsRequest::parse_rtu_with_crc(&frame).unwrap_err();
        assert_eq!(
            err.error.exception_code(),
            Some(ExceptionCode::IllegalDataValue)
        );

        // 1969 coils, byte count consistent at 247.
        let mut frame = vec![0x01, 0x0F, 0x00, 0x10, 0x07, 0xB1, 0xF7];
        frame.extend_from_slice(&[0x00; 247]);
        append_crc(&mut frame);
        let err = WriteMultipleCoilsRequest::parse_rtu_with_crc(&frame).unwrap_err();
        assert_eq!(
            err.error.exception_code(),
            Some(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn test_parse_rejects_byte_count_mismatch() {
        let request = WriteMultipleCoilsRequest::new(1, 0, &[true; 9]).unwrap();
        let mut frame = TcpFrame::with_transaction_id(1, request).bytes();
        // Claim 9 coils fit in one byte.
        frame[12] = 0x01;
        frame[5] -= 1; // keep the MBAP length consistent
        frame.pop();
        let err = WriteMultipleCoilsRequest::parse_tcp(&frame).unwrap_err();
        assert_eq!(
            err.error.exception_code(),
            Some(ExceptionCode::IllegalDataValue)
        );
    }

    #[test]
    fn test_response_round_trip() {
        let response = WriteMultipleCoilsResponse {
            unit_id: 0x11,
            start_address: 0x0410,
            coil_count: 3,
        };
        let rtu = RtuFrame::new(response.clone());
        assert_eq!(
            WriteMultipleCoilsResponse::parse_rtu_with_crc(&rtu.bytes()).unwrap(),
            rtu
        );
        let tcp = TcpFrame::with_transaction_id(2, response);
        assert_eq!(
            WriteMultipleCoilsResponse::parse_tcp(&tcp.bytes()).unwrap(),
            tcp
        );
    }
}
