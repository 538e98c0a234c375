use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crc::crc16;
use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::packet::{supported_function_code, ErrorResponse, Packet, RequestPacket};

/// MBAP header of a Modbus TCP frame.
///
/// The protocol identifier is not modeled: it is always written as 0 and any
/// nonzero value on parse is a framing failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MbapHeader {
    pub transaction_id: u16,
    /// Number of bytes following the length field: unit id + PDU.
    pub length: u16,
}

impl MbapHeader {
    /// Parses the header and validates it against the full frame in `data`.
    ///
    /// The whole buffer must hold exactly one frame: `data.len() == 6 + length`.
    pub fn parse(data: &[u8]) -> Result<Self, ModbusError> {
        if data.len() < 6 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!("data is too short to contain an MBAP header: {} bytes", data.len()),
            ));
        }
        let protocol_id = u16::from_be_bytes([data[2], data[3]]);
        if protocol_id != 0 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!("invalid protocol id: {protocol_id}"),
            ));
        }
        let length = u16::from_be_bytes([data[4], data[5]]);
        if length == 0 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                "MBAP length field is zero",
            ));
        }
        if data.len() != 6 + length as usize {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!(
                    "frame length {} does not match MBAP length field: expected {}",
                    data.len(),
                    6 + length as usize
                ),
            ));
        }
        Ok(Self {
            transaction_id: u16::from_be_bytes([data[0], data[1]]),
            length,
        })
    }

    pub fn write(&self, dst: &mut Vec<u8>) {
        dst.extend_from_slice(&self.transaction_id.to_be_bytes());
        dst.extend_from_slice(&[0x00, 0x00]);
        dst.extend_from_slice(&self.length.to_be_bytes());
    }
}

/// Appends the Modbus CRC to an RTU frame, low byte first.
pub fn append_crc(frame: &mut Vec<u8>) {
    let crc = crc16(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

/// Checks the trailing two CRC bytes of an RTU frame.
pub fn validate_crc(frame: &[u8]) -> Result<(), ModbusError> {
    if frame.len() < 3 {
        return Err(ModbusError::protocol(
            ExceptionCode::ServerFailure,
            format!("frame is too short to carry a CRC: {} bytes", frame.len()),
        ));
    }
    let (payload, tail) = frame.split_at(frame.len() - 2);
    let received = u16::from_le_bytes([tail[0], tail[1]]);
    let calculated = crc16(payload);
    if calculated != received {
        debug!(
            "CRC mismatch: calculated={:04X}, received={:04X}, frame={:02X?}",
            calculated, received, payload
        );
        return Err(ModbusError::InvalidCrc {
            calculated,
            received,
            frame_hex: hex::encode(payload),
        });
    }
    Ok(())
}

fn random_transaction_id() -> u16 {
    rand::thread_rng().gen_range(1..=65534)
}

/// A packet in Modbus TCP framing: MBAP header, unit id, PDU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TcpFrame<T> {
    pub transaction_id: u16,
    pub body: T,
}

impl<T: Packet> TcpFrame<T> {
    /// Wraps a packet with a fresh transaction id drawn uniformly from
    /// [1, 65534]. The source is not cryptographic.
    pub fn new(body: T) -> Self {
        Self {
            transaction_id: random_transaction_id(),
            body,
        }
    }

    /// Deterministic constructor; the `transaction_id` field stays assignable
    /// for callers that correlate replies themselves.
    pub fn with_transaction_id(transaction_id: u16, body: T) -> Self {
        Self {
            transaction_id,
            body,
        }
    }

    pub fn function_code(&self) -> u8 {
        T::FUNCTION_CODE
    }

    pub fn unit_id(&self) -> u8 {
        self.body.unit_id()
    }

    /// Encodes the frame into a new buffer sized exactly to the wire length.
    pub fn bytes(&self) -> Vec<u8> {
        let body_len = self.body.body_len();
        let mut out = Vec::with_capacity(8 + body_len);
        MbapHeader {
            transaction_id: self.transaction_id,
            length: (2 + body_len) as u16,
        }
        .write(&mut out);
        out.push(self.body.unit_id());
        out.push(T::FUNCTION_CODE);
        self.body.write_body(&mut out);
        out
    }

    /// Parses one complete TCP frame holding this packet type.
    pub fn parse(data: &[u8]) -> Result<Self, ModbusError> {
        let header = MbapHeader::parse(data)?;
        if header.length < 2 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                "frame carries an empty PDU",
            ));
        }
        let unit_id = data[6];
        let function_code = data[7];
        if function_code != T::FUNCTION_CODE {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalFunction,
                format!(
                    "received function code {function_code} does not match expected {}",
                    T::FUNCTION_CODE
                ),
            ));
        }
        let body = T::parse_body(unit_id, &data[8..])?;
        Ok(Self {
            transaction_id: header.transaction_id,
            body,
        })
    }
}

impl<T: RequestPacket> TcpFrame<T> {
    /// Byte count the matching successful response occupies on the wire.
    pub fn expected_response_length(&self) -> usize {
        8 + self.body.response_body_len()
    }
}

/// A packet in Modbus RTU framing: unit id, PDU, trailing CRC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtuFrame<T> {
    pub body: T,
}

impl<T: Packet> RtuFrame<T> {
    pub fn new(body: T) -> Self {
        Self { body }
    }

    pub fn function_code(&self) -> u8 {
        T::FUNCTION_CODE
    }

    pub fn unit_id(&self) -> u8 {
        self.body.unit_id()
    }

    pub fn bytes(&self) -> Vec<u8> {
        let body_len = self.body.body_len();
        let mut out = Vec::with_capacity(4 + body_len);
        out.push(self.body.unit_id());
        out.push(T::FUNCTION_CODE);
        self.body.write_body(&mut out);
        append_crc(&mut out);
        out
    }

    /// Parses an RTU frame, treating the trailing two bytes as CRC without
    /// verifying them. Use [`RtuFrame::parse_with_crc`] when the CRC has not
    /// been checked upstream.
    pub fn parse(data: &[u8]) -> Result<Self, ModbusError> {
        if data.len() < 4 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!("RTU frame is too short: {} bytes", data.len()),
            ));
        }
        let unit_id = data[0];
        let function_code = data[1];
        if function_code != T::FUNCTION_CODE {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalFunction,
                format!(
                    "received function code {function_code} does not match expected {}",
                    T::FUNCTION_CODE
                ),
            ));
        }
        let body = T::parse_body(unit_id, &data[2..data.len() - 2])?;
        Ok(Self { body })
    }

    /// Parses an RTU frame after verifying its CRC.
    pub fn parse_with_crc(data: &[u8]) -> Result<Self, ModbusError> {
        if data.len() < 4 {
            return Err(ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!("RTU frame is too short: {} bytes", data.len()),
            ));
        }
        validate_crc(data)?;
        Self::parse(data)
    }
}

impl<T: RequestPacket> RtuFrame<T> {
    /// Byte count the matching successful response occupies on the wire.
    pub fn expected_response_length(&self) -> usize {
        4 + self.body.response_body_len()
    }
}

/// Verdict on a buffered TCP stream prefix.
#[derive(Debug)]
pub enum TcpFrameStatus {
    /// Fewer than 8 bytes buffered; read more before judging.
    TooShort,
    /// The prefix cannot be the start of a Modbus TCP frame.
    NotModbusTcp,
    /// Total byte count of the frame once fully buffered.
    ///
    /// `reject` carries the exception to answer with after draining the
    /// frame, when strict checking found an unsupported function code.
    Expected {
        length: usize,
        reject: Option<RequestError>,
    },
}

/// Inspects a stream prefix for a complete Modbus TCP frame.
///
/// With `allow_unsupported_function_codes` false, a structurally valid frame
/// whose function code is outside the supported set still reports its full
/// length, so the transport can read the remainder off the wire, and carries
/// an `IllegalFunction` reject populated with transaction id, unit id and the
/// offending code.
pub fn looks_like_modbus_tcp(data: &[u8], allow_unsupported_function_codes: bool) -> TcpFrameStatus {
    if data.len() < 8 {
        return TcpFrameStatus::TooShort;
    }
    let protocol_id = u16::from_be_bytes([data[2], data[3]]);
    let length = u16::from_be_bytes([data[4], data[5]]);
    let function_code = data[7];
    if protocol_id != 0 || length < 3 || function_code == 0 {
        return TcpFrameStatus::NotModbusTcp;
    }
    let expected = 6 + length as usize;
    let reject = if !allow_unsupported_function_codes && !supported_function_code(function_code) {
        let transaction_id = u16::from_be_bytes([data[0], data[1]]);
        let unit_id = data[6];
        Some(RequestError {
            error: ModbusError::protocol(
                ExceptionCode::IllegalFunction,
                format!("unsupported function code: {function_code}"),
            ),
            response: Some(ErrorResponse::tcp(
                transaction_id,
                unit_id,
                function_code,
                ExceptionCode::IllegalFunction,
            )),
        })
    } else {
        None
    };
    TcpFrameStatus::Expected {
        length: expected,
        reject,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::ReadCoilsRequest;

    #[test]
    fn test_mbap_header_round_trip() {
        let header = MbapHeader {
            transaction_id: 0x1234,
            length: 6,
        };
        let mut out = Vec::new();
        header.write(&mut out);
        assert_eq!(out, [0x12, 0x34, 0x00, 0x00, 0x00, 0x06]);

        let mut frame = out.clone();
        frame.extend_from_slice(&[0x01, 0x01, 0x00, 0xC8, 0x00, 0x0A]);
        assert_eq!(MbapHeader::parse(&frame).unwrap(), header);
    }

    #[test]
    fn test_mbap_header_rejects_bad_frames() {
        // Too short.
        assert!(MbapHeader::parse(&[0x00, 0x01]).is_err());
        // Nonzero protocol id.
        let frame = [0x00, 0x01, 0x00, 0x01, 0x00, 0x02, 0x01, 0x11];
        assert!(MbapHeader::parse(&frame).is_err());
        // Zero length.
        let frame = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00];
        assert!(MbapHeader::parse(&frame).is_err());
        // Length field disagrees with buffer.
        let frame = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x11];
        let err = MbapHeader::parse(&frame).unwrap_err();
        assert_eq!(err.exception_code(), Some(ExceptionCode::ServerFailure));
    }

    #[test]
    fn test_tcp_frame_length_invariant() {
        let request = ReadCoilsRequest::new(1, 200, 10).unwrap();
        let bytes = TcpFrame::with_transaction_id(0x1234, request).bytes();
        assert!(bytes.len() >= 8);
        let length = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
        assert_eq!(length, bytes.len() - 6);
    }

    #[test]
    fn test_random_transaction_id_stays_in_range() {
        for _ in 0..1000 {
            let frame = TcpFrame::new(ReadCoilsRequest::new(1, 0, 1).unwrap());
            assert!(frame.transaction_id >= 1 && frame.transaction_id <= 65534);
        }
    }

    #[test]
    fn test_rtu_crc_append_and_validate() {
        let mut frame = vec![0x01, 0x04, 0x02, 0xFF, 0xFF];
        append_crc(&mut frame);
        assert_eq!(&frame[5..], [0xB8, 0x80]);
        assert!(validate_crc(&frame).is_ok());

        frame[3] ^= 0x01;
        match validate_crc(&frame) {
            Err(ModbusError::InvalidCrc { received, .. }) => assert_eq!(received, 0x80B8),
            other => panic!("expected InvalidCrc, got {other:?}"),
        }
    }

    #[test]
    fn test_looks_like_modbus_tcp_short_and_garbage() {
        assert!(matches!(
            looks_like_modbus_tcp(&[0x12, 0x34, 0x00], true),
            TcpFrameStatus::TooShort
        ));
        // Nonzero protocol id.
        let frame = [0x12, 0x34, 0x00, 0x01, 0x00, 0x06, 0x01, 0x03];
        assert!(matches!(
            looks_like_modbus_tcp(&frame, true),
            TcpFrameStatus::NotModbusTcp
        ));
        // Length below minimum.
        let frame = [0x12, 0x34, 0x00, 0x00, 0x00, 0x02, 0x01, 0x03];
        assert!(matches!(
            looks_like_modbus_tcp(&frame, true),
            TcpFrameStatus::NotModbusTcp
        ));
        // Function code zero.
        let frame = [0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x01, 0x00];
        assert!(matches!(
            looks_like_modbus_tcp(&frame, true),
            TcpFrameStatus::NotModbusTcp
        ));
    }

    #[test]
    fn test_looks_like_modbus_tcp_unsupported_function_code() {
        let frame = [
            0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x10, 0x1E, 0x00, 0x00, 0x00, 0x01,
        ];
        match looks_like_modbus_tcp(&frame, false) {
            TcpFrameStatus::Expected {
                length,
                reject: Some(reject),
            } => {
                assert_eq!(length, 12);
                let response = reject.response.unwrap();
                assert_eq!(response.transaction_id, Some(0x1234));
                assert_eq!(response.unit_id, 0x10);
                assert_eq!(response.function_code, 0x1E);
                assert_eq!(response.exception, ExceptionCode::IllegalFunction);
            }
            other => panic!("expected rejected frame, got {other:?}"),
        }
        match looks_like_modbus_tcp(&frame, true) {
            TcpFrameStatus::Expected {
                length,
                reject: None,
            } => assert_eq!(length, 12),
            other => panic!("expected accepted frame, got {other:?}"),
        }
    }

    #[test]
    fn test_tcp_frame_rejects_wrong_function_code() {
        // FC03 frame parsed as a read-coils request.
        let frame = [
            0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x6B, 0x00, 0x01,
        ];
        let err = TcpFrame::<ReadCoilsRequest>::parse(&frame).unwrap_err();
        assert_eq!(err.exception_code(), Some(ExceptionCode::IllegalFunction));
    }
}
