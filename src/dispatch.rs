use tracing::{debug, trace};

use crate::errors::{ExceptionCode, ModbusError, RequestError};
use crate::frame::{validate_crc, RtuFrame, TcpFrame};
use crate::packet::{
    rtu_request_error, tcp_request_error, ErrorResponse, ReadCoilsRequest, ReadCoilsResponse,
    ReadDiscreteInputsRequest, ReadDiscreteInputsResponse, ReadHoldingRegistersRequest,
    ReadHoldingRegistersResponse, ReadInputRegistersRequest, ReadInputRegistersResponse,
    ReadServerIdRequest, ReadServerIdResponse, ReadWriteMultipleRegistersRequest,
    ReadWriteMultipleRegistersResponse, WriteMultipleCoilsRequest, WriteMultipleCoilsResponse,
    WriteMultipleRegistersRequest, WriteMultipleRegistersResponse, WriteSingleCoilRequest,
    WriteSingleCoilResponse, WriteSingleRegisterRequest, WriteSingleRegisterResponse,
};

/// A parsed Modbus TCP response, tagged by function code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcpResponse {
    ReadCoils(TcpFrame<ReadCoilsResponse>),
    ReadDiscreteInputs(TcpFrame<ReadDiscreteInputsResponse>),
    ReadHoldingRegisters(TcpFrame<ReadHoldingRegistersResponse>),
    ReadInputRegisters(TcpFrame<ReadInputRegistersResponse>),
    WriteSingleCoil(TcpFrame<WriteSingleCoilResponse>),
    WriteSingleRegister(TcpFrame<WriteSingleRegisterResponse>),
    WriteMultipleCoils(TcpFrame<WriteMultipleCoilsResponse>),
    WriteMultipleRegisters(TcpFrame<WriteMultipleRegistersResponse>),
    ReadServerId(TcpFrame<ReadServerIdResponse>),
    ReadWriteMultipleRegisters(TcpFrame<ReadWriteMultipleRegistersResponse>),
}

impl TcpResponse {
    pub fn function_code(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.function_code(),
            Self::ReadDiscreteInputs(frame) => frame.function_code(),
            Self::ReadHoldingRegisters(frame) => frame.function_code(),
            Self::ReadInputRegisters(frame) => frame.function_code(),
            Self::WriteSingleCoil(frame) => frame.function_code(),
            Self::WriteSingleRegister(frame) => frame.function_code(),
            Self::WriteMultipleCoils(frame) => frame.function_code(),
            Self::WriteMultipleRegisters(frame) => frame.function_code(),
            Self::ReadServerId(frame) => frame.function_code(),
            Self::ReadWriteMultipleRegisters(frame) => frame.function_code(),
        }
    }

    pub fn transaction_id(&self) -> u16 {
        match self {
            Self::ReadCoils(frame) => frame.transaction_id,
            Self::ReadDiscreteInputs(frame) => frame.transaction_id,
            Self::ReadHoldingRegisters(frame) => frame.transaction_id,
            Self::ReadInputRegisters(frame) => frame.transaction_id,
            Self::WriteSingleCoil(frame) => frame.transaction_id,
            Self::WriteSingleRegister(frame) => frame.transaction_id,
            Self::WriteMultipleCoils(frame) => frame.transaction_id,
            Self::WriteMultipleRegisters(frame) => frame.transaction_id,
            Self::ReadServerId(frame) => frame.transaction_id,
            Self::ReadWriteMultipleRegisters(frame) => frame.transaction_id,
        }
    }

    pub fn unit_id(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.unit_id(),
            Self::ReadDiscreteInputs(frame) => frame.unit_id(),
            Self::ReadHoldingRegisters(frame) => frame.unit_id(),
            Self::ReadInputRegisters(frame) => frame.unit_id(),
            Self::WriteSingleCoil(frame) => frame.unit_id(),
            Self::WriteSingleRegister(frame) => frame.unit_id(),
            Self::WriteMultipleCoils(frame) => frame.unit_id(),
            Self::WriteMultipleRegisters(frame) => frame.unit_id(),
            Self::ReadServerId(frame) => frame.unit_id(),
            Self::ReadWriteMultipleRegisters(frame) => frame.unit_id(),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Self::ReadCoils(frame) => frame.bytes(),
            Self::ReadDiscreteInputs(frame) => frame.bytes(),
            Self::ReadHoldingRegisters(frame) => frame.bytes(),
            Self::ReadInputRegisters(frame) => frame.bytes(),
            Self::WriteSingleCoil(frame) => frame.bytes(),
            Self::WriteSingleRegister(frame) => frame.bytes(),
            Self::WriteMultipleCoils(frame) => frame.bytes(),
            Self::WriteMultipleRegisters(frame) => frame.bytes(),
            Self::ReadServerId(frame) => frame.bytes(),
            Self::ReadWriteMultipleRegisters(frame) => frame.bytes(),
        }
    }
}

/// A parsed Modbus RTU response, tagged by function code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtuResponse {
    ReadCoils(RtuFrame<ReadCoilsResponse>),
    ReadDiscreteInputs(RtuFrame<ReadDiscreteInputsResponse>),
    ReadHoldingRegisters(RtuFrame<ReadHoldingRegistersResponse>),
    ReadInputRegisters(RtuFrame<ReadInputRegistersResponse>),
    WriteSingleCoil(RtuFrame<WriteSingleCoilResponse>),
    WriteSingleRegister(RtuFrame<WriteSingleRegisterResponse>),
    WriteMultipleCoils(RtuFrame<WriteMultipleCoilsResponse>),
    WriteMultipleRegisters(RtuFrame<WriteMultipleRegistersResponse>),
    ReadServerId(RtuFrame<ReadServerIdResponse>),
    ReadWriteMultipleRegisters(RtuFrame<ReadWriteMultipleRegistersResponse>),
}

impl RtuResponse {
    pub fn function_code(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.function_code(),
            Self::ReadDiscreteInputs(frame) => frame.function_code(),
            Self::ReadHoldingRegisters(frame) => frame.function_code(),
            Self::ReadInputRegisters(frame) => frame.function_code(),
            Self::WriteSingleCoil(frame) => frame.function_code(),
            Self::WriteSingleRegister(frame) => frame.function_code(),
            Self::WriteMultipleCoils(frame) => frame.function_code(),
            Self::WriteMultipleRegisters(frame) => frame.function_code(),
            Self::ReadServerId(frame) => frame.function_code(),
            Self::ReadWriteMultipleRegisters(frame) => frame.function_code(),
        }
    }

    pub fn unit_id(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.unit_id(),
            Self::ReadDiscreteInputs(frame) => frame.unit_id(),
            Self::ReadHoldingRegisters(frame) => frame.unit_id(),
            Self::ReadInputRegisters(frame) => frame.unit_id(),
            Self::WriteSingleCoil(frame) => frame.unit_id(),
            Self::WriteSingleRegister(frame) => frame.unit_id(),
            Self::WriteMultipleCoils(frame) => frame.unit_id(),
            Self::WriteMultipleRegisters(frame) => frame.unit_id(),
            Self::ReadServerId(frame) => frame.unit_id(),
            Self::ReadWriteMultipleRegisters(frame) => frame.unit_id(),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Self::ReadCoils(frame) => frame.bytes(),
            Self::ReadDiscreteInputs(frame) => frame.bytes(),
            Self::ReadHoldingRegisters(frame) => frame.bytes(),
            Self::ReadInputRegisters(frame) => frame.bytes(),
            Self::WriteSingleCoil(frame) => frame.bytes(),
            Self::WriteSingleRegister(frame) => frame.bytes(),
            Self::WriteMultipleCoils(frame) => frame.bytes(),
            Self::WriteMultipleRegisters(frame) => frame.bytes(),
            Self::ReadServerId(frame) => frame.bytes(),
            Self::ReadWriteMultipleRegisters(frame) => frame.bytes(),
        }
    }
}

/// A parsed Modbus TCP request, tagged by function code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TcpRequest {
    ReadCoils(TcpFrame<ReadCoilsRequest>),
    ReadDiscreteInputs(TcpFrame<ReadDiscreteInputsRequest>),
    ReadHoldingRegisters(TcpFrame<ReadHoldingRegistersRequest>),
    ReadInputRegisters(TcpFrame<ReadInputRegistersRequest>),
    WriteSingleCoil(TcpFrame<WriteSingleCoilRequest>),
    WriteSingleRegister(TcpFrame<WriteSingleRegisterRequest>),
    WriteMultipleCoils(TcpFrame<WriteMultipleCoilsRequest>),
    WriteMultipleRegisters(TcpFrame<WriteMultipleRegistersRequest>),
    ReadServerId(TcpFrame<ReadServerIdRequest>),
    ReadWriteMultipleRegisters(TcpFrame<ReadWriteMultipleRegistersRequest>),
}

impl TcpRequest {
    pub fn function_code(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.function_code(),
            Self::ReadDiscreteInputs(frame) => frame.function_code(),
            Self::ReadHoldingRegisters(frame) => frame.function_code(),
            Self::ReadInputRegisters(frame) => frame.function_code(),
            Self::WriteSingleCoil(frame) => frame.function_code(),
            Self::WriteSingleRegister(frame) => frame.function_code(),
            Self::WriteMultipleCoils(frame) => frame.function_code(),
            Self::WriteMultipleRegisters(frame) => frame.function_code(),
            Self::ReadServerId(frame) => frame.function_code(),
            Self::ReadWriteMultipleRegisters(frame) => frame.function_code(),
        }
    }

    pub fn transaction_id(&self) -> u16 {
        match self {
            Self::ReadCoils(frame) => frame.transaction_id,
            Self::ReadDiscreteInputs(frame) => frame.transaction_id,
            Self::ReadHoldingRegisters(frame) => frame.transaction_id,
            Self::ReadInputRegisters(frame) => frame.transaction_id,
            Self::WriteSingleCoil(frame) => frame.transaction_id,
            Self::WriteSingleRegister(frame) => frame.transaction_id,
            Self::WriteMultipleCoils(frame) => frame.transaction_id,
            Self::WriteMultipleRegisters(frame) => frame.transaction_id,
            Self::ReadServerId(frame) => frame.transaction_id,
            Self::ReadWriteMultipleRegisters(frame) => frame.transaction_id,
        }
    }

    pub fn unit_id(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.unit_id(),
            Self::ReadDiscreteInputs(frame) => frame.unit_id(),
            Self::ReadHoldingRegisters(frame) => frame.unit_id(),
            Self::ReadInputRegisters(frame) => frame.unit_id(),
            Self::WriteSingleCoil(frame) => frame.unit_id(),
            Self::WriteSingleRegister(frame) => frame.unit_id(),
            Self::WriteMultipleCoils(frame) => frame.unit_id(),
            Self::WriteMultipleRegisters(frame) => frame.unit_id(),
            Self::ReadServerId(frame) => frame.unit_id(),
            Self::ReadWriteMultipleRegisters(frame) => frame.unit_id(),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Self::ReadCoils(frame) => frame.bytes(),
            Self::ReadDiscreteInputs(frame) => frame.bytes(),
            Self::ReadHoldingRegisters(frame) => frame.bytes(),
            Self::ReadInputRegisters(frame) => frame.bytes(),
            Self::WriteSingleCoil(frame) => frame.bytes(),
            Self::WriteSingleRegister(frame) => frame.bytes(),
            Self::WriteMultipleCoils(frame) => frame.bytes(),
            Self::WriteMultipleRegisters(frame) => frame.bytes(),
            Self::ReadServerId(frame) => frame.bytes(),
            Self::ReadWriteMultipleRegisters(frame) => frame.bytes(),
        }
    }

    /// Byte count of the successful response this request solicits.
    pub fn expected_response_length(&self) -> usize {
        match self {
            Self::ReadCoils(frame) => frame.expected_response_length(),
            Self::ReadDiscreteInputs(frame) => frame.expected_response_length(),
            Self::ReadHoldingRegisters(frame) => frame.expected_response_length(),
            Self::ReadInputRegisters(frame) => frame.expected_response_length(),
            Self::WriteSingleCoil(frame) => frame.expected_response_length(),
            Self::WriteSingleRegister(frame) => frame.expected_response_length(),
            Self::WriteMultipleCoils(frame) => frame.expected_response_length(),
            Self::WriteMultipleRegisters(frame) => frame.expected_response_length(),
            Self::ReadServerId(frame) => frame.expected_response_length(),
            Self::ReadWriteMultipleRegisters(frame) => frame.expected_response_length(),
        }
    }
}

/// A parsed Modbus RTU request, tagged by function code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtuRequest {
    ReadCoils(RtuFrame<ReadCoilsRequest>),
    ReadDiscreteInputs(RtuFrame<ReadDiscreteInputsRequest>),
    ReadHoldingRegisters(RtuFrame<ReadHoldingRegistersRequest>),
    ReadInputRegisters(RtuFrame<ReadInputRegistersRequest>),
    WriteSingleCoil(RtuFrame<WriteSingleCoilRequest>),
    WriteSingleRegister(RtuFrame<WriteSingleRegisterRequest>),
    WriteMultipleCoils(RtuFrame<WriteMultipleCoilsRequest>),
    WriteMultipleRegisters(RtuFrame<WriteMultipleRegistersRequest>),
    ReadServerId(RtuFrame<ReadServerIdRequest>),
    ReadWriteMultipleRegisters(RtuFrame<ReadWriteMultipleRegistersRequest>),
}

impl RtuRequest {
    pub fn function_code(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.function_code(),
            Self::ReadDiscreteInputs(frame) => frame.function_code(),
            Self::ReadHoldingRegisters(frame) => frame.function_code(),
            Self::ReadInputRegisters(frame) => frame.function_code(),
            Self::WriteSingleCoil(frame) => frame.function_code(),
            Self::WriteSingleRegister(frame) => frame.function_code(),
            Self::WriteMultipleCoils(frame) => frame.function_code(),
            Self::WriteMultipleRegisters(frame) => frame.function_code(),
            Self::ReadServerId(frame) => frame.function_code(),
            Self::ReadWriteMultipleRegisters(frame) => frame.function_code(),
        }
    }

    pub fn unit_id(&self) -> u8 {
        match self {
            Self::ReadCoils(frame) => frame.unit_id(),
            Self::ReadDiscreteInputs(frame) => frame.unit_id(),
            Self::ReadHoldingRegisters(frame) => frame.unit_id(),
            Self::ReadInputRegisters(frame) => frame.unit_id(),
            Self::WriteSingleCoil(frame) => frame.unit_id(),
            Self::WriteSingleRegister(frame) => frame.unit_id(),
            Self::WriteMultipleCoils(frame) => frame.unit_id(),
            Self::WriteMultipleRegisters(frame) => frame.unit_id(),
            Self::ReadServerId(frame) => frame.unit_id(),
            Self::ReadWriteMultipleRegisters(frame) => frame.unit_id(),
        }
    }

    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Self::ReadCoils(frame) => frame.bytes(),
            Self::ReadDiscreteInputs(frame) => frame.bytes(),
            Self::ReadHoldingRegisters(frame) => frame.bytes(),
            Self::ReadInputRegisters(frame) => frame.bytes(),
            Self::WriteSingleCoil(frame) => frame.bytes(),
            Self::WriteSingleRegister(frame) => frame.bytes(),
            Self::WriteMultipleCoils(frame) => frame.bytes(),
            Self::WriteMultipleRegisters(frame) => frame.bytes(),
            Self::ReadServerId(frame) => frame.bytes(),
            Self::ReadWriteMultipleRegisters(frame) => frame.bytes(),
        }
    }

    pub fn expected_response_length(&self) -> usize {
        match self {
            Self::ReadCoils(frame) => frame.expected_response_length(),
            Self::ReadDiscreteInputs(frame) => frame.expected_response_length(),
            Self::ReadHoldingRegisters(frame) => frame.expected_response_length(),
            Self::ReadInputRegisters(frame) => frame.expected_response_length(),
            Self::WriteSingleCoil(frame) => frame.expected_response_length(),
            Self::WriteSingleRegister(frame) => frame.expected_response_length(),
            Self::WriteMultipleCoils(frame) => frame.expected_response_length(),
            Self::WriteMultipleRegisters(frame) => frame.expected_response_length(),
            Self::ReadServerId(frame) => frame.expected_response_length(),
            Self::ReadWriteMultipleRegisters(frame) => frame.expected_response_length(),
        }
    }
}

/// Parses a complete Modbus TCP response frame.
///
/// Exception frames come back as [`ModbusError::Exception`] with the
/// transaction id, unit id, original function code and exception code of the
/// packet.
pub fn parse_tcp_response(data: &[u8]) -> Result<TcpResponse, ModbusError> {
    if data.len() < 8 {
        return Err(ModbusError::protocol(
            ExceptionCode::ServerFailure,
            format!("response data is too short: {} bytes", data.len()),
        ));
    }
    if let Some(error) = ErrorResponse::detect_tcp(data) {
        debug!("received exception frame: {}", error);
        return Err(ModbusError::Exception(error));
    }
    trace!("parsing TCP response, function code {}", data[7]);
    match data[7] {
        0x01 => TcpFrame::parse(data).map(TcpResponse::ReadCoils),
        0x02 => TcpFrame::parse(data).map(TcpResponse::ReadDiscreteInputs),
        0x03 => TcpFrame::parse(data).map(TcpResponse::ReadHoldingRegisters),
        0x04 => TcpFrame::parse(data).map(TcpResponse::ReadInputRegisters),
        0x05 => TcpFrame::parse(data).map(TcpResponse::WriteSingleCoil),
        0x06 => TcpFrame::parse(data).map(TcpResponse::WriteSingleRegister),
        0x0F => TcpFrame::parse(data).map(TcpResponse::WriteMultipleCoils),
        0x10 => TcpFrame::parse(data).map(TcpResponse::WriteMultipleRegisters),
        0x11 => TcpFrame::parse(data).map(TcpResponse::ReadServerId),
        0x17 => TcpFrame::parse(data).map(TcpResponse::ReadWriteMultipleRegisters),
        code => Err(ModbusError::protocol(
            ExceptionCode::IllegalFunction,
            format!("unknown function code parsed: {code}"),
        )),
    }
}

/// Parses a complete Modbus RTU response frame without verifying its CRC.
pub fn parse_rtu_response(data: &[u8]) -> Result<RtuResponse, ModbusError> {
    if data.len() < 4 {
        return Err(ModbusError::protocol(
            ExceptionCode::ServerFailure,
            format!("response data is too short: {} bytes", data.len()),
        ));
    }
    if let Some(error) = ErrorResponse::detect_rtu(data) {
        debug!("received exception frame: {}", error);
        return Err(ModbusError::Exception(error));
    }
    trace!("parsing RTU response, function code {}", data[1]);
    match data[1] {
        0x01 => RtuFrame::parse(data).map(RtuResponse::ReadCoils),
        0x02 => RtuFrame::parse(data).map(RtuResponse::ReadDiscreteInputs),
        0x03 => RtuFrame::parse(data).map(RtuResponse::ReadHoldingRegisters),
        0x04 => RtuFrame::parse(data).map(RtuResponse::ReadInputRegisters),
        0x05 => RtuFrame::parse(data).map(RtuResponse::WriteSingleCoil),
        0x06 => RtuFrame::parse(data).map(RtuResponse::WriteSingleRegister),
        0x0F => RtuFrame::parse(data).map(RtuResponse::WriteMultipleCoils),
        0x10 => RtuFrame::parse(data).map(RtuResponse::WriteMultipleRegisters),
        0x11 => RtuFrame::parse(data).map(RtuResponse::ReadServerId),
        0x17 => RtuFrame::parse(data).map(RtuResponse::ReadWriteMultipleRegisters),
        code => Err(ModbusError::protocol(
            ExceptionCode::IllegalFunction,
            format!("unknown function code parsed: {code}"),
        )),
    }
}

/// Parses a complete Modbus RTU response frame after checking its CRC.
pub fn parse_rtu_response_with_crc(data: &[u8]) -> Result<RtuResponse, ModbusError> {
    if data.len() < 4 {
        return Err(ModbusError::protocol(
            ExceptionCode::ServerFailure,
            format!("response data is too short: {} bytes", data.len()),
        ));
    }
    validate_crc(data)?;
    parse_rtu_response(data)
}

/// Parses a complete Modbus TCP request frame, server side.
///
/// On failure the error carries an exception frame ready to serialize back
/// to the client.
pub fn parse_tcp_request(data: &[u8]) -> Result<TcpRequest, RequestError> {
    if data.len() < 8 {
        return Err(tcp_request_error(
            ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!("request data is too short: {} bytes", data.len()),
            ),
            data,
        ));
    }
    trace!("parsing TCP request, function code {}", data[7]);
    match data[7] {
        0x01 => ReadCoilsRequest::parse_tcp(data).map(TcpRequest::ReadCoils),
        0x02 => ReadDiscreteInputsRequest::parse_tcp(data).map(TcpRequest::ReadDiscreteInputs),
        0x03 => {
            ReadHoldingRegistersRequest::parse_tcp(data).map(TcpRequest::ReadHoldingRegisters)
        }
        0x04 => ReadInputRegistersRequest::parse_tcp(data).map(TcpRequest::ReadInputRegisters),
        0x05 => WriteSingleCoilRequest::parse_tcp(data).map(TcpRequest::WriteSingleCoil),
        0x06 => WriteSingleRegisterRequest::parse_tcp(data).map(TcpRequest::WriteSingleRegister),
        0x0F => WriteMultipleCoilsRequest::parse_tcp(data).map(TcpRequest::WriteMultipleCoils),
        0x10 => {
            WriteMultipleRegistersRequest::parse_tcp(data).map(TcpRequest::WriteMultipleRegisters)
        }
        0x11 => ReadServerIdRequest::parse_tcp(data).map(TcpRequest::ReadServerId),
        0x17 => ReadWriteMultipleRegistersRequest::parse_tcp(data)
            .map(TcpRequest::ReadWriteMultipleRegisters),
        code => Err(tcp_request_error(
            ModbusError::protocol(
                ExceptionCode::IllegalFunction,
                format!("unknown function code parsed: {code}"),
            ),
            data,
        )),
    }
}

/// Parses a complete Modbus RTU request frame, server side, without
/// verifying its CRC.
pub fn parse_rtu_request(data: &[u8]) -> Result<RtuRequest, RequestError> {
    if data.len() < 4 {
        return Err(rtu_request_error(
            ModbusError::protocol(
                ExceptionCode::ServerFailure,
                format!("request data is too short: {} bytes", data.len()),
            ),
            data,
        ));
    }
    trace!("parsing RTU request, function code {}", data[1]);
    match data[1] {
        0x01 => ReadCoilsRequest::parse_rtu(data).map(RtuRequest::ReadCoils),
        0x02 => ReadDiscreteInputsRequest::parse_rtu(data).map(RtuRequest::ReadDiscreteInputs),
        0x03 => {
            ReadHoldingRegistersRequest::parse_rtu(data).map(RtuRequest::ReadHoldingRegisters)
        }
        0x04 => ReadInputRegistersRequest::parse_rtu(data).map(RtuRequest::ReadInputRegisters),
        0x05 => WriteSingleCoilRequest::parse_rtu(data).map(RtuRequest::WriteSingleCoil),
        0x06 => WriteSingleRegisterRequest::parse_rtu(data).map(RtuRequest::WriteSingleRegister),
        0x0F => WriteMultipleCoilsRequest::parse_rtu(data).map(RtuRequest::WriteMultipleCoils),
        0x10 => {
            WriteMultipleRegistersRequest::parse_rtu(data).map(RtuRequest::WriteMultipleRegisters)
        }
        0x11 => ReadServerIdRequest::parse_rtu(data).map(RtuRequest::ReadServerId),
        0x17 => ReadWriteMultipleRegistersRequest::parse_rtu(data)
            .map(RtuRequest::ReadWriteMultipleRegisters),
        code => Err(rtu_request_error(
            ModbusError::protocol(
                ExceptionCode::IllegalFunction,
                format!("unknown function code parsed: {code}"),
            ),
            data,
        )),
    }
}

/// Parses a complete Modbus RTU request frame, server side, after checking
/// its CRC. A CRC failure yields a [`RequestError`] with no response frame;
/// the server must stay silent.
pub fn parse_rtu_request_with_crc(data: &[u8]) -> Result<RtuRequest, RequestError> {
    if data.len() >= 4 {
        if let Err(error) = validate_crc(data) {
            return Err(rtu_request_error(error, data));
        }
    }
    parse_rtu_request(data)
}
