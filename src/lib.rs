pub mod crc;
pub mod dispatch;
pub mod errors;
pub mod frame;
pub mod packet;
pub mod view;

pub use crc::crc16;
pub use dispatch::{
    parse_rtu_request, parse_rtu_request_with_crc, parse_rtu_response, parse_rtu_response_with_crc,
    parse_tcp_request, parse_tcp_response, RtuRequest, RtuResponse, TcpRequest, TcpResponse,
};
pub use errors::{ExceptionCode, ModbusError, RequestError};
pub use frame::{
    append_crc, looks_like_modbus_tcp, validate_crc, MbapHeader, RtuFrame, TcpFrame,
    TcpFrameStatus,
};
pub use packet::{
    supported_function_code, ErrorResponse, Packet, ReadCoilsRequest, ReadCoilsResponse,
    ReadDiscreteInputsRequest, ReadDiscreteInputsResponse, ReadHoldingRegistersRequest,
    ReadHoldingRegistersResponse, ReadInputRegistersRequest, ReadInputRegistersResponse,
    ReadServerIdRequest, ReadServerIdResponse, ReadWriteMultipleRegistersRequest,
    ReadWriteMultipleRegistersResponse, RequestPacket, WriteMultipleCoilsRequest,
    WriteMultipleCoilsResponse, WriteMultipleRegistersRequest, WriteMultipleRegistersResponse,
    WriteSingleCoilRequest, WriteSingleCoilResponse, WriteSingleRegisterRequest,
    WriteSingleRegisterResponse, MAX_READ_BITS, MAX_READ_QUANTITY, MAX_READ_WRITE_WRITE_REGISTERS,
    MAX_WRITE_COILS, MAX_WRITE_REGISTERS, SUPPORTED_FUNCTION_CODES,
};
pub use view::{is_bit_set, ByteOrder, RegisterView};
