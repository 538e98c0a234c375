use serde::{Deserialize, Serialize};

use crate::errors::{ExceptionCode, ModbusError};

/// Byte and word ordering of multi-register values.
///
/// Devices disagree on how scalars wider than one register are laid out, so
/// the policy is first-class and per-call overridable. For a 32-bit value
/// with bytes A B C D:
///
/// | Policy | Wire layout |
/// |---|---|
/// | `BigEndianHighWordFirst` | A B C D |
/// | `BigEndianLowWordFirst` | C D A B |
/// | `LittleEndianHighWordFirst` | B A D C |
/// | `LittleEndianLowWordFirst` | D C B A |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Registers big-endian, high word at the lowest address. The protocol
    /// default.
    #[default]
    BigEndianHighWordFirst,
    /// Registers big-endian, low word first.
    BigEndianLowWordFirst,
    /// Bytes swapped inside each register, high word first.
    LittleEndianHighWordFirst,
    /// Bytes swapped inside each register, low word first.
    LittleEndianLowWordFirst,
}

impl ByteOrder {
    fn swapped_bytes(self) -> bool {
        matches!(
            self,
            Self::LittleEndianHighWordFirst | Self::LittleEndianLowWordFirst
        )
    }

    fn low_word_first(self) -> bool {
        matches!(
            self,
            Self::BigEndianLowWordFirst | Self::LittleEndianLowWordFirst
        )
    }
}

/// Whether the bit at `bit_address` is set in a coil or discrete-input
/// payload that starts at `start_address`.
///
/// Bit N of the payload occupies byte N/8, bit position N%8, lowest bit
/// first.
pub fn is_bit_set(data: &[u8], start_address: u16, bit_address: u16) -> Result<bool, ModbusError> {
    if bit_address < start_address {
        return Err(ModbusError::out_of_range(format!(
            "bit address {bit_address} is before start address {start_address}"
        )));
    }
    let offset = usize::from(bit_address - start_address);
    if offset >= data.len() * 8 {
        return Err(ModbusError::out_of_range(format!(
            "bit address {bit_address} is past the end of the data ({} bits)",
            data.len() * 8
        )));
    }
    Ok(data[offset / 8] & (1 << (offset % 8)) != 0)
}

/// Typed access to the register bytes of a response, addressed with the
/// register addresses the originating request used.
///
/// The view owns a copy of the payload; the response buffer can be dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterView {
    data: Vec<u8>,
    start_address: u16,
    end_address: u32,
    byte_order: ByteOrder,
}

impl RegisterView {
    /// Builds a view over raw register bytes as transmitted (big-endian,
    /// two per register). `data` must hold whole registers.
    pub fn new(data: Vec<u8>, start_address: u16, byte_order: ByteOrder) -> Result<Self, ModbusError> {
        if data.len() % 2 != 0 {
            return Err(ModbusError::protocol(
                ExceptionCode::IllegalDataValue,
                format!("register data length must be even: {} bytes", data.len()),
            ));
        }
        let end_address = u32::from(start_address) + (data.len() / 2) as u32;
        Ok(Self {
            data,
            start_address,
            end_address,
            byte_order,
        })
    }

    pub fn start_address(&self) -> u16 {
        self.start_address
    }

    /// Exclusive upper bound of the addressable range.
    pub fn end_address(&self) -> u32 {
        self.end_address
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Byte offset of `address`, after checking that `register_count`
    /// registers from there fit inside the view.
    fn offset_of(&self, address: u16, register_count: usize) -> Result<usize, ModbusError> {
        let end = u32::from(address) + register_count as u32;
        if address < self.start_address || end > self.end_address {
            return Err(ModbusError::out_of_range(format!(
                "registers {address}..{end} are outside the view {}..{}",
                self.start_address, self.end_address
            )));
        }
        Ok(usize::from(address - self.start_address) * 2)
    }

    /// Gathers the registers of one scalar, reordered so the result can be
    /// reinterpreted with `from_be_bytes`.
    fn scalar_bytes<const N: usize>(
        &self,
        address: u16,
        byte_order: ByteOrder,
    ) -> Result<[u8; N], ModbusError> {
        let words = N / 2;
        let offset = self.offset_of(address, words)?;
        let mut out = [0u8; N];
        for word in 0..words {
            let source = if byte_order.low_word_first() {
                words - 1 - word
            } else {
                word
            };
            let high = self.data[offset + source * 2];
            let low = self.data[offset + source * 2 + 1];
            if byte_order.swapped_bytes() {
                out[word * 2] = low;
                out[word * 2 + 1] = high;
            } else {
                out[word * 2] = high;
                out[word * 2 + 1] = low;
            }
        }
        Ok(out)
    }

    pub fn read_u16(&self, address: u16) -> Result<u16, ModbusError> {
        self.read_u16_with(address, self.byte_order)
    }

    pub fn read_u16_with(&self, address: u16, byte_order: ByteOrder) -> Result<u16, ModbusError> {
        Ok(u16::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_i16(&self, address: u16) -> Result<i16, ModbusError> {
        self.read_i16_with(address, self.byte_order)
    }

    pub fn read_i16_with(&self, address: u16, byte_order: ByteOrder) -> Result<i16, ModbusError> {
        Ok(i16::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_u32(&self, address: u16) -> Result<u32, ModbusError> {
        self.read_u32_with(address, self.byte_order)
    }

    pub fn read_u32_with(&self, address: u16, byte_order: ByteOrder) -> Result<u32, ModbusError> {
        Ok(u32::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_i32(&self, address: u16) -> Result<i32, ModbusError> {
        self.read_i32_with(address, self.byte_order)
    }

    pub fn read_i32_with(&self, address: u16, byte_order: ByteOrder) -> Result<i32, ModbusError> {
        Ok(i32::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_f32(&self, address: u16) -> Result<f32, ModbusError> {
        self.read_f32_with(address, self.byte_order)
    }

    pub fn read_f32_with(&self, address: u16, byte_order: ByteOrder) -> Result<f32, ModbusError> {
        Ok(f32::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_u64(&self, address: u16) -> Result<u64, ModbusError> {
        self.read_u64_with(address, self.byte_order)
    }

    pub fn read_u64_with(&self, address: u16, byte_order: ByteOrder) -> Result<u64, ModbusError> {
        Ok(u64::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_i64(&self, address: u16) -> Result<i64, ModbusError> {
        self.read_i64_with(address, self.byte_order)
    }

    pub fn read_i64_with(&self, address: u16, byte_order: ByteOrder) -> Result<i64, ModbusError> {
        Ok(i64::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_f64(&self, address: u16) -> Result<f64, ModbusError> {
        self.read_f64_with(address, self.byte_order)
    }

    pub fn read_f64_with(&self, address: u16, byte_order: ByteOrder) -> Result<f64, ModbusError> {
        Ok(f64::from_be_bytes(self.scalar_bytes(address, byte_order)?))
    }

    pub fn read_string(&self, address: u16, register_count: u16) -> Result<String, ModbusError> {
        self.read_string_with(address, register_count, self.byte_order)
    }

    /// Reads `register_count` registers as character data, trimming trailing
    /// NUL bytes. Word order does not apply to character data; only the
    /// in-register byte order is honored.
    pub fn read_string_with(
        &self,
        address: u16,
        register_count: u16,
        byte_order: ByteOrder,
    ) -> Result<String, ModbusError> {
        let offset = self.offset_of(address, usize::from(register_count))?;
        let mut bytes = Vec::with_capacity(usize::from(register_count) * 2);
        for pair in self.data[offset..offset + usize::from(register_count) * 2].chunks_exact(2) {
            if byte_order.swapped_bytes() {
                bytes.push(pair[1]);
                bytes.push(pair[0]);
            } else {
                bytes.push(pair[0]);
                bytes.push(pair[1]);
            }
        }
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_addressing() {
        let data = [0b0001_0010, 0b1000_0001];
        assert!(is_bit_set(&data, 0, 1).unwrap());
        assert!(!is_bit_set(&data, 0, 2).unwrap());
        assert!(is_bit_set(&data, 0, 8).unwrap());
        assert!(is_bit_set(&data, 0, 15).unwrap());
        assert!(is_bit_set(&data, 0, 16).is_err());
        assert!(is_bit_set(&data, 10, 9).is_err());
    }

    #[test]
    fn test_bit_addressing_with_nonzero_start() {
        let data = [0b0000_0100];
        assert!(is_bit_set(&data, 100, 102).unwrap());
        assert!(!is_bit_set(&data, 100, 103).unwrap());
        assert!(is_bit_set(&data, 100, 108).is_err());
    }

    #[test]
    fn test_view_rejects_odd_length() {
        assert!(RegisterView::new(vec![0x01], 0, ByteOrder::default()).is_err());
    }

    #[test]
    fn test_read_u32_word_orders() {
        let data = vec![0x01, 0x02, 0x03, 0x04];
        let view = RegisterView::new(data, 10, ByteOrder::BigEndianHighWordFirst).unwrap();
        assert_eq!(view.read_u32(10).unwrap(), 0x0102_0304);
        assert_eq!(
            view.read_u32_with(10, ByteOrder::BigEndianLowWordFirst).unwrap(),
            0x0304_0102
        );
        assert_eq!(
            view.read_u32_with(10, ByteOrder::LittleEndianHighWordFirst)
                .unwrap(),
            0x0201_0403
        );
        assert_eq!(
            view.read_u32_with(10, ByteOrder::LittleEndianLowWordFirst)
                .unwrap(),
            0x0403_0201
        );
    }

    #[test]
    fn test_read_u16_and_i16() {
        let view =
            RegisterView::new(vec![0xFF, 0xFE, 0x00, 0x2A], 5, ByteOrder::default()).unwrap();
        assert_eq!(view.read_u16(5).unwrap(), 0xFFFE);
        assert_eq!(view.read_i16(5).unwrap(), -2);
        assert_eq!(view.read_u16(6).unwrap(), 42);
        assert_eq!(
            view.read_u16_with(6, ByteOrder::LittleEndianHighWordFirst)
                .unwrap(),
            0x2A00
        );
    }

    #[test]
    fn test_read_floats() {
        // 3.14_f32 big-endian across two registers.
        let bits = 3.14_f32.to_be_bytes();
        let view = RegisterView::new(bits.to_vec(), 0, ByteOrder::default()).unwrap();
        assert_eq!(view.read_f32(0).unwrap(), 3.14);

        let bits = 6.28_f64.to_be_bytes();
        let view = RegisterView::new(bits.to_vec(), 0, ByteOrder::default()).unwrap();
        assert_eq!(view.read_f64(0).unwrap(), 6.28);
    }

    #[test]
    fn test_read_u64() {
        let view = RegisterView::new(
            vec![0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08],
            0,
            ByteOrder::BigEndianHighWordFirst,
        )
        .unwrap();
        assert_eq!(view.read_u64(0).unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(
            view.read_u64_with(0, ByteOrder::BigEndianLowWordFirst).unwrap(),
            0x0708_0506_0304_0102
        );
        assert_eq!(view.read_i64(0).unwrap(), 0x0102_0304_0506_0708_i64);
    }

    #[test]
    fn test_range_checks() {
        let view =
            RegisterView::new(vec![0x00, 0x01, 0x00, 0x02], 10, ByteOrder::default()).unwrap();
        assert_eq!(view.start_address(), 10);
        assert_eq!(view.end_address(), 12);
        // Before the start.
        assert!(view.read_u16(9).is_err());
        // Last register is fine for u16, not for u32.
        assert!(view.read_u16(11).is_ok());
        assert!(view.read_u32(11).is_err());
        // Past the end.
        assert!(view.read_u16(12).is_err());
        assert!(view.read_u64(10).is_err());

        let err = view.read_u32(11).unwrap_err();
        assert!(matches!(err, ModbusError::OutOfRange { .. }));
    }

    #[test]
    fn test_view_at_address_space_edge() {
        let view =
            RegisterView::new(vec![0x00, 0x2A, 0x00, 0x2B], 0xFFFE, ByteOrder::default()).unwrap();
        assert_eq!(view.read_u16(0xFFFF).unwrap(), 0x2B);
        assert_eq!(view.read_u32(0xFFFE).unwrap(), 0x002A_002B);
    }

    #[test]
    fn test_read_string() {
        // "AB", "CD", then a NUL-padded register.
        let data = vec![0x41, 0x42, 0x43, 0x44, 0x45, 0x00];
        let view = RegisterView::new(data, 0, ByteOrder::default()).unwrap();
        assert_eq!(view.read_string(0, 3).unwrap(), "ABCDE");
        assert_eq!(view.read_string(1, 1).unwrap(), "CD");
        assert_eq!(
            view.read_string_with(0, 2, ByteOrder::LittleEndianHighWordFirst)
                .unwrap(),
            "BADC"
        );
        assert!(view.read_string(0, 4).is_err());
    }
}
