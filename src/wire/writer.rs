use super::{WireError, ABSENT, PRESENT};

/// Append-only parcel buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParcelWriter {
    buf: Vec<u8>,
}

impl ParcelWriter {
    pub fn new() -> Self { Self::default() }
    pub fn with_capacity(capacity: usize) -> Self { Self { buf: Vec::with_capacity(capacity) } }

    pub fn as_bytes(&self) -> &[u8] { &self.buf }
    pub fn into_bytes(self) -> Vec<u8> { self.buf }
    pub fn len(&self) -> usize { self.buf.len() }
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    // ------------------------------ scalars ------------------------------ //

    pub fn write_i32(&mut self, v: i32) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    pub fn write_i64(&mut self, v: i64) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    pub fn write_f32(&mut self, v: f32) { self.buf.extend_from_slice(&v.to_le_bytes()); }
    pub fn write_f64(&mut self, v: f64) { self.buf.extend_from_slice(&v.to_le_bytes()); }

    pub fn write_i8(&mut self, v: i8) { self.write_i32(i32::from(v)); }
    pub fn write_i16(&mut self, v: i16) { self.write_i32(i32::from(v)); }
    pub fn write_u8(&mut self, v: u8) { self.write_i32(i32::from(v)); }
    pub fn write_u16(&mut self, v: u16) { self.write_i32(i32::from(v)); }

    /// Bit-preserving: `u32::MAX` travels as `-1`.
    pub fn write_u32(&mut self, v: u32) { self.write_i32(v as i32); }
    /// Bit-preserving: `u64::MAX` travels as `-1`.
    pub fn write_u64(&mut self, v: u64) { self.write_i64(v as i64); }

    pub fn write_bool(&mut self, v: bool) { self.write_i32(if v { 1 } else { 0 }); }
    pub fn write_char(&mut self, v: char) { self.write_u32(u32::from(v)); }

    // ------------------------------ framing ------------------------------ //

    pub fn write_presence(&mut self, present: bool) {
        self.write_i32(if present { PRESENT } else { ABSENT });
    }

    pub fn write_tag(&mut self, tag: i32) { self.write_i32(tag); }

    pub fn write_size(&mut self, size: usize) -> Result<(), WireError> {
        let size = i32::try_from(size).map_err(|_| WireError::LengthOverflow(size))?;
        self.write_i32(size);
        Ok(())
    }

    /// Length-prefixed UTF-8.
    pub fn write_str(&mut self, v: &str) -> Result<(), WireError> {
        self.write_bytes(v.as_bytes())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> Result<(), WireError> {
        self.write_size(v.len())?;
        self.buf.extend_from_slice(v);
        Ok(())
    }
}
