use super::{WireError, ABSENT, PRESENT};

/// Forward-only cursor over an encoded parcel.
#[derive(Debug, Clone)]
pub struct ParcelReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

macro_rules! narrow_read {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty, WireError> {
            let raw = self.read_i32()?;
            <$ty>::try_from(raw).map_err(|_| WireError::OutOfRange {
                kind: stringify!($ty),
                value: i64::from(raw),
            })
        }
    };
}

impl<'a> ParcelReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self { Self { bytes, pos: 0 } }

    pub fn remaining(&self) -> usize { self.bytes.len() - self.pos }
    pub fn is_empty(&self) -> bool { self.remaining() == 0 }

    /// Clamp a decoded element count before preallocating with it.
    ///
    /// The count comes off the wire, so it is bounded by what could possibly
    /// follow rather than trusted outright.
    pub fn capacity_hint(&self, size: usize) -> usize { size.min(self.remaining()) }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let remaining = self.remaining();
        if remaining < N {
            return Err(WireError::UnexpectedEof { needed: N, remaining });
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    fn take_slice(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let remaining = self.remaining();
        if remaining < len {
            return Err(WireError::UnexpectedEof { needed: len, remaining });
        }
        let out = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    // ------------------------------ scalars ------------------------------ //

    pub fn read_i32(&mut self) -> Result<i32, WireError> { Ok(i32::from_le_bytes(self.take()?)) }
    pub fn read_i64(&mut self) -> Result<i64, WireError> { Ok(i64::from_le_bytes(self.take()?)) }
    pub fn read_f32(&mut self) -> Result<f32, WireError> { Ok(f32::from_le_bytes(self.take()?)) }
    pub fn read_f64(&mut self) -> Result<f64, WireError> { Ok(f64::from_le_bytes(self.take()?)) }

    narrow_read!(read_i8, i8);
    narrow_read!(read_i16, i16);
    narrow_read!(read_u8, u8);
    narrow_read!(read_u16, u16);

    pub fn read_u32(&mut self) -> Result<u32, WireError> { Ok(self.read_i32()? as u32) }
    pub fn read_u64(&mut self) -> Result<u64, WireError> { Ok(self.read_i64()? as u64) }

    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        match self.read_i32()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidBool(other)),
        }
    }

    pub fn read_char(&mut self) -> Result<char, WireError> {
        let raw = self.read_u32()?;
        char::from_u32(raw).ok_or(WireError::InvalidChar(raw))
    }

    // ------------------------------ framing ------------------------------ //

    /// `true` when the sentinel says a value follows.
    pub fn read_presence(&mut self) -> Result<bool, WireError> {
        match self.read_i32()? {
            PRESENT => Ok(true),
            ABSENT => Ok(false),
            other => Err(WireError::InvalidPresence(other)),
        }
    }

    pub fn read_tag(&mut self) -> Result<i32, WireError> { self.read_i32() }

    pub fn read_size(&mut self) -> Result<usize, WireError> {
        let raw = self.read_i32()?;
        usize::try_from(raw).map_err(|_| WireError::NegativeLength(raw))
    }

    pub fn read_string(&mut self) -> Result<String, WireError> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_size()?;
        Ok(self.take_slice(len)?.to_vec())
    }
}

// ------------------------------- Tests ------------------------------------ //
