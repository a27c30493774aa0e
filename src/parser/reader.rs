use byteorder::{LittleEndian, ReadBytesExt};
use std::io;

pub struct Reader {
    bytes: Vec<u8>,
    pos: usize,
}

impl Reader {
    pub fn new(bytes: Vec<u8>) -> Reader {
        Reader { bytes, pos: 0 }
    }
}

fn eof(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::UnexpectedEof, msg.to_string())
}

impl Reader {
    // Basic operations --------------------------------------------------------
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn has_at_least(&self, count: usize) -> bool {
        self.remaining() >= count
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn skip(&mut self, len: usize) -> Result<(), io::Error> {
        if !self.has_at_least(len) {
            return Err(eof("not enough bytes to skip"));
        }
        self.pos += len;
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8, io::Error> {
        self.next().ok_or_else(|| eof("no more bytes to read"))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, io::Error> {
        if !self.has_at_least(len) {
            return Err(eof("not enough bytes to read"));
        }
        let vec = self.bytes[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(vec)
    }

    // Read and interpret types ------------------------------------------------

    // le
    pub fn read_u32(&mut self) -> Result<u32, io::Error> {
        let bytes = self.read_bytes(4)?;
        io::Cursor::new(bytes).read_u32::<LittleEndian>()
    }

    pub fn read_vu32(&mut self) -> Result<u32, io::Error> {
        read_vu(&mut || self.read_byte(), 32).map(|v| v as u32)
    }

    pub fn read_vs32(&mut self) -> Result<i32, io::Error> {
        read_vs(&mut || self.read_byte(), 32).map(|v| v as i32)
    }

    pub fn read_vs64(&mut self) -> Result<i64, io::Error> {
        read_vs(&mut || self.read_byte(), 64)
    }

    pub fn read_f32(&mut self) -> Result<f32, io::Error> {
        let bytes = self.read_bytes(4)?;
        io::Cursor::new(bytes).read_f32::<LittleEndian>()
    }

    pub fn read_f64(&mut self) -> Result<f64, io::Error> {
        let bytes = self.read_bytes(8)?;
        io::Cursor::new(bytes).read_f64::<LittleEndian>()
    }

    pub fn read_string(&mut self) -> Result<String, io::Error> {
        let len = self.read_vu32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid utf-8 sequence"))
    }
}

impl Iterator for Reader {
    type Item = u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];
            self.pos += 1;
            Some(byte)
        } else {
            None
        }
    }
}

/// Decodes an unsigned LEB128 value of at most `size` bits. Encodings longer
/// than `ceil(size / 7)` bytes, or whose final byte sets bits beyond `size`,
/// are rejected.
fn read_vu<F>(reader: &mut F, size: u32) -> Result<u64, io::Error>
where
    F: FnMut() -> Result<u8, io::Error>,
{
    let mut result: u64 = 0;
    let mut shift = 0;
    let max_bytes = size.div_ceil(7);

    for i in 0..max_bytes {
        let b = reader()?;
        let payload = (b & 0x7f) as u64;
        if i == max_bytes - 1 {
            let unused_bits = 7 - (size - shift);
            if unused_bits > 0 && (payload >> (7 - unused_bits)) != 0 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "integer too large"));
            }
        }
        result |= payload << shift;
        if (b & 0x80) == 0 {
            return Ok(result);
        }
        shift += 7;
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "integer representation too long",
    ))
}

/// Decodes a signed LEB128 value of at most `size` bits, sign-extending the
/// result. The final byte's unused bits must all equal the sign bit.
fn read_vs<F>(reader: &mut F, size: u32) -> Result<i64, io::Error>
where
    F: FnMut() -> Result<u8, io::Error>,
{
    let mut result: i64 = 0;
    let mut shift = 0;
    let max_bytes = size.div_ceil(7);

    for i in 0..max_bytes {
        let b = reader()?;
        let payload = (b & 0x7f) as i64;
        if i == max_bytes - 1 {
            // bits of the payload at or above the value's sign bit
            let used = size - shift;
            let high = (b & 0x7f) >> (used - 1);
            let all_ones = 0x7f >> (used - 1);
            if (b & 0x80) != 0 || (high != 0 && high != all_ones) {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "integer too large"));
            }
        }
        result |= payload << shift;
        shift += 7;
        if (b & 0x80) == 0 {
            if shift < 64 && (b & 0x40) != 0 {
                result |= -1i64 << shift;
            }
            return Ok(result);
        }
    }

    Err(io::Error::new(
        io::ErrorKind::InvalidData,
        "integer representation too long",
    ))
}
