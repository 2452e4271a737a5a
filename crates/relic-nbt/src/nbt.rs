use bytes::{Buf, BufMut, BytesMut};

/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

#[derive(thiserror::Error, Debug)]
pub enum NbtError {
    #[error("unexpected end of buffer reading NBT")]
    Eof,
    #[error("unknown NBT tag id {0}")]
    UnknownTag(u8),
    #[error("invalid varint in network NBT stream")]
    BadVarint,
}

/// An NBT value.
///
/// Bedrock sends NBT in one of two wire encodings, both little-endian:
/// plain little-endian (used on disk and for resource-pack/skin data) and
/// "network little-endian", which additionally varint/zigzag-encodes
/// `Int`/`Long` and length-prefixes strings with an unsigned varint instead
/// of a fixed `u16`.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// Which little-endian wire variant to use when reading/writing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Fixed-width ints, `u16`-prefixed strings. Used on disk and in
    /// ClientData/skin payloads.
    LittleEndian,
    /// Varint/zigzag ints, varint-prefixed strings. Used for most
    /// in-packet NBT (block entities, StartGame block palettes, items).
    NetworkLittleEndian,
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Write this value as a root compound, tag id + name ("") + payload.
    pub fn write_root(&self, buf: &mut BytesMut, enc: Encoding) {
        buf.put_u8(self.tag_id());
        write_string(buf, "", enc);
        self.write_payload(buf, enc);
    }

    pub fn write_payload(&self, buf: &mut BytesMut, enc: Encoding) {
        match self {
            NbtValue::Byte(v) => buf.put_i8(*v),
            NbtValue::Short(v) => buf.put_i16_le(*v),
            NbtValue::Int(v) => write_int(buf, *v, enc),
            NbtValue::Long(v) => write_long(buf, *v, enc),
            NbtValue::Float(v) => buf.put_f32_le(*v),
            NbtValue::Double(v) => buf.put_f64_le(*v),
            NbtValue::ByteArray(v) => {
                write_int(buf, v.len() as i32, enc);
                for b in v {
                    buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => write_string(buf, v, enc),
            NbtValue::List(v) => {
                if v.is_empty() {
                    buf.put_u8(TAG_END);
                    write_int(buf, 0, enc);
                } else {
                    buf.put_u8(v[0].tag_id());
                    write_int(buf, v.len() as i32, enc);
                    for item in v {
                        item.write_payload(buf, enc);
                    }
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    buf.put_u8(value.tag_id());
                    write_string(buf, name, enc);
                    value.write_payload(buf, enc);
                }
                buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                write_int(buf, v.len() as i32, enc);
                for i in v {
                    write_int(buf, *i, enc);
                }
            }
            NbtValue::LongArray(v) => {
                write_int(buf, v.len() as i32, enc);
                for l in v {
                    write_long(buf, *l, enc);
                }
            }
        }
    }

    /// Read a root compound (tag id + name + payload) and return the value.
    pub fn read_root(buf: &mut impl Buf, enc: Encoding) -> Result<NbtValue, NbtError> {
        let tag = read_u8(buf)?;
        let _name = read_string(buf, enc)?;
        read_payload(buf, tag, enc)
    }
}

fn write_int(buf: &mut BytesMut, v: i32, enc: Encoding) {
    match enc {
        Encoding::LittleEndian => buf.put_i32_le(v),
        Encoding::NetworkLittleEndian => write_zigzag32(buf, v),
    }
}

fn write_long(buf: &mut BytesMut, v: i64, enc: Encoding) {
    match enc {
        Encoding::LittleEndian => buf.put_i64_le(v),
        Encoding::NetworkLittleEndian => write_zigzag64(buf, v),
    }
}

fn write_string(buf: &mut BytesMut, s: &str, enc: Encoding) {
    let bytes = s.as_bytes();
    match enc {
        Encoding::LittleEndian => {
            buf.put_u16_le(bytes.len() as u16);
        }
        Encoding::NetworkLittleEndian => {
            write_varuint32(buf, bytes.len() as u32);
        }
    }
    buf.put_slice(bytes);
}

fn write_zigzag32(buf: &mut BytesMut, v: i32) {
    let zz = ((v << 1) ^ (v >> 31)) as u32;
    write_varuint32(buf, zz);
}

fn write_zigzag64(buf: &mut BytesMut, v: i64) {
    let zz = ((v << 1) ^ (v >> 63)) as u64;
    write_varuint64(buf, zz);
}

fn write_varuint32(buf: &mut BytesMut, mut v: u32) {
    loop {
        let mut b = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            b |= 0x80;
        }
        buf.put_u8(b);
        if v == 0 {
            break;
        }
    }
}

fn write_varuint64(buf: &mut BytesMut, mut v: u64) {
    loop {
        let mut b = (v & 0x7f) as u8;
        v >>= 7;
        if v != 0 {
            b |= 0x80;
        }
        buf.put_u8(b);
        if v == 0 {
            break;
        }
    }
}

fn read_u8(buf: &mut impl Buf) -> Result<u8, NbtError> {
    if !buf.has_remaining() {
        return Err(NbtError::Eof);
    }
    Ok(buf.get_u8())
}

fn read_varuint32(buf: &mut impl Buf) -> Result<u32, NbtError> {
    let mut value: u32 = 0;
    for i in 0..5 {
        if !buf.has_remaining() {
            return Err(NbtError::Eof);
        }
        let b = buf.get_u8();
        value |= ((b & 0x7f) as u32) << (7 * i);
        if b & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(NbtError::BadVarint)
}

fn read_varuint64(buf: &mut impl Buf) -> Result<u64, NbtError> {
    let mut value: u64 = 0;
    for i in 0..10 {
        if !buf.has_remaining() {
            return Err(NbtError::Eof);
        }
        let b = buf.get_u8();
        value |= ((b & 0x7f) as u64) << (7 * i);
        if b & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(NbtError::BadVarint)
}

fn read_int(buf: &mut impl Buf, enc: Encoding) -> Result<i32, NbtError> {
    match enc {
        Encoding::LittleEndian => {
            if buf.remaining() < 4 {
                return Err(NbtError::Eof);
            }
            Ok(buf.get_i32_le())
        }
        Encoding::NetworkLittleEndian => {
            let zz = read_varuint32(buf)?;
            Ok(((zz >> 1) as i32) ^ -((zz & 1) as i32))
        }
    }
}

fn read_long(buf: &mut impl Buf, enc: Encoding) -> Result<i64, NbtError> {
    match enc {
        Encoding::LittleEndian => {
            if buf.remaining() < 8 {
                return Err(NbtError::Eof);
            }
            Ok(buf.get_i64_le())
        }
        Encoding::NetworkLittleEndian => {
            let zz = read_varuint64(buf)?;
            Ok(((zz >> 1) as i64) ^ -((zz & 1) as i64))
        }
    }
}

fn read_string(buf: &mut impl Buf, enc: Encoding) -> Result<String, NbtError> {
    let len = match enc {
        Encoding::LittleEndian => {
            if buf.remaining() < 2 {
                return Err(NbtError::Eof);
            }
            buf.get_u16_le() as usize
        }
        Encoding::NetworkLittleEndian => read_varuint32(buf)? as usize,
    };
    if buf.remaining() < len {
        return Err(NbtError::Eof);
    }
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn read_payload(buf: &mut impl Buf, tag: u8, enc: Encoding) -> Result<NbtValue, NbtError> {
    Ok(match tag {
        TAG_BYTE => {
            if !buf.has_remaining() {
                return Err(NbtError::Eof);
            }
            NbtValue::Byte(buf.get_i8())
        }
        TAG_SHORT => {
            if buf.remaining() < 2 {
                return Err(NbtError::Eof);
            }
            NbtValue::Short(buf.get_i16_le())
        }
        TAG_INT => NbtValue::Int(read_int(buf, enc)?),
        TAG_LONG => NbtValue::Long(read_long(buf, enc)?),
        TAG_FLOAT => {
            if buf.remaining() < 4 {
                return Err(NbtError::Eof);
            }
            NbtValue::Float(buf.get_f32_le())
        }
        TAG_DOUBLE => {
            if buf.remaining() < 8 {
                return Err(NbtError::Eof);
            }
            NbtValue::Double(buf.get_f64_le())
        }
        TAG_BYTE_ARRAY => {
            let len = read_int(buf, enc)?.max(0) as usize;
            if buf.remaining() < len {
                return Err(NbtError::Eof);
            }
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(buf.get_i8());
            }
            NbtValue::ByteArray(v)
        }
        TAG_STRING => NbtValue::String(read_string(buf, enc)?),
        TAG_LIST => {
            let item_tag = read_u8(buf)?;
            let len = read_int(buf, enc)?.max(0) as usize;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(read_payload(buf, item_tag, enc)?);
            }
            NbtValue::List(v)
        }
        TAG_COMPOUND => {
            let mut entries = Vec::new();
            loop {
                let entry_tag = read_u8(buf)?;
                if entry_tag == TAG_END {
                    break;
                }
                let name = read_string(buf, enc)?;
                let value = read_payload(buf, entry_tag, enc)?;
                entries.push((name, value));
            }
            NbtValue::Compound(entries)
        }
        TAG_INT_ARRAY => {
            let len = read_int(buf, enc)?.max(0) as usize;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(read_int(buf, enc)?);
            }
            NbtValue::IntArray(v)
        }
        TAG_LONG_ARRAY => {
            let len = read_int(buf, enc)?.max(0) as usize;
            let mut v = Vec::with_capacity(len);
            for _ in 0..len {
                v.push(read_long(buf, enc)?);
            }
            NbtValue::LongArray(v)
        }
        other => return Err(NbtError::UnknownTag(other)),
    })
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}

/// Helper macro for building list tags.
#[macro_export]
macro_rules! nbt_list {
    ($($val:expr),* $(,)?) => {
        $crate::NbtValue::List(vec![$($val),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_network_little_endian() {
        let nbt = nbt_compound! {
            "name" => NbtValue::String("stone".into()),
            "age" => NbtValue::Int(-42),
            "big" => NbtValue::Long(-1234567890123),
            "list" => nbt_list![NbtValue::Byte(1), NbtValue::Byte(2)],
        };
        let mut buf = BytesMut::new();
        nbt.write_root(&mut buf, Encoding::NetworkLittleEndian);
        let mut reader = buf.freeze();
        let decoded = NbtValue::read_root(&mut reader, Encoding::NetworkLittleEndian).unwrap();
        assert_eq!(decoded, nbt);
    }

    #[test]
    fn round_trips_little_endian() {
        let nbt = nbt_compound! {
            "x" => NbtValue::Int(100000),
            "y" => NbtValue::Short(7),
        };
        let mut buf = BytesMut::new();
        nbt.write_root(&mut buf, Encoding::LittleEndian);
        let mut reader = buf.freeze();
        let decoded = NbtValue::read_root(&mut reader, Encoding::LittleEndian).unwrap();
        assert_eq!(decoded, nbt);
    }

    #[test]
    fn long_array_payload_size() {
        let nbt = NbtValue::LongArray(vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        nbt.write_payload(&mut buf, Encoding::LittleEndian);
        // 4 bytes length + 3 * 8 bytes
        assert_eq!(buf.len(), 28);
    }

    #[test]
    fn zigzag_roundtrip_negative() {
        let nbt = NbtValue::Int(-1);
        let mut buf = BytesMut::new();
        nbt.write_payload(&mut buf, Encoding::NetworkLittleEndian);
        assert_eq!(buf.len(), 1); // zigzag(-1) == 1, fits in one byte
    }
}
