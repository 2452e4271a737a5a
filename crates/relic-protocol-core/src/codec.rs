//! Wire-level primitives shared by every legacy packet: varints, zigzag
//! ints, length-prefixed strings, and the bulk little-endian integer reads
//! the paletted-storage codec needs for throughput.

use bytes::{Buf, BufMut, BytesMut};
use relic_types::{BlockPos, ItemStack, Pose, Vec3f};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("not enough data in buffer")]
    NotEnoughData,
    #[error("varint exceeds maximum encoded width")]
    VarIntTooBig,
    #[error("unknown packet id {0}")]
    UnknownPacketId(u32),
    #[error("unknown sub-chunk format version {0}")]
    UnknownSubChunkVersion(u8),
    #[error("palette count must be positive when bits_per_index != 0, got {0}")]
    InvalidPaletteCount(i32),
    #[error("storage signals palette reuse with no previous storage to reuse")]
    NoPreviousPalette,
    #[error("invalid UTF-8 in packet string")]
    InvalidUtf8,
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Unsigned LEB128 varint, as used for most integer fields on the Bedrock
/// wire (packet length prefixes, string lengths, palette entry counts).
pub fn read_varu32(buf: &mut impl Buf) -> CodecResult<u32> {
    let mut value: u32 = 0;
    for i in 0..5 {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarIntTooBig)
}

pub fn write_varu32(buf: &mut BytesMut, mut value: u32) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn read_varu64(buf: &mut impl Buf) -> CodecResult<u64> {
    let mut value: u64 = 0;
    for i in 0..10 {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        value |= ((byte & 0x7f) as u64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::VarIntTooBig)
}

pub fn write_varu64(buf: &mut BytesMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Signed varint, zigzag-encoded. Used for block runtime IDs in a network
/// palette  and most signed integer packet fields.
pub fn read_vari32(buf: &mut impl Buf) -> CodecResult<i32> {
    let zz = read_varu32(buf)?;
    Ok(((zz >> 1) as i32) ^ -((zz & 1) as i32))
}

pub fn write_vari32(buf: &mut BytesMut, value: i32) {
    let zz = ((value << 1) ^ (value >> 31)) as u32;
    write_varu32(buf, zz);
}

pub fn read_vari64(buf: &mut impl Buf) -> CodecResult<i64> {
    let zz = read_varu64(buf)?;
    Ok(((zz >> 1) as i64) ^ -((zz & 1) as i64))
}

pub fn write_vari64(buf: &mut BytesMut, value: i64) {
    let zz = ((value << 1) ^ (value >> 63)) as u64;
    write_varu64(buf, zz);
}

/// A varint-length-prefixed UTF-8 string, the shape every Bedrock packet
/// uses for string fields.
pub fn read_string(buf: &mut impl Buf) -> CodecResult<String> {
    let len = read_varu32(buf)? as usize;
    if buf.remaining() < len {
        return Err(CodecError::NotEnoughData);
    }
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)
}

pub fn write_string(buf: &mut BytesMut, s: &str) {
    write_varu32(buf, s.len() as u32);
    buf.put_slice(s.as_bytes());
}

pub fn read_bool(buf: &mut impl Buf) -> CodecResult<bool> {
    if !buf.has_remaining() {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_u8() != 0)
}

pub fn write_bool(buf: &mut BytesMut, v: bool) {
    buf.put_u8(if v { 1 } else { 0 });
}

pub fn read_f32(buf: &mut impl Buf) -> CodecResult<f32> {
    if buf.remaining() < 4 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_f32_le())
}

pub fn read_u8(buf: &mut impl Buf) -> CodecResult<u8> {
    if !buf.has_remaining() {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_u8())
}

pub fn read_i8(buf: &mut impl Buf) -> CodecResult<i8> {
    if !buf.has_remaining() {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_i8())
}

/// Bulk-read `count` little-endian `u32` words directly off the buffer's
/// underlying slice rather than looping a generic integer reader one word
/// at a time — the paletted-storage decoder calls this once per storage
/// and it is the hottest loop in the chunk codec.
pub fn read_u32_words(buf: &mut impl Buf, count: usize) -> CodecResult<Vec<u32>> {
    let byte_len = count * 4;
    if buf.remaining() < byte_len {
        return Err(CodecError::NotEnoughData);
    }
    let mut words = Vec::with_capacity(count);
    let mut chunk = [0u8; 4];
    for _ in 0..count {
        buf.copy_to_slice(&mut chunk);
        words.push(u32::from_le_bytes(chunk));
    }
    Ok(words)
}

pub fn write_u32_words(buf: &mut BytesMut, words: &[u32]) {
    for w in words {
        buf.put_u32_le(*w);
    }
}

pub fn read_i32(buf: &mut impl Buf) -> CodecResult<i32> {
    if buf.remaining() < 4 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_i32_le())
}

pub fn read_i64(buf: &mut impl Buf) -> CodecResult<i64> {
    if buf.remaining() < 8 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_i64_le())
}

pub fn read_u64(buf: &mut impl Buf) -> CodecResult<u64> {
    if buf.remaining() < 8 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_u64_le())
}

pub fn read_uuid(buf: &mut impl Buf) -> CodecResult<uuid::Uuid> {
    if buf.remaining() < 16 {
        return Err(CodecError::NotEnoughData);
    }
    let mut bytes = [0u8; 16];
    buf.copy_to_slice(&mut bytes);
    Ok(uuid::Uuid::from_bytes(bytes))
}

pub fn write_uuid(buf: &mut BytesMut, id: &uuid::Uuid) {
    buf.put_slice(id.as_bytes());
}

pub fn read_vec3f(buf: &mut impl Buf) -> CodecResult<Vec3f> {
    Ok(Vec3f::new(read_f32(buf)?, read_f32(buf)?, read_f32(buf)?))
}

pub fn write_vec3f(buf: &mut BytesMut, v: Vec3f) {
    buf.put_f32_le(v.x);
    buf.put_f32_le(v.y);
    buf.put_f32_le(v.z);
}

pub fn read_block_pos(buf: &mut impl Buf) -> CodecResult<BlockPos> {
    Ok(BlockPos::new(
        read_vari32(buf)?,
        read_vari32(buf)?,
        read_vari32(buf)?,
    ))
}

pub fn write_block_pos(buf: &mut BytesMut, p: BlockPos) {
    write_vari32(buf, p.x);
    write_vari32(buf, p.y);
    write_vari32(buf, p.z);
}

pub fn read_pose(buf: &mut impl Buf) -> CodecResult<Pose> {
    Ok(Pose {
        position: read_vec3f(buf)?,
        pitch: read_f32(buf)?,
        yaw: read_f32(buf)?,
        head_yaw: read_f32(buf)?,
    })
}

pub fn write_pose(buf: &mut BytesMut, p: Pose) {
    write_vec3f(buf, p.position);
    buf.put_f32_le(p.pitch);
    buf.put_f32_le(p.yaw);
    buf.put_f32_le(p.head_yaw);
}

/// Length-prefixed list of strings, the shape `CanBePlacedOn`/`CanBreak`
/// and every other string-array field on the legacy wire uses.
pub fn read_string_list(buf: &mut impl Buf) -> CodecResult<Vec<String>> {
    let count = read_varu32(buf)? as usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(read_string(buf)?);
    }
    Ok(out)
}

pub fn write_string_list(buf: &mut BytesMut, items: &[String]) {
    write_varu32(buf, items.len() as u32);
    for s in items {
        write_string(buf, s);
    }
}

/// An item stack as it appears inline in a legacy packet: a zero
/// `network_id` means an empty slot and every other field is omitted.
pub fn read_item(buf: &mut impl Buf) -> CodecResult<ItemStack> {
    let network_id = read_vari32(buf)?;
    if network_id == 0 {
        return Ok(ItemStack::empty());
    }
    let metadata_value = read_vari32(buf)? as i16;
    let count = read_vari32(buf)? as i16;
    let has_nbt = read_bool(buf)?;
    let nbt_data = if has_nbt {
        Some(
            relic_nbt::NbtValue::read_root(buf, relic_nbt::Encoding::NetworkLittleEndian)
                .map_err(|_| CodecError::NotEnoughData)?,
        )
    } else {
        None
    };
    let can_be_placed_on = read_string_list(buf)?;
    let can_break = read_string_list(buf)?;
    Ok(ItemStack {
        network_id,
        metadata_value,
        count,
        nbt_data,
        can_be_placed_on,
        can_break,
    })
}

pub fn write_item(buf: &mut BytesMut, item: &ItemStack) {
    write_vari32(buf, item.network_id);
    if item.network_id == 0 {
        return;
    }
    write_vari32(buf, item.metadata_value as i32);
    write_vari32(buf, item.count as i32);
    match &item.nbt_data {
        Some(nbt) => {
            write_bool(buf, true);
            nbt.write_root(buf, relic_nbt::Encoding::NetworkLittleEndian);
        }
        None => write_bool(buf, false),
    }
    write_string_list(buf, &item.can_be_placed_on);
    write_string_list(buf, &item.can_break);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varu32_roundtrip() {
        for v in [0u32, 1, 127, 128, 300, u32::MAX] {
            let mut buf = BytesMut::new();
            write_varu32(&mut buf, v);
            let mut reader = buf.freeze();
            assert_eq!(read_varu32(&mut reader).unwrap(), v);
        }
    }

    #[test]
    fn vari32_roundtrip_negative() {
        for v in [-1i32, 0, 1, -1000, i32::MIN, i32::MAX] {
            let mut buf = BytesMut::new();
            write_vari32(&mut buf, v);
            let mut reader = buf.freeze();
            assert_eq!(read_vari32(&mut reader).unwrap(), v);
        }
    }

    #[test]
    fn string_roundtrip() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "minecraft:stone");
        let mut reader = buf.freeze();
        assert_eq!(read_string(&mut reader).unwrap(), "minecraft:stone");
    }

    #[test]
    fn item_roundtrip_nonempty() {
        let item = ItemStack {
            network_id: 5,
            metadata_value: 2,
            count: 3,
            nbt_data: None,
            can_be_placed_on: vec!["minecraft:stone".into()],
            can_break: vec![],
        };
        let mut buf = BytesMut::new();
        write_item(&mut buf, &item);
        let mut reader = buf.freeze();
        assert_eq!(read_item(&mut reader).unwrap(), item);
    }

    #[test]
    fn item_roundtrip_empty() {
        let mut buf = BytesMut::new();
        write_item(&mut buf, &ItemStack::empty());
        let mut reader = buf.freeze();
        assert_eq!(read_item(&mut reader).unwrap(), ItemStack::empty());
    }

    #[test]
    fn pose_roundtrip() {
        let pose = Pose {
            position: Vec3f::new(1.0, 64.0, 2.0),
            pitch: 10.0,
            yaw: 90.0,
            head_yaw: 90.0,
        };
        let mut buf = BytesMut::new();
        write_pose(&mut buf, pose);
        let mut reader = buf.freeze();
        assert_eq!(read_pose(&mut reader).unwrap(), pose);
    }

    #[test]
    fn u32_words_bulk_roundtrip() {
        let words = vec![1u32, 0xdead_beef, 0, u32::MAX];
        let mut buf = BytesMut::new();
        write_u32_words(&mut buf, &words);
        let mut reader = buf.freeze();
        assert_eq!(read_u32_words(&mut reader, words.len()).unwrap(), words);
    }
}
