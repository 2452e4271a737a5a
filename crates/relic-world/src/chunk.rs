//! The paletted-storage chunk codec : decoding/encoding one
//! variable-bit-width storage, assembling sub-chunks and columns, and
//! downgrading a modern column to the legacy on-wire chunk format.

use bytes::{Buf, BytesMut};
use relic_data::MappingRegistry;
use relic_nbt::Encoding;
use relic_protocol_core::{
    read_u32_words, read_vari32, read_u8 as codec_read_u8, write_u32_words, write_vari32,
    BlockEntityEntry, CodecError, CodecResult,
};

/// Cells in one 16x16x16 paletted storage.
pub const CELLS: usize = 4096;
/// The legacy world's vertical range is exactly 16 sub-chunks, `[0, 256)`.
pub const LEGACY_SUB_CHUNKS: usize = 16;
/// The modern world extends 4 sub-chunks below and 4 above the legacy
/// floor/ceiling, so a modern column's storage array has this many slots.
pub const MODERN_SUB_CHUNKS: usize = LEGACY_SUB_CHUNKS + 8;
/// Index offset of the legacy floor within a modern-shaped column array.
pub const MODERN_FLOOR_OFFSET: usize = 4;

fn cell_index(x: usize, y: usize, z: usize) -> usize {
    (x << 8) | (z << 4) | y
}

/// One variable-bit-width paletted 16^3 volume: a flat array of 4096
/// palette indices plus the palette itself. `bits_per_index` is carried
/// explicitly (not recomputed) so a decoded storage round-trips exactly,
/// even if its bit width isn't the minimum the palette size would need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PalettedStorage {
    pub bits_per_index: u8,
    indices: Vec<u16>,
    pub palette: Vec<i32>,
}

impl PalettedStorage {
    pub fn uniform(value: i32) -> Self {
        Self {
            bits_per_index: 0,
            indices: vec![0; CELLS],
            palette: vec![value],
        }
    }

    /// Build a minimal-width storage from 4096 raw cell values, choosing
    /// the smallest `bits_per_index` in `{0,1,2,3,4,5,6,8,16}` that can
    /// address the distinct values observed.
    pub fn from_cells(values: &[i32; CELLS]) -> Self {
        let mut palette: Vec<i32> = Vec::new();
        let mut indices = vec![0u16; CELLS];
        for (i, &v) in values.iter().enumerate() {
            let idx = match palette.iter().position(|p| *p == v) {
                Some(p) => p,
                None => {
                    palette.push(v);
                    palette.len() - 1
                }
            };
            indices[i] = idx as u16;
        }
        if palette.len() == 1 {
            return Self {
                bits_per_index: 0,
                indices,
                palette,
            };
        }
        let needed_bits = (usize::BITS - (palette.len() - 1).leading_zeros()).max(1) as u8;
        let bits_per_index = *[1u8, 2, 3, 4, 5, 6, 8, 16]
            .iter()
            .find(|b| **b >= needed_bits)
            .unwrap_or(&16);
        Self {
            bits_per_index,
            indices,
            palette,
        }
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> i32 {
        let idx = self.indices[cell_index(x, y, z)] as usize;
        self.palette[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, palette_index: u16) {
        self.indices[cell_index(x, y, z)] = palette_index;
    }
}

fn entries_per_word(bits_per_index: u8) -> usize {
    if bits_per_index == 0 {
        0
    } else {
        32 / bits_per_index as usize
    }
}

fn word_count(bits_per_index: u8) -> usize {
    let epw = entries_per_word(bits_per_index);
    if epw == 0 {
        0
    } else {
        (CELLS + epw - 1) / epw
    }
}

fn pack_indices(indices: &[u16], bits_per_index: u8) -> Vec<u32> {
    let epw = entries_per_word(bits_per_index);
    let mut words = vec![0u32; word_count(bits_per_index)];
    let mask = (1u32 << bits_per_index) - 1;
    for (i, &idx) in indices.iter().enumerate() {
        let word = i / epw;
        let shift = (i % epw) * bits_per_index as usize;
        words[word] |= (idx as u32 & mask) << shift;
    }
    words
}

fn unpack_indices(words: &[u32], bits_per_index: u8) -> Vec<u16> {
    let epw = entries_per_word(bits_per_index);
    let mask = (1u32 << bits_per_index) - 1;
    let mut indices = Vec::with_capacity(CELLS);
    for i in 0..CELLS {
        let word = i / epw;
        let shift = (i % epw) * bits_per_index as usize;
        indices.push(((words[word] >> shift) & mask) as u16);
    }
    indices
}

/// Which kind of value a storage's palette entries hold, which only
/// affects how palette entries themselves are (de)serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    /// Block runtime IDs: signed varint palette entries.
    Block,
    /// Biome IDs: little-endian `u32` palette entries.
    Biome,
}

pub enum DecodedStorage {
    New(PalettedStorage),
    ReusePrevious,
}

/// Decode one storage. A header byte of `0xFF` signals "reuse
/// the previous layer's palette" and is returned as a sentinel rather
/// than resolved here, since resolving it requires the caller's context.
pub fn decode_one_storage(
    buf: &mut impl Buf,
    kind: PaletteKind,
) -> CodecResult<DecodedStorage> {
    let header = codec_read_u8(buf)?;
    if header == 0xFF {
        return Ok(DecodedStorage::ReusePrevious);
    }
    let bits_per_index = header >> 1;
    let indices = if bits_per_index == 0 {
        vec![0u16; CELLS]
    } else {
        let words = read_u32_words(buf, word_count(bits_per_index))?;
        unpack_indices(&words, bits_per_index)
    };

    let palette_count = read_vari32(buf)?;
    if bits_per_index != 0 && palette_count <= 0 {
        return Err(CodecError::InvalidPaletteCount(palette_count));
    }
    let count = if bits_per_index == 0 { 1 } else { palette_count as usize };
    let mut palette = Vec::with_capacity(count);
    for _ in 0..count {
        match kind {
            PaletteKind::Block => palette.push(read_vari32(buf)?),
            PaletteKind::Biome => {
                let words = read_u32_words(buf, 1)?;
                palette.push(words[0] as i32);
            }
        }
    }
    Ok(DecodedStorage::New(PalettedStorage {
        bits_per_index,
        indices,
        palette,
    }))
}

pub fn encode_one_storage(buf: &mut BytesMut, storage: &PalettedStorage, kind: PaletteKind) {
    let header = (storage.bits_per_index << 1) | 1;
    buf.extend_from_slice(&[header]);
    if storage.bits_per_index != 0 {
        let words = pack_indices(&storage.indices, storage.bits_per_index);
        write_u32_words(buf, &words);
    }
    write_vari32(buf, storage.palette.len() as i32);
    for &entry in &storage.palette {
        match kind {
            PaletteKind::Block => write_vari32(buf, entry),
            PaletteKind::Biome => write_u32_words(buf, &[entry as u32]),
        }
    }
}

/// Decode a stream of storages where a `0xFF` header means "same palette
/// and indices as the previous entry" . The first entry
/// may never be a sentinel.
pub fn decode_storage_stream(
    buf: &mut impl Buf,
    count: usize,
    kind: PaletteKind,
) -> CodecResult<Vec<PalettedStorage>> {
    let mut out: Vec<PalettedStorage> = Vec::with_capacity(count);
    for _ in 0..count {
        match decode_one_storage(buf, kind)? {
            DecodedStorage::New(s) => out.push(s),
            DecodedStorage::ReusePrevious => {
                let prev = out.last().cloned().ok_or(CodecError::NoPreviousPalette)?;
                out.push(prev);
            }
        }
    }
    Ok(out)
}

/// One sub-chunk: 1+ paletted block-storage layers (layer 0 primary,
/// layer 1+ overlay e.g. waterlogging), plus the version-9 absolute Y
/// index if the wire carried one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubChunk {
    pub layers: Vec<PalettedStorage>,
    pub y_index: Option<i32>,
}

/// Decode one sub-chunk . `range_min` is needed to translate a
/// version-9 absolute Y byte into a logical column index.
pub fn decode_sub_chunk(buf: &mut impl Buf, range_min: i32) -> CodecResult<SubChunk> {
    let version = codec_read_u8(buf)?;
    match version {
        1 => {
            let storage = match decode_one_storage(buf, PaletteKind::Block)? {
                DecodedStorage::New(s) => s,
                DecodedStorage::ReusePrevious => return Err(CodecError::NoPreviousPalette),
            };
            Ok(SubChunk {
                layers: vec![storage],
                y_index: None,
            })
        }
        8 => {
            let layer_count = codec_read_u8(buf)? as usize;
            let layers = decode_storage_stream(buf, layer_count, PaletteKind::Block)?;
            Ok(SubChunk {
                layers,
                y_index: None,
            })
        }
        9 => {
            let layer_count = codec_read_u8(buf)? as usize;
            let y_value = relic_protocol_core::read_i8(buf)? as i32;
            let layers = decode_storage_stream(buf, layer_count, PaletteKind::Block)?;
            Ok(SubChunk {
                layers,
                y_index: Some(y_value - (range_min >> 4)),
            })
        }
        other => Err(CodecError::UnknownSubChunkVersion(other)),
    }
}

/// How a column's biomes are laid out, depending on the source's era.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnBiomes {
    /// Legacy 2-D biome byte per `(x, z)` column cell.
    Legacy2D(Box<[u8; 256]>),
    /// One paletted biome storage per modern-indexed sub-chunk slot.
    PerSubChunk(Box<[Option<PalettedStorage>; MODERN_SUB_CHUNKS]>),
}

/// A decoded modern column: up to [`MODERN_SUB_CHUNKS`] sub-chunk slots
/// (index via [`sub_chunk_slot`]) plus biomes.
pub struct Column {
    pub sub_chunks: Box<[Option<SubChunk>; MODERN_SUB_CHUNKS]>,
    pub biomes: ColumnBiomes,
}

fn sub_chunk_slot(i: usize, old_format: bool) -> usize {
    if old_format {
        i
    } else {
        i + MODERN_FLOOR_OFFSET
    }
}

/// Decode a modern column. `range_min` is the column's vertical
/// range floor in block units (e.g. `-64` for a modern overworld), used
/// only to resolve version-9 sub-chunks' absolute Y byte.
pub fn decode_column(
    buf: &mut impl Buf,
    sub_chunk_count: usize,
    old_format: bool,
    range_min: i32,
) -> CodecResult<Column> {
    let mut sub_chunks: Box<[Option<SubChunk>; MODERN_SUB_CHUNKS]> =
        Box::new(std::array::from_fn(|_| None));
    for i in 0..sub_chunk_count {
        let sc = decode_sub_chunk(buf, range_min)?;
        sub_chunks[sub_chunk_slot(i, old_format)] = Some(sc);
    }

    let biomes = if old_format {
        let mut arr = [0u8; 256];
        for b in arr.iter_mut() {
            *b = codec_read_u8(buf)?;
        }
        ColumnBiomes::Legacy2D(Box::new(arr))
    } else {
        let decoded = decode_storage_stream(buf, sub_chunk_count, PaletteKind::Biome)?;
        let mut slots: Box<[Option<PalettedStorage>; MODERN_SUB_CHUNKS]> =
            Box::new(std::array::from_fn(|_| None));
        for (i, storage) in decoded.into_iter().enumerate() {
            slots[sub_chunk_slot(i, old_format)] = Some(storage);
        }
        ColumnBiomes::PerSubChunk(slots)
    };

    Ok(Column { sub_chunks, biomes })
}

/// A downgraded column, shaped for the legacy wire: exactly
/// [`LEGACY_SUB_CHUNKS`] sub-chunks plus a flat 256-byte biome map.
pub struct LegacyColumn {
    pub sub_chunks: Vec<Vec<PalettedStorage>>,
    pub biomes: [u8; 256],
}

/// Column addressing helpers , mirroring the legacy chunk's
/// internal indexing; reused by the downgrade path.
pub fn sub_index(y: i32, range_min: i32) -> i32 {
    (y >> 4) - (range_min >> 4)
}

pub fn sub_y(index: i32, range_min: i32) -> i32 {
    (index + (range_min >> 4)) << 4
}

pub fn column_offset(x: i32, z: i32) -> usize {
    ((x & 15) | ((z & 15) << 4)) as usize
}

/// Downgrade a modern column to the legacy shape : strip the top
/// and bottom 4 sub-chunks, remap every block cell through the mapping
/// registry, and collapse biomes to a single 2-D byte per `(x, z)`.
pub fn downgrade_column(column: &Column, registry: &MappingRegistry) -> LegacyColumn {
    let modern_air = registry.state_to_runtime_id_modern("minecraft:air", &Default::default());
    let legacy_air = registry.state_to_runtime_id_legacy("minecraft:air", &Default::default());

    let mut sub_chunks = Vec::with_capacity(LEGACY_SUB_CHUNKS);
    for legacy_idx in 0..LEGACY_SUB_CHUNKS {
        let modern_idx = legacy_idx + MODERN_FLOOR_OFFSET;
        let layers = match &column.sub_chunks[modern_idx] {
            None => vec![PalettedStorage::uniform(legacy_air as i32)],
            Some(sc) => sc
                .layers
                .iter()
                .map(|layer| downgrade_layer(layer, modern_air, legacy_air, registry))
                .collect(),
        };
        sub_chunks.push(layers);
    }

    let biomes = downgrade_biomes(column, modern_air);

    LegacyColumn { sub_chunks, biomes }
}

/// Build a column's [`ColumnBiomes::PerSubChunk`] from a raw modern biome
/// storage stream (what a `SubChunkRequestMode::Limited`/`Limitless`
/// `LevelChunk` payload carries instead of block data). Split out of
/// [`decode_column`] so the orchestrator can decode a cached biome payload
/// independently of the block sub-chunks, which arrive later via
/// `SubChunk` replies.
pub fn decode_biome_stream(buf: &mut impl Buf, sub_chunk_count: usize) -> CodecResult<ColumnBiomes> {
    let decoded = decode_storage_stream(buf, sub_chunk_count, PaletteKind::Biome)?;
    let mut slots: Box<[Option<PalettedStorage>; MODERN_SUB_CHUNKS]> =
        Box::new(std::array::from_fn(|_| None));
    for (i, storage) in decoded.into_iter().enumerate() {
        slots[i + MODERN_FLOOR_OFFSET] = Some(storage);
    }
    Ok(ColumnBiomes::PerSubChunk(slots))
}

fn downgrade_layer(
    layer: &PalettedStorage,
    modern_air: u32,
    legacy_air: u32,
    registry: &MappingRegistry,
) -> PalettedStorage {
    let mut out = [0i32; CELLS];
    for x in 0..16 {
        for y in 0..16 {
            for z in 0..16 {
                let modern_rid = layer.get(x, y, z) as u32;
                let legacy_rid = if modern_rid == modern_air {
                    legacy_air
                } else {
                    match registry.runtime_id_to_state_modern(modern_rid) {
                        Some(state) => {
                            registry.state_to_runtime_id_legacy(&state.name, &state.properties)
                        }
                        None => registry.legacy_fallback_runtime_id(),
                    }
                };
                out[cell_index(x, y, z)] = legacy_rid as i32;
            }
        }
    }
    PalettedStorage::from_cells(&out)
}

/// Finds the highest non-air block at a single `(x, z)` column position
/// (scanning sub-chunks top-down, then Y 15->0 within each, in layer 0),
/// defaulting to world Y 0 when that column has no non-air block at all.
fn highest_non_air(column: &Column, modern_air: u32, x: usize, z: usize) -> (usize, u8) {
    for idx in (0..MODERN_SUB_CHUNKS).rev() {
        let Some(sc) = &column.sub_chunks[idx] else {
            continue;
        };
        let Some(layer0) = sc.layers.first() else {
            continue;
        };
        for y in (0..16u8).rev() {
            if layer0.get(x, y as usize, z) as u32 != modern_air {
                return (idx, y);
            }
        }
    }
    (MODERN_FLOOR_OFFSET, 0)
}

fn downgrade_biomes(column: &Column, modern_air: u32) -> [u8; 256] {
    match &column.biomes {
        ColumnBiomes::Legacy2D(arr) => **arr,
        ColumnBiomes::PerSubChunk(slots) => {
            let mut out = [0u8; 256];
            for x in 0..16 {
                for z in 0..16 {
                    let (idx, y) = highest_non_air(column, modern_air, x, z);
                    if let Some(storage) = &slots[idx] {
                        out[column_offset(x as i32, z as i32)] = storage.get(x, y as usize, z) as u8;
                    }
                }
            }
            out
        }
    }
}

/// Re-encode a downgraded column into the legacy on-wire chunk format
/// : each sub-chunk as version 8, then the 256-byte biome map,
/// a trailing zero byte, then any block-entity NBT tags.
pub fn encode_legacy_chunk(column: &LegacyColumn, block_entities: &[BlockEntityEntry]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    for layers in &column.sub_chunks {
        buf.extend_from_slice(&[8u8, layers.len() as u8]);
        for layer in layers {
            encode_one_storage(&mut buf, layer, PaletteKind::Block);
        }
    }
    buf.extend_from_slice(&column.biomes);
    buf.extend_from_slice(&[0u8]);
    for entry in block_entities {
        entry.tag.write_root(&mut buf, Encoding::LittleEndian);
    }
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_roundtrips_through_wire() {
        let mut cells = [0i32; CELLS];
        for (i, c) in cells.iter_mut().enumerate() {
            *c = (i % 5) as i32;
        }
        let storage = PalettedStorage::from_cells(&cells);

        let mut buf = BytesMut::new();
        encode_one_storage(&mut buf, &storage, PaletteKind::Block);
        let mut reader = buf.freeze();
        let decoded = match decode_one_storage(&mut reader, PaletteKind::Block).unwrap() {
            DecodedStorage::New(s) => s,
            DecodedStorage::ReusePrevious => panic!("unexpected sentinel"),
        };
        assert_eq!(decoded, storage);
    }

    #[test]
    fn uniform_storage_has_zero_bits_and_one_entry() {
        let storage = PalettedStorage::uniform(7);
        assert_eq!(storage.bits_per_index, 0);
        assert_eq!(storage.palette, vec![7]);
        assert_eq!(storage.get(3, 3, 3), 7);
    }

    #[test]
    fn sentinel_chain_reuses_previous_palette() {
        let s0 = PalettedStorage::uniform(1);
        let s3 = PalettedStorage::uniform(9);

        let mut buf = BytesMut::new();
        encode_one_storage(&mut buf, &s0, PaletteKind::Biome);
        buf.extend_from_slice(&[0xFF]);
        buf.extend_from_slice(&[0xFF]);
        encode_one_storage(&mut buf, &s3, PaletteKind::Biome);

        let mut reader = buf.freeze();
        let decoded = decode_storage_stream(&mut reader, 4, PaletteKind::Biome).unwrap();
        assert_eq!(decoded[0], s0);
        assert_eq!(decoded[1], s0);
        assert_eq!(decoded[2], s0);
        assert_eq!(decoded[3], s3);
    }

    #[test]
    fn stream_starting_with_sentinel_fails() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0xFF]);
        let mut reader = buf.freeze();
        assert!(decode_storage_stream(&mut reader, 1, PaletteKind::Biome).is_err());
    }

    #[test]
    fn column_addressing_helpers_roundtrip() {
        assert_eq!(sub_y(sub_index(68, 0), 0), 64);
        assert_eq!(column_offset(17, 33), column_offset(1, 1));
    }

    #[test]
    fn all_air_column_downgrades_to_all_air() {
        let registry = MappingRegistry::new();
        let modern_air = registry.state_to_runtime_id_modern("minecraft:air", &Default::default());
        let legacy_air = registry.state_to_runtime_id_legacy("minecraft:air", &Default::default());

        let air_layer = PalettedStorage::uniform(modern_air as i32);
        let sub_chunks: Box<[Option<SubChunk>; MODERN_SUB_CHUNKS]> =
            Box::new(std::array::from_fn(|_| {
                Some(SubChunk {
                    layers: vec![air_layer.clone()],
                    y_index: None,
                })
            }));
        let column = Column {
            sub_chunks,
            biomes: ColumnBiomes::Legacy2D(Box::new([0u8; 256])),
        };

        let legacy = downgrade_column(&column, &registry);
        assert_eq!(legacy.sub_chunks.len(), LEGACY_SUB_CHUNKS);
        for layers in &legacy.sub_chunks {
            for layer in layers {
                for x in 0..16 {
                    for y in 0..16 {
                        for z in 0..16 {
                            assert_eq!(layer.get(x, y, z) as u32, legacy_air);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn biome_sampled_per_column_position_not_globally() {
        // Column (x=0, z=0) is tall (solid up through a high sub-chunk);
        // every other column only has ground in the low sub-chunk. Each
        // height carries a distinct biome id in its `PerSubChunk` slot, so
        // the downgraded biome map must follow each (x, z)'s own highest
        // non-air block rather than one height for the whole column.
        let modern_air = 0u32;
        let modern_stone = 1u32;
        let low_idx = MODERN_FLOOR_OFFSET;
        let high_idx = MODERN_FLOOR_OFFSET + 5;
        const LOW_BIOME: u8 = 7;
        const HIGH_BIOME: u8 = 42;

        let low_cells = [modern_stone as i32; CELLS];
        let low_layer = PalettedStorage::from_cells(&low_cells);

        let mut high_cells = [modern_air as i32; CELLS];
        for y in 0..16 {
            high_cells[cell_index(0, y, 0)] = modern_stone as i32;
        }
        let high_layer = PalettedStorage::from_cells(&high_cells);
        let air_layer = PalettedStorage::uniform(modern_air as i32);

        let sub_chunks: Box<[Option<SubChunk>; MODERN_SUB_CHUNKS]> =
            Box::new(std::array::from_fn(|idx| {
                if idx == low_idx {
                    Some(SubChunk {
                        layers: vec![low_layer.clone()],
                        y_index: None,
                    })
                } else if idx == high_idx {
                    Some(SubChunk {
                        layers: vec![high_layer.clone()],
                        y_index: None,
                    })
                } else {
                    Some(SubChunk {
                        layers: vec![air_layer.clone()],
                        y_index: None,
                    })
                }
            }));

        let mut slots: Box<[Option<PalettedStorage>; MODERN_SUB_CHUNKS]> =
            Box::new(std::array::from_fn(|_| None));
        slots[low_idx] = Some(PalettedStorage::uniform(LOW_BIOME as i32));
        slots[high_idx] = Some(PalettedStorage::uniform(HIGH_BIOME as i32));

        let column = Column {
            sub_chunks,
            biomes: ColumnBiomes::PerSubChunk(slots),
        };

        let biomes = downgrade_biomes(&column, modern_air);
        assert_eq!(biomes[column_offset(0, 0)], HIGH_BIOME);
        assert_eq!(biomes[column_offset(1, 0)], LOW_BIOME);
        assert_eq!(biomes[column_offset(0, 1)], LOW_BIOME);
        assert_eq!(biomes[column_offset(15, 15)], LOW_BIOME);
    }
}
