pub mod chunk;

pub use chunk::{
    column_offset, decode_biome_stream, decode_column, decode_one_storage, decode_sub_chunk,
    downgrade_column, encode_legacy_chunk, encode_one_storage, sub_index, sub_y, Column,
    ColumnBiomes, DecodedStorage, LegacyColumn, PaletteKind, PalettedStorage, SubChunk, CELLS,
    LEGACY_SUB_CHUNKS, MODERN_FLOOR_OFFSET, MODERN_SUB_CHUNKS,
};
