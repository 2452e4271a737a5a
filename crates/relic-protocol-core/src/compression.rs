//! Selects the payload (de)compressor for a connection based on the
//! negotiated RakNet protocol version of the external interfaces.

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{Read, Write};

/// RakNet protocol version 9: the 1.12.x era. Payloads are zlib-wrapped
/// (RFC 1950) DEFLATE at the default compression level.
pub const LEGACY_1_12_PROTOCOL: u8 = 9;
/// RakNet protocol version 10: the 1.16.100 era. Payloads are raw DEFLATE,
/// no zlib header/trailer.
pub const LEGACY_1_16_100_PROTOCOL: u8 = 10;
/// Sentinel used by the modern era to mean "no inline per-packet
/// compression" — the modern transport negotiates compression out of band.
pub const MODERN_NO_COMPRESSION: u16 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compressor {
    Zlib,
    RawDeflate,
    None,
}

pub fn select_compressor(protocol_version: u8) -> Compressor {
    match protocol_version {
        LEGACY_1_12_PROTOCOL => Compressor::Zlib,
        LEGACY_1_16_100_PROTOCOL => Compressor::RawDeflate,
        _ => Compressor::None,
    }
}

pub fn compress(compressor: Compressor, data: &[u8]) -> std::io::Result<Vec<u8>> {
    match compressor {
        Compressor::Zlib => {
            let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
            enc.write_all(data)?;
            enc.finish()
        }
        Compressor::RawDeflate => {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
            enc.write_all(data)?;
            enc.finish()
        }
        Compressor::None => Ok(data.to_vec()),
    }
}

pub fn decompress(compressor: Compressor, data: &[u8]) -> std::io::Result<Vec<u8>> {
    match compressor {
        Compressor::Zlib => {
            let mut dec = ZlibDecoder::new(data);
            let mut out = Vec::new();
            dec.read_to_end(&mut out)?;
            Ok(out)
        }
        Compressor::RawDeflate => {
            let mut dec = DeflateDecoder::new(data);
            let mut out = Vec::new();
            dec.read_to_end(&mut out)?;
            Ok(out)
        }
        Compressor::None => Ok(data.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_zlib_for_1_12() {
        assert_eq!(select_compressor(LEGACY_1_12_PROTOCOL), Compressor::Zlib);
    }

    #[test]
    fn selects_raw_deflate_for_1_16_100() {
        assert_eq!(
            select_compressor(LEGACY_1_16_100_PROTOCOL),
            Compressor::RawDeflate
        );
    }

    #[test]
    fn selects_none_for_modern() {
        assert_eq!(select_compressor(0), Compressor::None);
    }

    #[test]
    fn zlib_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = compress(Compressor::Zlib, &data).unwrap();
        let decompressed = decompress(Compressor::Zlib, &compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn raw_deflate_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = compress(Compressor::RawDeflate, &data).unwrap();
        let decompressed = decompress(Compressor::RawDeflate, &compressed).unwrap();
        assert_eq!(decompressed, data);
    }
}
