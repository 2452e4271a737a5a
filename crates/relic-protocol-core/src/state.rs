//! The packet pool: a mapping from legacy packet ID to an empty packet
//! value, used by the decoder to know which shape to parse into. Per
//!/, an unregistered ID is not an error — the default behavior is
//! pass-through as an opaque frame.

use crate::packets::LegacyPacketId;

/// Looks up whether a given legacy packet ID is known to this pool. The
/// pool itself holds no decode logic (that lives on each packet's
/// `encode`/`decode` pair, per the "replace callback-style decoding with
/// two explicit functions" design note) — it only answers "do I know this
/// ID, and if so as which pool entry".
#[derive(Debug, Default)]
pub struct PacketPool;

impl PacketPool {
    pub fn new() -> Self {
        Self
    }

    pub fn lookup(&self, packet_id: u32) -> Option<LegacyPacketId> {
        LegacyPacketId::from_u32(packet_id)
    }

    /// Whether an unregistered packet ID should be forwarded untranslated
    /// rather than dropped. The legacy pool always passes through; a
    /// future pool serving the modern side could choose otherwise, hence
    /// the method rather than a bare constant.
    pub fn pass_through_unknown(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_id_resolves() {
        let pool = PacketPool::new();
        assert_eq!(pool.lookup(11), Some(LegacyPacketId::StartGame));
    }

    #[test]
    fn unknown_id_is_none_but_passes_through() {
        let pool = PacketPool::new();
        assert_eq!(pool.lookup(0xffff), None);
        assert!(pool.pass_through_unknown());
    }
}
