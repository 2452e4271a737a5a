//! Build-time mapping tables bridging the legacy (1.12.x) and modern
//! Bedrock block/item namespaces.
//!
//! All data in here is embedded at compile time from `resources/*.json`
//! (see `build.rs`) rather than fetched at runtime: block/item registries
//! don't change between proxy restarts, so there's no reason to pay a
//! parse cost on every connection. [`MappingRegistry`] is the single
//! entry point callers use; everything else in this crate exists to
//! build one.

use relic_types::{BlockState, PropertyValue};
use std::collections::{BTreeMap, HashMap};

/// A property value as emitted by `build.rs`. Distinct from
/// `relic_types::PropertyValue` only in that it's `'static`-friendly so
/// the generated table can be a plain `static`.
#[derive(Debug, Clone, Copy)]
pub enum RawProp {
    Bool(bool),
    Byte(i8),
    Int(i32),
    Str(&'static str),
}

impl From<RawProp> for PropertyValue {
    fn from(p: RawProp) -> Self {
        match p {
            RawProp::Bool(b) => PropertyValue::Bool(b),
            RawProp::Byte(b) => PropertyValue::Byte(b),
            RawProp::Int(i) => PropertyValue::Int(i),
            RawProp::Str(s) => PropertyValue::String(s.to_owned()),
        }
    }
}

/// A block state as emitted by `build.rs`.
#[derive(Debug, Clone, Copy)]
pub struct RawState {
    pub name: &'static str,
    pub properties: &'static [(&'static str, RawProp)],
}

impl RawState {
    fn to_block_state(self) -> BlockState {
        let mut properties = BTreeMap::new();
        for (k, v) in self.properties {
            properties.insert((*k).to_owned(), (*v).into());
        }
        BlockState {
            name: self.name.to_owned(),
            properties,
            version: 0,
        }
    }
}

mod generated {
    use super::RawProp;
    use super::RawState;
    include!(concat!(env!("OUT_DIR"), "/generated.rs"));
}

pub use generated::{
    BLOCK_ALIASES, BLOCK_ID_MAP, ITEM_ALIASES, ITEM_ID_MAP, LEGACY_META_BY_MODERN_INDEX,
    MODERN_BLOCK_STATES, MODERN_ITEMS,
};

/// The identity key used by every block-state lookup table: a name plus
/// the values of its properties, encoded in a fixed per-type byte
/// scheme, with keys visited in lexicographic order. Keys themselves are
/// not part of the encoding (only their sort order is) — for a given
/// block name the set of property keys is fixed, so the value sequence
/// alone is unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateHash {
    name: String,
    encoded: Vec<u8>,
}

/// Hash a block state into the key used by the runtime-ID tables.
pub fn hash_state(name: &str, properties: &BTreeMap<String, PropertyValue>) -> StateHash {
    let mut encoded = Vec::new();
    // BTreeMap iterates keys in sorted order already.
    for value in properties.values() {
        match value {
            PropertyValue::Bool(b) => encoded.push(if *b { 1 } else { 0 }),
            PropertyValue::Byte(b) => encoded.push(*b as u8),
            PropertyValue::Int(i) => encoded.extend_from_slice(&i.to_le_bytes()),
            PropertyValue::String(s) => encoded.extend_from_slice(s.as_bytes()),
        }
    }
    StateHash {
        name: name.to_owned(),
        encoded,
    }
}

fn hash_block_state(state: &BlockState) -> StateHash {
    hash_state(&state.name, &state.properties)
}

/// Classic FNV-1 (not FNV-1a) 64-bit hash: `hash = (hash * prime) ^ byte`.
/// Used to order custom blocks alongside the base state list the same
/// way the upstream server's block-palette hashing does, so runtime IDs
/// stay stable across otherwise-equivalent StartGame packets.
pub fn fnv1_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash = hash.wrapping_mul(PRIME);
        hash ^= b as u64;
    }
    hash
}

/// A modern-namespace item entry: its network runtime ID, and whether
/// it's a post-1.16.100 component-based item with no legacy equivalent.
#[derive(Debug, Clone, Copy)]
pub struct ModernItem {
    pub runtime_id: i32,
    pub component_based: bool,
}

/// The item name substituted whenever a modern item has no legacy
/// equivalent at all (rather than failing the translation outright).
pub const ITEM_FALLBACK_NAME: &str = "minecraft:name_tag";

/// The block state substituted whenever a modern block state has no
/// legacy equivalent (new-era blocks the 1.12.x client has never heard
/// of). `minecraft:info_update` is the vanilla "I don't know what this
/// is" block and is what the legacy client already falls back to for
/// any runtime ID it can't resolve.
pub const BLOCK_FALLBACK_NAME: &str = "minecraft:info_update";

/// Bridges the legacy and modern Bedrock block/item namespaces.
///
/// Built once at startup from the embedded tables; the block-state
/// portion can be rebuilt per-connection via
/// [`MappingRegistry::adjust_custom_states`] once a StartGame packet's
/// custom block palette is known.
#[derive(Clone)]
pub struct MappingRegistry {
    modern_states: Vec<BlockState>,
    modern_state_to_rid: HashMap<StateHash, u32>,
    modern_fallback_rid: u32,

    legacy_states: Vec<BlockState>,
    legacy_state_to_rid: HashMap<StateHash, u32>,
    legacy_fallback_rid: u32,
    /// The real modern properties each legacy state was derived from,
    /// parallel to `legacy_states` (whose own `properties` field has been
    /// overwritten with `legacy_id`/`legacy_meta`). Needed to re-resolve a
    /// legacy runtime ID back to its modern counterpart after
    /// `adjust_custom_states` has reassigned modern runtime IDs.
    legacy_source_properties: Vec<BTreeMap<String, PropertyValue>>,

    modern_items: HashMap<String, ModernItem>,
    modern_items_by_rid: HashMap<i32, String>,

    legacy_items: HashMap<String, i16>,
    legacy_items_by_id: HashMap<i16, String>,

    block_aliases: HashMap<String, String>,
    block_aliases_updated_to_alias: HashMap<String, String>,
    item_aliases_updated_to_legacy: HashMap<String, String>,
}

impl MappingRegistry {
    /// Build the registry from the embedded tables, with no custom
    /// blocks merged in yet (equivalent to a connection before its
    /// StartGame packet has been seen).
    pub fn new() -> Self {
        let modern_states: Vec<BlockState> = MODERN_BLOCK_STATES
            .iter()
            .map(|s| s.to_block_state())
            .collect();

        let legacy_numeric_id: HashMap<&str, i16> = BLOCK_ID_MAP.iter().copied().collect();

        let block_aliases: HashMap<String, String> = BLOCK_ALIASES
            .iter()
            .map(|(a, u)| ((*a).to_owned(), (*u).to_owned()))
            .collect();
        let block_aliases_updated_to_alias: HashMap<String, String> = block_aliases
            .iter()
            .map(|(a, u)| (u.clone(), a.clone()))
            .collect();

        // The legacy runtime-ID table is derived once, at build time
        // (not per-adjustment): join the base modern state list against
        // its aligned metadata array and the name->legacy-id map, in
        // modern runtime ID order, dropping any state with no legacy ID.
        // `BLOCK_ID_MAP` is keyed by legacy-era names, so a state whose
        // name was renamed going into the modern era needs the rename
        // undone before the lookup, same as `StateToRuntimeID` in the
        // legacy mappings this table mirrors.
        let mut legacy_states = Vec::new();
        let mut legacy_source_properties = Vec::new();
        for (idx, state) in modern_states.iter().enumerate() {
            let legacy_name = block_aliases_updated_to_alias
                .get(state.name.as_str())
                .map(String::as_str)
                .unwrap_or(state.name.as_str());
            let Some(&legacy_id) = legacy_numeric_id.get(legacy_name) else {
                continue;
            };
            let meta = LEGACY_META_BY_MODERN_INDEX[idx];
            let mut legacy_state = state.clone();
            legacy_source_properties.push(state.properties.clone());
            legacy_state.properties = BTreeMap::new();
            legacy_state
                .properties
                .insert("legacy_id".to_owned(), PropertyValue::Int(legacy_id as i32));
            legacy_state
                .properties
                .insert("legacy_meta".to_owned(), PropertyValue::Byte(meta as i8));
            legacy_states.push(legacy_state);
        }

        let modern_items: HashMap<String, ModernItem> = MODERN_ITEMS
            .iter()
            .map(|(name, rid, component_based)| {
                (
                    (*name).to_owned(),
                    ModernItem {
                        runtime_id: *rid,
                        component_based: *component_based,
                    },
                )
            })
            .collect();
        let modern_items_by_rid: HashMap<i32, String> = MODERN_ITEMS
            .iter()
            .map(|(name, rid, _)| (*rid, (*name).to_owned()))
            .collect();

        let legacy_items: HashMap<String, i16> = ITEM_ID_MAP
            .iter()
            .copied()
            .map(|(n, i)| (n.to_owned(), i))
            .collect();
        let legacy_items_by_id: HashMap<i16, String> =
            ITEM_ID_MAP.iter().map(|(n, i)| (*i, (*n).to_owned())).collect();

        let item_aliases_updated_to_legacy: HashMap<String, String> = ITEM_ALIASES
            .iter()
            .map(|(u, l)| ((*u).to_owned(), (*l).to_owned()))
            .collect();

        let mut registry = Self {
            modern_states: Vec::new(),
            modern_state_to_rid: HashMap::new(),
            modern_fallback_rid: 0,
            legacy_states,
            legacy_state_to_rid: HashMap::new(),
            legacy_fallback_rid: 0,
            legacy_source_properties,
            modern_items,
            modern_items_by_rid,
            legacy_items,
            legacy_items_by_id,
            block_aliases,
            block_aliases_updated_to_alias,
            item_aliases_updated_to_legacy,
        };

        registry.rebuild_legacy_index();
        registry.install_modern_states(modern_states);
        registry
    }

    fn rebuild_legacy_index(&mut self) {
        self.legacy_state_to_rid.clear();
        for (rid, state) in self.legacy_states.iter().enumerate() {
            self.legacy_state_to_rid
                .insert(hash_block_state(state), rid as u32);
        }
        self.legacy_fallback_rid = self
            .legacy_states
            .iter()
            .position(|s| s.name == BLOCK_FALLBACK_NAME)
            .map(|i| i as u32)
            .unwrap_or(0);
    }

    fn install_modern_states(&mut self, states: Vec<BlockState>) {
        self.modern_state_to_rid.clear();
        for (rid, state) in states.iter().enumerate() {
            self.modern_state_to_rid
                .insert(hash_block_state(state), rid as u32);
        }
        self.modern_fallback_rid = states
            .iter()
            .position(|s| s.name == BLOCK_FALLBACK_NAME)
            .map(|i| i as u32)
            .unwrap_or(0);
        self.modern_states = states;
    }

    /// Merge a server-advertised custom block palette (from StartGame)
    /// into the base modern state list, then stable-sort the combined
    /// list by `fnv1_64(name)` and reassign runtime IDs from the new
    /// order. Vanilla states are re-sorted alongside the customs because
    /// the upstream server does the same: runtime IDs for a given
    /// connection are a function of the full advertised palette, not
    /// just the vanilla base list.
    pub fn adjust_custom_states(&mut self, custom: Vec<BlockState>) {
        let base: Vec<BlockState> = MODERN_BLOCK_STATES
            .iter()
            .map(|s| s.to_block_state())
            .collect();
        let mut combined = base;
        combined.extend(custom);
        combined.sort_by_key(|s| fnv1_64(s.name.as_bytes()));
        self.install_modern_states(combined);
    }

    // -- Block state lookups --------------------------------------------

    /// The legacy runtime ID for `minecraft:info_update`, i.e. what an
    /// unknown modern block state downgrades to.
    pub fn legacy_fallback_runtime_id(&self) -> u32 {
        self.legacy_fallback_rid
    }

    /// The modern runtime ID an unresolved legacy block upgrades to.
    pub fn modern_fallback_runtime_id(&self) -> u32 {
        self.modern_fallback_rid
    }

    /// Look up a modern runtime ID for a (possibly legacy-shaped) block
    /// state. Runs the name through alias resolution first.
    pub fn state_to_runtime_id_modern(
        &self,
        name: &str,
        properties: &BTreeMap<String, PropertyValue>,
    ) -> u32 {
        let (upgraded_name, _) = self.updated_name_from_alias(name);
        let key = hash_state(&upgraded_name, properties);
        self.modern_state_to_rid
            .get(&key)
            .copied()
            .unwrap_or(self.modern_fallback_rid)
    }

    pub fn runtime_id_to_state_modern(&self, rid: u32) -> Option<&BlockState> {
        self.modern_states.get(rid as usize)
    }

    /// Look up the legacy runtime ID a modern block state downgrades to.
    /// Never fails: unmapped states fall back to `minecraft:info_update`.
    pub fn state_to_runtime_id_legacy(
        &self,
        name: &str,
        properties: &BTreeMap<String, PropertyValue>,
    ) -> u32 {
        let (legacy_name, _) = self.alias_from_updated_name(name);
        let key = hash_state(&legacy_name, properties);
        self.legacy_state_to_rid
            .get(&key)
            .copied()
            .unwrap_or(self.legacy_fallback_rid)
    }

    pub fn runtime_id_to_state_legacy(&self, rid: u32) -> Option<&BlockState> {
        self.legacy_states.get(rid as usize)
    }

    /// Resolve a legacy block runtime ID back to its current modern
    /// runtime ID. Goes through the legacy state's original (pre-fabrication)
    /// properties rather than its `legacy_id`/`legacy_meta` pair, so this
    /// stays correct even after `adjust_custom_states` has reassigned modern
    /// runtime IDs.
    pub fn modern_runtime_id_from_legacy(&self, rid: u32) -> u32 {
        match (
            self.legacy_states.get(rid as usize),
            self.legacy_source_properties.get(rid as usize),
        ) {
            (Some(state), Some(props)) => self.state_to_runtime_id_modern(&state.name, props),
            _ => self.modern_fallback_rid,
        }
    }

    /// Legacy numeric ID + metadata nibble for a legacy runtime ID, as
    /// carried in the 1.12.x wire format's `(id, meta)` pairs.
    pub fn legacy_runtime_id_to_id_meta(&self, rid: u32) -> Option<(i16, u8)> {
        let state = self.legacy_states.get(rid as usize)?;
        let id = match state.properties.get("legacy_id")? {
            PropertyValue::Int(i) => *i as i16,
            _ => return None,
        };
        let meta = match state.properties.get("legacy_meta")? {
            PropertyValue::Byte(b) => *b as u8,
            _ => return None,
        };
        Some((id, meta))
    }

    /// Alias + rename resolution for block names: translates a
    /// possibly-outdated name to its current one. Returns `(name, true)`
    /// if a rewrite happened, `(name, false)` if it was already current.
    /// This implementation covers the single legacy/modern era pair the
    /// proxy bridges; it is not a general cross-version block upgrader.
    pub fn updated_name_from_alias(&self, name: &str) -> (String, bool) {
        match self.block_aliases.get(name) {
            Some(updated) => (updated.clone(), true),
            None => (name.to_owned(), false),
        }
    }

    /// The inverse of [`Self::updated_name_from_alias`]: translates a
    /// current (modern) name back to the legacy-era alias it was renamed
    /// from, if any. Returns `(name, true)` if a rewrite happened,
    /// `(name, false)` if the name has no legacy alias.
    pub fn alias_from_updated_name(&self, name: &str) -> (String, bool) {
        match self.block_aliases_updated_to_alias.get(name) {
            Some(alias) => (alias.clone(), true),
            None => (name.to_owned(), false),
        }
    }

    // -- Item lookups ------------------------------------------------------

    pub fn item_runtime_id_by_name_modern(&self, name: &str) -> Option<ModernItem> {
        self.modern_items.get(name).copied()
    }

    pub fn item_name_by_runtime_id_modern(&self, rid: i32) -> Option<&str> {
        self.modern_items_by_rid.get(&rid).map(String::as_str)
    }

    /// Legacy numeric ID for a modern item name. Items with no legacy
    /// equivalent (component-based, post-1.16.100 items) fall back to
    /// `minecraft:name_tag`'s ID rather than failing translation.
    pub fn item_id_by_name_legacy(&self, modern_name: &str) -> i16 {
        let legacy_name = self
            .item_aliases_updated_to_legacy
            .get(modern_name)
            .map(String::as_str)
            .unwrap_or(modern_name);
        self.legacy_items.get(legacy_name).copied().unwrap_or_else(|| {
            *self
                .legacy_items
                .get(ITEM_FALLBACK_NAME)
                .expect("fallback item name_tag must be present in ITEM_ID_MAP")
        })
    }

    pub fn item_name_by_id_legacy(&self, id: i16) -> Option<&str> {
        self.legacy_items_by_id.get(&id).map(String::as_str)
    }

    /// The legacy block palette as `(name, legacy_meta)` pairs, in legacy
    /// runtime-ID order. Used to build the `blocks` field of a legacy
    /// `StartGame` packet .
    pub fn legacy_block_palette(&self) -> Vec<(String, u8)> {
        self.legacy_states
            .iter()
            .filter_map(|s| {
                let meta = match s.properties.get("legacy_meta")? {
                    PropertyValue::Byte(b) => *b as u8,
                    _ => return None,
                };
                Some((s.name.clone(), meta))
            })
            .collect()
    }

    /// All legacy item names known to the table, for the `items` field of a
    /// legacy `StartGame` packet.
    pub fn legacy_item_names(&self) -> Vec<String> {
        self.legacy_items.keys().cloned().collect()
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_state_roundtrips_for_known_block() {
        let registry = MappingRegistry::new();
        let mut props = BTreeMap::new();
        props.insert(
            "stone_type".to_owned(),
            PropertyValue::String("granite".to_owned()),
        );
        let rid = registry.state_to_runtime_id_modern("minecraft:stone", &props);
        let state = registry.runtime_id_to_state_modern(rid).unwrap();
        assert_eq!(state.name, "minecraft:stone");
    }

    #[test]
    fn unknown_modern_state_falls_back_to_info_update() {
        let registry = MappingRegistry::new();
        let props = BTreeMap::new();
        let rid = registry.state_to_runtime_id_modern("minecraft:totally_unknown_block", &props);
        let state = registry.runtime_id_to_state_modern(rid).unwrap();
        assert_eq!(state.name, BLOCK_FALLBACK_NAME);
    }

    #[test]
    fn legacy_downgrade_skips_states_with_no_legacy_id() {
        let registry = MappingRegistry::new();
        let props = BTreeMap::new();
        // "minecraft:unknown" has a modern state but deliberately no
        // legacy_id entry in BLOCK_ID_MAP.
        let rid = registry.state_to_runtime_id_legacy("minecraft:unknown", &props);
        let state = registry.runtime_id_to_state_legacy(rid).unwrap();
        assert_eq!(state.name, BLOCK_FALLBACK_NAME);
    }

    #[test]
    fn legacy_downgrade_resolves_id_and_metadata() {
        let registry = MappingRegistry::new();
        let mut props = BTreeMap::new();
        props.insert(
            "stone_type".to_owned(),
            PropertyValue::String("granite".to_owned()),
        );
        let rid = registry.state_to_runtime_id_legacy("minecraft:stone", &props);
        let (id, meta) = registry.legacy_runtime_id_to_id_meta(rid).unwrap();
        assert_eq!(id, 1);
        assert_eq!(meta, 1);
    }

    #[test]
    fn legacy_runtime_id_resolves_back_to_modern_after_custom_adjustment() {
        let mut registry = MappingRegistry::new();
        let mut props = BTreeMap::new();
        props.insert(
            "stone_type".to_owned(),
            PropertyValue::String("granite".to_owned()),
        );
        let legacy_rid = registry.state_to_runtime_id_legacy("minecraft:stone", &props);

        // Reassigns every modern runtime ID via the fnv1_64 sort.
        registry.adjust_custom_states(vec![BlockState::new("mymod:custom_ore")]);

        let modern_rid = registry.modern_runtime_id_from_legacy(legacy_rid);
        let state = registry.runtime_id_to_state_modern(modern_rid).unwrap();
        assert_eq!(state.name, "minecraft:stone");
        assert_eq!(
            state.properties.get("stone_type"),
            Some(&PropertyValue::String("granite".to_owned()))
        );
    }

    #[test]
    fn custom_block_adjustment_rebuilds_modern_table_in_hash_order() {
        let mut registry = MappingRegistry::new();
        let custom = BlockState::new("mymod:custom_ore");
        registry.adjust_custom_states(vec![custom]);
        let props = BTreeMap::new();
        let rid = registry.state_to_runtime_id_modern("mymod:custom_ore", &props);
        let state = registry.runtime_id_to_state_modern(rid).unwrap();
        assert_eq!(state.name, "mymod:custom_ore");

        // Runtime IDs are sorted by fnv1_64(name), not insertion order:
        // check the table is actually sorted, not just appended to.
        let mut previous_hash = None;
        for idx in 0..registry.modern_states.len() {
            let state = registry.runtime_id_to_state_modern(idx as u32).unwrap();
            let hash = fnv1_64(state.name.as_bytes());
            if let Some(prev) = previous_hash {
                assert!(prev <= hash, "modern state table is not sorted by fnv1_64(name)");
            }
            previous_hash = Some(hash);
        }
    }

    #[test]
    fn item_alias_resolves_nether_star_to_legacy_netherstar() {
        let registry = MappingRegistry::new();
        let id = registry.item_id_by_name_legacy("minecraft:nether_star");
        assert_eq!(registry.item_name_by_id_legacy(id), Some("minecraft:netherstar"));
    }

    #[test]
    fn item_with_no_legacy_equivalent_falls_back_to_name_tag() {
        let registry = MappingRegistry::new();
        let id = registry.item_id_by_name_legacy("minecraft:crossbow");
        assert_eq!(registry.item_name_by_id_legacy(id), Some("minecraft:name_tag"));
    }

    #[test]
    fn fnv1_64_matches_known_vector() {
        // FNV-1 64-bit of the empty string is the offset basis.
        assert_eq!(fnv1_64(b""), 0xcbf29ce484222325);
    }
}
