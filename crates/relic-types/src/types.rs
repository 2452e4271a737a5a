use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A block position in the world (x, y, z integers). Bedrock has no
/// compact long-packed wire form for this (unlike Java) — positions travel
/// as three separate varints/floats depending on packet — so this stays a
/// plain value type used internally by the chunk and translation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos {
            x: self.x >> 4,
            z: self.z >> 4,
        }
    }
}

/// A chunk column position (x, z).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

/// A double-precision 3D position, used for entity/player positions that
/// the legacy client still expects at `f64` (e.g. internal bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3d {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn chunk_pos(&self) -> ChunkPos {
        ChunkPos {
            x: (self.x.floor() as i32) >> 4,
            z: (self.z.floor() as i32) >> 4,
        }
    }
}

/// A single-precision 3D vector. Every Bedrock movement/position field on
/// the wire (`PlayerAuthInput.Position`, `MoveVector`, `Delta`, StartGame's
/// `PlayerPosition`) is `f32`, not `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A single-precision 2D vector (used for `MoveVector`, yaw/pitch pairs
/// that travel together, and similar wire fields).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2f {
    pub x: f32,
    pub z: f32,
}

impl Vec2f {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

/// A Minecraft resource identifier (e.g., "minecraft:stone").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub namespace: String,
    pub path: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn minecraft(path: impl Into<String>) -> Self {
        Self::new("minecraft", path)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl std::str::FromStr for Identifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((ns, path)) = s.split_once(':') {
            Ok(Self::new(ns, path))
        } else {
            Ok(Self::minecraft(s))
        }
    }
}

/// A player's game profile (UUID + name + properties, e.g. a skin chain).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameProfile {
    pub uuid: Uuid,
    pub name: String,
    pub properties: Vec<ProfileProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileProperty {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

/// Text component for chat/system messages (Bedrock's `Text` packet carries
/// plain strings, not a JSON component tree, but the proxy still needs a
/// typed representation for messages it originates itself).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extra: Vec<TextComponent>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: None,
            italic: None,
            extra: Vec::new(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"text":""}"#.to_string())
    }
}

/// Game mode enum, shared between the legacy `PlayerGameMode` varint and
/// the modern protocol's equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum GameMode {
    Survival = 0,
    Creative = 1,
    Adventure = 2,
    SurvivalSpectator = 3,
    CreativeSpectator = 4,
    Default = 5,
    Spectator = 6,
}

impl GameMode {
    pub fn id(self) -> i32 {
        self as i32
    }
}

/// Which hand an action (block place, item use) was performed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Hand {
    Main = 0,
    Off = 1,
}

/// A single named block property value, as found in a block state's
/// property compound (e.g. `"facing_direction": 2` or `"open_bit": false`).
/// Mirrors the handful of NBT tag types that actually occur in Bedrock
/// block states: bytes (bools are encoded as a byte), ints, and strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Byte(i8),
    Int(i32),
    String(String),
}

/// A block state: a name plus its sorted property map. This is the unit
/// that both the legacy and the modern runtime-ID tables hash and key on —
/// two states with the same name but different properties are different
/// blocks, and property insertion order never matters because callers are
/// expected to build/compare via this type's `BTreeMap`, not a `Vec` of
/// pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    pub name: String,
    pub properties: BTreeMap<String, PropertyValue>,
    /// Packed version the state was authored against (see
    /// `CurrentBlockVersion` in the translation layer). Not part of the
    /// state's identity for hashing purposes — it only matters to the
    /// block-state upgrader that runs before a legacy state is hashed.
    pub version: i32,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            version: 0,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// An item stack as it appears in the legacy (1.12.0) wire protocol:
/// a numeric network ID + metadata/damage value, a count, optional NBT,
/// and the `CanBePlacedOn`/`CanBreak` adventure-mode block name lists.
/// A `network_id` of zero means an empty slot, and no other field is
/// read or written in that case.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemStack {
    pub network_id: i32,
    pub metadata_value: i16,
    pub count: i16,
    pub nbt_data: Option<crate::NbtValue>,
    pub can_be_placed_on: Vec<String>,
    pub can_break: Vec<String>,
}

impl ItemStack {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.network_id == 0
    }
}

/// An item stack as it appears on the modern wire: a runtime ID (resolved
/// against the server's item palette, not a fixed numeric ID) plus a
/// metadata value, a count, and item-component NBT. Distinct type from
/// [`ItemStack`] because the two eras disagree on both the identity field
/// width and the metadata field width, and mixing them up is exactly the
/// kind of bug the translation layer exists to avoid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModernItemStack {
    pub runtime_id: i32,
    pub metadata: u32,
    pub count: i16,
    pub nbt_data: Option<crate::NbtValue>,
    pub can_be_placed_on: Vec<String>,
    pub can_break: Vec<String>,
}

impl ModernItemStack {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.runtime_id == 0
    }
}

/// A player's movement/rotation pose, carried on both `MovePlayer` (legacy)
/// and `PlayerAuthInput` (modern).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Vec3f,
    pub pitch: f32,
    pub yaw: f32,
    pub head_yaw: f32,
}
