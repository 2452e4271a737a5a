//! Modern-era packet shapes: the subset of the upstream server's protocol
//! the translation pipeline touches. In a full deployment these would be
//! decoded by the external modern-protocol library; this crate
//! models just the payload shapes that `ConvertToLatest`/`ConvertFromLatest`
//! read and write, so the rest of the workspace has something concrete to
//! translate against.

use relic_nbt::NbtValue;
use relic_types::{BlockPos, GameMode, ModernItemStack, Pose};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubChunkRequestMode {
    Legacy,
    Limited,
    Limitless,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModernGameRule {
    pub name: String,
    pub value: GameRuleValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameRuleValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModernBlockEntry {
    pub name: String,
    pub properties: NbtValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMode {
    Normal,
    Reset,
    Teleport,
    Rotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbilityLayer {
    pub layer_type: u16,
    pub abilities: u32,
    pub values: u32,
    pub fly_speed: f32,
    pub walk_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Mouse,
    Touch,
    GamePad,
    MotionController,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionModel {
    Touch,
    Crosshair,
    Classic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    Normal,
    Teaser,
    Screen,
    Viewer,
    Reality,
    Placement,
    LivingRoom,
    ExitLevel,
    ExitLevelLivingRoom,
}

/// `PlayerAuthInput.InputData` flags the synthetic-input ticker 
/// sets from the accumulated legacy action latches.
pub mod input_data {
    pub const START_SPRINTING: u64 = 1 << 0;
    pub const STOP_SPRINTING: u64 = 1 << 1;
    pub const START_SNEAKING: u64 = 1 << 2;
    pub const STOP_SNEAKING: u64 = 1 << 3;
    pub const START_SWIMMING: u64 = 1 << 4;
    pub const STOP_SWIMMING: u64 = 1 << 5;
    pub const START_GLIDING: u64 = 1 << 6;
    pub const STOP_GLIDING: u64 = 1 << 7;
    pub const JUMPING: u64 = 1 << 8;
}

/// One sub-chunk entry in a `SubChunk` reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubChunkResult {
    Success { y_index: i8, payload: Vec<u8> },
    NotFound { y_index: i8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalFormCancelReason {
    UserClosed,
    UserBusy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModernSkin {
    pub skin_id: String,
    pub resource_patch_json: String,
    pub skin_data: Vec<u8>,
    pub cape_data: Vec<u8>,
    pub geometry_data: String,
    pub premium: bool,
}

impl ModernSkin {
    /// Pull `geometry.default` out of the skin resource-patch JSON, per
    /// `PlayerSkin`/`PlayerList` rewrite rule. Returns an empty
    /// string (never fails) if the patch is missing or malformed, which
    /// downstream falls back to the default humanoid geometry name.
    pub fn default_geometry_name(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.resource_patch_json)
            .ok()
            .and_then(|v| {
                v.get("geometry")
                    .and_then(|g| g.get("default"))
                    .and_then(|d| d.as_str())
                    .map(str::to_owned)
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_name_extracts_from_patch() {
        let skin = ModernSkin {
            skin_id: "id".into(),
            resource_patch_json: r#"{"geometry":{"default":"geometry.humanoid.custom"}}"#.into(),
            skin_data: Vec::new(),
            cape_data: Vec::new(),
            geometry_data: String::new(),
            premium: false,
        };
        assert_eq!(skin.default_geometry_name(), "geometry.humanoid.custom");
    }

    #[test]
    fn default_geometry_name_falls_back_on_malformed_patch() {
        let skin = ModernSkin {
            skin_id: "id".into(),
            resource_patch_json: "not json".into(),
            skin_data: Vec::new(),
            cape_data: Vec::new(),
            geometry_data: String::new(),
            premium: false,
        };
        assert_eq!(skin.default_geometry_name(), "");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModernPlayerListEntry {
    pub uuid: Uuid,
    pub entity_unique_id: i64,
    pub username: String,
    pub xuid: String,
    pub platform_chat_id: String,
    pub skin: ModernSkin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModernInventoryAction {
    pub source_type: u32,
    pub window_id: u8,
    pub slot: i32,
    pub old_item: Option<ModernItemStack>,
    pub new_item: Option<ModernItemStack>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModernTransactionKind {
    Normal,
    UseItem { block_runtime_id: i32, face: i32 },
    UseItemOnEntity { entity_runtime_id: u64 },
    ReleaseItem,
}

/// The modern-protocol packets the translation pipeline produces or
/// consumes. Real field coverage for `StartGame` mirrors only what the
/// proxy reads or rewrites ; everything else the real packet
/// carries is treated as pass-through payload the proxy never inspects.
#[derive(Debug, Clone)]
pub enum ModernPacket {
    StartGame {
        entity_unique_id: i64,
        entity_runtime_id: u64,
        game_mode: GameMode,
        pose: Pose,
        world_seed: i64,
        dimension: i32,
        generator: i32,
        world_game_mode: GameMode,
        difficulty: i32,
        world_spawn: BlockPos,
        game_rules: Vec<ModernGameRule>,
        custom_blocks: Vec<ModernBlockEntry>,
        education_mode: bool,
        education_features_enabled: bool,
        premium_world_template_id: String,
        level_id: String,
        world_name: String,
        movement_type: relic_protocol_core::PlayerMovementType,
    },
    LevelChunk {
        chunk_x: i32,
        chunk_z: i32,
        sub_chunk_count: u32,
        request_mode: SubChunkRequestMode,
        payload: Vec<u8>,
    },
    SubChunkRequest {
        chunk_x: i32,
        chunk_z: i32,
        offsets: Vec<i8>,
    },
    SubChunk {
        chunk_x: i32,
        chunk_z: i32,
        entries: Vec<SubChunkResult>,
    },
    UpdateBlock {
        position: BlockPos,
        new_block_runtime_id: u32,
        flags: u32,
        layer: u32,
    },
    UpdateBlockSynced {
        position: BlockPos,
        new_block_runtime_id: u32,
        flags: u32,
        layer: u32,
        entity_unique_id: i64,
        transition: u64,
    },
    LevelEvent {
        event_type: i32,
        position: relic_types::Vec3f,
        event_data: i32,
    },
    UpdateAbilities {
        entity_unique_id: i64,
        player_permission: u8,
        command_permission: u8,
        layers: Vec<AbilityLayer>,
    },
    PlayerAuthInput {
        pose: Pose,
        delta: relic_types::Vec3f,
        input_data: u64,
        input_mode: InputMode,
        play_mode: PlayMode,
        interaction_model: InteractionModel,
        tick: u64,
    },
    MovePlayer {
        entity_runtime_id: u64,
        pose: Pose,
        mode: MoveMode,
        on_ground: bool,
    },
    MoveActorAbsolute {
        entity_runtime_id: u64,
        position: relic_types::Vec3f,
        pitch: f32,
        yaw: f32,
        head_yaw: f32,
    },
    MoveActorDelta {
        entity_runtime_id: u64,
        position: relic_types::Vec3f,
    },
    InventoryTransaction {
        kind: ModernTransactionKind,
        actions: Vec<ModernInventoryAction>,
    },
    ModalFormResponse {
        form_id: u32,
        response_data: Option<String>,
        cancel_reason: Option<ModalFormCancelReason>,
    },
    PlayerSkin {
        uuid: Uuid,
        skin: ModernSkin,
    },
    PlayerListAdd {
        entries: Vec<ModernPlayerListEntry>,
    },
    PlayerListRemove {
        uuids: Vec<Uuid>,
    },
    Transfer {
        address: String,
        port: u16,
    },
    Disconnect {
        message: String,
        hide_disconnect_reason: bool,
    },
    Text {
        message: String,
        source_name: String,
        xuid: String,
        platform_chat_id: String,
    },
    Unknown {
        packet_id: u32,
        data: Vec<u8>,
    },
}

// -- Wire encode/decode --------------------------------------------------
//
// A real deployment hands these frames to the upstream protocol library;
// what lives here is a self-contained codec so the orchestrator's pumps
// have something concrete to read/write against without pulling in that
// dependency. Field order and primitive widths follow the same
// conventions as the legacy pool's codec (`relic_protocol_core::codec`) —
// varints for IDs/counts, fixed-width little-endian for floats — reused
// directly since both eras ride the same RakNet-derived wire style.

use bytes::{Buf, BufMut, BytesMut};
use relic_protocol_core::{
    read_block_pos, read_bool, read_f32, read_pose, read_string, read_string_list, read_uuid,
    read_vari32, read_vari64, read_varu32, read_varu64, read_vec3f, write_block_pos, write_bool,
    write_pose, write_string, write_string_list, write_uuid, write_vari32, write_vari64,
    write_varu32, write_varu64, write_vec3f, CodecError, CodecResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ModernPacketId {
    StartGame = 11,
    LevelChunk = 58,
    SubChunkRequest = 172,
    SubChunk = 173,
    UpdateBlock = 21,
    UpdateBlockSynced = 110,
    LevelEvent = 27,
    UpdateAbilities = 187,
    PlayerAuthInput = 144,
    MovePlayer = 19,
    MoveActorAbsolute = 34,
    MoveActorDelta = 111,
    InventoryTransaction = 30,
    ModalFormResponse = 101,
    PlayerSkin = 93,
    PlayerListAdd = 63,
    PlayerListRemove = 64,
    Transfer = 85,
    Disconnect = 5,
    Text = 9,
}

impl ModernPacketId {
    pub fn from_u32(id: u32) -> Option<Self> {
        use ModernPacketId::*;
        Some(match id {
            11 => StartGame,
            58 => LevelChunk,
            172 => SubChunkRequest,
            173 => SubChunk,
            21 => UpdateBlock,
            110 => UpdateBlockSynced,
            27 => LevelEvent,
            187 => UpdateAbilities,
            144 => PlayerAuthInput,
            19 => MovePlayer,
            34 => MoveActorAbsolute,
            111 => MoveActorDelta,
            30 => InventoryTransaction,
            101 => ModalFormResponse,
            93 => PlayerSkin,
            63 => PlayerListAdd,
            64 => PlayerListRemove,
            85 => Transfer,
            5 => Disconnect,
            9 => Text,
            _ => return None,
        })
    }
}

fn move_mode_id(m: MoveMode) -> u8 {
    match m {
        MoveMode::Normal => 0,
        MoveMode::Reset => 1,
        MoveMode::Teleport => 2,
        MoveMode::Rotation => 3,
    }
}

fn move_mode_from_id(id: u8) -> MoveMode {
    match id {
        1 => MoveMode::Reset,
        2 => MoveMode::Teleport,
        3 => MoveMode::Rotation,
        _ => MoveMode::Normal,
    }
}

fn input_mode_id(m: InputMode) -> u8 {
    match m {
        InputMode::Mouse => 0,
        InputMode::Touch => 1,
        InputMode::GamePad => 2,
        InputMode::MotionController => 3,
    }
}

fn input_mode_from_id(id: u8) -> InputMode {
    match id {
        1 => InputMode::Touch,
        2 => InputMode::GamePad,
        3 => InputMode::MotionController,
        _ => InputMode::Mouse,
    }
}

fn interaction_model_id(m: InteractionModel) -> u8 {
    match m {
        InteractionModel::Touch => 0,
        InteractionModel::Crosshair => 1,
        InteractionModel::Classic => 2,
    }
}

fn interaction_model_from_id(id: u8) -> InteractionModel {
    match id {
        1 => InteractionModel::Crosshair,
        2 => InteractionModel::Classic,
        _ => InteractionModel::Touch,
    }
}

fn play_mode_id(m: PlayMode) -> u8 {
    match m {
        PlayMode::Normal => 0,
        PlayMode::Teaser => 1,
        PlayMode::Screen => 2,
        PlayMode::Viewer => 3,
        PlayMode::Reality => 4,
        PlayMode::Placement => 5,
        PlayMode::LivingRoom => 6,
        PlayMode::ExitLevel => 7,
        PlayMode::ExitLevelLivingRoom => 8,
    }
}

fn play_mode_from_id(id: u8) -> PlayMode {
    match id {
        1 => PlayMode::Teaser,
        2 => PlayMode::Screen,
        3 => PlayMode::Viewer,
        4 => PlayMode::Reality,
        5 => PlayMode::Placement,
        6 => PlayMode::LivingRoom,
        7 => PlayMode::ExitLevel,
        8 => PlayMode::ExitLevelLivingRoom,
        _ => PlayMode::Normal,
    }
}

fn request_mode_id(m: SubChunkRequestMode) -> u8 {
    match m {
        SubChunkRequestMode::Legacy => 0,
        SubChunkRequestMode::Limited => 1,
        SubChunkRequestMode::Limitless => 2,
    }
}

fn request_mode_from_id(id: u8) -> SubChunkRequestMode {
    match id {
        1 => SubChunkRequestMode::Limited,
        2 => SubChunkRequestMode::Limitless,
        _ => SubChunkRequestMode::Legacy,
    }
}

fn movement_type_id(t: relic_protocol_core::PlayerMovementType) -> u8 {
    use relic_protocol_core::PlayerMovementType::*;
    match t {
        ClientAuthoritative => 0,
        ServerAuthoritative => 1,
        ServerAuthoritativeWithRewind => 2,
    }
}

fn movement_type_from_id(id: u8) -> relic_protocol_core::PlayerMovementType {
    use relic_protocol_core::PlayerMovementType::*;
    match id {
        1 => ServerAuthoritative,
        2 => ServerAuthoritativeWithRewind,
        _ => ClientAuthoritative,
    }
}

fn game_mode_id(m: GameMode) -> i32 {
    m.id()
}

fn game_mode_from_id(id: i32) -> GameMode {
    match id {
        1 => GameMode::Creative,
        2 => GameMode::Adventure,
        3 => GameMode::SurvivalSpectator,
        4 => GameMode::CreativeSpectator,
        5 => GameMode::Default,
        6 => GameMode::Spectator,
        _ => GameMode::Survival,
    }
}

fn write_modern_item(buf: &mut BytesMut, item: &ModernItemStack) {
    write_vari32(buf, item.runtime_id);
    if item.is_empty() {
        return;
    }
    write_varu32(buf, item.metadata);
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

fn read_modern_item(buf: &mut impl Buf) -> CodecResult<ModernItemStack> {
    let runtime_id = read_vari32(buf)?;
    if runtime_id == 0 {
        return Ok(ModernItemStack::empty());
    }
    let metadata = read_varu32(buf)?;
    let count = read_vari32(buf)? as i16;
    let nbt_data = if read_bool(buf)? {
        Some(
            NbtValue::read_root(buf, relic_nbt::Encoding::NetworkLittleEndian)
                .map_err(|_| CodecError::NotEnoughData)?,
        )
    } else {
        None
    };
    let can_be_placed_on = read_string_list(buf)?;
    let can_break = read_string_list(buf)?;
    Ok(ModernItemStack {
        runtime_id,
        metadata,
        count,
        nbt_data,
        can_be_placed_on,
        can_break,
    })
}

fn write_game_rule(buf: &mut BytesMut, rule: &ModernGameRule) {
    write_string(buf, &rule.name);
    match rule.value {
        GameRuleValue::Bool(v) => {
            buf.put_u8(0);
            write_bool(buf, v);
        }
        GameRuleValue::Int(v) => {
            buf.put_u8(1);
            write_vari32(buf, v);
        }
        GameRuleValue::Float(v) => {
            buf.put_u8(2);
            buf.put_f32_le(v);
        }
    }
}

fn read_game_rule(buf: &mut impl Buf) -> CodecResult<ModernGameRule> {
    let name = read_string(buf)?;
    let tag = {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        buf.get_u8()
    };
    let value = match tag {
        0 => GameRuleValue::Bool(read_bool(buf)?),
        1 => GameRuleValue::Int(read_vari32(buf)?),
        _ => GameRuleValue::Float(read_f32(buf)?),
    };
    Ok(ModernGameRule { name, value })
}

fn write_block_entry(buf: &mut BytesMut, entry: &ModernBlockEntry) {
    write_string(buf, &entry.name);
    entry
        .properties
        .write_root(buf, relic_nbt::Encoding::NetworkLittleEndian);
}

fn read_block_entry(buf: &mut impl Buf) -> CodecResult<ModernBlockEntry> {
    let name = read_string(buf)?;
    let properties = NbtValue::read_root(buf, relic_nbt::Encoding::NetworkLittleEndian)
        .map_err(|_| CodecError::NotEnoughData)?;
    Ok(ModernBlockEntry { name, properties })
}

fn write_ability_layer(buf: &mut BytesMut, layer: &AbilityLayer) {
    buf.put_u16_le(layer.layer_type);
    buf.put_u32_le(layer.abilities);
    buf.put_u32_le(layer.values);
    buf.put_f32_le(layer.fly_speed);
    buf.put_f32_le(layer.walk_speed);
}

fn read_ability_layer(buf: &mut impl Buf) -> CodecResult<AbilityLayer> {
    if buf.remaining() < 16 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(AbilityLayer {
        layer_type: buf.get_u16_le(),
        abilities: buf.get_u32_le(),
        values: buf.get_u32_le(),
        fly_speed: buf.get_f32_le(),
        walk_speed: buf.get_f32_le(),
    })
}

fn write_modern_skin(buf: &mut BytesMut, skin: &ModernSkin) {
    write_string(buf, &skin.skin_id);
    write_string(buf, &skin.resource_patch_json);
    write_varu32(buf, skin.skin_data.len() as u32);
    buf.put_slice(&skin.skin_data);
    write_varu32(buf, skin.cape_data.len() as u32);
    buf.put_slice(&skin.cape_data);
    write_string(buf, &skin.geometry_data);
    write_bool(buf, skin.premium);
}

fn read_modern_skin(buf: &mut impl Buf) -> CodecResult<ModernSkin> {
    let skin_id = read_string(buf)?;
    let resource_patch_json = read_string(buf)?;
    let skin_len = read_varu32(buf)? as usize;
    if buf.remaining() < skin_len {
        return Err(CodecError::NotEnoughData);
    }
    let mut skin_data = vec![0u8; skin_len];
    buf.copy_to_slice(&mut skin_data);
    let cape_len = read_varu32(buf)? as usize;
    if buf.remaining() < cape_len {
        return Err(CodecError::NotEnoughData);
    }
    let mut cape_data = vec![0u8; cape_len];
    buf.copy_to_slice(&mut cape_data);
    let geometry_data = read_string(buf)?;
    let premium = read_bool(buf)?;
    Ok(ModernSkin {
        skin_id,
        resource_patch_json,
        skin_data,
        cape_data,
        geometry_data,
        premium,
    })
}

fn write_inventory_action(buf: &mut BytesMut, action: &ModernInventoryAction) {
    write_varu32(buf, action.source_type);
    buf.put_u8(action.window_id);
    write_vari32(buf, action.slot);
    let empty = ModernItemStack::empty();
    write_modern_item(buf, action.old_item.as_ref().unwrap_or(&empty));
    write_modern_item(buf, action.new_item.as_ref().unwrap_or(&empty));
}

fn read_inventory_action(buf: &mut impl Buf) -> CodecResult<ModernInventoryAction> {
    let source_type = read_varu32(buf)?;
    let window_id = {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        buf.get_u8()
    };
    let slot = read_vari32(buf)?;
    let old = read_modern_item(buf)?;
    let new = read_modern_item(buf)?;
    Ok(ModernInventoryAction {
        source_type,
        window_id,
        slot,
        old_item: if old.is_empty() { None } else { Some(old) },
        new_item: if new.is_empty() { None } else { Some(new) },
    })
}

impl ModernPacket {
    pub fn id(&self) -> u32 {
        use ModernPacket::*;
        match self {
            StartGame { .. } => ModernPacketId::StartGame as u32,
            LevelChunk { .. } => ModernPacketId::LevelChunk as u32,
            SubChunkRequest { .. } => ModernPacketId::SubChunkRequest as u32,
            SubChunk { .. } => ModernPacketId::SubChunk as u32,
            UpdateBlock { .. } => ModernPacketId::UpdateBlock as u32,
            UpdateBlockSynced { .. } => ModernPacketId::UpdateBlockSynced as u32,
            LevelEvent { .. } => ModernPacketId::LevelEvent as u32,
            UpdateAbilities { .. } => ModernPacketId::UpdateAbilities as u32,
            PlayerAuthInput { .. } => ModernPacketId::PlayerAuthInput as u32,
            MovePlayer { .. } => ModernPacketId::MovePlayer as u32,
            MoveActorAbsolute { .. } => ModernPacketId::MoveActorAbsolute as u32,
            MoveActorDelta { .. } => ModernPacketId::MoveActorDelta as u32,
            InventoryTransaction { .. } => ModernPacketId::InventoryTransaction as u32,
            ModalFormResponse { .. } => ModernPacketId::ModalFormResponse as u32,
            PlayerSkin { .. } => ModernPacketId::PlayerSkin as u32,
            PlayerListAdd { .. } => ModernPacketId::PlayerListAdd as u32,
            PlayerListRemove { .. } => ModernPacketId::PlayerListRemove as u32,
            Transfer { .. } => ModernPacketId::Transfer as u32,
            Disconnect { .. } => ModernPacketId::Disconnect as u32,
            Text { .. } => ModernPacketId::Text as u32,
            Unknown { packet_id, .. } => *packet_id,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        use ModernPacket::*;
        match self {
            StartGame {
                entity_unique_id,
                entity_runtime_id,
                game_mode,
                pose,
                world_seed,
                dimension,
                generator,
                world_game_mode,
                difficulty,
                world_spawn,
                game_rules,
                custom_blocks,
                education_mode,
                education_features_enabled,
                premium_world_template_id,
                level_id,
                world_name,
                movement_type,
            } => {
                write_vari64(buf, *entity_unique_id);
                write_varu64(buf, *entity_runtime_id);
                write_vari32(buf, game_mode_id(*game_mode));
                write_pose(buf, *pose);
                write_vari64(buf, *world_seed);
                write_vari32(buf, *dimension);
                write_vari32(buf, *generator);
                write_vari32(buf, game_mode_id(*world_game_mode));
                write_vari32(buf, *difficulty);
                write_block_pos(buf, *world_spawn);
                write_varu32(buf, game_rules.len() as u32);
                for rule in game_rules {
                    write_game_rule(buf, rule);
                }
                write_varu32(buf, custom_blocks.len() as u32);
                for entry in custom_blocks {
                    write_block_entry(buf, entry);
                }
                write_bool(buf, *education_mode);
                write_bool(buf, *education_features_enabled);
                write_string(buf, premium_world_template_id);
                write_string(buf, level_id);
                write_string(buf, world_name);
                buf.put_u8(movement_type_id(*movement_type));
            }
            LevelChunk {
                chunk_x,
                chunk_z,
                sub_chunk_count,
                request_mode,
                payload,
            } => {
                write_vari32(buf, *chunk_x);
                write_vari32(buf, *chunk_z);
                write_varu32(buf, *sub_chunk_count);
                buf.put_u8(request_mode_id(*request_mode));
                write_varu32(buf, payload.len() as u32);
                buf.put_slice(payload);
            }
            SubChunkRequest {
                chunk_x,
                chunk_z,
                offsets,
            } => {
                write_vari32(buf, *chunk_x);
                write_vari32(buf, *chunk_z);
                write_varu32(buf, offsets.len() as u32);
                for o in offsets {
                    buf.put_i8(*o);
                }
            }
            SubChunk {
                chunk_x,
                chunk_z,
                entries,
            } => {
                write_vari32(buf, *chunk_x);
                write_vari32(buf, *chunk_z);
                write_varu32(buf, entries.len() as u32);
                for entry in entries {
                    match entry {
                        SubChunkResult::Success { y_index, payload } => {
                            buf.put_u8(1);
                            buf.put_i8(*y_index);
                            write_varu32(buf, payload.len() as u32);
                            buf.put_slice(payload);
                        }
                        SubChunkResult::NotFound { y_index } => {
                            buf.put_u8(0);
                            buf.put_i8(*y_index);
                        }
                    }
                }
            }
            UpdateBlock {
                position,
                new_block_runtime_id,
                flags,
                layer,
            } => {
                write_block_pos(buf, *position);
                write_varu32(buf, *new_block_runtime_id);
                write_varu32(buf, *flags);
                write_varu32(buf, *layer);
            }
            UpdateBlockSynced {
                position,
                new_block_runtime_id,
                flags,
                layer,
                entity_unique_id,
                transition,
            } => {
                write_block_pos(buf, *position);
                write_varu32(buf, *new_block_runtime_id);
                write_varu32(buf, *flags);
                write_varu32(buf, *layer);
                write_vari64(buf, *entity_unique_id);
                write_varu64(buf, *transition);
            }
            LevelEvent {
                event_type,
                position,
                event_data,
            } => {
                write_vari32(buf, *event_type);
                write_vec3f(buf, *position);
                write_vari32(buf, *event_data);
            }
            UpdateAbilities {
                entity_unique_id,
                player_permission,
                command_permission,
                layers,
            } => {
                write_vari64(buf, *entity_unique_id);
                buf.put_u8(*player_permission);
                buf.put_u8(*command_permission);
                write_varu32(buf, layers.len() as u32);
                for layer in layers {
                    write_ability_layer(buf, layer);
                }
            }
            PlayerAuthInput {
                pose,
                delta,
                input_data,
                input_mode,
                play_mode,
                interaction_model,
                tick,
            } => {
                write_pose(buf, *pose);
                write_vec3f(buf, *delta);
                buf.put_u64_le(*input_data);
                buf.put_u8(input_mode_id(*input_mode));
                buf.put_u8(play_mode_id(*play_mode));
                buf.put_u8(interaction_model_id(*interaction_model));
                write_varu64(buf, *tick);
            }
            MovePlayer {
                entity_runtime_id,
                pose,
                mode,
                on_ground,
            } => {
                write_varu64(buf, *entity_runtime_id);
                write_pose(buf, *pose);
                buf.put_u8(move_mode_id(*mode));
                write_bool(buf, *on_ground);
            }
            MoveActorAbsolute {
                entity_runtime_id,
                position,
                pitch,
                yaw,
                head_yaw,
            } => {
                write_varu64(buf, *entity_runtime_id);
                write_vec3f(buf, *position);
                buf.put_f32_le(*pitch);
                buf.put_f32_le(*yaw);
                buf.put_f32_le(*head_yaw);
            }
            MoveActorDelta {
                entity_runtime_id,
                position,
            } => {
                write_varu64(buf, *entity_runtime_id);
                write_vec3f(buf, *position);
            }
            InventoryTransaction { kind, actions } => {
                match kind {
                    ModernTransactionKind::Normal => buf.put_u8(0),
                    ModernTransactionKind::UseItem {
                        block_runtime_id,
                        face,
                    } => {
                        buf.put_u8(1);
                        write_vari32(buf, *block_runtime_id);
                        write_vari32(buf, *face);
                    }
                    ModernTransactionKind::UseItemOnEntity { entity_runtime_id } => {
                        buf.put_u8(2);
                        write_varu64(buf, *entity_runtime_id);
                    }
                    ModernTransactionKind::ReleaseItem => buf.put_u8(3),
                }
                write_varu32(buf, actions.len() as u32);
                for action in actions {
                    write_inventory_action(buf, action);
                }
            }
            ModalFormResponse {
                form_id,
                response_data,
                cancel_reason,
            } => {
                write_varu32(buf, *form_id);
                match response_data {
                    Some(s) => {
                        write_bool(buf, true);
                        write_string(buf, s);
                    }
                    None => write_bool(buf, false),
                }
                match cancel_reason {
                    Some(ModalFormCancelReason::UserClosed) => buf.put_u8(1),
                    Some(ModalFormCancelReason::UserBusy) => buf.put_u8(2),
                    None => buf.put_u8(0),
                }
            }
            PlayerSkin { uuid, skin } => {
                write_uuid(buf, uuid);
                write_modern_skin(buf, skin);
            }
            PlayerListAdd { entries } => {
                write_varu32(buf, entries.len() as u32);
                for e in entries {
                    write_uuid(buf, &e.uuid);
                    write_vari64(buf, e.entity_unique_id);
                    write_string(buf, &e.username);
                    write_string(buf, &e.xuid);
                    write_string(buf, &e.platform_chat_id);
                    write_modern_skin(buf, &e.skin);
                }
            }
            PlayerListRemove { uuids } => {
                write_varu32(buf, uuids.len() as u32);
                for id in uuids {
                    write_uuid(buf, id);
                }
            }
            Transfer { address, port } => {
                write_string(buf, address);
                buf.put_u16_le(*port);
            }
            Disconnect {
                message,
                hide_disconnect_reason,
            } => {
                write_bool(buf, *hide_disconnect_reason);
                write_string(buf, message);
            }
            Text {
                message,
                source_name,
                xuid,
                platform_chat_id,
            } => {
                write_string(buf, message);
                write_string(buf, source_name);
                write_string(buf, xuid);
                write_string(buf, platform_chat_id);
            }
            Unknown { data, .. } => buf.put_slice(data),
        }
    }

    pub fn decode(id: ModernPacketId, buf: &mut impl Buf) -> CodecResult<ModernPacket> {
        use ModernPacketId as Id;
        Ok(match id {
            Id::StartGame => {
                let entity_unique_id = read_vari64(buf)?;
                let entity_runtime_id = read_varu64(buf)?;
                let game_mode = game_mode_from_id(read_vari32(buf)?);
                let pose = read_pose(buf)?;
                let world_seed = read_vari64(buf)?;
                let dimension = read_vari32(buf)?;
                let generator = read_vari32(buf)?;
                let world_game_mode = game_mode_from_id(read_vari32(buf)?);
                let difficulty = read_vari32(buf)?;
                let world_spawn = read_block_pos(buf)?;
                let rule_count = read_varu32(buf)? as usize;
                let mut game_rules = Vec::with_capacity(rule_count);
                for _ in 0..rule_count {
                    game_rules.push(read_game_rule(buf)?);
                }
                let block_count = read_varu32(buf)? as usize;
                let mut custom_blocks = Vec::with_capacity(block_count);
                for _ in 0..block_count {
                    custom_blocks.push(read_block_entry(buf)?);
                }
                let education_mode = read_bool(buf)?;
                let education_features_enabled = read_bool(buf)?;
                let premium_world_template_id = read_string(buf)?;
                let level_id = read_string(buf)?;
                let world_name = read_string(buf)?;
                let movement_type = movement_type_from_id({
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                });
                ModernPacket::StartGame {
                    entity_unique_id,
                    entity_runtime_id,
                    game_mode,
                    pose,
                    world_seed,
                    dimension,
                    generator,
                    world_game_mode,
                    difficulty,
                    world_spawn,
                    game_rules,
                    custom_blocks,
                    education_mode,
                    education_features_enabled,
                    premium_world_template_id,
                    level_id,
                    world_name,
                    movement_type,
                }
            }
            Id::LevelChunk => {
                let chunk_x = read_vari32(buf)?;
                let chunk_z = read_vari32(buf)?;
                let sub_chunk_count = read_varu32(buf)?;
                let request_mode = request_mode_from_id({
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                });
                let len = read_varu32(buf)? as usize;
                if buf.remaining() < len {
                    return Err(CodecError::NotEnoughData);
                }
                let mut payload = vec![0u8; len];
                buf.copy_to_slice(&mut payload);
                ModernPacket::LevelChunk {
                    chunk_x,
                    chunk_z,
                    sub_chunk_count,
                    request_mode,
                    payload,
                }
            }
            Id::SubChunkRequest => {
                let chunk_x = read_vari32(buf)?;
                let chunk_z = read_vari32(buf)?;
                let count = read_varu32(buf)? as usize;
                let mut offsets = Vec::with_capacity(count);
                for _ in 0..count {
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    offsets.push(buf.get_i8());
                }
                ModernPacket::SubChunkRequest {
                    chunk_x,
                    chunk_z,
                    offsets,
                }
            }
            Id::SubChunk => {
                let chunk_x = read_vari32(buf)?;
                let chunk_z = read_vari32(buf)?;
                let count = read_varu32(buf)? as usize;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    let tag = {
                        if !buf.has_remaining() {
                            return Err(CodecError::NotEnoughData);
                        }
                        buf.get_u8()
                    };
                    let y_index = {
                        if !buf.has_remaining() {
                            return Err(CodecError::NotEnoughData);
                        }
                        buf.get_i8()
                    };
                    entries.push(if tag == 1 {
                        let len = read_varu32(buf)? as usize;
                        if buf.remaining() < len {
                            return Err(CodecError::NotEnoughData);
                        }
                        let mut payload = vec![0u8; len];
                        buf.copy_to_slice(&mut payload);
                        SubChunkResult::Success { y_index, payload }
                    } else {
                        SubChunkResult::NotFound { y_index }
                    });
                }
                ModernPacket::SubChunk {
                    chunk_x,
                    chunk_z,
                    entries,
                }
            }
            Id::UpdateBlock => ModernPacket::UpdateBlock {
                position: read_block_pos(buf)?,
                new_block_runtime_id: read_varu32(buf)?,
                flags: read_varu32(buf)?,
                layer: read_varu32(buf)?,
            },
            Id::UpdateBlockSynced => ModernPacket::UpdateBlockSynced {
                position: read_block_pos(buf)?,
                new_block_runtime_id: read_varu32(buf)?,
                flags: read_varu32(buf)?,
                layer: read_varu32(buf)?,
                entity_unique_id: read_vari64(buf)?,
                transition: read_varu64(buf)?,
            },
            Id::LevelEvent => ModernPacket::LevelEvent {
                event_type: read_vari32(buf)?,
                position: read_vec3f(buf)?,
                event_data: read_vari32(buf)?,
            },
            Id::UpdateAbilities => {
                let entity_unique_id = read_vari64(buf)?;
                let player_permission = {
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                };
                let command_permission = {
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                };
                let count = read_varu32(buf)? as usize;
                let mut layers = Vec::with_capacity(count);
                for _ in 0..count {
                    layers.push(read_ability_layer(buf)?);
                }
                ModernPacket::UpdateAbilities {
                    entity_unique_id,
                    player_permission,
                    command_permission,
                    layers,
                }
            }
            Id::PlayerAuthInput => {
                let pose = read_pose(buf)?;
                let delta = read_vec3f(buf)?;
                if buf.remaining() < 8 {
                    return Err(CodecError::NotEnoughData);
                }
                let input_data = buf.get_u64_le();
                let input_mode = input_mode_from_id({
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                });
                let play_mode = play_mode_from_id({
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                });
                let interaction_model = interaction_model_from_id({
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                });
                let tick = read_varu64(buf)?;
                ModernPacket::PlayerAuthInput {
                    pose,
                    delta,
                    input_data,
                    input_mode,
                    play_mode,
                    interaction_model,
                    tick,
                }
            }
            Id::MovePlayer => ModernPacket::MovePlayer {
                entity_runtime_id: read_varu64(buf)?,
                pose: read_pose(buf)?,
                mode: move_mode_from_id({
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                }),
                on_ground: read_bool(buf)?,
            },
            Id::MoveActorAbsolute => ModernPacket::MoveActorAbsolute {
                entity_runtime_id: read_varu64(buf)?,
                position: read_vec3f(buf)?,
                pitch: read_f32(buf)?,
                yaw: read_f32(buf)?,
                head_yaw: read_f32(buf)?,
            },
            Id::MoveActorDelta => ModernPacket::MoveActorDelta {
                entity_runtime_id: read_varu64(buf)?,
                position: read_vec3f(buf)?,
            },
            Id::InventoryTransaction => {
                let kind = {
                    let tag = {
                        if !buf.has_remaining() {
                            return Err(CodecError::NotEnoughData);
                        }
                        buf.get_u8()
                    };
                    match tag {
                        1 => ModernTransactionKind::UseItem {
                            block_runtime_id: read_vari32(buf)?,
                            face: read_vari32(buf)?,
                        },
                        2 => ModernTransactionKind::UseItemOnEntity {
                            entity_runtime_id: read_varu64(buf)?,
                        },
                        3 => ModernTransactionKind::ReleaseItem,
                        _ => ModernTransactionKind::Normal,
                    }
                };
                let count = read_varu32(buf)? as usize;
                let mut actions = Vec::with_capacity(count);
                for _ in 0..count {
                    actions.push(read_inventory_action(buf)?);
                }
                ModernPacket::InventoryTransaction { kind, actions }
            }
            Id::ModalFormResponse => {
                let form_id = read_varu32(buf)?;
                let response_data = if read_bool(buf)? {
                    Some(read_string(buf)?)
                } else {
                    None
                };
                let cancel_reason = match {
                    if !buf.has_remaining() {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u8()
                } {
                    1 => Some(ModalFormCancelReason::UserClosed),
                    2 => Some(ModalFormCancelReason::UserBusy),
                    _ => None,
                };
                ModernPacket::ModalFormResponse {
                    form_id,
                    response_data,
                    cancel_reason,
                }
            }
            Id::PlayerSkin => ModernPacket::PlayerSkin {
                uuid: read_uuid(buf)?,
                skin: read_modern_skin(buf)?,
            },
            Id::PlayerListAdd => {
                let count = read_varu32(buf)? as usize;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    entries.push(ModernPlayerListEntry {
                        uuid: read_uuid(buf)?,
                        entity_unique_id: read_vari64(buf)?,
                        username: read_string(buf)?,
                        xuid: read_string(buf)?,
                        platform_chat_id: read_string(buf)?,
                        skin: read_modern_skin(buf)?,
                    });
                }
                ModernPacket::PlayerListAdd { entries }
            }
            Id::PlayerListRemove => {
                let count = read_varu32(buf)? as usize;
                let mut uuids = Vec::with_capacity(count);
                for _ in 0..count {
                    uuids.push(read_uuid(buf)?);
                }
                ModernPacket::PlayerListRemove { uuids }
            }
            Id::Transfer => ModernPacket::Transfer {
                address: read_string(buf)?,
                port: {
                    if buf.remaining() < 2 {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u16_le()
                },
            },
            Id::Disconnect => ModernPacket::Disconnect {
                hide_disconnect_reason: read_bool(buf)?,
                message: read_string(buf)?,
            },
            Id::Text => ModernPacket::Text {
                message: read_string(buf)?,
                source_name: read_string(buf)?,
                xuid: read_string(buf)?,
                platform_chat_id: read_string(buf)?,
            },
        })
    }
}

#[cfg(test)]
mod wire_tests {
    use super::*;

    fn roundtrip(pkt: ModernPacket) {
        let id = ModernPacketId::from_u32(pkt.id()).expect("known id");
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        let mut reader = buf.freeze();
        let decoded = ModernPacket::decode(id, &mut reader).expect("decode");
        assert_eq!(format!("{decoded:?}"), format!("{pkt:?}"));
    }

    #[test]
    fn move_player_roundtrip() {
        roundtrip(ModernPacket::MovePlayer {
            entity_runtime_id: 1,
            pose: Pose::default(),
            mode: MoveMode::Normal,
            on_ground: true,
        });
    }

    #[test]
    fn player_auth_input_roundtrip() {
        roundtrip(ModernPacket::PlayerAuthInput {
            pose: Pose {
                position: relic_types::Vec3f::new(1.0, 64.0, 2.0),
                pitch: 10.0,
                yaw: 90.0,
                head_yaw: 90.0,
            },
            delta: relic_types::Vec3f::new(1.0, 64.0, 2.0),
            input_data: input_data::START_SPRINTING | input_data::JUMPING,
            input_mode: InputMode::Mouse,
            play_mode: PlayMode::Normal,
            interaction_model: InteractionModel::Crosshair,
            tick: 0,
        });
    }

    #[test]
    fn transfer_roundtrip() {
        roundtrip(ModernPacket::Transfer {
            address: "127.0.0.1".into(),
            port: 19132,
        });
    }

    #[test]
    fn update_abilities_roundtrip() {
        roundtrip(ModernPacket::UpdateAbilities {
            entity_unique_id: 1,
            player_permission: 1,
            command_permission: 0,
            layers: vec![AbilityLayer {
                layer_type: 1,
                abilities: 0,
                values: 0b11,
                fly_speed: 0.05,
                walk_speed: 0.1,
            }],
        });
    }
}
