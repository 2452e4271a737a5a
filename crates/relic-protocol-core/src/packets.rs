//! Legacy-era (1.12.x / 1.16.100) packet definitions: the packet pool's
//! payload types. Each variant here is what the pool decodes a wire frame
//! into and what the translation pipeline (in the proxy crate) rewrites
//! to or from.

use relic_nbt::NbtValue;
use relic_types::{BlockPos, GameMode, ItemStack, Pose};
use uuid::Uuid;

/// Legacy packet IDs this pool knows how to construct an empty value for.
/// Not exhaustive of the real game's ID space — only the packets the
/// translation pipeline actually touches plus the handful needed to stand
/// a connection up (login/handshake/resource packs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum LegacyPacketId {
    Login = 1,
    PlayStatus = 2,
    ResourcePacksInfo = 6,
    ResourcePackStack = 7,
    ResourcePackClientResponse = 8,
    Text = 9,
    StartGame = 11,
    MovePlayer = 19,
    UpdateBlock = 21,
    PlayerAction = 25,
    LevelEvent = 27,
    LevelChunk = 58,
    UpdateBlockSynced = 110,
    InventoryTransaction = 30,
    PlayerSkin = 93,
    AdventureSettings = 55,
    PlayerList = 63,
    ModalFormRequest = 100,
    ModalFormResponse = 101,
    Transfer = 85,
    Disconnect = 5,
}

impl LegacyPacketId {
    pub fn from_u32(id: u32) -> Option<Self> {
        use LegacyPacketId::*;
        Some(match id {
            1 => Login,
            2 => PlayStatus,
            6 => ResourcePacksInfo,
            7 => ResourcePackStack,
            8 => ResourcePackClientResponse,
            9 => Text,
            11 => StartGame,
            19 => MovePlayer,
            21 => UpdateBlock,
            25 => PlayerAction,
            27 => LevelEvent,
            58 => LevelChunk,
            30 => InventoryTransaction,
            55 => AdventureSettings,
            63 => PlayerList,
            85 => Transfer,
            93 => PlayerSkin,
            100 => ModalFormRequest,
            101 => ModalFormResponse,
            110 => UpdateBlockSynced,
            5 => Disconnect,
            _ => return None,
        })
    }
}

/// A game rule as carried in legacy `StartGame` (flattened name → value map,
/// `StartGame` rewrite rule).
#[derive(Debug, Clone, PartialEq)]
pub enum GameRuleValue {
    Bool(bool),
    Int(i32),
    Float(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameRule {
    pub name: String,
    pub value: GameRuleValue,
}

/// One entry of `StartGame`'s block palette: a block name and the legacy
/// 0-15 data value it was assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyBlockEntry {
    pub name: String,
    pub data: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerActionType {
    StartBreak,
    AbortBreak,
    StopBreak,
    StartSneak,
    StopSneak,
    StartSprint,
    StopSprint,
    StartSwim,
    StopSwim,
    StartGlide,
    StopGlide,
    Jump,
    Respawn,
    Other(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovePlayerMode {
    Normal,
    Reset,
    Teleport,
    Pitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventorySourceType {
    Container,
    World,
    Creative,
    TODO,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InventoryAction {
    pub source_type: InventorySourceType,
    pub window_id: u8,
    pub slot: i32,
    pub old_item: Option<ItemStack>,
    pub new_item: Option<ItemStack>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryTransactionKind {
    Normal,
    UseItem { block_runtime_id: i32, face: i32 },
    UseItemOnEntity { entity_runtime_id: u64 },
    ReleaseItem,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerListEntry {
    pub uuid: Uuid,
    pub entity_unique_id: i64,
    pub username: String,
    pub xuid: String,
    pub platform_chat_id: String,
    pub skin: LegacySkin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacySkin {
    pub skin_id: String,
    pub skin_data: Vec<u8>,
    pub skin_image_width: u32,
    pub skin_image_height: u32,
    pub cape_data: Vec<u8>,
    pub geometry_name: String,
    pub geometry_data: String,
    pub premium: bool,
}

impl LegacySkin {
    /// `SkinImageWidth`/`Height` are inferred from the pixel buffer length
    /// step 1: `{32x64, 64x64, 128x128}` by `len / 4` (RGBA bytes).
    pub fn infer_dimensions_from_data(len: usize) -> (u32, u32) {
        match len / 4 {
            n if n == 32 * 64 => (32, 64),
            n if n == 64 * 64 => (64, 64),
            n if n == 128 * 128 => (128, 128),
            _ => (64, 64),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalFormCancelReason {
    UserClosed,
    UserBusy,
}

/// The legacy translation of a single packet ID into its structured form.
/// Every variant here is the *legacy wire shape*; the modern shape for the
/// same logical packet lives in `relic-protocol-modern`.
#[derive(Debug, Clone)]
pub enum LegacyPacket {
    Login {
        protocol_version: i32,
        connection_request: Vec<u8>,
    },
    PlayStatus {
        status: i32,
    },
    ResourcePacksInfo {
        must_accept: bool,
        pack_urls: Vec<String>,
    },
    ResourcePackStack {
        must_accept: bool,
    },
    ResourcePackClientResponse {
        response: u8,
        pack_ids: Vec<String>,
    },
    Text {
        message: String,
        source_name: String,
        xuid: String,
        platform_chat_id: String,
    },
    StartGame {
        entity_unique_id: i64,
        entity_runtime_id: u64,
        game_mode: GameMode,
        position: relic_types::Vec3f,
        pitch: f32,
        yaw: f32,
        world_seed: i64,
        dimension: i32,
        generator: i32,
        world_game_mode: GameMode,
        difficulty: i32,
        world_spawn: BlockPos,
        achievements_disabled: bool,
        day_cycle_stop_time: i32,
        education_mode: bool,
        education_features_enabled: bool,
        rain_level: f32,
        lightning_level: f32,
        multiplayer_game: bool,
        broadcast_to_lan: bool,
        commands_enabled: bool,
        texture_packs_required: bool,
        game_rules: Vec<GameRule>,
        premium_world_template_id: String,
        level_id: String,
        world_name: String,
        blocks: Vec<LegacyBlockEntry>,
        items: Vec<String>,
    },
    MovePlayer {
        entity_runtime_id: u64,
        pose: Pose,
        mode: MovePlayerMode,
        on_ground: bool,
        riding_runtime_id: u64,
        tick: u64,
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
    PlayerAction {
        entity_runtime_id: u64,
        action: PlayerActionType,
        position: BlockPos,
        face: i32,
    },
    LevelEvent {
        event_type: i32,
        position: relic_types::Vec3f,
        event_data: i32,
    },
    /// A fully-encoded legacy chunk column ("Legacy chunk wire format"):
    /// sub-chunks, the 256-byte biome map, the trailing zero byte, and any
    /// block-entity NBT, already concatenated by `relic_world::encode_legacy_chunk`.
    LevelChunk {
        chunk_x: i32,
        chunk_z: i32,
        sub_chunk_count: u32,
        data: Vec<u8>,
    },
    InventoryTransaction {
        kind: InventoryTransactionKind,
        actions: Vec<InventoryAction>,
    },
    PlayerSkin {
        uuid: Uuid,
        skin: LegacySkin,
    },
    AdventureSettings {
        flags: u32,
        command_permission: i32,
        action_permissions: u32,
        player_permission: i32,
        custom_flags: u32,
        entity_unique_id: i64,
    },
    PlayerList {
        add: bool,
        entries: Vec<PlayerListEntry>,
    },
    ModalFormRequest {
        form_id: u32,
        form_data: String,
    },
    ModalFormResponse {
        form_id: u32,
        response_data: Option<String>,
        cancel_reason: Option<ModalFormCancelReason>,
    },
    Transfer {
        address: String,
        port: u16,
    },
    Disconnect {
        message: String,
        hide_disconnect_reason: bool,
    },
    /// An unrecognized or intentionally-opaque packet: the pool's
    /// pass-through default for anything with no decoder registered.
    Unknown {
        packet_id: u32,
        data: Vec<u8>,
    },
}

impl LegacyPacket {
    pub fn id(&self) -> u32 {
        use LegacyPacket::*;
        match self {
            Login { .. } => LegacyPacketId::Login as u32,
            PlayStatus { .. } => LegacyPacketId::PlayStatus as u32,
            ResourcePacksInfo { .. } => LegacyPacketId::ResourcePacksInfo as u32,
            ResourcePackStack { .. } => LegacyPacketId::ResourcePackStack as u32,
            ResourcePackClientResponse { .. } => LegacyPacketId::ResourcePackClientResponse as u32,
            Text { .. } => LegacyPacketId::Text as u32,
            StartGame { .. } => LegacyPacketId::StartGame as u32,
            MovePlayer { .. } => LegacyPacketId::MovePlayer as u32,
            UpdateBlock { .. } => LegacyPacketId::UpdateBlock as u32,
            UpdateBlockSynced { .. } => LegacyPacketId::UpdateBlockSynced as u32,
            PlayerAction { .. } => LegacyPacketId::PlayerAction as u32,
            LevelEvent { .. } => LegacyPacketId::LevelEvent as u32,
            LevelChunk { .. } => LegacyPacketId::LevelChunk as u32,
            InventoryTransaction { .. } => LegacyPacketId::InventoryTransaction as u32,
            PlayerSkin { .. } => LegacyPacketId::PlayerSkin as u32,
            AdventureSettings { .. } => LegacyPacketId::AdventureSettings as u32,
            PlayerList { .. } => LegacyPacketId::PlayerList as u32,
            ModalFormRequest { .. } => LegacyPacketId::ModalFormRequest as u32,
            ModalFormResponse { .. } => LegacyPacketId::ModalFormResponse as u32,
            Transfer { .. } => LegacyPacketId::Transfer as u32,
            Disconnect { .. } => LegacyPacketId::Disconnect as u32,
            Unknown { packet_id, .. } => *packet_id,
        }
    }
}

/// Block-entity NBT tags trailing a legacy chunk payload (: "an arbitrary
/// number of little-endian NBT block-entity compounds").
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntityEntry {
    pub position: BlockPos,
    pub tag: NbtValue,
}

// -- Wire encode/decode --------------------------------------------------
//
// Per-packet bindings for the pool (: "two explicit implementations
// per packet (encode, decode)" rather than a shared polymorphic-IO helper).
// Every field is written/read in declaration order; strings are
// varint-length-prefixed UTF-8, positions are three zigzag varints, poses
// are four little-endian `f32`s, and item stacks/NBT use the shared
// `crate::codec` helpers.

use crate::codec::*;
use bytes::{Buf, BufMut, BytesMut};

fn action_type_id(a: PlayerActionType) -> i32 {
    use PlayerActionType::*;
    match a {
        StartBreak => 0,
        AbortBreak => 1,
        StopBreak => 2,
        StartSneak => 3,
        StopSneak => 4,
        StartSprint => 5,
        StopSprint => 6,
        StartSwim => 7,
        StopSwim => 8,
        StartGlide => 9,
        StopGlide => 10,
        Jump => 11,
        Respawn => 12,
        Other(v) => v,
    }
}

fn action_type_from_id(id: i32) -> PlayerActionType {
    use PlayerActionType::*;
    match id {
        0 => StartBreak,
        1 => AbortBreak,
        2 => StopBreak,
        3 => StartSneak,
        4 => StopSneak,
        5 => StartSprint,
        6 => StopSprint,
        7 => StartSwim,
        8 => StopSwim,
        9 => StartGlide,
        10 => StopGlide,
        11 => Jump,
        12 => Respawn,
        other => Other(other),
    }
}

fn move_mode_id(m: MovePlayerMode) -> u8 {
    match m {
        MovePlayerMode::Normal => 0,
        MovePlayerMode::Reset => 1,
        MovePlayerMode::Teleport => 2,
        MovePlayerMode::Pitch => 3,
    }
}

fn move_mode_from_id(id: u8) -> MovePlayerMode {
    match id {
        1 => MovePlayerMode::Reset,
        2 => MovePlayerMode::Teleport,
        3 => MovePlayerMode::Pitch,
        _ => MovePlayerMode::Normal,
    }
}

fn source_type_id(s: InventorySourceType) -> u8 {
    match s {
        InventorySourceType::Container => 0,
        InventorySourceType::World => 1,
        InventorySourceType::Creative => 2,
        InventorySourceType::TODO => 3,
    }
}

fn source_type_from_id(id: u8) -> InventorySourceType {
    match id {
        1 => InventorySourceType::World,
        2 => InventorySourceType::Creative,
        3 => InventorySourceType::TODO,
        _ => InventorySourceType::Container,
    }
}

fn write_inventory_action(buf: &mut BytesMut, action: &InventoryAction) {
    buf.put_u8(source_type_id(action.source_type));
    buf.put_u8(action.window_id);
    write_vari32(buf, action.slot);
    match &action.old_item {
        Some(item) => write_item(buf, item),
        None => write_item(buf, &ItemStack::empty()),
    }
    match &action.new_item {
        Some(item) => write_item(buf, item),
        None => write_item(buf, &ItemStack::empty()),
    }
}

fn read_inventory_action(buf: &mut impl Buf) -> CodecResult<InventoryAction> {
    let source_type = source_type_from_id(read_u8(buf)?);
    let window_id = read_u8(buf)?;
    let slot = read_vari32(buf)?;
    let old = read_item(buf)?;
    let new = read_item(buf)?;
    Ok(InventoryAction {
        source_type,
        window_id,
        slot,
        old_item: if old.is_empty() { None } else { Some(old) },
        new_item: if new.is_empty() { None } else { Some(new) },
    })
}

fn write_legacy_skin(buf: &mut BytesMut, skin: &LegacySkin) {
    write_string(buf, &skin.skin_id);
    write_varu32(buf, skin.skin_data.len() as u32);
    buf.put_slice(&skin.skin_data);
    write_varu32(buf, skin.skin_image_width);
    write_varu32(buf, skin.skin_image_height);
    write_varu32(buf, skin.cape_data.len() as u32);
    buf.put_slice(&skin.cape_data);
    write_string(buf, &skin.geometry_name);
    write_string(buf, &skin.geometry_data);
    write_bool(buf, skin.premium);
}

fn read_legacy_skin(buf: &mut impl Buf) -> CodecResult<LegacySkin> {
    let skin_id = read_string(buf)?;
    let skin_data_len = read_varu32(buf)? as usize;
    if buf.remaining() < skin_data_len {
        return Err(CodecError::NotEnoughData);
    }
    let mut skin_data = vec![0u8; skin_data_len];
    buf.copy_to_slice(&mut skin_data);
    let skin_image_width = read_varu32(buf)?;
    let skin_image_height = read_varu32(buf)?;
    let cape_len = read_varu32(buf)? as usize;
    if buf.remaining() < cape_len {
        return Err(CodecError::NotEnoughData);
    }
    let mut cape_data = vec![0u8; cape_len];
    buf.copy_to_slice(&mut cape_data);
    let geometry_name = read_string(buf)?;
    let geometry_data = read_string(buf)?;
    let premium = read_bool(buf)?;
    Ok(LegacySkin {
        skin_id,
        skin_data,
        skin_image_width,
        skin_image_height,
        cape_data,
        geometry_name,
        geometry_data,
        premium,
    })
}

impl LegacyPacket {
    /// Encode this packet's body (not including the packet-ID prefix,
    /// which the pool/codec layer writes separately).
    pub fn encode(&self, buf: &mut BytesMut) {
        use LegacyPacket::*;
        match self {
            Login {
                protocol_version,
                connection_request,
            } => {
                buf.put_i32_le(*protocol_version);
                write_varu32(buf, connection_request.len() as u32);
                buf.put_slice(connection_request);
            }
            PlayStatus { status } => buf.put_i32_le(*status),
            ResourcePacksInfo {
                must_accept,
                pack_urls,
            } => {
                write_bool(buf, *must_accept);
                write_string_list(buf, pack_urls);
            }
            ResourcePackStack { must_accept } => write_bool(buf, *must_accept),
            ResourcePackClientResponse { response, pack_ids } => {
                buf.put_u8(*response);
                write_string_list(buf, pack_ids);
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
            StartGame {
                entity_unique_id,
                entity_runtime_id,
                game_mode,
                position,
                pitch,
                yaw,
                world_seed,
                dimension,
                generator,
                world_game_mode,
                difficulty,
                world_spawn,
                achievements_disabled,
                day_cycle_stop_time,
                education_mode,
                education_features_enabled,
                rain_level,
                lightning_level,
                multiplayer_game,
                broadcast_to_lan,
                commands_enabled,
                texture_packs_required,
                game_rules,
                premium_world_template_id,
                level_id,
                world_name,
                blocks,
                items,
            } => {
                write_vari64(buf, *entity_unique_id);
                write_varu64(buf, *entity_runtime_id);
                write_vari32(buf, game_mode.id());
                write_vec3f(buf, *position);
                buf.put_f32_le(*pitch);
                buf.put_f32_le(*yaw);
                write_vari64(buf, *world_seed);
                write_vari32(buf, *dimension);
                write_vari32(buf, *generator);
                write_vari32(buf, world_game_mode.id());
                write_vari32(buf, *difficulty);
                write_block_pos(buf, *world_spawn);
                write_bool(buf, *achievements_disabled);
                write_vari32(buf, *day_cycle_stop_time);
                write_bool(buf, *education_mode);
                write_bool(buf, *education_features_enabled);
                buf.put_f32_le(*rain_level);
                buf.put_f32_le(*lightning_level);
                write_bool(buf, *multiplayer_game);
                write_bool(buf, *broadcast_to_lan);
                write_bool(buf, *commands_enabled);
                write_bool(buf, *texture_packs_required);
                write_varu32(buf, game_rules.len() as u32);
                for rule in game_rules {
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
                write_string(buf, premium_world_template_id);
                write_string(buf, level_id);
                write_string(buf, world_name);
                write_varu32(buf, blocks.len() as u32);
                for b in blocks {
                    write_string(buf, &b.name);
                    buf.put_i16_le(b.data);
                }
                write_string_list(buf, items);
            }
            MovePlayer {
                entity_runtime_id,
                pose,
                mode,
                on_ground,
                riding_runtime_id,
                tick,
            } => {
                write_varu64(buf, *entity_runtime_id);
                write_pose(buf, *pose);
                buf.put_u8(move_mode_id(*mode));
                write_bool(buf, *on_ground);
                write_varu64(buf, *riding_runtime_id);
                write_varu64(buf, *tick);
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
            PlayerAction {
                entity_runtime_id,
                action,
                position,
                face,
            } => {
                write_varu64(buf, *entity_runtime_id);
                write_vari32(buf, action_type_id(*action));
                write_block_pos(buf, *position);
                write_vari32(buf, *face);
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
            LevelChunk {
                chunk_x,
                chunk_z,
                sub_chunk_count,
                data,
            } => {
                write_vari32(buf, *chunk_x);
                write_vari32(buf, *chunk_z);
                write_varu32(buf, *sub_chunk_count);
                write_varu32(buf, data.len() as u32);
                buf.put_slice(data);
            }
            InventoryTransaction { kind, actions } => {
                match kind {
                    InventoryTransactionKind::Normal => buf.put_u8(0),
                    InventoryTransactionKind::UseItem {
                        block_runtime_id,
                        face,
                    } => {
                        buf.put_u8(1);
                        write_vari32(buf, *block_runtime_id);
                        write_vari32(buf, *face);
                    }
                    InventoryTransactionKind::UseItemOnEntity { entity_runtime_id } => {
                        buf.put_u8(2);
                        write_varu64(buf, *entity_runtime_id);
                    }
                    InventoryTransactionKind::ReleaseItem => buf.put_u8(3),
                }
                write_varu32(buf, actions.len() as u32);
                for action in actions {
                    write_inventory_action(buf, action);
                }
            }
            PlayerSkin { uuid, skin } => {
                write_uuid(buf, uuid);
                write_legacy_skin(buf, skin);
            }
            AdventureSettings {
                flags,
                command_permission,
                action_permissions,
                player_permission,
                custom_flags,
                entity_unique_id,
            } => {
                write_varu32(buf, *flags);
                write_vari32(buf, *command_permission);
                write_varu32(buf, *action_permissions);
                write_vari32(buf, *player_permission);
                write_varu32(buf, *custom_flags);
                write_vari64(buf, *entity_unique_id);
            }
            PlayerList { add, entries } => {
                write_bool(buf, *add);
                write_varu32(buf, entries.len() as u32);
                for e in entries {
                    write_uuid(buf, &e.uuid);
                    write_vari64(buf, e.entity_unique_id);
                    write_string(buf, &e.username);
                    write_string(buf, &e.xuid);
                    write_string(buf, &e.platform_chat_id);
                    write_legacy_skin(buf, &e.skin);
                }
            }
            ModalFormRequest { form_id, form_data } => {
                write_varu32(buf, *form_id);
                write_string(buf, form_data);
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
            Unknown { data, .. } => buf.put_slice(data),
        }
    }

    /// Decode a packet body for the given legacy packet ID. `id` must be
    /// a value `LegacyPacketId::from_u32` resolves — callers pass through
    /// unresolved IDs as `Unknown` without calling this.
    pub fn decode(id: LegacyPacketId, buf: &mut impl Buf) -> CodecResult<LegacyPacket> {
        use LegacyPacketId as Id;
        Ok(match id {
            Id::Login => {
                let protocol_version = read_i32(buf)?;
                let len = read_varu32(buf)? as usize;
                if buf.remaining() < len {
                    return Err(CodecError::NotEnoughData);
                }
                let mut connection_request = vec![0u8; len];
                buf.copy_to_slice(&mut connection_request);
                LegacyPacket::Login {
                    protocol_version,
                    connection_request,
                }
            }
            Id::PlayStatus => LegacyPacket::PlayStatus {
                status: read_i32(buf)?,
            },
            Id::ResourcePacksInfo => LegacyPacket::ResourcePacksInfo {
                must_accept: read_bool(buf)?,
                pack_urls: read_string_list(buf)?,
            },
            Id::ResourcePackStack => LegacyPacket::ResourcePackStack {
                must_accept: read_bool(buf)?,
            },
            Id::ResourcePackClientResponse => LegacyPacket::ResourcePackClientResponse {
                response: read_u8(buf)?,
                pack_ids: read_string_list(buf)?,
            },
            Id::Text => LegacyPacket::Text {
                message: read_string(buf)?,
                source_name: read_string(buf)?,
                xuid: read_string(buf)?,
                platform_chat_id: read_string(buf)?,
            },
            Id::StartGame => {
                let entity_unique_id = read_vari64(buf)?;
                let entity_runtime_id = read_varu64(buf)?;
                let game_mode = game_mode_from_id(read_vari32(buf)?);
                let position = read_vec3f(buf)?;
                let pitch = read_f32(buf)?;
                let yaw = read_f32(buf)?;
                let world_seed = read_vari64(buf)?;
                let dimension = read_vari32(buf)?;
                let generator = read_vari32(buf)?;
                let world_game_mode = game_mode_from_id(read_vari32(buf)?);
                let difficulty = read_vari32(buf)?;
                let world_spawn = read_block_pos(buf)?;
                let achievements_disabled = read_bool(buf)?;
                let day_cycle_stop_time = read_vari32(buf)?;
                let education_mode = read_bool(buf)?;
                let education_features_enabled = read_bool(buf)?;
                let rain_level = read_f32(buf)?;
                let lightning_level = read_f32(buf)?;
                let multiplayer_game = read_bool(buf)?;
                let broadcast_to_lan = read_bool(buf)?;
                let commands_enabled = read_bool(buf)?;
                let texture_packs_required = read_bool(buf)?;
                let rule_count = read_varu32(buf)? as usize;
                let mut game_rules = Vec::with_capacity(rule_count);
                for _ in 0..rule_count {
                    let name = read_string(buf)?;
                    let value = match read_u8(buf)? {
                        0 => GameRuleValue::Bool(read_bool(buf)?),
                        1 => GameRuleValue::Int(read_vari32(buf)?),
                        _ => GameRuleValue::Float(read_f32(buf)?),
                    };
                    game_rules.push(GameRule { name, value });
                }
                let premium_world_template_id = read_string(buf)?;
                let level_id = read_string(buf)?;
                let world_name = read_string(buf)?;
                let block_count = read_varu32(buf)? as usize;
                let mut blocks = Vec::with_capacity(block_count);
                for _ in 0..block_count {
                    let name = read_string(buf)?;
                    if buf.remaining() < 2 {
                        return Err(CodecError::NotEnoughData);
                    }
                    let data = buf.get_i16_le();
                    blocks.push(LegacyBlockEntry { name, data });
                }
                let items = read_string_list(buf)?;
                LegacyPacket::StartGame {
                    entity_unique_id,
                    entity_runtime_id,
                    game_mode,
                    position,
                    pitch,
                    yaw,
                    world_seed,
                    dimension,
                    generator,
                    world_game_mode,
                    difficulty,
                    world_spawn,
                    achievements_disabled,
                    day_cycle_stop_time,
                    education_mode,
                    education_features_enabled,
                    rain_level,
                    lightning_level,
                    multiplayer_game,
                    broadcast_to_lan,
                    commands_enabled,
                    texture_packs_required,
                    game_rules,
                    premium_world_template_id,
                    level_id,
                    world_name,
                    blocks,
                    items,
                }
            }
            Id::MovePlayer => LegacyPacket::MovePlayer {
                entity_runtime_id: read_varu64(buf)?,
                pose: read_pose(buf)?,
                mode: move_mode_from_id(read_u8(buf)?),
                on_ground: read_bool(buf)?,
                riding_runtime_id: read_varu64(buf)?,
                tick: read_varu64(buf)?,
            },
            Id::UpdateBlock => LegacyPacket::UpdateBlock {
                position: read_block_pos(buf)?,
                new_block_runtime_id: read_varu32(buf)?,
                flags: read_varu32(buf)?,
                layer: read_varu32(buf)?,
            },
            Id::UpdateBlockSynced => LegacyPacket::UpdateBlockSynced {
                position: read_block_pos(buf)?,
                new_block_runtime_id: read_varu32(buf)?,
                flags: read_varu32(buf)?,
                layer: read_varu32(buf)?,
                entity_unique_id: read_vari64(buf)?,
                transition: read_varu64(buf)?,
            },
            Id::PlayerAction => LegacyPacket::PlayerAction {
                entity_runtime_id: read_varu64(buf)?,
                action: action_type_from_id(read_vari32(buf)?),
                position: read_block_pos(buf)?,
                face: read_vari32(buf)?,
            },
            Id::LevelEvent => LegacyPacket::LevelEvent {
                event_type: read_vari32(buf)?,
                position: read_vec3f(buf)?,
                event_data: read_vari32(buf)?,
            },
            Id::LevelChunk => {
                let chunk_x = read_vari32(buf)?;
                let chunk_z = read_vari32(buf)?;
                let sub_chunk_count = read_varu32(buf)?;
                let len = read_varu32(buf)? as usize;
                if buf.remaining() < len {
                    return Err(CodecError::NotEnoughData);
                }
                let mut data = vec![0u8; len];
                buf.copy_to_slice(&mut data);
                LegacyPacket::LevelChunk {
                    chunk_x,
                    chunk_z,
                    sub_chunk_count,
                    data,
                }
            }
            Id::InventoryTransaction => {
                let kind = match read_u8(buf)? {
                    1 => InventoryTransactionKind::UseItem {
                        block_runtime_id: read_vari32(buf)?,
                        face: read_vari32(buf)?,
                    },
                    2 => InventoryTransactionKind::UseItemOnEntity {
                        entity_runtime_id: read_varu64(buf)?,
                    },
                    3 => InventoryTransactionKind::ReleaseItem,
                    _ => InventoryTransactionKind::Normal,
                };
                let count = read_varu32(buf)? as usize;
                let mut actions = Vec::with_capacity(count);
                for _ in 0..count {
                    actions.push(read_inventory_action(buf)?);
                }
                LegacyPacket::InventoryTransaction { kind, actions }
            }
            Id::PlayerSkin => LegacyPacket::PlayerSkin {
                uuid: read_uuid(buf)?,
                skin: read_legacy_skin(buf)?,
            },
            Id::AdventureSettings => LegacyPacket::AdventureSettings {
                flags: read_varu32(buf)?,
                command_permission: read_vari32(buf)?,
                action_permissions: read_varu32(buf)?,
                player_permission: read_vari32(buf)?,
                custom_flags: read_varu32(buf)?,
                entity_unique_id: read_vari64(buf)?,
            },
            Id::PlayerList => {
                let add = read_bool(buf)?;
                let count = read_varu32(buf)? as usize;
                let mut entries = Vec::with_capacity(count);
                for _ in 0..count {
                    entries.push(PlayerListEntry {
                        uuid: read_uuid(buf)?,
                        entity_unique_id: read_vari64(buf)?,
                        username: read_string(buf)?,
                        xuid: read_string(buf)?,
                        platform_chat_id: read_string(buf)?,
                        skin: read_legacy_skin(buf)?,
                    });
                }
                LegacyPacket::PlayerList { add, entries }
            }
            Id::ModalFormRequest => LegacyPacket::ModalFormRequest {
                form_id: read_varu32(buf)?,
                form_data: read_string(buf)?,
            },
            Id::ModalFormResponse => {
                let form_id = read_varu32(buf)?;
                let response_data = if read_bool(buf)? {
                    Some(read_string(buf)?)
                } else {
                    None
                };
                let cancel_reason = match read_u8(buf)? {
                    1 => Some(ModalFormCancelReason::UserClosed),
                    2 => Some(ModalFormCancelReason::UserBusy),
                    _ => None,
                };
                LegacyPacket::ModalFormResponse {
                    form_id,
                    response_data,
                    cancel_reason,
                }
            }
            Id::Transfer => LegacyPacket::Transfer {
                address: read_string(buf)?,
                port: {
                    if buf.remaining() < 2 {
                        return Err(CodecError::NotEnoughData);
                    }
                    buf.get_u16_le()
                },
            },
            Id::Disconnect => LegacyPacket::Disconnect {
                hide_disconnect_reason: read_bool(buf)?,
                message: read_string(buf)?,
            },
        })
    }
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

#[cfg(test)]
mod wire_tests {
    use super::*;

    fn roundtrip(pkt: LegacyPacket) {
        let id = LegacyPacketId::from_u32(pkt.id()).expect("known id");
        let mut buf = BytesMut::new();
        pkt.encode(&mut buf);
        let mut reader = buf.freeze();
        let decoded = LegacyPacket::decode(id, &mut reader).expect("decode");
        assert_eq!(format!("{decoded:?}"), format!("{pkt:?}"));
    }

    #[test]
    fn move_player_roundtrip() {
        roundtrip(LegacyPacket::MovePlayer {
            entity_runtime_id: 7,
            pose: Pose {
                position: relic_types::Vec3f::new(1.0, 64.0, 2.0),
                pitch: 10.0,
                yaw: 90.0,
                head_yaw: 90.0,
            },
            mode: MovePlayerMode::Normal,
            on_ground: true,
            riding_runtime_id: 0,
            tick: 42,
        });
    }

    #[test]
    fn update_block_roundtrip() {
        roundtrip(LegacyPacket::UpdateBlock {
            position: BlockPos::new(5, 64, 5),
            new_block_runtime_id: 17,
            flags: 0,
            layer: 0,
        });
    }

    #[test]
    fn transfer_roundtrip() {
        roundtrip(LegacyPacket::Transfer {
            address: "play.example.net".into(),
            port: 19132,
        });
    }

    #[test]
    fn modal_form_response_roundtrip() {
        roundtrip(LegacyPacket::ModalFormResponse {
            form_id: 42,
            response_data: None,
            cancel_reason: Some(ModalFormCancelReason::UserClosed),
        });
    }

    #[test]
    fn player_action_roundtrip() {
        roundtrip(LegacyPacket::PlayerAction {
            entity_runtime_id: 1,
            action: PlayerActionType::StartSprint,
            position: BlockPos::new(0, 0, 0),
            face: 0,
        });
    }

    #[test]
    fn inventory_transaction_roundtrip() {
        roundtrip(LegacyPacket::InventoryTransaction {
            kind: InventoryTransactionKind::UseItem {
                block_runtime_id: 9,
                face: 1,
            },
            actions: vec![InventoryAction {
                source_type: InventorySourceType::Container,
                window_id: 0,
                slot: 1,
                old_item: None,
                new_item: Some(ItemStack {
                    network_id: 5,
                    metadata_value: 0,
                    count: 1,
                    nbt_data: None,
                    can_be_placed_on: vec![],
                    can_break: vec![],
                }),
            }],
        });
    }
}
