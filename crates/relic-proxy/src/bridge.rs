//! The bidirectional packet-rewriting pipeline : `convert_to_latest`
//! translates a legacy packet from the client into zero or more modern
//! packets bound for the upstream server; `convert_from_latest` does the
//! reverse. Both are pure dispatch tables keyed on packet ID — a rule that
//! needs nothing beyond the packet itself reads straight off the input;
//! a rule that needs shared per-connection data (the mapping registry,
//! input latches, cached biome tails) takes `&ConnectionState`.
//!
//! Packets intercepted earlier by the orchestrator's pumps (legacy
//! `MovePlayer`/`PlayerAction` under the old movement system, `LevelChunk`
//! in sub-chunk request mode, `SubChunk` replies, `Transfer`) never reach
//! here; see `network.rs` for those. Everything else funnels through one
//! of these two functions.

use crate::state::ConnectionState;
use relic_data::MappingRegistry;
use relic_protocol_core::{
    self as core, downgrade_abilities, InventoryAction, InventorySourceType,
    InventoryTransactionKind, LegacyBlockEntry, LegacyPacket, LegacySkin,
    ModalFormCancelReason as LegacyCancelReason, MovePlayerMode, PlayerActionType,
};
use relic_protocol_modern::{
    GameRuleValue as ModernGameRuleValue, ModalFormCancelReason as ModernCancelReason,
    ModernBlockEntry, ModernInventoryAction, ModernPacket, ModernSkin, ModernTransactionKind,
    MoveMode, SubChunkRequestMode,
};
use relic_types::{BlockState, ItemStack, ModernItemStack, Pose};
use relic_world::{downgrade_column, encode_legacy_chunk};

/// Legacy `LevelEvent` IDs the particle-remap rule applies to (: "remap
/// `event_data` as a block runtime ID"). These are the vanilla block-break
/// particle events; every other event type's `event_data` passes through
/// unchanged.
mod level_event {
    pub const PARTICLES_DESTROY_BLOCK: i32 = 2001;
    pub const PARTICLES_CRACK_BLOCK: i32 = 3600;
}

// -- Item translation --------------------------------------------------

fn item_to_modern(item: &ItemStack, registry: &MappingRegistry) -> ModernItemStack {
    if item.is_empty() {
        return ModernItemStack::empty();
    }
    let name = registry
        .item_name_by_id_legacy(item.network_id as i16)
        .unwrap_or("minecraft:air");
    let runtime_id = registry
        .item_runtime_id_by_name_modern(name)
        .map(|m| m.runtime_id)
        .unwrap_or(0);
    ModernItemStack {
        runtime_id,
        metadata: item.metadata_value as u32,
        count: item.count,
        nbt_data: item.nbt_data.clone(),
        can_be_placed_on: item.can_be_placed_on.clone(),
        can_break: item.can_break.clone(),
    }
}

fn item_to_legacy(item: &ModernItemStack, registry: &MappingRegistry) -> ItemStack {
    if item.is_empty() {
        return ItemStack::empty();
    }
    let name = registry
        .item_name_by_runtime_id_modern(item.runtime_id)
        .unwrap_or(relic_data::ITEM_FALLBACK_NAME);
    ItemStack {
        network_id: registry.item_id_by_name_legacy(name) as i32,
        metadata_value: item.metadata as i16,
        count: item.count,
        nbt_data: item.nbt_data.clone(),
        can_be_placed_on: item.can_be_placed_on.clone(),
        can_break: item.can_break.clone(),
    }
}

fn inventory_action_to_modern(
    action: &InventoryAction,
    registry: &MappingRegistry,
) -> ModernInventoryAction {
    ModernInventoryAction {
        source_type: match action.source_type {
            InventorySourceType::Container => 0,
            InventorySourceType::World => 1,
            InventorySourceType::Creative => 2,
            InventorySourceType::TODO => 3,
        },
        window_id: action.window_id,
        slot: action.slot,
        old_item: action.old_item.as_ref().map(|i| item_to_modern(i, registry)),
        new_item: action.new_item.as_ref().map(|i| item_to_modern(i, registry)),
    }
}

fn inventory_action_to_legacy(
    action: &ModernInventoryAction,
    registry: &MappingRegistry,
) -> InventoryAction {
    InventoryAction {
        source_type: match action.source_type {
            1 => InventorySourceType::World,
            2 => InventorySourceType::Creative,
            0 => InventorySourceType::Container,
            _ => InventorySourceType::TODO,
        },
        window_id: action.window_id,
        slot: action.slot,
        old_item: action.old_item.as_ref().map(|i| item_to_legacy(i, registry)),
        new_item: action.new_item.as_ref().map(|i| item_to_legacy(i, registry)),
    }
}

// -- Skin/player-list helpers -------------------------------------------

fn legacy_skin_from_modern(skin: &ModernSkin) -> LegacySkin {
    let (width, height) = LegacySkin::infer_dimensions_from_data(skin.skin_data.len());
    LegacySkin {
        skin_id: skin.skin_id.clone(),
        skin_data: skin.skin_data.clone(),
        skin_image_width: width,
        skin_image_height: height,
        cape_data: skin.cape_data.clone(),
        geometry_name: skin.default_geometry_name(),
        geometry_data: skin.geometry_data.clone(),
        premium: skin.premium,
    }
}

// -- Game rules / custom blocks -------------------------------------------

fn game_rule_value_to_legacy(v: &ModernGameRuleValue) -> core::GameRuleValue {
    match v {
        ModernGameRuleValue::Bool(b) => core::GameRuleValue::Bool(*b),
        ModernGameRuleValue::Int(i) => core::GameRuleValue::Int(*i),
        ModernGameRuleValue::Float(f) => core::GameRuleValue::Float(*f),
    }
}

/// Custom blocks arrive as name + NBT property compound; the registry only
/// needs the name to hash and sort them ( adjustment routine keys
/// purely on `fnv1_64(name)`), so the property compound is not decoded into
/// a `BlockState`'s property map here.
fn custom_block_to_state(entry: &ModernBlockEntry) -> BlockState {
    BlockState::new(entry.name.clone())
}

// -- ConvertToLatest: legacy (client) -> modern (server) ------------------

pub fn convert_to_latest(packet: LegacyPacket, ctx: &ConnectionState) -> Vec<ModernPacket> {
    match packet {
        LegacyPacket::MovePlayer {
            pose,
            mode,
            on_ground,
            ..
        } => {
            // Reached only when `old_movement_system` is false: T1 handles
            // the client-authoritative case itself .
            vec![ModernPacket::MovePlayer {
                entity_runtime_id: ctx.entity_runtime_id,
                pose,
                mode: match mode {
                    MovePlayerMode::Normal => MoveMode::Normal,
                    MovePlayerMode::Reset => MoveMode::Reset,
                    MovePlayerMode::Teleport => MoveMode::Teleport,
                    MovePlayerMode::Pitch => MoveMode::Rotation,
                },
                on_ground,
            }]
        }

        LegacyPacket::PlayerAction { action, .. } => {
            match action {
                PlayerActionType::StartSprint => {
                    ctx.latches.start_sprinting.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::StopSprint => {
                    ctx.latches.stop_sprinting.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::StartSneak => {
                    ctx.latches.start_sneaking.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::StopSneak => {
                    ctx.latches.stop_sneaking.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::StartSwim => {
                    ctx.latches.start_swimming.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::StopSwim => {
                    ctx.latches.stop_swimming.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::StartGlide => {
                    ctx.latches.start_gliding.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::StopGlide => {
                    ctx.latches.stop_gliding.store(true, std::sync::atomic::Ordering::Release)
                }
                PlayerActionType::Jump => {
                    ctx.latches.jumping.store(true, std::sync::atomic::Ordering::Release)
                }
                _ => {}
            }
            //: dropped from the stream unconditionally.
            vec![]
        }

        LegacyPacket::InventoryTransaction { kind, actions } => {
            let registry = ctx.registry.read().unwrap();
            let modern_actions = actions
                .iter()
                .map(|a| inventory_action_to_modern(a, &registry))
                .collect();
            let modern_kind = match kind {
                InventoryTransactionKind::Normal => ModernTransactionKind::Normal,
                InventoryTransactionKind::UseItem { block_runtime_id, face } => {
                    let state = registry.runtime_id_to_state_legacy(block_runtime_id as u32);
                    let upgraded = match state {
                        Some(s) => registry.state_to_runtime_id_modern(&s.name, &s.properties),
                        None => registry.modern_fallback_runtime_id(),
                    };
                    ModernTransactionKind::UseItem {
                        block_runtime_id: upgraded as i32,
                        face,
                    }
                }
                InventoryTransactionKind::UseItemOnEntity { entity_runtime_id } => {
                    ModernTransactionKind::UseItemOnEntity { entity_runtime_id }
                }
                InventoryTransactionKind::ReleaseItem => ModernTransactionKind::ReleaseItem,
            };
            vec![ModernPacket::InventoryTransaction {
                kind: modern_kind,
                actions: modern_actions,
            }]
        }

        LegacyPacket::ModalFormResponse {
            form_id,
            response_data,
        } => {
            if response_data.as_deref() == Some("null\n") {
                vec![ModernPacket::ModalFormResponse {
                    form_id,
                    response_data: None,
                    cancel_reason: Some(ModernCancelReason::UserClosed),
                }]
            } else {
                vec![ModernPacket::ModalFormResponse {
                    form_id,
                    response_data,
                    cancel_reason: None,
                }]
            }
        }

        LegacyPacket::Text {
            message,
            source_name,
            xuid,
            platform_chat_id,
        } => vec![ModernPacket::Text {
            message,
            source_name,
            xuid,
            platform_chat_id,
        }],

        LegacyPacket::PlayerSkin { .. } => vec![],

        LegacyPacket::Unknown { packet_id, data } => vec![ModernPacket::Unknown { packet_id, data }],

        // Everything else (login/handshake/resource-pack flow, StartGame,
        // Disconnect, ...) is either orchestrator-owned or has no
        // client-to-server direction.
        _ => vec![],
    }
}

// -- ConvertFromLatest: modern (server) -> legacy (client) ----------------

pub fn convert_from_latest(packet: ModernPacket, ctx: &ConnectionState) -> Vec<LegacyPacket> {
    match packet {
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
            level_id,
            world_name,
            ..
        } => {
            {
                let mut registry = ctx.registry.write().unwrap();
                let custom_states = custom_blocks.iter().map(custom_block_to_state).collect();
                registry.adjust_custom_states(custom_states);
            }
            let registry = ctx.registry.read().unwrap();

            let blocks = registry
                .legacy_block_palette()
                .into_iter()
                .map(|(name, data)| LegacyBlockEntry {
                    name,
                    data: data as i16,
                })
                .collect();
            let items = registry.legacy_item_names();

            vec![LegacyPacket::StartGame {
                entity_unique_id,
                entity_runtime_id,
                game_mode,
                position: pose.position,
                pitch: pose.pitch,
                yaw: pose.yaw,
                world_seed,
                dimension,
                generator,
                world_game_mode,
                difficulty,
                world_spawn,
                achievements_disabled: true,
                day_cycle_stop_time: 0,
                //: education fields are forced off for the legacy client.
                education_mode: false,
                education_features_enabled: false,
                rain_level: 0.0,
                lightning_level: 0.0,
                multiplayer_game: true,
                broadcast_to_lan: false,
                commands_enabled: true,
                texture_packs_required: false,
                game_rules: game_rules
                    .iter()
                    .map(|g| core::GameRule {
                        name: g.name.clone(),
                        value: game_rule_value_to_legacy(&g.value),
                    })
                    .collect(),
                //: forced empty for the legacy client.
                premium_world_template_id: String::new(),
                level_id,
                world_name,
                blocks,
                items,
            }]
        }

        ModernPacket::LevelChunk {
            chunk_x,
            chunk_z,
            sub_chunk_count,
            request_mode,
            payload,
        } => {
            if request_mode != SubChunkRequestMode::Legacy {
                // T2 intercepts limited/limitless columns before calling
                // into this function .
                let _ = (chunk_x, chunk_z);
                return vec![];
            }
            let registry = ctx.registry.read().unwrap();
            let mut buf = bytes::BytesMut::from(&payload[..]);
            let Ok(column) =
                relic_world::decode_column(&mut buf, sub_chunk_count as usize, true, 0)
            else {
                return vec![];
            };
            let legacy = downgrade_column(&column, &registry);
            let data = encode_legacy_chunk(&legacy, &[]);
            vec![LegacyPacket::LevelChunk {
                chunk_x,
                chunk_z,
                sub_chunk_count: relic_world::LEGACY_SUB_CHUNKS as u32,
                data,
            }]
        }

        ModernPacket::UpdateBlock {
            position,
            new_block_runtime_id,
            flags,
            layer,
        } => {
            let registry = ctx.registry.read().unwrap();
            let new_id = downgrade_block_runtime_id(new_block_runtime_id, &registry);
            vec![LegacyPacket::UpdateBlock {
                position,
                new_block_runtime_id: new_id,
                flags,
                layer,
            }]
        }

        ModernPacket::UpdateBlockSynced {
            position,
            new_block_runtime_id,
            flags,
            layer,
            entity_unique_id,
            transition,
        } => {
            let registry = ctx.registry.read().unwrap();
            let new_id = downgrade_block_runtime_id(new_block_runtime_id, &registry);
            vec![LegacyPacket::UpdateBlockSynced {
                position,
                new_block_runtime_id: new_id,
                flags,
                layer,
                entity_unique_id,
                transition,
            }]
        }

        ModernPacket::LevelEvent {
            event_type,
            position,
            event_data,
        } => {
            let remapped = if event_type == level_event::PARTICLES_DESTROY_BLOCK
                || event_type == level_event::PARTICLES_CRACK_BLOCK
            {
                let registry = ctx.registry.read().unwrap();
                downgrade_block_runtime_id(event_data as u32, &registry) as i32
            } else {
                event_data
            };
            vec![LegacyPacket::LevelEvent {
                event_type,
                position,
                event_data: remapped,
            }]
        }

        ModernPacket::UpdateAbilities {
            entity_unique_id,
            player_permission,
            command_permission,
            layers,
        } => {
            if entity_unique_id != ctx.entity_unique_id.load(std::sync::atomic::Ordering::Acquire) {
                return Vec::new();
            }
            let base = layers.first().map(|l| l.values).unwrap_or(0);
            let (flags, action_permissions) = downgrade_abilities(base);
            vec![LegacyPacket::AdventureSettings {
                flags,
                command_permission: command_permission as i32,
                action_permissions,
                player_permission: player_permission as i32,
                custom_flags: 0,
                entity_unique_id,
            }]
        }

        ModernPacket::InventoryTransaction { kind, actions } => {
            let registry = ctx.registry.read().unwrap();
            let legacy_actions = actions
                .iter()
                .map(|a| inventory_action_to_legacy(a, &registry))
                .collect();
            let legacy_kind = match kind {
                ModernTransactionKind::Normal => InventoryTransactionKind::Normal,
                ModernTransactionKind::UseItem { block_runtime_id, face } => {
                    let state = registry.runtime_id_to_state_modern(block_runtime_id as u32);
                    let downgraded = match state {
                        Some(s) => registry.state_to_runtime_id_legacy(&s.name, &s.properties),
                        None => registry.legacy_fallback_runtime_id(),
                    };
                    InventoryTransactionKind::UseItem {
                        block_runtime_id: downgraded as i32,
                        face,
                    }
                }
                ModernTransactionKind::UseItemOnEntity { entity_runtime_id } => {
                    InventoryTransactionKind::UseItemOnEntity { entity_runtime_id }
                }
                ModernTransactionKind::ReleaseItem => InventoryTransactionKind::ReleaseItem,
            };
            vec![LegacyPacket::InventoryTransaction {
                kind: legacy_kind,
                actions: legacy_actions,
            }]
        }

        ModernPacket::ModalFormResponse {
            form_id,
            response_data,
            cancel_reason,
        } => vec![LegacyPacket::ModalFormResponse {
            form_id,
            response_data,
            cancel_reason: cancel_reason.map(|r| match r {
                ModernCancelReason::UserClosed => LegacyCancelReason::UserClosed,
                ModernCancelReason::UserBusy => LegacyCancelReason::UserBusy,
            }),
        }],

        ModernPacket::PlayerSkin { uuid, skin } => vec![LegacyPacket::PlayerSkin {
            uuid,
            skin: legacy_skin_from_modern(&skin),
        }],

        ModernPacket::PlayerListAdd { entries } => vec![LegacyPacket::PlayerList {
            add: true,
            entries: entries
                .into_iter()
                .map(|e| relic_protocol_core::PlayerListEntry {
                    uuid: e.uuid,
                    entity_unique_id: e.entity_unique_id,
                    username: e.username,
                    xuid: e.xuid,
                    platform_chat_id: e.platform_chat_id,
                    skin: legacy_skin_from_modern(&e.skin),
                })
                .collect(),
        }],

        ModernPacket::PlayerListRemove { uuids } => vec![LegacyPacket::PlayerList {
            add: false,
            entries: uuids
                .into_iter()
                .map(|uuid| relic_protocol_core::PlayerListEntry {
                    uuid,
                    entity_unique_id: 0,
                    username: String::new(),
                    xuid: String::new(),
                    platform_chat_id: String::new(),
                    skin: LegacySkin {
                        skin_id: String::new(),
                        skin_data: Vec::new(),
                        skin_image_width: 0,
                        skin_image_height: 0,
                        cape_data: Vec::new(),
                        geometry_name: String::new(),
                        geometry_data: String::new(),
                        premium: false,
                    },
                })
                .collect(),
        }],

        ModernPacket::MoveActorAbsolute {
            entity_runtime_id,
            position,
            pitch,
            yaw,
            head_yaw,
        } => {
            if entity_runtime_id == ctx.entity_runtime_id {
                // T2 updates the atomics directly ; nothing
                // is forwarded for the player's own entity.
                return vec![];
            }
            vec![LegacyPacket::MovePlayer {
                entity_runtime_id,
                pose: Pose {
                    position,
                    pitch,
                    yaw,
                    head_yaw,
                },
                mode: MovePlayerMode::Normal,
                on_ground: true,
                riding_runtime_id: 0,
                tick: 0,
            }]
        }

        ModernPacket::MovePlayer {
            entity_runtime_id,
            pose,
            mode,
            on_ground,
        } => {
            if entity_runtime_id == ctx.entity_runtime_id {
                return vec![];
            }
            vec![LegacyPacket::MovePlayer {
                entity_runtime_id,
                pose,
                mode: match mode {
                    MoveMode::Normal => MovePlayerMode::Normal,
                    MoveMode::Reset => MovePlayerMode::Reset,
                    MoveMode::Teleport => MovePlayerMode::Teleport,
                    MoveMode::Rotation => MovePlayerMode::Pitch,
                },
                on_ground,
                riding_runtime_id: 0,
                tick: 0,
            }]
        }

        ModernPacket::Text {
            message,
            source_name,
            xuid,
            platform_chat_id,
        } => vec![LegacyPacket::Text {
            message,
            source_name,
            xuid,
            platform_chat_id,
        }],

        ModernPacket::Disconnect {
            message,
            hide_disconnect_reason,
        } => vec![LegacyPacket::Disconnect {
            message,
            hide_disconnect_reason,
        }],

        //: rewritten at the orchestrator level (it needs the listener's
        // own port and writes back `ctx.remote_address`); see `network.rs`.
        ModernPacket::Transfer { .. } => vec![],

        // T2-owned: sub-chunk request/response handling lives in
        // `network.rs` alongside the biome cache .
        ModernPacket::SubChunkRequest { .. } | ModernPacket::SubChunk { .. } => vec![],

        ModernPacket::Unknown { packet_id, data } => vec![LegacyPacket::Unknown { packet_id, data }],

        ModernPacket::PlayerAuthInput { .. } | ModernPacket::MoveActorDelta { .. } => vec![],
    }
}

/// property 5: an unmapped modern runtime ID downgrades to legacy-air,
/// never fails.
fn downgrade_block_runtime_id(modern_id: u32, registry: &MappingRegistry) -> u32 {
    match registry.runtime_id_to_state_modern(modern_id) {
        Some(state) => registry.state_to_runtime_id_legacy(&state.name, &state.properties),
        None => registry.legacy_fallback_runtime_id(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn test_ctx() -> ConnectionState {
        ConnectionState::new(
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 19132),
            19132,
            1,
            true,
            MappingRegistry::new(),
        )
    }

    #[test]
    fn modal_form_null_response_becomes_user_closed() {
        let ctx = test_ctx();
        let out = convert_to_latest(
            LegacyPacket::ModalFormResponse {
                form_id: 42,
                response_data: Some("null\n".to_string()),
            },
            &ctx,
        );
        match &out[..] {
            [ModernPacket::ModalFormResponse {
                form_id,
                response_data,
                cancel_reason,
            }] => {
                assert_eq!(*form_id, 42);
                assert_eq!(*response_data, None);
                assert_eq!(*cancel_reason, Some(ModernCancelReason::UserClosed));
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn player_action_is_dropped_and_latched() {
        let ctx = test_ctx();
        let out = convert_to_latest(
            LegacyPacket::PlayerAction {
                entity_runtime_id: 1,
                action: PlayerActionType::StartSprint,
                position: relic_types::BlockPos::new(0, 0, 0),
                face: 0,
            },
            &ctx,
        );
        assert!(out.is_empty());
        assert!(ctx.latches.start_sprinting.load(std::sync::atomic::Ordering::Acquire));
    }

    #[test]
    fn update_block_downgrades_known_state() {
        let ctx = test_ctx();
        let registry = ctx.registry.read().unwrap();
        let modern_stone = registry.state_to_runtime_id_modern(
            "minecraft:stone",
            &std::collections::BTreeMap::new(),
        );
        drop(registry);
        let out = convert_from_latest(
            ModernPacket::UpdateBlock {
                position: relic_types::BlockPos::new(5, 64, 5),
                new_block_runtime_id: modern_stone,
                flags: 0,
                layer: 0,
            },
            &ctx,
        );
        let registry = ctx.registry.read().unwrap();
        let expected = registry.state_to_runtime_id_legacy(
            "minecraft:stone",
            &std::collections::BTreeMap::new(),
        );
        match &out[..] {
            [LegacyPacket::UpdateBlock {
                new_block_runtime_id,
                ..
            }] => assert_eq!(*new_block_runtime_id, expected),
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn update_abilities_matches_example() {
        let ctx = test_ctx();
        ctx.entity_unique_id.store(1, std::sync::atomic::Ordering::Release);
        use relic_protocol_modern::AbilityLayer;
        let base = relic_protocol_core::modern_ability::MAY_FLY
            | relic_protocol_core::modern_ability::FLYING
            | relic_protocol_core::modern_ability::BUILD
            | relic_protocol_core::modern_ability::MINE
            | relic_protocol_core::modern_ability::OPEN_CONTAINERS;
        let out = convert_from_latest(
            ModernPacket::UpdateAbilities {
                entity_unique_id: 1,
                player_permission: 1,
                command_permission: 0,
                layers: vec![AbilityLayer {
                    layer_type: 0,
                    abilities: 0,
                    values: base,
                    fly_speed: 0.05,
                    walk_speed: 0.1,
                }],
            },
            &ctx,
        );
        match &out[..] {
            [LegacyPacket::AdventureSettings {
                flags,
                action_permissions,
                ..
            }] => {
                assert_eq!(
                    *flags,
                    relic_protocol_core::adventure_flag::ALLOW_FLIGHT
                        | relic_protocol_core::adventure_flag::FLYING
                        | relic_protocol_core::adventure_flag::WORLD_BUILDER
                );
                assert_eq!(
                    *action_permissions,
                    relic_protocol_core::action_permission::BUILD
                        | relic_protocol_core::action_permission::MINE
                        | relic_protocol_core::action_permission::OPEN_CONTAINERS
                );
            }
            other => panic!("unexpected output: {other:?}"),
        }
    }

    #[test]
    fn update_abilities_for_other_entity_is_dropped() {
        let ctx = test_ctx();
        ctx.entity_unique_id.store(1, std::sync::atomic::Ordering::Release);
        use relic_protocol_modern::AbilityLayer;
        let out = convert_from_latest(
            ModernPacket::UpdateAbilities {
                entity_unique_id: 2,
                player_permission: 1,
                command_permission: 0,
                layers: vec![AbilityLayer {
                    layer_type: 0,
                    abilities: 0,
                    values: 0,
                    fly_speed: 0.05,
                    walk_speed: 0.1,
                }],
            },
            &ctx,
        );
        assert!(out.is_empty());
    }
}
