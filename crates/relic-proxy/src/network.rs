//! The per-connection orchestrator: completes the legacy client's login
//! handshake, dials the upstream modern server, and runs the three tasks
//! that keep a 1.12.x session alive against a modern world — the
//! client->server pump, the server->client pump, and (when the server is
//! client-authoritative) the synthetic `PlayerAuthInput` ticker.
//!
//! Everything that can be expressed as a pure packet-to-packet rewrite
//! lives in `bridge.rs`; what's here is what needs orchestration beyond
//! that: the handshake sequence, the upstream dial, sub-chunk request
//! synthesis, and the `Transfer`/own-entity-movement special cases that
//! need connection-level state bridge.rs's pure functions don't have
//! access to.

use crate::bridge;
use crate::config::ProxyConfig;
use crate::state::ConnectionState;
use base64::Engine as _;
use bytes::BytesMut;
use relic_data::MappingRegistry;
use relic_protocol_core::{ConnError, LegacyConn, LegacyPacket, LegacyPacketId, LegacySkin, PlayerMovementType};
use relic_protocol_modern::{
    InputMode, InteractionModel, ModernConn, ModernPacket, ModernPacketId, PlayMode,
    SubChunkRequestMode, SubChunkResult,
};
use relic_types::{ChunkPos, Pose};
use relic_world::{
    decode_biome_stream, decode_sub_chunk, downgrade_column, encode_legacy_chunk, Column,
    LEGACY_SUB_CHUNKS, MODERN_FLOOR_OFFSET, MODERN_SUB_CHUNKS,
};
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Geometry patch the legacy client's `ClientData` is overwritten with —
/// selects `geometry.humanoid.custom` so the modern server always has a
/// concrete skin geometry to render.
const DEFAULT_SKIN_RESOURCE_PATCH: &str = r#"{"geometry":{"default":"geometry.humanoid.custom"}}"#;
/// What `ClientData.GameVersion` is rewritten to so the upstream server's
/// version gate accepts the connection.
const MODERN_GAME_VERSION: &str = "1.21.0";
/// Vertical range floor assumed for sub-chunk decoding; non-overworld
/// dimensions aren't modeled.
const OVERWORLD_RANGE_MIN: i32 = -64;
const SYNTHETIC_TICK_HZ: u64 = 20;

mod play_status {
    pub const LOGIN_SUCCESS: i32 = 0;
}

mod resource_pack_response {
    pub const COMPLETED: u8 = 4;
}

/// The 16 legacy-visible sub-chunk offsets, relative to the column's own
/// storage base, regardless of how many sub-chunks the server offered.
fn legacy_visible_offsets() -> Vec<i8> {
    let range_min_shift = OVERWORLD_RANGE_MIN >> 4;
    (0..LEGACY_SUB_CHUNKS as i32)
        .map(|i| (range_min_shift + i) as i8)
        .collect()
}

/// Which `Column::sub_chunks` slot a decoded `SubChunk` reply entry belongs
/// in. Prefers the sub-chunk's own `y_index` (already an absolute modern
/// array slot for wire versions that carry one) over the reply's positional
/// order, which only versions with no absolute addressing fall back to.
fn resolve_sub_chunk_slot(index: usize, y_index: Option<i32>) -> usize {
    match y_index {
        Some(y) if (0..MODERN_SUB_CHUNKS as i32).contains(&y) => y as usize,
        _ => index + MODERN_FLOOR_OFFSET,
    }
}

/// The client-facing `Transfer` target rewritten for a legacy client — the
/// proxy always keeps the client pointed back at its own listener so a
/// server-initiated transfer stays behind the translation layer.
fn rewrite_transfer_target(local_listener_port: u16) -> (String, u16) {
    ("127.0.0.1".to_string(), local_listener_port)
}

/// Drive one accepted TCP connection end to end. Errors are logged and
/// swallowed here — by the time this returns, the connection is over.
pub async fn handle_connection(
    socket: TcpStream,
    peer: SocketAddr,
    local_listener_port: u16,
    config: Arc<ProxyConfig>,
    registry: Arc<MappingRegistry>,
) {
    if let Err(err) = run_connection(socket, peer, local_listener_port, config, registry).await {
        warn!(%peer, error = %err, "connection ended with an error");
    } else {
        info!(%peer, "connection ended");
    }
}

async fn run_connection(
    socket: TcpStream,
    peer: SocketAddr,
    local_listener_port: u16,
    config: Arc<ProxyConfig>,
    registry: Arc<MappingRegistry>,
) -> anyhow::Result<()> {
    let mut client = LegacyConn::new(socket, config.legacy_protocol_version);

    complete_login_handshake(&mut client).await?;
    override_client_data(&mut client);

    let upstream_address = config
        .upstream_address
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("no upstream_address configured"))?;
    info!(%peer, upstream_address, "dialing upstream server");
    let upstream_socket = TcpStream::connect(upstream_address).await?;
    let mut server = ModernConn::new(upstream_socket);

    let (start_game, entity_runtime_id, entity_unique_id, old_movement_system) =
        await_server_spawn(&mut server).await?;

    let state = Arc::new(ConnectionState::new(
        peer,
        local_listener_port,
        entity_runtime_id,
        old_movement_system,
        (*registry).clone(),
    ));
    state.entity_unique_id.store(entity_unique_id, Ordering::Release);

    for legacy_pkt in bridge::convert_from_latest(start_game, &state) {
        write_legacy(&mut client, legacy_pkt).await?;
    }
    client.flush().await?;

    let client = Arc::new(Mutex::new(client));
    let server = Arc::new(Mutex::new(server));
    let mut shutdown = state.shutdown_signal();

    let mut t1 = tokio::spawn(run_client_to_server_pump(client.clone(), server.clone(), state.clone()));
    let mut t2 = tokio::spawn(run_server_to_client_pump(client.clone(), server.clone(), state.clone()));
    let mut t3 =
        old_movement_system.then(|| tokio::spawn(run_synthetic_input_ticker(server.clone(), state.clone())));

    tokio::select! {
        _ = &mut t1 => {}
        _ = &mut t2 => {}
        _ = async {
            match &mut t3 {
                Some(handle) => { let _ = handle.await; }
                None => std::future::pending::<()>().await,
            }
        } => {}
        _ = shutdown.changed() => {}
    }

    state.trigger_shutdown();
    t1.abort();
    t2.abort();
    if let Some(handle) = &t3 {
        handle.abort();
    }

    Ok(())
}

/// `Login` -> `PlayStatus` -> `ResourcePacksInfo` -> (await response) ->
/// `ResourcePackStack` -> (await response). No packs are ever offered —
/// the legacy client has no room for them beyond its baked-in resources.
async fn complete_login_handshake<S>(client: &mut LegacyConn<S>) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (packet_id, mut payload) = client.read_packet().await?;
    let id = LegacyPacketId::from_u32(packet_id)
        .ok_or_else(|| anyhow::anyhow!("unrecognized packet {packet_id} before login"))?;
    if id != LegacyPacketId::Login {
        anyhow::bail!("expected Login as the first packet, got {id:?}");
    }
    let _login = LegacyPacket::decode(id, &mut payload)?;

    write_legacy(
        client,
        LegacyPacket::PlayStatus {
            status: play_status::LOGIN_SUCCESS,
        },
    )
    .await?;
    client.flush().await?;

    write_legacy(
        client,
        LegacyPacket::ResourcePacksInfo {
            must_accept: false,
            pack_urls: Vec::new(),
        },
    )
    .await?;
    client.flush().await?;
    await_resource_pack_response(client).await?;

    write_legacy(
        client,
        LegacyPacket::ResourcePackStack { must_accept: false },
    )
    .await?;
    client.flush().await?;
    await_resource_pack_response(client).await?;

    Ok(())
}

async fn await_resource_pack_response<S>(client: &mut LegacyConn<S>) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let (packet_id, mut payload) = client.read_packet().await?;
        let Some(id) = LegacyPacketId::from_u32(packet_id) else {
            continue;
        };
        if id == LegacyPacketId::ResourcePackClientResponse {
            let LegacyPacket::ResourcePackClientResponse { response, .. } =
                LegacyPacket::decode(id, &mut payload)?
            else {
                unreachable!("decode(ResourcePackClientResponse) always returns that variant");
            };
            if response != resource_pack_response::COMPLETED {
                debug!(response, "client sent a non-completed resource pack response, proceeding anyway");
            }
            return Ok(());
        }
    }
}

/// Overwrite the legacy client's `ClientData` so the upstream (modern)
/// server accepts the version and renders a sane default skin. The
/// identity-chain JWT this data normally travels in is parsed by the
/// transport layer before a connection ever reaches here; this just
/// re-shapes whatever `ClientData` that layer already populated.
fn override_client_data<S>(conn: &mut LegacyConn<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (width, height) = LegacySkin::infer_dimensions_from_data(conn.client_data().skin_data.len());
    let data = conn.client_data_mut();
    data.game_version = MODERN_GAME_VERSION.to_string();
    data.skin_resource_patch = base64::engine::general_purpose::STANDARD.encode(DEFAULT_SKIN_RESOURCE_PATCH);
    data.skin_image_width = width;
    data.skin_image_height = height;
}

/// Read upstream packets until `StartGame` arrives. Anything else seen
/// first has no modeled pre-spawn role and is dropped.
async fn await_server_spawn(
    server: &mut ModernConn<TcpStream>,
) -> anyhow::Result<(ModernPacket, u64, i64, bool)> {
    loop {
        let (packet_id, mut payload) = server.read_packet().await?;
        let Some(id) = ModernPacketId::from_u32(packet_id) else {
            debug!(packet_id, "dropping unrecognized pre-spawn packet from upstream");
            continue;
        };
        let packet = ModernPacket::decode(id, &mut payload)?;
        let (entity_runtime_id, entity_unique_id, old_movement_system) = match &packet {
            ModernPacket::StartGame {
                entity_runtime_id,
                entity_unique_id,
                movement_type,
                ..
            } => (
                *entity_runtime_id,
                *entity_unique_id,
                *movement_type == PlayerMovementType::ClientAuthoritative,
            ),
            _ => continue,
        };
        return Ok((packet, entity_runtime_id, entity_unique_id, old_movement_system));
    }
}

async fn write_legacy<S>(conn: &mut LegacyConn<S>, packet: LegacyPacket) -> Result<(), ConnError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = BytesMut::new();
    packet.encode(&mut buf);
    conn.write_packet(packet.id(), &buf).await
}

async fn write_modern(conn: &mut ModernConn<TcpStream>, packet: ModernPacket) -> Result<(), ConnError> {
    let mut buf = BytesMut::new();
    packet.encode(&mut buf);
    conn.write_packet(packet.id(), &buf).await
}

/// T1: client -> server.
async fn run_client_to_server_pump<S>(
    client: Arc<Mutex<LegacyConn<S>>>,
    server: Arc<Mutex<ModernConn<TcpStream>>>,
    state: Arc<ConnectionState>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let (packet_id, mut payload) = {
            let mut c = client.lock().await;
            match c.read_packet().await {
                Ok(v) => v,
                Err(err) => {
                    debug!(error = %err, "client read failed, ending connection");
                    state.trigger_shutdown();
                    return;
                }
            }
        };

        let Some(id) = LegacyPacketId::from_u32(packet_id) else {
            continue;
        };
        let packet = match LegacyPacket::decode(id, &mut payload) {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, ?id, "failed to decode legacy packet, dropping it");
                continue;
            }
        };

        if state.old_movement_system {
            if let LegacyPacket::MovePlayer { pose, .. } = &packet {
                state.set_pose(pose.position, pose.yaw, pose.pitch, pose.head_yaw);
                continue;
            }
        }

        let modern_packets = bridge::convert_to_latest(packet, &state);
        if modern_packets.is_empty() {
            continue;
        }
        let mut s = server.lock().await;
        for modern_pkt in modern_packets {
            if let Err(err) = write_modern(&mut s, modern_pkt).await {
                warn!(error = %err, "failed to write to upstream server, ending connection");
                state.trigger_shutdown();
                return;
            }
        }
        let _ = s.flush().await;
    }
}

/// T2: server -> client.
async fn run_server_to_client_pump<S>(
    client: Arc<Mutex<LegacyConn<S>>>,
    server: Arc<Mutex<ModernConn<TcpStream>>>,
    state: Arc<ConnectionState>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let (packet_id, mut payload) = {
            let mut s = server.lock().await;
            match s.read_packet().await {
                Ok(v) => v,
                Err(err) => {
                    debug!(error = %err, "upstream read failed, ending connection");
                    state.trigger_shutdown();
                    return;
                }
            }
        };

        let Some(id) = ModernPacketId::from_u32(packet_id) else {
            continue;
        };
        let packet = match ModernPacket::decode(id, &mut payload) {
            Ok(p) => p,
            Err(err) => {
                warn!(error = %err, ?id, "failed to decode modern packet, dropping it");
                continue;
            }
        };

        match packet {
            ModernPacket::MovePlayer {
                entity_runtime_id,
                pose,
                ..
            } if entity_runtime_id == state.entity_runtime_id => {
                state.set_pose(pose.position, pose.yaw, pose.pitch, pose.head_yaw);
            }

            ModernPacket::MoveActorAbsolute {
                entity_runtime_id,
                position,
                pitch,
                yaw,
                head_yaw,
            } if entity_runtime_id == state.entity_runtime_id => {
                state.set_pose(position, yaw, pitch, head_yaw);
            }

            ModernPacket::MoveActorDelta {
                entity_runtime_id,
                position,
            } if entity_runtime_id == state.entity_runtime_id => {
                let (yaw, pitch, head_yaw) = state.rotation();
                state.set_pose(position, yaw, pitch, head_yaw);
            }

            ModernPacket::LevelChunk {
                chunk_x,
                chunk_z,
                sub_chunk_count,
                request_mode,
                payload,
            } if request_mode != SubChunkRequestMode::Legacy => {
                debug!(chunk_x, chunk_z, sub_chunk_count, ?request_mode, "caching biome tail, requesting sub-chunks");
                state.cache_biome_tail(ChunkPos::new(chunk_x, chunk_z), payload);
                let offsets = legacy_visible_offsets();
                let mut s = server.lock().await;
                if let Err(err) = write_modern(
                    &mut s,
                    ModernPacket::SubChunkRequest {
                        chunk_x,
                        chunk_z,
                        offsets,
                    },
                )
                .await
                {
                    warn!(error = %err, "failed to request sub-chunks, ending connection");
                    state.trigger_shutdown();
                    return;
                }
                let _ = s.flush().await;
            }

            ModernPacket::SubChunk {
                chunk_x,
                chunk_z,
                entries,
            } => {
                handle_sub_chunk_reply(&client, &state, chunk_x, chunk_z, entries).await;
            }

            ModernPacket::Transfer { address, port } => {
                if let Ok(addr) = format!("{address}:{port}").parse::<SocketAddr>() {
                    state.set_remote_address(addr);
                }
                let (address, port) = rewrite_transfer_target(state.local_listener_port);
                let mut c = client.lock().await;
                let _ = write_legacy(&mut c, LegacyPacket::Transfer { address, port }).await;
                let _ = c.flush().await;
            }

            other => {
                let legacy_packets = bridge::convert_from_latest(other, &state);
                if legacy_packets.is_empty() {
                    continue;
                }
                let mut c = client.lock().await;
                for legacy_pkt in legacy_packets {
                    if let Err(err) = write_legacy(&mut c, legacy_pkt).await {
                        warn!(error = %err, "failed to write to client, ending connection");
                        state.trigger_shutdown();
                        return;
                    }
                }
                let _ = c.flush().await;
            }
        }
    }
}

/// Re-encode a `SubChunk` reply against the biome tail cached when the
/// triggering `LevelChunk` was intercepted, and emit one legacy
/// `LevelChunk` with the combined result.
async fn handle_sub_chunk_reply<S>(
    client: &Arc<Mutex<LegacyConn<S>>>,
    state: &Arc<ConnectionState>,
    chunk_x: i32,
    chunk_z: i32,
    entries: Vec<SubChunkResult>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let pos = ChunkPos::new(chunk_x, chunk_z);
    let Some(tail) = state.take_biome_tail(pos) else {
        warn!(chunk_x, chunk_z, "sub-chunk reply with no cached biome tail, dropping it");
        return;
    };

    let mut sub_chunks: Box<[Option<relic_world::SubChunk>; MODERN_SUB_CHUNKS]> =
        Box::new(std::array::from_fn(|_| None));
    for (index, entry) in entries.iter().enumerate() {
        if let SubChunkResult::Success { payload, .. } = entry {
            let mut buf = BytesMut::from(&payload[..]);
            match decode_sub_chunk(&mut buf, OVERWORLD_RANGE_MIN) {
                Ok(sub_chunk) => {
                    let slot = resolve_sub_chunk_slot(index, sub_chunk.y_index);
                    sub_chunks[slot] = Some(sub_chunk);
                }
                Err(err) => warn!(error = %err, index, "failed to decode a sub-chunk reply entry"),
            }
        }
    }

    let mut tail_buf = BytesMut::from(&tail[..]);
    let biomes = match decode_biome_stream(&mut tail_buf, entries.len()) {
        Ok(b) => b,
        Err(err) => {
            warn!(error = %err, chunk_x, chunk_z, "failed to decode cached biome tail");
            return;
        }
    };

    let column = Column { sub_chunks, biomes };
    let data = {
        let registry = state.registry.read().unwrap();
        let legacy = downgrade_column(&column, &registry);
        encode_legacy_chunk(&legacy, &[])
    };

    let mut c = client.lock().await;
    let _ = write_legacy(
        &mut c,
        LegacyPacket::LevelChunk {
            chunk_x,
            chunk_z,
            sub_chunk_count: LEGACY_SUB_CHUNKS as u32,
            data,
        },
    )
    .await;
    let _ = c.flush().await;
}

/// T3: 20Hz synthetic `PlayerAuthInput` generator, run only while the
/// upstream server is client-authoritative over movement.
async fn run_synthetic_input_ticker(server: Arc<Mutex<ModernConn<TcpStream>>>, state: Arc<ConnectionState>) {
    let mut ticker = interval(Duration::from_millis(1000 / SYNTHETIC_TICK_HZ));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = state.shutdown_signal();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => return,
        }

        let (position, delta, tick) = state.snapshot_for_tick();
        let (yaw, pitch, head_yaw) = state.rotation();
        let input_data = state.latches.drain();

        let packet = ModernPacket::PlayerAuthInput {
            pose: Pose {
                position,
                pitch,
                yaw,
                head_yaw,
            },
            delta,
            input_data,
            input_mode: InputMode::Mouse,
            play_mode: PlayMode::Normal,
            interaction_model: InteractionModel::Crosshair,
            tick,
        };

        let mut s = server.lock().await;
        if let Err(err) = write_modern(&mut s, packet).await {
            debug!(error = %err, "failed to send synthetic input, ending connection");
            state.trigger_shutdown();
            return;
        }
        let _ = s.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relic_types::Vec3f;
    use std::net::{IpAddr, Ipv4Addr};

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
    fn legacy_move_player_reflected_in_next_synthetic_tick() {
        let ctx = test_ctx();
        ctx.set_pose(Vec3f::new(10.0, 64.0, -3.0), 90.0, 5.0, 95.0);

        let (position, delta, tick) = ctx.snapshot_for_tick();
        let (yaw, pitch, head_yaw) = ctx.rotation();

        assert_eq!(position, Vec3f::new(10.0, 64.0, -3.0));
        assert_eq!(delta, Vec3f::new(10.0, 64.0, -3.0));
        assert_eq!(tick, 0);
        assert_eq!((yaw, pitch, head_yaw), (90.0, 5.0, 95.0));
        assert_eq!(ctx.latches.drain(), 0);

        ctx.set_pose(Vec3f::new(11.0, 64.0, -3.0), 90.0, 5.0, 95.0);
        let (position2, delta2, tick2) = ctx.snapshot_for_tick();
        assert_eq!(position2, Vec3f::new(11.0, 64.0, -3.0));
        assert_eq!(delta2, Vec3f::new(1.0, 0.0, 0.0));
        assert_eq!(tick2, 1);
    }

    #[test]
    fn legacy_visible_offsets_start_at_range_min_and_cover_sixteen() {
        let offsets = legacy_visible_offsets();
        assert_eq!(offsets.len(), LEGACY_SUB_CHUNKS);
        assert_eq!(offsets.first().copied(), Some((OVERWORLD_RANGE_MIN >> 4) as i8));
        assert_eq!(
            offsets.last().copied(),
            Some(((OVERWORLD_RANGE_MIN >> 4) + LEGACY_SUB_CHUNKS as i32 - 1) as i8)
        );
        assert!(offsets.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn sub_chunk_slot_prefers_y_index_over_position() {
        // version-9 reply carrying an absolute slot wins over positional order
        assert_eq!(resolve_sub_chunk_slot(0, Some(7)), 7);
        // a positionally-late entry with an early y_index still lands early
        assert_eq!(resolve_sub_chunk_slot(15, Some(0)), 0);
        // no y_index (versions 1/8): falls back to positional + floor offset
        assert_eq!(resolve_sub_chunk_slot(3, None), 3 + MODERN_FLOOR_OFFSET);
        // an out-of-range y_index is also treated as absent
        assert_eq!(resolve_sub_chunk_slot(2, Some(-1)), 2 + MODERN_FLOOR_OFFSET);
        assert_eq!(
            resolve_sub_chunk_slot(2, Some(MODERN_SUB_CHUNKS as i32)),
            2 + MODERN_FLOOR_OFFSET
        );
    }

    #[test]
    fn transfer_always_rewritten_to_local_listener() {
        let (address, port) = rewrite_transfer_target(19132);
        assert_eq!(address, "127.0.0.1");
        assert_eq!(port, 19132);
    }

    #[test]
    fn server_transfer_updates_remote_address_state() {
        let ctx = test_ctx();
        let addr: SocketAddr = "203.0.113.5:19133".parse().unwrap();
        ctx.set_remote_address(addr);
        assert_eq!(*ctx.remote_address.lock().unwrap(), addr);
    }
}
