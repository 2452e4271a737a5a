//! Per-connection state shared between the three tasks an orchestrated
//! connection runs : the client->server pump, the server->client
//! pump, and the synthetic-input ticker. Everything here is either a plain
//! atomic cell (position, rotation, input latches) or guarded by a lock with
//! a single writer/single reader split as described in, so the pumps
//! never need to coordinate beyond what's written here.

use relic_data::MappingRegistry;
use relic_types::{ChunkPos, Vec3f};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use tokio::sync::watch;

/// One latch per legacy `PlayerAction` the synthetic-input ticker folds
/// into `PlayerAuthInput.input_data` .
/// Each cell is a boolean compare-and-swapped `true -> false` by T3; T1 only
/// ever sets them `true`.
#[derive(Debug, Default)]
pub struct InputLatches {
    pub start_sprinting: AtomicBool,
    pub stop_sprinting: AtomicBool,
    pub start_sneaking: AtomicBool,
    pub stop_sneaking: AtomicBool,
    pub start_swimming: AtomicBool,
    pub stop_swimming: AtomicBool,
    pub start_gliding: AtomicBool,
    pub stop_gliding: AtomicBool,
    pub jumping: AtomicBool,
}

impl InputLatches {
    fn take(cell: &AtomicBool, flag: u64, bits: &mut u64) {
        if cell.swap(false, Ordering::AcqRel) {
            *bits |= flag;
        }
    }

    /// Drain every latch into the accumulated `input_data` bitset T3 sends
    /// with its next `PlayerAuthInput`, clearing each one in the process.
    pub fn drain(&self) -> u64 {
        use relic_protocol_modern::input_data as flag;
        let mut bits = 0u64;
        Self::take(&self.start_sprinting, flag::START_SPRINTING, &mut bits);
        Self::take(&self.stop_sprinting, flag::STOP_SPRINTING, &mut bits);
        Self::take(&self.start_sneaking, flag::START_SNEAKING, &mut bits);
        Self::take(&self.stop_sneaking, flag::STOP_SNEAKING, &mut bits);
        Self::take(&self.start_swimming, flag::START_SWIMMING, &mut bits);
        Self::take(&self.stop_swimming, flag::STOP_SWIMMING, &mut bits);
        Self::take(&self.start_gliding, flag::START_GLIDING, &mut bits);
        Self::take(&self.stop_gliding, flag::STOP_GLIDING, &mut bits);
        Self::take(&self.jumping, flag::JUMPING, &mut bits);
        bits
    }
}

/// Atomic storage for a `Vec3f`, one `AtomicU32` per component holding the
/// `f32`'s bit pattern. `Vec3f`/`f32` have no atomic of their own; this is
/// the standard bit-cast workaround, with acquire/release ordering.
#[derive(Debug)]
struct AtomicVec3f {
    x: AtomicU32,
    y: AtomicU32,
    z: AtomicU32,
}

impl AtomicVec3f {
    fn new(v: Vec3f) -> Self {
        Self {
            x: AtomicU32::new(v.x.to_bits()),
            y: AtomicU32::new(v.y.to_bits()),
            z: AtomicU32::new(v.z.to_bits()),
        }
    }

    fn load(&self) -> Vec3f {
        Vec3f {
            x: f32::from_bits(self.x.load(Ordering::Acquire)),
            y: f32::from_bits(self.y.load(Ordering::Acquire)),
            z: f32::from_bits(self.z.load(Ordering::Acquire)),
        }
    }

    fn store(&self, v: Vec3f) {
        self.x.store(v.x.to_bits(), Ordering::Release);
        self.y.store(v.y.to_bits(), Ordering::Release);
        self.z.store(v.z.to_bits(), Ordering::Release);
    }
}

/// Per-connection state ("Connection state"). Owned by the orchestrator
/// and shared with T1/T2/T3 behind an `Arc`.
pub struct ConnectionState {
    pub remote_address: Mutex<SocketAddr>,
    pub local_listener_port: u16,
    pub entity_runtime_id: u64,
    pub old_movement_system: bool,

    /// The process-wide mapping registry, behind a lock only because the
    /// `StartGame` custom-state adjustment  replaces it wholesale
    /// exactly once per connection; all other reads are concurrent.
    pub registry: RwLock<MappingRegistry>,

    position: AtomicVec3f,
    last_position: AtomicVec3f,
    yaw: AtomicU32,
    pitch: AtomicU32,
    head_yaw: AtomicU32,
    pub latches: InputLatches,
    input_tick: AtomicU64,

    /// Biome tail cached per in-flight `LevelChunk` awaiting its matching
    /// `SubChunk` reply ("Biome-payload cache"). Single writer and
    /// single reader, both T2, so a plain mutex is enough synchronization;
    /// entries are erased as soon as the matching `SubChunk` arrives.
    biome_cache: Mutex<HashMap<ChunkPos, Vec<u8>>>,

    pub entity_unique_id: AtomicI64,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ConnectionState {
    pub fn new(
        remote_address: SocketAddr,
        local_listener_port: u16,
        entity_runtime_id: u64,
        old_movement_system: bool,
        registry: MappingRegistry,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            remote_address: Mutex::new(remote_address),
            local_listener_port,
            entity_runtime_id,
            old_movement_system,
            registry: RwLock::new(registry),
            position: AtomicVec3f::new(Vec3f::default()),
            last_position: AtomicVec3f::new(Vec3f::default()),
            yaw: AtomicU32::new(0),
            pitch: AtomicU32::new(0),
            head_yaw: AtomicU32::new(0),
            latches: InputLatches::default(),
            input_tick: AtomicU64::new(0),
            biome_cache: Mutex::new(HashMap::new()),
            entity_unique_id: AtomicI64::new(0),
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn position(&self) -> Vec3f {
        self.position.load()
    }

    pub fn rotation(&self) -> (f32, f32, f32) {
        (
            f32::from_bits(self.yaw.load(Ordering::Acquire)),
            f32::from_bits(self.pitch.load(Ordering::Acquire)),
            f32::from_bits(self.head_yaw.load(Ordering::Acquire)),
        )
    }

    /// Called from T1 on every legacy `MovePlayer` while `old_movement_system`
    /// is set: updates the atomics T3 reads, rather than forwarding the
    /// packet itself .
    pub fn set_pose(&self, position: Vec3f, yaw: f32, pitch: f32, head_yaw: f32) {
        self.position.store(position);
        self.yaw.store(yaw.to_bits(), Ordering::Release);
        self.pitch.store(pitch.to_bits(), Ordering::Release);
        self.head_yaw.store(head_yaw.to_bits(), Ordering::Release);
    }

    /// T3's per-tick snapshot: swap `last_position` for the current one and
    /// return `(current, delta, tick)`. `tick` is a monotonic counter, not a
    /// wall-clock timestamp (`Date.now`/wall time is never used here).
    pub fn snapshot_for_tick(&self) -> (Vec3f, Vec3f, u64) {
        let current = self.position.load();
        let previous = self.last_position.load();
        self.last_position.store(current);
        let delta = Vec3f::new(
            current.x - previous.x,
            current.y - previous.y,
            current.z - previous.z,
        );
        let tick = self.input_tick.fetch_add(1, Ordering::AcqRel);
        (current, delta, tick)
    }

    pub fn cache_biome_tail(&self, column: ChunkPos, tail: Vec<u8>) {
        self.biome_cache.lock().unwrap().insert(column, tail);
    }

    pub fn take_biome_tail(&self, column: ChunkPos) -> Option<Vec<u8>> {
        self.biome_cache.lock().unwrap().remove(&column)
    }

    pub fn set_remote_address(&self, addr: SocketAddr) {
        *self.remote_address.lock().unwrap() = addr;
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn trigger_shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
