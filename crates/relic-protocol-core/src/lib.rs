pub mod cipher;
pub mod codec;
pub mod compression;
pub mod connection;
pub mod packets;
pub mod remap;
pub mod state;

pub use cipher::{CipherError, Cfb8Session};
pub use codec::*;
pub use compression::{compress, decompress, select_compressor, Compressor};
pub use connection::{ClientData, ConnError, GameData, LegacyConn, PlayerMovementType};
pub use packets::*;
pub use remap::*;
pub use state::PacketPool;
