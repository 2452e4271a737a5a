mod types;

pub use relic_nbt::NbtValue;
pub use types::*;
