pub mod connection;
pub mod packets;

pub use connection::ModernConn;
pub use packets::*;
