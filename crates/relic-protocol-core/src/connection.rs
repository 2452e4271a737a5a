//! The `Transport`/`Conn` abstraction the orchestrator is built against
//! . The real reliable-UDP (RakNet-compatible) transport — datagram
//! framing, MTU negotiation, ACKs, ordered reliability — is explicitly out
//! of scope  and assumed to be supplied by a library; what lives here
//! is the trait boundary plus a concrete `LegacyConn` that layers the
//! legacy era's framing (compression + CFB8 encryption) on top of any
//! ordered, reliable byte stream the transport hands us, mirroring how the
//! donor project's own `Connection` wraps a raw `TcpStream`.

use crate::cipher::Cfb8Session;
use crate::codec::{read_varu32, write_varu32, CodecError};
use crate::compression::{self, Compressor};
use bytes::{Buf, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Debug, Error)]
pub enum ConnError {
    #[error("transport closed")]
    Closed,
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identity and capability data exchanged during the legacy login
/// handshake. Only the fields the translation pipeline or the synthetic
/// movement loop actually consult are modeled; everything else travels as
/// the raw `connection_request` bytes in `LegacyPacket::Login`.
#[derive(Debug, Clone, Default)]
pub struct ClientData {
    pub game_version: String,
    pub skin_id: String,
    pub skin_resource_patch: String,
    pub skin_data: Vec<u8>,
    pub skin_image_width: u32,
    pub skin_image_height: u32,
    pub cape_data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMovementType {
    ClientAuthoritative,
    ServerAuthoritative,
    ServerAuthoritativeWithRewind,
}

/// Gameplay data a freshly-dialed upstream connection reports once it has
/// spawned (the subset the proxy's own logic reads, not a full mirror of
/// the wire `StartGame`).
#[derive(Debug, Clone)]
pub struct GameData {
    pub entity_unique_id: i64,
    pub entity_runtime_id: u64,
    pub world_seed: i64,
    pub movement_type: PlayerMovementType,
}

/// One side of a legacy connection: everything the orchestrator needs to
/// read/write structured frames without knowing about compression,
/// encryption, or the byte stream underneath.
pub struct LegacyConn<S> {
    stream: S,
    read_buf: BytesMut,
    compressor: Compressor,
    encryptor: Option<Cfb8Session>,
    decryptor: Option<Cfb8Session>,
    protocol_version: u8,
    client_data: ClientData,
}

impl<S> LegacyConn<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    pub fn new(stream: S, protocol_version: u8) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
            compressor: compression::select_compressor(protocol_version),
            encryptor: None,
            decryptor: None,
            protocol_version,
            client_data: ClientData::default(),
        }
    }

    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    pub fn client_data(&self) -> &ClientData {
        &self.client_data
    }

    pub fn client_data_mut(&mut self) -> &mut ClientData {
        &mut self.client_data
    }

    pub fn enable_encryption(&mut self, key: [u8; 32]) {
        self.encryptor = Some(Cfb8Session::new(key));
        self.decryptor = Some(Cfb8Session::new(key));
    }

    /// Read one length-prefixed, optionally compressed and encrypted frame
    /// and split it into `(packet_id, payload)`.
    pub async fn read_packet(&mut self) -> Result<(u32, BytesMut), ConnError> {
        loop {
            if let Some(frame) = self.try_take_frame()? {
                let mut buf = frame;
                if let Some(decryptor) = &mut self.decryptor {
                    decryptor.decrypt(&mut buf);
                    decryptor.verify(&buf).map_err(|_| ConnError::Closed)?;
                    buf.truncate(buf.len() - 8);
                }
                let decompressed = compression::decompress(self.compressor, &buf)?;
                let mut payload = BytesMut::from(&decompressed[..]);
                let packet_id = read_varu32(&mut payload)?;
                return Ok((packet_id, payload));
            }
            let mut tmp = [0u8; 4096];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(ConnError::Closed);
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }

    fn try_take_frame(&mut self) -> Result<Option<BytesMut>, ConnError> {
        if self.read_buf.is_empty() {
            return Ok(None);
        }
        let mut peek = self.read_buf.clone();
        let len = match read_varu32(&mut peek) {
            Ok(v) => v as usize,
            Err(_) => return Ok(None),
        };
        let prefix_len = self.read_buf.len() - peek.len();
        if peek.remaining() < len {
            return Ok(None);
        }
        self.read_buf.advance(prefix_len);
        Ok(Some(self.read_buf.split_to(len)))
    }

    pub async fn write_packet(&mut self, packet_id: u32, payload: &[u8]) -> Result<(), ConnError> {
        let mut body = BytesMut::new();
        write_varu32(&mut body, packet_id);
        body.extend_from_slice(payload);

        let compressed = compression::compress(self.compressor, &body)?;
        let mut frame = if let Some(encryptor) = &mut self.encryptor {
            encryptor.encrypt(compressed)
        } else {
            compressed
        };

        let mut framed = BytesMut::new();
        write_varu32(&mut framed, frame.len() as u32);
        framed.extend_from_slice(&frame);

        self.stream.write_all(&framed).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), ConnError> {
        self.stream.flush().await?;
        Ok(())
    }
}
