//! Client side of the modern upstream link. No CFB8 encryption here — the
//! handshake with the real server happens over whatever secure transport
//! the external RakNet-compatible library already negotiated — but framing
//! and compression selection mirror `relic_protocol_core::LegacyConn`
//! exactly, since both eras share the same length-prefixed frame shape.

use bytes::BytesMut;
use relic_protocol_core::{compress, decompress, read_varu32, write_varu32, Compressor, ConnError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// One side of a connection to the upstream (modern) server: everything
/// the orchestrator needs to read/write structured frames without
/// touching compression or the byte stream underneath.
pub struct ModernConn<S> {
    stream: S,
    read_buf: BytesMut,
    compressor: Compressor,
}

impl<S> ModernConn<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
            compressor: Compressor::None,
        }
    }

    /// Switch compressors once the server's `NetworkSettings`-equivalent
    /// negotiation has picked one. Before that call every frame is sent
    /// and read uncompressed.
    pub fn set_compressor(&mut self, compressor: Compressor) {
        self.compressor = compressor;
    }

    pub async fn read_packet(&mut self) -> Result<(u32, BytesMut), ConnError> {
        loop {
            if let Some(frame) = self.try_take_frame()? {
                let decompressed = decompress(self.compressor, &frame)?;
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
        use bytes::Buf;
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

        let compressed = compress(self.compressor, &body)?;

        let mut framed = BytesMut::new();
        write_varu32(&mut framed, compressed.len() as u32);
        framed.extend_from_slice(&compressed);

        self.stream.write_all(&framed).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), ConnError> {
        self.stream.flush().await?;
        Ok(())
    }
}
