use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Decoder;

use crate::codec::{FrameCodec, RequestCodec};
use crate::frame::Frame;
use crate::Error;

/// Reads frames from and writes frames to one `TcpStream`. Data is read from
/// the socket into the buffer in bounded chunks; a frame is decoded (and its
/// bytes consumed) as soon as the buffer holds a complete one, so pipelined
/// requests carry over between calls.
pub struct Connection {
    stream: TcpStream,
    buffer: BytesMut,
}

/// Bytes requested from the socket per read syscall. The buffer still grows
/// across reads when a single frame is larger than one chunk.
const READ_CHUNK_SIZE: usize = 1024;

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Read one client request (framed array or inline line).
    ///
    /// Returns `Ok(None)` when the peer cleanly closed the connection. A
    /// malformed request surfaces as `Err`; the stream is unusable afterwards
    /// because the framing boundary is lost.
    pub async fn read_request(&mut self) -> Result<Option<Frame>, Error> {
        self.read_with(&mut RequestCodec).await
    }

    /// Read any RESP2 frame; this is the client-side view of a conversation.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.read_with(&mut FrameCodec).await
    }

    async fn read_with(
        &mut self,
        codec: &mut impl Decoder<Item = Frame, Error = Error>,
    ) -> Result<Option<Frame>, Error> {
        loop {
            if let Some(frame) = codec.decode(&mut self.buffer)? {
                return Ok(Some(frame));
            }

            self.buffer.reserve(READ_CHUNK_SIZE);
            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                // The peer closed the socket mid-frame.
                return Err("connection reset by peer".into());
            }
        }
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> std::io::Result<()> {
        self.stream.write_all(&frame.serialize()).await?;
        self.stream.flush().await
    }
}
