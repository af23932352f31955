use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::Decoder;

use crate::frame::{self, Frame};
use crate::Error;

/// Decodes any RESP2 frame out of the buffer. Used wherever replies (or
/// arbitrary frames) are read back, e.g. by clients in tests.
pub struct FrameCodec;

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            // Not enough data yet; leave the buffer untouched and wait.
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let position = cursor.position() as usize;
        src.advance(position);

        Ok(Some(frame))
    }
}

/// Decodes client requests: an array of bulk strings when the frame starts
/// with `*`, otherwise one whitespace-split inline line. Anything else is a
/// framing violation and the connection must be closed by the caller.
pub struct RequestCodec;

impl Decoder for RequestCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(first_byte) = src.first() else {
            return Ok(None);
        };

        if *first_byte != b'*' {
            return decode_inline(src);
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let position = cursor.position() as usize;
        src.advance(position);

        Ok(Some(expect_request(frame)?))
    }
}

/// Inline commands span exactly one line, terminated by CRLF or a bare LF.
fn decode_inline(src: &mut BytesMut) -> Result<Option<Frame>, Error> {
    let Some(newline) = src.iter().position(|byte| *byte == b'\n') else {
        return Ok(None);
    };

    let frame = Frame::parse_inline(&src[..newline]);
    src.advance(newline + 1);

    Ok(Some(frame))
}

fn expect_request(frame: Frame) -> Result<Frame, Error> {
    let Frame::Array(ref tokens) = frame else {
        return Err(frame::Error::Malformed("request is not an array".to_string()).into());
    };

    // The request grammar only allows `$`-prefixed tokens with a length of
    // zero or more; a null bulk cannot name a command or an argument.
    if tokens.iter().any(|token| !matches!(token, Frame::Bulk(_))) {
        return Err(
            frame::Error::Malformed("request array must contain only bulk strings".to_string())
                .into(),
        );
    }

    Ok(frame)
}
