// https://redis.io/docs/reference/protocol-spec

use std::fmt;

use bytes::{Buf, Bytes};
use std::io::Cursor;
use std::string::FromUtf8Error;
use thiserror::Error as ThisError;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0}")]
    InvalidDataType(u8),
    #[error("protocol error; {0}")]
    Malformed(String),
}

/// A RESP2 frame. Requests arrive as `Array`s of `Bulk` tokens; every variant
/// can appear in a reply. `Null` is the distinguished `$-1\r\n` bulk string.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// Parse one frame out of `src`, leaving the cursor just past it.
    ///
    /// Returns `Error::Incomplete` when the buffer does not yet hold a whole
    /// frame; the caller should read more bytes and retry from the same
    /// starting position.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let first_byte = next_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            DataType::SimpleString => {
                let bytes = next_line(src)?.to_vec();
                Ok(Frame::Simple(String::from_utf8(bytes)?))
            }
            DataType::SimpleError => {
                let bytes = next_line(src)?.to_vec();
                Ok(Frame::Error(String::from_utf8(bytes)?))
            }
            DataType::Integer => {
                let integer = parse_decimal(next_line(src)?)?;
                Ok(Frame::Integer(integer))
            }
            // $<length>\r\n<data>\r\n
            DataType::BulkString => {
                let length = parse_decimal(next_line(src)?)?;

                if length == -1 {
                    return Ok(Frame::Null);
                }
                if length < 0 {
                    return Err(Error::Malformed(format!("invalid bulk length {}", length)));
                }

                let length = length as usize;
                let start = src.position() as usize;
                if src.get_ref().len() < start + length + CRLF.len() {
                    return Err(Error::Incomplete);
                }

                let data = Bytes::copy_from_slice(&src.get_ref()[start..start + length]);
                if &src.get_ref()[start + length..start + length + CRLF.len()] != CRLF {
                    return Err(Error::Malformed(
                        "bulk string is not CRLF terminated".to_string(),
                    ));
                }
                src.set_position((start + length + CRLF.len()) as u64);

                Ok(Frame::Bulk(data))
            }
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = parse_decimal(next_line(src)?)?;

                if length == -1 {
                    return Ok(Frame::Null);
                }
                if length < 0 {
                    return Err(Error::Malformed(format!("invalid array length {}", length)));
                }

                let mut frames = Vec::with_capacity(length as usize);
                for _ in 0..length {
                    frames.push(Self::parse(src)?);
                }

                Ok(Frame::Array(frames))
            }
        }
    }

    /// Fallback parse for interactive clients: split one line on ASCII
    /// whitespace and treat every word as a bulk token. The line is everything
    /// up to (and excluding) the terminating newline; a trailing CR is
    /// stripped so both CRLF and bare LF terminators work.
    pub fn parse_inline(line: &[u8]) -> Frame {
        let line = match line.last() {
            Some(b'\r') => &line[..line.len() - 1],
            _ => line,
        };

        let tokens = line
            .split(|byte| byte.is_ascii_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| Frame::Bulk(Bytes::copy_from_slice(token)))
            .collect();

        Frame::Array(tokens)
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let repr = i.to_string();
                let mut bytes = Vec::with_capacity(1 + repr.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(repr.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(data) => {
                let length = data.len().to_string();
                let mut bytes =
                    Vec::with_capacity(1 + length.len() + CRLF.len() + data.len() + CRLF.len());
                bytes.push(u8::from(DataType::BulkString));
                bytes.extend_from_slice(length.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Null => b"$-1\r\n".to_vec(),
            Frame::Array(frames) => {
                let length = frames.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in frames {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(bytes) => write!(f, "${}", String::from_utf8_lossy(bytes)),
            Frame::Null => write!(f, "$-1"),
            Frame::Array(frames) => {
                write!(f, "*{}", frames.len())?;
                for frame in frames {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
        }
    }
}

fn next_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    let line_end = src.get_ref()[start..end]
        .windows(CRLF.len())
        .position(|window| window == CRLF)
        .map(|index| start + index)
        .ok_or(Error::Incomplete)?;

    src.set_position((line_end + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..line_end])
}

fn next_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

fn parse_decimal(bytes: &[u8]) -> Result<i64, Error> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            Error::Malformed(format!(
                "invalid decimal {:?}",
                String::from_utf8_lossy(bytes)
            ))
        })
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}

impl From<FromUtf8Error> for Error {
    fn from(_src: FromUtf8Error) -> Error {
        Error::Malformed("invalid UTF-8 string".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(data: &[u8]) -> Result<Frame, Error> {
        let mut cursor = Cursor::new(data);
        Frame::parse(&mut cursor)
    }

    #[test]
    fn parse_simple_string_frame() {
        assert!(matches!(parse(b"+OK\r\n"), Ok(Frame::Simple(ref s)) if s == "OK"));
    }

    #[test]
    fn parse_simple_error_frame() {
        assert!(matches!(
            parse(b"-Error message\r\n"),
            Ok(Frame::Error(ref s)) if s == "Error message"
        ));
    }

    #[test]
    fn parse_integer_frames() {
        assert!(matches!(parse(b":1000\r\n"), Ok(Frame::Integer(1000))));
        assert!(matches!(parse(b":-1000\r\n"), Ok(Frame::Integer(-1000))));
        assert!(matches!(parse(b":0\r\n"), Ok(Frame::Integer(0))));
    }

    #[test]
    fn parse_bulk_string_frame() {
        assert!(matches!(
            parse(b"$6\r\nfoobar\r\n"),
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from("foobar")
        ));
    }

    #[test]
    fn parse_bulk_string_frame_empty() {
        assert!(matches!(
            parse(b"$0\r\n\r\n"),
            Ok(Frame::Bulk(ref b)) if b.is_empty()
        ));
    }

    #[test]
    fn parse_bulk_string_frame_with_binary_payload() {
        assert!(matches!(
            parse(b"$4\r\na\r\nb\r\n"),
            Ok(Frame::Bulk(ref b)) if b == &Bytes::from_static(b"a\r\nb")
        ));
    }

    #[test]
    fn parse_bulk_string_frame_null() {
        assert!(matches!(parse(b"$-1\r\n"), Ok(Frame::Null)));
    }

    #[test]
    fn parse_array_frame_empty() {
        assert!(matches!(parse(b"*0\r\n"), Ok(Frame::Array(ref a)) if a.is_empty()));
    }

    #[test]
    fn parse_array_frame() {
        let frame = parse(b"*2\r\n$5\r\nhello\r\n$5\r\nworld\r\n").unwrap();

        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("hello")),
                Frame::Bulk(Bytes::from("world")),
            ])
        );
    }

    #[test]
    fn parse_array_frame_null() {
        assert!(matches!(parse(b"*-1\r\n"), Ok(Frame::Null)));
    }

    #[test]
    fn parse_incomplete_frames() {
        assert!(matches!(parse(b""), Err(Error::Incomplete)));
        assert!(matches!(parse(b"+OK"), Err(Error::Incomplete)));
        assert!(matches!(parse(b"$6\r\nfoo"), Err(Error::Incomplete)));
        assert!(matches!(
            parse(b"*2\r\n$5\r\nhello\r\n"),
            Err(Error::Incomplete)
        ));
    }

    #[test]
    fn parse_rejects_unknown_data_type() {
        assert!(matches!(parse(b"~3\r\n"), Err(Error::InvalidDataType(b'~'))));
    }

    #[test]
    fn parse_rejects_bad_length() {
        assert!(matches!(parse(b"$abc\r\nfoo\r\n"), Err(Error::Malformed(_))));
        assert!(matches!(parse(b"$-2\r\n"), Err(Error::Malformed(_))));
    }

    #[test]
    fn parse_consumes_exactly_one_frame() {
        let data = b"+OK\r\n:42\r\n";
        let mut cursor = Cursor::new(&data[..]);

        let first = Frame::parse(&mut cursor).unwrap();
        assert_eq!(first, Frame::Simple("OK".to_string()));
        assert_eq!(cursor.position(), 5);

        let second = Frame::parse(&mut cursor).unwrap();
        assert_eq!(second, Frame::Integer(42));
    }

    #[test]
    fn parse_inline_splits_on_whitespace() {
        let frame = Frame::parse_inline(b"SET foo bar");
        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("SET")),
                Frame::Bulk(Bytes::from("foo")),
                Frame::Bulk(Bytes::from("bar")),
            ])
        );
    }

    #[test]
    fn parse_inline_strips_trailing_cr() {
        let frame = Frame::parse_inline(b"PING\r");
        assert_eq!(frame, Frame::Array(vec![Frame::Bulk(Bytes::from("PING"))]));
    }

    #[test]
    fn parse_inline_collapses_repeated_whitespace() {
        let frame = Frame::parse_inline(b"  GET   foo ");
        assert_eq!(
            frame,
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("GET")),
                Frame::Bulk(Bytes::from("foo")),
            ])
        );
    }

    #[test]
    fn parse_inline_empty_line() {
        assert_eq!(Frame::parse_inline(b""), Frame::Array(vec![]));
        assert_eq!(Frame::parse_inline(b"   \r"), Frame::Array(vec![]));
    }

    #[test]
    fn serialize_reply_frames() {
        assert_eq!(Frame::Simple("PONG".to_string()).serialize(), b"+PONG\r\n");
        assert_eq!(
            Frame::Error("Error: RENAME failed".to_string()).serialize(),
            b"-Error: RENAME failed\r\n"
        );
        assert_eq!(Frame::Integer(3).serialize(), b":3\r\n");
        assert_eq!(Frame::Bulk(Bytes::from("bar")).serialize(), b"$3\r\nbar\r\n");
        assert_eq!(Frame::Null.serialize(), b"$-1\r\n");
        assert_eq!(
            Frame::Array(vec![
                Frame::Bulk(Bytes::from("f1")),
                Frame::Bulk(Bytes::from("v1")),
            ])
            .serialize(),
            b"*2\r\n$2\r\nf1\r\n$2\r\nv1\r\n"
        );
    }

    #[test]
    fn serialize_then_parse_round_trips() {
        let frame = Frame::Array(vec![
            Frame::Bulk(Bytes::from("L")),
            Frame::Bulk(Bytes::from("my list")),
            Frame::Bulk(Bytes::from_static(b"a:b\r\nc")),
        ]);

        let bytes = frame.serialize();
        let parsed = parse(&bytes).unwrap();

        assert_eq!(parsed, frame);
    }
}
