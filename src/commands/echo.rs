use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Reply with the argument verbatim. The reply is a bulk string because the
/// argument arrives as one: bulk strings are length-prefixed and may carry
/// any bytes, including CRLF, which a simple-string reply could not frame.
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub message: Bytes,
}

impl Executable for Echo {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        Ok(Frame::Bulk(self.message))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let message = parser.expect_bytes("ECHO", "a message")?;
        Ok(Self { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_binary_payloads_intact() {
        let echo = Echo {
            message: Bytes::from_static(b"a\r\nb"),
        };

        let reply = echo.exec(Store::new()).unwrap();

        assert_eq!(reply, Frame::Bulk(Bytes::from_static(b"a\r\nb")));
        assert_eq!(reply.serialize(), b"$4\r\na\r\nb\r\n");
    }
}
