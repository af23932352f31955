use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Attach a deadline `seconds` from now to a live key. The key becomes
/// logically absent once the deadline passes; storage is reclaimed on the
/// next access.
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: String,
    pub seconds: u64,
}

impl Executable for Expire {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        if store.lock().expire(&self.key, self.seconds) {
            Ok(Frame::Simple("OK".to_string()))
        } else {
            Ok(Frame::Error("Error: EXPIRE failed".to_string()))
        }
    }
}

impl TryFrom<&mut CommandParser> for Expire {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.expect_string("EXPIRE", "key and seconds")?;
        let seconds = parser
            .expect_string("EXPIRE", "key and seconds")?
            .parse::<u64>()
            .map_err(|_| CommandParserError::InvalidNumber {
                command: "EXPIRE",
                what: "seconds",
            })?;

        Ok(Self { key, seconds })
    }
}
