use bytes::Bytes;
use glob_match::glob_match;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// List every live key, in no particular order. An optional glob pattern
/// narrows the result the way `KEYS` does elsewhere; without one, all keys
/// are returned.
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: Option<String>,
}

impl Executable for Keys {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let keys = store.lock().keys();

        let frames = keys
            .into_iter()
            .filter(|key| match &self.pattern {
                Some(pattern) => glob_match(pattern, key),
                None => true,
            })
            .map(|key| Frame::Bulk(Bytes::from(key)))
            .collect();

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = match parser.next_string() {
            Ok(pattern) => Some(pattern),
            Err(CommandParserError::EndOfStream) => None,
            Err(err) => return Err(err.into()),
        };

        Ok(Self { pattern })
    }
}
