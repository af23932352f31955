use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Prepend values to the list at `key`, creating it when absent. Values are
/// pushed one by one in argument order, so the last argument lands at the
/// head of the list.
#[derive(Debug, PartialEq)]
pub struct Lpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Lpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let len = store.lock().lpush(&self.key, self.values);
        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let (key, values) = parse_push_args(parser, "LPUSH")?;
        Ok(Self { key, values })
    }
}

pub(super) fn parse_push_args(
    parser: &mut CommandParser,
    command: &'static str,
) -> Result<(String, Vec<Bytes>), Error> {
    let usage = "key and at least one value";
    let key = parser.expect_string(command, usage)?;

    let mut values = vec![];
    loop {
        match parser.next_bytes() {
            Ok(value) => values.push(value),
            Err(CommandParserError::EndOfStream) if !values.is_empty() => break,
            Err(CommandParserError::EndOfStream) => {
                return Err(CommandParserError::MissingArguments { command, usage }.into())
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok((key, values))
}
