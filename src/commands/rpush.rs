use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::lpush::parse_push_args;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Append values to the list at `key`, creating it when absent.
#[derive(Debug, PartialEq)]
pub struct Rpush {
    pub key: String,
    pub values: Vec<Bytes>,
}

impl Executable for Rpush {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let len = store.lock().rpush(&self.key, self.values);
        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Rpush {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let (key, values) = parse_push_args(parser, "RPUSH")?;
        Ok(Self { key, values })
    }
}
