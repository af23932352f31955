use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Remove occurrences of `value` from the list at `key`. A positive count
/// removes from the head, a negative count from the tail, zero removes all.
/// Replies with the number of elements removed.
#[derive(Debug, PartialEq)]
pub struct Lrem {
    pub key: String,
    pub count: i64,
    pub value: Bytes,
}

impl Executable for Lrem {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let removed = store.lock().lrem(&self.key, self.count, &self.value);
        Ok(Frame::Integer(removed as i64))
    }
}

impl TryFrom<&mut CommandParser> for Lrem {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let usage = "key, count and value";
        let key = parser.expect_string("LREM", usage)?;
        let count = parser.expect_integer("LREM", "count", usage)?;
        let value = parser.expect_bytes("LREM", usage)?;

        Ok(Self { key, count, value })
    }
}
