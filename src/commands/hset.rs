use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Insert or overwrite one field in the hash at `key`, creating the hash
/// when absent. Replies 1 when the field is new, 0 when it replaced an
/// existing one.
#[derive(Debug, PartialEq)]
pub struct Hset {
    pub key: String,
    pub field: String,
    pub value: Bytes,
}

impl Executable for Hset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let created = store.lock().hset(&self.key, self.field, self.value);
        Ok(Frame::Integer(i64::from(created)))
    }
}

impl TryFrom<&mut CommandParser> for Hset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let usage = "key, field and value";
        let key = parser.expect_string("HSET", usage)?;
        let field = parser.expect_string("HSET", usage)?;
        let value = parser.expect_bytes("HSET", usage)?;

        Ok(Self { key, field, value })
    }
}
