use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

#[derive(Debug, PartialEq)]
pub struct Lset {
    pub key: String,
    pub index: i64,
    pub value: Bytes,
}

impl Executable for Lset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        if store.lock().lset(&self.key, self.index, self.value) {
            Ok(Frame::Simple("OK".to_string()))
        } else {
            Ok(Frame::Error("Error: LSET failed".to_string()))
        }
    }
}

impl TryFrom<&mut CommandParser> for Lset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let usage = "key, index and value";
        let key = parser.expect_string("LSET", usage)?;
        let index = parser.expect_integer("LSET", "index", usage)?;
        let value = parser.expect_bytes("LSET", usage)?;

        Ok(Self { key, index, value })
    }
}
