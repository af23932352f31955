use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Element at `index`, where -1 addresses the tail. Out-of-range indices and
/// missing keys answer with a null bulk.
#[derive(Debug, PartialEq)]
pub struct Lindex {
    pub key: String,
    pub index: i64,
}

impl Executable for Lindex {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match store.lock().lindex(&self.key, self.index) {
            Some(value) => Ok(Frame::Bulk(value)),
            None => Ok(Frame::Null),
        }
    }
}

impl TryFrom<&mut CommandParser> for Lindex {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let usage = "key and index";
        let key = parser.expect_string("LINDEX", usage)?;
        let index = parser.expect_integer("LINDEX", "index", usage)?;

        Ok(Self { key, index })
    }
}
