use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Remove one field; deleting the last field deletes the key itself.
#[derive(Debug, PartialEq)]
pub struct Hdel {
    pub key: String,
    pub field: String,
}

impl Executable for Hdel {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let removed = store.lock().hdel(&self.key, &self.field);
        Ok(Frame::Integer(i64::from(removed)))
    }
}

impl TryFrom<&mut CommandParser> for Hdel {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let usage = "key and field";
        let key = parser.expect_string("HDEL", usage)?;
        let field = parser.expect_string("HDEL", usage)?;

        Ok(Self { key, field })
    }
}
