use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

#[derive(Debug, PartialEq)]
pub struct Hexists {
    pub key: String,
    pub field: String,
}

impl Executable for Hexists {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let exists = store.lock().hexists(&self.key, &self.field);
        Ok(Frame::Integer(i64::from(exists)))
    }
}

impl TryFrom<&mut CommandParser> for Hexists {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let usage = "key and field";
        let key = parser.expect_string("HEXISTS", usage)?;
        let field = parser.expect_string("HEXISTS", usage)?;

        Ok(Self { key, field })
    }
}
