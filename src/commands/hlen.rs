use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

#[derive(Debug, PartialEq)]
pub struct Hlen {
    pub key: String,
}

impl Executable for Hlen {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let len = store.lock().hlen(&self.key);
        Ok(Frame::Integer(len as i64))
    }
}

impl TryFrom<&mut CommandParser> for Hlen {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.expect_string("HLEN", "a key")?;
        Ok(Self { key })
    }
}
