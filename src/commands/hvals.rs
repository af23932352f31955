use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

#[derive(Debug, PartialEq)]
pub struct Hvals {
    pub key: String,
}

impl Executable for Hvals {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let values = store.lock().hvals(&self.key);

        let frames = values.into_iter().map(Frame::Bulk).collect();

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Hvals {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.expect_string("HVALS", "a key")?;
        Ok(Self { key })
    }
}
