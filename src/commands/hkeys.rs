use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

#[derive(Debug, PartialEq)]
pub struct Hkeys {
    pub key: String,
}

impl Executable for Hkeys {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let fields = store.lock().hkeys(&self.key);

        let frames = fields
            .into_iter()
            .map(|field| Frame::Bulk(Bytes::from(field)))
            .collect();

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Hkeys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.expect_string("HKEYS", "a key")?;
        Ok(Self { key })
    }
}
