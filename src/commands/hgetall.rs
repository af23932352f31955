use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// All fields and values of the hash at `key`, flattened into one array of
/// alternating field and value bulks. Pair order is unspecified.
#[derive(Debug, PartialEq)]
pub struct Hgetall {
    pub key: String,
}

impl Executable for Hgetall {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let pairs = store.lock().hgetall(&self.key);

        let mut frames = Vec::with_capacity(pairs.len() * 2);
        for (field, value) in pairs {
            frames.push(Frame::Bulk(Bytes::from(field)));
            frames.push(Frame::Bulk(value));
        }

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for Hgetall {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.expect_string("HGETALL", "a key")?;
        Ok(Self { key })
    }
}
