use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Clear every key, every value variant and every deadline.
#[derive(Debug, PartialEq)]
pub struct FlushAll;

impl Executable for FlushAll {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        store.lock().flush_all();
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for FlushAll {
    type Error = Error;

    fn try_from(_parser: &mut CommandParser) -> Result<Self, Self::Error> {
        Ok(Self)
    }
}
