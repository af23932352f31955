use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Move a key to a new name, taking its deadline along and overwriting
/// whatever the destination held.
#[derive(Debug, PartialEq)]
pub struct Rename {
    pub old_key: String,
    pub new_key: String,
}

impl Executable for Rename {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        if store.lock().rename(&self.old_key, &self.new_key) {
            Ok(Frame::Simple("OK".to_string()))
        } else {
            Ok(Frame::Error("Error: RENAME failed".to_string()))
        }
    }
}

impl TryFrom<&mut CommandParser> for Rename {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let old_key = parser.expect_string("RENAME", "old and new key names")?;
        let new_key = parser.expect_string("RENAME", "old and new key names")?;

        Ok(Self { old_key, new_key })
    }
}
