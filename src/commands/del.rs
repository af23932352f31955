use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Delete one or more keys, whatever variant each holds, and report how many
/// actually existed. `UNLINK` routes here as well.
#[derive(Debug, PartialEq)]
pub struct Del {
    pub keys: Vec<String>,
}

impl Executable for Del {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();
        let mut count = 0;
        for key in self.keys {
            if state.del(&key) {
                count += 1;
            }
        }
        Ok(Frame::Integer(count))
    }
}

impl TryFrom<&mut CommandParser> for Del {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let mut keys = vec![];

        loop {
            match parser.next_string() {
                Ok(key) => keys.push(key),
                Err(CommandParserError::EndOfStream) if !keys.is_empty() => break,
                Err(CommandParserError::EndOfStream) => {
                    return Err(CommandParserError::MissingArguments {
                        command: "DEL",
                        usage: "at least one key",
                    }
                    .into())
                }
                Err(err) => return Err(err.into()),
            }
        }

        Ok(Self { keys })
    }
}
