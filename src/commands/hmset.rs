use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Write several hash fields in one atomic step. Unlike HSET this always
/// answers OK; whether a field was new or replaced is not reported.
#[derive(Debug, PartialEq)]
pub struct Hmset {
    pub key: String,
    pub pairs: Vec<(String, Bytes)>,
}

impl Executable for Hmset {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let mut state = store.lock();
        for (field, value) in self.pairs {
            state.hset(&self.key, field, value);
        }
        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Hmset {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let usage = "key and field value pairs";
        let key = parser.expect_string("HMSET", usage)?;

        let mut pairs = vec![];
        loop {
            let field = match parser.next_string() {
                Ok(field) => field,
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };
            // A field with no value is an unpaired tail.
            let value = parser.expect_bytes("HMSET", usage)?;
            pairs.push((field, value));
        }

        if pairs.is_empty() {
            return Err(CommandParserError::MissingArguments {
                command: "HMSET",
                usage,
            }
            .into());
        }

        Ok(Self { key, pairs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    fn request(tokens: &[&str]) -> Frame {
        Frame::Array(
            tokens
                .iter()
                .map(|token| Frame::Bulk(Bytes::copy_from_slice(token.as_bytes())))
                .collect(),
        )
    }

    #[test]
    fn parses_field_value_pairs() {
        let cmd = Command::try_from(request(&["HMSET", "h", "f1", "v1", "f2", "v2"])).unwrap();
        assert_eq!(
            cmd,
            Command::Hmset(Hmset {
                key: "h".to_string(),
                pairs: vec![
                    ("f1".to_string(), Bytes::from("v1")),
                    ("f2".to_string(), Bytes::from("v2")),
                ],
            })
        );
    }

    #[test]
    fn rejects_unpaired_tail() {
        let err = Command::try_from(request(&["HMSET", "h", "f1", "v1", "f2"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: HMSET requires key and field value pairs"
        );
    }

    #[test]
    fn rejects_key_without_pairs() {
        let err = Command::try_from(request(&["HMSET", "h"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: HMSET requires key and field value pairs"
        );
    }

    #[test]
    fn writes_every_pair() {
        let store = Store::new();
        let hmset = Hmset {
            key: "h".to_string(),
            pairs: vec![
                ("f1".to_string(), Bytes::from("v1")),
                ("f2".to_string(), Bytes::from("v2")),
            ],
        };

        assert_eq!(
            hmset.exec(store.clone()).unwrap(),
            Frame::Simple("OK".to_string())
        );
        assert_eq!(store.lock().hlen("h"), 2);
        assert_eq!(store.lock().hget("h", "f2"), Some(Bytes::from("v2")));
    }
}
