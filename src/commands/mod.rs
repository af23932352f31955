pub mod del;
pub mod echo;
pub mod executable;
pub mod expire;
pub mod flushall;
pub mod get;
pub mod hdel;
pub mod hexists;
pub mod hget;
pub mod hgetall;
pub mod hkeys;
pub mod hlen;
pub mod hmset;
pub mod hset;
pub mod hvals;
pub mod keys;
pub mod lindex;
pub mod llen;
pub mod lpop;
pub mod lpush;
pub mod lrem;
pub mod lset;
pub mod ping;
pub mod rename;
pub mod rpop;
pub mod rpush;
pub mod set;
pub mod type_;

use bytes::Bytes;
use std::{str, vec};
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use del::Del;
use echo::Echo;
use expire::Expire;
use flushall::FlushAll;
use get::Get;
use hdel::Hdel;
use hexists::Hexists;
use hget::Hget;
use hgetall::Hgetall;
use hkeys::Hkeys;
use hlen::Hlen;
use hmset::Hmset;
use hset::Hset;
use hvals::Hvals;
use keys::Keys;
use lindex::Lindex;
use llen::Llen;
use lpop::Lpop;
use lpush::Lpush;
use lrem::Lrem;
use lset::Lset;
use ping::Ping;
use rename::Rename;
use rpop::Rpop;
use rpush::Rpush;
use set::Set;
use type_::Type;

#[derive(Debug, PartialEq)]
pub enum Command {
    Ping(Ping),
    Echo(Echo),
    FlushAll(FlushAll),
    Set(Set),
    Get(Get),
    Keys(Keys),
    Type(Type),
    Del(Del),
    Expire(Expire),
    Rename(Rename),
    Llen(Llen),
    Lpush(Lpush),
    Rpush(Rpush),
    Lpop(Lpop),
    Rpop(Rpop),
    Lrem(Lrem),
    Lindex(Lindex),
    Lset(Lset),
    Hset(Hset),
    Hget(Hget),
    Hexists(Hexists),
    Hdel(Hdel),
    Hgetall(Hgetall),
    Hkeys(Hkeys),
    Hvals(Hvals),
    Hlen(Hlen),
    Hmset(Hmset),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Ping(cmd) => cmd.exec(store),
            Command::Echo(cmd) => cmd.exec(store),
            Command::FlushAll(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Keys(cmd) => cmd.exec(store),
            Command::Type(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Expire(cmd) => cmd.exec(store),
            Command::Rename(cmd) => cmd.exec(store),
            Command::Llen(cmd) => cmd.exec(store),
            Command::Lpush(cmd) => cmd.exec(store),
            Command::Rpush(cmd) => cmd.exec(store),
            Command::Lpop(cmd) => cmd.exec(store),
            Command::Rpop(cmd) => cmd.exec(store),
            Command::Lrem(cmd) => cmd.exec(store),
            Command::Lindex(cmd) => cmd.exec(store),
            Command::Lset(cmd) => cmd.exec(store),
            Command::Hset(cmd) => cmd.exec(store),
            Command::Hget(cmd) => cmd.exec(store),
            Command::Hexists(cmd) => cmd.exec(store),
            Command::Hdel(cmd) => cmd.exec(store),
            Command::Hgetall(cmd) => cmd.exec(store),
            Command::Hkeys(cmd) => cmd.exec(store),
            Command::Hvals(cmd) => cmd.exec(store),
            Command::Hlen(cmd) => cmd.exec(store),
            Command::Hmset(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands as RESP arrays of bulk strings.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(Box::new(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                }))
            }
        };

        if frames.is_empty() {
            return Err(Box::new(CommandParserError::EmptyCommand));
        }

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        match &command_name[..] {
            "ping" => Ping::try_from(parser).map(Command::Ping),
            "echo" => Echo::try_from(parser).map(Command::Echo),
            "flushall" => FlushAll::try_from(parser).map(Command::FlushAll),
            "set" => Set::try_from(parser).map(Command::Set),
            "get" => Get::try_from(parser).map(Command::Get),
            "keys" => Keys::try_from(parser).map(Command::Keys),
            "type" => Type::try_from(parser).map(Command::Type),
            "del" | "unlink" => Del::try_from(parser).map(Command::Del),
            "expire" => Expire::try_from(parser).map(Command::Expire),
            "rename" => Rename::try_from(parser).map(Command::Rename),
            "llen" => Llen::try_from(parser).map(Command::Llen),
            "lpush" => Lpush::try_from(parser).map(Command::Lpush),
            "rpush" => Rpush::try_from(parser).map(Command::Rpush),
            "lpop" => Lpop::try_from(parser).map(Command::Lpop),
            "rpop" => Rpop::try_from(parser).map(Command::Rpop),
            "lrem" => Lrem::try_from(parser).map(Command::Lrem),
            "lindex" => Lindex::try_from(parser).map(Command::Lindex),
            "lset" => Lset::try_from(parser).map(Command::Lset),
            "hset" => Hset::try_from(parser).map(Command::Hset),
            "hget" => Hget::try_from(parser).map(Command::Hget),
            "hexists" => Hexists::try_from(parser).map(Command::Hexists),
            "hdel" => Hdel::try_from(parser).map(Command::Hdel),
            "hgetall" => Hgetall::try_from(parser).map(Command::Hgetall),
            "hkeys" => Hkeys::try_from(parser).map(Command::Hkeys),
            "hvals" => Hvals::try_from(parser).map(Command::Hvals),
            "hlen" => Hlen::try_from(parser).map(Command::Hlen),
            "hmset" => Hmset::try_from(parser).map(Command::Hmset),
            _ => Err(Box::new(CommandParserError::UnknownCommand {
                command: command_name.to_uppercase(),
            })),
        }
    }
}

pub(crate) struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.parts.next().ok_or(CommandParserError::EmptyCommand)?;

        match command_name {
            Frame::Simple(s) => Ok(s.to_lowercase()),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// Like `next_string`, but an exhausted frame becomes the command's own
    /// arity error instead of a bare end-of-stream.
    fn expect_string(
        &mut self,
        command: &'static str,
        usage: &'static str,
    ) -> Result<String, CommandParserError> {
        match self.next_string() {
            Err(CommandParserError::EndOfStream) => {
                Err(CommandParserError::MissingArguments { command, usage })
            }
            other => other,
        }
    }

    fn expect_bytes(
        &mut self,
        command: &'static str,
        usage: &'static str,
    ) -> Result<Bytes, CommandParserError> {
        match self.next_bytes() {
            Err(CommandParserError::EndOfStream) => {
                Err(CommandParserError::MissingArguments { command, usage })
            }
            other => other,
        }
    }

    fn expect_integer(
        &mut self,
        command: &'static str,
        what: &'static str,
        usage: &'static str,
    ) -> Result<i64, CommandParserError> {
        let token = self.expect_string(command, usage)?;
        token
            .parse::<i64>()
            .map_err(|_| CommandParserError::InvalidNumber { command, what })
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("Error: Empty command")]
    EmptyCommand,
    #[error("Error: Unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("Error: {command} requires {usage}")]
    MissingArguments {
        command: &'static str,
        usage: &'static str,
    },
    #[error("Error: Invalid {what} for {command}")]
    InvalidNumber {
        command: &'static str,
        what: &'static str,
    },
    #[error("protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}
