//! IRC message parsing.

mod nom_parser;
mod types;

pub use self::types::Message;
