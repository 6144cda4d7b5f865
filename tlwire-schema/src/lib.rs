//! Parser for Telegram's [Type Language] schema files and the resolved
//! [`Schema`] model that `tlwire-codec` compiles into decode routines.
//!
//! # Quick start
//!
//! ```rust
//! use tlwire_schema::{Origin, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .add_source("peerChat#36c6019a chat_id:long = Peer;", Origin::Api)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.by_id(0x36c6019a).unwrap().predicate, "peerChat");
//! ```
//!
//! [Type Language]: https://core.telegram.org/mtproto/TL

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Parse and schema assembly errors.
pub mod errors;
pub mod schema;
pub mod tl;
mod iterator;
mod utils;

pub use errors::{ParseError, SchemaError};
pub use schema::{
    Constructor, FlagBit, FlagDescriptor, Origin, Param, ParamKind, Schema, SchemaBuilder,
    TypeDef, TypeExpr, TypeRef,
};

use tl::Definition;

/// Parses a complete schema file, yielding [`Definition`]s one by one.
///
/// `//` comments are skipped. `---functions---` and `---types---` switch the
/// [`tl::Category`] of the definitions that follow. Each item is a `Result` so
/// callers decide whether a bad line is fatal.
pub fn parse_tl_file(contents: &str) -> impl Iterator<Item = Result<Definition, ParseError>> + '_ {
    iterator::TlIterator::new(contents).map(|(_, result)| result)
}

/// The highest `// LAYER N` marker found in `contents`, if any.
pub fn parse_layer(contents: &str) -> Option<i32> {
    contents.lines().filter_map(utils::layer_marker).max()
}
