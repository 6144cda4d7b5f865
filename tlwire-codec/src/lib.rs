//! Schema-driven decoder for Telegram's binary TL wire format.
//!
//! A [`Decoder`] is built once from a [`tlwire_schema::Schema`]; it compiles
//! every type and constructor into a table of decode routines and then turns
//! bytes into [`Value`]s.
//!
//! # Overview
//!
//! | Module          | Contents                                                 |
//! |-----------------|----------------------------------------------------------|
//! | [`cursor`]      | [`Cursor`], the position-tracking byte source            |
//! | [`primitive`]   | [`Deserializable`] and the `bytes`/`string` framing      |
//! | [`serialize`]   | [`Serializable`], the matching writer                    |
//! | [`gzip`]        | `gzip_packed` inflation                                  |
//! | [`value`]       | [`Value`], the decoded result                            |
//! | [`special`]     | peer ids, stripped thumbnails, waveforms                 |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tlwire_codec::{Decoder, DecoderConfig, Serializable};
//! use tlwire_schema::{Origin, SchemaBuilder};
//!
//! let schema = SchemaBuilder::new()
//!     .add_source("pong#347773c5 msg_id:long ping_id:long = Pong;", Origin::MtProto)?
//!     .build()?;
//! let decoder = Decoder::new(Arc::new(schema), DecoderConfig::default())?;
//!
//! let mut wire = 0x347773c5u32.to_bytes();
//! 1i64.serialize(&mut wire);
//! 2i64.serialize(&mut wire);
//!
//! let pong = decoder.decode_object(&wire)?;
//! assert_eq!(pong.predicate(), Some("pong"));
//! assert_eq!(pong.get("ping_id").and_then(|v| v.as_long()), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cursor;
pub mod gzip;
pub mod primitive;
pub mod serialize;
pub mod special;
pub mod value;
mod config;
mod decoder;
mod error;
mod plan;

pub use config::DecoderConfig;
pub use cursor::{Buffer, Cursor};
pub use decoder::Decoder;
pub use error::{Error, Result};
pub use primitive::Deserializable;
pub use serialize::{Serializable, gzip_packed};
pub use value::{Object, Value};

/// Constructor ids the codec handles itself.
pub mod ids {
    /// `boolTrue#997275b5 = Bool`
    pub const BOOL_TRUE: u32 = 0x997275b5;
    /// `boolFalse#bc799737 = Bool`
    pub const BOOL_FALSE: u32 = 0xbc799737;
    /// `vector#1cb5c415 {t:Type} # [ t ] = Vector t`
    pub const VECTOR: u32 = 0x1cb5c415;
    /// `gzip_packed#3072cfa1 packed_data:bytes = Object`
    pub const GZIP_PACKED: u32 = 0x3072cfa1;
}

/// Bare vector: `vector<T>` (lowercase), a count and the elements with no
/// `0x1cb5c415` tag in front.
#[derive(Clone, Debug, PartialEq)]
pub struct RawVec<T>(pub Vec<T>);
