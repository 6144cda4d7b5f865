//! The single error type every decode path returns.

use std::fmt;

/// Why a decode failed. None of these are recovered from inside the codec.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Fewer bytes were left than a read required.
    StreamTruncated {
        /// Where the read started.
        offset: usize,
        /// How many bytes it needed.
        needed: usize,
    },
    /// A dispatch tag matched none of the candidate constructors.
    UnknownTag {
        /// The raw tag bytes as they appeared on the wire.
        tag: [u8; 4],
        /// Offset of the tag.
        offset: usize,
        /// The type (or `Object`) that was being decoded.
        expected: String,
    },
    /// A length prefix or vector count that cannot be right: the reserved
    /// `0xff` length byte, or a negative count.
    MalformedLength {
        /// Offset of the length.
        offset: usize,
        /// The value read.
        value: i64,
    },
    /// A `random_bytes` field shorter than the configured minimum.
    InsufficientRandomPadding {
        /// Offset of the field.
        offset: usize,
        /// The declared length.
        len: usize,
    },
    /// Well-framed data that failed interpretation (bad JSON in `dataJSON`,
    /// invalid UTF-8 in a `string`).
    Content {
        /// Predicate or primitive being decoded.
        predicate: String,
        /// What went wrong.
        reason: String,
    },
    /// A `gzip_packed` payload that would not inflate, or inflated past the
    /// configured limit.
    Gzip {
        /// Offset of the `gzip_packed` envelope.
        offset: usize,
        /// What went wrong.
        reason: String,
    },
    /// Constructors, vectors or `gzip_packed` envelopes nested deeper than
    /// the configured limit.
    DepthExceeded {
        /// Where the limit was hit.
        offset: usize,
        /// The limit.
        limit: usize,
    },
    /// A type expression the schema does not define.
    UnknownType {
        /// The expression as given.
        name: String,
    },
    /// A schema construct the routine table cannot express.
    Unsupported {
        /// The constructor.
        predicate: String,
        /// What is unsupported.
        reason: String,
    },
}

impl Error {
    /// `true` for failures of the byte framing itself, as opposed to content
    /// or configuration errors.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Self::StreamTruncated { .. }
                | Self::UnknownTag { .. }
                | Self::MalformedLength { .. }
                | Self::InsufficientRandomPadding { .. }
                | Self::Gzip { .. }
                | Self::DepthExceeded { .. }
        )
    }

    pub(crate) fn content(predicate: &str, reason: impl fmt::Display) -> Self {
        Self::Content { predicate: predicate.to_owned(), reason: reason.to_string() }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamTruncated { offset, needed } => {
                write!(f, "stream truncated: needed {needed} bytes at offset {offset}")
            }
            Self::UnknownTag { tag, offset, expected } => write!(
                f,
                "unexpected id {} at offset {offset} while decoding {expected}",
                hex::encode(tag),
            ),
            Self::MalformedLength { offset, value } => {
                write!(f, "malformed length {value} at offset {offset}")
            }
            Self::InsufficientRandomPadding { offset, len } => {
                write!(f, "random_bytes is too small ({len} bytes) at offset {offset}")
            }
            Self::Content { predicate, reason } => write!(f, "invalid {predicate} content: {reason}"),
            Self::Gzip { offset, reason } => write!(f, "gzip_packed at offset {offset}: {reason}"),
            Self::DepthExceeded { offset, limit } => {
                write!(f, "nesting deeper than {limit} levels at offset {offset}")
            }
            Self::UnknownType { name } => write!(f, "unknown type `{name}`"),
            Self::Unsupported { predicate, reason } => write!(f, "{predicate}: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

/// Specialized `Result` for decoding.
pub type Result<T> = std::result::Result<T, Error>;
