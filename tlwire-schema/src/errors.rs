use std::fmt;
use std::num::ParseIntError;

/// Errors produced while parsing a single parameter token.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamParseError {
    /// An empty name or type where one was required.
    Empty,
    /// `{X:Type}`. Not a failure: it declares a generic for later `!X` uses.
    TypeDef {
        /// The generic's name, `X` in `{X:Type}`.
        name: String,
    },
    /// A `{...}` block that is not `{X:Type}`, or a reference to an
    /// undeclared generic or flag word.
    MissingDef,
    /// A malformed `name.N?Type` expression.
    InvalidFlag,
    /// A `<` without its closing `>`.
    InvalidGeneric,
    /// A token without `:type`, as in the builtin `int ? = Int` lines.
    NotImplemented,
}

impl fmt::Display for ParamParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty token"),
            Self::TypeDef { name } => write!(f, "generic type definition: {name}"),
            Self::MissingDef => write!(f, "reference to an undeclared generic or flag word"),
            Self::InvalidFlag => write!(f, "invalid flag expression"),
            Self::InvalidGeneric => write!(f, "unclosed `<` in generic argument"),
            Self::NotImplemented => write!(f, "parameter without `:type`"),
        }
    }
}

impl std::error::Error for ParamParseError {}

/// Errors produced while parsing one schema definition.
#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// The definition was blank.
    Empty,
    /// No `= Type` part.
    MissingType,
    /// Missing name, or empty namespace components.
    MissingName,
    /// The `#id` was not valid hex.
    InvalidId(ParseIntError),
    /// One of the parameters was invalid.
    InvalidParam(ParamParseError),
    /// Builtin syntax the schema model does not represent (`vector {t:Type} # [ t ]`).
    NotImplemented,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty definition"),
            Self::MissingType => write!(f, "missing `= Type`"),
            Self::MissingName => write!(f, "missing or malformed name"),
            Self::InvalidId(e) => write!(f, "invalid constructor id: {e}"),
            Self::InvalidParam(e) => write!(f, "invalid parameter: {e}"),
            Self::NotImplemented => write!(f, "unsupported TL syntax"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidId(e) => Some(e),
            Self::InvalidParam(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors produced while assembling a [`crate::Schema`].
#[derive(Debug, PartialEq)]
pub enum SchemaError {
    /// A definition in a source failed to parse.
    Parse {
        /// 1-based line where the failing definition ends.
        line: usize,
        /// What went wrong.
        source: ParseError,
    },
    /// A parameter names a type or predicate that no source defines.
    UnresolvedType {
        /// The constructor holding the parameter.
        predicate: String,
        /// The parameter.
        param: String,
        /// The missing name.
        name: String,
    },
    /// A parameter type the schema model cannot represent (`Vector` with no
    /// element type).
    InvalidParam {
        /// The constructor holding the parameter.
        predicate: String,
        /// What went wrong.
        source: ParamParseError,
    },
    /// `%Type` used on a type that does not have exactly one constructor.
    AmbiguousBareType {
        /// The constructor holding the parameter.
        predicate: String,
        /// The type written after `%`.
        name: String,
    },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { line, source } => write!(f, "line {line}: {source}"),
            Self::UnresolvedType { predicate, param, name } => {
                write!(f, "{predicate}.{param} refers to unknown type `{name}`")
            }
            Self::InvalidParam { predicate, source } => write!(f, "{predicate}: {source}"),
            Self::AmbiguousBareType { predicate, name } => {
                write!(f, "{predicate} uses %{name}, which needs exactly one constructor")
            }
        }
    }
}

impl std::error::Error for SchemaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse { source, .. } => Some(source),
            Self::InvalidParam { source, .. } => Some(source),
            _ => None,
        }
    }
}
