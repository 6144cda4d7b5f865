use std::fmt;
use std::str::FromStr;

use crate::errors::ParamParseError;
use crate::tl::ParameterType;

/// One `name:Type` token of a definition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parameter {
    /// Name as written in the schema.
    pub name: String,
    /// Declared type.
    pub ty: ParameterType,
}

impl Parameter {
    /// `true` for `name:#`.
    pub fn is_flag_word(&self) -> bool {
        self.ty == ParameterType::Flags
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}

impl FromStr for Parameter {
    type Err = ParamParseError;

    /// `{X:Type}` comes back as [`ParamParseError::TypeDef`] so the caller can
    /// record the generic instead of treating it as a parameter.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = token.strip_prefix('{') {
            return Err(match inner.strip_suffix(":Type}") {
                Some(name) => ParamParseError::TypeDef { name: name.into() },
                None => ParamParseError::MissingDef,
            });
        }

        let (name, ty) = token.split_once(':').ok_or(ParamParseError::NotImplemented)?;
        if name.is_empty() || ty.is_empty() {
            return Err(ParamParseError::Empty);
        }

        Ok(Self { name: name.to_owned(), ty: ty.parse()? })
    }
}
