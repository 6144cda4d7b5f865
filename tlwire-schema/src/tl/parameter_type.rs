use std::fmt;
use std::str::FromStr;

use crate::errors::ParamParseError;
use crate::tl::{Flag, Type};

/// What follows the `:` of a parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParameterType {
    /// `#`: a 32-bit flag word gating later parameters.
    Flags,

    /// Any other type, optionally behind a flag bit (`flags.0?Type`).
    Normal {
        /// The declared type.
        ty: Type,
        /// The gating bit, when conditional.
        flag: Option<Flag>,
    },
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flags => write!(f, "#"),
            Self::Normal { ty, flag: Some(fl) } => write!(f, "{}.{}?{ty}", fl.name, fl.index),
            Self::Normal { ty, flag: None } => write!(f, "{ty}"),
        }
    }
}

impl FromStr for ParameterType {
    type Err = ParamParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "#" {
            return Ok(Self::Flags);
        }

        let Some((flag_part, ty_part)) = s.split_once('?') else {
            return Ok(Self::Normal { ty: s.parse()?, flag: None });
        };

        let (name, index) = flag_part.split_once('.').ok_or(ParamParseError::InvalidFlag)?;
        if name.is_empty() || ty_part.contains('?') {
            return Err(ParamParseError::InvalidFlag);
        }
        let index = index.parse::<u32>().map_err(|_| ParamParseError::InvalidFlag)?;
        if index > 31 {
            return Err(ParamParseError::InvalidFlag);
        }

        Ok(Self::Normal {
            ty: ty_part.parse()?,
            flag: Some(Flag { name: name.to_owned(), index }),
        })
    }
}
