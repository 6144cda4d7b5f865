use std::fmt;
use std::str::FromStr;

use crate::errors::{ParamParseError, ParseError};
use crate::tl::{Category, Flag, Parameter, ParameterType, Type};
use crate::utils::tl_id;

/// One complete schema line, e.g.
///
/// ```text
/// peerChannel#a2a5371e channel_id:long = Peer;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Definition {
    /// Namespace parts, empty in the global namespace.
    pub namespace: Vec<String>,

    /// Predicate or method name without namespace.
    pub name: String,

    /// Constructor id from `#xxxxxxxx`, or the CRC32 of the line when absent.
    pub id: u32,

    /// Parameters in wire order. `{X:Type}` generics are not included.
    pub params: Vec<Parameter>,

    /// The boxed type this constructor belongs to, or a method's result.
    pub ty: Type,

    /// Section the line appeared in.
    pub category: Category,
}

impl Definition {
    /// `namespace.name`, the predicate as used on lookups.
    pub fn full_name(&self) -> String {
        let mut s = String::with_capacity(self.name.len() + 8 * self.namespace.len());
        for ns in &self.namespace {
            s.push_str(ns);
            s.push('.');
        }
        s.push_str(&self.name);
        s
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{:08x}", self.full_name(), self.id)?;

        let mut generics: Vec<&str> = Vec::new();
        for p in &self.params {
            if let ParameterType::Normal { ty, .. } = &p.ty {
                ty.collect_generic_refs(&mut generics);
            }
        }
        generics.sort_unstable();
        generics.dedup();
        for g in generics {
            write!(f, " {{{g}:Type}}")?;
        }

        for p in &self.params {
            write!(f, " {p}")?;
        }
        write!(f, " = {}", self.ty)
    }
}

impl FromStr for Definition {
    type Err = ParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim().trim_end_matches(';').trim();
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }

        let (lhs, rhs) = raw.split_once('=').ok_or(ParseError::MissingType)?;
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        if rhs.is_empty() {
            return Err(ParseError::MissingType);
        }
        // `Vector t` and friends: the builtin polymorphic declarations.
        if rhs.contains(char::is_whitespace) {
            return Err(ParseError::NotImplemented);
        }
        let mut ty: Type = rhs.parse().map_err(|_| ParseError::MissingType)?;

        let (head, rest) = match lhs.split_once(char::is_whitespace) {
            Some((h, r)) => (h, r.trim_start()),
            None => (lhs, ""),
        };
        let (full_name, explicit_id) = match head.split_once('#') {
            Some((n, id)) => (n, Some(id)),
            None => (head, None),
        };
        let (namespace, name) = match full_name.rsplit_once('.') {
            Some((ns, n)) => (ns.split('.').map(String::from).collect::<Vec<_>>(), n),
            None => (Vec::new(), full_name),
        };
        if name.is_empty() || namespace.iter().any(String::is_empty) {
            return Err(ParseError::MissingName);
        }

        let id = match explicit_id {
            Some(hex) => u32::from_str_radix(hex.trim(), 16).map_err(ParseError::InvalidId)?,
            None => tl_id(raw),
        };

        let mut generics: Vec<String> = Vec::new();
        let mut params: Vec<Parameter> = Vec::new();
        for token in rest.split_whitespace() {
            let param = match token.parse::<Parameter>() {
                Ok(p) => p,
                Err(ParamParseError::TypeDef { name }) => {
                    generics.push(name);
                    continue;
                }
                Err(ParamParseError::NotImplemented) => return Err(ParseError::NotImplemented),
                Err(e) => return Err(ParseError::InvalidParam(e)),
            };

            if let ParameterType::Normal { ty, flag } = &param.ty {
                if ty.generic_ref && !generics.contains(&ty.name) {
                    return Err(ParseError::InvalidParam(ParamParseError::MissingDef));
                }
                if let Some(fl) = flag {
                    if !declares_flag_word(&params, fl) {
                        return Err(ParseError::InvalidParam(ParamParseError::MissingDef));
                    }
                }
            }
            params.push(param);
        }

        if generics.contains(&ty.name) {
            ty.generic_ref = true;
        }

        Ok(Definition {
            namespace,
            name: name.to_owned(),
            id,
            params,
            ty,
            category: Category::Types,
        })
    }
}

/// Flag words are normally `name:#`, but older schema revisions gate on a
/// plain `int` field.
fn declares_flag_word(earlier: &[Parameter], flag: &Flag) -> bool {
    earlier.iter().any(|p| {
        p.name == flag.name
            && match &p.ty {
                ParameterType::Flags => true,
                ParameterType::Normal { ty, flag: None } => ty.namespace.is_empty() && ty.name == "int",
                ParameterType::Normal { .. } => false,
            }
    })
}
