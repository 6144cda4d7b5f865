use std::fmt;
use std::str::FromStr;

use crate::errors::ParamParseError;

/// A type expression as written in the schema, e.g. `Vector<%Message>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    /// Namespace components, e.g. `["storage"]` for `storage.FileType`.
    pub namespace: Vec<String>,

    /// The name without namespace or sigils.
    pub name: String,

    /// Bare on the wire: written lowercase (`ipPort`) or with the `%` sigil
    /// (`%Message`).
    pub bare: bool,

    /// Written as `!X`, a reference to a `{X:Type}` generic.
    pub generic_ref: bool,

    /// The argument of a parameterized type (`long` in `Vector<long>`).
    pub generic_arg: Option<Box<Type>>,
}

impl Type {
    /// Dotted name including the namespace, e.g. `storage.FileType`.
    pub fn full_name(&self) -> String {
        let mut s = String::new();
        for ns in &self.namespace {
            s.push_str(ns);
            s.push('.');
        }
        s.push_str(&self.name);
        s
    }

    /// `true` for both spellings of the vector type.
    pub fn is_vector(&self) -> bool {
        self.namespace.is_empty() && (self.name == "Vector" || self.name == "vector")
    }

    pub(crate) fn collect_generic_refs<'a>(&'a self, output: &mut Vec<&'a str>) {
        if self.generic_ref {
            output.push(&self.name);
        }
        if let Some(arg) = &self.generic_arg {
            arg.collect_generic_refs(output);
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic_ref {
            write!(f, "!")?;
        }
        let first_upper = self.name.chars().next().is_some_and(|c| c.is_ascii_uppercase());
        if self.bare && first_upper {
            write!(f, "%")?;
        }
        write!(f, "{}", self.full_name())?;
        if let Some(arg) = &self.generic_arg {
            write!(f, "<{arg}>")?;
        }
        Ok(())
    }
}

impl FromStr for Type {
    type Err = ParamParseError;

    /// Parses `ns.Name`, `!X`, `%Name` and `Vector<...>` forms.
    ///
    /// ```
    /// use tlwire_schema::tl::Type;
    /// let t: Type = "vector<%Message>".parse().unwrap();
    /// assert!(t.bare);
    /// assert!(t.generic_arg.unwrap().bare);
    /// ```
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (raw, generic_ref) = match raw.strip_prefix('!') {
            Some(r) => (r, true),
            None => (raw, false),
        };
        let (raw, percent) = match raw.strip_prefix('%') {
            Some(r) => (r, true),
            None => (raw, false),
        };

        let (name_part, generic_arg) = match raw.split_once('<') {
            Some((name, rest)) => match rest.strip_suffix('>') {
                Some(arg) => (name, Some(Box::new(Type::from_str(arg)?))),
                None => return Err(ParamParseError::InvalidGeneric),
            },
            None => (raw, None),
        };

        let (namespace, name) = match name_part.rsplit_once('.') {
            Some((ns, n)) => (ns.split('.').map(String::from).collect::<Vec<_>>(), n),
            None => (Vec::new(), name_part),
        };
        if namespace.iter().any(String::is_empty) {
            return Err(ParamParseError::Empty);
        }

        let first = name.chars().next().ok_or(ParamParseError::Empty)?;
        Ok(Self {
            namespace,
            name: name.to_owned(),
            bare: percent || first.is_ascii_lowercase(),
            generic_ref,
            generic_arg,
        })
    }
}
