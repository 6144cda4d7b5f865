//! The resolved schema: constructors, the types grouping them, and the
//! parameter shapes a decoder walks.
//!
//! A [`Schema`] is immutable once [`SchemaBuilder::build`] returns it; share
//! it behind an `Arc` for the lifetime of the process.

use std::collections::HashMap;
use std::fmt;

use crate::errors::{ParamParseError, SchemaError};
use crate::iterator::TlIterator;
use crate::tl::{self, Category, Definition, ParameterType};
use crate::utils::layer_marker;

/// Names the decoder handles natively. They never need a schema entry.
const BUILTINS: &[&str] = &[
    "int", "long", "double", "string", "bytes", "int128", "int256", "int512", "strlong",
    "Bool", "true", "True", "Object", "Type", "#",
];

// ─── Origin ──────────────────────────────────────────────────────────────────

/// Which schema file a definition came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// The MTProto service schema (`mtproto.tl`). Its constructors can
    /// arrive before encryption is set up.
    MtProto,
    /// The client API schema (`api.tl`).
    Api,
    /// The end-to-end secret chat schema.
    Secret,
}

impl Origin {
    /// Whether constructors from this source only travel encrypted.
    pub fn encrypted(self) -> bool {
        !matches!(self, Self::MtProto)
    }
}

// ─── Type references ─────────────────────────────────────────────────────────

/// A named type as used by a parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Dotted name, `storage.FileType` or `ipPort`. No `%` or `!` sigils.
    pub name: String,
    /// Bare on the wire (no leading constructor id).
    pub bare: bool,
    /// A `!X` generic, decoded as any object.
    pub generic: bool,
}

impl TypeRef {
    fn from_tl(ty: &tl::Type) -> Self {
        Self { name: ty.full_name(), bare: ty.bare, generic: ty.generic_ref }
    }

    /// Whether the decoder knows this name without looking at the schema.
    pub fn is_builtin(&self) -> bool {
        self.generic || BUILTINS.contains(&self.name.as_str())
    }
}

/// A parameter's type: a named type or a (possibly nested) vector of one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// A single value.
    Named(TypeRef),
    /// `Vector<T>` (boxed, `vector#1cb5c415` first) or `vector<T>` (bare,
    /// count first).
    Vector {
        /// Element type.
        elem: Box<TypeExpr>,
        /// `true` for `Vector<T>`.
        boxed: bool,
    },
}

impl TypeExpr {
    /// Converts a parsed [`tl::Type`].
    pub fn from_tl(ty: &tl::Type) -> Result<Self, ParamParseError> {
        if !ty.is_vector() {
            return Ok(Self::Named(TypeRef::from_tl(ty)));
        }
        let arg = ty.generic_arg.as_deref().ok_or(ParamParseError::InvalidGeneric)?;
        Ok(Self::Vector {
            elem: Box::new(Self::from_tl(arg)?),
            boxed: ty.name == "Vector",
        })
    }

    /// Parses a type expression such as `Vector<long>` or `%Message`.
    pub fn parse(s: &str) -> Result<Self, ParamParseError> {
        Self::from_tl(&s.parse()?)
    }

    /// The innermost named type.
    pub fn leaf(&self) -> &TypeRef {
        match self {
            Self::Named(r) => r,
            Self::Vector { elem, .. } => elem.leaf(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(r) if r.generic => write!(f, "!{}", r.name),
            Self::Named(r) => {
                let upper = r.name.rsplit('.').next().and_then(|n| n.chars().next()).is_some_and(|c| c.is_ascii_uppercase());
                if r.bare && upper {
                    write!(f, "%")?;
                }
                write!(f, "{}", r.name)
            }
            Self::Vector { elem, boxed: true } => write!(f, "Vector<{elem}>"),
            Self::Vector { elem, boxed: false } => write!(f, "vector<{elem}>"),
        }
    }
}

// ─── Parameters ──────────────────────────────────────────────────────────────

/// The flag bit gating a conditional parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlagBit {
    /// Name of the flag word parameter.
    pub word: String,
    /// Bit position, `0..=31`.
    pub bit: u32,
}

impl FlagBit {
    /// `1 << bit`.
    pub fn mask(&self) -> u32 {
        1u32.checked_shl(self.bit).unwrap_or(0)
    }
}

/// How a parameter occupies the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// A 32-bit flag word. Read, kept for gating, never emitted.
    FlagWord,
    /// `flags.N?true`: presence only, zero wire bytes.
    True,
    /// Everything else.
    Value(TypeExpr),
}

/// One parameter of a [`Constructor`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    /// Field name, also the key in decoded records.
    pub name: String,
    /// Wire shape.
    pub kind: ParamKind,
    /// Present only when this bit of the flag word is set.
    pub flag: Option<FlagBit>,
}

/// One flag bit used by a constructor, and the parameter it gates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlagDescriptor {
    /// Flag word name.
    pub word: String,
    /// Bit position.
    pub bit: u32,
    /// The gated parameter.
    pub param: String,
}

// ─── Constructors and types ──────────────────────────────────────────────────

/// One data constructor.
#[derive(Clone, Debug, PartialEq)]
pub struct Constructor {
    /// Dotted predicate (`messageEntityBold`). Layered sources may reuse one
    /// predicate under several ids.
    pub predicate: String,
    /// The 32-bit tag on the wire.
    pub id: u32,
    /// Owning boxed type (`MessageEntity`).
    pub ty: String,
    /// Parameters in wire order.
    pub params: Vec<Param>,
    /// Every flag bit used, in parameter order.
    pub flags: Vec<FlagDescriptor>,
    /// `false` for MTProto service constructors.
    pub encrypted: bool,
}

impl Constructor {
    fn from_definition(def: &Definition, origin: Origin) -> Result<Self, ParamParseError> {
        let mut params = Vec::with_capacity(def.params.len());
        let mut flags = Vec::new();

        for (i, p) in def.params.iter().enumerate() {
            let (kind, flag) = match &p.ty {
                ParameterType::Flags => (ParamKind::FlagWord, None),
                ParameterType::Normal { ty, flag } => {
                    let flag = flag.as_ref().map(|f| FlagBit { word: f.name.clone(), bit: f.index });
                    let used_as_word = def.params[i + 1..].iter().any(|later| {
                        matches!(&later.ty, ParameterType::Normal { flag: Some(f), .. } if f.name == p.name)
                    });
                    let kind = if used_as_word {
                        ParamKind::FlagWord
                    } else if ty.name == "true" && ty.namespace.is_empty() {
                        ParamKind::True
                    } else {
                        ParamKind::Value(TypeExpr::from_tl(ty)?)
                    };
                    (kind, flag)
                }
            };
            if let Some(f) = &flag {
                flags.push(FlagDescriptor { word: f.word.clone(), bit: f.bit, param: p.name.clone() });
            }
            params.push(Param { name: p.name.clone(), kind, flag });
        }

        Ok(Self {
            predicate: def.full_name(),
            id: def.id,
            ty: def.ty.full_name(),
            params,
            flags,
            encrypted: origin.encrypted(),
        })
    }

    /// Parameters that are flag words.
    pub fn flag_words(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.kind == ParamKind::FlagWord)
    }
}

/// A boxed type: the constructors a tag at this position may select.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    /// Dotted type name.
    pub name: String,
    /// Member constructor ids in schema order.
    pub constructors: Vec<u32>,
}

// ─── Schema ──────────────────────────────────────────────────────────────────

/// The immutable constructor and type tables.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    constructors: Vec<Constructor>,
    by_id: HashMap<u32, usize>,
    by_predicate: HashMap<String, usize>,
    types: Vec<TypeDef>,
    type_index: HashMap<String, usize>,
    layer: Option<i32>,
}

impl Schema {
    /// Looks a constructor up by its wire tag.
    pub fn by_id(&self, id: u32) -> Option<&Constructor> {
        self.by_id.get(&id).map(|&i| &self.constructors[i])
    }

    /// Looks a constructor up by predicate. When several ids share it, the
    /// one loaded last wins.
    pub fn by_predicate(&self, predicate: &str) -> Option<&Constructor> {
        self.by_predicate.get(predicate).map(|&i| &self.constructors[i])
    }

    /// Looks a boxed type up by name.
    pub fn type_def(&self, name: &str) -> Option<&TypeDef> {
        self.type_index.get(name).map(|&i| &self.types[i])
    }

    /// All constructors in load order.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// All boxed types in first-seen order.
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    /// The `// LAYER N` of the sources, if any declared one.
    pub fn layer(&self) -> Option<i32> {
        self.layer
    }

    /// Number of constructors.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// `true` when no constructor was loaded.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }

    /// The constructor a bare reference decodes: a predicate (`ipPort`), or
    /// the only constructor of a type (`%Message`).
    pub fn bare_constructor(&self, name: &str) -> Option<&Constructor> {
        if let Some(c) = self.by_predicate(name) {
            return Some(c);
        }
        match self.type_def(name)?.constructors.as_slice() {
            [only] => self.by_id(*only),
            _ => None,
        }
    }

    fn check_ref(&self, ctor: &Constructor, param: &Param, r: &TypeRef) -> Result<(), SchemaError> {
        if r.is_builtin() {
            return Ok(());
        }
        if r.bare {
            if self.by_predicate(&r.name).is_some() {
                return Ok(());
            }
            if let Some(def) = self.type_def(&r.name) {
                return match def.constructors.len() {
                    1 => Ok(()),
                    _ => Err(SchemaError::AmbiguousBareType {
                        predicate: ctor.predicate.clone(),
                        name: r.name.clone(),
                    }),
                };
            }
        } else if self.type_def(&r.name).is_some() {
            return Ok(());
        }
        Err(SchemaError::UnresolvedType {
            predicate: ctor.predicate.clone(),
            param: param.name.clone(),
            name: r.name.clone(),
        })
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Collects definitions from one or more schema sources.
///
/// A later definition with an already-seen id replaces the earlier one, so
/// sources can be layered oldest first.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    defs: Vec<(Definition, Origin)>,
    layer: Option<i32>,
}

impl SchemaBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `contents` and queues its constructors.
    ///
    /// Builtin lines the model does not represent (`int ? = Int;`,
    /// `vector {t:Type} # [ t ] = Vector t;`) are skipped with a warning.
    /// Methods after `---functions---` are not kept.
    pub fn add_source(&mut self, contents: &str, origin: Origin) -> Result<&mut Self, SchemaError> {
        let mut methods = 0usize;
        for (line, result) in TlIterator::new(contents) {
            match result {
                Ok(def) if def.category == Category::Functions => methods += 1,
                Ok(def) => self.defs.push((def, origin)),
                Err(crate::ParseError::NotImplemented) => {
                    log::warn!("[tlwire] skipping builtin definition at line {line}");
                }
                Err(source) => return Err(SchemaError::Parse { line, source }),
            }
        }
        if let Some(layer) = contents.lines().filter_map(layer_marker).max() {
            self.layer = Some(self.layer.map_or(layer, |l| l.max(layer)));
        }
        log::debug!("[tlwire] {origin:?} source: {} constructors queued, {methods} methods ignored", self.defs.len());
        Ok(self)
    }

    /// Queues an already-parsed definition. Methods are ignored.
    pub fn add_definition(&mut self, def: Definition, origin: Origin) -> &mut Self {
        if def.category == Category::Types {
            self.defs.push((def, origin));
        }
        self
    }

    /// Resolves every queued definition into a [`Schema`].
    pub fn build(&self) -> Result<Schema, SchemaError> {
        let mut schema = Schema { layer: self.layer, ..Schema::default() };

        for (def, origin) in &self.defs {
            let ctor = Constructor::from_definition(def, *origin).map_err(|source| {
                SchemaError::InvalidParam { predicate: def.full_name(), source }
            })?;

            let index = match schema.by_id.get(&ctor.id) {
                Some(&i) => {
                    let old = std::mem::replace(&mut schema.constructors[i], ctor);
                    if let Some(t) = schema.type_index.get(&old.ty).copied() {
                        schema.types[t].constructors.retain(|&id| id != old.id);
                    }
                    if schema.by_predicate.get(&old.predicate) == Some(&i) {
                        schema.by_predicate.remove(&old.predicate);
                    }
                    i
                }
                None => {
                    schema.constructors.push(ctor);
                    schema.constructors.len() - 1
                }
            };

            let ctor = &schema.constructors[index];
            schema.by_id.insert(ctor.id, index);
            schema.by_predicate.insert(ctor.predicate.clone(), index);

            let t = match schema.type_index.get(&ctor.ty) {
                Some(&t) => t,
                None => {
                    schema.types.push(TypeDef { name: ctor.ty.clone(), constructors: Vec::new() });
                    schema.type_index.insert(ctor.ty.clone(), schema.types.len() - 1);
                    schema.types.len() - 1
                }
            };
            schema.types[t].constructors.push(ctor.id);
        }

        for ctor in &schema.constructors {
            for param in &ctor.params {
                if let ParamKind::Value(expr) = &param.kind {
                    schema.check_ref(ctor, param, expr.leaf())?;
                }
            }
        }

        log::debug!(
            "[tlwire] schema built: {} constructors, {} types, layer {:?}",
            schema.constructors.len(),
            schema.types.len(),
            schema.layer,
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_expr_display_round_trips() {
        for s in ["Vector<long>", "vector<%Message>", "!X", "storage.FileType", "Vector<Vector<int>>"] {
            assert_eq!(TypeExpr::parse(s).unwrap().to_string(), s);
        }
    }

    #[test]
    fn vector_needs_argument() {
        assert_eq!(TypeExpr::parse("Vector"), Err(ParamParseError::InvalidGeneric));
    }

    #[test]
    fn int_flag_word_is_recognised() {
        let def: Definition = "old#00000001 flags:int a:flags.0?string = Old".parse().unwrap();
        let ctor = Constructor::from_definition(&def, Origin::Api).unwrap();
        assert_eq!(ctor.params[0].kind, ParamKind::FlagWord);
        assert_eq!(ctor.flags, vec![FlagDescriptor { word: "flags".into(), bit: 0, param: "a".into() }]);
    }
}
