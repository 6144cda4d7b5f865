//! The routine table: the schema compiled into decode steps.
//!
//! Every boxed type becomes a dispatch routine (tag to constructor body) and
//! every constructor a body routine (its fields in wire order). Routines live
//! in one arena and refer to each other by index; a slot is reserved before
//! its routine is compiled, so recursive types like `PageBlock` terminate.

use std::collections::HashMap;
use std::sync::Arc;

use tlwire_schema::{Constructor, ParamKind, Schema, TypeExpr, TypeRef};

use crate::error::{Error, Result};
use crate::ids;

/// Index of a routine in [`Table::routines`].
pub(crate) type RoutineId = usize;

/// How many flag words a single constructor may declare.
pub(crate) const MAX_FLAG_WORDS: usize = 8;

// ─── Steps ───────────────────────────────────────────────────────────────────

/// Reads one value.
#[derive(Debug)]
pub(crate) enum Step {
    Int,
    Long,
    Double,
    Bool,
    Bytes,
    String,
    /// `bytes` unpacked into 5-bit samples.
    Waveform,
    /// `int128`, `int256`, `int512`, `strlong`.
    Fixed(usize),
    Vector { boxed: bool, elem: Box<Step> },
    /// `Vector<JSONObjectValue>`, folded into a map.
    JsonEntries { boxed: bool, elem: Box<Step> },
    /// A dispatch routine (tag first) or a bare body routine (no tag).
    Call(RoutineId),
}

// ─── Routines ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub(crate) enum Routine {
    /// Being compiled. Never observed once [`Table`] is built.
    Reserved,
    Dispatch(Dispatch),
    Body(Body),
}

/// Reads a tag and runs the matching body.
#[derive(Debug)]
pub(crate) struct Dispatch {
    /// Type name reported on an unknown tag.
    pub expected: Arc<str>,
    pub arms: HashMap<u32, RoutineId>,
}

#[derive(Debug)]
pub(crate) struct Body {
    pub predicate: Arc<str>,
    pub shape: Shape,
    pub fields: Vec<Field>,
}

/// What a body turns its fields into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shape {
    /// `Object { predicate, fields }`.
    Record,
    /// The `data` string, parsed as JSON.
    DataJson,
    /// The only field's value, or `Null` without fields (JSON values).
    SuperBare,
    /// The only field as a unified peer id.
    Peer(PeerSpace),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PeerSpace {
    User,
    Chat,
    Channel,
}

impl PeerSpace {
    pub fn apply(self, id: i64) -> i64 {
        match self {
            Self::User => id,
            Self::Chat => crate::special::chat_peer_id(id),
            Self::Channel => crate::special::channel_peer_id(id),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Field {
    pub name: Arc<str>,
    pub op: FieldOp,
    pub gate: Option<Gate>,
}

#[derive(Debug)]
pub(crate) enum FieldOp {
    /// Read a u32 into the given flag slot. Not emitted.
    FlagWord(usize),
    /// Emits `true`. Reads nothing.
    True,
    /// `random_bytes`: checked and skipped. Not emitted.
    RandomBytes,
    /// `photoStrippedSize.bytes`, rebuilt into a JPEG.
    Stripped,
    Read(Step),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Gate {
    pub slot: usize,
    pub mask: u32,
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// The compiled schema. Immutable once [`Table::compile`] returns.
#[derive(Debug)]
pub(crate) struct Table {
    pub routines: Vec<Routine>,
    /// Boxed type name to dispatch routine.
    types: HashMap<String, RoutineId>,
    /// Constructor id to body routine.
    bodies: HashMap<u32, RoutineId>,
    /// Tags accepted by a top-level decode.
    pub root: RoutineId,
    /// Tags accepted by an `Object` or `!X` param.
    pub any: RoutineId,
}

impl Table {
    /// Compiles every type and constructor of `schema`.
    pub fn compile(schema: &Schema) -> Result<Self> {
        let mut c = Compiler {
            schema,
            routines: Vec::with_capacity(schema.len() + schema.types().len() + 2),
            types: HashMap::new(),
            bodies: HashMap::new(),
            any: 0,
        };
        c.any = c.reserve();
        let root = c.reserve();

        for def in schema.types() {
            c.boxed(&def.name)?;
        }
        for ctor in schema.constructors() {
            c.bare(ctor)?;
        }

        let any = c.dispatch(
            "Object",
            schema.constructors().iter().filter(|k| k.predicate != "jsonObjectValue"),
        )?;
        c.routines[c.any] = Routine::Dispatch(any);

        let top = c.dispatch("Object", schema.constructors().iter().filter(|k| is_root(k)))?;
        log::debug!("[tlwire] top-level set: {} constructors", top.arms.len());
        c.routines[root] = Routine::Dispatch(top);

        Ok(Self { routines: c.routines, types: c.types, bodies: c.bodies, root, any: c.any })
    }

    pub fn routine(&self, id: RoutineId) -> &Routine {
        &self.routines[id]
    }

    /// A read-only [`Routines`] view for compiling expressions after the
    /// table is built.
    pub fn lookup<'s>(&'s self, schema: &'s Schema) -> Lookup<'s> {
        Lookup { table: self, schema }
    }
}

/// Constructors a top-level decode accepts: RPC results and errors, updates,
/// and anything that may travel unencrypted.
fn is_root(ctor: &Constructor) -> bool {
    !ctor.encrypted
        || matches!(ctor.predicate.as_str(), "rpc_result" | "rpc_error")
        || matches!(ctor.ty.as_str(), "Update" | "Updates")
}

// ─── Compilation ─────────────────────────────────────────────────────────────

/// Resolves type references to routines.
pub(crate) trait Routines<'s> {
    fn schema(&self) -> &'s Schema;

    /// The `Object` routine.
    fn any(&self) -> RoutineId;

    /// Dispatch routine of a boxed type.
    fn boxed(&mut self, name: &str) -> Result<RoutineId>;

    /// Body routine of a constructor.
    fn bare(&mut self, ctor: &'s Constructor) -> Result<RoutineId>;
}

/// Compiles a parameter type expression.
pub(crate) fn compile_expr<'s, R: Routines<'s>>(r: &mut R, expr: &TypeExpr) -> Result<Step> {
    match expr {
        TypeExpr::Vector { elem, boxed } => {
            let step = Box::new(compile_expr(r, elem)?);
            Ok(match &**elem {
                TypeExpr::Named(t) if !t.bare && t.name == "JSONObjectValue" => {
                    Step::JsonEntries { boxed: *boxed, elem: step }
                }
                _ => Step::Vector { boxed: *boxed, elem: step },
            })
        }
        TypeExpr::Named(t) => compile_ref(r, t),
    }
}

fn compile_ref<'s, R: Routines<'s>>(r: &mut R, t: &TypeRef) -> Result<Step> {
    if t.generic {
        return Ok(Step::Call(r.any()));
    }
    Ok(match t.name.as_str() {
        "int" | "#" => Step::Int,
        "long" => Step::Long,
        "double" => Step::Double,
        "Bool" => Step::Bool,
        "string" => Step::String,
        "bytes" => Step::Bytes,
        "int128" => Step::Fixed(16),
        "int256" => Step::Fixed(32),
        "int512" => Step::Fixed(64),
        "strlong" => Step::Fixed(8),
        "Object" => Step::Call(r.any()),
        name if t.bare => {
            let schema = r.schema();
            let ctor = schema
                .bare_constructor(name)
                .ok_or_else(|| Error::UnknownType { name: name.to_owned() })?;
            Step::Call(r.bare(ctor)?)
        }
        name => Step::Call(r.boxed(name)?),
    })
}

/// Builds the [`Table`].
struct Compiler<'s> {
    schema: &'s Schema,
    routines: Vec<Routine>,
    types: HashMap<String, RoutineId>,
    bodies: HashMap<u32, RoutineId>,
    any: RoutineId,
}

impl<'s> Compiler<'s> {
    fn reserve(&mut self) -> RoutineId {
        self.routines.push(Routine::Reserved);
        self.routines.len() - 1
    }

    fn dispatch(
        &mut self,
        expected: &str,
        ctors: impl Iterator<Item = &'s Constructor>,
    ) -> Result<Dispatch> {
        let mut arms = HashMap::new();
        for ctor in ctors.filter(|k| k.id != ids::GZIP_PACKED) {
            arms.insert(ctor.id, self.bare(ctor)?);
        }
        Ok(Dispatch { expected: expected.into(), arms })
    }

    fn body(&mut self, ctor: &'s Constructor) -> Result<Body> {
        let shape = match (ctor.predicate.as_str(), ctor.ty.as_str()) {
            ("dataJSON", _) => Shape::DataJson,
            ("peerChat", _) => Shape::Peer(PeerSpace::Chat),
            ("peerChannel", _) => Shape::Peer(PeerSpace::Channel),
            (_, "Peer") => Shape::Peer(PeerSpace::User),
            (_, "JSONValue") => Shape::SuperBare,
            _ => Shape::Record,
        };

        let mut slots: Vec<&str> = Vec::new();
        let mut fields = Vec::with_capacity(ctor.params.len());
        for param in &ctor.params {
            let gate = match &param.flag {
                Some(bit) => {
                    let slot = slots.iter().position(|w| *w == bit.word).ok_or_else(|| {
                        Error::Unsupported {
                            predicate: ctor.predicate.clone(),
                            reason: format!("`{}` is gated by unknown flag word `{}`", param.name, bit.word),
                        }
                    })?;
                    Some(Gate { slot, mask: bit.mask() })
                }
                None => None,
            };

            let mut name: Arc<str> = param.name.as_str().into();
            let op = match &param.kind {
                ParamKind::FlagWord => {
                    if slots.len() == MAX_FLAG_WORDS {
                        return Err(Error::Unsupported {
                            predicate: ctor.predicate.clone(),
                            reason: format!("more than {MAX_FLAG_WORDS} flag words"),
                        });
                    }
                    slots.push(&param.name);
                    FieldOp::FlagWord(slots.len() - 1)
                }
                ParamKind::True => FieldOp::True,
                ParamKind::Value(TypeExpr::Named(t)) if is_bytes(t) && param.name == "random_bytes" => {
                    FieldOp::RandomBytes
                }
                ParamKind::Value(TypeExpr::Named(t)) if is_bytes(t) && param.name == "waveform" => {
                    FieldOp::Read(Step::Waveform)
                }
                ParamKind::Value(TypeExpr::Named(t))
                    if is_bytes(t) && ctor.predicate == "photoStrippedSize" && param.name == "bytes" =>
                {
                    name = "inflated".into();
                    FieldOp::Stripped
                }
                ParamKind::Value(expr) => FieldOp::Read(compile_expr(self, expr)?),
            };
            fields.push(Field { name, op, gate });
        }

        Ok(Body { predicate: ctor.predicate.as_str().into(), shape, fields })
    }
}

fn is_bytes(t: &TypeRef) -> bool {
    matches!(t.name.as_str(), "bytes" | "string")
}

impl<'s> Routines<'s> for Compiler<'s> {
    fn schema(&self) -> &'s Schema {
        self.schema
    }

    fn any(&self) -> RoutineId {
        self.any
    }

    fn boxed(&mut self, name: &str) -> Result<RoutineId> {
        if name == "Object" {
            return Ok(self.any);
        }
        if let Some(&id) = self.types.get(name) {
            return Ok(id);
        }
        let schema = self.schema;
        let def = schema.type_def(name).ok_or_else(|| Error::UnknownType { name: name.to_owned() })?;

        let id = self.reserve();
        self.types.insert(name.to_owned(), id);
        let ctors = def.constructors.iter().filter_map(|&k| schema.by_id(k));
        let dispatch = self.dispatch(name, ctors)?;
        self.routines[id] = Routine::Dispatch(dispatch);
        Ok(id)
    }

    fn bare(&mut self, ctor: &'s Constructor) -> Result<RoutineId> {
        if let Some(&id) = self.bodies.get(&ctor.id) {
            return Ok(id);
        }
        let id = self.reserve();
        self.bodies.insert(ctor.id, id);
        let body = self.body(ctor)?;
        self.routines[id] = Routine::Body(body);
        Ok(id)
    }
}

/// Resolves against a finished [`Table`] without adding to it.
pub(crate) struct Lookup<'s> {
    table: &'s Table,
    schema: &'s Schema,
}

impl<'s> Routines<'s> for Lookup<'s> {
    fn schema(&self) -> &'s Schema {
        self.schema
    }

    fn any(&self) -> RoutineId {
        self.table.any
    }

    fn boxed(&mut self, name: &str) -> Result<RoutineId> {
        if name == "Object" {
            return Ok(self.table.any);
        }
        self.table.types.get(name).copied().ok_or_else(|| Error::UnknownType { name: name.to_owned() })
    }

    fn bare(&mut self, ctor: &'s Constructor) -> Result<RoutineId> {
        self.table
            .bodies
            .get(&ctor.id)
            .copied()
            .ok_or_else(|| Error::UnknownType { name: ctor.predicate.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlwire_schema::{Origin, SchemaBuilder};

    fn schema(src: &str) -> Schema {
        SchemaBuilder::new().add_source(src, Origin::Api).unwrap().build().unwrap()
    }

    #[test]
    fn recursive_types_terminate() {
        let s = schema(
            "textPlain#744694e0 text:string = RichText;\n\
             textBold#6724abc4 text:RichText = RichText;\n\
             textConcat#7e6260d7 texts:Vector<RichText> = RichText;",
        );
        let table = Table::compile(&s).unwrap();
        assert!(table.routines.iter().all(|r| !matches!(r, Routine::Reserved)));
        let Routine::Dispatch(d) = table.routine(table.types["RichText"]) else { panic!() };
        assert_eq!(d.arms.len(), 3);
    }

    #[test]
    fn flag_words_get_slots() {
        let s = schema("f#00000001 flags:# a:flags.0?int flags2:# b:flags2.3?true = F;");
        let table = Table::compile(&s).unwrap();
        let Routine::Body(body) = table.routine(table.bodies[&0x0000_0001]) else { panic!() };
        assert!(matches!(body.fields[0].op, FieldOp::FlagWord(0)));
        assert_eq!(body.fields[1].gate, Some(Gate { slot: 0, mask: 1 }));
        assert!(matches!(body.fields[2].op, FieldOp::FlagWord(1)));
        assert_eq!(body.fields[3].gate, Some(Gate { slot: 1, mask: 8 }));
    }

    #[test]
    fn too_many_flag_words() {
        let params: String = (0..9).map(|i| format!(" f{i}:#")).collect();
        let s = schema(&format!("many#00000002{params} = Many;"));
        assert!(matches!(Table::compile(&s), Err(Error::Unsupported { .. })));
    }

    #[test]
    fn peer_and_json_shapes() {
        let s = schema(
            "peerUser#59511722 user_id:long = Peer;\n\
             peerChannel#a2a5371e channel_id:long = Peer;\n\
             jsonNull#3f6d7b68 = JSONValue;",
        );
        let table = Table::compile(&s).unwrap();
        let shape = |id: u32| match table.routine(table.bodies[&id]) {
            Routine::Body(b) => b.shape,
            _ => panic!(),
        };
        assert_eq!(shape(0x5951_1722), Shape::Peer(PeerSpace::User));
        assert_eq!(shape(0xa2a5_371e), Shape::Peer(PeerSpace::Channel));
        assert_eq!(shape(0x3f6d_7b68), Shape::SuperBare);
    }

    #[test]
    fn shared_predicate_gets_one_body_per_id() {
        let s = schema(
            "decryptedMessage#1f814f1f random_id:long random_bytes:bytes message:string = DecryptedMessage;\n\
             decryptedMessage#204d3878 random_id:long ttl:int message:string = DecryptedMessage;",
        );
        let table = Table::compile(&s).unwrap();
        let old = table.bodies[&0x1f81_4f1f];
        let new = table.bodies[&0x204d_3878];
        assert_ne!(old, new);
        let Routine::Body(body) = table.routine(new) else { panic!() };
        assert_eq!(body.fields.len(), 3);
        assert_eq!(&*body.fields[1].name, "ttl");
    }
}
