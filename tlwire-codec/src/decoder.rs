//! [`Decoder`]: runs the compiled routine table over a [`Cursor`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tlwire_schema::{Schema, TypeExpr};

use crate::config::DecoderConfig;
use crate::cursor::{Buffer, Cursor};
use crate::error::{Error, Result};
use crate::plan::{self, Body, Dispatch, FieldOp, Routine, RoutineId, Shape, Step, Table};
use crate::primitive::{self, Deserializable, read_bytes, read_count, unknown_tag};
use crate::value::{Object, Value};
use crate::{gzip, ids, special};

/// Decodes TL values against one schema.
///
/// Construction compiles the whole schema; after that a `Decoder` is cheap to
/// clone and can be shared between threads.
///
/// ```
/// use std::sync::Arc;
/// use tlwire_codec::{Cursor, Decoder, DecoderConfig, Value};
/// use tlwire_schema::{Origin, SchemaBuilder};
///
/// let schema = SchemaBuilder::new()
///     .add_source("peerChat#36c6019a chat_id:long = Peer;", Origin::Api)?
///     .build()?;
/// let decoder = Decoder::new(Arc::new(schema), DecoderConfig::default())?;
///
/// let mut wire = 0x36c6019au32.to_le_bytes().to_vec();
/// wire.extend(55i64.to_le_bytes());
/// let peer = decoder.decode_type(&mut Cursor::from_slice(&wire), "Peer")?;
/// assert_eq!(peer, Value::Long(-55));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Decoder {
    inner: Arc<Inner>,
}

struct Inner {
    schema: Arc<Schema>,
    config: DecoderConfig,
    table: Table,
    exprs: RwLock<HashMap<String, Arc<Step>>>,
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("constructors", &self.inner.schema.len())
            .field("routines", &self.inner.table.routines.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Decoder {
    /// Compiles `schema` into a routine table.
    pub fn new(schema: Arc<Schema>, config: DecoderConfig) -> Result<Self> {
        let table = Table::compile(&schema)?;
        log::debug!(
            "[tlwire] compiled {} routines for {} constructors / {} types",
            table.routines.len(),
            schema.len(),
            schema.types().len(),
        );
        Ok(Self { inner: Arc::new(Inner { schema, config, table, exprs: RwLock::default() }) })
    }

    /// The schema this decoder was built from.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    /// The limits in force.
    pub fn config(&self) -> &DecoderConfig {
        &self.inner.config
    }

    /// Decodes one top-level object from the start of `bytes`.
    ///
    /// Accepts `rpc_result`, `rpc_error`, updates and every MTProto service
    /// constructor. Bytes after the object are ignored.
    pub fn decode_object(&self, bytes: &[u8]) -> Result<Value> {
        let mut cur = Cursor::from_slice(bytes);
        let value = self.decode_object_from(&mut cur)?;
        if !cur.is_empty() {
            log::debug!("[tlwire] {} trailing bytes after top-level object", cur.remaining());
        }
        Ok(value)
    }

    /// Like [`decode_object`](Self::decode_object), reading from `cur`.
    pub fn decode_object_from(&self, cur: &mut Cursor<'_>) -> Result<Value> {
        self.inner.run(self.inner.table.root, cur, 0)
    }

    /// Decodes a value of the given type expression: a boxed type
    /// (`Updates`), a bare constructor (`peerChat`, `%Message`), a primitive
    /// (`long`) or a vector of any of those (`Vector<int>`).
    pub fn decode_type(&self, cur: &mut Cursor<'_>, ty: &str) -> Result<Value> {
        let step = self.step_for(ty)?;
        self.inner.step(&step, cur, 0)
    }

    fn step_for(&self, ty: &str) -> Result<Arc<Step>> {
        let cached = self.inner.exprs.read().unwrap_or_else(PoisonError::into_inner).get(ty).cloned();
        if let Some(step) = cached {
            return Ok(step);
        }

        let expr = TypeExpr::parse(ty).map_err(|_| Error::UnknownType { name: ty.to_owned() })?;
        let step = plan::compile_expr(&mut self.inner.table.lookup(&self.inner.schema), &expr)?;
        log::trace!("[tlwire] compiled type expression `{ty}`");

        let mut exprs = self.inner.exprs.write().unwrap_or_else(PoisonError::into_inner);
        Ok(exprs.entry(ty.to_owned()).or_insert_with(|| Arc::new(step)).clone())
    }
}

// ─── Execution ───────────────────────────────────────────────────────────────

impl Inner {
    fn enter(&self, depth: usize, cur: &Cursor<'_>) -> Result<usize> {
        if depth >= self.config.max_depth {
            return Err(Error::DepthExceeded { offset: cur.pos(), limit: self.config.max_depth });
        }
        Ok(depth + 1)
    }

    fn run(&self, id: RoutineId, cur: Buffer, depth: usize) -> Result<Value> {
        let depth = self.enter(depth, cur)?;
        match self.table.routine(id) {
            Routine::Dispatch(d) => self.dispatch(d, cur, depth),
            Routine::Body(b) => self.body(b, cur, depth),
            Routine::Reserved => Err(Error::Unsupported {
                predicate: format!("routine #{id}"),
                reason: "used before it was compiled".into(),
            }),
        }
    }

    fn dispatch(&self, d: &Dispatch, cur: Buffer, depth: usize) -> Result<Value> {
        let tag = u32::deserialize(cur)?;
        if let Some(&body) = d.arms.get(&tag) {
            log::trace!("[tlwire] {:08x} as {} at {}", tag, d.expected, cur.pos() - 4);
            return self.run(body, cur, depth);
        }
        if tag == ids::GZIP_PACKED {
            let inflated = gzip::unpack(cur, self.config.max_inflated_len)?;
            let mut inner = Cursor::from_slice(&inflated);
            let depth = self.enter(depth, &inner)?;
            return self.dispatch(d, &mut inner, depth);
        }
        Err(unknown_tag(cur, &d.expected))
    }

    fn body(&self, b: &Body, cur: Buffer, depth: usize) -> Result<Value> {
        let mut words = [0u32; plan::MAX_FLAG_WORDS];
        let mut fields = Vec::with_capacity(b.fields.len());

        for field in &b.fields {
            let set = field.gate.is_none_or(|g| words[g.slot] & g.mask != 0);
            match &field.op {
                _ if !set => {}
                FieldOp::True => fields.push((field.name.clone(), Value::Bool(true))),
                FieldOp::FlagWord(slot) => words[*slot] = u32::deserialize(cur)?,
                FieldOp::RandomBytes => primitive::skip_random_bytes(cur, self.config.min_random_bytes)?,
                FieldOp::Stripped => {
                    let jpeg = special::inflate_stripped(read_bytes(cur)?);
                    fields.push((field.name.clone(), Value::Bytes(jpeg)));
                }
                FieldOp::Read(step) => fields.push((field.name.clone(), self.step(step, cur, depth)?)),
            }
        }

        match b.shape {
            Shape::Record => Ok(Value::Object(Object { predicate: b.predicate.clone(), fields })),
            Shape::SuperBare => Ok(fields.into_iter().next().map_or(Value::Null, |(_, v)| v)),
            Shape::Peer(space) => {
                let id = fields.first().and_then(|(_, v)| v.as_long());
                let id = id.ok_or_else(|| Error::content(&b.predicate, "peer without an integer id"))?;
                Ok(Value::Long(space.apply(id)))
            }
            Shape::DataJson => {
                let data = fields.first().and_then(|(_, v)| v.as_str());
                let data = data.ok_or_else(|| Error::content(&b.predicate, "missing data string"))?;
                serde_json::from_str::<serde_json::Value>(data)
                    .map(Value::from)
                    .map_err(|e| Error::content(&b.predicate, e))
            }
        }
    }

    fn step(&self, step: &Step, cur: Buffer, depth: usize) -> Result<Value> {
        Ok(match step {
            Step::Int => Value::Int(i32::deserialize(cur)?),
            Step::Long => Value::Long(i64::deserialize(cur)?),
            Step::Double => Value::Double(f64::deserialize(cur)?),
            Step::Bool => Value::Bool(bool::deserialize(cur)?),
            Step::Bytes => Value::Bytes(Vec::<u8>::deserialize(cur)?),
            Step::String => Value::String(String::deserialize(cur)?),
            Step::Waveform => {
                let samples = special::unpack_waveform(read_bytes(cur)?);
                Value::Vector(samples.into_iter().map(|s| Value::Int(i32::from(s))).collect())
            }
            Step::Fixed(n) => Value::Bytes(cur.read_slice(*n)?.to_vec()),
            Step::Call(id) => return self.run(*id, cur, depth),
            Step::Vector { boxed, elem } => Value::Vector(self.vector(*boxed, elem, cur, depth)?),
            Step::JsonEntries { boxed, elem } => {
                let mut map = BTreeMap::new();
                for entry in self.vector(*boxed, elem, cur, depth)? {
                    let key = entry.get("key").and_then(Value::as_str).map(str::to_owned);
                    let value = entry.get("value").cloned();
                    match (key, value) {
                        (Some(k), Some(v)) => map.insert(k, v),
                        _ => return Err(Error::content("jsonObjectValue", "entry without key and value")),
                    };
                }
                Value::Map(map)
            }
        })
    }

    fn vector(&self, boxed: bool, elem: &Step, cur: Buffer, depth: usize) -> Result<Vec<Value>> {
        let depth = self.enter(depth, cur)?;
        if !boxed {
            return self.elements(elem, cur, depth);
        }
        match u32::deserialize(cur)? {
            ids::VECTOR => self.elements(elem, cur, depth),
            ids::GZIP_PACKED => {
                let inflated = gzip::unpack(cur, self.config.max_inflated_len)?;
                let mut inner = Cursor::from_slice(&inflated);
                match u32::deserialize(&mut inner)? {
                    ids::VECTOR => self.elements(elem, &mut inner, depth),
                    _ => Err(unknown_tag(&mut inner, "Vector")),
                }
            }
            _ => Err(unknown_tag(cur, "Vector")),
        }
    }

    fn elements(&self, elem: &Step, cur: Buffer, depth: usize) -> Result<Vec<Value>> {
        let len = read_count(cur)?;
        let mut out = Vec::with_capacity(len.min(cur.remaining()));
        for _ in 0..len {
            out.push(self.step(elem, cur, depth)?);
        }
        Ok(out)
    }
}
