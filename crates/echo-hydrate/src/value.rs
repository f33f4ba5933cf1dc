// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory value graph handed to the serializer.
//!
//! Primitives are plain data. Everything with identity (containers, dates,
//! patterns, boxed scalars, records) lives behind an [`Object`] handle, and
//! cloning the handle yields the *same* node. Identity, not content, is what
//! the canonicalizer deduplicates on: two structurally equal objects built
//! separately stay two nodes.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// JavaScript string: a sequence of UTF-16 code units.
///
/// Rust strings cannot hold lone surrogates, but JS strings can, and the
/// literal encoder must escape them. Build from `&str`/`String` for the
/// common case or from raw units with [`JsString::from_utf16`].
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsString(Vec<u16>);

impl JsString {
    /// Wrap raw UTF-16 code units (lone surrogates allowed).
    pub fn from_utf16(units: Vec<u16>) -> Self {
        Self(units)
    }

    /// Code units of the string.
    pub fn units(&self) -> &[u16] {
        &self.0
    }

    /// Number of UTF-16 code units.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the string has no code units.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode to a Rust string, or `None` if a lone surrogate is present.
    pub fn to_utf8(&self) -> Option<String> {
        String::from_utf16(&self.0).ok()
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().collect())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.iter().copied().eq(other.encode_utf16())
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf16_lossy(&self.0))
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf16_lossy(&self.0))
    }
}

/// Identity of an [`Object`] node for the lifetime of its allocation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(usize);

/// Opaque callable. Never encoded; the canonicalizer reports and skips it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Function {
    name: Rc<str>,
}

impl Function {
    /// Create a callable placeholder with a display name (may be empty).
    pub fn new(name: &str) -> Self {
        Self { name: name.into() }
    }

    /// Display name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A node in the value graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `undefined`.
    Undefined,
    /// `null`.
    Null,
    /// Boolean primitive.
    Bool(bool),
    /// IEEE-754 number; keeps `-0`, `NaN` and infinities.
    Number(f64),
    /// Arbitrary-precision integer primitive (limited to `i128` here).
    BigInt(i128),
    /// Text primitive.
    String(JsString),
    /// Anything with identity.
    Object(Object),
    /// Callable; unsupported.
    Function(Function),
}

impl Value {
    /// True for values without identity.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Object(_) | Self::Function(_))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Self::String(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Self::Object(o)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Self::Function(f)
    }
}

/// Primitive held inside a boxed-scalar wrapper (`new Number(1)` and friends).
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Boxed boolean.
    Bool(bool),
    /// Boxed number.
    Number(f64),
    /// Boxed bigint.
    BigInt(i128),
    /// Boxed string.
    String(JsString),
}

impl From<&Scalar> for Value {
    fn from(s: &Scalar) -> Self {
        match s {
            Scalar::Bool(b) => Self::Bool(*b),
            Scalar::Number(n) => Self::Number(*n),
            Scalar::BigInt(n) => Self::BigInt(*n),
            Scalar::String(s) => Self::String(s.clone()),
        }
    }
}

/// Prototype lineage of a keyed record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Prototype {
    /// Plain `Object.prototype`.
    #[default]
    Object,
    /// `Object.create(null)`.
    Null,
    /// A base-record prototype from another realm. It exposes the standard
    /// member set, so it serializes like a plain record.
    ForeignObject,
    /// Instance of a user-defined class.
    Class(String),
}

/// Own property key of a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String key.
    String(JsString),
    /// Symbol key (description only). Never serialized.
    Symbol(String),
}

/// Conversion hook ("to portable form"), invoked at most once per node.
pub type ConversionHook = Rc<dyn Fn(&Record) -> Value>;

/// Keyed record: ordered own properties plus prototype lineage.
#[derive(Clone, Default)]
pub struct Record {
    prototype: Prototype,
    properties: Vec<(PropertyKey, Value)>,
    conversion: Option<ConversionHook>,
}

impl Record {
    /// Empty record with `Object.prototype` lineage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty record with the given lineage.
    pub fn with_prototype(prototype: Prototype) -> Self {
        Self {
            prototype,
            ..Self::default()
        }
    }

    /// Attach a conversion hook. A text result is parsed as JSON before use.
    pub fn with_conversion(mut self, hook: impl Fn(&Record) -> Value + 'static) -> Self {
        self.conversion = Some(Rc::new(hook));
        self
    }

    /// Builder form of [`Record::insert`].
    pub fn with(mut self, key: impl Into<JsString>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a string-keyed property, keeping its original position if it
    /// already exists. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<JsString>, value: impl Into<Value>) -> Option<Value> {
        self.put(PropertyKey::String(key.into()), value.into())
    }

    /// Set a symbol-keyed property.
    pub fn insert_symbol(&mut self, description: &str, value: impl Into<Value>) -> Option<Value> {
        self.put(PropertyKey::Symbol(description.to_owned()), value.into())
    }

    fn put(&mut self, key: PropertyKey, value: Value) -> Option<Value> {
        if let Some((_, slot)) = self.properties.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(slot, value));
        }
        self.properties.push((key, value));
        None
    }

    /// Look up a string-keyed property.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.string_entries()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Prototype lineage.
    pub fn prototype(&self) -> &Prototype {
        &self.prototype
    }

    /// All own properties in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&PropertyKey, &Value)> {
        self.properties.iter().map(|(k, v)| (k, v))
    }

    /// String-keyed own properties in insertion order.
    pub fn string_entries(&self) -> impl Iterator<Item = (&JsString, &Value)> {
        self.properties.iter().filter_map(|(k, v)| match k {
            PropertyKey::String(s) => Some((s, v)),
            PropertyKey::Symbol(_) => None,
        })
    }

    /// True when any own key is a symbol.
    pub fn has_symbol_keys(&self) -> bool {
        self.properties
            .iter()
            .any(|(k, _)| matches!(k, PropertyKey::Symbol(_)))
    }

    /// The conversion hook, if any.
    pub fn conversion(&self) -> Option<&ConversionHook> {
        self.conversion.as_ref()
    }

    /// Number of own properties (string and symbol).
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// True when there are no own properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("prototype", &self.prototype)
            .field("keys", &self.properties.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .field("conversion", &self.conversion.is_some())
            .finish()
    }
}

/// Payload of an [`Object`] node.
#[derive(Clone, Debug)]
pub enum ObjectKind {
    /// Object wrapper around a primitive.
    Boxed(Scalar),
    /// Ordered sequence; `None` marks a hole.
    Array(Vec<Option<Value>>),
    /// Insertion-ordered set.
    Set(Vec<Value>),
    /// Insertion-ordered map.
    Map(Vec<(Value, Value)>),
    /// Date-time instant in epoch milliseconds (`NaN` for an invalid date).
    Date(f64),
    /// Regular expression in canonical `source`/`flags` form.
    RegExp {
        /// Pattern source as reported by `RegExp.prototype.source`.
        source: String,
        /// Flag letters.
        flags: String,
    },
    /// Keyed record.
    Record(Record),
}

/// Shared handle to a node with identity.
///
/// Interior mutability lets callers close cycles after construction. Do not
/// hold a mutable borrow across a call into the serializer.
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectKind>>);

impl Object {
    /// Wrap a payload in a fresh node.
    pub fn new(kind: ObjectKind) -> Self {
        Self(Rc::new(RefCell::new(kind)))
    }

    /// Dense array.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Self::new(ObjectKind::Array(items.into_iter().map(Some).collect()))
    }

    /// Array with explicit holes.
    pub fn sparse_array(slots: Vec<Option<Value>>) -> Self {
        Self::new(ObjectKind::Array(slots))
    }

    /// Set.
    pub fn set(members: impl IntoIterator<Item = Value>) -> Self {
        Self::new(ObjectKind::Set(members.into_iter().collect()))
    }

    /// Map.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Self::new(ObjectKind::Map(entries.into_iter().collect()))
    }

    /// Date from epoch milliseconds.
    pub fn date(epoch_ms: f64) -> Self {
        Self::new(ObjectKind::Date(epoch_ms))
    }

    /// Regular expression.
    pub fn regexp(source: &str, flags: &str) -> Self {
        Self::new(ObjectKind::RegExp {
            source: source.to_owned(),
            flags: flags.to_owned(),
        })
    }

    /// Boxed scalar.
    pub fn boxed(scalar: Scalar) -> Self {
        Self::new(ObjectKind::Boxed(scalar))
    }

    /// Keyed record.
    pub fn record(record: Record) -> Self {
        Self::new(ObjectKind::Record(record))
    }

    /// Identity of this node.
    pub fn id(&self) -> NodeId {
        NodeId(Rc::as_ptr(&self.0).addr())
    }

    /// True when both handles point at the same node.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the payload.
    pub fn kind(&self) -> Ref<'_, ObjectKind> {
        self.0.borrow()
    }

    /// Mutably borrow the payload.
    pub fn kind_mut(&self) -> RefMut<'_, ObjectKind> {
        self.0.borrow_mut()
    }

    /// Set a property on a record node. Returns `false` for other kinds.
    pub fn insert(&self, key: impl Into<JsString>, value: impl Into<Value>) -> bool {
        match &mut *self.kind_mut() {
            ObjectKind::Record(record) => {
                record.insert(key, value);
                true
            }
            _ => false,
        }
    }

    /// Append to an array or set node. Returns `false` for other kinds.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        match &mut *self.kind_mut() {
            ObjectKind::Array(items) => {
                items.push(Some(value.into()));
                true
            }
            ObjectKind::Set(members) => {
                members.push(value.into());
                true
            }
            _ => false,
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Payloads may be cyclic; print identity and kind only.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.kind() {
            ObjectKind::Boxed(_) => "Boxed",
            ObjectKind::Array(_) => "Array",
            ObjectKind::Set(_) => "Set",
            ObjectKind::Map(_) => "Map",
            ObjectKind::Date(_) => "Date",
            ObjectKind::RegExp { .. } => "RegExp",
            ObjectKind::Record(_) => "Record",
        };
        write!(f, "Object({kind}@{:#x})", self.id().0)
    }
}
