// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serialize value graphs into self-contained JavaScript expressions.
//!
//! `echo-hydrate` turns an in-memory value graph (primitives, arrays, sets,
//! maps, dates, patterns, boxed scalars and keyed records, including shared
//! and cyclic structure) into one expression that a JS engine evaluates back
//! into a deeply equal value. It is meant for hydration: the host renders
//! state into a `<script>` block and the page evaluates it, no decoder
//! required.
//!
//! ```
//! use echo_hydrate::{serialize, Object, Record};
//!
//! let shared = Object::record(Record::new().with("x", 1));
//! let root = Object::record(Record::new().with("p", shared.clone()).with("q", shared));
//! assert_eq!(
//!     serialize(&root.into()),
//!     "(function(a){a.x=1;return {p:a,q:a}}({}))"
//! );
//! ```
//!
//! # Passes
//!
//! 1. [`canonicalize`] walks the graph once, counting references by node
//!    identity, applying conversion hooks and reporting unsupported values.
//! 2. [`emit`] names every node counted more than once (most-referenced
//!    first) and renders the expression, binding names through a
//!    self-invoking function when needed.
//!
//! Serialization never fails. Callables, symbol keys and foreign class
//! instances are reported through a [`DiagnosticSink`] and left out of the
//! output (class instances still contribute their own keys).
#![forbid(unsafe_code)]

pub mod canonical;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod json;
pub mod literal;
pub mod naming;
pub mod value;

pub use canonical::{canonicalize, Canonical, ReferenceCounts};
pub use config::{ConfigError, SerializeOptions};
pub use diagnostics::{
    CollectingSink, DiagnosticBudget, DiagnosticSink, TracingSink, DEFAULT_DIAGNOSTIC_LIMIT,
};
pub use emit::emit;
pub use json::parse_json;
pub use value::{
    ConversionHook, Function, JsString, NodeId, Object, ObjectKind, PropertyKey, Prototype,
    Record, Scalar, Value,
};

use tracing::Level;

/// Serialize with process-wide options and the `tracing` sink.
pub fn serialize(value: &Value) -> String {
    serialize_with(value, SerializeOptions::global(), &mut TracingSink)
}

/// Serialize, reporting diagnostics at `level`.
pub fn serialize_at(value: &Value, level: Level) -> String {
    let options = SerializeOptions {
        level,
        ..SerializeOptions::global().clone()
    };
    serialize_with(value, &options, &mut TracingSink)
}

/// Serialize with explicit options and diagnostic sink.
///
/// The diagnostic budget is fresh for every call.
pub fn serialize_with(
    value: &Value,
    options: &SerializeOptions,
    sink: &mut dyn DiagnosticSink,
) -> String {
    let mut budget = DiagnosticBudget::new(options.diagnostic_limit);
    let canonical = canonicalize(value, &mut budget, sink, options.level);
    emit(value, &canonical)
}
