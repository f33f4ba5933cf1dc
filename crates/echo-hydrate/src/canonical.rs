// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph canonicalization: identity reference counts, conversion hooks and
//! unsupported-value diagnostics.
//!
//! The walk is depth-first pre-order. A node's children are visited only the
//! first time the node is seen; later encounters just bump its count, which
//! is what makes cycles terminate.
//!
//! Conversion results are recorded in a side table keyed by the original
//! node and substituted at emission time. The caller's graph is never
//! mutated.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::Level;

use crate::diagnostics::{DiagnosticBudget, DiagnosticSink};
use crate::json::parse_json;
use crate::value::{NodeId, Object, ObjectKind, Prototype, Record, Value};

/// Identity-keyed reference counts, iterable in first-seen order.
#[derive(Debug, Default)]
pub struct ReferenceCounts {
    entries: Vec<(Object, usize)>,
    index: FxHashMap<NodeId, usize>,
}

impl ReferenceCounts {
    /// Count for `id`, if the node was encountered.
    pub fn get(&self, id: NodeId) -> Option<usize> {
        self.index.get(&id).map(|i| self.entries[*i].1)
    }

    /// Bump an existing entry. Returns `false` if `id` is unknown.
    fn increment(&mut self, id: NodeId) -> bool {
        match self.index.get(&id) {
            Some(i) => {
                self.entries[*i].1 += 1;
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, node: &Object) {
        self.index.insert(node.id(), self.entries.len());
        self.entries.push((node.clone(), 1));
    }

    /// Nodes and counts in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&Object, usize)> {
        self.entries.iter().map(|(o, c)| (o, *c))
    }

    /// Number of distinct nodes counted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the graph holds no objects.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Output of [`canonicalize`]; input to [`crate::emit`].
#[derive(Debug, Default)]
pub struct Canonical {
    counts: ReferenceCounts,
    conversions: FxHashMap<NodeId, Value>,
    suppressed: usize,
}

impl Canonical {
    /// The reference-count table.
    pub fn counts(&self) -> &ReferenceCounts {
        &self.counts
    }

    /// Portable form substituted for a converted node.
    pub fn conversion(&self, id: NodeId) -> Option<&Value> {
        self.conversions.get(&id)
    }

    /// Diagnostics dropped by the rate limit during this call.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }
}

/// Walk `root` once, counting every object by identity.
///
/// Unsupported shapes are reported to `sink` at `level` while `budget`
/// allows; processing always continues.
pub fn canonicalize(
    root: &Value,
    budget: &mut DiagnosticBudget,
    sink: &mut dyn DiagnosticSink,
    level: Level,
) -> Canonical {
    let suppressed_before = budget.suppressed();
    let mut walker = Canonicalizer {
        counts: ReferenceCounts::default(),
        conversions: FxHashMap::default(),
        plain: FxHashSet::default(),
        budget,
        sink,
        level,
    };
    walker.visit(root);

    let Canonicalizer {
        counts,
        conversions,
        budget,
        ..
    } = walker;
    let suppressed = budget.suppressed() - suppressed_before;
    tracing::debug!(
        nodes = counts.len(),
        converted = conversions.len(),
        suppressed,
        "canonicalized value graph"
    );
    Canonical {
        counts,
        conversions,
        suppressed,
    }
}

struct Canonicalizer<'a> {
    counts: ReferenceCounts,
    conversions: FxHashMap<NodeId, Value>,
    /// Hook-bearing records whose hook gave no usable result; walked as-is.
    plain: FxHashSet<NodeId>,
    budget: &'a mut DiagnosticBudget,
    sink: &'a mut dyn DiagnosticSink,
    level: Level,
}

impl Canonicalizer<'_> {
    fn report(&mut self, message: impl FnOnce() -> String) {
        if self.budget.admit() {
            self.sink.report(self.level, &message());
        }
    }

    fn visit(&mut self, value: &Value) {
        match value {
            Value::Object(obj) => self.visit_object(obj),
            Value::Function(f) => {
                self.report(|| format!("Cannot stringify a function {}", f.name()));
            }
            _ => {}
        }
    }

    fn visit_object(&mut self, obj: &Object) {
        let id = obj.id();
        if self.counts.increment(id) {
            return;
        }
        if let Some(converted) = self.conversions.get(&id).cloned() {
            self.visit(&converted);
            return;
        }
        if let Some(converted) = self.convert(obj) {
            self.conversions.insert(id, converted.clone());
            self.visit(&converted);
            return;
        }

        self.counts.insert(obj);
        let kind = obj.kind();
        match &*kind {
            ObjectKind::Boxed(_) | ObjectKind::Date(_) | ObjectKind::RegExp { .. } => {}
            ObjectKind::Array(items) => {
                for item in items.iter().flatten() {
                    self.visit(item);
                }
            }
            ObjectKind::Set(members) => {
                for member in members {
                    self.visit(member);
                }
            }
            ObjectKind::Map(entries) => {
                for (k, v) in entries {
                    self.visit(k);
                    self.visit(v);
                }
            }
            ObjectKind::Record(record) => self.visit_record(record),
        }
    }

    fn visit_record(&mut self, record: &Record) {
        if record.conversion().is_none() {
            if let Prototype::Class(name) = record.prototype() {
                self.report(|| format!("Cannot stringify arbitrary non-POJOs {name}"));
            }
        }
        if record.has_symbol_keys() {
            self.report(|| "Cannot stringify POJOs with symbolic keys".to_owned());
        }
        for (_, value) in record.string_entries() {
            self.visit(value);
        }
    }

    /// Run the conversion hook of a record node, once.
    ///
    /// Text results are parsed as JSON. `None` means the node is walked as a
    /// plain record: no hook, a hook already found unusable, a text result
    /// that does not parse, or a hook that returns the node itself.
    fn convert(&mut self, obj: &Object) -> Option<Value> {
        let id = obj.id();
        if self.plain.contains(&id) {
            return None;
        }
        let converted = {
            let kind = obj.kind();
            let ObjectKind::Record(record) = &*kind else {
                return None;
            };
            let hook = record.conversion()?;
            hook(record)
        };
        let converted = match converted {
            Value::String(text) => text.to_utf8().as_deref().and_then(parse_json),
            Value::Object(ref result) if result.ptr_eq(obj) => None,
            other => Some(other),
        };
        if converted.is_none() {
            self.plain.insert(id);
        }
        converted
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::value::{Function, Record};

    fn run(root: &Value) -> (Canonical, CollectingSink) {
        let mut sink = CollectingSink::new();
        let mut budget = DiagnosticBudget::default();
        let canonical = canonicalize(root, &mut budget, &mut sink, Level::WARN);
        (canonical, sink)
    }

    #[test]
    fn shared_node_is_counted_twice() {
        let d = Object::record(Record::new().with("x", 1));
        let root = Object::record(Record::new().with("p", d.clone()).with("q", d.clone()));
        let (canonical, sink) = run(&root.clone().into());
        assert_eq!(canonical.counts().get(d.id()), Some(2));
        assert_eq!(canonical.counts().get(root.id()), Some(1));
        assert!(sink.is_empty());
    }

    #[test]
    fn cycle_terminates() {
        let a = Object::record(Record::new());
        a.insert("self", a.clone());
        let (canonical, _) = run(&a.clone().into());
        assert_eq!(canonical.counts().get(a.id()), Some(2));
        assert_eq!(canonical.counts().len(), 1);
    }

    #[test]
    fn functions_are_reported_not_counted() {
        let root = Object::array([Value::Function(Function::new("handler")), 1.into()]);
        let (canonical, sink) = run(&root.into());
        assert_eq!(canonical.counts().len(), 1);
        assert_eq!(sink.messages.len(), 1);
        assert_eq!(sink.messages[0].0, Level::WARN);
        assert_eq!(sink.messages[0].1, "Cannot stringify a function handler");
    }

    #[test]
    fn converted_node_is_replaced_by_its_result() {
        let custom = Object::record(
            Record::with_prototype(Prototype::Class("Point".into()))
                .with_conversion(|_| Value::from("[1,2]")),
        );
        let root = Object::array([custom.clone().into(), custom.clone().into()]);
        let (canonical, sink) = run(&root.into());
        assert!(sink.is_empty());
        assert_eq!(canonical.counts().get(custom.id()), None);
        let Some(Value::Object(result)) = canonical.conversion(custom.id()) else {
            panic!("expected converted object");
        };
        assert_eq!(canonical.counts().get(result.id()), Some(2));
    }

    #[test]
    fn hook_runs_once_per_node() {
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let seen = calls.clone();
        let custom = Object::record(Record::new().with_conversion(move |_| {
            seen.set(seen.get() + 1);
            Value::from(7)
        }));
        let root = Object::array([custom.clone().into(), custom.into()]);
        run(&root.into());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn unparseable_text_falls_back_to_the_record() {
        let custom = Object::record(
            Record::with_prototype(Prototype::Class("Opaque".into()))
                .with("k", 1)
                .with_conversion(|_| Value::from("not json")),
        );
        let (canonical, sink) = run(&custom.clone().into());
        assert!(sink.is_empty());
        assert_eq!(canonical.conversion(custom.id()), None);
        assert_eq!(canonical.counts().get(custom.id()), Some(1));
    }
}
