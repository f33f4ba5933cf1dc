// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Expression emission.
//!
//! Nodes referenced more than once are bound to short names. When any names
//! exist the main expression is wrapped as
//!
//! ```text
//! (function(a,b){a.x=b;b[0]=a;return {root:a}}({},Array(1)))
//! ```
//!
//! where each argument is an empty shell of the right kind and the
//! statements fill the shells in. Filling after creation is what lets cycles
//! be expressed at all.

use crate::canonical::Canonical;
use crate::literal;
use crate::naming::NameTable;
use crate::value::{Object, ObjectKind, Prototype, Record, Value};

/// Render `root` using the counts and conversions gathered by
/// [`crate::canonicalize`].
pub fn emit(root: &Value, canonical: &Canonical) -> String {
    let names = NameTable::assign(canonical.counts());
    let emitter = Emitter {
        canonical,
        names: &names,
    };

    let mut main = String::new();
    emitter.render(root, &mut main);
    tracing::debug!(named = names.len(), "emitted expression");
    if names.is_empty() {
        return main;
    }

    let mut params = Vec::with_capacity(names.len());
    let mut shells = Vec::with_capacity(names.len());
    let mut statements = Vec::new();
    for (node, name) in names.iter() {
        params.push(name);
        shells.push(emitter.shell(node, name, &mut statements));
    }
    statements.push(format!("return {main}"));
    format!(
        "(function({}){{{}}}({}))",
        params.join(","),
        statements.join(";"),
        shells.join(",")
    )
}

fn join<T>(items: impl Iterator<Item = T>, out: &mut String, mut each: impl FnMut(T, &mut String)) {
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(',');
        }
        each(item, out);
    }
}

struct Emitter<'a> {
    canonical: &'a Canonical,
    names: &'a NameTable,
}

impl<'a> Emitter<'a> {
    /// Follow conversion substitutions to the value actually emitted.
    fn resolve<'v>(&self, value: &'v Value) -> &'v Value
    where
        'a: 'v,
    {
        let mut current = value;
        while let Value::Object(obj) = current {
            match self.canonical.conversion(obj.id()) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Callables contribute nothing to their container.
    fn omitted(&self, value: &Value) -> bool {
        matches!(self.resolve(value), Value::Function(_))
    }

    fn render(&self, value: &Value, out: &mut String) {
        match self.resolve(value) {
            Value::Object(obj) => match self.names.get(obj.id()) {
                Some(name) => out.push_str(name),
                None => self.render_object(obj, out),
            },
            other => literal::primitive(other, out),
        }
    }

    fn rendered(&self, value: &Value) -> String {
        let mut out = String::new();
        self.render(value, &mut out);
        out
    }

    /// Full inline form of an object, ignoring its own name.
    fn render_object(&self, obj: &Object, out: &mut String) {
        match &*obj.kind() {
            ObjectKind::Boxed(scalar) => {
                out.push_str("Object(");
                literal::scalar(scalar, out);
                out.push(')');
            }
            ObjectKind::RegExp { source, flags } => literal::regexp(source, flags, out),
            ObjectKind::Date(ms) => {
                out.push_str("new Date(");
                literal::number(*ms, out);
                out.push(')');
            }
            ObjectKind::Array(items) => {
                out.push('[');
                for (i, slot) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if let Some(item) = slot.as_ref().filter(|v| !self.omitted(v)) {
                        self.render(item, out);
                    }
                }
                // `[1,]` has length 1; a trailing hole needs its own comma.
                let trailing_hole = items
                    .last()
                    .is_some_and(|slot| slot.as_ref().is_none_or(|v| self.omitted(v)));
                if trailing_hole {
                    out.push(',');
                }
                out.push(']');
            }
            ObjectKind::Set(members) => {
                out.push_str("new Set([");
                join(members.iter().filter(|v| !self.omitted(v)), out, |v, out| {
                    self.render(v, out);
                });
                out.push_str("])");
            }
            ObjectKind::Map(entries) => {
                out.push_str("new Map([");
                let live = entries
                    .iter()
                    .filter(|(k, v)| !self.omitted(k) && !self.omitted(v));
                join(live, out, |(k, v), out| {
                    out.push('[');
                    self.render(k, out);
                    out.push(',');
                    self.render(v, out);
                    out.push(']');
                });
                out.push_str("])");
            }
            ObjectKind::Record(record) => self.render_record(record, out),
        }
    }

    fn render_record(&self, record: &Record, out: &mut String) {
        let live: Vec<_> = record
            .string_entries()
            .filter(|(_, v)| !self.omitted(v))
            .collect();
        if *record.prototype() == Prototype::Null {
            if live.is_empty() {
                out.push_str("Object.create(null)");
                return;
            }
            // Brace literals always get Object.prototype; declare the
            // properties on a prototype-less object instead.
            out.push_str("Object.create(null,{");
            join(live.into_iter(), out, |(k, v), out| {
                literal::key(k, out);
                out.push_str(":{value:");
                self.render(v, out);
                out.push_str(",writable:true,enumerable:true,configurable:true}");
            });
            out.push_str("})");
            return;
        }
        out.push('{');
        join(live.into_iter(), out, |(k, v), out| {
            literal::key(k, out);
            out.push(':');
            self.render(v, out);
        });
        out.push('}');
    }

    /// Empty placeholder for a named node; pushes the statements that fill it.
    fn shell(&self, node: &Object, name: &str, statements: &mut Vec<String>) -> String {
        match &*node.kind() {
            ObjectKind::Boxed(_) | ObjectKind::Date(_) | ObjectKind::RegExp { .. } => {
                let mut out = String::new();
                self.render_object(node, &mut out);
                out
            }
            ObjectKind::Array(items) => {
                for (i, slot) in items.iter().enumerate() {
                    if let Some(item) = slot.as_ref().filter(|v| !self.omitted(v)) {
                        statements.push(format!("{name}[{i}]={}", self.rendered(item)));
                    }
                }
                format!("Array({})", items.len())
            }
            ObjectKind::Set(members) => {
                let calls: Vec<String> = members
                    .iter()
                    .filter(|v| !self.omitted(v))
                    .map(|v| format!("add({})", self.rendered(v)))
                    .collect();
                if !calls.is_empty() {
                    statements.push(format!("{name}.{}", calls.join(".")));
                }
                "new Set".to_owned()
            }
            ObjectKind::Map(entries) => {
                let calls: Vec<String> = entries
                    .iter()
                    .filter(|(k, v)| !self.omitted(k) && !self.omitted(v))
                    .map(|(k, v)| format!("set({},{})", self.rendered(k), self.rendered(v)))
                    .collect();
                if !calls.is_empty() {
                    statements.push(format!("{name}.{}", calls.join(".")));
                }
                "new Map".to_owned()
            }
            ObjectKind::Record(record) => {
                let null_proto = *record.prototype() == Prototype::Null;
                for (k, v) in record.string_entries().filter(|(_, v)| !self.omitted(v)) {
                    let value = self.rendered(v);
                    if !null_proto && *k == "__proto__" {
                        // Assignment would hit the prototype setter.
                        statements.push(format!(
                            "Object.defineProperty({name},\"__proto__\",{{value:{value},writable:true,enumerable:true,configurable:true}})"
                        ));
                    } else {
                        let mut target = name.to_owned();
                        literal::property(k, &mut target);
                        statements.push(format!("{target}={value}"));
                    }
                }
                if null_proto {
                    "Object.create(null)".to_owned()
                } else {
                    "{}".to_owned()
                }
            }
        }
    }
}
