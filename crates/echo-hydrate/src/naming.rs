// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Short deterministic identifiers for shared nodes.

use rustc_hash::FxHashMap;

use crate::canonical::ReferenceCounts;
use crate::value::{NodeId, Object};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_$";

/// Words a generated identifier must not spell: the engine's reserved words
/// plus the globals the emitted wrapper itself refers to.
const RESERVED: &[&str] = &[
    "Array", "Date", "Infinity", "Map", "NaN", "Object", "Set", "abstract", "await", "boolean",
    "break", "byte", "case", "catch", "char", "class", "const", "continue", "debugger", "default",
    "delete", "do", "double", "else", "enum", "eval", "export", "extends", "false", "final",
    "finally", "float", "for", "function", "goto", "if", "implements", "import", "in",
    "instanceof", "int", "interface", "let", "long", "native", "new", "null", "package",
    "private", "protected", "public", "return", "short", "static", "super", "switch",
    "synchronized", "this", "throw", "throws", "transient", "true", "try", "typeof", "undefined",
    "var", "void", "volatile", "while", "with", "yield",
];

/// The `index`-th identifier in bijective base-54 over [`ALPHABET`].
///
/// Reserved spellings get a `0` suffix; generated names never contain digits,
/// so the suffixed form cannot collide with another generated name.
pub fn identifier(index: usize) -> String {
    let base = ALPHABET.len();
    let mut rev = Vec::new();
    let mut n = index;
    loop {
        rev.push(ALPHABET[n % base]);
        if n < base {
            break;
        }
        n = n / base - 1;
    }
    let mut name: String = rev.iter().rev().map(|b| char::from(*b)).collect();
    if RESERVED.contains(&name.as_str()) {
        name.push('0');
    }
    name
}

/// Names for every node referenced more than once.
#[derive(Debug, Default)]
pub struct NameTable {
    entries: Vec<(Object, String)>,
    index: FxHashMap<NodeId, usize>,
}

impl NameTable {
    /// Assign names in descending reference count, first-seen order breaking ties.
    pub fn assign(counts: &ReferenceCounts) -> Self {
        let mut shared: Vec<(&Object, usize)> = counts.iter().filter(|(_, c)| *c > 1).collect();
        // stable: equal counts keep first-seen order
        shared.sort_by(|a, b| b.1.cmp(&a.1));

        let mut table = Self::default();
        for (i, (node, _)) in shared.into_iter().enumerate() {
            table.index.insert(node.id(), i);
            table.entries.push((node.clone(), identifier(i)));
        }
        table
    }

    /// Name bound to `id`, if shared.
    pub fn get(&self, id: NodeId) -> Option<&str> {
        self.index.get(&id).map(|i| self.entries[*i].1.as_str())
    }

    /// Named nodes in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (&Object, &str)> {
        self.entries.iter().map(|(o, n)| (o, n.as_str()))
    }

    /// Number of named nodes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is shared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letters_then_pairs() {
        assert_eq!(identifier(0), "a");
        assert_eq!(identifier(25), "z");
        assert_eq!(identifier(26), "A");
        assert_eq!(identifier(52), "_");
        assert_eq!(identifier(53), "$");
        assert_eq!(identifier(54), "aa");
        assert_eq!(identifier(55), "ab");
        assert_eq!(identifier(54 + 54 * 54), "aaa");
    }

    #[test]
    fn reserved_words_get_numeric_suffix() {
        // d=3, o=14 -> (3 + 1) * 54 + 14
        assert_eq!(identifier(230), "do0");
        // i=8, f=5 -> (8 + 1) * 54 + 5
        assert_eq!(identifier(491), "if0");
        // i=8, n=13
        assert_eq!(identifier(499), "in0");
    }

    #[test]
    fn identifiers_are_unique() {
        let names: std::collections::HashSet<String> = (0..5000).map(identifier).collect();
        assert_eq!(names.len(), 5000);
    }
}
