//! Lookup keys and per-unit import scopes.
//!
//! A [`LookupKey`] is a non-empty dot-separated list of simple names. Scope
//! lookup resolves a *root* class symbol and leaves a possibly non-empty tail
//! of names to be resolved as nested classes through the member env in a
//! second phase.

use std::collections::HashMap;

use javelin_core::Name;
use javelin_tree as tree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    names: Vec<Name>,
}

impl LookupKey {
    pub fn new(names: Vec<Name>) -> Self {
        assert!(!names.is_empty(), "lookup key must be non-empty");
        Self { names }
    }

    pub fn from_path(path: &[Name]) -> Self {
        Self::new(path.to_vec())
    }

    pub fn first(&self) -> &Name {
        &self.names[0]
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    /// Number of simple-name segments; always at least one.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// The key joined with dots, for diagnostics.
    pub fn dotted(&self) -> String {
        self.names
            .iter()
            .map(Name::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The key joined with slashes, as a candidate binary name.
    pub fn binary(&self, len: usize) -> String {
        self.names[..len]
            .iter()
            .map(Name::as_str)
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Imports of one compilation unit, indexed for lookup.
#[derive(Debug, Default, Clone)]
pub struct ImportIndex {
    /// `import a.b.C;` — simple name to full path.
    pub singles: HashMap<Name, LookupKey>,
    /// `import a.b.*;` — the path names a package or a type.
    pub on_demand: Vec<LookupKey>,
    /// `import static a.b.C.D;` — member name to the owning type's path.
    pub static_singles: HashMap<Name, LookupKey>,
    /// `import static a.b.C.*;` — paths naming the owning types.
    pub static_on_demand: Vec<LookupKey>,
}

impl ImportIndex {
    /// Indexes a unit's imports. Duplicate single-type imports of the same
    /// simple name are reported by the caller; the first one wins here.
    pub fn from_unit(unit: &tree::CompUnit) -> Self {
        let mut index = ImportIndex::default();
        for import in &unit.imports {
            if import.path.is_empty() {
                continue;
            }
            let key = LookupKey::from_path(&import.path);
            match (import.is_static, import.wildcard) {
                (false, false) => {
                    let simple = import.path.last().expect("non-empty import path").clone();
                    index.singles.entry(simple).or_insert(key);
                }
                (false, true) => index.on_demand.push(key),
                (true, false) => {
                    if import.path.len() < 2 {
                        continue;
                    }
                    let member = import.path.last().expect("non-empty import path").clone();
                    let owner = LookupKey::from_path(&import.path[..import.path.len() - 1]);
                    index.static_singles.entry(member).or_insert(owner);
                }
                (true, true) => index.static_on_demand.push(key),
            }
        }
        index
    }
}
