//! Layered symbol environments.
//!
//! An [`Env`] is an abstract lookup from symbol to bound representation.
//! The binder's own tables form a *source env*; the embedder supplies a
//! *classpath env* (typically lazily decoded from class artifacts). A
//! [`CompoundEnv`] composes layers: queries try each in order, and writes
//! only ever go to the source side. Once a value is published through an env
//! it is immutable.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

pub trait Env<K, V> {
    fn get(&self, key: &K) -> Option<Arc<V>>;
}

/// A hash-map-backed env.
#[derive(Debug, Clone)]
pub struct SimpleEnv<K, V> {
    map: HashMap<K, Arc<V>>,
}

impl<K: Eq + Hash, V> SimpleEnv<K, V> {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.map.insert(key, Arc::clone(&value));
        value
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<K: Eq + Hash, V> Default for SimpleEnv<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> Env<K, V> for SimpleEnv<K, V> {
    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.map.get(key).map(Arc::clone)
    }
}

/// An ordered stack of env layers; the first hit wins.
pub struct CompoundEnv<'e, K, V> {
    layers: Vec<&'e dyn Env<K, V>>,
}

impl<'e, K, V> CompoundEnv<'e, K, V> {
    pub fn of(layer: &'e dyn Env<K, V>) -> Self {
        Self {
            layers: vec![layer],
        }
    }

    /// Adds a layer consulted after the existing ones.
    pub fn append(mut self, layer: &'e dyn Env<K, V>) -> Self {
        self.layers.push(layer);
        self
    }
}

impl<K, V> Env<K, V> for CompoundEnv<'_, K, V> {
    fn get(&self, key: &K) -> Option<Arc<V>> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_env_prefers_earlier_layers() {
        let mut source = SimpleEnv::new();
        source.insert("a", 1);
        let mut classpath = SimpleEnv::new();
        classpath.insert("a", 2);
        classpath.insert("b", 3);

        let env = CompoundEnv::of(&source).append(&classpath);
        assert_eq!(env.get(&"a").as_deref(), Some(&1));
        assert_eq!(env.get(&"b").as_deref(), Some(&3));
        assert_eq!(env.get(&"c"), None);
    }
}
