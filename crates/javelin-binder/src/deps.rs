//! The transitive dependency collector.
//!
//! Every classpath class referenced through a resolved symbol in a produced
//! header is copied verbatim into a second output map, so downstream
//! compilations can find it without re-resolving the full classpath.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::binder::Binder;
use crate::env::Env;
use crate::lower::collect_class_syms;
use crate::sym::ClassSymbol;

/// Access to the original bytes of classpath classes. Out-of-scope readers
/// (jar indexes, directories) implement this; the collector only copies.
pub trait ClasspathBytes {
    fn bytes(&self, sym: &ClassSymbol) -> Option<Vec<u8>>;
}

/// Referenced classpath symbols, plus verbatim byte copies of those the
/// provider can produce.
pub(crate) fn collect_transitive(
    binder: &Binder<'_>,
    provider: Option<&dyn ClasspathBytes>,
) -> (BTreeSet<ClassSymbol>, BTreeMap<String, Vec<u8>>) {
    let mut referenced = BTreeSet::new();
    for sym in &binder.order {
        if let Some(bound) = binder.bound.get(sym) {
            collect_class_syms(&bound, &mut referenced);
        }
    }
    for module in &binder.modules {
        for service in &module.uses {
            referenced.insert(service.clone());
        }
        for provide in &module.provides {
            referenced.insert(provide.service.clone());
            referenced.extend(provide.implementations.iter().cloned());
        }
    }
    referenced.retain(|sym| !binder.source.contains_key(sym));

    let mut transitive = BTreeMap::new();
    if let Some(provider) = provider {
        for sym in &referenced {
            if let Some(bytes) = provider.bytes(sym) {
                transitive.insert(sym.binary_name().to_owned(), bytes);
            }
        }
    }
    debug!(
        referenced = referenced.len(),
        copied = transitive.len(),
        "transitive collection complete"
    );
    (referenced, transitive)
}
