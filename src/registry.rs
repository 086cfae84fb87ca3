//! Per-unit adapter deduplication.
//!
//! Each distinct adapter identity (provider plus concrete type arguments) is
//! declared exactly once in a unit's output, as a lazily initialised static.
//! Every field that needs it refers to that static by name.
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde::Serialize;

use crate::ir::{TypePath, TypeRef};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AdapterKey {
    pub provider: TypePath,
    pub args: Vec<TypeRef>,
}

/// Reference to a declared adapter instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AdapterHandle {
    /// Identifier of the static in generated code.
    pub ident: String,
    pub key: AdapterKey,
}

/// Insertion-ordered, so the declaration block comes out in first-use order.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    entries: Mutex<IndexMap<AdapterKey, AdapterHandle>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl AdapterKey {
    pub fn new(provider: TypePath, args: Vec<TypeRef>) -> Self {
        let provider = TypePath::new(provider.as_str().trim_start_matches("::"));
        Self { provider, args: args.iter().map(TypeRef::normalized).collect() }
    }

    /// `crate::ListAdapter<crate::Point>` -> `LIST_ADAPTER_CRATE_POINT`.
    pub fn static_ident(&self) -> String {
        let mut ident = crate::model::snake_case(self.provider.last_segment()).to_uppercase();
        for arg in &self.args {
            let flat = screaming(&arg.to_string());
            if !flat.is_empty() {
                ident.push('_');
                ident.push_str(&flat);
            }
        }
        ident
    }
}

impl fmt::Display for AdapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            return write!(f, "{}", self.provider);
        }
        let ty = TypeRef::Path { path: self.provider.clone(), args: self.args.clone() };
        write!(f, "{ty}")
    }
}

impl AdapterRegistry {
    pub fn new() -> Self { Self::default() }

    /// Look up or declare the adapter for `key`.
    pub fn register(&self, key: AdapterKey) -> AdapterHandle {
        let mut entries = self.lock();
        if let Some(handle) = entries.get(&key) {
            log::trace!("adapter {key} already declared as {}", handle.ident);
            return handle.clone();
        }

        let base = key.static_ident();
        let mut ident = base.clone();
        let mut n = 1;
        while entries.values().any(|h| h.ident == ident) {
            n += 1;
            ident = format!("{base}_{n}");
        }

        log::debug!("declaring adapter {key} as {ident}");
        let handle = AdapterHandle { ident, key: key.clone() };
        entries.insert(key, handle.clone());
        handle
    }

    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    /// Every declared adapter, in first-registration order.
    pub fn handles(&self) -> Vec<AdapterHandle> {
        self.lock().values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<AdapterKey, AdapterHandle>> {
        // The map is never left half-updated, so a poisoned lock is still usable.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn screaming(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for part in text.split(|c: char| !c.is_ascii_alphanumeric()).filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out.push('_');
        }
        out.push_str(&crate::model::snake_case(part).to_uppercase());
    }
    out
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn key(provider: &str, args: &[&str]) -> AdapterKey {
        AdapterKey::new(
            TypePath::new(provider),
            args.iter().map(|a| TypeRef::parse(a).unwrap()).collect(),
        )
    }

    #[test]
    fn same_identity_yields_same_handle() {
        let reg = AdapterRegistry::new();
        let a = reg.register(key("crate::ListAdapter", &["crate::Point"]));
        let b = reg.register(key("::crate::ListAdapter", &["crate::Point"]));
        assert_eq!(a, b);
        assert_eq!(reg.len(), 1);
        assert_eq!(a.ident, "LIST_ADAPTER_CRATE_POINT");
    }

    #[test]
    fn wildcard_args_are_normalised_before_lookup() {
        let reg = AdapterRegistry::new();
        let a = reg.register(key("crate::ListAdapter", &["impl crate::Shape"]));
        let b = reg.register(key("crate::ListAdapter", &["crate::Shape"]));
        assert_eq!(a.ident, b.ident);
    }

    #[test]
    fn distinct_identities_get_distinct_statics_in_order() {
        let reg = AdapterRegistry::new();
        reg.register(key("crate::UuidAdapter", &[]));
        reg.register(key("crate::ListAdapter", &["i32"]));
        reg.register(key("crate::ListAdapter", &["String"]));
        let idents: Vec<_> = reg.handles().into_iter().map(|h| h.ident).collect();
        assert_eq!(idents, ["UUID_ADAPTER", "LIST_ADAPTER_I32", "LIST_ADAPTER_STRING"]);
    }

    #[test]
    fn colliding_idents_are_suffixed() {
        let reg = AdapterRegistry::new();
        let a = reg.register(key("a::Codec", &[]));
        let b = reg.register(key("b::Codec", &[]));
        assert_eq!(a.ident, "CODEC");
        assert_eq!(b.ident, "CODEC_2");
    }

    #[test]
    fn concurrent_registration_declares_once() {
        let reg = Arc::new(AdapterRegistry::new());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || reg.register(key("crate::UuidAdapter", &[])))
            })
            .collect();
        let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert!(handles.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(reg.len(), 1);
    }
}
