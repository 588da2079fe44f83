use std::fmt::Debug;
use std::hash::Hash;

pub trait Reference: Debug + Eq + Hash + Clone {}

impl Reference for String {}

/// Where a lexically bound name lives: `depth` scopes out from the
/// innermost one, at slot `index` within that scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    pub depth: usize,
    pub index: usize,
}

/// An individual scope. Mapped to a function body (or the template
/// itself), as those are the only items that allow for scope creation.
#[derive(Debug)]
pub struct Scope<K: Reference, V> {
    // Parameters first, then `def` targets, in binding order
    bindings: Vec<K>,
    // Values for the `def` targets, in definition order
    defs: Vec<(K, V)>,
    // Root names that could not be resolved lexically, in first-use order
    lookups: Vec<K>,
}

impl<K: Reference, V> Scope<K, V> {
    fn new(params: Vec<K>) -> Self {
        Scope {
            bindings: params,
            defs: vec![],
            lookups: vec![],
        }
    }

    pub fn param_count(&self) -> usize {
        self.bindings.len() - self.defs.len()
    }

    pub fn defs(&self) -> &[(K, V)] {
        &self.defs
    }

    /// Consumes the scope, yielding its definitions and lookups.
    pub fn into_parts(self) -> (Vec<(K, V)>, Vec<K>) {
        (self.defs, self.lookups)
    }

    fn resolve(&self, reference: &K) -> Option<usize> {
        self.bindings.iter().position(|binding| binding == reference)
    }
}

/// ScopeMap tracks the lexical scopes that are active while a
/// template is being compiled.
#[derive(Debug)]
pub struct ScopeMap<K: Reference, V> {
    // The list of scopes that are currently active
    active_scopes: Vec<Scope<K, V>>,
}

impl<K: Reference, V> Default for ScopeMap<K, V> {
    fn default() -> Self {
        ScopeMap {
            active_scopes: vec![],
        }
    }
}

impl<K: Reference, V> ScopeMap<K, V> {
    /// Enter a new scope, pre-seeded with parameter names.
    pub fn push_scope(&mut self, params: Vec<K>) {
        self.active_scopes.push(Scope::new(params));
    }

    /// Exit the innermost scope, returning it so the caller can emit its
    /// definitions and lookups.
    pub fn pop_scope(&mut self) -> Option<Scope<K, V>> {
        self.active_scopes.pop()
    }

    /// Bind `reference` in the innermost scope. Returns `false` if the name
    /// is already bound there (or if there is no scope at all).
    pub fn add_def(&mut self, reference: K, referant: V) -> bool {
        match self.active_scopes.last_mut() {
            Some(scope) if scope.resolve(&reference).is_none() => {
                scope.bindings.push(reference.clone());
                scope.defs.push((reference, referant));
                true
            }
            _ => false,
        }
    }

    /// Resolve a reference to a binding, if it exists.
    pub fn find_address(&self, reference: &K) -> Option<Address> {
        // Walk through the active scopes backwards, as we want to attempt
        // resolution with the *newest* scope first.
        self.active_scopes
            .iter()
            .rev()
            .enumerate()
            .find_map(|(depth, scope)| {
                scope
                    .resolve(reference)
                    .map(|index| Address { depth, index })
            })
    }

    /// Record a name that has to be looked up at render time, returning its
    /// slot among the innermost scope's lookups. Each name is recorded once.
    pub fn record_lookup(&mut self, reference: K) -> Option<usize> {
        let scope = self.active_scopes.last_mut()?;
        match scope.lookups.iter().position(|lookup| *lookup == reference) {
            Some(index) => Some(index),
            None => {
                scope.lookups.push(reference);
                Some(scope.lookups.len() - 1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Address, ScopeMap};
    use quickcheck_macros::quickcheck;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn resolves_innermost_first() {
        let mut scopes: ScopeMap<String, u32> = ScopeMap::default();
        scopes.push_scope(names(&["a", "b"]));
        scopes.push_scope(names(&["b"]));
        assert_eq!(
            scopes.find_address(&"b".to_string()),
            Some(Address { depth: 0, index: 0 })
        );
        assert_eq!(
            scopes.find_address(&"a".to_string()),
            Some(Address { depth: 1, index: 0 })
        );
        assert_eq!(scopes.find_address(&"c".to_string()), None);
    }

    #[test]
    fn defs_follow_params() {
        let mut scopes: ScopeMap<String, u32> = ScopeMap::default();
        scopes.push_scope(names(&["item", "index"]));
        assert!(scopes.add_def("total".to_string(), 1));
        assert_eq!(
            scopes.find_address(&"total".to_string()),
            Some(Address { depth: 0, index: 2 })
        );
        let scope = scopes.pop_scope().unwrap();
        assert_eq!(scope.param_count(), 2);
        assert_eq!(scope.defs(), &[("total".to_string(), 1)]);
    }

    #[test]
    fn duplicate_defs_only_conflict_within_a_scope() {
        let mut scopes: ScopeMap<String, u32> = ScopeMap::default();
        scopes.push_scope(vec![]);
        assert!(scopes.add_def("hello".to_string(), 1));
        assert!(!scopes.add_def("hello".to_string(), 2));
        scopes.push_scope(vec![]);
        assert!(scopes.add_def("hello".to_string(), 3));
    }

    #[test]
    fn params_cannot_be_redefined() {
        let mut scopes: ScopeMap<String, u32> = ScopeMap::default();
        scopes.push_scope(names(&["x"]));
        assert!(!scopes.add_def("x".to_string(), 1));
    }

    #[test]
    fn lookups_are_recorded_once() {
        let mut scopes: ScopeMap<String, u32> = ScopeMap::default();
        scopes.push_scope(vec![]);
        assert_eq!(scopes.record_lookup("a".to_string()), Some(0));
        assert_eq!(scopes.record_lookup("b".to_string()), Some(1));
        assert_eq!(scopes.record_lookup("a".to_string()), Some(0));
        let (_, lookups) = scopes.pop_scope().unwrap().into_parts();
        assert_eq!(lookups, names(&["a", "b"]));
    }

    #[quickcheck]
    fn params_resolve_to_their_position(params: Vec<String>) -> bool {
        let mut unique: Vec<String> = vec![];
        for param in params {
            if !unique.contains(&param) {
                unique.push(param);
            }
        }
        let mut scopes: ScopeMap<String, ()> = ScopeMap::default();
        scopes.push_scope(unique.clone());
        unique.iter().enumerate().all(|(index, param)| {
            scopes.find_address(param) == Some(Address { depth: 0, index })
        })
    }
}
