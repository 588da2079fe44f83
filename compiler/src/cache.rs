use codegen::Program;
use dashmap::DashMap;
use log::debug;

use std::fmt;
use std::sync::Arc;

/// Compiled programs keyed by template name. Clones share the same
/// map, so one cache can back any number of engines.
#[derive(Clone, Default)]
pub struct ProgramCache {
    programs: Arc<DashMap<String, Arc<Program>>>,
}

impl fmt::Debug for ProgramCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramCache")
            .field("programs", &self.programs.len())
            .finish()
    }
}

impl ProgramCache {
    pub fn new() -> Self {
        ProgramCache::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Program>> {
        self.programs.get(name).map(|entry| entry.value().clone())
    }

    /// Racing compilations of the same name are not coordinated; the
    /// last insert wins.
    pub fn insert(&self, program: Arc<Program>) {
        debug!("caching program {}", program.name);
        self.programs.insert(program.name.clone(), program);
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Program>> {
        self.programs.remove(name).map(|(_, program)| program)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn clear(&self) {
        self.programs.clear();
    }
}
