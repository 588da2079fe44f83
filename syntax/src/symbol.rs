use data_structures::scope_map::Reference;
use serde::{Serialize, Serializer};

use std::fmt::{self, Debug, Display, Formatter};

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    // Temporary representation, we will eventually intern the string
    // with a global interner like rustc, but for now this helps debugging
    unstable_source: String,
}

impl Reference for Symbol {}

impl Symbol {
    pub fn intern(s: &str) -> Symbol {
        Symbol {
            unstable_source: String::from(s),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.unstable_source
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.unstable_source)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unstable_source)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unstable_source)
    }
}
