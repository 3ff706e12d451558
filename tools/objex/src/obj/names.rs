//! Collision-free names shared by meshes and materials.

use hashbrown::{HashMap, HashSet};
use objex_shared::{MaterialId, MeshId};

/// Identity a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameKey {
    Mesh(MeshId),
    Material(MaterialId),
}

impl From<MeshId> for NameKey {
    fn from(id: MeshId) -> Self {
        Self::Mesh(id)
    }
}

impl From<MaterialId> for NameKey {
    fn from(id: MaterialId) -> Self {
        Self::Material(id)
    }
}

/// Injective, case-sensitive mapping from identities to names.
///
/// The first identity asking for a base name gets it verbatim; later ones
/// get `base_1`, `base_2`, ... (the first suffix nobody holds yet). Once
/// assigned, a name never changes.
#[derive(Debug, Default)]
pub struct NameRegistry {
    names: HashMap<NameKey, String>,
    used: HashSet<String>,
    /// Next suffix worth probing per base name. Every smaller suffix is taken.
    next_suffix: HashMap<String, usize>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name bound to `key`, claiming one derived from `base` on first use.
    pub fn unique_name(&mut self, key: impl Into<NameKey>, base: &str) -> String {
        let key = key.into();
        if let Some(name) = self.names.get(&key) {
            return name.clone();
        }

        let name = if self.used.contains(base) {
            let cursor = self.next_suffix.entry(base.to_string()).or_insert(1);
            loop {
                let candidate = format!("{base}_{cursor}");
                *cursor += 1;
                if !self.used.contains(&candidate) {
                    break candidate;
                }
            }
        } else {
            base.to_string()
        };

        self.used.insert(name.clone());
        self.names.insert(key, name.clone());
        name
    }

    /// Name already bound to `key`, if any.
    pub fn get(&self, key: impl Into<NameKey>) -> Option<&str> {
        self.names.get(&key.into()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
