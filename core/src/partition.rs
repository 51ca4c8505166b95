//! Two-partition keyed storage: shipped entries under runtime entries.

use aurafx_shared::EffectId;
use aurafx_shared::Provenance;
use hashbrown::HashMap;

/// Built-in and authored values under one id space.
///
/// Lookups prefer the authored partition. Each partition is replaced
/// wholesale without touching the other.
#[derive(Debug, Clone)]
pub(crate) struct Partitioned<V> {
    builtin: HashMap<EffectId, V>,
    authored: HashMap<EffectId, V>,
}

impl<V> Default for Partitioned<V> {
    fn default() -> Self {
        Self {
            builtin: HashMap::new(),
            authored: HashMap::new(),
        }
    }
}

impl<V> Partitioned<V> {
    pub fn get(&self, id: &EffectId) -> Option<&V> {
        self.authored.get(id).or_else(|| self.builtin.get(id))
    }

    pub fn builtin(&self, id: &EffectId) -> Option<&V> {
        self.builtin.get(id)
    }

    pub fn authored(&self, id: &EffectId) -> Option<&V> {
        self.authored.get(id)
    }

    /// Provenance of the effective value for `id`
    pub fn provenance(&self, id: &EffectId) -> Option<Provenance> {
        if self.authored.contains_key(id) {
            Some(Provenance::Authored)
        } else if self.builtin.contains_key(id) {
            Some(Provenance::Builtin)
        } else {
            None
        }
    }

    pub fn replace_builtin(&mut self, values: HashMap<EffectId, V>) {
        self.builtin = values;
    }

    pub fn replace_authored(&mut self, values: HashMap<EffectId, V>) {
        self.authored = values;
    }

    pub fn insert_authored(&mut self, id: EffectId, value: V) -> Option<V> {
        self.authored.insert(id, value)
    }

    pub fn remove_authored(&mut self, id: &EffectId) -> Option<V> {
        self.authored.remove(id)
    }

    /// Effective values, sorted by id
    pub fn effective(&self) -> Vec<(&EffectId, &V)> {
        let mut out: Vec<(&EffectId, &V)> = self.authored.iter().collect();
        out.extend(
            self.builtin
                .iter()
                .filter(|(id, _)| !self.authored.contains_key(*id)),
        );
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Authored values only, sorted by id
    pub fn authored_sorted(&self) -> Vec<(&EffectId, &V)> {
        let mut out: Vec<(&EffectId, &V)> = self.authored.iter().collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }

    /// Number of distinct ids across both partitions
    pub fn len(&self) -> usize {
        self.builtin.len()
            + self
                .authored
                .keys()
                .filter(|id| !self.builtin.contains_key(*id))
                .count()
    }

    pub fn authored_len(&self) -> usize {
        self.authored.len()
    }

    pub fn builtin_len(&self) -> usize {
        self.builtin.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EffectId {
        EffectId::parse(s).unwrap()
    }

    fn map(pairs: &[(&str, u32)]) -> HashMap<EffectId, u32> {
        pairs.iter().map(|(k, v)| (id(k), *v)).collect()
    }

    #[test]
    fn test_authored_shadows_builtin() {
        let mut p = Partitioned::default();
        p.replace_builtin(map(&[("a", 1), ("b", 2)]));
        p.insert_authored(id("a"), 10);

        assert_eq!(p.get(&id("a")), Some(&10));
        assert_eq!(p.get(&id("b")), Some(&2));
        assert_eq!(p.provenance(&id("a")), Some(Provenance::Authored));
        assert_eq!(p.provenance(&id("b")), Some(Provenance::Builtin));
        assert_eq!(p.provenance(&id("c")), None);
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_remove_authored_reexposes_builtin() {
        let mut p = Partitioned::default();
        p.replace_builtin(map(&[("a", 1)]));
        p.insert_authored(id("a"), 10);
        assert_eq!(p.remove_authored(&id("a")), Some(10));
        assert_eq!(p.get(&id("a")), Some(&1));
    }

    #[test]
    fn test_effective_is_sorted_and_deduplicated() {
        let mut p = Partitioned::default();
        p.replace_builtin(map(&[("c", 3), ("a", 1)]));
        p.replace_authored(map(&[("b", 20), ("a", 10)]));

        let values: Vec<u32> = p.effective().into_iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![10, 20, 3]);
        assert_eq!(p.authored_len(), 2);
        assert_eq!(p.builtin_len(), 2);
    }
}
