//! The memo table itself: a [`MemoKey`]-addressed cache of
//! [`EmitEntity`] results (§2, §3).
//!
//! Every dispatch first probes this table; a hit returns the cached entity
//! without re-invoking the user emitter, which is what makes shared
//! references between declarations cheap and what turns a would-be infinite
//! recursion on a reference cycle into a single re-entrant lookup the
//! dispatcher can detect (§4.7).

use std::collections::HashMap;

use crate::result::{EmitEntity, MemoKey};

/// A cache from [`MemoKey`] to the [`EmitEntity`] an operation produced for
/// it, mirroring the teacher's `Values`/`Numbers` dedup caches but keyed by
/// the richer `(op, node, context)` identity this engine needs rather than
/// by value alone.
#[derive(Debug)]
pub struct KeyedMap<V> {
    table: HashMap<MemoKey, EmitEntity<V>, ahash::RandomState>,
}

impl<V> Default for KeyedMap<V> {
    fn default() -> Self {
        Self {
            table: HashMap::default(),
        }
    }
}

impl<V: Clone> KeyedMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &MemoKey) -> Option<EmitEntity<V>> {
        self.table.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &MemoKey) -> bool {
        self.table.contains_key(key)
    }

    /// Files `entity` under `key`, returning whatever was previously there.
    /// Overwriting is expected: a `Circular` placeholder marker is routinely
    /// replaced once the real value resolves (§4.7 step 3).
    pub fn insert(&mut self, key: MemoKey, entity: EmitEntity<V>) -> Option<EmitEntity<V>> {
        self.table.insert(key, entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_key::OpKey;
    use crate::result::Rendered;
    use slotmap::SlotMap;

    #[test]
    fn insert_then_get_round_trips() {
        let mut types: SlotMap<crate::type_graph::TypeId, ()> = SlotMap::with_key();
        let node = types.insert(());
        let mut map: KeyedMap<i32> = KeyedMap::new();
        let key = MemoKey::new(OpKey::ModelDeclaration, node, crate::context::Context::blank());
        assert!(map.get(&key).is_none());
        map.insert(key.clone(), EmitEntity::Raw(Rendered::Value(42)));
        match map.get(&key) {
            Some(EmitEntity::Raw(Rendered::Value(v))) => assert_eq!(v, 42),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reinserting_overwrites() {
        let mut types: SlotMap<crate::type_graph::TypeId, ()> = SlotMap::with_key();
        let node = types.insert(());
        let mut map: KeyedMap<i32> = KeyedMap::new();
        let key = MemoKey::new(OpKey::ModelDeclaration, node, crate::context::Context::blank());
        map.insert(key.clone(), EmitEntity::Circular(node));
        map.insert(key.clone(), EmitEntity::Raw(Rendered::Value(1)));
        assert_eq!(map.len(), 1);
        assert!(matches!(map.get(&key), Some(EmitEntity::Raw(_))));
    }
}
