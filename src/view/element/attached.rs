use std::any::{Any, TypeId};
use std::fmt;

use rustc_hash::FxHashMap;

/// Key type for a value a parent layout reads off its children, such as a
/// grid cell index. Implement it on a zero-sized marker.
pub trait AttachedProperty: 'static {
    type Value: Clone + 'static;
}

/// Per-element store of attached values keyed by the marker's `TypeId`.
#[derive(Default)]
pub struct AttachedMap {
    values: FxHashMap<TypeId, Box<dyn Any>>,
}

impl AttachedMap {
    pub fn set<A: AttachedProperty>(&mut self, value: A::Value) -> Option<A::Value> {
        self.values
            .insert(TypeId::of::<A>(), Box::new(value))
            .and_then(|old| old.downcast::<A::Value>().ok())
            .map(|old| *old)
    }

    pub fn get<A: AttachedProperty>(&self) -> Option<&A::Value> {
        self.values
            .get(&TypeId::of::<A>())
            .and_then(|value| value.downcast_ref::<A::Value>())
    }

    pub fn get_or<A: AttachedProperty>(&self, default: A::Value) -> A::Value {
        self.get::<A>().cloned().unwrap_or(default)
    }

    pub fn remove<A: AttachedProperty>(&mut self) -> Option<A::Value> {
        self.values
            .remove(&TypeId::of::<A>())
            .and_then(|old| old.downcast::<A::Value>().ok())
            .map(|old| *old)
    }

    pub fn contains<A: AttachedProperty>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<A>())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for AttachedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttachedMap").field("len", &self.values.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{AttachedMap, AttachedProperty};

    struct Row;
    impl AttachedProperty for Row {
        type Value = usize;
    }

    struct Label;
    impl AttachedProperty for Label {
        type Value = String;
    }

    #[test]
    fn keys_with_equal_value_types_do_not_collide() {
        struct Column;
        impl AttachedProperty for Column {
            type Value = usize;
        }

        let mut map = AttachedMap::default();
        map.set::<Row>(2);
        map.set::<Column>(5);
        map.set::<Label>("header".to_string());
        assert_eq!(map.get::<Row>(), Some(&2));
        assert_eq!(map.get::<Column>(), Some(&5));
        assert_eq!(map.set::<Row>(4), Some(2));
        assert_eq!(map.remove::<Label>().as_deref(), Some("header"));
        assert_eq!(map.len(), 2);
    }
}
