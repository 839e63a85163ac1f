//! Open property bag attached to every node.
//!
//! Later passes annotate nodes here instead of widening node definitions.
//! Entries are addressed either by an explicit key or by the type of the
//! stored value, in which case at most one value per type is kept.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;

/// Boxed property value.
pub type BoxedProperty = Box<dyn Any + Send + Sync>;

/// Address of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Named(Cow<'static, str>),
    Type(TypeId),
}

impl PropertyKey {
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        PropertyKey::Named(name.into())
    }

    /// Key used by the typed accessors for values of type `T`.
    pub fn of<T: Any>() -> Self {
        PropertyKey::Type(TypeId::of::<T>())
    }
}

impl From<&'static str> for PropertyKey {
    fn from(name: &'static str) -> Self {
        PropertyKey::Named(Cow::Borrowed(name))
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::Named(Cow::Owned(name))
    }
}

struct Entry {
    key: PropertyKey,
    value: BoxedProperty,
}

/// Small insertion-ordered map of node annotations.
///
/// Most nodes carry no properties or one or two, so entries live inline
/// until the collection grows.
#[derive(Default)]
pub struct PropertyCollection {
    entries: SmallVec<[Entry; 2]>,
}

impl PropertyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &PropertyKey) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.key == key)
    }

    /// Store `value` under `key`, returning the value it replaced.
    pub fn set_property<V>(&mut self, key: impl Into<PropertyKey>, value: V) -> Option<BoxedProperty>
    where
        V: Any + Send + Sync,
    {
        let key = key.into();
        let value: BoxedProperty = Box::new(value);
        match self.position(&key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].value, value)),
            None => {
                self.entries.push(Entry { key, value });
                None
            }
        }
    }

    pub fn get_property(&self, key: &PropertyKey) -> Option<&(dyn Any + Send + Sync)> {
        self.position(key).map(|index| &*self.entries[index].value)
    }

    /// Keyed lookup that also checks the stored type.
    pub fn get_property_as<V: Any>(&self, key: &PropertyKey) -> Option<&V> {
        self.get_property(key)?.downcast_ref::<V>()
    }

    pub fn remove_property(&mut self, key: &PropertyKey) -> Option<BoxedProperty> {
        let index = self.position(key)?;
        Some(self.entries.remove(index).value)
    }

    /// Store the single value of type `T`, returning the previous one.
    pub fn set<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        let previous = self.set_property(PropertyKey::of::<T>(), value)?;
        previous.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn get<T: Any>(&self) -> Option<&T> {
        self.get_property_as::<T>(&PropertyKey::of::<T>())
    }

    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        let index = self.position(&PropertyKey::of::<T>())?;
        self.entries[index].value.downcast_mut::<T>()
    }

    pub fn remove<T: Any>(&mut self) -> Option<T> {
        let removed = self.remove_property(&PropertyKey::of::<T>())?;
        removed.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> + '_ {
        self.entries.iter().map(|entry| &entry.key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for PropertyCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct ResolvedSymbol(&'static str);

    #[test]
    fn test_typed_set_get() {
        let mut props = PropertyCollection::new();
        assert!(props.get::<ResolvedSymbol>().is_none());
        props.set(ResolvedSymbol("strlen"));
        assert_eq!(props.get::<ResolvedSymbol>(), Some(&ResolvedSymbol("strlen")));
    }

    #[test]
    fn test_typed_set_replaces() {
        let mut props = PropertyCollection::new();
        assert_eq!(props.set(1u32), None);
        assert_eq!(props.set(2u32), Some(1));
        assert_eq!(props.len(), 1);
        assert_eq!(props.get::<u32>(), Some(&2));
    }

    #[test]
    fn test_typed_get_mut_and_remove() {
        let mut props = PropertyCollection::new();
        props.set(vec![1, 2]);
        props.get_mut::<Vec<i32>>().unwrap().push(3);
        assert_eq!(props.remove::<Vec<i32>>(), Some(vec![1, 2, 3]));
        assert!(props.is_empty());
    }

    #[test]
    fn test_keyed_properties() {
        let mut props = PropertyCollection::new();
        props.set_property("doc", String::from("/** x */"));
        let key = PropertyKey::named("doc");
        assert_eq!(
            props.get_property_as::<String>(&key).map(String::as_str),
            Some("/** x */")
        );
        assert!(props.get_property_as::<u8>(&key).is_none());
        assert!(props.remove_property(&key).is_some());
        assert!(!props.contains(&key));
    }

    #[test]
    fn test_keyed_and_typed_do_not_collide() {
        let mut props = PropertyCollection::new();
        props.set_property("count", 5usize);
        props.set(7usize);
        assert_eq!(props.len(), 2);
        assert_eq!(props.get::<usize>(), Some(&7));
        assert_eq!(
            props.get_property_as::<usize>(&PropertyKey::from("count")),
            Some(&5)
        );
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut props = PropertyCollection::new();
        props.set_property("b", 1u8);
        props.set_property("a", 2u8);
        props.set_property(String::from("c"), 3u8);
        let keys: Vec<_> = props.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                PropertyKey::named("b"),
                PropertyKey::named("a"),
                PropertyKey::named("c"),
            ]
        );
        props.clear();
        assert!(props.is_empty());
    }
}
