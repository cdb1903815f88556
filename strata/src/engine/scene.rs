//! The draw list: every drawable of a scene, kept in draw order.
//!
//! Entries are sorted by their [`SortKey`] (program, then texture) at all
//! times, so walking the list front to back changes programs and textures as
//! rarely as possible. Entries with equal sort keys stay in insertion order.

use crate::drawables::{Drawable, SortKey};
use crate::error::*;
use snafu::ensure;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::trace;

struct Entry<K> {
    key: K,
    sort_key: SortKey,
    drawable: Box<dyn Drawable>,
}

pub struct DrawList<K> {
    entries: Vec<Entry<K>>,
    lookup: HashMap<K, usize>,
}

impl<K> Default for DrawList<K> {
    fn default() -> Self {
        DrawList {
            entries: Vec::new(),
            lookup: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone + Debug> DrawList<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K, drawable: impl Drawable) -> Result<&dyn Drawable> {
        self.add_boxed(key, Box::new(drawable))
    }

    /// Inserts the drawable at its sorted position. Fails if `key` is taken.
    ///
    /// The returned view is read-only. Changes go through [`update`](Self::update)
    /// or [`update_as`](Self::update_as) so the entry is moved if its sort key
    /// changes.
    pub fn add_boxed(&mut self, key: K, drawable: Box<dyn Drawable>) -> Result<&dyn Drawable> {
        ensure!(
            !self.lookup.contains_key(&key),
            DuplicateKeyErr {
                key: format!("{key:?}")
            }
        );

        let sort_key = drawable.sort_key();
        let index = self.insert_sorted(Entry {
            key,
            sort_key,
            drawable,
        });

        Ok(self.entries[index].drawable.as_ref())
    }

    fn insert_sorted(&mut self, entry: Entry<K>) -> usize {
        let index = self
            .entries
            .partition_point(|other| other.sort_key <= entry.sort_key);

        for shifted in self.lookup.values_mut().filter(|i| **i >= index) {
            *shifted += 1;
        }

        trace!("Inserted drawable {:?} at {index}", entry.key);
        self.lookup.insert(entry.key.clone(), index);
        self.entries.insert(index, entry);

        index
    }

    fn take(&mut self, index: usize) -> Entry<K> {
        let entry = self.entries.remove(index);
        self.lookup.remove(&entry.key);

        for shifted in self.lookup.values_mut().filter(|i| **i > index) {
            *shifted -= 1;
        }

        entry
    }

    /// Removes the drawable and returns whether it was there. The remaining
    /// entries keep their order.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(&index) = self.lookup.get(key) else {
            return false;
        };

        drop(self.take(index));
        true
    }

    pub fn get(&self, key: &K) -> Option<&dyn Drawable> {
        let index = *self.lookup.get(key)?;
        Some(self.entries[index].drawable.as_ref())
    }

    /// Looks the drawable up and downcasts it to `T`.
    pub fn get_as<T: Drawable>(&self, key: &K) -> Result<Option<&T>> {
        let Some(drawable) = self.get(key) else {
            return Ok(None);
        };

        match (drawable as &dyn Any).downcast_ref::<T>() {
            Some(drawable) => Ok(Some(drawable)),
            None => TypeMismatchErr {
                key: format!("{key:?}"),
                expected: type_name::<T>(),
            }
            .fail(),
        }
    }

    /// Runs `f` on the drawable and moves it if its sort key changed.
    ///
    /// Returns `None` if there is no drawable under `key`.
    pub fn update<R>(&mut self, key: &K, f: impl FnOnce(&mut dyn Drawable) -> R) -> Option<R> {
        let index = *self.lookup.get(key)?;
        let result = f(self.entries[index].drawable.as_mut());
        self.resort(index);
        Some(result)
    }

    /// Like [`update`](Self::update), with the drawable downcast to `T`.
    pub fn update_as<T: Drawable, R>(&mut self, key: &K, f: impl FnOnce(&mut T) -> R) -> Result<Option<R>> {
        let Some(&index) = self.lookup.get(key) else {
            return Ok(None);
        };

        let drawable = self.entries[index].drawable.as_mut() as &mut dyn Any;
        let Some(drawable) = drawable.downcast_mut::<T>() else {
            return TypeMismatchErr {
                key: format!("{key:?}"),
                expected: type_name::<T>(),
            }
            .fail();
        };

        let result = f(drawable);
        self.resort(index);
        Ok(Some(result))
    }

    fn resort(&mut self, index: usize) {
        let sort_key = self.entries[index].drawable.sort_key();
        if sort_key == self.entries[index].sort_key {
            return;
        }

        let mut entry = self.take(index);
        entry.sort_key = sort_key;
        self.insert_sorted(entry);
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drawables in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &dyn Drawable)> {
        self.entries
            .iter()
            .map(|entry| (&entry.key, entry.drawable.as_ref()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|entry| &entry.key)
    }

    pub fn sort_keys(&self) -> impl Iterator<Item = SortKey> + '_ {
        self.entries.iter().map(|entry| entry.sort_key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lookup.clear();
    }
}
