use super::{EntityCollection, Storage};
use crate::objects::Entity;
use crate::Error;
use rustc_hash::FxHashMap;
use std::fmt;

/// Keeps every collection in memory
#[derive(Debug, Default, Clone, Copy)]
pub struct InMemory;

impl Storage for InMemory {
    type Collection<T: Entity> = MemoryCollection<T>;

    fn collection<T: Entity>(&self) -> Result<Self::Collection<T>, Error> {
        Ok(MemoryCollection::default())
    }
}

/// Records stored in insertion order, indexed by key and foreign key
///
/// A removed record leaves an empty slot, so the indexes never need to be shifted.
#[derive(Clone)]
pub struct MemoryCollection<T> {
    slots: Vec<Option<T>>,
    by_key: FxHashMap<String, Vec<usize>>,
    by_foreign_key: FxHashMap<String, Vec<usize>>,
    live: usize,
}

impl<T> Default for MemoryCollection<T> {
    fn default() -> Self {
        MemoryCollection {
            slots: Vec::new(),
            by_key: FxHashMap::default(),
            by_foreign_key: FxHashMap::default(),
            live: 0,
        }
    }
}

impl<T: Entity> MemoryCollection<T> {
    /// Iterates over the records without cloning them
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    fn take(&mut self, idx: usize) -> Option<T> {
        let entity = self.slots.get_mut(idx).and_then(Option::take);
        if entity.is_some() {
            self.live -= 1;
        }
        entity
    }

    fn records_at(&self, indices: Option<&Vec<usize>>) -> Vec<T> {
        indices
            .into_iter()
            .flatten()
            .filter_map(|&idx| self.slots[idx].clone())
            .collect()
    }
}

fn unlink(index: &mut FxHashMap<String, Vec<usize>>, value: Option<&str>, idx: usize) {
    if let Some(value) = value {
        if let Some(indices) = index.get_mut(value) {
            indices.retain(|&i| i != idx);
            if indices.is_empty() {
                index.remove(value);
            }
        }
    }
}

impl<T: Entity> EntityCollection<T> for MemoryCollection<T> {
    fn add(&mut self, entity: T) -> Result<(), Error> {
        let idx = self.slots.len();
        if let Some(key) = entity.key() {
            self.by_key.entry(key.to_owned()).or_default().push(idx);
        }
        if let Some(fk) = entity.foreign_key() {
            self.by_foreign_key.entry(fk.to_owned()).or_default().push(idx);
        }
        self.slots.push(Some(entity));
        self.live += 1;
        Ok(())
    }

    fn all(&self) -> Result<Vec<T>, Error> {
        Ok(self.iter().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<T>, Error> {
        Ok(self
            .by_key
            .get(key)
            .and_then(|indices| indices.first())
            .and_then(|&idx| self.slots[idx].clone()))
    }

    fn get_by_foreign_key(&self, foreign_key: &str) -> Result<Vec<T>, Error> {
        Ok(self.records_at(self.by_foreign_key.get(foreign_key)))
    }

    fn remove(&mut self, key: &str) -> Result<usize, Error> {
        let mut removed = 0;
        for idx in self.by_key.remove(key).unwrap_or_default() {
            if let Some(entity) = self.take(idx) {
                unlink(&mut self.by_foreign_key, entity.foreign_key(), idx);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn remove_by_foreign_key(&mut self, foreign_key: &str) -> Result<usize, Error> {
        let mut removed = 0;
        for idx in self.by_foreign_key.remove(foreign_key).unwrap_or_default() {
            if let Some(entity) = self.take(idx) {
                unlink(&mut self.by_key, entity.key(), idx);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn len(&self) -> Result<usize, Error> {
        Ok(self.live)
    }
}

impl<T: Entity + PartialEq> PartialEq for MemoryCollection<T> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<T: Entity + fmt::Debug> fmt::Debug for MemoryCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
