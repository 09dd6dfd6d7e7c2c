//! In-process entity store.
//!
//! One table per entity kind, each behind its own mutex. Ids are allocated
//! per kind starting at 1 and never reused. `save` is a compare-and-swap on
//! the stored revision, which is all the domain needs to serialise
//! concurrent read-modify-write cycles on a single entity.
//!
//! Locks are held only for the duration of a map operation and never across
//! an await point.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{
    EntityStoreError, MeetupRepository, MetadataRepository, PresentationRepository,
    SpeakerRepository,
};
use crate::domain::{EntityId, Meetup, MetadataKey, Presentation, Speaker, Stored};

struct Table<T> {
    last_id: i64,
    rows: BTreeMap<EntityId, Stored<T>>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            last_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Clone> Table<T> {
    fn get(&self, id: EntityId) -> Option<Stored<T>> {
        self.rows.get(&id).cloned()
    }

    fn list(&self) -> Vec<Stored<T>> {
        self.rows.values().cloned().collect()
    }

    fn insert(&mut self, value: T) -> Stored<T> {
        self.last_id += 1;
        let stored = Stored::new(EntityId::new(self.last_id), 1, value);
        self.rows.insert(stored.id, stored.clone());
        stored
    }

    fn save(&mut self, entity: &Stored<T>) -> Result<Stored<T>, EntityStoreError> {
        let current = self
            .rows
            .get_mut(&entity.id)
            .ok_or_else(|| EntityStoreError::missing(entity.id.to_string()))?;
        if current.revision != entity.revision {
            return Err(EntityStoreError::revision_mismatch(
                entity.revision,
                current.revision,
            ));
        }
        *current = Stored::new(entity.id, entity.revision + 1, entity.value.clone());
        Ok(current.clone())
    }

    fn delete(&mut self, id: EntityId) -> Result<(), EntityStoreError> {
        self.rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| EntityStoreError::missing(id.to_string()))
    }
}

/// Store holding every entity kind in process memory.
///
/// Contents are lost when the process exits.
#[derive(Default)]
pub struct InMemoryStore {
    speakers: Mutex<Table<Speaker>>,
    presentations: Mutex<Table<Presentation>>,
    meetups: Mutex<Table<Meetup>>,
    metadata: Mutex<HashMap<MetadataKey, String>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, kind: &str) -> Result<MutexGuard<'a, T>, EntityStoreError> {
    mutex
        .lock()
        .map_err(|_| EntityStoreError::connection(format!("{kind} table lock poisoned")))
}

macro_rules! impl_table_repository {
    ($trait:ident, $entity:ty, $field:ident) => {
        #[async_trait]
        impl $trait for InMemoryStore {
            async fn get(&self, id: EntityId) -> Result<Option<Stored<$entity>>, EntityStoreError> {
                Ok(lock(&self.$field, stringify!($field))?.get(id))
            }

            async fn list(&self) -> Result<Vec<Stored<$entity>>, EntityStoreError> {
                Ok(lock(&self.$field, stringify!($field))?.list())
            }

            async fn insert(&self, value: $entity) -> Result<Stored<$entity>, EntityStoreError> {
                Ok(lock(&self.$field, stringify!($field))?.insert(value))
            }

            async fn save(
                &self,
                entity: &Stored<$entity>,
            ) -> Result<Stored<$entity>, EntityStoreError> {
                lock(&self.$field, stringify!($field))?.save(entity)
            }

            async fn delete(&self, id: EntityId) -> Result<(), EntityStoreError> {
                lock(&self.$field, stringify!($field))?.delete(id)
            }
        }
    };
}

impl_table_repository!(SpeakerRepository, Speaker, speakers);
impl_table_repository!(PresentationRepository, Presentation, presentations);
impl_table_repository!(MeetupRepository, Meetup, meetups);

#[async_trait]
impl MetadataRepository for InMemoryStore {
    async fn get(&self, key: &MetadataKey) -> Result<Option<String>, EntityStoreError> {
        Ok(lock(&self.metadata, "metadata")?.get(key).cloned())
    }

    async fn put(&self, key: &MetadataKey, value: &str) -> Result<(), EntityStoreError> {
        lock(&self.metadata, "metadata")?.insert(key.clone(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &MetadataKey) -> Result<(), EntityStoreError> {
        lock(&self.metadata, "metadata")?
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| EntityStoreError::missing(key.as_str()))
    }
}
