//! In-memory entity set
//!
//! Backs tests and demos. Behaves like a relational unit of work: `add` and
//! `update` are staged and only `save` makes them visible, stamping the audit
//! timestamps the way a database trigger would.

use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::error::StoreError;
use super::traits::{EntitySet, Predicate, StoreResult};
use crate::entity::{Entity, EntityId};

#[derive(Debug)]
enum Staged<E> {
    Added(E),
    Updated(E),
}

#[derive(Debug)]
struct Inner<E> {
    rows: BTreeMap<EntityId, E>,
    staged: Vec<Staged<E>>,
    next_id: EntityId,
}

/// Entity set holding rows in process memory
#[derive(Debug)]
pub struct MemoryEntitySet<E> {
    inner: Mutex<Inner<E>>,
}

impl<E> Default for MemoryEntitySet<E> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: BTreeMap::new(),
                staged: Vec::new(),
                next_id: 0,
            }),
        }
    }
}

impl<E: Entity> MemoryEntitySet<E> {
    /// Empty entity set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed rows, soft-deleted ones included
    pub async fn len(&self) -> usize {
        self.inner.lock().await.rows.len()
    }

    /// Whether no rows have been committed
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.rows.is_empty()
    }
}

impl<E: Entity> EntitySet<E> for MemoryEntitySet<E> {
    async fn find_one(&self, predicate: Predicate<'_, E>) -> StoreResult<Option<E>> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.values().find(|row| predicate(row)).cloned())
    }

    async fn find_all(&self) -> StoreResult<Vec<E>> {
        let inner = self.inner.lock().await;
        Ok(inner.rows.values().cloned().collect())
    }

    async fn add(&self, mut entity: E) -> StoreResult<EntityId> {
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = inner.next_id;
        entity.record_mut().id = id;
        inner.staged.push(Staged::Added(entity));
        Ok(id)
    }

    async fn update(&self, entity: E) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let id = entity.id();
        let known = inner.rows.contains_key(&id)
            || inner
                .staged
                .iter()
                .any(|staged| matches!(staged, Staged::Added(added) if added.id() == id));
        if !known {
            return Err(StoreError::missing_entity(id));
        }
        inner.staged.push(Staged::Updated(entity));
        Ok(())
    }

    async fn save(&self) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let staged = std::mem::take(&mut inner.staged);

        for change in staged {
            match change {
                Staged::Added(mut entity) => {
                    let record = entity.record_mut();
                    record.created_at = now;
                    record.updated_at = now;
                    let id = record.id;
                    inner.rows.insert(id, entity);
                }
                Staged::Updated(mut entity) => {
                    let id = entity.id();
                    let created_at = inner.rows.get(&id).map(|row| row.record().created_at);
                    let record = entity.record_mut();
                    record.created_at = created_at.unwrap_or(now);
                    record.updated_at = now;
                    inner.rows.insert(id, entity);
                }
            }
        }

        tracing::trace!(rows = inner.rows.len(), "In-memory entity set saved");
        Ok(())
    }

    async fn discard(&self, id: EntityId) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        inner.staged.retain(|change| match change {
            Staged::Added(entity) | Staged::Updated(entity) => entity.id() != id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Record;
    use crate::store::StoreErrorKind;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        record: Record,
        text: String,
    }

    impl Note {
        fn new(text: &str) -> Self {
            Self {
                record: Record::default(),
                text: text.to_string(),
            }
        }
    }

    impl Entity for Note {
        fn record(&self) -> &Record {
            &self.record
        }

        fn record_mut(&mut self) -> &mut Record {
            &mut self.record
        }
    }

    #[tokio::test]
    async fn test_add_is_invisible_until_save() {
        let set = MemoryEntitySet::new();
        let id = set.add(Note::new("draft")).await.unwrap();
        assert_eq!(id, 1);
        assert!(set.find_one(&|n: &Note| n.id() == id).await.unwrap().is_none());

        set.save().await.unwrap();
        let stored = set.find_one(&|n: &Note| n.id() == id).await.unwrap().unwrap();
        assert_eq!(stored.text, "draft");
        assert_eq!(set.len().await, 1);
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let set = MemoryEntitySet::new();
        let first = set.add(Note::new("a")).await.unwrap();
        let second = set.add(Note::new("b")).await.unwrap();
        assert_eq!((first, second), (1, 2));
    }

    #[tokio::test]
    async fn test_save_stamps_audit_fields() {
        let set = MemoryEntitySet::new();
        let id = set.add(Note::new("stamp")).await.unwrap();
        set.save().await.unwrap();

        let created = set.find_one(&|n: &Note| n.id() == id).await.unwrap().unwrap();
        assert_ne!(created.record.created_at, Record::default().created_at);
        assert_eq!(created.record.created_at, created.record.updated_at);

        let mut edited = created.clone();
        edited.text = "stamped".to_string();
        edited.record.created_at = Record::default().created_at;
        set.update(edited).await.unwrap();
        set.save().await.unwrap();

        let updated = set.find_one(&|n: &Note| n.id() == id).await.unwrap().unwrap();
        assert_eq!(updated.text, "stamped");
        assert_eq!(updated.record.created_at, created.record.created_at);
        assert!(updated.record.updated_at >= created.record.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_row_fails() {
        let set = MemoryEntitySet::new();
        let mut ghost = Note::new("ghost");
        ghost.record.id = 99;

        let err = set.update(ghost).await.unwrap_err();
        assert_eq!(err.kind, StoreErrorKind::MissingEntity);
    }

    #[tokio::test]
    async fn test_discard_drops_only_that_entity() {
        let set = MemoryEntitySet::new();
        let dropped = set.add(Note::new("dropped")).await.unwrap();
        let kept = set.add(Note::new("kept")).await.unwrap();

        set.discard(dropped).await.unwrap();
        set.save().await.unwrap();

        let all = set.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id(), kept);
    }

    #[tokio::test]
    async fn test_discard_leaves_committed_row_untouched() {
        let set = MemoryEntitySet::new();
        let id = set.add(Note::new("original")).await.unwrap();
        set.save().await.unwrap();

        let mut edited = set.find_one(&|n: &Note| n.id() == id).await.unwrap().unwrap();
        edited.text = "edited".to_string();
        set.update(edited).await.unwrap();
        set.discard(id).await.unwrap();
        set.save().await.unwrap();

        let stored = set.find_one(&|n: &Note| n.id() == id).await.unwrap().unwrap();
        assert_eq!(stored.text, "original");
    }

    #[tokio::test]
    async fn test_find_all_includes_soft_deleted_rows() {
        let set = MemoryEntitySet::new();
        let id = set.add(Note::new("gone")).await.unwrap();
        set.save().await.unwrap();

        let mut row = set.find_one(&|n: &Note| n.id() == id).await.unwrap().unwrap();
        row.record.mark_deleted();
        set.update(row).await.unwrap();
        set.save().await.unwrap();

        let all = set.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_deleted());
    }
}
