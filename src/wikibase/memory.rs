use super::{CreateOutcome, EntityDraft, EntityId, EntityKind, RemoteStore, Statement};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Default)]
struct StoredEntity {
    labels: BTreeMap<String, String>,
    descriptions: BTreeMap<String, String>,
    statements: Vec<Statement>,
}

#[derive(Debug, Default)]
struct Inner {
    entities: BTreeMap<EntityId, StoredEntity>,
    next_item: u64,
    next_property: u64,
    creates: usize,
    clears: usize,
}

/// In-memory Wikibase stand-in
///
/// Assigns sequential `Q<n>`/`P<n>` identifiers and enforces the same
/// uniqueness rules Wikibase applies to labels: a property label must be
/// unique per language, an item's label and description pair must be unique
/// per language. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that already knows `ids` as empty entities
    ///
    /// Dry runs start from the link file of earlier real runs, so linked
    /// subjects must resolve here. New IDs are allocated above the highest
    /// preloaded one.
    pub fn with_entities(ids: impl IntoIterator<Item = EntityId>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.lock();
            for id in ids {
                match id {
                    EntityId::Item(n) => inner.next_item = inner.next_item.max(n),
                    EntityId::Property(n) => inner.next_property = inner.next_property.max(n),
                }
                inner.entities.entry(id).or_default();
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the store from the others
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of entities currently stored
    pub fn entity_count(&self) -> usize {
        self.lock().entities.len()
    }

    /// Number of successful create calls
    pub fn create_count(&self) -> usize {
        self.lock().creates
    }

    /// Number of clear calls
    pub fn clear_count(&self) -> usize {
        self.lock().clears
    }

    pub fn labels(&self, id: EntityId) -> Option<BTreeMap<String, String>> {
        self.lock().entities.get(&id).map(|e| e.labels.clone())
    }

    pub fn statements(&self, id: EntityId) -> Vec<Statement> {
        self.lock()
            .entities
            .get(&id)
            .map(|e| e.statements.clone())
            .unwrap_or_default()
    }
}

impl Inner {
    fn allocate(&mut self, kind: EntityKind) -> EntityId {
        match kind {
            EntityKind::Item => {
                self.next_item += 1;
                EntityId::Item(self.next_item)
            }
            EntityKind::Property => {
                self.next_property += 1;
                EntityId::Property(self.next_property)
            }
        }
    }

    /// First other entity whose labels clash with the draft
    fn collision(&self, draft: &EntityDraft, except: Option<EntityId>) -> Option<EntityId> {
        self.entities
            .iter()
            .filter(|(id, _)| id.kind() == draft.kind && Some(**id) != except)
            .find(|(_, entity)| {
                draft.labels.iter().any(|(language, label)| {
                    entity.labels.get(language) == Some(label)
                        && (draft.kind == EntityKind::Property
                            || entity.descriptions.get(language) == draft.descriptions.get(language))
                })
            })
            .map(|(id, _)| *id)
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut StoredEntity> {
        self.entities.get_mut(&id).ok_or_else(|| SyncError::Remote {
            code: "no-such-entity".to_string(),
            info: format!("Could not find an entity with the ID \"{}\".", id),
        })
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn create_entity(&self, draft: &EntityDraft) -> Result<CreateOutcome> {
        let mut inner = self.lock();
        if let Some(existing) = inner.collision(draft, None) {
            return Ok(CreateOutcome::AlreadyExists(existing));
        }

        let id = inner.allocate(draft.kind);
        inner.entities.insert(
            id,
            StoredEntity {
                labels: draft.labels.clone(),
                descriptions: draft.descriptions.clone(),
                statements: Vec::new(),
            },
        );
        inner.creates += 1;
        Ok(CreateOutcome::Created(id))
    }

    async fn edit_entity(&self, id: EntityId, draft: &EntityDraft) -> Result<CreateOutcome> {
        let mut inner = self.lock();
        if let Some(existing) = inner.collision(draft, Some(id)) {
            return Ok(CreateOutcome::AlreadyExists(existing));
        }

        let entity = inner.entity_mut(id)?;
        entity.labels.extend(draft.labels.clone());
        entity.descriptions.extend(draft.descriptions.clone());
        Ok(CreateOutcome::Created(id))
    }

    async fn clear_entity(&self, id: EntityId) -> Result<()> {
        let mut inner = self.lock();
        let entity = inner.entity_mut(id)?;
        *entity = StoredEntity::default();
        inner.clears += 1;
        Ok(())
    }

    async fn append_statements(&self, id: EntityId, statements: &[Statement]) -> Result<()> {
        let mut inner = self.lock();
        let entity = inner.entity_mut(id)?;
        entity.statements.extend_from_slice(statements);
        Ok(())
    }

    async fn fetch_statements(&self, id: EntityId) -> Result<Vec<Statement>> {
        let mut inner = self.lock();
        Ok(inner.entity_mut(id)?.statements.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> EntityDraft {
        EntityDraft::new(EntityKind::Item)
            .with_label("en", "Widget")
            .with_description("en", "A thing")
    }

    #[tokio::test]
    async fn test_sequential_ids_per_kind() {
        let store = MemoryStore::new();
        let q = store.create_entity(&widget()).await.unwrap();
        let p = store
            .create_entity(&EntityDraft::new(EntityKind::Property).with_label("en", "has part"))
            .await
            .unwrap();
        let q2 = store
            .create_entity(&EntityDraft::new(EntityKind::Item).with_label("en", "Gear"))
            .await
            .unwrap();

        assert_eq!(q, CreateOutcome::Created(EntityId::Item(1)));
        assert_eq!(p, CreateOutcome::Created(EntityId::Property(1)));
        assert_eq!(q2, CreateOutcome::Created(EntityId::Item(2)));
        assert_eq!(store.entity_count(), 3);
    }

    #[tokio::test]
    async fn test_item_collision_needs_same_description() {
        let store = MemoryStore::new();
        store.create_entity(&widget()).await.unwrap();

        let same = store.create_entity(&widget()).await.unwrap();
        assert_eq!(same, CreateOutcome::AlreadyExists(EntityId::Item(1)));

        let other_description = EntityDraft::new(EntityKind::Item)
            .with_label("en", "Widget")
            .with_description("en", "Something else");
        let created = store.create_entity(&other_description).await.unwrap();
        assert_eq!(created, CreateOutcome::Created(EntityId::Item(2)));
    }

    #[tokio::test]
    async fn test_property_collision_on_label_alone() {
        let store = MemoryStore::new();
        let draft = EntityDraft::new(EntityKind::Property).with_label("en", "has part");
        store.create_entity(&draft).await.unwrap();

        let again = draft.clone().with_description("en", "different");
        assert_eq!(
            store.create_entity(&again).await.unwrap(),
            CreateOutcome::AlreadyExists(EntityId::Property(1))
        );
    }

    #[tokio::test]
    async fn test_clear_then_edit() {
        let store = MemoryStore::new();
        store.create_entity(&widget()).await.unwrap();
        let id = EntityId::Item(1);
        store
            .append_statements(id, &[Statement::string(EntityId::Property(1), "x")])
            .await
            .unwrap();

        store.clear_entity(id).await.unwrap();
        assert!(store.statements(id).is_empty());
        assert!(store.labels(id).unwrap().is_empty());

        let outcome = store.edit_entity(id, &widget()).await.unwrap();
        assert_eq!(outcome, CreateOutcome::Created(id));
        assert_eq!(store.labels(id).unwrap()["en"], "Widget");
        assert_eq!(store.clear_count(), 1);
        assert_eq!(store.create_count(), 1);
    }

    #[tokio::test]
    async fn test_preloaded_entities_accept_statements() {
        let store = MemoryStore::with_entities([EntityId::Item(4), EntityId::Property(2)]);
        let statement = Statement::string(EntityId::Property(2), "x");

        store
            .append_statements(EntityId::Item(4), &[statement.clone()])
            .await
            .unwrap();
        assert_eq!(store.fetch_statements(EntityId::Item(4)).await.unwrap(), vec![statement]);
        assert_eq!(store.create_count(), 0);

        let next = store.create_entity(&widget()).await.unwrap();
        assert_eq!(next, CreateOutcome::Created(EntityId::Item(5)));
    }

    #[tokio::test]
    async fn test_unknown_entity_is_an_error() {
        let store = MemoryStore::new();
        let result = store.clear_entity(EntityId::Item(99)).await;
        assert!(matches!(result, Err(SyncError::Remote { .. })));
    }
}
