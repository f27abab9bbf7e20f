use super::{
    http::WikibaseClient, memory::MemoryStore, CreateOutcome, EntityDraft, EntityId, RemoteStore,
    Statement,
};
use crate::error::Result;
use crate::mapping::IdentifierMap;
use async_trait::async_trait;

/// Router that dispatches to the live Wikibase API or to the in-memory store
///
/// Dry runs use the in-memory store so the whole pipeline (classification,
/// collision handling, claim building) runs without touching the wiki.
pub enum StoreRouter {
    Http(WikibaseClient),
    Memory(MemoryStore),
}

impl StoreRouter {
    /// Log into the wiki at `api_url`
    pub async fn connect(api_url: &str, username: &str, password: &str) -> Result<Self> {
        let client = WikibaseClient::new(api_url)?;
        client.login(username, password).await?;
        Ok(StoreRouter::Http(client))
    }

    /// In-memory store seeded with every entity `links` points at
    pub fn dry_run(links: &IdentifierMap) -> Self {
        StoreRouter::Memory(MemoryStore::with_entities(links.iter().map(|(_, id)| id)))
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, StoreRouter::Memory(_))
    }
}

#[async_trait]
impl RemoteStore for StoreRouter {
    async fn create_entity(&self, draft: &EntityDraft) -> Result<CreateOutcome> {
        match self {
            StoreRouter::Http(s) => s.create_entity(draft).await,
            StoreRouter::Memory(s) => s.create_entity(draft).await,
        }
    }

    async fn edit_entity(&self, id: EntityId, draft: &EntityDraft) -> Result<CreateOutcome> {
        match self {
            StoreRouter::Http(s) => s.edit_entity(id, draft).await,
            StoreRouter::Memory(s) => s.edit_entity(id, draft).await,
        }
    }

    async fn clear_entity(&self, id: EntityId) -> Result<()> {
        match self {
            StoreRouter::Http(s) => s.clear_entity(id).await,
            StoreRouter::Memory(s) => s.clear_entity(id).await,
        }
    }

    async fn append_statements(&self, id: EntityId, statements: &[Statement]) -> Result<()> {
        match self {
            StoreRouter::Http(s) => s.append_statements(id, statements).await,
            StoreRouter::Memory(s) => s.append_statements(id, statements).await,
        }
    }

    async fn fetch_statements(&self, id: EntityId) -> Result<Vec<Statement>> {
        match self {
            StoreRouter::Http(s) => s.fetch_statements(id).await,
            StoreRouter::Memory(s) => s.fetch_statements(id).await,
        }
    }
}
