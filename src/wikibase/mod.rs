pub mod http;
pub mod memory;
pub mod model;
pub mod router;

use crate::error::{Result, SyncError};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

pub use http::WikibaseClient;
pub use memory::MemoryStore;
pub use model::{DataValue, EntityDraft, EntityValue, Statement, ValueKind};
pub use router::StoreRouter;

/// Kind of a remote entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Item,
    Property,
}

impl EntityKind {
    /// Name used by `wbeditentity`'s `new` parameter and by entity values
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Property => "property",
        }
    }
}

/// Identifier of an Item (`Q<n>`) or a Property (`P<n>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Item(u64),
    Property(u64),
}

impl EntityId {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityId::Item(_) => EntityKind::Item,
            EntityId::Property(_) => EntityKind::Property,
        }
    }

    pub fn numeric_id(&self) -> u64 {
        match self {
            EntityId::Item(n) | EntityId::Property(n) => *n,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Item(n) => write!(f, "Q{}", n),
            EntityId::Property(n) => write!(f, "P{}", n),
        }
    }
}

impl FromStr for EntityId {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || SyncError::InvalidEntityId(s.to_string());
        let (prefix, digits) = s.split_at(s.char_indices().nth(1).map_or(s.len(), |(i, _)| i));
        let n: u64 = digits.parse().map_err(|_| invalid())?;
        match prefix {
            "Q" | "q" => Ok(EntityId::Item(n)),
            "P" | "p" => Ok(EntityId::Property(n)),
            _ => Err(invalid()),
        }
    }
}

/// Result of submitting an entity draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(EntityId),
    /// An entity with the same natural key (label/description) exists already
    AlreadyExists(EntityId),
}

/// Remote structured-entity store (a Wikibase instance)
///
/// All methods are awaited one at a time by the sync engine; implementations
/// don't need to handle overlapping calls.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create a new entity from the draft
    async fn create_entity(&self, draft: &EntityDraft) -> Result<CreateOutcome>;

    /// Submit the draft against an existing entity
    async fn edit_entity(&self, id: EntityId, draft: &EntityDraft) -> Result<CreateOutcome>;

    /// Remove labels, descriptions and statements of an entity
    async fn clear_entity(&self, id: EntityId) -> Result<()>;

    /// Add statements to an existing entity
    async fn append_statements(&self, id: EntityId, statements: &[Statement]) -> Result<()>;

    /// Current statements of an entity
    async fn fetch_statements(&self, id: EntityId) -> Result<Vec<Statement>>;
}
