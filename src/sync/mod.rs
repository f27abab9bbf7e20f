pub mod claims;
pub mod draft;
pub mod output;
pub mod seed;

use crate::classify::{Classifier, NodeClass};
use crate::config::SeedMapping;
use crate::error::{Result, SyncError};
use crate::graph::{Node, SourceGraph};
use crate::mapping::IdentifierMap;
use crate::wikibase::{CreateOutcome, EntityDraft, EntityId, RemoteStore};
use claims::{describe_value, ClaimMaterializer, ClaimOutcome};
use draft::{build_draft, DraftOptions};
use indicatif::{ProgressBar, ProgressStyle};
use output::SyncEvent;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Whether the claim pass looks at statements already on the wiki
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClaimPolicy {
    /// Append every statement, even if the entity has it already
    #[default]
    Append,
    /// Skip statements whose (property, value) pair the entity already has
    SkipExisting,
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub draft: DraftOptions,
    /// Ontology root IRI, never synchronized
    pub root: Option<Node>,
    pub claim_policy: ClaimPolicy,
    /// Stop after the entity pass
    pub entities_only: bool,
    /// Write the link file after the entity pass
    pub persist_links: bool,
    pub quiet: bool,
    pub json: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    pub seeds_created: usize,
    pub entities_created: usize,
    pub entities_reused: usize,
    pub entities_skipped: usize,
    pub collisions_recovered: usize,
    pub claims_added: usize,
    pub claims_structural: usize,
    pub claims_excluded: usize,
    pub claims_unhandled: usize,
    pub claims_duplicate: usize,
    pub duration: Duration,
}

impl SyncStats {
    /// Claims that were neither written nor part of the entity itself
    pub fn claims_skipped(&self) -> usize {
        self.claims_excluded + self.claims_unhandled + self.claims_duplicate
    }
}

/// Two-pass synchronization of a source graph into a remote store
///
/// Pass 1 makes sure every subject has a remote entity and a link, pass 2
/// turns the remaining triples into statements. All remote calls are awaited
/// one after the other.
pub struct SyncEngine<S: RemoteStore> {
    store: S,
    options: SyncOptions,
    seeds: Vec<SeedMapping>,
}

impl<S: RemoteStore> SyncEngine<S> {
    pub fn new(store: S, options: SyncOptions, seeds: Vec<SeedMapping>) -> Self {
        Self {
            store,
            options,
            seeds,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, graph: &SourceGraph, links: &mut IdentifierMap) -> Result<SyncStats> {
        let start = Instant::now();
        let mut stats = SyncStats::default();

        tracing::info!(
            "Starting sync: {} subjects, {} triples, {} existing links",
            graph.subjects().len(),
            graph.len(),
            links.len()
        );
        if self.options.json {
            SyncEvent::Start {
                subjects: graph.subjects().len(),
                links: links.len(),
            }
            .emit();
        }

        if links.is_empty() {
            self.install_seeds(links, &mut stats).await?;
        }

        self.sync_entities(graph, links, &mut stats).await?;

        if self.options.persist_links {
            links.persist()?;
            tracing::info!("Saved {} links to {}", links.len(), links.path().display());
        }

        if self.options.entities_only {
            tracing::info!("Skipping claims (entities only)");
        } else {
            self.sync_claims(graph, links, &mut stats).await?;
        }

        stats.duration = start.elapsed();
        tracing::info!(
            "Sync complete: {} entities created, {} reused, {} claims added, {} skipped",
            stats.entities_created,
            stats.entities_reused,
            stats.claims_added,
            stats.claims_skipped()
        );
        if self.options.json {
            SyncEvent::Summary {
                seeds_created: stats.seeds_created,
                entities_created: stats.entities_created,
                entities_reused: stats.entities_reused,
                entities_skipped: stats.entities_skipped,
                collisions_recovered: stats.collisions_recovered,
                claims_added: stats.claims_added,
                claims_skipped: stats.claims_skipped(),
                duration_secs: stats.duration.as_secs_f64(),
            }
            .emit();
        }

        Ok(stats)
    }

    /// Pass 1: a remote entity and a link for every subject
    pub async fn sync_entities(
        &self,
        graph: &SourceGraph,
        links: &mut IdentifierMap,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let classifier = Classifier::new(graph, &self.seeds);
        let pb = self.progress_bar(graph.subjects().len());

        for subject in graph.subjects() {
            pb.inc(1);
            if self.is_root(subject) {
                tracing::debug!("Skipping ontology root {}", subject);
                continue;
            }

            if let Some(id) = links.lookup(subject, false)? {
                tracing::debug!("{} already linked to {}", subject, id);
                stats.entities_reused += 1;
                if self.options.json {
                    SyncEvent::EntityReused {
                        node: subject.to_string(),
                        id: id.to_string(),
                    }
                    .emit();
                }
                continue;
            }

            let class = classifier.classify(subject)?;
            let Some(draft) = build_draft(graph, subject, class, &self.options.draft) else {
                tracing::debug!("Skipping {} ({:?})", subject, class);
                stats.entities_skipped += 1;
                if self.options.json {
                    SyncEvent::EntitySkipped {
                        node: subject.to_string(),
                        reason: "ontology root".to_string(),
                    }
                    .emit();
                }
                continue;
            };

            let label = draft.display_label(&self.options.draft.default_language);
            pb.set_message(label.to_string());
            let id = self.create_or_reuse(&draft, stats).await?;
            links.record(subject.clone(), id)?;
            stats.entities_created += 1;

            tracing::info!("Created {} '{}' for {}", id, label, subject);
            if self.options.json {
                SyncEvent::EntityCreated {
                    node: subject.to_string(),
                    id: id.to_string(),
                    label: label.to_string(),
                }
                .emit();
            }
        }

        pb.finish_with_message("Entities done");
        Ok(())
    }

    /// Pass 2: statements for every linked subject
    pub async fn sync_claims(
        &self,
        graph: &SourceGraph,
        links: &IdentifierMap,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let classifier = Classifier::new(graph, &self.seeds);
        let excluded = seed::excluded_properties(&self.seeds, links)?;
        let materializer =
            ClaimMaterializer::new(links, Classifier::new(graph, &self.seeds), &excluded);
        let pb = self.progress_bar(graph.subjects().len());

        for subject in graph.subjects() {
            pb.inc(1);
            if self.is_root(subject) {
                continue;
            }

            let id = match links.lookup(subject, false)? {
                Some(id) => id,
                None => match classifier.classify(subject)? {
                    NodeClass::OntologyRoot => continue,
                    _ => {
                        return Err(SyncError::MappingNotFound {
                            node: subject.to_string(),
                        })
                    }
                },
            };
            pb.set_message(id.to_string());

            let mut existing: HashSet<(String, String)> = match self.options.claim_policy {
                ClaimPolicy::Append => HashSet::new(),
                ClaimPolicy::SkipExisting => self
                    .store
                    .fetch_statements(id)
                    .await?
                    .iter()
                    .filter_map(|s| s.key())
                    .collect(),
            };

            for triple in graph.triples_for(subject) {
                match materializer.materialize(triple)? {
                    ClaimOutcome::Structural => {
                        stats.claims_structural += 1;
                    }
                    ClaimOutcome::Unhandled => {
                        tracing::info!("Unhandled predicate {} on {}, skipping", triple.predicate, subject);
                        stats.claims_unhandled += 1;
                        self.emit_claim_skipped(id, triple.predicate.to_string(), "unhandled");
                    }
                    ClaimOutcome::Excluded { property } => {
                        tracing::warn!(
                            "Not adding {} claim to {}: the wiki manages this property itself",
                            property,
                            id
                        );
                        stats.claims_excluded += 1;
                        self.emit_claim_skipped(id, triple.predicate.to_string(), "excluded");
                    }
                    ClaimOutcome::Statement(statement) => {
                        if self.options.claim_policy == ClaimPolicy::SkipExisting {
                            if let Some(key) = statement.key() {
                                if !existing.insert(key) {
                                    tracing::debug!("{} already has {} {}", id, triple.predicate, triple.object);
                                    stats.claims_duplicate += 1;
                                    self.emit_claim_skipped(
                                        id,
                                        triple.predicate.to_string(),
                                        "duplicate",
                                    );
                                    continue;
                                }
                            }
                        }

                        let value = describe_value(&statement);
                        self.store
                            .append_statements(id, std::slice::from_ref(&statement))
                            .await?;
                        stats.claims_added += 1;

                        tracing::info!("Added claim {} {} {}", id, statement.property(), value);
                        if self.options.json {
                            SyncEvent::ClaimAdded {
                                subject: id.to_string(),
                                property: statement.property().to_string(),
                                value,
                            }
                            .emit();
                        }
                    }
                }
            }
        }

        pb.finish_with_message("Claims done");
        Ok(())
    }

    /// Create the entity; if the wiki reports a clash, clear the existing
    /// entity and submit the draft against it once
    pub async fn create_or_reuse(
        &self,
        draft: &EntityDraft,
        stats: &mut SyncStats,
    ) -> Result<EntityId> {
        let existing = match self.store.create_entity(draft).await? {
            CreateOutcome::Created(id) => return Ok(id),
            CreateOutcome::AlreadyExists(id) => id,
        };

        tracing::warn!(
            "'{}' already exists as {}, clearing and re-submitting",
            draft.display_label(&self.options.draft.default_language),
            existing
        );
        self.store.clear_entity(existing).await?;

        match self.store.edit_entity(existing, draft).await? {
            CreateOutcome::Created(id) => {
                stats.collisions_recovered += 1;
                if self.options.json {
                    SyncEvent::CollisionRecovered { id: id.to_string() }.emit();
                }
                Ok(id)
            }
            CreateOutcome::AlreadyExists(other) => Err(SyncError::RemoteCollision {
                id: other.to_string(),
            }),
        }
    }

    fn is_root(&self, node: &Node) -> bool {
        self.options.root.as_ref() == Some(node)
    }

    fn emit_claim_skipped(&self, subject: EntityId, predicate: String, reason: &str) {
        if self.options.json {
            SyncEvent::ClaimSkipped {
                subject: subject.to_string(),
                predicate,
                reason: reason.to_string(),
            }
            .emit();
        }
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if self.options.quiet || self.options.json {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Literal, Object, Triple};
    use crate::vocab;
    use crate::wikibase::{EntityKind, MemoryStore, Statement, ValueKind};

    fn ex(local: &str) -> Node {
        Node::iri(format!("http://example.org/{}", local))
    }

    fn options() -> SyncOptions {
        SyncOptions {
            quiet: true,
            ..SyncOptions::default()
        }
    }

    fn class(local: &str, label: &str) -> Vec<Triple> {
        vec![
            Triple::new(ex(local), Node::iri(vocab::RDF_TYPE), Object::Node(Node::iri(vocab::OWL_CLASS))),
            Triple::new(
                ex(local),
                Node::iri(vocab::RDFS_LABEL),
                Object::Literal(Literal::with_language(label, "en")),
            ),
        ]
    }

    #[tokio::test]
    async fn test_create_or_reuse_recovers_collision() {
        let engine = SyncEngine::new(MemoryStore::new(), options(), Vec::new());
        let mut stats = SyncStats::default();
        let draft = EntityDraft::new(EntityKind::Item).with_label("en", "Widget");

        let first = engine.create_or_reuse(&draft, &mut stats).await.unwrap();
        let second = engine.create_or_reuse(&draft, &mut stats).await.unwrap();

        assert_eq!(first, EntityId::Item(1));
        assert_eq!(second, first);
        assert_eq!(stats.collisions_recovered, 1);
        assert_eq!(engine.store().clear_count(), 1);
        assert_eq!(engine.store().entity_count(), 1);
    }

    #[tokio::test]
    async fn test_skips_root_and_ontology_subjects() {
        let mut triples = class("Widget", "Widget");
        triples.push(Triple::new(
            ex("ontology"),
            Node::iri(vocab::RDF_TYPE),
            Object::Node(Node::iri(vocab::OWL_ONTOLOGY)),
        ));
        triples.push(Triple::new(
            ex("base"),
            Node::iri(vocab::RDFS_COMMENT),
            Object::Literal(Literal::new("root")),
        ));
        let graph: SourceGraph = triples.into_iter().collect();

        let engine = SyncEngine::new(
            MemoryStore::new(),
            SyncOptions {
                root: Some(ex("base")),
                ..options()
            },
            Vec::new(),
        );
        let mut links = IdentifierMap::new("links.ttl");
        let stats = engine.run(&graph, &mut links).await.unwrap();

        assert_eq!(stats.entities_created, 1);
        assert_eq!(stats.entities_skipped, 1);
        assert_eq!(links.len(), 1);
        assert!(!links.contains(&ex("base")));
        assert!(!links.contains(&ex("ontology")));
    }

    #[tokio::test]
    async fn test_unlinked_subject_in_claim_pass_fails() {
        let graph: SourceGraph = class("Widget", "Widget").into_iter().collect();
        let engine = SyncEngine::new(MemoryStore::new(), options(), Vec::new());
        let links = IdentifierMap::new("links.ttl");

        let result = engine
            .sync_claims(&graph, &links, &mut SyncStats::default())
            .await;
        assert!(matches!(result, Err(SyncError::MappingNotFound { .. })));
    }

    #[tokio::test]
    async fn test_skip_existing_claims() {
        let mut triples = class("Widget", "Widget");
        triples.extend(class("Gear", "Gear"));
        triples.push(Triple::new(
            ex("Widget"),
            Node::iri(vocab::RDFS_SUB_CLASS_OF),
            Object::Node(ex("Gear")),
        ));
        let graph: SourceGraph = triples.into_iter().collect();
        let seeds = vec![SeedMapping::new(
            vocab::RDFS_SUB_CLASS_OF,
            "P279",
            "subclass of",
            ValueKind::Item,
        )];

        let engine = SyncEngine::new(
            MemoryStore::new(),
            SyncOptions {
                claim_policy: ClaimPolicy::SkipExisting,
                ..options()
            },
            seeds,
        );
        let mut links = IdentifierMap::new("links.ttl");

        let first = engine.run(&graph, &mut links).await.unwrap();
        assert_eq!(first.claims_added, 1);

        let second = engine.run(&graph, &mut links).await.unwrap();
        assert_eq!(second.claims_added, 0);
        assert_eq!(second.claims_duplicate, 1);
        assert_eq!(second.entities_reused, 2);
        assert_eq!(second.seeds_created, 0);

        let widget = links.lookup(&ex("Widget"), true).unwrap().unwrap();
        assert_eq!(
            engine.store().statements(widget),
            vec![Statement::entity(
                EntityId::Property(1),
                ValueKind::Item,
                EntityId::Item(2)
            )]
        );
    }

    #[tokio::test]
    async fn test_entities_only() {
        let mut triples = class("Widget", "Widget");
        triples.push(Triple::new(
            ex("Widget"),
            Node::iri(vocab::RDFS_SUB_CLASS_OF),
            Object::Node(ex("Gear")),
        ));
        let graph: SourceGraph = triples.into_iter().collect();

        let engine = SyncEngine::new(
            MemoryStore::new(),
            SyncOptions {
                entities_only: true,
                ..options()
            },
            Vec::new(),
        );
        let mut links = IdentifierMap::new("links.ttl");
        let stats = engine.run(&graph, &mut links).await.unwrap();

        assert_eq!(stats.entities_created, 1);
        assert_eq!(stats.claims_added, 0);
    }
}
