use super::output::SyncEvent;
use super::{SyncEngine, SyncStats};
use crate::config::SeedMapping;
use crate::error::Result;
use crate::graph::Node;
use crate::mapping::IdentifierMap;
use crate::wikibase::{EntityDraft, EntityId, EntityKind, RemoteStore};
use std::collections::HashSet;

/// Draft of the wiki property standing in for a seed predicate
pub fn seed_draft(seed: &SeedMapping, language: &str) -> EntityDraft {
    EntityDraft::new(EntityKind::Property)
        .with_label(language, seed.label.clone())
        .with_datatype(seed.value_kind)
}

/// Properties whose claims are never written
pub fn excluded_properties(seeds: &[SeedMapping], links: &IdentifierMap) -> Result<HashSet<EntityId>> {
    let mut excluded = HashSet::new();
    for seed in seeds.iter().filter(|s| s.skip_claims) {
        if let Some(id) = links.lookup(&Node::iri(seed.node.as_str()), false)? {
            excluded.insert(id);
        }
    }
    Ok(excluded)
}

impl<S: RemoteStore> SyncEngine<S> {
    /// Create wiki properties for the well-known predicates
    pub(super) async fn install_seeds(
        &self,
        links: &mut IdentifierMap,
        stats: &mut SyncStats,
    ) -> Result<()> {
        tracing::info!("Installing {} seed properties", self.seeds.len());

        for seed in &self.seeds {
            let node = Node::iri(seed.node.as_str());
            if links.contains(&node) {
                tracing::debug!("Seed {} already linked", seed.node);
                continue;
            }

            let draft = seed_draft(seed, &self.options.draft.default_language);
            let id = self.create_or_reuse(&draft, stats).await?;
            links.record(node, id)?;
            stats.seeds_created += 1;

            match &seed.wikidata {
                Some(hint) => tracing::info!("Seeded {} as {} (Wikidata {})", seed.node, id, hint),
                None => tracing::info!("Seeded {} as {}", seed.node, id),
            }
            if self.options.json {
                SyncEvent::SeedCreated {
                    node: seed.node.clone(),
                    id: id.to_string(),
                }
                .emit();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_seeds;
    use crate::vocab;
    use crate::wikibase::ValueKind;

    #[test]
    fn test_seed_draft() {
        let seed = SeedMapping::new(vocab::RDFS_SUB_CLASS_OF, "P279", "subclass of", ValueKind::Item);
        let draft = seed_draft(&seed, "en");

        assert_eq!(draft.kind, EntityKind::Property);
        assert_eq!(draft.labels["en"], "subclass of");
        assert!(draft.descriptions.is_empty());
        assert_eq!(draft.datatype, ValueKind::Item);
    }

    #[test]
    fn test_excluded_properties() {
        let seeds = default_seeds();
        let mut links = IdentifierMap::new("links.ttl");
        assert!(excluded_properties(&seeds, &links).unwrap().is_empty());

        links
            .record(Node::iri(vocab::RDFS_SUB_CLASS_OF), EntityId::Property(1))
            .unwrap();
        links
            .record(Node::iri(vocab::RDFS_SUB_PROPERTY_OF), EntityId::Property(2))
            .unwrap();

        let excluded = excluded_properties(&seeds, &links).unwrap();
        assert_eq!(excluded.len(), 1);
        assert!(excluded.contains(&EntityId::Property(2)));
    }
}
