use crate::classify::Classifier;
use crate::error::{Result, SyncError};
use crate::graph::{Node, Object, Triple};
use crate::mapping::IdentifierMap;
use crate::vocab;
use crate::wikibase::{DataValue, EntityId, Statement, ValueKind};
use std::collections::HashSet;

/// What becomes of a single source triple in the claim pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Consumed while building the entity (labels, types, cardinalities)
    Structural,
    /// `rdfs:domain` / `rdfs:range`, not modeled as statements
    Unhandled,
    /// The property is managed by the wiki itself
    Excluded { property: EntityId },
    Statement(Statement),
}

/// Turns triples into statements using the links of the entity pass
///
/// The kind of the linked entity decides the value kind of an entity
/// statement; `classify_object` only produces a warning when it disagrees.
pub struct ClaimMaterializer<'a> {
    links: &'a IdentifierMap,
    classifier: Classifier<'a>,
    excluded: &'a HashSet<EntityId>,
}

impl<'a> ClaimMaterializer<'a> {
    pub fn new(
        links: &'a IdentifierMap,
        classifier: Classifier<'a>,
        excluded: &'a HashSet<EntityId>,
    ) -> Self {
        Self {
            links,
            classifier,
            excluded,
        }
    }

    pub fn materialize(&self, triple: &Triple) -> Result<ClaimOutcome> {
        let predicate = triple.predicate.as_iri().unwrap_or_default();
        if vocab::is_structural_predicate(predicate) {
            return Ok(ClaimOutcome::Structural);
        }
        if vocab::is_unhandled_predicate(predicate) {
            return Ok(ClaimOutcome::Unhandled);
        }

        let property = self.resolve(&triple.predicate)?;
        if self.excluded.contains(&property) {
            return Ok(ClaimOutcome::Excluded { property });
        }

        let statement = match &triple.object {
            Object::Literal(literal) => Statement::string(property, literal.value.clone()),
            Object::Node(node) => {
                let target = self.resolve(node)?;
                let class = self.classifier.classify_object(&triple.object)?;
                if class.entity_kind() != Some(target.kind()) {
                    tracing::warn!(
                        "{} looks like a {:?} but is linked to {}, using the linked entity",
                        node,
                        class,
                        target
                    );
                }
                Statement::entity(property, ValueKind::from(target.kind()), target)
            }
        };

        Ok(ClaimOutcome::Statement(statement))
    }

    fn resolve(&self, node: &Node) -> Result<EntityId> {
        self.links
            .lookup(node, true)?
            .ok_or_else(|| SyncError::MappingNotFound {
                node: node.to_string(),
            })
    }
}

/// Statement value for log lines and events
pub fn describe_value(statement: &Statement) -> String {
    match &statement.mainsnak.datavalue {
        Some(DataValue::String(value)) => value.clone(),
        Some(DataValue::Entity(entity)) => entity.id.clone(),
        None => String::new(),
    }
}
