use crate::config::SeedMapping;
use crate::error::{Result, SyncError};
use crate::graph::{Node, Object, SourceGraph};
use crate::vocab;
use crate::wikibase::{EntityKind, ValueKind};

/// What a source node turns into on the wiki
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// `owl:Class` -> Item
    Class,
    /// `owl:ObjectProperty` / `owl:DatatypeProperty` -> Property
    Property { datatype: ValueKind },
    /// `owl:Ontology` -> not synchronized
    OntologyRoot,
    Literal,
}

impl NodeClass {
    /// Kind of wiki entity, `None` for nodes that are not synchronized
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            NodeClass::Class => Some(EntityKind::Item),
            NodeClass::Property { .. } => Some(EntityKind::Property),
            NodeClass::OntologyRoot | NodeClass::Literal => None,
        }
    }
}

/// Infers the wiki representation of source nodes from their `rdf:type`s
pub struct Classifier<'a> {
    graph: &'a SourceGraph,
    seeds: &'a [SeedMapping],
}

impl<'a> Classifier<'a> {
    pub fn new(graph: &'a SourceGraph, seeds: &'a [SeedMapping]) -> Self {
        Self { graph, seeds }
    }

    /// Classify a subject by its declared types
    ///
    /// A node with none of the known types is an error: the ontology is
    /// expected to type every subject it defines.
    pub fn classify(&self, node: &Node) -> Result<NodeClass> {
        let types = self.graph.types_of(node);
        classify_types(&types).ok_or_else(|| SyncError::Unclassified {
            node: node.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
        })
    }

    /// Classify a statement value
    ///
    /// Typed nodes go through [`classify`](Self::classify). Untyped nodes
    /// use their seed entry if there is one, else [`classify_by_name`].
    pub fn classify_object(&self, object: &Object) -> Result<NodeClass> {
        let node = match object {
            Object::Literal(_) => return Ok(NodeClass::Literal),
            Object::Node(node) => node,
        };

        if !self.graph.types_of(node).is_empty() {
            return self.classify(node);
        }

        if let Some(seed) = self
            .seeds
            .iter()
            .find(|s| node.as_iri() == Some(s.node.as_str()))
        {
            return Ok(NodeClass::Property {
                datatype: seed.value_kind,
            });
        }

        Ok(classify_by_name(node))
    }
}

fn classify_types(types: &[&str]) -> Option<NodeClass> {
    if types.contains(&vocab::OWL_CLASS) {
        Some(NodeClass::Class)
    } else if types.contains(&vocab::OWL_OBJECT_PROPERTY) {
        Some(NodeClass::Property {
            datatype: ValueKind::Item,
        })
    } else if types.contains(&vocab::OWL_DATATYPE_PROPERTY) {
        Some(NodeClass::Property {
            datatype: ValueKind::String,
        })
    } else if types.contains(&vocab::OWL_ONTOLOGY) {
        Some(NodeClass::OntologyRoot)
    } else {
        None
    }
}

/// Naming heuristic for nodes the ontology never types
///
/// `ex:Gear` (uppercase local name) is taken for a class, `ex:isBasedOn` for a
/// property. Best effort only: it follows the usual OWL naming convention and
/// nothing more.
pub fn classify_by_name(node: &Node) -> NodeClass {
    let starts_upper = node
        .local_name()
        .chars()
        .next()
        .is_some_and(char::is_uppercase);
    if starts_upper {
        NodeClass::Class
    } else {
        NodeClass::Property {
            datatype: ValueKind::String,
        }
    }
}
