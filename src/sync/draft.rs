use crate::classify::NodeClass;
use crate::graph::{Node, Object, SourceGraph};
use crate::vocab;
use crate::wikibase::{EntityDraft, EntityKind, ValueKind};
use std::collections::BTreeMap;

/// How labels and descriptions are assembled from the source literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOptions {
    /// Language for literals without a language tag
    pub default_language: String,
    pub label_separator: String,
    pub description_separator: String,
    /// Maximum description length in characters
    pub description_limit: usize,
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self {
            default_language: crate::config::DEFAULT_LANGUAGE.to_string(),
            label_separator: crate::config::DEFAULT_SEPARATOR.to_string(),
            description_separator: crate::config::DEFAULT_SEPARATOR.to_string(),
            description_limit: crate::config::DEFAULT_DESCRIPTION_LIMIT,
        }
    }
}

/// Build the creation payload for `node`
///
/// Returns `None` for classes that are not synchronized (the ontology root).
pub fn build_draft(
    graph: &SourceGraph,
    node: &Node,
    class: NodeClass,
    options: &DraftOptions,
) -> Option<EntityDraft> {
    let (kind, datatype) = match class {
        NodeClass::Class => (EntityKind::Item, ValueKind::String),
        NodeClass::Property { datatype } => (EntityKind::Property, datatype),
        NodeClass::OntologyRoot | NodeClass::Literal => return None,
    };

    let labels = aggregate(
        graph,
        node,
        &vocab::LABEL_PREDICATES,
        &options.default_language,
        &options.label_separator,
    );
    let descriptions = aggregate(
        graph,
        node,
        &vocab::DESCRIPTION_PREDICATES,
        &options.default_language,
        &options.description_separator,
    )
    .into_iter()
    .map(|(language, text)| (language, truncate_description(&text, options.description_limit)))
    .collect();

    Some(EntityDraft {
        kind,
        labels,
        descriptions,
        datatype,
    })
}

/// Join all literals of `predicates` per language
///
/// Predicates are visited in the given order and every one of them
/// contributes, so a `skos:prefLabel` is kept next to an `rdfs:label`.
fn aggregate(
    graph: &SourceGraph,
    node: &Node,
    predicates: &[&str],
    default_language: &str,
    separator: &str,
) -> BTreeMap<String, String> {
    let mut texts: BTreeMap<String, String> = BTreeMap::new();

    for predicate in predicates {
        for object in graph.objects(node, predicate) {
            let Object::Literal(literal) = object else {
                continue;
            };
            let language = literal.language.as_deref().unwrap_or(default_language);
            texts
                .entry(language.to_string())
                .and_modify(|text| {
                    text.push_str(separator);
                    text.push_str(&literal.value);
                })
                .or_insert_with(|| literal.value.clone());
        }
    }

    texts
}

/// Cut `text` to `limit` characters, marking the cut with `...`
pub fn truncate_description(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    if limit < 3 {
        return text.chars().take(limit).collect();
    }
    let mut truncated: String = text.chars().take(limit - 3).collect();
    truncated.push_str("...");
    truncated
}
