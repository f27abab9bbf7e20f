pub mod loader;

use crate::vocab;
use std::collections::HashMap;
use std::fmt;

pub use loader::{load_source, parse_turtle};

/// A node of the source graph: an IRI or a blank node label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Iri(String),
    Blank(String),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            Node::Blank(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }

    /// Local part of the identifier: everything after the last `#`, `/` or `:`
    pub fn local_name(&self) -> &str {
        match self {
            Node::Iri(iri) => iri
                .rfind(['#', '/', ':'])
                .map(|pos| &iri[pos + 1..])
                .unwrap_or(iri),
            Node::Blank(id) => id,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "{}", iri),
            Node::Blank(id) => write!(f, "_:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub language: Option<String>,
}

impl Literal {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
        }
    }

    pub fn with_language(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
    Node(Node),
    Literal(Literal),
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Node(node) => node.fmt(f),
            Object::Literal(lit) => match &lit.language {
                Some(lang) => write!(f, "{:?}@{}", lit.value, lang),
                None => write!(f, "{:?}", lit.value),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Node,
    pub object: Object,
}

impl Triple {
    pub fn new(subject: Node, predicate: Node, object: Object) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

/// In-memory source graph indexed by subject
///
/// Subjects keep their first-appearance order so both sync passes visit them
/// deterministically.
#[derive(Debug, Default)]
pub struct SourceGraph {
    triples: Vec<Triple>,
    subjects: Vec<Node>,
    by_subject: HashMap<Node, Vec<usize>>,
}

impl SourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, triple: Triple) {
        let index = self.triples.len();
        match self.by_subject.get_mut(&triple.subject) {
            Some(indices) => indices.push(index),
            None => {
                self.subjects.push(triple.subject.clone());
                self.by_subject.insert(triple.subject.clone(), vec![index]);
            }
        }
        self.triples.push(triple);
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Distinct subjects in first-appearance order
    pub fn subjects(&self) -> &[Node] {
        &self.subjects
    }

    /// All triples with the given subject
    pub fn triples_for<'a>(&'a self, subject: &Node) -> impl Iterator<Item = &'a Triple> + 'a {
        self.by_subject
            .get(subject)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.triples[i])
    }

    /// Objects of `(node, predicate, ?)`
    pub fn objects<'a>(
        &'a self,
        node: &Node,
        predicate: &'a str,
    ) -> impl Iterator<Item = &'a Object> + 'a {
        self.triples_for(node)
            .filter(move |t| t.predicate.as_iri() == Some(predicate))
            .map(|t| &t.object)
    }

    /// IRIs declared through `rdf:type`
    pub fn types_of(&self, node: &Node) -> Vec<&str> {
        self.objects(node, vocab::RDF_TYPE)
            .filter_map(|o| match o {
                Object::Node(n) => n.as_iri(),
                Object::Literal(_) => None,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }
}

impl FromIterator<Triple> for SourceGraph {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut graph = SourceGraph::new();
        for triple in iter {
            graph.insert(triple);
        }
        graph
    }
}
