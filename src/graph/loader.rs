use super::{Literal, Node, Object, SourceGraph, Triple};
use crate::error::{Result, SyncError};
use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{Subject, Term};
use std::io::Read;
use std::path::Path;

/// Parse a Turtle document into a source graph
///
/// `source_name` is only used in error messages.
pub fn parse_turtle(reader: impl Read, source_name: &str) -> Result<SourceGraph> {
    let mut graph = SourceGraph::new();

    for quad in RdfParser::from_format(RdfFormat::Turtle).for_reader(reader) {
        let quad = quad.map_err(|e| SyncError::Parse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;

        let subject = match quad.subject {
            Subject::NamedNode(n) => Node::Iri(n.into_string()),
            Subject::BlankNode(b) => Node::Blank(b.into_string()),
            #[allow(unreachable_patterns)]
            _ => {
                tracing::debug!("Ignoring quoted triple subject in {}", source_name);
                continue;
            }
        };

        let object = match quad.object {
            Term::NamedNode(n) => Object::Node(Node::Iri(n.into_string())),
            Term::BlankNode(b) => Object::Node(Node::Blank(b.into_string())),
            Term::Literal(l) => Object::Literal(Literal {
                value: l.value().to_string(),
                language: l.language().map(str::to_string),
            }),
            #[allow(unreachable_patterns)]
            _ => {
                tracing::debug!("Ignoring quoted triple object in {}", source_name);
                continue;
            }
        };

        graph.insert(Triple::new(
            subject,
            Node::Iri(quad.predicate.into_string()),
            object,
        ));
    }

    Ok(graph)
}

/// Load the source ontology from a local file or an http(s) URL
pub async fn load_source(source: &str) -> Result<SourceGraph> {
    let graph = if source.starts_with("http://") || source.starts_with("https://") {
        tracing::info!("Downloading ontology from {}", source);
        let body = reqwest::get(source).await?.error_for_status()?.bytes().await?;
        parse_turtle(body.as_ref(), source)?
    } else {
        let path = Path::new(source);
        tracing::info!("Reading ontology from {}", path.display());
        let content = tokio::fs::read(path).await.map_err(|e| {
            SyncError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read ontology {}: {}", path.display(), e),
            ))
        })?;
        parse_turtle(content.as_slice(), source)?
    };

    tracing::info!(
        "Loaded {} triples about {} subjects",
        graph.len(),
        graph.subjects().len()
    );
    Ok(graph)
}
