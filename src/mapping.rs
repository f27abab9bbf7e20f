use crate::error::{Result, SyncError};
use crate::graph::{self, Node, Object};
use crate::vocab;
use crate::wikibase::EntityId;
use oxigraph::io::{RdfFormat, RdfSerializer};
use oxigraph::model::{GraphNameRef, LiteralRef, NamedNodeRef, QuadRef};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const DEFAULT_LINK_FILE: &str = "tmp_ont2wb_links.ttl";

/// Links between source graph nodes and WikiBase entity IDs
///
/// Persisted as a Turtle file of `<node> schema:identifier "Q12"` triples.
/// A node maps to at most one ID; a link file that says otherwise is loaded
/// as-is and reported when the node is looked up.
#[derive(Debug)]
pub struct IdentifierMap {
    path: PathBuf,
    entries: BTreeMap<Node, Vec<EntityId>>,
}

impl IdentifierMap {
    /// Empty map that will persist to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load links from `path`, or start empty if the file doesn't exist
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut map = Self::new(path);

        if !map.path.exists() {
            tracing::debug!("No link file at {}, starting empty", map.path.display());
            return Ok(map);
        }

        tracing::debug!("Loading links from {}", map.path.display());

        let file = File::open(&map.path).map_err(|e| {
            SyncError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open link file {}: {}", map.path.display(), e),
            ))
        })?;
        let links = graph::parse_turtle(BufReader::new(file), &map.path.display().to_string())?;

        for triple in links.iter() {
            if triple.predicate.as_iri() != Some(vocab::SCHEMA_IDENTIFIER) {
                continue;
            }
            let Object::Literal(literal) = &triple.object else {
                continue;
            };
            let id: EntityId = literal.value.parse()?;
            let ids = map.entries.entry(triple.subject.clone()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        tracing::info!("Loaded {} links from {}", map.len(), map.path.display());
        Ok(map)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.entries.contains_key(node)
    }

    /// The single ID linked to `node`
    ///
    /// Returns `Ok(None)` for an unlinked node unless `fail_if_missing` is
    /// set, in which case that is a `MappingNotFound` error.
    pub fn lookup(&self, node: &Node, fail_if_missing: bool) -> Result<Option<EntityId>> {
        match self.entries.get(node).map(Vec::as_slice) {
            Some([id]) => Ok(Some(*id)),
            Some(ids) if ids.len() > 1 => Err(SyncError::AmbiguousMapping {
                node: node.to_string(),
                ids: ids.iter().map(EntityId::to_string).collect(),
            }),
            _ if fail_if_missing => Err(SyncError::MappingNotFound {
                node: node.to_string(),
            }),
            _ => Ok(None),
        }
    }

    /// Link `node` to `id`
    ///
    /// Recording an existing link again is a no-op and returns `false`.
    pub fn record(&mut self, node: Node, id: EntityId) -> Result<bool> {
        match self.entries.get(&node).map(Vec::as_slice) {
            Some([existing]) if *existing == id => Ok(false),
            Some([existing]) => Err(SyncError::MappingConflict {
                node: node.to_string(),
                existing: existing.to_string(),
                new: id.to_string(),
            }),
            Some(ids) if !ids.is_empty() => Err(SyncError::AmbiguousMapping {
                node: node.to_string(),
                ids: ids.iter().map(EntityId::to_string).collect(),
            }),
            _ => {
                self.entries.entry(node).or_default().push(id);
                Ok(true)
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Node, EntityId)> {
        self.entries
            .iter()
            .flat_map(|(node, ids)| ids.iter().map(move |id| (node, *id)))
    }

    /// Rewrite the link file (atomic)
    pub fn persist(&self) -> Result<()> {
        let temp_path = self.path.with_extension("ttl.tmp");
        tracing::debug!("Saving {} links to {}", self.len(), self.path.display());

        let write_err = |source: std::io::Error| SyncError::LinkFileWrite {
            path: self.path.clone(),
            source,
        };

        let file = File::create(&temp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        writeln!(
            writer,
            "# RDF node -> WikiBase entity links, written by ont2wb at {}",
            format_timestamp(SystemTime::now())
        )
        .map_err(write_err)?;

        let identifier = NamedNodeRef::new_unchecked(vocab::SCHEMA_IDENTIFIER);
        let mut serializer = RdfSerializer::from_format(RdfFormat::Turtle).for_writer(writer);
        for (node, id) in self.iter() {
            let Node::Iri(iri) = node else {
                tracing::debug!("Not persisting blank node link {} -> {}", node, id);
                continue;
            };
            let subject = NamedNodeRef::new(iri).map_err(|e| SyncError::Parse {
                source_name: iri.clone(),
                message: e.to_string(),
            })?;
            let value = id.to_string();
            serializer
                .serialize_quad(QuadRef::new(
                    subject,
                    identifier,
                    LiteralRef::new_simple_literal(&value),
                    GraphNameRef::DefaultGraph,
                ))
                .map_err(write_err)?;
        }
        let writer = serializer.finish().map_err(write_err)?;
        writer
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?
            .sync_all()
            .map_err(write_err)?;

        std::fs::rename(&temp_path, &self.path).map_err(write_err)?;
        Ok(())
    }
}

/// Format a timestamp for the link file header (ISO 8601)
fn format_timestamp(time: SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339()
}
