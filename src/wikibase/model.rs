//! Wikibase JSON data model for the parts the converter writes
//!
//! See <https://www.mediawiki.org/wiki/Wikibase/DataModel/JSON>.

use super::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of value a statement (or a property's datatype) holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Item,
    Property,
}

impl ValueKind {
    /// Wikibase datatype name (`wikibase-item`, `string`, ...)
    pub fn datatype(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Item => "wikibase-item",
            ValueKind::Property => "wikibase-property",
        }
    }
}

impl From<EntityKind> for ValueKind {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Item => ValueKind::Item,
            EntityKind::Property => ValueKind::Property,
        }
    }
}

/// Creation payload for an Item or a Property
///
/// Labels and descriptions map a language code to the text in that language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDraft {
    pub kind: EntityKind,
    pub labels: BTreeMap<String, String>,
    pub descriptions: BTreeMap<String, String>,
    /// Value datatype, only meaningful for properties
    pub datatype: ValueKind,
}

#[derive(Debug, Serialize)]
struct MonolingualText<'a> {
    language: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct EntityData<'a> {
    labels: BTreeMap<&'a str, MonolingualText<'a>>,
    descriptions: BTreeMap<&'a str, MonolingualText<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    datatype: Option<&'static str>,
}

fn monolingual(map: &BTreeMap<String, String>) -> BTreeMap<&str, MonolingualText<'_>> {
    map.iter()
        .map(|(language, value)| {
            (
                language.as_str(),
                MonolingualText {
                    language: language.as_str(),
                    value: value.as_str(),
                },
            )
        })
        .collect()
}

impl EntityDraft {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            labels: BTreeMap::new(),
            descriptions: BTreeMap::new(),
            datatype: ValueKind::String,
        }
    }

    pub fn with_label(mut self, language: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(language.into(), label.into());
        self
    }

    pub fn with_description(
        mut self,
        language: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.descriptions.insert(language.into(), description.into());
        self
    }

    pub fn with_datatype(mut self, datatype: ValueKind) -> Self {
        self.datatype = datatype;
        self
    }

    /// Label used in log lines: the given language, else any
    pub fn display_label(&self, language: &str) -> &str {
        self.labels
            .get(language)
            .or_else(|| self.labels.values().next())
            .map(String::as_str)
            .unwrap_or("<no label>")
    }

    /// `data` parameter of `wbeditentity`
    pub fn to_json(&self) -> serde_json::Value {
        let data = EntityData {
            labels: monolingual(&self.labels),
            descriptions: monolingual(&self.descriptions),
            datatype: match self.kind {
                EntityKind::Property => Some(self.datatype.datatype()),
                EntityKind::Item => None,
            },
        };
        serde_json::to_value(data).unwrap_or_default()
    }
}

/// Value of an entity reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityValue {
    #[serde(rename = "entity-type")]
    pub entity_type: String,
    pub id: String,
    #[serde(rename = "numeric-id", default, skip_serializing_if = "Option::is_none")]
    pub numeric_id: Option<u64>,
}

impl From<EntityId> for EntityValue {
    fn from(id: EntityId) -> Self {
        Self {
            entity_type: id.kind().as_str().to_string(),
            id: id.to_string(),
            numeric_id: Some(id.numeric_id()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum DataValue {
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "wikibase-entityid")]
    Entity(EntityValue),
}

impl DataValue {
    /// Comparison key that ignores the optional numeric id
    pub fn key(&self) -> String {
        match self {
            DataValue::String(s) => format!("string:{}", s),
            DataValue::Entity(e) => format!("entity:{}", e.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snak {
    pub snaktype: String,
    pub property: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datavalue: Option<DataValue>,
}

/// A single-valued statement of normal rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub mainsnak: Snak,
    #[serde(rename = "type", default = "statement_type")]
    pub statement_type: String,
    #[serde(default = "normal_rank")]
    pub rank: String,
}

fn statement_type() -> String {
    "statement".to_string()
}

fn normal_rank() -> String {
    "normal".to_string()
}

impl Statement {
    pub fn string(property: EntityId, value: impl Into<String>) -> Self {
        Self::with_value(property, ValueKind::String, DataValue::String(value.into()))
    }

    /// Statement pointing at another entity; `kind` decides the datatype
    pub fn entity(property: EntityId, kind: ValueKind, target: EntityId) -> Self {
        Self::with_value(property, kind, DataValue::Entity(EntityValue::from(target)))
    }

    fn with_value(property: EntityId, kind: ValueKind, value: DataValue) -> Self {
        Self {
            mainsnak: Snak {
                snaktype: "value".to_string(),
                property: property.to_string(),
                datatype: Some(kind.datatype().to_string()),
                datavalue: Some(value),
            },
            statement_type: statement_type(),
            rank: normal_rank(),
        }
    }

    pub fn property(&self) -> &str {
        &self.mainsnak.property
    }

    /// `(property, value)` key used to detect statements that exist already
    pub fn key(&self) -> Option<(String, String)> {
        self.mainsnak
            .datavalue
            .as_ref()
            .map(|v| (self.mainsnak.property.clone(), v.key()))
    }

    /// `data` parameter of `wbeditentity` appending these statements
    pub fn claims_json(statements: &[Statement]) -> serde_json::Value {
        let mut claims: BTreeMap<&str, Vec<&Statement>> = BTreeMap::new();
        for statement in statements {
            claims.entry(statement.property()).or_default().push(statement);
        }
        serde_json::json!({ "claims": claims })
    }
}
