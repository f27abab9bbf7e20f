use super::{CreateOutcome, EntityDraft, EntityId, EntityKind, RemoteStore, Statement};
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

pub const DEFAULT_API_URL: &str = "https://wikibase.oho.wiki/api.php";

/// Return URL required by `clientlogin`; never visited
const LOGIN_RETURN_URL: &str = "http://127.0.0.1:5000/";

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Debug, Deserialize)]
struct EditResponse {
    #[serde(default)]
    entity: Option<EditedEntity>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct EditedEntity {
    id: String,
}

/// Parameters of a single `wbeditentity` call
enum EditTarget {
    New(EntityKind),
    Existing(EntityId),
}

/// Wikibase `api.php` client
///
/// Keeps the login session in a cookie store; every edit fetches a fresh
/// CSRF token first.
pub struct WikibaseClient {
    client: reqwest::Client,
    api_url: String,
}

impl WikibaseClient {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(concat!("ont2wb/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(&self.api_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn fetch_login_token(&self) -> Result<String> {
        let data = self
            .get_json(&[
                ("action", "query"),
                ("meta", "tokens"),
                ("type", "login"),
                ("format", "json"),
            ])
            .await?;
        token_from(&data, "logintoken")
    }

    /// Standard CSRF token, required by every edit
    async fn csrf_token(&self) -> Result<String> {
        let data = self
            .get_json(&[("action", "query"), ("meta", "tokens"), ("format", "json")])
            .await?;
        token_from(&data, "csrftoken")
    }

    /// Log in with `clientlogin`
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let login_token = self.fetch_login_token().await?;

        let data: Value = self
            .client
            .post(&self.api_url)
            .form(&[
                ("action", "clientlogin"),
                ("username", username),
                ("password", password),
                ("loginreturnurl", LOGIN_RETURN_URL),
                ("logintoken", login_token.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let status = data["clientlogin"]["status"].as_str().unwrap_or_default();
        if status != "PASS" {
            let reason = data["clientlogin"]["messagecode"]
                .as_str()
                .or_else(|| data["clientlogin"]["message"].as_str())
                .or_else(|| data["error"]["info"].as_str())
                .unwrap_or("unknown reason")
                .to_string();
            return Err(SyncError::Login {
                api_url: self.api_url.clone(),
                reason,
            });
        }

        tracing::info!(
            "Login success! Welcome, {}!",
            data["clientlogin"]["username"].as_str().unwrap_or(username)
        );
        Ok(())
    }

    /// Send one `wbeditentity` request
    async fn edit(&self, target: &EditTarget, data: &Value, clear: bool) -> Result<EditResponse> {
        let token = self.csrf_token().await?;
        let data = data.to_string();

        let mut params: Vec<(&str, String)> = vec![
            ("action", "wbeditentity".to_string()),
            ("format", "json".to_string()),
            ("data", data),
        ];
        match target {
            EditTarget::New(kind) => params.push(("new", kind.as_str().to_string())),
            EditTarget::Existing(id) => params.push(("id", id.to_string())),
        }
        if clear {
            params.push(("clear", "true".to_string()));
        }

        tracing::trace!("wbeditentity {:?}", params);

        let response = self
            .client
            .post(&self.api_url)
            .query(&params)
            .form(&[("token", token.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Submit a draft, turning an "already has" rejection into `AlreadyExists`
    async fn submit(&self, target: EditTarget, draft: &EntityDraft) -> Result<CreateOutcome> {
        let answer = self.edit(&target, &draft.to_json(), false).await?;

        if let Some(error) = answer.error {
            if let Some(existing) = existing_entity(&error.info, draft.kind) {
                tracing::debug!("{} exists already: {}", existing, error.info);
                return Ok(CreateOutcome::AlreadyExists(existing));
            }
            return Err(SyncError::Remote {
                code: error.code,
                info: error.info,
            });
        }

        let entity = answer.entity.ok_or_else(|| {
            SyncError::InvalidResponse("wbeditentity returned neither entity nor error".to_string())
        })?;
        Ok(CreateOutcome::Created(entity.id.parse()?))
    }
}

fn token_from(data: &Value, name: &str) -> Result<String> {
    data["query"]["tokens"][name]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SyncError::InvalidResponse(format!("no {} in token response", name)))
}

fn error_of(data: &Value) -> Option<SyncError> {
    let error = data.get("error")?;
    Some(SyncError::Remote {
        code: error["code"].as_str().unwrap_or_default().to_string(),
        info: error["info"].as_str().unwrap_or_default().to_string(),
    })
}

/// Entity named by an "already has label" error, e.g.
/// `Item [[Item:Q5|Q5]] already has label "Widget" associated with language code en`
fn existing_entity(info: &str, kind: EntityKind) -> Option<EntityId> {
    static ITEM: OnceLock<Regex> = OnceLock::new();
    static PROPERTY: OnceLock<Regex> = OnceLock::new();

    if !info.contains(" already has ") {
        return None;
    }
    let pattern = match kind {
        EntityKind::Item => ITEM.get_or_init(|| Regex::new(r"\[\[Item:(Q[0-9]+)").expect("valid regex")),
        EntityKind::Property => PROPERTY
            .get_or_init(|| Regex::new(r"\[\[Property:(P[0-9]+)").expect("valid regex")),
    };
    pattern
        .captures(info)
        .and_then(|c| c[1].parse().ok())
}

/// Statements of `id` in a `wbgetentities` response
fn statements_of(data: &Value, id: EntityId) -> Result<Vec<Statement>> {
    let claims = &data["entities"][id.to_string()]["claims"];
    let Some(claims) = claims.as_object() else {
        return Ok(Vec::new());
    };

    let mut statements = Vec::new();
    for values in claims.values() {
        for value in values.as_array().into_iter().flatten() {
            // Value types we never write (time, quantity, ...) can't be duplicates
            if let Ok(statement) = serde_json::from_value::<Statement>(value.clone()) {
                statements.push(statement);
            }
        }
    }
    Ok(statements)
}

#[async_trait]
impl RemoteStore for WikibaseClient {
    async fn create_entity(&self, draft: &EntityDraft) -> Result<CreateOutcome> {
        tracing::debug!("Creating {} {:?}", draft.kind.as_str(), draft.labels);
        self.submit(EditTarget::New(draft.kind), draft).await
    }

    async fn edit_entity(&self, id: EntityId, draft: &EntityDraft) -> Result<CreateOutcome> {
        tracing::debug!("Editing {} with {:?}", id, draft.labels);
        self.submit(EditTarget::Existing(id), draft).await
    }

    async fn clear_entity(&self, id: EntityId) -> Result<()> {
        tracing::info!("- Clearing {} ...", id);
        let answer = self
            .edit(&EditTarget::Existing(id), &serde_json::json!({}), true)
            .await?;
        match answer.error {
            Some(error) => Err(SyncError::Remote {
                code: error.code,
                info: error.info,
            }),
            None => Ok(()),
        }
    }

    async fn append_statements(&self, id: EntityId, statements: &[Statement]) -> Result<()> {
        let answer = self
            .edit(&EditTarget::Existing(id), &Statement::claims_json(statements), false)
            .await?;
        match answer.error {
            Some(error) => Err(SyncError::Remote {
                code: error.code,
                info: error.info,
            }),
            None => Ok(()),
        }
    }

    async fn fetch_statements(&self, id: EntityId) -> Result<Vec<Statement>> {
        let id_str = id.to_string();
        let data = self
            .get_json(&[
                ("action", "wbgetentities"),
                ("ids", id_str.as_str()),
                ("props", "claims"),
                ("format", "json"),
            ])
            .await?;
        if let Some(err) = error_of(&data) {
            return Err(err);
        }
        statements_of(&data, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_existing_item_from_error() {
        let info = "Item [[Item:Q123|Q123]] already has label \"Widget\" associated with language code en, using the same description text.";
        assert_eq!(
            existing_entity(info, EntityKind::Item),
            Some(EntityId::Item(123))
        );
    }

    #[test]
    fn test_existing_property_from_error() {
        let info = "Property [[Property:P45|P45]] already has label \"has part\" associated with language code en.";
        assert_eq!(
            existing_entity(info, EntityKind::Property),
            Some(EntityId::Property(45))
        );
        // Wrong kind: no match
        assert_eq!(existing_entity(info, EntityKind::Item), None);
    }

    #[test]
    fn test_other_errors_are_not_collisions() {
        assert_eq!(
            existing_entity("The supplied token is invalid [[Item:Q1]]", EntityKind::Item),
            None
        );
    }

    #[test]
    fn test_edit_response_parsing() {
        let ok: EditResponse =
            serde_json::from_value(json!({"entity": {"id": "Q7", "type": "item"}, "success": 1}))
                .unwrap();
        assert_eq!(ok.entity.unwrap().id, "Q7");

        let failed: EditResponse = serde_json::from_value(
            json!({"error": {"code": "modification-failed", "info": "nope", "*": "..."}}),
        )
        .unwrap();
        assert!(failed.entity.is_none());
        assert_eq!(failed.error.unwrap().code, "modification-failed");
    }

    #[test]
    fn test_token_from() {
        let data = json!({"batchcomplete": "", "query": {"tokens": {"csrftoken": "abc+\\"}}});
        assert_eq!(token_from(&data, "csrftoken").unwrap(), "abc+\\");
        assert!(matches!(
            token_from(&data, "logintoken"),
            Err(SyncError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_statements_of_skips_unknown_value_types() {
        let data = json!({
            "entities": {
                "Q1": {
                    "claims": {
                        "P5": [{
                            "mainsnak": {
                                "snaktype": "value",
                                "property": "P5",
                                "datavalue": {"type": "wikibase-entityid", "value": {"entity-type": "item", "id": "Q2", "numeric-id": 2}},
                                "datatype": "wikibase-item"
                            },
                            "type": "statement",
                            "rank": "normal"
                        }],
                        "P9": [{
                            "mainsnak": {
                                "snaktype": "value",
                                "property": "P9",
                                "datavalue": {"type": "time", "value": {"time": "+2020-01-01T00:00:00Z"}}
                            },
                            "type": "statement",
                            "rank": "normal"
                        }]
                    }
                }
            }
        });

        let statements = statements_of(&data, EntityId::Item(1)).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].property(), "P5");
    }

    #[test]
    fn test_error_of() {
        let data = json!({"error": {"code": "no-such-entity", "info": "Could not find"}});
        assert!(matches!(error_of(&data), Some(SyncError::Remote { .. })));
        assert!(error_of(&json!({"entities": {}})).is_none());
    }
}
