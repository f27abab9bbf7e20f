use serde::Serialize;

/// JSON output mode for machine-readable sync events
/// Uses NDJSON format (newline-delimited JSON)
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncEvent {
    Start {
        subjects: usize,
        links: usize,
    },
    SeedCreated {
        node: String,
        id: String,
    },
    EntityCreated {
        node: String,
        id: String,
        label: String,
    },
    EntityReused {
        node: String,
        id: String,
    },
    EntitySkipped {
        node: String,
        reason: String,
    },
    CollisionRecovered {
        id: String,
    },
    ClaimAdded {
        subject: String,
        property: String,
        value: String,
    },
    ClaimSkipped {
        subject: String,
        predicate: String,
        reason: String,
    },
    Summary {
        seeds_created: usize,
        entities_created: usize,
        entities_reused: usize,
        entities_skipped: usize,
        collisions_recovered: usize,
        claims_added: usize,
        claims_skipped: usize,
        duration_secs: f64,
    },
}

impl SyncEvent {
    /// Emit this event as JSON to stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }
}
