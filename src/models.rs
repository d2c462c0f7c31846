use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// One recorded increment, kept only to tell repeat visitors apart
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct View {
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

// unique_visitor_count == distinct sources in views, count == views.len()
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CounterRecord {
    pub identity: String,
    pub count: u64,
    pub unique_visitor_count: u64,
    pub last_reset: DateTime<Utc>,
    pub views: Vec<View>,
}

impl CounterRecord {
    pub fn new(identity: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identity: identity.into(),
            count: 0,
            unique_visitor_count: 0,
            last_reset: now,
            views: Vec::new(),
        }
    }
}

// JSON body of the counter endpoints
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CounterResponse {
    pub count: u64,
    pub unique_visitors: u64,
}

// JSON body of every error response
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}
