//! Incident listing query and the paginated envelope it returns.

use serde::{Deserialize, Serialize};

/// Paginated listing as returned by the analyzer API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.as_deref().map(|n| !n.is_empty()).unwrap_or(false)
    }

    pub fn has_previous(&self) -> bool {
        self.previous.as_deref().map(|p| !p.is_empty()).unwrap_or(false)
    }
}

/// Filters for the incident listing. Unset or empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    pub page: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub session_id: Option<String>,
    pub kind: Option<String>,
    pub severity: Option<String>,
    pub player_name: Option<String>,
}

impl IncidentFilter {
    /// Query parameters in the names the analyzer API expects.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        let optional = [
            ("start_date", &self.start_date),
            ("end_date", &self.end_date),
            ("sessionId", &self.session_id),
            ("type", &self.kind),
            ("severity", &self.severity),
            ("playerName", &self.player_name),
        ];
        for (name, value) in optional {
            if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((name, v.to_string()));
            }
        }
        pairs
    }
}
