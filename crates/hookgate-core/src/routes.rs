use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

/// Broadcast rule: a written resource matching `patterns` needs review from `roles`.
///
/// With `alert` set, the review request is also raised as an additive alert
/// under `topic`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub patterns: Vec<String>,
    pub roles: Vec<String>,
    #[serde(default)]
    pub alert: bool,
    #[serde(default)]
    pub topic: Option<String>,
}

pub const DEFAULT_ALERT_TOPIC: &str = "review-required";
pub const CONTAINERIZATION_TOPIC: &str = "containerization-review";

impl Route {
    fn new(patterns: &[&str], roles: &[&str]) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            alert: false,
            topic: None,
        }
    }

    fn alerting(mut self, topic: &str) -> Self {
        self.alert = true;
        self.topic = Some(topic.to_string());
        self
    }

    pub fn matches(&self, resource: &str) -> bool {
        let opts = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.patterns
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .any(|p| p.matches_with(resource, opts))
    }

    pub fn alert_topic(&self) -> &str {
        self.topic.as_deref().unwrap_or(DEFAULT_ALERT_TOPIC)
    }
}

pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new(&["*.py", "*.pyi"], &["test-automation-expert", "security-auditor"]),
        Route::new(&["*.js", "*.jsx", "*.ts", "*.tsx"], &["test-automation-expert", "ui-ux-designer"]),
        Route::new(&["*model*.sql", "*model*.py", "*.sql"], &["database-expert", "security-auditor"]),
        Route::new(&["*.yml", "*.yaml", "*.dockerfile", "*Dockerfile"], &["docker-expert", "security-auditor"]),
        Route::new(&["*.md", "*.rst", "*.txt"], &["technical-writer"]),
        Route::new(&["*service*.*", "*server*.*"], &["docker-expert"]).alerting(CONTAINERIZATION_TOPIC),
    ]
}

/// Who to notify about a changed resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Broadcast {
    /// Every interested role, deduplicated, in route order.
    pub roles: Vec<String>,
    /// Alerts to raise: (topic, roles) per alerting route.
    pub alerts: Vec<(String, Vec<String>)>,
}

impl Broadcast {
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.alerts.is_empty()
    }
}

/// All matching routes contribute; a role is listed once.
pub fn broadcast_for(resource: &str, routes: &[Route]) -> Broadcast {
    let mut out = Broadcast::default();
    for route in routes.iter().filter(|r| r.matches(resource)) {
        for role in &route.roles {
            if !out.roles.contains(role) {
                out.roles.push(role.clone());
            }
        }
        if route.alert {
            out.alerts.push((route.alert_topic().to_string(), route.roles.clone()));
        }
    }
    out
}
