use serde::{Deserialize, Serialize};

use crate::ActorId;

/// Maps description keywords to the actor most likely performing the operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorKeywords {
    pub actor: String,
    pub keywords: Vec<String>,
}

impl ActorKeywords {
    fn new(actor: &str, keywords: &[&str]) -> Self {
        Self {
            actor: actor.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

pub fn default_actor_keywords() -> Vec<ActorKeywords> {
    vec![
        ActorKeywords::new("api-designer", &["api", "openapi", "swagger", "endpoint"]),
        ActorKeywords::new("python-pro", &["python", "django", "fastapi", "flask"]),
        ActorKeywords::new("react-pro", &["react", "jsx", "component", "frontend"]),
        ActorKeywords::new("docker-expert", &["docker", "container", "dockerfile", "compose"]),
        ActorKeywords::new("backend-architect", &["backend", "server", "database", "architecture"]),
        ActorKeywords::new("devops-engineer", &["deploy", "ci/cd", "pipeline", "infrastructure"]),
        ActorKeywords::new("frontend-specialist", &["frontend", "ui", "css", "html"]),
        ActorKeywords::new("security-auditor", &["security", "auth", "encryption", "vulnerability"]),
        ActorKeywords::new("database-architect", &["database", "schema", "sql", "migration"]),
        ActorKeywords::new("test-engineer", &["test", "testing", "pytest", "junit"]),
    ]
}

/// First table entry (in table order) with a keyword contained in the description.
pub fn infer_actor(description: &str, table: &[ActorKeywords]) -> Option<ActorId> {
    let description = description.to_lowercase();
    if description.is_empty() {
        return None;
    }
    table
        .iter()
        .find(|entry| entry.keywords.iter().any(|k| description.contains(&k.to_lowercase())))
        .map(|entry| ActorId::new(entry.actor.clone()))
}
