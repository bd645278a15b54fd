use axum::{extract::State, Json};
use tracing::{info, warn};

use super::selector;
use super::types::*;
use crate::server::AppState;

const MAX_LISTED_COLLECTIONS: usize = 10;
const MAX_ERROR_CHARS: usize = 50;

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Shopping AI Assistant Backend".to_string(),
    })
}

pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the backend API!".to_string(),
    })
}

pub async fn assist(Json(req): Json<ChatRequest>) -> Json<ChatResponse> {
    let resp = selector::recommend(&req.message);
    info!(
        recommendations = resp.recommendations.len(),
        "Answered assist request"
    );
    Json(resp)
}

pub async fn trending() -> Json<Vec<TrendItem>> {
    Json(selector::trending())
}

/// Database check. Problems are reported in the body, the status is always 200.
/// `database_url` and `database_name` tell whether the environment supplied them.
pub async fn test_database(State(state): State<AppState>) -> Json<DatabaseReport> {
    let mut report = DatabaseReport {
        backend: "✅ Running".to_string(),
        database: "❌ Not Available".to_string(),
        database_url: presence(state.config.database.url_from_env),
        database_name: presence(state.config.database.name_from_env),
        connection_status: "Not Connected".to_string(),
        collections: Vec::new(),
    };

    match state.db {
        Some(ref db) => {
            report.database = "✅ Available".to_string();
            report.connection_status = "Connected".to_string();

            match db.list_collections().await {
                Ok(names) => {
                    report.collections = names.into_iter().take(MAX_LISTED_COLLECTIONS).collect();
                    report.database = "✅ Connected & Working".to_string();
                }
                Err(e) => {
                    warn!(database = %db.name(), "Database check failed: {}", e);
                    report.database = format!(
                        "⚠️  Connected but Error: {}",
                        truncate(&e.to_string(), MAX_ERROR_CHARS)
                    );
                }
            }
        }
        None => {
            report.database = "⚠️  Available but not initialized".to_string();
        }
    }

    Json(report)
}

fn presence(from_env: bool) -> String {
    if from_env {
        "✅ Set".to_string()
    } else {
        "❌ Not Set".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
