use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailerOption {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_best: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCard {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub rating: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub retailers: Vec<RetailerOption>,
    #[serde(default)]
    pub why: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub summary: String,
    pub recommendations: Vec<ProductCard>,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendItem {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Body of the `/test` database check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}
