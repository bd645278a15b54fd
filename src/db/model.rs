use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Collections known to the store, one table each.
pub const COLLECTIONS: &[&str] = &["conversation", "message", "product", "trenditem", "user"];

/// A record shape that can be written to and read from a collection.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: &'static str;

    fn validate(&self) -> DbResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Record for User {
    const COLLECTION: &'static str = "user";

    fn validate(&self) -> DbResult<()> {
        if let Some(age) = self.age {
            if !(0..=120).contains(&age) {
                return Err(DbError::Validation(
                    "age".to_string(),
                    "must be between 0 and 120".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRetailer {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub is_best: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub specs: Vec<String>,
    #[serde(default)]
    pub retailers: Vec<ProductRetailer>,
    #[serde(default = "default_true")]
    pub in_stock: bool,
}

impl Record for Product {
    const COLLECTION: &'static str = "product";

    fn validate(&self) -> DbResult<()> {
        if !(self.price >= 0.0) {
            return Err(DbError::Validation(
                "price".to_string(),
                "must be non-negative".to_string(),
            ));
        }
        if let Some(rating) = self.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(DbError::Validation(
                    "rating".to_string(),
                    "must be between 0 and 5".to_string(),
                ));
            }
        }
        for retailer in &self.retailers {
            if !(retailer.price >= 0.0) {
                return Err(DbError::Validation(
                    "retailers.price".to_string(),
                    format!("must be non-negative for {}", retailer.name),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub related_product_id: Option<String>,
}

impl Record for Message {
    const COLLECTION: &'static str = "message";

    fn validate(&self) -> DbResult<()> {
        match self.role.as_str() {
            "user" | "assistant" => Ok(()),
            other => Err(DbError::Validation(
                "role".to_string(),
                format!("must be user or assistant, got {}", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub title: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub last_message_preview: Option<String>,
}

impl Record for Conversation {
    const COLLECTION: &'static str = "conversation";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendRecord {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub product_id: Option<String>,
}

impl Record for TrendRecord {
    const COLLECTION: &'static str = "trenditem";
}

fn default_true() -> bool {
    true
}

/// A document as stored, with the bookkeeping fields added on create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl StoredDocument {
    pub fn decode<R: Record>(&self) -> DbResult<R> {
        serde_json::from_value(self.data.clone())
            .map_err(|e| DbError::Malformed(self.id.clone(), e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
    #[error("Invalid field {0}: {1}")]
    Validation(String, String),
    #[error("Malformed document {0}: {1}")]
    Malformed(String, String),
}

pub type DbResult<T> = Result<T, DbError>;
