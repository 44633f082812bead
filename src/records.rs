use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's submitted photo and, once generation succeeds, its tattoo.
///
/// `processed` is true exactly when `tattoo_ref` is set; the only mutation
/// path is [`ImageRecord::apply`], which sets both together. Serialized
/// field names are the `images` table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "storage_path")]
    pub original_ref: String,
    #[serde(rename = "tattoo_path")]
    pub tattoo_ref: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

impl ImageRecord {
    pub fn new(user_id: impl Into<String>, original_ref: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            original_ref: original_ref.into(),
            tattoo_ref: None,
            style: None,
            processed: false,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, update: &TattooUpdate) {
        self.tattoo_ref = Some(update.tattoo_ref.clone());
        self.style = Some(update.style.clone());
        self.processed = true;
    }
}

/// The single write performed after a successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TattooUpdate {
    pub tattoo_ref: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
            avatar_url: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub user_id: String,
    pub image_id: Uuid,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tattoo_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    pub fn succeeded(tattoo_ref: String) -> Self {
        Self {
            success: true,
            tattoo_ref: Some(tattoo_ref),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            tattoo_ref: None,
            error: Some(message.into()),
        }
    }
}
