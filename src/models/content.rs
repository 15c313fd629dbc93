// src/models/content.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;
use validator::Validate;

use crate::utils::html::clean_html;

/// A reference paper (PDF link) grouped under a topic name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub topic_name: String,
    pub description: String,
    pub pdf_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaperRequest {
    #[validate(length(min = 1, max = 200))]
    pub topic_name: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub pdf_url: String,
}

impl PaperRequest {
    pub fn into_paper(self, id: Uuid, created_at: DateTime<Utc>) -> Paper {
        Paper {
            id,
            topic_name: clean_html(&self.topic_name),
            description: clean_html(&self.description),
            pdf_url: self.pdf_url,
            created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaperSearchQuery {
    #[serde(default)]
    pub q: String,
}

/// A recommended video channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub url: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub url: String,
    #[serde(default)]
    #[validate(length(max = 500), custom(function = validate_optional_url))]
    pub photo_url: String,
}

impl ChannelRequest {
    pub fn into_channel(self, id: Uuid, created_at: DateTime<Utc>) -> Channel {
        Channel {
            id,
            name: clean_html(&self.name),
            description: clean_html(&self.description),
            url: self.url,
            photo_url: self.photo_url,
            created_at,
        }
    }
}

/// A recommended study app.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub features: String,
    pub download_url: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 5000))]
    pub features: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub download_url: String,
    #[serde(default)]
    #[validate(length(max = 500), custom(function = validate_optional_url))]
    pub photo_url: String,
}

impl AppRequest {
    pub fn into_app(self, id: Uuid, created_at: DateTime<Utc>) -> App {
        App {
            id,
            name: clean_html(&self.name),
            features: clean_html(&self.features),
            download_url: self.download_url,
            photo_url: self.photo_url,
            created_at,
        }
    }
}

/// The help document. Only the most recently written one is served.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Help {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub pdf_url: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HelpRequest {
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub pdf_url: String,
}

/// Validates that a string is an absolute `http` or `https` URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        Ok(_) => Err(validator::ValidationError::new("unsupported_url_scheme")),
        Err(_) => Err(validator::ValidationError::new("invalid_url")),
    }
}

/// Photo links are optional: empty is allowed, anything else must parse.
fn validate_optional_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.is_empty() {
        return Ok(());
    }
    validate_url_string(url)
}
