use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CentralError, Result};

/// Tokens are treated as absent this long before their actual expiry,
/// so a call never goes out with a token about to die mid-flight.
pub const TOKEN_REFRESH_MARGIN_SECONDS: i64 = 60;

/// API credentials for the client-credentials grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Bearer token obtained from the Sophos identity provider
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    /// True while the token is still outside the pre-expiry margin
    pub fn is_usable(&self) -> bool {
        Utc::now() < self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECONDS)
    }

    pub fn expires_in_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Tenant identity derived from the whoami endpoint
///
/// Only meaningful together with the credentials that produced it; a new
/// login discards the whole record before re-deriving it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityFacts {
    /// Tenant UUID all resource calls are scoped to
    #[serde(rename = "tenantId")]
    pub tenant_id: String,

    /// Short region code, e.g. "eu01"
    #[serde(rename = "dataRegion")]
    pub data_region: String,

    /// Regional API base URL, e.g. "https://api-eu01.central.sophos.com"
    #[serde(rename = "apiBase")]
    pub api_base: String,
}

/// A web-control local-site override as returned by Sophos Central
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSiteEntry {
    #[serde(default)]
    pub id: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(
        rename = "categoryId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Result of a full paginated listing
#[derive(Debug, Clone, Serialize)]
pub struct SiteListing {
    pub items: Vec<LocalSiteEntry>,
    pub total_pages: u64,
}

pub const CATEGORY_ID_MIN: i64 = 1;
pub const CATEGORY_ID_MAX: i64 = 57;
pub const COMMENT_MAX_CHARS: usize = 300;

/// Request to create a local-site entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLocalSite {
    pub url: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(rename = "categoryId", default)]
    pub category_id: Option<i64>,

    #[serde(default)]
    pub comment: Option<String>,
}

impl NewLocalSite {
    /// Validate at the local-facing boundary.
    ///
    /// The upstream API does not enforce tags/category exclusivity, so it is
    /// enforced here before anything goes on the wire. The wire payload
    /// builder itself stays presence-based (see `payload`).
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(CentralError::InvalidSite("url is required".to_string()));
        }
        match (self.tags.is_empty(), self.category_id) {
            (true, None) => {
                return Err(CentralError::InvalidSite(
                    "either tags or categoryId is required".to_string(),
                ))
            }
            (false, Some(_)) => {
                return Err(CentralError::InvalidSite(
                    "tags and categoryId are mutually exclusive".to_string(),
                ))
            }
            _ => {}
        }
        if let Some(id) = self.category_id {
            if !(CATEGORY_ID_MIN..=CATEGORY_ID_MAX).contains(&id) {
                return Err(CentralError::InvalidSite(format!(
                    "categoryId must be between {} and {}",
                    CATEGORY_ID_MIN, CATEGORY_ID_MAX
                )));
            }
        }
        if let Some(comment) = &self.comment {
            if comment.chars().count() > COMMENT_MAX_CHARS {
                return Err(CentralError::InvalidSite(format!(
                    "comment must be at most {} characters",
                    COMMENT_MAX_CHARS
                )));
            }
        }
        Ok(())
    }

    /// Build the outgoing creation payload.
    ///
    /// `categoryId` uses an explicit presence check: `Some(0)` is serialized
    /// even though the domain restricts the value to 1-57. Empty tags and
    /// empty comments are omitted.
    pub fn payload(&self) -> serde_json::Value {
        let mut payload = serde_json::Map::new();
        payload.insert("url".to_string(), self.url.clone().into());
        if !self.tags.is_empty() {
            payload.insert("tags".to_string(), self.tags.clone().into());
        }
        if let Some(comment) = self.comment.as_deref().filter(|c| !c.is_empty()) {
            payload.insert("comment".to_string(), comment.into());
        }
        if let Some(category_id) = self.category_id {
            payload.insert("categoryId".to_string(), category_id.into());
        }
        serde_json::Value::Object(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_expiring_in(seconds: i64) -> BearerToken {
        BearerToken {
            access_token: "test".to_string(),
            expires_at: Utc::now() + Duration::seconds(seconds),
        }
    }

    #[test]
    fn test_token_usable_outside_margin() {
        assert!(token_expiring_in(3600).is_usable());
        // Just outside the 60s margin (2s slack against clock skew in CI)
        assert!(token_expiring_in(TOKEN_REFRESH_MARGIN_SECONDS + 2).is_usable());
    }

    #[test]
    fn test_token_unusable_within_margin() {
        // 59s remaining is inside the 60s margin: treated as absent
        assert!(!token_expiring_in(TOKEN_REFRESH_MARGIN_SECONDS - 1).is_usable());
        assert!(!token_expiring_in(0).is_usable());
        assert!(!token_expiring_in(-100).is_usable());
    }

    #[test]
    fn test_token_expires_in_seconds_floors_at_zero() {
        assert_eq!(token_expiring_in(-50).expires_in_seconds(), 0);
    }

    #[test]
    fn test_new_site_requires_url() {
        let site = NewLocalSite {
            tags: vec!["allow".to_string()],
            ..Default::default()
        };
        assert!(site.validate().is_err());
    }

    #[test]
    fn test_new_site_requires_tags_or_category() {
        let site = NewLocalSite {
            url: "https://www.example.com".to_string(),
            ..Default::default()
        };
        assert!(site.validate().is_err());
    }

    #[test]
    fn test_new_site_tags_and_category_exclusive() {
        let site = NewLocalSite {
            url: "https://www.example.com".to_string(),
            tags: vec!["marketing".to_string()],
            category_id: Some(50),
            ..Default::default()
        };
        assert!(site.validate().is_err());
    }

    #[test]
    fn test_new_site_category_range() {
        let mut site = NewLocalSite {
            url: "https://www.example.com".to_string(),
            category_id: Some(0),
            ..Default::default()
        };
        assert!(site.validate().is_err());
        site.category_id = Some(58);
        assert!(site.validate().is_err());
        site.category_id = Some(57);
        assert!(site.validate().is_ok());
        site.category_id = Some(1);
        assert!(site.validate().is_ok());
    }

    #[test]
    fn test_new_site_comment_bound() {
        let site = NewLocalSite {
            url: "https://www.example.com".to_string(),
            tags: vec!["vip".to_string()],
            comment: Some("x".repeat(COMMENT_MAX_CHARS + 1)),
            ..Default::default()
        };
        assert!(site.validate().is_err());
    }

    #[test]
    fn test_payload_includes_category_zero() {
        // Presence check, not truthiness: Some(0) must go on the wire
        let site = NewLocalSite {
            url: "https://www.example.com".to_string(),
            category_id: Some(0),
            ..Default::default()
        };
        let payload = site.payload();
        assert_eq!(payload["categoryId"], 0);
        assert!(payload.get("tags").is_none());
    }

    #[test]
    fn test_payload_omits_empty_optionals() {
        let site = NewLocalSite {
            url: "https://www.example.com".to_string(),
            tags: vec!["allow".to_string()],
            comment: Some(String::new()),
            ..Default::default()
        };
        let payload = site.payload();
        assert_eq!(payload["url"], "https://www.example.com");
        assert_eq!(payload["tags"][0], "allow");
        assert!(payload.get("comment").is_none());
        assert!(payload.get("categoryId").is_none());
    }
}
