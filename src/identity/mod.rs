// Tenant and data-region discovery via the global whoami endpoint
use crate::error::{CentralError, Result};
use crate::models::{BearerToken, IdentityFacts};
use serde_json::Value;
use std::time::Duration as StdDuration;

const WHOAMI_TIMEOUT_SECONDS: u64 = 20;

/// Domain suffix a region-specific host must carry to be trusted
const CENTRAL_DOMAIN_SUFFIX: &str = "central.sophos.com";

/// Prefix token in regional hostnames, e.g. "api-eu01.central.sophos.com"
const REGION_HOST_PREFIX: &str = "api-";

/// Resolves tenant id, data region and API base from whoami.
///
/// The response shape differs across deployment generations, so extraction is
/// an ordered list of strategies and the first one that yields both region
/// and base wins. Results are only handed back complete; the caller commits
/// them to the session.
pub struct IdentityResolver {
    http: reqwest::Client,
    whoami_url: String,
}

impl IdentityResolver {
    pub fn new(http: reqwest::Client, whoami_url: String) -> Self {
        Self { http, whoami_url }
    }

    pub async fn resolve(&self, token: &BearerToken) -> Result<IdentityFacts> {
        tracing::debug!("Resolving identity via {}", self.whoami_url);

        let response = self
            .http
            .get(&self.whoami_url)
            .timeout(StdDuration::from_secs(WHOAMI_TIMEOUT_SECONDS))
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CentralError::UpstreamRequestFailed {
                operation: "whoami",
                status: status.as_u16(),
                body,
            });
        }

        let doc: Value = response.json().await?;
        let facts = extract_facts(&doc).ok_or(CentralError::IdentityResolutionFailed)?;
        tracing::info!(
            "Whoami OK: tenant={}, dataRegion={}, apiBase={}",
            facts.tenant_id,
            facts.data_region,
            facts.api_base
        );
        Ok(facts)
    }
}

type RegionStrategy = fn(&Value) -> Option<(String, String)>;

/// Tried in order; each yields `(data_region, api_base)` or bows out
const REGION_STRATEGIES: &[RegionStrategy] = &[from_host_map, from_region_field];

/// All-or-nothing extraction: tenant id plus the first strategy that
/// produces both region and base, else `None`.
pub fn extract_facts(doc: &Value) -> Option<IdentityFacts> {
    let tenant_id = doc
        .get("id")
        .or_else(|| doc.get("tenantId"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;

    let (data_region, api_base) = REGION_STRATEGIES.iter().find_map(|strategy| strategy(doc))?;

    Some(IdentityFacts {
        tenant_id: tenant_id.to_string(),
        data_region,
        api_base,
    })
}

/// Strategy 1: explicit per-region host under `apiHosts.dataRegion`.
///
/// The host is used verbatim as the API base; the region code is parsed out
/// of the hostname, with the top-level `dataRegion` field as fallback when
/// the host doesn't follow the usual pattern.
fn from_host_map(doc: &Value) -> Option<(String, String)> {
    let host = doc
        .get("apiHosts")
        .and_then(|hosts| hosts.get("dataRegion"))
        .and_then(Value::as_str)?;

    if !host.contains(CENTRAL_DOMAIN_SUFFIX) {
        return None;
    }

    let region = region_from_host(host).or_else(|| region_field(doc))?;
    Some((region, host.to_string()))
}

/// Strategy 2: top-level `dataRegion` field, base synthesized from the
/// standard regional hostname pattern.
fn from_region_field(doc: &Value) -> Option<(String, String)> {
    let region = region_field(doc)?;
    let api_base = format!("https://api-{}.{}", region, CENTRAL_DOMAIN_SUFFIX);
    Some((region, api_base))
}

fn region_field(doc: &Value) -> Option<String> {
    doc.get("dataRegion")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract "eu01" from "https://api-eu01.central.sophos.com"
fn region_from_host(host: &str) -> Option<String> {
    host.split(REGION_HOST_PREFIX)
        .nth(1)?
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_host_map_yields_region_and_exact_base() {
        let doc = json!({
            "id": "tenant-1",
            "apiHosts": { "dataRegion": "https://api-eu01.central.sophos.com" },
        });

        let facts = extract_facts(&doc).unwrap();
        assert_eq!(facts.tenant_id, "tenant-1");
        assert_eq!(facts.data_region, "eu01");
        assert_eq!(facts.api_base, "https://api-eu01.central.sophos.com");
    }

    #[test]
    fn test_region_field_synthesizes_base() {
        let doc = json!({ "tenantId": "tenant-2", "dataRegion": "us02" });

        let facts = extract_facts(&doc).unwrap();
        assert_eq!(facts.tenant_id, "tenant-2");
        assert_eq!(facts.data_region, "us02");
        assert_eq!(facts.api_base, "https://api-us02.central.sophos.com");
    }

    #[test]
    fn test_unparseable_host_falls_back_to_region_field() {
        let doc = json!({
            "id": "tenant-3",
            "dataRegion": "eu02",
            "apiHosts": { "dataRegion": "https://gateway.central.sophos.com" },
        });

        let facts = extract_facts(&doc).unwrap();
        // Host kept as base, region taken from the field
        assert_eq!(facts.data_region, "eu02");
        assert_eq!(facts.api_base, "https://gateway.central.sophos.com");
    }

    #[test]
    fn test_foreign_host_is_ignored() {
        let doc = json!({
            "id": "tenant-4",
            "dataRegion": "eu01",
            "apiHosts": { "dataRegion": "https://api-eu01.evil.example.com" },
        });

        let facts = extract_facts(&doc).unwrap();
        // Falls through to the synthesized regional base
        assert_eq!(facts.api_base, "https://api-eu01.central.sophos.com");
    }

    #[test]
    fn test_no_region_anywhere_fails() {
        assert!(extract_facts(&json!({ "id": "tenant-5" })).is_none());
    }

    #[test]
    fn test_missing_tenant_fails() {
        assert!(extract_facts(&json!({ "dataRegion": "eu01" })).is_none());
    }

    fn test_token() -> BearerToken {
        BearerToken {
            access_token: "jwt-token".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn resolve_sends_bearer_and_parses_facts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/whoami/v1"))
            .and(header("authorization", "Bearer jwt-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "tenant-1",
                "apiHosts": { "dataRegion": "https://api-eu01.central.sophos.com" },
            })))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(
            reqwest::Client::new(),
            format!("{}/whoami/v1", server.uri()),
        );
        let facts = resolver.resolve(&test_token()).await.unwrap();
        assert_eq!(facts.data_region, "eu01");
    }

    #[tokio::test]
    async fn resolve_rejects_undetermined_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "tenant-1" })))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(reqwest::Client::new(), server.uri());
        let err = resolver.resolve(&test_token()).await.unwrap_err();
        assert!(matches!(err, CentralError::IdentityResolutionFailed));
    }

    #[tokio::test]
    async fn resolve_surfaces_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let resolver = IdentityResolver::new(reqwest::Client::new(), server.uri());
        let err = resolver.resolve(&test_token()).await.unwrap_err();
        match err {
            CentralError::UpstreamRequestFailed {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, "whoami");
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
