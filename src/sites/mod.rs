// Local-sites resource client against the regional Endpoint API
use crate::error::{CentralError, Result};
use crate::models::{BearerToken, IdentityFacts, LocalSiteEntry, NewLocalSite, SiteListing};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration as StdDuration;

pub const LOCAL_SITES_PATH: &str = "/endpoint/v1/settings/web-control/local-sites";

const RESOURCE_TIMEOUT_SECONDS: u64 = 30;
const TENANT_HEADER: &str = "X-Tenant-ID";

/// Headers every Endpoint API call carries; caller-supplied extras override
fn central_headers(
    token: &BearerToken,
    identity: &IdentityFacts,
    extra: Option<HeaderMap>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let bearer = format!("Bearer {}", token.access_token);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&bearer)
            .map_err(|e| CentralError::ConfigError(format!("Invalid bearer token: {}", e)))?,
    );
    headers.insert(
        TENANT_HEADER,
        HeaderValue::from_str(&identity.tenant_id)
            .map_err(|e| CentralError::ConfigError(format!("Invalid tenant id: {}", e)))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    if let Some(extra) = extra {
        headers.extend(extra);
    }
    Ok(headers)
}

/// CRUD against `/endpoint/v1/settings/web-control/local-sites`
pub struct SitesClient {
    http: reqwest::Client,
}

impl SitesClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    fn collection_url(identity: &IdentityFacts) -> String {
        format!("{}{}", identity.api_base, LOCAL_SITES_PATH)
    }

    /// Fetch every page and concatenate the items in page order.
    ///
    /// Each request asks for the page total; any non-200 aborts the whole
    /// fetch with no partial result. A reported total of 0 or 1 terminates
    /// after the first iteration.
    pub async fn list_all(
        &self,
        token: &BearerToken,
        identity: &IdentityFacts,
    ) -> Result<SiteListing> {
        let mut items: Vec<LocalSiteEntry> = Vec::new();
        let mut page: u64 = 1;

        loop {
            let body = self.fetch_page(token, identity, page, true).await?;
            for item in page_items(&body) {
                items.push(serde_json::from_value(item.clone())?);
            }

            let total_pages = total_pages(&body).unwrap_or(page);
            if page >= total_pages {
                tracing::debug!("Fetched {} local sites over {} pages", items.len(), page);
                return Ok(SiteListing { items, total_pages });
            }
            page += 1;
        }
    }

    /// Fetch exactly one page, returning the raw upstream body
    pub async fn list_page(
        &self,
        token: &BearerToken,
        identity: &IdentityFacts,
        page: u64,
        page_total: bool,
    ) -> Result<Value> {
        self.fetch_page(token, identity, page, page_total).await
    }

    async fn fetch_page(
        &self,
        token: &BearerToken,
        identity: &IdentityFacts,
        page: u64,
        page_total: bool,
    ) -> Result<Value> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if page_total {
            query.push(("pageTotal", "true".to_string()));
        }
        if page > 0 {
            query.push(("page", page.to_string()));
        }

        let response = self
            .http
            .get(Self::collection_url(identity))
            .timeout(StdDuration::from_secs(RESOURCE_TIMEOUT_SECONDS))
            .headers(central_headers(token, identity, None)?)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(CentralError::UpstreamRequestFailed {
                operation: "list local sites",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Create an entry; HTTP 200 and 201 both count as success
    pub async fn add(
        &self,
        token: &BearerToken,
        identity: &IdentityFacts,
        site: &NewLocalSite,
    ) -> Result<LocalSiteEntry> {
        let response = self
            .http
            .post(Self::collection_url(identity))
            .timeout(StdDuration::from_secs(RESOURCE_TIMEOUT_SECONDS))
            .headers(central_headers(token, identity, None)?)
            .json(&site.payload())
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(CentralError::UpstreamRequestFailed {
                operation: "add local site",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Delete an entry by id; HTTP 200 and 204 both count as success
    pub async fn delete(
        &self,
        token: &BearerToken,
        identity: &IdentityFacts,
        id: &str,
    ) -> Result<()> {
        let response = self
            .http
            .delete(format!("{}/{}", Self::collection_url(identity), id))
            .timeout(StdDuration::from_secs(RESOURCE_TIMEOUT_SECONDS))
            .headers(central_headers(token, identity, None)?)
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::NO_CONTENT {
            let body = response.text().await.unwrap_or_default();
            return Err(CentralError::UpstreamRequestFailed {
                operation: "delete local site",
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

/// Item array lives under "items" or "data" depending on deployment
pub(crate) fn page_items(body: &Value) -> &[Value] {
    body.get("items")
        .or_else(|| body.get("data"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn total_pages(body: &Value) -> Option<u64> {
    body.get("pages")?.get("total")?.as_u64()
}
