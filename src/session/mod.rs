// Session state and the high-level operation façade
use crate::auth::TokenManager;
use crate::config::Endpoints;
use crate::error::{CentralError, Result};
use crate::identity::IdentityResolver;
use crate::models::{
    BearerToken, Credentials, IdentityFacts, LocalSiteEntry, NewLocalSite, SiteListing,
};
use crate::sites::SitesClient;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The single in-memory session record.
///
/// Credentials, derived identity and the cached token live and die together:
/// `begin_login` replaces the whole record, so identity facts can never
/// outlive the credentials that produced them.
#[derive(Debug, Default)]
pub struct Session {
    credentials: Option<Credentials>,
    identity: Option<IdentityFacts>,
    token: Option<BearerToken>,
}

impl Session {
    /// Wipe everything and install new credentials
    pub fn begin_login(&mut self, credentials: Credentials) {
        *self = Session {
            credentials: Some(credentials),
            identity: None,
            token: None,
        };
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn identity(&self) -> Option<&IdentityFacts> {
        self.identity.as_ref()
    }

    pub fn set_identity(&mut self, identity: IdentityFacts) {
        self.identity = Some(identity);
    }

    pub fn token(&self) -> Option<&BearerToken> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: BearerToken) {
        self.token = Some(token);
    }
}

/// High-level interface for the local-facing operations.
///
/// Owns the session behind a mutex and holds the lock across each whole
/// check-refresh-use sequence, so two concurrent calls never race a token
/// refresh and a login never swaps identity fields under an in-flight call.
pub struct SessionManager {
    auth: TokenManager,
    identity: IdentityResolver,
    sites: SitesClient,
    session: Arc<Mutex<Session>>,
}

impl SessionManager {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            auth: TokenManager::new(http.clone(), endpoints.token_url),
            identity: IdentityResolver::new(http.clone(), endpoints.whoami_url),
            sites: SitesClient::new(http),
            session: Arc::new(Mutex::new(Session::default())),
        })
    }

    /// Establish a session: acquire a token and resolve the tenant identity.
    ///
    /// The previous session is discarded up front, so a failed login leaves
    /// no stale identity behind.
    pub async fn login(&self, credentials: Credentials) -> Result<IdentityFacts> {
        let mut session = self.session.lock().await;
        session.begin_login(credentials);

        let token = self.auth.ensure_valid_token(&mut session).await?;
        let facts = self.identity.resolve(&token).await?;
        session.set_identity(facts.clone());
        Ok(facts)
    }

    /// Current identity facts, if a login has completed
    pub async fn current_identity(&self) -> Option<IdentityFacts> {
        self.session.lock().await.identity().cloned()
    }

    /// Seconds until the cached token actually expires; 0 when it is absent
    /// or already inside the refresh margin
    pub async fn token_seconds_remaining(&self) -> i64 {
        let session = self.session.lock().await;
        session
            .token()
            .filter(|t| t.is_usable())
            .map(|t| t.expires_in_seconds())
            .unwrap_or(0)
    }

    /// Fetch all pages of local sites
    pub async fn list_local_sites(&self) -> Result<SiteListing> {
        let mut session = self.session.lock().await;
        let token = self.auth.ensure_valid_token(&mut session).await?;
        let identity = session
            .identity()
            .cloned()
            .ok_or(CentralError::MissingSession)?;
        self.sites.list_all(&token, &identity).await
    }

    /// Fetch a single page, relaying the upstream body untouched
    pub async fn fetch_page(&self, page: u64, page_total: bool) -> Result<Value> {
        let mut session = self.session.lock().await;
        let token = self.auth.ensure_valid_token(&mut session).await?;
        let identity = session
            .identity()
            .cloned()
            .ok_or(CentralError::MissingSession)?;
        self.sites
            .list_page(&token, &identity, page, page_total)
            .await
    }

    /// Create a local-site entry; validation happens at the caller boundary
    pub async fn add_local_site(&self, site: NewLocalSite) -> Result<LocalSiteEntry> {
        let mut session = self.session.lock().await;
        let token = self.auth.ensure_valid_token(&mut session).await?;
        let identity = session
            .identity()
            .cloned()
            .ok_or(CentralError::MissingSession)?;
        self.sites.add(&token, &identity, &site).await
    }

    /// Delete a local-site entry by id
    pub async fn delete_local_site(&self, id: &str) -> Result<()> {
        let mut session = self.session.lock().await;
        let token = self.auth.ensure_valid_token(&mut session).await?;
        let identity = session
            .identity()
            .cloned()
            .ok_or(CentralError::MissingSession)?;
        self.sites.delete(&token, &identity, id).await
    }
}
