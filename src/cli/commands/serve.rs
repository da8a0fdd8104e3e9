use crate::config::Config;
use crate::error::Result;
use crate::proxy;
use crate::session::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;

pub async fn execute(
    client_id: Option<String>,
    client_secret: Option<String>,
    listen: SocketAddr,
) -> Result<()> {
    let config = Config::load()?;
    let manager = Arc::new(SessionManager::new(config.endpoints.clone())?);

    // Credentials are optional here: a browser UI can POST /api/login later
    match config.resolve_credentials(client_id, client_secret) {
        Ok(credentials) => {
            let facts = manager.login(credentials).await?;
            tracing::info!(
                "Session established for tenant {} in {}",
                facts.tenant_id,
                facts.data_region
            );
        }
        Err(_) => {
            tracing::info!("No credentials configured, waiting for POST /api/login");
        }
    }

    proxy::serve(listen, manager).await
}
