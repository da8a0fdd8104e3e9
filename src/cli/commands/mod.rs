pub mod add;
pub mod completions;
pub mod delete;
pub mod list;
pub mod login;
pub mod serve;
pub mod status;

use crate::config::Config;
use crate::error::Result;
use crate::models::IdentityFacts;
use crate::session::SessionManager;

/// Build a manager from the merged configuration and log in.
///
/// Every CLI invocation is its own process, so each command establishes a
/// fresh session before doing its work.
pub(crate) async fn establish_session(
    client_id: Option<String>,
    client_secret: Option<String>,
) -> Result<(SessionManager, IdentityFacts)> {
    let config = Config::load()?;
    let credentials = config.resolve_credentials(client_id, client_secret)?;
    let manager = SessionManager::new(config.endpoints)?;
    let facts = manager.login(credentials).await?;
    Ok((manager, facts))
}
