use crate::error::Result;
use serde_json::json;

pub async fn execute(
    client_id: Option<String>,
    client_secret: Option<String>,
    json_output: bool,
) -> Result<()> {
    match super::establish_session(client_id, client_secret).await {
        Ok((manager, facts)) => {
            let expires_in = manager.token_seconds_remaining().await;
            if json_output {
                println!(
                    "{}",
                    json!({
                        "active": true,
                        "tenantId": facts.tenant_id,
                        "dataRegion": facts.data_region,
                        "apiBase": facts.api_base,
                        "token_expires_in_seconds": expires_in,
                    })
                );
            } else {
                println!(
                    "Session active: tenant {} in {} (token expires in {} seconds)",
                    facts.tenant_id, facts.data_region, expires_in
                );
            }
            Ok(())
        }
        Err(err) => {
            if json_output {
                println!("{}", json!({ "active": false, "reason": err.to_string() }));
            } else {
                println!("Session inactive: {}", err);
            }
            std::process::exit(1);
        }
    }
}
