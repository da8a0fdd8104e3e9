use crate::error::Result;

pub async fn execute(client_id: Option<String>, client_secret: Option<String>) -> Result<()> {
    let (manager, facts) = super::establish_session(client_id, client_secret).await?;

    println!("✓ Login successful!");
    println!("  Tenant:      {}", facts.tenant_id);
    println!("  Data region: {}", facts.data_region);
    println!("  API base:    {}", facts.api_base);
    println!(
        "  Token expires in: {} seconds",
        manager.token_seconds_remaining().await
    );

    Ok(())
}
