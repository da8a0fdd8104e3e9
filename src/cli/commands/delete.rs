use crate::error::Result;

pub async fn execute(
    client_id: Option<String>,
    client_secret: Option<String>,
    id: String,
) -> Result<()> {
    let (manager, _) = super::establish_session(client_id, client_secret).await?;
    manager.delete_local_site(&id).await?;

    println!("✓ Deleted local site {}", id);

    Ok(())
}
