use crate::error::Result;
use crate::models::NewLocalSite;

pub async fn execute(
    client_id: Option<String>,
    client_secret: Option<String>,
    url: String,
    tags: Vec<String>,
    category_id: Option<i64>,
    comment: Option<String>,
) -> Result<()> {
    let site = NewLocalSite {
        url,
        tags: tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        category_id,
        comment,
    };
    // Validate before any network round trip
    site.validate()?;

    let (manager, _) = super::establish_session(client_id, client_secret).await?;
    let created = manager.add_local_site(site).await?;

    println!("✓ Added local site");
    println!("  id:  {}", created.id);
    println!("  url: {}", created.url);

    Ok(())
}
