use crate::error::Result;

pub async fn execute(
    client_id: Option<String>,
    client_secret: Option<String>,
    format: String,
    page: Option<u64>,
) -> Result<()> {
    let (manager, _) = super::establish_session(client_id, client_secret).await?;

    // Single-page mode relays the upstream body untouched
    if let Some(page) = page {
        let body = manager.fetch_page(page, true).await?;
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let listing = manager.list_local_sites().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&listing.items)?);
    } else {
        println!(
            "{} local sites ({} pages):\n",
            listing.items.len(),
            listing.total_pages
        );
        for site in listing.items {
            let scope = if !site.tags.is_empty() {
                format!("tags: {}", site.tags.join(", "))
            } else if let Some(category_id) = site.category_id {
                format!("categoryId: {}", category_id)
            } else {
                "-".to_string()
            };
            let comment = site.comment.unwrap_or_default();
            println!("  {}  {}  [{}]  {}", site.id, site.url, scope, comment);
        }
    }

    Ok(())
}
