//! `loadstone cache`: Persistent cache maintenance.

use loadstone_config::LoaderConfig;

pub async fn list() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoaderConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if config.cache.backend == "memory" {
        println!("Cache backend is \"memory\"; nothing is persisted.");
        return Ok(());
    }

    let cache = super::open_cache(&config)?;
    let mut uris = cache.uris().await;
    uris.sort();

    println!("📦 {} ({} assets)", config.cache.resolved_dir().display(), uris.len());
    for uri in &uris {
        let stored = cache
            .last_modified(uri)
            .await
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".into());
        println!("  {stored}  {uri}");
    }
    Ok(())
}

pub async fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoaderConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let cache = super::open_cache(&config)?;
    let count = cache.uris().await.len();
    cache.clear().await?;
    println!("🧹 Removed {count} cached assets");
    Ok(())
}
