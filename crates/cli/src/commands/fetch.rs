//! `loadstone fetch`: Load one resource through the pools.

use loadstone_config::LoaderConfig;
use loadstone_core::listener::LoadOutcome;
use std::path::PathBuf;

pub async fn run(uri: &str, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = LoaderConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let stack = super::build_stack(&config)?;

    let cached = stack.cache.exists(uri).await;
    let bytes = match stack.loader.load(uri).await? {
        LoadOutcome::Loaded { stream, .. } => stream.read_to_end().await?,
        LoadOutcome::NotFound { uri, status_code } => {
            return Err(format!("{uri}: not found (status {status_code})").into());
        }
    };

    match output {
        Some(path) => {
            tokio::fs::write(&path, &bytes).await?;
            println!("✅ Wrote {} bytes to {}", bytes.len(), path.display());
        }
        None => {
            println!("✅ {uri}");
            println!("   Size:    {} bytes", bytes.len());
            println!("   Source:  {}", if cached { "cache" } else { "remote" });
            if let Some(stored) = stack.cache.last_modified(uri).await {
                println!("   Cached:  {}", stored.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
    }

    Ok(())
}
