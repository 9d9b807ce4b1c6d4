//! `loadstone inspect`: Parse typed content and print it as JSON.

use loadstone_config::LoaderConfig;
use loadstone_protocol::guess_content_type;

pub async fn run(uri: &str, mime: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = LoaderConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let stack = super::build_stack(&config)?;

    let mut connection = stack.factory.open(uri)?;

    // Prefer what needs no network: the flag, then the file name.
    let mime = match mime.or_else(|| guess_content_type(uri).map(str::to_string)) {
        Some(m) => m,
        None => {
            connection.connect().await?;
            connection
                .content_type()
                .map(str::to_string)
                .ok_or("Cannot determine the content type; pass --mime")?
        }
    };

    let handler = stack.chain.create_handler(&mime)?;
    let content = handler.get_content(connection.as_mut()).await?;

    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}
