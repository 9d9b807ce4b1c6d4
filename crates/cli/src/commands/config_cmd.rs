//! `loadstone config`: Configuration commands.

use loadstone_config::LoaderConfig;

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = LoaderConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = LoaderConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
