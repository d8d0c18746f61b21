use crate::Config;
use anyhow::Result;
use std::path::PathBuf;

pub async fn run(path: PathBuf, name: Option<String>) -> Result<()> {
    let site_name = name.unwrap_or_else(|| "My Blog".to_string());

    std::fs::create_dir_all(path.join("data"))?;

    let config_path = path.join("inkpost.toml");
    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let config = Config::new(&site_name);
    std::fs::write(&config_path, config.to_toml()?)?;

    tracing::info!("Created new blog config at {:?}", config_path);
    tracing::info!("Run 'inkpost migrate' to set up the database");
    tracing::info!("Run 'inkpost serve' to start the server");

    Ok(())
}
