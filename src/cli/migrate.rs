use crate::cli::MigrateCommand;
use crate::{Config, Database};
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, command: Option<MigrateCommand>) -> Result<()> {
    let config = Config::load(config_path)?;
    let db = Database::open(&config.database.path, config.database.pool_size)?;

    match command {
        None => {
            db.migrate()?;
            tracing::info!("Migrations complete");
        }
        Some(MigrateCommand::Status) => {
            println!("  {:<10} {:<60} Applied", "Version", "Description");
            println!("  {}", "-".repeat(90));
            for (version, description, applied_at) in db.migration_status()? {
                let applied = applied_at.unwrap_or_else(|| "pending".to_string());
                println!(
                    "  {:<10} {:<60} {}",
                    format!("{:03}", version),
                    description,
                    applied
                );
            }
        }
    }

    Ok(())
}
