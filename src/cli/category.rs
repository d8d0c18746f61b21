use crate::cli::LabelCommand;
use crate::error::BlogError;
use crate::services::categories;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, command: LabelCommand) -> Result<()> {
    let (_, db) = super::open(config_path)?;

    match command {
        LabelCommand::Add { name } => {
            let id = categories::create_category(&db, &name)?;
            tracing::info!("Category '{}' created with id {}", name, id);
        }
        LabelCommand::List => {
            println!("{:<6} {:<40} {:>6}", "ID", "NAME", "POSTS");
            println!("{}", "-".repeat(54));
            for entry in categories::list_categories_with_counts(&db)? {
                println!(
                    "{:<6} {:<40} {:>6}",
                    entry.category.id, entry.category.name, entry.count
                );
            }
        }
        LabelCommand::Rename { id, name } => {
            let current = categories::get_category(&db, id)?
                .ok_or(BlogError::not_found("category", id))?;
            categories::rename_category(&db, id, &name)?;
            tracing::info!("Category '{}' renamed to '{}'", current, name);
        }
        LabelCommand::Remove { id } => {
            if categories::delete_category(&db, id)? {
                tracing::info!("Category {} removed along with its posts", id);
            } else {
                tracing::warn!("Category {} not found", id);
            }
        }
    }

    Ok(())
}
