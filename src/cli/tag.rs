use crate::cli::LabelCommand;
use crate::services::tags;
use anyhow::Result;
use std::path::Path;

pub async fn run(config_path: &Path, command: LabelCommand) -> Result<()> {
    let (_, db) = super::open(config_path)?;

    match command {
        LabelCommand::Add { name } => {
            let id = tags::create_tag(&db, &name)?;
            tracing::info!("Tag '{}' created with id {}", name, id);
        }
        LabelCommand::List => {
            println!("{:<6} {:<40} {:>6}", "ID", "NAME", "POSTS");
            println!("{}", "-".repeat(54));
            for entry in tags::list_tags_with_counts(&db)? {
                println!("{:<6} {:<40} {:>6}", entry.tag.id, entry.tag.name, entry.count);
            }
        }
        LabelCommand::Rename { id, name } => {
            tags::rename_tag(&db, id, &name)?;
            tracing::info!("Tag {} renamed to '{}'", id, name);
        }
        LabelCommand::Remove { id } => {
            // Posts keep existing; only their links to this tag go away
            if tags::delete_tag(&db, id)? {
                tracing::info!("Tag {} removed", id);
            } else {
                tracing::warn!("Tag {} not found", id);
            }
        }
    }

    Ok(())
}
