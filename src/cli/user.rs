use crate::services::users;
use anyhow::Result;
use std::path::Path;

use super::UserCommand;

pub async fn run(config_path: &Path, command: UserCommand) -> Result<()> {
    let (_, db) = super::open(config_path)?;

    match command {
        UserCommand::Add { username, email } => {
            users::create_user(&db, &username, &email)?;
            tracing::info!("User '{}' created", username);
        }
        UserCommand::List => {
            println!("{:<6} {:<20} {:<30} {:<20}", "ID", "USERNAME", "EMAIL", "JOINED");
            println!("{}", "-".repeat(78));
            for user in users::list_users(&db)? {
                println!(
                    "{:<6} {:<20} {:<30} {:<20}",
                    user.id,
                    user.username,
                    user.email,
                    user.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        UserCommand::Remove { username } => match users::get_user_by_username(&db, &username)? {
            Some(user) => {
                users::delete_user(&db, user.id)?;
                tracing::info!("User '{}' removed along with their posts", username);
            }
            None => tracing::warn!("User '{}' not found", username),
        },
    }

    Ok(())
}
