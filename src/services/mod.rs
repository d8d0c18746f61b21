pub mod categories;
pub mod excerpt;
pub mod markdown;
pub mod posts;
pub mod summarize;
pub mod tags;
pub mod urls;
pub mod users;
