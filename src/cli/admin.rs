use crate::admin::{AdminSite, ChangeList, Column};
use crate::config::AdminConfig;
use crate::Config;
use anyhow::Result;
use std::path::Path;

/// Prints each registered model and how it is presented.
pub async fn run(config_path: &Path) -> Result<()> {
    let config = Config::load(config_path)?;
    let site = AdminSite::new(&config.admin);

    for admin in site.registered() {
        println!("{} ({})", admin.verbose_name, admin.model);
        println!("  list_display:        {}", headers(&config.admin, &admin.list_display));
        println!("  list_filter:         {}", headers(&config.admin, &admin.list_filter));
        println!("  search_fields:       {}", headers(&config.admin, &admin.search_fields));
        println!("  list_select_related: {}", admin.list_select_related);
        for script in &admin.media_js {
            println!("  js:                  {}", script);
        }
        println!();
    }

    Ok(())
}

fn headers(config: &AdminConfig, columns: &[Column]) -> String {
    columns
        .iter()
        .map(|column| column.header(config))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn print_changelist(list: &ChangeList) {
    println!("{}", list.headers.join(" | "));
    println!("{}", "-".repeat(80));
    for row in &list.rows {
        println!("{}", row.join(" | "));
    }
    println!();
    println!("{} total, page {} of {}", list.total, list.page, list.pages);
}
