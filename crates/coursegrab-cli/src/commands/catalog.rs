//! Catalog browsing commands.

use clap::Subcommand;
use coursegrab_core::{session, CatalogSyncEngine, Config, PageOutcome};

use super::common::{clients, print_course, CliResult};

#[derive(Subcommand)]
pub enum CatalogAction {
    /// Load catalog pages and print the loaded set
    Browse {
        /// How many pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Page size (defaults to the configured value)
        #[arg(long)]
        page_size: Option<u32>,
        /// Case-insensitive filter over name, id, teacher, and category
        #[arg(long)]
        filter: Option<String>,
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(config: &Config, action: CatalogAction) -> CliResult {
    match action {
        CatalogAction::Browse {
            pages,
            page_size,
            filter,
            json,
        } => browse(config, pages, page_size, filter, json).await,
    }
}

async fn browse(
    config: &Config,
    pages: u32,
    page_size: Option<u32>,
    filter: Option<String>,
    json: bool,
) -> CliResult {
    let (store, catalog, _tasks) = clients(config)?;
    let credential = session::require_session(store.as_ref()).await?;

    let mut engine = CatalogSyncEngine::new(catalog);
    engine.reset(page_size.unwrap_or(config.page_size))?;

    for _ in 0..pages {
        match engine.load_next_page(&credential).await? {
            PageOutcome::NewCourses { page, count } => {
                eprintln!("page {page}: {count} new courses");
            }
            PageOutcome::NoNewCourses { first_page } => {
                if !first_page {
                    eprintln!("no further new courses; catalog fully loaded");
                }
                break;
            }
        }
    }

    let hits = engine.search(filter.as_deref().unwrap_or(""));
    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        for course in &hits {
            print_course(course);
        }
        eprintln!("{} courses", hits.len());
    }
    Ok(())
}
