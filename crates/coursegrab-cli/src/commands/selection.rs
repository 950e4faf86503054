//! Selection list commands.

use clap::Subcommand;
use coursegrab_core::{
    session, CatalogSyncEngine, Config, PageOutcome, SelectionListManager,
};

use super::common::{clients, print_selected, CliResult};

#[derive(Subcommand)]
pub enum SelectionAction {
    /// Print the selection in priority order
    List {
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a course by id (resolves its schedule first)
    Add {
        /// Course id as shown in the catalog
        id: String,
        /// Stop scanning the catalog after this many pages
        #[arg(long, default_value_t = 25)]
        max_pages: u32,
    },
    /// Remove a course by id
    Remove { id: String },
    /// Move a course one position up
    MoveUp { id: String },
    /// Move a course to the top
    Pin { id: String },
}

pub async fn run(config: &Config, action: SelectionAction) -> CliResult {
    let (store, catalog, _tasks) = clients(config)?;
    let mut manager = SelectionListManager::new(catalog.clone(), store.clone());
    manager.load().await?;

    match action {
        SelectionAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(manager.courses())?);
            } else {
                for (index, selected) in manager.courses().iter().enumerate() {
                    print_selected(index, selected);
                }
                eprintln!("{} selected courses", manager.len());
            }
        }
        SelectionAction::Add { id, max_pages } => {
            let credential = session::require_session(store.as_ref()).await?;

            // The service has no summary-by-id endpoint; scan pages until
            // the id shows up, the way the dashboard table would have it at
            // hand already.
            let mut engine = CatalogSyncEngine::new(catalog);
            engine.reset(config.page_size)?;
            let summary = loop {
                if let Some(course) = engine.loaded().iter().find(|c| c.id == id) {
                    break course.clone();
                }
                if engine.cursor() >= max_pages {
                    return Err(format!(
                        "course {id} not found in the first {max_pages} catalog pages"
                    )
                    .into());
                }
                if let PageOutcome::NoNewCourses { .. } = engine.load_next_page(&credential).await? {
                    return Err(format!("course {id} not found in the catalog").into());
                }
            };

            let name = summary.name.clone();
            manager.add(summary).await?;
            println!("added {name} ({id}) to the selection");
        }
        SelectionAction::Remove { id } => {
            if manager.remove(&id).await? {
                println!("removed {id} from the selection");
            } else {
                println!("{id} is not in the selection");
            }
        }
        SelectionAction::MoveUp { id } => {
            if manager.move_up(&id).await? {
                println!("moved {id} up");
            } else {
                println!("{id} is already first (or not selected)");
            }
        }
        SelectionAction::Pin { id } => {
            if manager.pin_to_top(&id).await? {
                println!("pinned {id} to the top");
            } else {
                println!("{id} is already first (or not selected)");
            }
        }
    }
    Ok(())
}
