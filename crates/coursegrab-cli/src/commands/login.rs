//! Session login command.

use coursegrab_core::{session, Config};

use super::common::{clients, CliResult};

pub async fn run(config: &Config, credential: &str) -> CliResult {
    let (store, catalog, _tasks) = clients(config)?;

    let stored = session::login(store.as_ref(), catalog.as_ref(), credential).await?;
    println!("logged in; session credential stored ({} chars)", stored.len());
    Ok(())
}
