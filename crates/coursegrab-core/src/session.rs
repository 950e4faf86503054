//! Session credential handling.
//!
//! The credential is an opaque upstream cookie value. It is never validated
//! locally; login probes the catalog with a minimal one-entry page fetch
//! and persists the credential only when the probe succeeds.

use crate::api::catalog::CatalogApi;
use crate::api::storage::{RemoteStore, SESSION_KEY};
use crate::error::{Error, Result};

/// Normalize a pasted credential. Users routinely paste the whole
/// `JSESSIONID=...` cookie assignment.
pub fn normalize_credential(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("JSESSIONID=").unwrap_or(trimmed);
    trimmed.trim().to_string()
}

/// Validate `raw` against the catalog and persist it as the active session.
///
/// Returns the normalized credential. Nothing is persisted when the probe
/// fails.
pub async fn login(
    store: &dyn RemoteStore,
    catalog: &dyn CatalogApi,
    raw: &str,
) -> Result<String> {
    let credential = normalize_credential(raw);
    if credential.is_empty() {
        return Err(Error::Validation("session credential is empty".into()));
    }

    // Cheapest request that still exercises authentication.
    catalog.fetch_page(&credential, 1, 1).await?;

    store.put(SESSION_KEY, &credential).await?;
    Ok(credential)
}

/// The persisted session credential, if one exists.
pub async fn stored_session(store: &dyn RemoteStore) -> Result<Option<String>> {
    Ok(store
        .get(SESSION_KEY)
        .await?
        .filter(|value| !value.trim().is_empty()))
}

/// The persisted session credential, or a validation error telling the
/// caller to log in first.
pub async fn require_session(store: &dyn RemoteStore) -> Result<String> {
    stored_session(store)
        .await?
        .ok_or_else(|| Error::Validation("not logged in; save a session credential first".into()))
}
