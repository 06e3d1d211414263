pub mod auth;
pub mod config;
pub mod history;
pub mod run;

use std::sync::Arc;

use pomofomo_core::{Database, StoredIdentity};

/// Database plus the identity stored in it.
pub(crate) fn open_store() -> Result<(Arc<Database>, Arc<StoredIdentity>), Box<dyn std::error::Error>>
{
    let db = Arc::new(Database::open()?);
    let identity = Arc::new(StoredIdentity::new(Arc::clone(&db)));
    Ok((db, identity))
}

/// Single-threaded runtime for commands that talk to the async collaborators.
pub(crate) fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}
