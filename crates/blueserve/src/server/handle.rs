//! Process-wide server handle
//!
//! The bus callbacks of a transport carry no user data, so the running
//! server is published here for them to find. At most one server is
//! installed at a time.

use super::server::Server;
use crate::error::{ServerError, ServerResult};
use log::info;
use std::sync::{Arc, PoisonError, RwLock};

static CURRENT: RwLock<Option<Arc<Server>>> = RwLock::new(None);

/// Publish `server` as the process's running server
pub fn install(server: Arc<Server>) -> ServerResult<()> {
    let mut slot = CURRENT.write().unwrap_or_else(PoisonError::into_inner);
    if slot.is_some() {
        return Err(ServerError::AlreadyInstalled);
    }
    info!("Installed server {}", server.owned_name());
    *slot = Some(server);
    Ok(())
}

/// The running server, if one is installed
pub fn current() -> Option<Arc<Server>> {
    CURRENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Remove and return the running server
pub fn uninstall() -> Option<Arc<Server>> {
    let server = CURRENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(server) = &server {
        info!("Uninstalled server {}", server.owned_name());
    }
    server
}
