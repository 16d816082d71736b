//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and how it is wired together.

use crate::config::Config;
use crate::push::{ConnectionRegistry, PushDispatcher};
use matching_core::ports::{DatabaseService, IdentityService, NotificationService};
use matching_core::{IdentityResolver, InteractionGateway, InteractionStore, ProximityFinder};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests and Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: IdentityResolver,
    pub proximity: ProximityFinder,
    pub gateway: InteractionGateway,
    /// The only in-memory state shared between request and connection tasks.
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    /// Composes the core services on top of the given adapters, with the
    /// registry-backed push dispatcher as the notifier.
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Arc::new(PushDispatcher::new(registry.clone()));
        Self::with_notifier(config, db, identity, registry, notifier)
    }

    /// Same as [`AppState::new`] but with an explicit notifier and registry.
    pub fn with_notifier(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        identity: Arc<dyn IdentityService>,
        registry: Arc<ConnectionRegistry>,
        notifier: Arc<dyn NotificationService>,
    ) -> Self {
        let store = InteractionStore::new(db.clone(), config.like_duplicates);
        Self {
            identity: IdentityResolver::new(identity, db.clone()),
            proximity: ProximityFinder::new(db, config.nearby_radius_km),
            gateway: InteractionGateway::new(store, notifier),
            registry,
            config,
        }
    }
}
