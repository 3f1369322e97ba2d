//! Application state shared by request handlers

use std::sync::Arc;

use crate::domain::storage::RegistrationStore;
use crate::domain::team::TeamPolicy;
use crate::infrastructure::registration::RegistrationService;
use crate::infrastructure::storage::Stores;

#[derive(Clone)]
pub struct AppState {
    pub registration: RegistrationService,
    /// Probed by the readiness endpoint
    pub store: Arc<dyn RegistrationStore>,
}

impl AppState {
    pub fn new(stores: Stores, policy: TeamPolicy) -> Self {
        let store = stores.registrations.clone();

        Self {
            registration: RegistrationService::new(stores, policy),
            store,
        }
    }
}
