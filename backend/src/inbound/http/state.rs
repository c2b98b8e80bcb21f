//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data`. Services are held over
//! `dyn RecordStore`, so the storage backend chosen at startup never leaks
//! into the handlers.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::RecordStore;
use crate::domain::{
    HousingTypeRegistry, MeasurementLedger, SessionConfig, SessionManager, UserEntryDirectory,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Pending login sessions.
    pub sessions: Arc<SessionManager<dyn RecordStore>>,
    /// Shaft and housing measurements.
    pub ledger: Arc<MeasurementLedger<dyn RecordStore>>,
    /// User entry administration.
    pub user_entries: Arc<UserEntryDirectory<dyn RecordStore>>,
    /// Registry shared with the ledger.
    pub housing_types: Arc<HousingTypeRegistry>,
}

impl HttpState {
    /// Build every service over one shared Record Store.
    pub fn new(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        housing_types: Arc<HousingTypeRegistry>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                session_config,
            )),
            ledger: Arc::new(MeasurementLedger::new(
                Arc::clone(&store),
                clock,
                Arc::clone(&housing_types),
            )),
            user_entries: Arc::new(UserEntryDirectory::new(store)),
            housing_types,
        }
    }
}
