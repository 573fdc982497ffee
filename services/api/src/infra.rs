use loan_portal::portal::seed::SeedError;
use loan_portal::portal::{EntityStore, MessageFanoutPolicy};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Store for a fresh process: the bundled demo data, or nothing at all.
pub(crate) fn initial_store(seed_demo_data: bool) -> Result<EntityStore, SeedError> {
    if seed_demo_data {
        EntityStore::seeded()
    } else {
        Ok(EntityStore::default())
    }
}

pub(crate) fn parse_fanout(raw: &str) -> Result<MessageFanoutPolicy, String> {
    raw.parse::<MessageFanoutPolicy>()
        .map_err(|()| format!("unknown fan-out policy '{raw}' (expected all_staff or first_officer)"))
}
