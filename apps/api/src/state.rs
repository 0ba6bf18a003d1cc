use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::llm_client::CompletionService;
use crate::shortlist::locks::TenantLocks;
use crate::shortlist::pipeline::ShortlistSettings;
use crate::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every external collaborator is held behind a trait object so tests can
/// swap in in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    /// `None` when no completion-service credential is configured.
    pub llm: Option<Arc<dyn CompletionService>>,
    pub auth: Arc<dyn TokenVerifier>,
    pub shortlist: ShortlistSettings,
    pub tenant_locks: TenantLocks,
}
