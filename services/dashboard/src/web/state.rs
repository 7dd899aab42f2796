//! services/dashboard/src/web/state.rs
//!
//! Defines the application's shared state.

use practice_diff_core::reconcile::Reconciler;

/// The shared application state, created once at startup and passed to all handlers.
///
/// Holds the long-lived store and HTTP clients (inside the reconciler's adapters);
/// nothing selection-specific lives here.
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Reconciler,
}
