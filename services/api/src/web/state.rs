//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use lessonflow_core::ports::{
    LessonStore, PaymentGateway, ReportStore, TokenVerifier, UserStore,
};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub lessons: Arc<dyn LessonStore>,
    pub reports: Arc<dyn ReportStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub payments: Arc<dyn PaymentGateway>,
    pub config: Arc<Config>,
}
