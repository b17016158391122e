pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;

use config::RegistrationSettings;
use register_core::{FormOptions, RegistrationClient, SubmissionController};
use std::sync::Arc;

/// Shared application state: the submission controller wired to the
/// registration client, and the options new forms are created with.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<SubmissionController>,
    pub form_options: FormOptions,
}

impl AppState {
    pub fn new(client: Arc<dyn RegistrationClient>, settings: &RegistrationSettings) -> Self {
        let controller = SubmissionController::new(client)
            .with_path(settings.register_path.clone())
            .with_credentials(settings.with_credentials);

        Self {
            controller: Arc::new(controller),
            form_options: settings.form_options(),
        }
    }
}
