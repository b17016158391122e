//! register-core: validation engine, form state and submission controller
//! for new-user registration.
pub mod client;
pub mod error;
pub mod form;
pub mod observability;
pub mod submission;
pub mod validation;

pub use client::{
    ClientResponse, HttpRegistrationClient, MockRegistrationClient, PostOptions,
    RegistrationClient,
};
pub use error::{RegisterError, TransportError};
pub use form::{FormOptions, RegisterForm, RegistrationPayload, SubmissionState};
pub use submission::{REGISTER_PATH, SubmissionController, SubmitOutcome};
pub use validation::Field;
