//! Submission controller: defensive re-check, one POST, state transition.

use crate::client::{PostOptions, RegistrationClient};
use crate::error::RegisterError;
use crate::form::RegisterForm;
use crate::validation::{Field, is_valid_email, is_valid_password, is_valid_username};
use serde_json::Value;
use std::sync::Arc;

pub const REGISTER_PATH: &str = "/register";

/// What a call to [`SubmissionController::submit`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The endpoint accepted the registration.
    Registered { body: Option<Value> },
    /// The defensive re-check failed; nothing was sent.
    Rejected,
    /// The request was sent and failed.
    Failed { status: Option<u16> },
    /// The form had already succeeded; nothing was sent.
    AlreadyRegistered,
}

impl SubmitOutcome {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SubmitOutcome::Registered { .. } => "success",
            SubmitOutcome::Rejected => "rejected",
            SubmitOutcome::Failed { .. } => "failed",
            SubmitOutcome::AlreadyRegistered => "ignored",
        }
    }
}

pub struct SubmissionController {
    client: Arc<dyn RegistrationClient>,
    path: String,
    post_options: PostOptions,
}

impl SubmissionController {
    pub fn new(client: Arc<dyn RegistrationClient>) -> Self {
        Self {
            client,
            path: REGISTER_PATH.to_string(),
            post_options: PostOptions::json_with_credentials(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.post_options.with_credentials = with_credentials;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Submit the form.
    ///
    /// The `&mut` borrow only covers this value. Callers that keep the form
    /// elsewhere (a session store) and load a copy per request can run two
    /// submissions of the same visitor's form at once; each sends its own
    /// request. Every failure ends up as an error message on the form; none
    /// is returned to the caller.
    ///
    /// With credentials enabled, the form's own cookies are sent and any the
    /// endpoint sets are stored back on the form, whatever the outcome.
    pub async fn submit(&self, form: &mut RegisterForm) -> SubmitOutcome {
        if form.is_success() {
            tracing::debug!("Ignoring submission of an already registered form");
            return SubmitOutcome::AlreadyRegistered;
        }

        if let Err(err) = Self::recheck(form) {
            tracing::warn!("Registration rejected before sending: {}", err);
            form.fail(err.user_message());
            return SubmitOutcome::Rejected;
        }

        let payload = form.payload();
        let body = match serde_json::to_value(&payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Failed to encode registration payload: {}", e);
                form.fail(RegisterError::Validation(e.to_string()).user_message());
                return SubmitOutcome::Rejected;
            }
        };

        let mut options = self.post_options.clone();
        if options.with_credentials {
            options.cookie = form.cookie_header();
        }

        match self.client.post(&self.path, &body, &options).await {
            Ok(response) => {
                form.store_cookies(&response.set_cookies);
                tracing::info!(
                    user = %payload.user,
                    status = response.status,
                    "Registration succeeded"
                );
                tracing::debug!(body = ?response.body, "Registration response body");
                form.succeed();
                SubmitOutcome::Registered {
                    body: response.body,
                }
            }
            Err(err) => {
                tracing::warn!(
                    user = %payload.user,
                    status = ?err.status,
                    "Registration failed: {}",
                    err.message
                );
                let status = err.status;
                form.store_cookies(&err.set_cookies);
                form.fail(RegisterError::from(err).user_message());
                SubmitOutcome::Failed { status }
            }
        }
    }

    /// Re-run the field rules on the raw values, independent of the gate.
    fn recheck(form: &RegisterForm) -> Result<(), RegisterError> {
        let mut invalid = Vec::new();
        if !is_valid_username(form.value(Field::Username)) {
            invalid.push(Field::Username.as_str());
        }
        if !is_valid_password(form.value(Field::Password)) {
            invalid.push(Field::Password.as_str());
        }
        if form.options().require_valid_email && !is_valid_email(form.value(Field::Email)) {
            invalid.push(Field::Email.as_str());
        }

        if invalid.is_empty() {
            Ok(())
        } else {
            Err(RegisterError::Validation(format!(
                "invalid fields: {}",
                invalid.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientResponse, MockRegistrationClient};
    use crate::error::TransportError;
    use crate::form::{FormOptions, SubmissionState};

    fn valid_form() -> RegisterForm {
        let mut form = RegisterForm::default();
        form.set_email("jane@mail.io");
        form.set_username("abc1");
        form.set_password("Abcd123!");
        form.set_confirm_password("Abcd123!");
        form
    }

    #[tokio::test]
    async fn test_valid_submission_posts_and_clears() {
        let client = Arc::new(MockRegistrationClient::succeeding());
        let controller = SubmissionController::new(client.clone());
        let mut form = valid_form();
        assert!(form.can_submit());

        let outcome = controller.submit(&mut form).await;

        assert_eq!(outcome, SubmitOutcome::Registered { body: None });
        assert_eq!(form.state(), &SubmissionState::Success);
        for field in Field::ALL {
            assert_eq!(form.value(field), "");
        }

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/register");
        assert_eq!(
            requests[0].body,
            serde_json::json!({"user": "abc1", "pwd": "Abcd123!"})
        );
        assert_eq!(requests[0].options, PostOptions::json_with_credentials());
    }

    #[tokio::test]
    async fn test_bypassed_gate_is_rejected_without_request() {
        let client = Arc::new(MockRegistrationClient::succeeding());
        let controller = SubmissionController::new(client.clone());
        let mut form = valid_form();
        form.set_username("a");
        assert!(!form.can_submit());

        let outcome = controller.submit(&mut form).await;

        assert_eq!(outcome, SubmitOutcome::Rejected);
        assert_eq!(client.request_count(), 0);
        assert_eq!(
            form.error_message(),
            Some("Input validation failed. Input should meet constraints")
        );
    }

    #[tokio::test]
    async fn test_weak_password_is_rejected() {
        let client = Arc::new(MockRegistrationClient::succeeding());
        let controller = SubmissionController::new(client.clone());
        let mut form = valid_form();
        form.set_password("password");
        form.set_confirm_password("password");

        assert_eq!(controller.submit(&mut form).await, SubmitOutcome::Rejected);
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_fields() {
        let client = Arc::new(MockRegistrationClient::failing_with_status(409));
        let controller = SubmissionController::new(client.clone());
        let mut form = valid_form();

        let outcome = controller.submit(&mut form).await;

        assert_eq!(outcome, SubmitOutcome::Failed { status: Some(409) });
        assert_eq!(client.request_count(), 1);
        assert!(form.error_message().unwrap().ends_with("Error code:409"));
        assert_eq!(form.value(Field::Username), "abc1");
        assert_eq!(form.value(Field::Password), "Abcd123!");
        assert_eq!(form.value(Field::ConfirmPassword), "Abcd123!");
        assert_eq!(form.value(Field::Email), "jane@mail.io");
    }

    #[tokio::test]
    async fn test_network_failure_has_undefined_code() {
        let client = Arc::new(MockRegistrationClient::failing_network());
        let controller = SubmissionController::new(client);
        let mut form = valid_form();

        let outcome = controller.submit(&mut form).await;

        assert_eq!(outcome, SubmitOutcome::Failed { status: None });
        assert_eq!(
            form.error_message(),
            Some("Unexpected error: Please contact support!. Error code:undefined")
        );
    }

    #[tokio::test]
    async fn test_password_edit_after_error_clears_message() {
        let client = Arc::new(MockRegistrationClient::failing_with_status(500));
        let controller = SubmissionController::new(client);
        let mut form = valid_form();
        controller.submit(&mut form).await;
        assert!(form.error_message().is_some());

        form.set_password("Abcd123!z");

        assert_eq!(form.state(), &SubmissionState::Idle);
        assert_eq!(form.value(Field::Username), "abc1");
        assert_eq!(form.value(Field::Email), "jane@mail.io");
    }

    #[tokio::test]
    async fn test_retry_after_error_sends_one_request_each() {
        let client = Arc::new(MockRegistrationClient::failing_with_status(503));
        let controller = SubmissionController::new(client.clone());
        let mut form = valid_form();

        controller.submit(&mut form).await;
        assert_eq!(client.request_count(), 1);

        client.set_outcome(Ok(ClientResponse {
            status: 200,
            body: Some(serde_json::json!({"created": true})),
            ..ClientResponse::default()
        }));
        let outcome = controller.submit(&mut form).await;

        assert_eq!(client.request_count(), 2);
        assert_eq!(
            outcome,
            SubmitOutcome::Registered {
                body: Some(serde_json::json!({"created": true}))
            }
        );
    }

    #[tokio::test]
    async fn test_success_is_terminal() {
        let client = Arc::new(MockRegistrationClient::succeeding());
        let controller = SubmissionController::new(client.clone());
        let mut form = valid_form();
        controller.submit(&mut form).await;

        let outcome = controller.submit(&mut form).await;

        assert_eq!(outcome, SubmitOutcome::AlreadyRegistered);
        assert_eq!(client.request_count(), 1);
        assert!(form.is_success());
    }

    #[tokio::test]
    async fn test_required_email_is_rechecked() {
        let client = Arc::new(MockRegistrationClient::succeeding());
        let controller = SubmissionController::new(client.clone());
        let mut form = RegisterForm::new(FormOptions {
            require_valid_email: true,
        });
        form.set_username("abc1");
        form.set_password("Abcd123!");
        form.set_confirm_password("Abcd123!");

        assert_eq!(controller.submit(&mut form).await, SubmitOutcome::Rejected);
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_path_and_credentials() {
        let client = Arc::new(MockRegistrationClient::succeeding());
        let controller = SubmissionController::new(client.clone())
            .with_path("/api/v1/register")
            .with_credentials(false);
        let mut form = valid_form();

        controller.submit(&mut form).await;

        let request = &client.requests()[0];
        assert_eq!(request.path, "/api/v1/register");
        assert!(!request.options.with_credentials);
    }

    #[tokio::test]
    async fn test_cookies_follow_their_own_form() {
        let client = Arc::new(MockRegistrationClient::with_outcome(Err(
            TransportError::http(409, "Conflict")
                .with_set_cookies(vec!["sid=VISITOR_A; Path=/; HttpOnly".to_string()]),
        )));
        let controller = SubmissionController::new(client.clone());
        let mut visitor_a = valid_form();
        let mut visitor_b = valid_form();

        controller.submit(&mut visitor_a).await;
        client.set_outcome(Ok(ClientResponse {
            status: 201,
            ..ClientResponse::default()
        }));
        controller.submit(&mut visitor_b).await;
        visitor_a.set_password("Abcd123!a");
        visitor_a.set_confirm_password("Abcd123!a");
        controller.submit(&mut visitor_a).await;

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].options.cookie, None);
        assert_eq!(requests[1].options.cookie, None);
        assert_eq!(requests[2].options.cookie.as_deref(), Some("sid=VISITOR_A"));
    }

    #[tokio::test]
    async fn test_cookies_not_sent_without_credentials() {
        let client = Arc::new(MockRegistrationClient::succeeding());
        let controller = SubmissionController::new(client.clone()).with_credentials(false);
        let mut form = valid_form();
        form.store_cookies(&["sid=abc".to_string()]);

        controller.submit(&mut form).await;

        assert_eq!(client.requests()[0].options.cookie, None);
    }

    #[tokio::test]
    async fn test_copies_of_a_form_submit_independently() {
        let client = Arc::new(MockRegistrationClient::failing_with_status(503));
        let controller = SubmissionController::new(client.clone());
        let stored = valid_form();

        let mut first = stored.clone();
        let mut second = stored.clone();
        controller.submit(&mut first).await;
        controller.submit(&mut second).await;

        assert_eq!(client.request_count(), 2);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(SubmitOutcome::Registered { body: None }.label(), "success");
        assert_eq!(SubmitOutcome::Rejected.label(), "rejected");
        assert_eq!(SubmitOutcome::Failed { status: Some(500) }.label(), "failed");
        assert_eq!(SubmitOutcome::AlreadyRegistered.label(), "ignored");
    }
}
