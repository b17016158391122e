//! Registration form state.
//!
//! [`RegisterForm`] owns the four raw field values together with their
//! validity flags. Every write goes through [`RegisterForm::set`], which
//! recomputes the affected flags before returning, so a reader never sees a
//! flag that disagrees with the current values.

use crate::validation::{
    Field, is_matching_confirmation, is_valid_email, is_valid_password, is_valid_username,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptions {
    /// Also require a valid email to enable and pass submission.
    #[serde(default)]
    pub require_valid_email: bool,
}

/// Outcome of the most recent submission attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SubmissionState {
    #[default]
    Idle,
    Error(String),
    /// Terminal. The form is replaced by a confirmation view.
    Success,
}

/// JSON body sent to the registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationPayload {
    pub user: String,
    pub pwd: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    options: FormOptions,

    email: String,
    username: String,
    password: String,
    confirm_password: String,

    valid_email: bool,
    valid_username: bool,
    valid_password: bool,
    valid_match: bool,

    focused: Option<Field>,
    state: SubmissionState,

    /// Cookies the registration endpoint set for this visitor, by name.
    #[serde(default)]
    cookies: BTreeMap<String, String>,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self::new(FormOptions::default())
    }
}

impl RegisterForm {
    /// Empty form with the email input focused.
    pub fn new(options: FormOptions) -> Self {
        let mut form = Self {
            options,
            email: String::new(),
            username: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            valid_email: false,
            valid_username: false,
            valid_password: false,
            valid_match: false,
            focused: None,
            state: SubmissionState::Idle,
            cookies: BTreeMap::new(),
        };
        for field in Field::ALL {
            form.revalidate(field);
        }
        form.focus(Field::Email);
        form
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Username => &self.username,
            Field::Password => &self.password,
            Field::ConfirmPassword => &self.confirm_password,
        }
    }

    pub fn is_valid(&self, field: Field) -> bool {
        match field {
            Field::Email => self.valid_email,
            Field::Username => self.valid_username,
            Field::Password => self.valid_password,
            Field::ConfirmPassword => self.valid_match,
        }
    }

    /// Write a field value. Returns `false` when the value is unchanged, in
    /// which case nothing is recomputed and no error is cleared.
    pub fn set(&mut self, field: Field, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.value(field) == value {
            return false;
        }

        match field {
            Field::Email => self.email = value,
            Field::Username => self.username = value,
            Field::Password => self.password = value,
            Field::ConfirmPassword => self.confirm_password = value,
        }

        self.revalidate(field);
        if field == Field::Password {
            self.revalidate(Field::ConfirmPassword);
        }

        if field.is_credential() && matches!(self.state, SubmissionState::Error(_)) {
            self.state = SubmissionState::Idle;
        }

        tracing::debug!(
            field = %field,
            valid = self.is_valid(field),
            "Field updated"
        );
        true
    }

    pub fn set_email(&mut self, value: impl Into<String>) -> bool {
        self.set(Field::Email, value)
    }

    pub fn set_username(&mut self, value: impl Into<String>) -> bool {
        self.set(Field::Username, value)
    }

    pub fn set_password(&mut self, value: impl Into<String>) -> bool {
        self.set(Field::Password, value)
    }

    pub fn set_confirm_password(&mut self, value: impl Into<String>) -> bool {
        self.set(Field::ConfirmPassword, value)
    }

    fn revalidate(&mut self, field: Field) {
        match field {
            Field::Email => self.valid_email = is_valid_email(&self.email),
            Field::Username => self.valid_username = is_valid_username(&self.username),
            Field::Password => self.valid_password = is_valid_password(&self.password),
            Field::ConfirmPassword => {
                self.valid_match = is_matching_confirmation(&self.confirm_password, &self.password)
            }
        }
    }

    /// Focus is exclusive: focusing one field blurs whichever had it.
    pub fn focus(&mut self, field: Field) {
        self.focused = Some(field);
    }

    pub fn blur(&mut self, field: Field) {
        if self.focused == Some(field) {
            self.focused = None;
        }
    }

    pub fn focused(&self) -> Option<Field> {
        self.focused
    }

    pub fn is_focused(&self, field: Field) -> bool {
        self.focused == Some(field)
    }

    /// Whether the field's instructional hint should be displayed.
    pub fn hint_visible(&self, field: Field) -> bool {
        self.is_focused(field)
            && (field.hints_when_empty() || !self.value(field).is_empty())
            && !self.is_valid(field)
    }

    /// The submit gate.
    pub fn can_submit(&self) -> bool {
        let email_ok = !self.options.require_valid_email || self.valid_email;
        self.valid_username
            && self.valid_password
            && self.valid_match
            && email_ok
            && !self.is_success()
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Error(message) => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == SubmissionState::Success
    }

    pub fn payload(&self) -> RegistrationPayload {
        RegistrationPayload {
            user: self.username.clone(),
            pwd: self.password.clone(),
        }
    }

    /// `Cookie` header value for this visitor's next registration call.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        Some(pairs.join("; "))
    }

    /// Apply raw `Set-Cookie` values. An empty value or `Max-Age=0` removes
    /// the cookie.
    pub(crate) fn store_cookies(&mut self, set_cookies: &[String]) {
        for raw in set_cookies {
            let mut parts = raw.split(';');
            let Some((name, value)) = parts.next().and_then(|pair| pair.split_once('=')) else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }

            let expired = parts.any(|attr| {
                attr.trim()
                    .split_once('=')
                    .is_some_and(|(k, v)| k.trim().eq_ignore_ascii_case("max-age") && v.trim() == "0")
            });
            let value = value.trim();
            if expired || value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.state = SubmissionState::Error(message);
    }

    /// Enter the terminal state and wipe every field.
    pub(crate) fn succeed(&mut self) {
        for field in Field::ALL {
            self.set(field, String::new());
        }
        self.state = SubmissionState::Success;
    }
}
