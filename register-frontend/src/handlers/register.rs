//! Server side of the htmx-driven registration form.
//!
//! The [`RegisterForm`] for each visitor lives in their session. Input and
//! focus events update it and answer with out-of-band fragments for the
//! hints, the error line and the submit button; submitting re-renders the
//! whole form, or the success view.

use crate::error::AppError;
use crate::models::FormView;
use crate::services::metrics::record_submission;
use crate::AppState;
use askama::Template;
use axum::{extract::State, Form};
use register_core::{Field, FormOptions, RegisterForm};
use serde::Deserialize;
use tower_sessions::Session;

const FORM_SESSION_KEY: &str = "register_form";

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPageTemplate {
    pub view: FormView,
}

#[derive(Template)]
#[template(path = "register_fragment.html")]
pub struct RegisterFragmentTemplate {
    pub view: FormView,
}

#[derive(Template)]
#[template(path = "register_status.html")]
pub struct RegisterStatusTemplate {
    pub view: FormView,
}

/// Field values posted by the inputs. Absent fields are left alone.
#[derive(Deserialize, Default)]
pub struct FieldEdits {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl FieldEdits {
    fn apply(self, form: &mut RegisterForm) {
        let edits = [
            (Field::Email, self.email),
            (Field::Username, self.username),
            (Field::Password, self.password),
            (Field::ConfirmPassword, self.confirm_password),
        ];
        for (field, value) in edits {
            if let Some(value) = value {
                form.set(field, value);
            }
        }
    }
}

#[derive(Deserialize)]
pub struct FocusRequest {
    pub field: String,
    pub focused: bool,
}

async fn load_form(session: &Session, options: FormOptions) -> Result<RegisterForm, AppError> {
    let form = session.get::<RegisterForm>(FORM_SESSION_KEY).await?;
    Ok(form.unwrap_or_else(|| RegisterForm::new(options)))
}

async fn save_form(session: &Session, form: &RegisterForm) -> Result<(), AppError> {
    session.insert(FORM_SESSION_KEY, form).await?;
    Ok(())
}

pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<RegisterPageTemplate, AppError> {
    let form = load_form(&session, state.form_options).await?;
    save_form(&session, &form).await?;

    Ok(RegisterPageTemplate {
        view: FormView::from_form(&form),
    })
}

pub async fn field_handler(
    State(state): State<AppState>,
    session: Session,
    Form(edits): Form<FieldEdits>,
) -> Result<RegisterStatusTemplate, AppError> {
    let mut form = load_form(&session, state.form_options).await?;
    edits.apply(&mut form);
    save_form(&session, &form).await?;

    Ok(RegisterStatusTemplate {
        view: FormView::from_form(&form).out_of_band(),
    })
}

pub async fn focus_handler(
    State(state): State<AppState>,
    session: Session,
    Form(request): Form<FocusRequest>,
) -> Result<RegisterStatusTemplate, AppError> {
    let field = request
        .field
        .parse::<Field>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut form = load_form(&session, state.form_options).await?;
    if request.focused {
        form.focus(field);
    } else {
        form.blur(field);
    }
    save_form(&session, &form).await?;

    Ok(RegisterStatusTemplate {
        view: FormView::from_form(&form).out_of_band(),
    })
}

pub async fn register_handler(
    State(state): State<AppState>,
    session: Session,
    Form(edits): Form<FieldEdits>,
) -> Result<RegisterFragmentTemplate, AppError> {
    let mut form = load_form(&session, state.form_options).await?;
    edits.apply(&mut form);

    let outcome = state.controller.submit(&mut form).await;
    record_submission(outcome.label());
    save_form(&session, &form).await?;

    Ok(RegisterFragmentTemplate {
        view: FormView::from_form(&form),
    })
}
