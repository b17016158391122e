use register_core::{Field, RegisterForm};

/// Render model for one input of the registration form.
#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: &'static str,
    pub label: &'static str,
    pub input_type: &'static str,
    pub value: String,
    pub invalid: bool,
    pub show_hint: bool,
    pub hint: &'static [&'static str],
    pub autofocus: bool,
}

/// Render model for the whole form.
#[derive(Debug, Clone)]
pub struct FormView {
    pub fields: Vec<FieldView>,
    /// Empty when there is nothing to report.
    pub error: String,
    pub can_submit: bool,
    pub success: bool,
    /// Emit elements as htmx out-of-band swaps.
    pub oob: bool,
}

impl FormView {
    pub fn from_form(form: &RegisterForm) -> Self {
        let fields = Field::ALL
            .into_iter()
            .map(|field| FieldView {
                name: field.as_str(),
                label: field.label(),
                input_type: match field {
                    Field::Password | Field::ConfirmPassword => "password",
                    Field::Email | Field::Username => "text",
                },
                value: form.value(field).to_string(),
                invalid: !form.is_valid(field),
                show_hint: form.hint_visible(field),
                hint: field.hint(),
                autofocus: form.is_focused(field),
            })
            .collect();

        Self {
            fields,
            error: form.error_message().unwrap_or_default().to_string(),
            can_submit: form.can_submit(),
            success: form.is_success(),
            oob: false,
        }
    }

    pub fn out_of_band(mut self) -> Self {
        self.oob = true;
        self
    }
}
