use register_core::{FormOptions, REGISTER_PATH};
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub registration: RegistrationSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct RegistrationSettings {
    /// Origin of the registration API (e.g., https://api.example.com).
    pub base_url: String,
    #[serde(default = "default_register_path")]
    pub register_path: String,
    /// Send each visitor's cookies on the registration call and keep the ones it sets.
    #[serde(default = "default_with_credentials")]
    pub with_credentials: bool,
    /// Make email validity part of the submit gate.
    #[serde(default)]
    pub require_valid_email: bool,
}

impl RegistrationSettings {
    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            require_valid_email: self.require_valid_email,
        }
    }
}

fn default_register_path() -> String {
    REGISTER_PATH.to_string()
}

fn default_with_credentials() -> bool {
    true
}

#[derive(Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g., http://tempo:4317). Spans are not exported when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Running from the crate directory or from the workspace root
    let configuration_directory = if base_path.ends_with("register-frontend") {
        base_path.join("config")
    } else {
        base_path.join("register-frontend").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
