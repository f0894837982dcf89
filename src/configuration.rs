use std::collections::HashMap;
use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::mailchimp_client::MailchimpClient;

/// Global configuration, loaded from `configuration/*.yaml`. See
/// `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub mailchimp: MailchimpSettings,
    pub widget: WidgetSettings,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Signs the flash message cookies; at least 64 bytes
    pub hmac_secret: Secret<String>,
}

#[derive(Deserialize, Clone)]
pub struct MailchimpSettings {
    /// e.g. `https://us1.api.mailchimp.com/3.0`; the datacenter must match the
    /// api key's suffix
    pub base_url: String,

    /// Empty means "not configured yet"; the widget then renders nothing
    pub api_key: Secret<String>,

    /// No retries are made, so this bounds how long a visitor waits on a
    /// slow Mailchimp
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl MailchimpSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(&self) -> Result<MailchimpClient, reqwest::Error> {
        MailchimpClient::new(self.base_url.clone(), self.timeout())
    }
}

/// Properties of the widget instance. Title and list id can be overridden per
/// locale via the property store; these are the fallbacks.
#[derive(Deserialize, Clone)]
pub struct WidgetSettings {
    pub list_id: String,
    pub locale: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Node to redirect to after a successful subscription
    #[serde(default)]
    pub finish_node: Option<String>,
    /// Node to redirect to after Mailchimp refused a subscription
    #[serde(default)]
    pub error_node: Option<String>,
    #[serde(default)]
    pub translations: HashMap<String, String>,
    /// node id -> path
    #[serde(default)]
    pub nodes: HashMap<String, String>,
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

impl TryFrom<String> for Environment {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            e => Err(format!("Invalid environment: {e}")),
        }
    }
}

/// Load yaml configuration files at `<project_root>/configuration`:
/// `base.yaml`, then `{APP_ENVIRONMENT}.yaml` (default `local`), then `APP_*`
/// env vars, e.g. `APP_MAILCHIMP__API_KEY=...` -> `Settings.mailchimp.api_key`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or("local".to_string())
        .try_into()
        .map_err(ConfigError::Message)?;

    let settings = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- strings, hence `serde-aux` on numeric fields
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
