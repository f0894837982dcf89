//! Widget instance: its properties, and what the page does with a
//! `SubscriptionOutcome` (where to go next, which notice to show).

use std::sync::Arc;

use secrecy::ExposeSecret;
use secrecy::Secret;
use serde::Deserialize;

use crate::collaborators::localized_key;
use crate::collaborators::NodeResolver;
use crate::collaborators::PropertyStore;
use crate::collaborators::Translator;
use crate::configuration::WidgetSettings;
use crate::domain::FieldErrors;
use crate::domain::SubscriptionOutcome;
use crate::utils::strip_query;

/// Widget property names, as saved by the properties editor
pub const TITLE_PROPERTY: &str = "title";
pub const API_KEY_PROPERTY: &str = "apikey";
pub const LIST_ID_PROPERTY: &str = "listid";
pub const FINISH_NODE_PROPERTY: &str = "finishNode";
pub const ERROR_NODE_PROPERTY: &str = "errorNode";

pub const SUCCESS_KEY: &str = "success.mailchimp.subscribe";
pub const EXISTS_KEY: &str = "warning.mailchimp.email.exists";
pub const GENERAL_ERROR_KEY: &str = "error.mailchimp.subscribe.general";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Warning(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    /// Show the form again, with the submitted values and these errors
    Render(FieldErrors),
    Redirect {
        location: String,
        notice: Option<Notice>,
    },
}

/// The properties editor form. Node ids are CMS page ids; empty means none.
#[derive(Deserialize)]
pub struct PropertiesForm {
    #[serde(default)]
    pub title: String,
    pub apikey: Option<Secret<String>>,
    pub listid: Option<String>,
    #[serde(default, rename = "finishNode")]
    pub finish_node: String,
    #[serde(default, rename = "errorNode")]
    pub error_node: String,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Required properties missing: {}", .0.join(", "))]
pub struct MissingProperties(pub Vec<&'static str>);

pub struct Widget {
    settings: WidgetSettings,
    api_key: Secret<String>,
    store: Arc<dyn PropertyStore>,
    translator: Arc<dyn Translator>,
    resolver: Arc<dyn NodeResolver>,
}

impl Widget {
    pub fn new(
        settings: WidgetSettings,
        api_key: Secret<String>,
        store: Arc<dyn PropertyStore>,
        translator: Arc<dyn Translator>,
        resolver: Arc<dyn NodeResolver>,
    ) -> Self {
        Self {
            settings,
            api_key,
            store,
            translator,
            resolver,
        }
    }

    pub fn locale(&self) -> &str { &self.settings.locale }

    pub fn translator(&self) -> &dyn Translator { self.translator.as_ref() }

    /// Saved property, then the configured default. A saved empty value wins
    /// over the default, and blank counts as unset.
    fn property(
        &self,
        key: &str,
        fallback: Option<&str>,
    ) -> Option<String> {
        self.store
            .get(key)
            .or_else(|| fallback.map(str::to_string))
            .filter(|v| !v.trim().is_empty())
    }

    fn localized(
        &self,
        key: &str,
        fallback: Option<&str>,
    ) -> Option<String> {
        self.property(&localized_key(self.locale(), key), fallback)
    }

    pub fn title(&self) -> Option<String> { self.localized(TITLE_PROPERTY, self.settings.title.as_deref()) }

    pub fn list_id(&self) -> Option<String> { self.localized(LIST_ID_PROPERTY, Some(&self.settings.list_id)) }

    pub fn api_key(&self) -> Option<Secret<String>> {
        self.property(API_KEY_PROPERTY, Some(self.api_key.expose_secret()))
            .map(Secret::new)
    }

    fn finish_node(&self) -> Option<String> {
        self.property(FINISH_NODE_PROPERTY, self.settings.finish_node.as_deref())
    }

    fn error_node(&self) -> Option<String> {
        self.property(ERROR_NODE_PROPERTY, self.settings.error_node.as_deref())
    }

    /// Both api key and list id are needed before anything is rendered
    pub fn credentials(&self) -> Option<(Secret<String>, String)> { Some((self.api_key()?, self.list_id()?)) }

    /// Save the properties editor form. Api key and list id are required;
    /// nothing is written unless both are present.
    #[tracing::instrument(name = "Saving widget properties", skip_all)]
    pub fn save_properties(
        &self,
        form: PropertiesForm,
    ) -> Result<(), MissingProperties> {
        let api_key = form
            .apikey
            .map(|k| k.expose_secret().trim().to_string())
            .unwrap_or_default();
        let list_id = form.listid.unwrap_or_default().trim().to_string();

        let mut missing = vec![];
        if api_key.is_empty() {
            missing.push(API_KEY_PROPERTY);
        }
        if list_id.is_empty() {
            missing.push(LIST_ID_PROPERTY);
        }
        if !missing.is_empty() {
            return Err(MissingProperties(missing));
        }

        let locale = self.locale();
        self.store
            .set(&localized_key(locale, TITLE_PROPERTY), form.title.trim().to_string());
        self.store.set(API_KEY_PROPERTY, api_key);
        self.store
            .set(&localized_key(locale, LIST_ID_PROPERTY), list_id);
        self.store
            .set(FINISH_NODE_PROPERTY, form.finish_node.trim().to_string());
        self.store
            .set(ERROR_NODE_PROPERTY, form.error_node.trim().to_string());
        tracing::info!(locale, "widget properties saved");
        Ok(())
    }

    fn node_url(
        &self,
        node: Option<String>,
    ) -> Option<String> {
        let node = node?;
        let url = self.resolver.resolve(&node, self.locale());
        if url.is_none() {
            tracing::warn!(%node, locale = self.locale(), "could not resolve node");
        }
        url
    }

    /// Where the visitor goes after submitting. Redirects always drop the
    /// query string so the submitted values don't linger in the url.
    pub fn next_step(
        &self,
        outcome: &SubscriptionOutcome,
        current_url: &str,
    ) -> NextStep {
        let here = strip_query(current_url).to_string();
        let warning = |key: &str, params: &[(&str, &str)]| {
            Some(Notice::Warning(self.translator.translate_or_key(key, params)))
        };

        match outcome {
            SubscriptionOutcome::ValidationFailed(errors) => NextStep::Render(errors.clone()),
            SubscriptionOutcome::Subscribed { .. } => {
                match self.node_url(self.finish_node()) {
                    Some(location) => NextStep::Redirect {
                        location,
                        notice: None,
                    },
                    None => NextStep::Redirect {
                        location: here,
                        notice: Some(Notice::Success(
                            self.translator.translate_or_key(SUCCESS_KEY, &[]),
                        )),
                    },
                }
            }
            SubscriptionOutcome::AlreadySubscribed => NextStep::Redirect {
                location: here,
                notice: warning(EXISTS_KEY, &[]),
            },
            SubscriptionOutcome::ProviderError(message) => NextStep::Redirect {
                location: self
                    .node_url(self.error_node())
                    .unwrap_or(here),
                notice: warning(GENERAL_ERROR_KEY, &[("error", message.as_str())]),
            },
            SubscriptionOutcome::ProviderUnavailable => NextStep::Redirect {
                location: self
                    .node_url(self.error_node())
                    .unwrap_or(here),
                notice: warning(GENERAL_ERROR_KEY, &[("error", "unavailable")]),
            },
        }
    }

    /// Short html summary of the widget's properties, for the CMS node editor
    pub fn properties_preview(&self) -> String {
        let label = |key: &str| htmlescape::encode_minimal(&self.translator.translate_or_key(key, &[]));

        let (Some(api_key), Some(list_id)) = (self.api_key(), self.list_id()) else {
            return format!("<strong>{}</strong>", label("label.mailchimp.not.set"));
        };

        let mut preview = String::new();
        if let Some(title) = self.title() {
            preview.push_str(&format!(
                "<strong>{}</strong> {}<br/>",
                label("label.title"),
                htmlescape::encode_minimal(&title)
            ));
        }
        // enough to tell keys apart, not enough to use one
        let key = api_key.expose_secret();
        let masked = match key.char_indices().rev().nth(3) {
            Some((i, _)) => format!("****{}", &key[i..]),
            None => "****".to_string(),
        };
        preview.push_str(&format!(
            "<strong>{}</strong> {}<br/>",
            label("label.key.api"),
            htmlescape::encode_minimal(&masked)
        ));
        preview.push_str(&format!(
            "<strong>{}</strong> {}<br/>",
            label("label.id.list"),
            htmlescape::encode_minimal(&list_id)
        ));
        preview
    }
}
