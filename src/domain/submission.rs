use std::collections::BTreeMap;
use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

use super::FieldKind;
use super::FieldSpec;
use super::SubscriberEmail;

/// Mailchimp truncates text merge fields beyond this
const MAX_TEXT_LEN: usize = 255;

/// tag -> message, ordered so re-rendered forms list errors stably
pub type FieldErrors = BTreeMap<String, String>;

/// Validated submission, ready to be sent to Mailchimp. `merge_fields` never
/// contains the email tag, and only contains tags present in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub email: SubscriberEmail,
    pub merge_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    /// Expected business outcome, not an error; nothing was written
    AlreadySubscribed,
    Subscribed { double_opt_in: bool },
    ValidationFailed(FieldErrors),
    /// Mailchimp answered, but not with anything we can act on. The message is
    /// Mailchimp's own, or "unknown".
    ProviderError(String),
    /// Mailchimp could not be reached (or timed out)
    ProviderUnavailable,
}

fn check_field(
    field: &FieldSpec,
    value: &str,
) -> Result<(), String> {
    if value.trim().is_empty() {
        return match field.required {
            true => Err("This field is required".to_string()),
            false => Ok(()),
        };
    }
    match field.kind {
        FieldKind::Email => SubscriberEmail::parse(value.to_string()).map(|_| ()),
        FieldKind::Text if value.graphemes(true).count() > MAX_TEXT_LEN => Err(format!(
            "Must be at most {MAX_TEXT_LEN} characters"
        )),
        FieldKind::Text => Ok(()),
    }
}

/// Check `submitted` against the form and split it into the address and the
/// merge fields. Blank optional values are left out rather than sent as empty
/// strings; keys the form doesn't know about are dropped.
pub fn validate_submission(
    form: &[FieldSpec],
    submitted: &HashMap<String, String>,
) -> Result<SubscriptionRequest, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut email = None;
    let mut merge_fields = BTreeMap::new();

    for field in form {
        let value = submitted
            .get(&field.name)
            .map(String::as_str)
            .unwrap_or_default();

        if let Err(e) = check_field(field, value) {
            errors.insert(field.name.clone(), e);
            continue;
        }

        if field.is_email() {
            // required, so non-empty if we got here
            email = SubscriberEmail::parse(value.to_string()).ok();
        } else if !value.trim().is_empty() {
            merge_fields.insert(field.name.clone(), value.trim().to_string());
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    match email {
        Some(email) => Ok(SubscriptionRequest {
            email,
            merge_fields,
        }),
        // only possible with a hand-built form lacking the email input
        None => Err(FieldErrors::from([(
            super::EMAIL_TAG.to_string(),
            "This field is required".to_string(),
        )])),
    }
}
