use std::collections::HashMap;

use super::FieldType;
use super::ListSchema;
use super::EMAIL_TAG;
use crate::collaborators::Translator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Email,
    Text,
}

/// One input of the rendered signup form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Form input name; always the merge field tag
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub default_value: Option<String>,
}

impl FieldSpec {
    pub fn is_email(&self) -> bool { self.name == EMAIL_TAG }
}

/// `label.mailchimp.first_name` for a field called "First Name"
fn label_key(display_name: &str) -> String {
    format!(
        "label.mailchimp.{}",
        display_name.to_lowercase().replace(' ', "_")
    )
}

/// Form definition for a list: the mandatory email input first, then every
/// visible text/email merge field in schema order. `defaults` (usually the
/// query string) pre-fills inputs by tag.
///
/// Labels fall back to the raw tag when there is no translation; a missing
/// translation should never keep the form from rendering.
pub fn build_form_spec(
    schema: &ListSchema,
    translator: &dyn Translator,
    defaults: &HashMap<String, String>,
) -> Vec<FieldSpec> {
    let email = FieldSpec {
        name: EMAIL_TAG.to_string(),
        label: translator
            .translate("label.mailchimp.email", &[])
            .unwrap_or_else(|| EMAIL_TAG.to_string()),
        kind: FieldKind::Email,
        required: true,
        default_value: defaults.get(EMAIL_TAG).cloned(),
    };

    let merge_fields = schema
        .fields()
        .iter()
        // the list's own EMAIL field is the one prepended above
        .filter(|f| f.visible && f.field_type.is_renderable() && f.tag != EMAIL_TAG)
        .map(|f| FieldSpec {
            name: f.tag.clone(),
            label: translator
                .translate(&label_key(&f.display_name), &[])
                .unwrap_or_else(|| f.tag.clone()),
            kind: match f.field_type {
                FieldType::Email => FieldKind::Email,
                _ => FieldKind::Text,
            },
            required: f.required,
            default_value: defaults.get(&f.tag).cloned(),
        });

    std::iter::once(email).chain(merge_fields).collect()
}
