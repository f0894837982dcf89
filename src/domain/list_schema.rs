use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

use crate::mailchimp_client::MergeFieldRecord;

/// Tag Mailchimp reserves for the subscriber's address. Every list has it, and
/// it never takes part in visibility toggling or merge fields.
pub const EMAIL_TAG: &str = "EMAIL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Date,
    /// number, address, phone, dropdown, ... kept in the schema, never rendered
    #[serde(other)]
    Other,
}

impl FieldType {
    /// Only these become form inputs
    pub fn is_renderable(&self) -> bool { matches!(self, Self::Text | Self::Email) }
}

/// A single merge field of a list, as last fetched from Mailchimp (plus local
/// visibility edits). Identified by `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListField {
    pub tag: String,
    pub display_name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub visible: bool,
}

impl From<MergeFieldRecord> for ListField {
    // flags are copied verbatim; Mailchimp calls visibility `public`
    fn from(record: MergeFieldRecord) -> Self {
        Self {
            tag: record.tag,
            display_name: record.name,
            field_type: record.field_type,
            required: record.required,
            visible: record.public,
        }
    }
}

/// Ordered merge fields of one list. Stored as a single JSON document, so a
/// refresh can never leave half of an old schema behind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListSchema(Vec<ListField>);

impl ListSchema {
    pub fn new(fields: Vec<ListField>) -> Self { Self(fields) }

    pub fn fields(&self) -> &[ListField] { &self.0 }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn field(
        &self,
        tag: &str,
    ) -> Option<&ListField> {
        self.0.iter().find(|f| f.tag == tag)
    }
}

impl FromIterator<ListField> for ListSchema {
    fn from_iter<I: IntoIterator<Item = ListField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Checkbox-ish values coming from the properties form
fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// Apply the visibility toggles of the properties form. Tags missing from
/// `submitted` keep their current visibility. `EMAIL` and required fields are
/// always left alone, since Mailchimp rejects members without them.
pub fn sync_visibility(
    schema: ListSchema,
    submitted: &HashMap<String, String>,
) -> ListSchema {
    schema
        .0
        .into_iter()
        .map(|mut field| {
            if field.tag != EMAIL_TAG && !field.required {
                if let Some(value) = submitted.get(&field.tag) {
                    field.visible = truthy(value);
                }
            }
            field
        })
        .collect()
}
