mod get;
mod post;
pub use get::*;
pub use post::*;

use std::collections::HashMap;

use htmlescape::encode_attribute;
use htmlescape::encode_minimal;

use crate::domain::FieldErrors;
use crate::domain::FieldKind;
use crate::domain::FieldSpec;

/// Everything the widget template needs
pub struct WidgetView<'a> {
    pub title: Option<String>,
    /// Form posts back to the page it was rendered on, query string included
    pub action: &'a str,
    pub form: &'a [FieldSpec],
    /// Submitted values win over the field defaults
    pub values: &'a HashMap<String, String>,
    pub errors: &'a FieldErrors,
    /// (css class, text)
    pub notices: Vec<(&'static str, String)>,
    pub submit_label: String,
}

fn render_field(
    field: &FieldSpec,
    value: &str,
    error: Option<&String>,
) -> String {
    let input_type = match field.kind {
        FieldKind::Email => "email",
        FieldKind::Text => "text",
    };
    let required = match field.required {
        true => " required",
        false => "",
    };
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, encode_minimal(e)))
        .unwrap_or_default();
    let name = encode_attribute(&field.name);
    format!(
        r#"
      <label for="{name}">{label}</label>
      <input type="{input_type}" id="{name}" name="{name}" value="{value}"{required} />
      {error}"#,
        label = encode_minimal(&field.label),
        value = encode_attribute(value),
    )
}

// we only ever emit a handful of inputs, so a template engine would be
// overkill; every interpolated value is escaped
pub fn render_widget(view: WidgetView) -> String {
    let notices: String = view
        .notices
        .iter()
        .map(|(class, text)| format!(r#"<p class="{class}"><i>{}</i></p>"#, encode_minimal(text)))
        .collect::<Vec<_>>()
        .join("\n");

    let title = view
        .title
        .as_deref()
        .map(|t| format!("<h2>{}</h2>", encode_minimal(t)))
        .unwrap_or_default();

    let fields: String = view
        .form
        .iter()
        .map(|f| {
            let value = view
                .values
                .get(&f.name)
                .or(f.default_value.as_ref())
                .map(String::as_str)
                .unwrap_or_default();
            render_field(f, value, view.errors.get(&f.name))
        })
        .collect();

    format!(
        r#"<div class="widget mailchimp-subscribe">
  {title}
  {notices}
  <form action="{action}" method="post">{fields}
    <button type="submit">{submit}</button>
  </form>
</div>
"#,
        action = encode_attribute(view.action),
        submit = encode_minimal(&view.submit_label),
    )
}
