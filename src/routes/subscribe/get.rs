use std::collections::HashMap;

use actix_web::http::header::ContentType;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web_flash_messages::IncomingFlashMessages;
use actix_web_flash_messages::Level;

use super::render_widget;
use super::WidgetView;
use crate::domain::build_form_spec;
use crate::domain::FieldErrors;
use crate::domain::FieldSpec;
use crate::domain::ListSchema;
use crate::schema_cache::SchemaCacheError;
use crate::startup::Coordinator;
use crate::utils::error_500;
use crate::widget::Widget;

/// Form for the list's current schema. If Mailchimp can't be reached and
/// nothing is cached, visitors still get an email-only form.
pub(super) async fn current_form(
    widget: &Widget,
    coordinator: &Coordinator,
    defaults: &HashMap<String, String>,
) -> Result<Vec<FieldSpec>, actix_web::Error> {
    let Some((api_key, list_id)) = widget.credentials() else {
        return Ok(vec![]);
    };
    match coordinator
        .form_spec(&api_key, &list_id, widget.translator(), defaults)
        .await
    {
        Ok(form) => Ok(form),
        Err(SchemaCacheError::ProviderUnavailable(e)) => {
            tracing::warn!(
                error.cause_chain = ?e,
                error.message = %e,
                %list_id,
                "schema unavailable, falling back to email only"
            );
            Ok(build_form_spec(&ListSchema::default(), widget.translator(), defaults))
        }
        Err(e) => Err(error_500(e)),
    }
}

/// `GET /subscribe`
///
/// Query parameters named after merge tags pre-fill the form, e.g.
/// `/subscribe?FNAME=Ann`. Renders nothing until both api key and list id are
/// set.
pub async fn subscribe_form(
    request: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    widget: web::Data<Widget>,
    coordinator: web::Data<Coordinator>,
    flash_messages: IncomingFlashMessages,
) -> Result<HttpResponse, actix_web::Error> {
    if widget.credentials().is_none() {
        return Ok(HttpResponse::Ok().finish());
    }

    let form = current_form(&widget, &coordinator, &query.0).await?;

    let notices = flash_messages
        .iter()
        .map(|m| {
            let class = match m.level() {
                Level::Success => "success",
                Level::Warning | Level::Error => "warning",
                _ => "info",
            };
            (class, m.content().to_string())
        })
        .collect();

    let body = render_widget(WidgetView {
        title: widget.title(),
        action: &request.uri().to_string(),
        form: &form,
        values: &HashMap::new(),
        errors: &FieldErrors::new(),
        notices,
        submit_label: widget
            .translator()
            .translate_or_key("button.subscribe", &[]),
    });

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}
