use std::collections::HashMap;

use actix_web::http::header::ContentType;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web_flash_messages::FlashMessage;

use super::get::current_form;
use super::render_widget;
use super::WidgetView;
use crate::startup::Coordinator;
use crate::utils::redirect;
use crate::widget::NextStep;
use crate::widget::Notice;
use crate::widget::Widget;

/// `POST /subscribe`
///
/// Body is the urlencoded form, keyed by merge tag. Invalid input re-renders
/// the form (400); everything else ends in a 303 with a flash message, so a
/// reload never resubmits.
#[tracing::instrument(name = "Handling subscription form", skip_all)]
pub async fn subscribe(
    request: HttpRequest,
    form: web::Form<HashMap<String, String>>,
    widget: web::Data<Widget>,
    coordinator: web::Data<Coordinator>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some((api_key, list_id)) = widget.credentials() else {
        return Ok(HttpResponse::Ok().finish());
    };
    let submitted = form.into_inner();
    let spec = current_form(&widget, &coordinator, &HashMap::new()).await?;

    let outcome = coordinator
        .submit(&api_key, &list_id, &spec, &submitted)
        .await;
    let current_url = request.uri().to_string();

    match widget.next_step(&outcome, &current_url) {
        NextStep::Render(errors) => {
            let body = render_widget(WidgetView {
                title: widget.title(),
                action: &current_url,
                form: &spec,
                values: &submitted,
                errors: &errors,
                notices: vec![],
                submit_label: widget
                    .translator()
                    .translate_or_key("button.subscribe", &[]),
            });
            Ok(HttpResponse::BadRequest()
                .content_type(ContentType::html())
                .body(body))
        }
        NextStep::Redirect { location, notice } => {
            match notice {
                Some(Notice::Success(msg)) => FlashMessage::success(msg).send(),
                Some(Notice::Warning(msg)) => FlashMessage::warning(msg).send(),
                None => {}
            }
            Ok(redirect(&location))
        }
    }
}
