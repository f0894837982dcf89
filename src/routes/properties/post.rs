use std::collections::HashMap;

use actix_web::web;
use actix_web::HttpResponse;
use actix_web_flash_messages::FlashMessage;

use super::PropertiesError;
use crate::startup::Coordinator;
use crate::utils::redirect;
use crate::widget::PropertiesForm;
use crate::widget::Widget;

/// `POST /properties`
///
/// Title (for the widget's locale), api key, list id, finish node and error
/// node. Api key and list id are required; a 400 leaves everything as it was.
pub async fn save_properties(
    form: web::Form<PropertiesForm>,
    widget: web::Data<Widget>,
) -> Result<HttpResponse, PropertiesError> {
    widget.save_properties(form.into_inner())?;

    FlashMessage::info("Properties saved.").send();
    Ok(redirect("/subscribe"))
}

/// `POST /properties/fields`
///
/// Body maps merge tags to a checkbox value (`on`, `1`, `true`, `yes` show the
/// field; anything else hides it). Tags that are left out keep their current
/// visibility, so the editor form should send an explicit `0` for unchecked
/// boxes.
#[tracing::instrument(name = "Saving field visibility", skip_all)]
pub async fn save_fields(
    form: web::Form<HashMap<String, String>>,
    widget: web::Data<Widget>,
    coordinator: web::Data<Coordinator>,
) -> Result<HttpResponse, PropertiesError> {
    let (api_key, list_id) = widget
        .credentials()
        .ok_or(PropertiesError::NotConfigured)?;

    let schema = coordinator
        .schema_cache()
        .update_visibility(&api_key, &list_id, &form.0)
        .await?;
    tracing::info!(
        %list_id,
        visible = schema.fields().iter().filter(|f| f.visible).count(),
        "field visibility saved"
    );

    FlashMessage::info("Field visibility saved.").send();
    Ok(redirect("/subscribe"))
}

/// `POST /properties/refresh`
///
/// Throws away the cached schema and fetches it again, e.g. after fields were
/// added in Mailchimp. Visibility flags come from Mailchimp's `public` again.
#[tracing::instrument(name = "Refreshing list schema", skip_all)]
pub async fn refresh_schema(
    widget: web::Data<Widget>,
    coordinator: web::Data<Coordinator>,
) -> Result<HttpResponse, PropertiesError> {
    let (api_key, list_id) = widget
        .credentials()
        .ok_or(PropertiesError::NotConfigured)?;

    coordinator
        .schema_cache()
        .get_schema(&api_key, &list_id, true)
        .await?;

    FlashMessage::info("List fields refreshed.").send();
    Ok(redirect("/subscribe"))
}
