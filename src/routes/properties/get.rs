use actix_web::http::header::ContentType;
use actix_web::web;
use actix_web::HttpResponse;

use crate::widget::Widget;

/// `GET /properties/preview`
pub async fn properties_preview(widget: web::Data<Widget>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(widget.properties_preview())
}
