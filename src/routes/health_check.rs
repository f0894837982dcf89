use actix_web::HttpResponse;

/// `GET /health_check`; 200 with an empty body, as long as the server is up.
/// Mailchimp is not contacted.
pub async fn health_check() -> HttpResponse { HttpResponse::Ok().finish() }
