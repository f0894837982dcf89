//! Endpoints behind the CMS node editor. There is no authentication here: the
//! host is expected to only route editors to `/properties`.

mod get;
mod post;
pub use get::*;
pub use post::*;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use actix_web::ResponseError;

use crate::schema_cache::SchemaCacheError;
use crate::utils::error_chain_fmt;
use crate::widget::MissingProperties;

#[derive(thiserror::Error)]
pub enum PropertiesError {
    #[error("The api key and list id must be set first.")]
    NotConfigured,
    #[error(transparent)]
    Invalid(#[from] MissingProperties),
    #[error("Mailchimp is unavailable, try again later.")]
    Unavailable(#[source] SchemaCacheError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PropertiesError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<SchemaCacheError> for PropertiesError {
    fn from(e: SchemaCacheError) -> Self {
        match e {
            SchemaCacheError::ProviderUnavailable(_) => Self::Unavailable(e),
            SchemaCacheError::UnexpectedError(e) => Self::UnexpectedError(e),
        }
    }
}

impl ResponseError for PropertiesError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotConfigured => StatusCode::CONFLICT,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // the cause chain only goes to the logs
        let body = match self {
            Self::UnexpectedError(_) => "Something went wrong.".to_string(),
            e => e.to_string(),
        };
        HttpResponse::build(self.status_code()).body(body)
    }
}
