use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::server::paths::ResolveError;

/// Per-request failures, translated to an HTTP status with a short
/// plain-text body at the handler boundary.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("Not found")]
    NotFound,
    #[error("Access denied")]
    AccessDenied,
    #[error("{context}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render page")]
    Template(#[from] tera::Error),
}

impl ServeError {
    /// Adapter for `map_err` on filesystem calls: the body carries `context`,
    /// the underlying cause only goes to the log.
    pub fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> ServeError {
        move |source| ServeError::Io { context, source }
    }
}

impl From<ResolveError> for ServeError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotFound => ServeError::NotFound,
            ResolveError::AccessDenied => ServeError::AccessDenied,
        }
    }
}

impl ResponseError for ServeError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServeError::NotFound => StatusCode::NOT_FOUND,
            ServeError::AccessDenied => StatusCode::FORBIDDEN,
            ServeError::Io { .. } | ServeError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServeError::Io { context, source } => log::warn!("{}: {}", context, source),
            ServeError::Template(err) => log::error!("Template rendering failed: {}", err),
            _ => {}
        }

        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}
