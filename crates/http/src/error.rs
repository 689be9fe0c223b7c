//! Plain-text error pages for routing misses, extractor rejections, and
//! responses that carry no body.

use std::any::Any;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Text written for a failed request: `Error {status}` for the statuses the
/// service reports by name, `BOOM!` for anything else.
pub fn error_page_text(status: StatusCode) -> String {
    match status.as_u16() {
        403 | 404 | 500 | 503 => format!("Error {}", status.as_u16()),
        _ => "BOOM!".to_string(),
    }
}

/// A plain-text error response.
#[derive(Debug, Clone, Copy)]
pub struct ErrorPage {
    status: StatusCode,
}

impl ErrorPage {
    pub fn new(status: StatusCode) -> Self {
        Self { status }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (self.status, error_page_text(self.status)).into_response()
    }
}

/// Default handler for unmatched routes.
pub async fn not_found() -> ErrorPage {
    ErrorPage::new(StatusCode::NOT_FOUND)
}

/// Replace any 4xx/5xx response that is not a JSON envelope with its error page.
///
/// Empty bodies and framework rejection text (bad path encoding, oversized
/// bodies) both end up here.
pub async fn render_error_pages(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if (status.is_client_error() || status.is_server_error()) && !is_json(&response) {
        tracing::debug!(status = %status.as_u16(), "rendering error page");
        return ErrorPage::new(status).into_response();
    }

    response
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Response for a handler that panicked.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = %detail, "request handler panicked");
    ErrorPage::new(StatusCode::INTERNAL_SERVER_ERROR).into_response()
}
