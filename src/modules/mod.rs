pub mod books;

use std::sync::Arc;

use books_db::Database;
use books_kernel::ModuleRegistry;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, db: Arc<dyn Database>) {
    registry.register(books::create_module(db));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use books_db::{DbError, NamedParams, Row};
    use books_kernel::settings::Settings;
    use tower::ServiceExt;

    struct EmptyDatabase;

    #[async_trait::async_trait]
    impl Database for EmptyDatabase {
        async fn execute(&self, _sql: &str, _params: &NamedParams) -> Result<Vec<Row>, DbError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        register_all(&mut registry, Arc::new(EmptyDatabase));
        registry
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let app = books_http::build_router(&registry(), &Settings::default());
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn books_module_is_registered() {
        assert!(registry().get_module("books").is_some());
    }

    #[tokio::test]
    async fn unmatched_api_route_is_plain_404() {
        let (status, body) = get("/api/nonexistent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Error 404");
    }

    #[tokio::test]
    async fn book_route_requires_an_id_segment() {
        let (status, body) = get("/api/book/").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Error 404");

        let (status, _) = get("/api/book/1/extra").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn undecodable_book_id_renders_boom() {
        let (status, body) = get("/api/book/%FF").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "BOOM!");
    }

    #[tokio::test]
    async fn assembled_router_serves_books() {
        let (status, body) = get("/api/books").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"message":"All books sorted by title","books":null}"#
        );
    }
}
