use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use books_db::{Database, NamedParams, ParamValue, Row};
use serde_json::{json, Value};

use super::models::{BookEnvelope, BooksEnvelope, NewBook};
use super::queries;

const LOOKUP_FAILED: &str = "Error: no book with that id exists";

/// Shared handler state: the pool handle built at startup.
#[derive(Clone)]
pub struct BooksState {
    db: Arc<dyn Database>,
}

impl BooksState {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

/// `GET /api/books`
pub async fn list_books(State(state): State<BooksState>) -> Response {
    match state.db.execute(queries::LIST_BOOKS, &NamedParams::new()).await {
        Ok(rows) => books_response(
            StatusCode::OK,
            "All books sorted by title",
            single_value(rows, "json"),
        ),
        Err(err) => {
            tracing::error!(error = %err, "failed to list books");
            books_response(StatusCode::INTERNAL_SERVER_ERROR, "Error getting books", json!([]))
        }
    }
}

/// `POST /api/books`
pub async fn create_book(State(state): State<BooksState>, body: Bytes) -> Response {
    if body.is_empty() {
        return book_response(StatusCode::OK, "Book data is missing", json!({}));
    }

    let parsed: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "rejected book payload that is not JSON");
            return book_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error: Book data is not in valid JSON format",
                json!({}),
            );
        }
    };

    let Some(new_book) = NewBook::from_json(parsed) else {
        return book_response(
            StatusCode::OK,
            "Error: book data is missing title, no book was created",
            json!({}),
        );
    };

    let params = NamedParams::new()
        .bind("book_title", title_param(new_book.title))
        .bind("book_info", ParamValue::Json(new_book.book_info));

    match state.db.execute(queries::INSERT_BOOK, &params).await {
        Ok(rows) => {
            let book = single_value(rows, "book");
            tracing::info!(book = %book, "book added");
            book_response(StatusCode::CREATED, "Book added", book)
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to insert book");
            book_response(StatusCode::INTERNAL_SERVER_ERROR, LOOKUP_FAILED, json!({}))
        }
    }
}

/// `GET /api/book/{id}`
pub async fn get_book(State(state): State<BooksState>, Path(id): Path<String>) -> Response {
    let params = NamedParams::new().bind("book_id", id.as_str());

    match state.db.execute(queries::GET_BOOK, &params).await {
        Ok(rows) => book_response(
            StatusCode::OK,
            &format!("Book with id {}", id),
            single_value(rows, "json"),
        ),
        Err(err) => {
            tracing::error!(error = %err, book_id = %id, "failed to fetch book");
            book_response(StatusCode::INTERNAL_SERVER_ERROR, LOOKUP_FAILED, json!({}))
        }
    }
}

/// Strings bind as text, anything else as its JSON text.
fn title_param(title: Value) -> ParamValue {
    match title {
        Value::String(s) => ParamValue::Text(s),
        other => ParamValue::Text(other.to_string()),
    }
}

/// The named column of the first row; null when the query matched nothing.
fn single_value(rows: Vec<Row>, column: &str) -> Value {
    rows.into_iter()
        .next()
        .and_then(|mut row| row.take(column))
        .unwrap_or(Value::Null)
}

fn books_response(status: StatusCode, message: &str, books: Value) -> Response {
    let envelope = BooksEnvelope {
        message: message.to_string(),
        books,
    };
    (status, Json(envelope)).into_response()
}

fn book_response(status: StatusCode, message: &str, book: Value) -> Response {
    let envelope = BookEnvelope {
        message: message.to_string(),
        book,
    };
    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use axum::{body::Body, http::Request, Router};
    use books_db::DbError;
    use tower::ServiceExt;

    use crate::modules::books::BooksModule;
    use books_kernel::Module;

    type Call = (String, NamedParams);

    /// Replays scripted results and records every statement it receives.
    #[derive(Default)]
    struct StubDatabase {
        results: Mutex<VecDeque<Result<Vec<Row>, DbError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl StubDatabase {
        fn returning(results: Vec<Result<Vec<Row>, DbError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                calls: Mutex::default(),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Database for StubDatabase {
        async fn execute(&self, sql: &str, params: &NamedParams) -> Result<Vec<Row>, DbError> {
            self.calls
                .lock()
                .unwrap()
                .push((sql.to_string(), params.clone()));
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn json_row(column: &str, value: Value) -> Vec<Row> {
        vec![Row::new(vec![(column.to_string(), value)])]
    }

    fn db_failure() -> DbError {
        DbError::Timeout(Duration::from_millis(5))
    }

    fn app(db: Arc<StubDatabase>) -> Router {
        BooksModule::new(db).routes()
    }

    async fn send(router: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn list_returns_books_in_envelope() {
        let books = json!([
            {"bookid": 2, "title": "Anna Karenina", "book_info": {}},
            {"bookid": 1, "title": "Dune", "book_info": {"pages": 412}}
        ]);
        let db = StubDatabase::returning(vec![Ok(json_row("json", books.clone()))]);

        let (status, body) = send(app(db.clone()), "GET", "/api/books", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "All books sorted by title", "books": books})
        );
        let calls = db.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, queries::LIST_BOOKS);
        assert!(calls[0].1.is_empty());
    }

    #[tokio::test]
    async fn list_of_empty_table_passes_null_through() {
        let db = StubDatabase::returning(vec![Ok(json_row("json", Value::Null))]);
        let (status, body) = send(app(db), "GET", "/api/books", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["books"], Value::Null);
    }

    #[tokio::test]
    async fn list_failure_is_500_with_empty_books() {
        let db = StubDatabase::returning(vec![Err(db_failure())]);
        let (status, body) = send(app(db), "GET", "/api/books", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"message": "Error getting books", "books": []}));
    }

    #[tokio::test]
    async fn repeated_list_is_identical() {
        let books = json!([{"bookid": 1, "title": "Dune", "book_info": {}}]);
        let db = StubDatabase::returning(vec![
            Ok(json_row("json", books.clone())),
            Ok(json_row("json", books)),
        ]);
        let first = send(app(db.clone()), "GET", "/api/books", "").await;
        let second = send(app(db), "GET", "/api/books", "").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn create_with_empty_body_is_200_and_skips_database() {
        let db = StubDatabase::returning(vec![]);
        let (status, body) = send(app(db.clone()), "POST", "/api/books", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Book data is missing", "book": {}}));
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn create_with_invalid_json_is_500() {
        let db = StubDatabase::returning(vec![]);
        let (status, body) = send(app(db.clone()), "POST", "/api/books", "not json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"message": "Error: Book data is not in valid JSON format", "book": {}})
        );
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn create_without_title_is_200_and_skips_database() {
        let db = StubDatabase::returning(vec![]);
        let (status, body) = send(
            app(db.clone()),
            "POST",
            "/api/books",
            r#"{"book_info":{"x":1}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Error: book data is missing title, no book was created", "book": {}})
        );
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn create_with_null_title_is_200_and_skips_database() {
        let db = StubDatabase::returning(vec![]);
        let (status, body) = send(
            app(db.clone()),
            "POST",
            "/api/books",
            r#"{"title":null,"book_info":{"x":1}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Error: book data is missing title, no book was created", "book": {}})
        );
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn create_with_non_object_json_counts_as_missing_title() {
        let db = StubDatabase::returning(vec![]);
        let (status, body) = send(app(db.clone()), "POST", "/api/books", "[1, 2]").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["book"], json!({}));
        assert!(db.calls().is_empty());
    }

    #[tokio::test]
    async fn create_inserts_and_returns_201() {
        let created = json!({"bookid": 7, "title": "Dune", "book_info": {}});
        let db = StubDatabase::returning(vec![Ok(json_row("book", created.clone()))]);

        let (status, body) = send(app(db.clone()), "POST", "/api/books", r#"{"title":"Dune"}"#).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"message": "Book added", "book": created}));

        let calls = db.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, queries::INSERT_BOOK);
        assert_eq!(
            calls[0].1,
            NamedParams::new()
                .bind("book_title", "Dune")
                .bind("book_info", json!({}))
        );
    }

    #[tokio::test]
    async fn create_binds_non_string_title_as_text() {
        let db = StubDatabase::returning(vec![Ok(json_row("book", json!({})))]);
        send(
            app(db.clone()),
            "POST",
            "/api/books",
            r#"{"title":1984,"book_info":{"author":"Orwell"}}"#,
        )
        .await;
        let calls = db.calls();
        assert_eq!(calls[0].1.get("book_title"), Some(&ParamValue::Text("1984".into())));
        assert_eq!(
            calls[0].1.get("book_info"),
            Some(&ParamValue::Json(json!({"author": "Orwell"})))
        );
    }

    #[tokio::test]
    async fn create_failure_is_500_with_fixed_message() {
        let db = StubDatabase::returning(vec![Err(db_failure())]);
        let (status, body) = send(app(db), "POST", "/api/books", r#"{"title":"Dune"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"message": "Error: no book with that id exists", "book": {}})
        );
    }

    #[tokio::test]
    async fn get_returns_matching_book() {
        let book = json!({"bookid": 3, "title": "Emma", "book_info": {"year": 1815}});
        let db = StubDatabase::returning(vec![Ok(json_row("json", book.clone()))]);

        let (status, body) = send(app(db.clone()), "GET", "/api/book/3", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Book with id 3", "book": book}));
        let calls = db.calls();
        assert_eq!(calls[0].0, queries::GET_BOOK);
        assert_eq!(calls[0].1.get("book_id"), Some(&ParamValue::Text("3".into())));
    }

    #[tokio::test]
    async fn get_passes_database_key_order_through() {
        let book = json!({"bookid": 3, "title": "Emma", "book_info": {"year": 1815}});
        let db = StubDatabase::returning(vec![Ok(json_row("json", book))]);

        let request = Request::builder()
            .uri("/api/book/3")
            .body(Body::empty())
            .unwrap();
        let response = app(db).oneshot(request).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"message":"Book with id 3","book":{"bookid":3,"title":"Emma","book_info":{"year":1815}}}"#
        );
    }

    #[tokio::test]
    async fn get_without_match_returns_null_book() {
        let db = StubDatabase::returning(vec![Ok(Vec::new())]);
        let (status, body) = send(app(db), "GET", "/api/book/nonexistent-id", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Book with id nonexistent-id", "book": null})
        );
    }

    #[tokio::test]
    async fn get_failure_is_500() {
        let db = StubDatabase::returning(vec![Err(db_failure())]);
        let (status, body) = send(app(db), "GET", "/api/book/3", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"message": "Error: no book with that id exists", "book": {}})
        );
    }
}
