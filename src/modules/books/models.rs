use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A persisted book, shaped the way the database encodes it as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Database-assigned identifier
    pub bookid: i32,
    /// Title of the book
    pub title: String,
    /// Free-form JSON document; no schema is enforced
    #[serde(default = "empty_object")]
    pub book_info: Value,
}

/// Fields accepted when creating a book.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    /// Whatever JSON value the client sent as `title`
    pub title: Value,
    /// Defaults to `{}` when the client omits it
    pub book_info: Value,
}

impl NewBook {
    /// Extract a new book from a parsed request body.
    ///
    /// Returns `None` when the body is not an object or its `title` is absent
    /// or null.
    pub fn from_json(body: Value) -> Option<Self> {
        let Value::Object(mut fields) = body else {
            return None;
        };
        let title = fields.remove("title").filter(|title| !title.is_null())?;
        let book_info = fields.remove("book_info").unwrap_or_else(empty_object);
        Some(Self { title, book_info })
    }
}

/// Response envelope for the books collection.
#[derive(Debug, Clone, Serialize)]
pub struct BooksEnvelope {
    pub message: String,
    pub books: Value,
}

/// Response envelope for a single book.
#[derive(Debug, Clone, Serialize)]
pub struct BookEnvelope {
    pub message: String,
    pub book: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
