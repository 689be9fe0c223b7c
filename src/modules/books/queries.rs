//! SQL issued by the books handlers. Each statement returns its result already
//! encoded as JSON in a single column.

/// All books ordered by title, as one JSON array in column `json`.
/// The aggregate of an empty table is NULL.
pub const LIST_BOOKS: &str = "\
SELECT json_agg(b ORDER BY b.title) AS json \
FROM (SELECT bookid, title, book_info FROM books) AS b";

/// The book whose id matches `:book_id`, as one JSON object in column `json`.
/// The id is compared as text so any path segment is a valid lookup key.
/// The cast keeps the primary-key index out of the plan; every lookup scans the table.
pub const GET_BOOK: &str = "\
SELECT row_to_json(b) AS json \
FROM (SELECT bookid, title, book_info FROM books WHERE bookid::text = :book_id) AS b";

/// Insert a book and return it as one JSON object in column `book`.
pub const INSERT_BOOK: &str = "\
INSERT INTO public.books (title, book_info) VALUES (:book_title, :book_info) \
RETURNING json_build_object('bookid', bookid, 'title', title, 'book_info', book_info) AS book";
