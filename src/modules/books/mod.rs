pub mod handlers;
pub mod models;
pub mod queries;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use books_db::Database;
use books_kernel::{InitCtx, Module};

use handlers::BooksState;

/// Books module: list, fetch and create rows in the `books` table
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self {
            state: BooksState::new(db),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route(
                "/api/books",
                get(handlers::list_books).post(handlers::create_book),
            )
            .route("/api/book/{id}", get(handlers::get_book))
            .with_state(self.state.clone())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(db: Arc<dyn Database>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(db))
}
