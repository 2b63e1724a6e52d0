use std::sync::Arc;

use dantic::ModelError;
use dantic::SchemaModel;
use tokio::sync::RwLock;

use crate::models::{Book, BookQuery, BookUpdate, NewBook};

/// In-memory catalogue shared by every handler.
#[derive(Clone, Default)]
pub struct BookService {
    books: Arc<RwLock<Vec<Book>>>,
}

impl BookService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn list(&self, query: &BookQuery) -> Vec<Book> {
        self.books
            .read()
            .await
            .iter()
            .filter(|b| query.title.as_ref().is_none_or(|t| b.title.contains(t.as_str())))
            .filter(|b| query.max_price.is_none_or(|max| b.price <= max))
            .filter(|b| query.shelf.is_none() || b.shelf == query.shelf)
            .cloned()
            .collect()
    }

    pub async fn create(&self, new: &NewBook) -> Result<Book, ModelError> {
        let mut books = self.books.write().await;
        let mut book = Book {
            id: books.len() as u64 + 1,
            ..Book::default()
        };
        new.populate(&mut book)?;
        books.push(book.clone());
        tracing::info!(id = book.id, title = %book.title, "book created");
        Ok(book)
    }

    pub async fn update(&self, update: &BookUpdate) -> Option<Book> {
        let mut books = self.books.write().await;
        let book = books.iter_mut().find(|b| b.id == update.id)?;
        if let Some(title) = &update.title {
            book.title = title.trim().to_string();
        }
        if let Some(shelf) = update.shelf {
            book.shelf = Some(shelf);
        }
        Some(book.clone())
    }

    pub async fn reprice(&self, id: u64, price: i64) -> Option<Book> {
        let mut books = self.books.write().await;
        let book = books.iter_mut().find(|b| b.id == id)?;
        book.price = price;
        Some(book.clone())
    }
}
