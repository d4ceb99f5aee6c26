//! Demo Catalog Module
//!
//! A tiny book catalog whose tables are guarded by [`Tracked`], used by the
//! HTTP adapter to exercise dependency tracking end to end.

use serde::Serialize;

use crate::cache::{ExecutionTracker, Tracked};
use crate::error::{CacheError, Result};

// == Constraint Names ==
pub const BOOKS: &str = "constraint:db.books";
pub const AUTHORS: &str = "constraint:db.author";
pub const LANGUAGES: &str = "constraint:db.languages";
pub const STORES: &str = "constraint:db.stores";

// == Rows ==
#[derive(Debug, Clone)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Language {
    pub id: String,
    pub lan: String,
}

#[derive(Debug, Clone)]
pub struct Store {
    pub id: String,
    pub city: String,
    pub books: Vec<String>,
}

// == Query ==
/// Which nested fields of each book to resolve.
///
/// Unselected fields are never resolved, so their tables are never recorded
/// as dependencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookQuery {
    pub author: bool,
    pub languages: bool,
    pub stores: bool,
}

impl BookQuery {
    /// Parses a comma-separated field list such as `author,stores`.
    pub fn parse(fields: &str) -> Result<Self> {
        let mut query = Self::default();
        for field in fields.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match field {
                "author" => query.author = true,
                "languages" => query.languages = true,
                "stores" => query.stores = true,
                other => {
                    return Err(CacheError::InvalidRequest(format!(
                        "Unknown book field '{}'",
                        other
                    )))
                }
            }
        }
        Ok(query)
    }

    /// Canonical cache key, independent of field order in the request.
    ///
    /// A session id makes the key private to that session.
    pub fn cache_key(&self, session: Option<&str>) -> String {
        let selected: Vec<&str> = [
            (self.author, "author"),
            (self.languages, "languages"),
            (self.stores, "stores"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect();

        let query = format!("books?fields={}", selected.join(","));
        match session {
            Some(id) => format!("session:{}:{}", id, query),
            None => query,
        }
    }
}

// == Views ==
#[derive(Debug, Clone, Serialize)]
pub struct StoreView {
    pub id: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<Language>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stores: Option<Vec<StoreView>>,
}

// == Catalog ==
#[derive(Debug, Clone)]
pub struct Catalog {
    books: Tracked<Vec<Book>>,
    authors: Tracked<Vec<Author>>,
    languages: Tracked<Vec<Language>>,
    stores: Tracked<Vec<Store>>,
}

impl Catalog {
    /// The fixed demo dataset: two books, two authors, two languages, one store.
    pub fn demo() -> Self {
        let books = vec![
            book("b1", "Book 1", "a1", &["l1"]),
            book("b2", "Book 2", "a2", &["l1", "l2"]),
        ];
        let authors = vec![author("a1", "Author 1"), author("a2", "Author 2")];
        let languages = vec![language("l1", "Language 1"), language("l2", "Language 2")];
        let stores = vec![Store {
            id: "s1".to_string(),
            city: "City 1".to_string(),
            books: vec!["b1".to_string(), "b2".to_string()],
        }];

        Self {
            books: Tracked::new(BOOKS, books),
            authors: Tracked::new(AUTHORS, authors),
            languages: Tracked::new(LANGUAGES, languages),
            stores: Tracked::new(STORES, stores),
        }
    }

    // == Resolve ==
    /// Resolves every book with the selected nested fields, recording each
    /// table read into `tracker`.
    pub fn resolve_books(&self, query: &BookQuery, tracker: &ExecutionTracker) -> Vec<BookView> {
        self.books
            .read(tracker)
            .iter()
            .map(|book| BookView {
                id: book.id.clone(),
                title: book.title.clone(),
                author: query
                    .author
                    .then(|| self.author_of(book, tracker))
                    .flatten(),
                languages: query
                    .languages
                    .then(|| self.languages_of(book, tracker)),
                stores: query.stores.then(|| self.stores_of(book, tracker)),
            })
            .collect()
    }

    fn author_of(&self, book: &Book, tracker: &ExecutionTracker) -> Option<Author> {
        self.authors
            .read(tracker)
            .iter()
            .find(|a| a.id == book.author)
            .cloned()
    }

    fn languages_of(&self, book: &Book, tracker: &ExecutionTracker) -> Vec<Language> {
        let languages = self.languages.read(tracker);
        book.languages
            .iter()
            .filter_map(|id| languages.iter().find(|l| &l.id == id).cloned())
            .collect()
    }

    fn stores_of(&self, book: &Book, tracker: &ExecutionTracker) -> Vec<StoreView> {
        self.stores
            .read(tracker)
            .iter()
            .filter(|s| s.books.contains(&book.id))
            .map(|s| StoreView {
                id: s.id.clone(),
                city: s.city.clone(),
            })
            .collect()
    }
}

fn book(id: &str, title: &str, author: &str, languages: &[&str]) -> Book {
    Book {
        id: id.to_string(),
        title: title.to_string(),
        author: author.to_string(),
        languages: languages.iter().map(|l| l.to_string()).collect(),
    }
}

fn author(id: &str, name: &str) -> Author {
    Author {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn language(id: &str, lan: &str) -> Language {
    Language {
        id: id.to_string(),
        lan: lan.to_string(),
    }
}
