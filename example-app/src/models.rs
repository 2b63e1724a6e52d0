use dantic::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Shelf {
    Fiction,
    Science,
    History,
}

/// Filters for listing books.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub max_price: Option<i64>,
    pub shelf: Option<Shelf>,
}

impl SchemaModel for BookQuery {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, garde::Validate)]
pub struct Author {
    #[garde(length(min = 1))]
    pub name: String,
    #[garde(skip)]
    pub country: Option<String>,
}

/// A book to add to the catalogue.
#[derive(Debug, Serialize, Deserialize, JsonSchema, garde::Validate)]
pub struct NewBook {
    #[garde(length(min = 1, max = 200))]
    pub title: String,
    /// Price in cents.
    #[garde(range(min = 0))]
    pub price: i64,
    #[garde(skip)]
    pub shelf: Shelf,
    #[garde(dive)]
    pub authors: Vec<Author>,
}

impl SchemaModel for NewBook {
    fn validate_rules(&self) -> Vec<FieldError> {
        let mut errors = check_garde(self);
        if self.authors.is_empty() {
            errors.push(FieldError::new("authors", "a book needs at least one author"));
        }
        errors
    }
}

/// Partial update; `id` comes from the path.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BookUpdate {
    pub id: u64,
    pub title: Option<String>,
    pub shelf: Option<Shelf>,
}

impl SchemaModel for BookUpdate {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Reprice {
    pub id: u64,
    pub price: i64,
}

impl SchemaModel for Reprice {
    fn validate_rules(&self) -> Vec<FieldError> {
        if self.price < 0 {
            vec![FieldError::new("price", "price cannot be negative")]
        } else {
            vec![]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub price: i64,
    pub shelf: Option<Shelf>,
    pub authors: Vec<Author>,
}

impl SchemaModel for Book {}

impl Populate for Book {
    fn setter(field: &str) -> Option<Setter<Self>> {
        match field {
            "title" => Some(|book, value| {
                let title: String = serde_json::from_value(value)?;
                book.title = title.trim().to_string();
                Ok(())
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BookList {
    pub count: usize,
    pub books: Vec<Book>,
}

impl SchemaModel for BookList {}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Status {
    pub status: String,
}

impl SchemaModel for Status {}
