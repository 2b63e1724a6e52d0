use crate::error::{FieldError, ROOT_LOC};

// ── garde bridge for business rules ────────────────────────

/// Run garde's rules on a model and convert the report into field errors.
///
/// Lets a model write its business rules declaratively:
///
/// ```ignore
/// #[derive(Serialize, Deserialize, JsonSchema, garde::Validate)]
/// pub struct Author {
///     #[garde(length(min = 1))]
///     pub name: String,
///     #[garde(range(min = 1))]
///     pub age: i64,
/// }
///
/// impl SchemaModel for Author {
///     fn validate_rules(&self) -> Vec<FieldError> {
///         check_garde(self)
///     }
/// }
/// ```
pub fn check_garde<T: garde::Validate>(value: &T) -> Vec<FieldError>
where
    T::Context: Default,
{
    match value.validate() {
        Ok(()) => Vec::new(),
        Err(report) => convert_garde_report(&report),
    }
}

fn convert_garde_report(report: &garde::Report) -> Vec<FieldError> {
    report
        .iter()
        .map(|(path, error)| {
            // garde renders `authors[0].name`; locations use `authors.0.name`.
            let field = path.to_string().replace('[', ".").replace(']', "");
            let field = if field.is_empty() { ROOT_LOC.to_string() } else { field };
            FieldError::new(field, error.message())
        })
        .collect()
}

// Re-export garde::Validate for convenience.
pub use garde::Validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(garde::Validate)]
    struct Shelf {
        #[garde(length(min = 1))]
        label: String,
        #[garde(dive)]
        books: Vec<Entry>,
    }

    #[derive(garde::Validate)]
    struct Entry {
        #[garde(range(min = 1))]
        copies: i64,
    }

    #[test]
    fn nested_paths_use_dots() {
        let shelf = Shelf {
            label: String::new(),
            books: vec![Entry { copies: 1 }, Entry { copies: 0 }],
        };
        let mut locs: Vec<String> = check_garde(&shelf).into_iter().map(|e| e.loc).collect();
        locs.sort();
        assert_eq!(locs, vec!["books.1.copies", "label"]);
    }
}
