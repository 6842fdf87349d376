//! Field selector for projected room listings.
//!
//! Clients ask for a subset of room fields with `?fields=name,lastMessage`.
//! The selector is parsed once at the HTTP edge and handed to the store,
//! which turns it into a native projection.

/// Errors raised while parsing a field selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// A field name contained characters outside `[A-Za-z0-9_]`.
    #[error("invalid field name in selector: {0:?}")]
    InvalidField(String),
}

/// An ordered, de-duplicated list of top-level field names.
///
/// An empty selector selects every field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    fields: Vec<String>,
}

impl FieldSelector {
    /// Parse a comma-separated field list.
    ///
    /// Whitespace around names is trimmed and empty segments are skipped,
    /// so `"name, ,messages"` selects `name` and `messages`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::InvalidField`] for names that are not plain
    /// top-level keys (operators, dotted paths, exclusions).
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let mut fields: Vec<String> = Vec::new();
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if !part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(SelectorError::InvalidField(part.to_owned()));
            }
            if !fields.iter().any(|f| f == part) {
                fields.push(part.to_owned());
            }
        }
        Ok(Self { fields })
    }

    /// True when no field was named, meaning "all fields".
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `field` is part of the projection.
    pub fn includes(&self, field: &str) -> bool {
        self.is_empty() || self.fields.iter().any(|f| f == field)
    }

    /// Iterate over the selected names in request order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}
