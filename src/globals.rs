use serde::{Deserialize, Serialize};

/// Process-wide default values merged into events that lack them.
///
/// Owned by the [`Tracker`](crate::Tracker) and fixed at construction.
/// Each event decides which of these fields apply to it, see
/// [`Event::set_globals`](crate::Event::set_globals).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Globals {
    pub currency: Option<String>,
    pub brand: Option<String>,
    pub affiliation: Option<String>,
    pub language: Option<String>,
}

impl Globals {
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set fields as `(payload key, value)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("currency", self.currency.as_deref()),
            ("brand", self.brand.as_deref()),
            ("affiliation", self.affiliation.as_deref()),
            ("language", self.language.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_skip_unset_fields() {
        let globals = Globals::default().with_currency("USD").with_language("en");
        let entries: Vec<_> = globals.entries().collect();
        assert_eq!(entries, vec![("currency", "USD"), ("language", "en")]);
    }

    #[test]
    fn test_deserialize_partial() {
        let globals: Globals = serde_json::from_str(r#"{"brand":"Acme"}"#).unwrap();
        assert_eq!(globals.brand.as_deref(), Some("Acme"));
        assert!(globals.currency.is_none());
        assert!(Globals::default().is_empty());
    }
}
