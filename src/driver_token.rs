use std::{hash::Hash, sync::Arc};

/// Opaque identifier naming a driver kind.
///
/// Tokens compare by identity, not by name: two tokens created from the same
/// string are different keys. Clone a token to share it, the clones are equal.
///
/// # Example
///
/// ```
/// use trackify::DriverToken;
///
/// let a = DriverToken::new("TRACKIFY_DEBUG");
/// let b = DriverToken::new("TRACKIFY_DEBUG");
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct DriverToken(Arc<str>);

impl DriverToken {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Display name of the token. Not used for lookups.
    #[inline]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl PartialEq for DriverToken {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DriverToken {}

impl std::fmt::Display for DriverToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for DriverToken {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Tokens of the drivers shipped with the crate.
pub mod tokens {
    use std::sync::LazyLock;

    use super::DriverToken;

    pub static DEBUG: LazyLock<DriverToken> = LazyLock::new(|| DriverToken::new("TRACKIFY_DEBUG"));
    pub static GTM: LazyLock<DriverToken> = LazyLock::new(|| DriverToken::new("TRACKIFY_GTM"));
}
