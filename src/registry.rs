use std::{collections::HashMap, future::Future, sync::Arc};

use futures_util::{FutureExt, future::BoxFuture};

use crate::{
    DriverConstructor, DriverToken, Environment, Error, Result, constructor,
    drivers::{DataLayers, DebugDriver, GtmDriver, ServerStubDriver},
};

/// Deferred factory producing a driver constructor.
pub type DriverResolver =
    Arc<dyn Fn() -> BoxFuture<'static, Result<DriverConstructor>> + Send + Sync>;

/// Maps driver tokens to deferred constructors.
///
/// Resolvers run only when [`Tracker::load_drivers`](crate::Tracker::load_drivers)
/// asks for a registered token, so backends that are never used cost nothing.
/// Each resolver is independent: resolving several tokens at once is safe.
///
/// # Example
///
/// ```
/// use trackify::{DriverRegistry, DriverToken, constructor, drivers::DebugDriver};
///
/// let token = DriverToken::new("MY_DEBUG");
/// let registry = DriverRegistry::new()
///     .with_driver(token.clone(), || async { Ok(constructor(|_| Ok(DebugDriver::new()))) });
/// assert!(registry.contains(&token));
/// ```
#[derive(Clone, Default)]
pub struct DriverRegistry {
    resolvers: HashMap<DriverToken, DriverResolver>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the drivers shipped in [`crate::drivers`].
    ///
    /// - [`tokens::DEBUG`](crate::tokens::DEBUG): [`DebugDriver`] in every environment.
    /// - [`tokens::GTM`](crate::tokens::GTM): [`GtmDriver`] writing to `layers` on
    ///   the client, [`ServerStubDriver`] on the server.
    pub fn builtin(environment: Environment, layers: DataLayers) -> Self {
        use crate::tokens;

        let mut registry = Self::new();
        registry.register(tokens::DEBUG.clone(), || async {
            Ok(constructor(|_| Ok(DebugDriver::new())))
        });
        registry.register(tokens::GTM.clone(), move || {
            let layers = layers.clone();
            async move {
                Ok(match environment {
                    Environment::Client => {
                        constructor(move |config| GtmDriver::new(&config, layers.clone()))
                    }
                    Environment::Server => {
                        constructor(|_| Ok(ServerStubDriver::new("GTMServerDriver")))
                    }
                })
            }
        });
        registry
    }

    /// Registers (or replaces) the resolver for `token`.
    pub fn register<F, Fut>(&mut self, token: DriverToken, resolver: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DriverConstructor>> + Send + 'static,
    {
        self.resolvers
            .insert(token, Arc::new(move || resolver().boxed()));
    }

    pub fn with_driver<F, Fut>(mut self, token: DriverToken, resolver: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<DriverConstructor>> + Send + 'static,
    {
        self.register(token, resolver);
        self
    }

    /// Registers an already available constructor.
    pub fn register_constructor(&mut self, token: DriverToken, ctor: DriverConstructor) {
        self.register(token, move || {
            let ctor = ctor.clone();
            async move { Ok(ctor) }
        });
    }

    pub fn contains(&self, token: &DriverToken) -> bool {
        self.resolvers.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Resolves the constructor registered for `token`.
    ///
    /// Fails with [`Error::UnknownDriver`] when the token was never registered.
    pub async fn resolve(&self, token: &DriverToken) -> Result<DriverConstructor> {
        let resolver = self
            .resolvers
            .get(token)
            .cloned()
            .ok_or_else(|| Error::UnknownDriver(token.clone()))?;
        resolver().await
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("tokens", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens;

    #[tokio::test]
    async fn test_unknown_token() {
        let registry = DriverRegistry::new();
        let token = DriverToken::new("MISSING");
        let err = registry.resolve(&token).await.err().unwrap();
        assert!(matches!(err, Error::UnknownDriver(t) if t == token));
    }

    #[tokio::test]
    async fn test_same_name_is_not_registered() {
        let registry = DriverRegistry::builtin(Environment::Client, DataLayers::default());
        let impostor = DriverToken::new("TRACKIFY_DEBUG");
        assert!(registry.contains(&tokens::DEBUG));
        assert!(!registry.contains(&impostor));
        assert!(registry.resolve(&impostor).await.is_err());
    }

    #[tokio::test]
    async fn test_builtin_selects_by_environment() {
        let client = DriverRegistry::builtin(Environment::Client, DataLayers::default());
        let server = DriverRegistry::builtin(Environment::Server, DataLayers::default());

        let ctor = client.resolve(&tokens::GTM).await.unwrap();
        let driver = ctor(Default::default()).unwrap();
        assert_eq!(driver.name(), "GTMBrowserDriver");

        let ctor = server.resolve(&tokens::GTM).await.unwrap();
        let mut driver = ctor(Default::default()).unwrap();
        assert_eq!(driver.name(), "GTMServerDriver");
        assert!(!driver.load().await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_resolution() {
        let registry = DriverRegistry::builtin(Environment::Client, DataLayers::default());
        let (debug, gtm) = tokio::join!(
            registry.resolve(&tokens::DEBUG),
            registry.resolve(&tokens::GTM)
        );
        assert!(debug.is_ok());
        assert!(gtm.is_ok());
    }
}
