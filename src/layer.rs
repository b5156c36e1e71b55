use crate::config::Settings;
use crate::pipeline::Minifier;
use crate::service::MinifyService;
use http::request::Parts;
use std::fmt;
use std::sync::Arc;
use tower::Layer;

/// Predicate deciding, from the request head, that a request must bypass
/// minification.
pub type SkipPredicate = Arc<dyn Fn(&Parts) -> bool + Send + Sync>;

/// A Tower layer that minifies HTTP response bodies.
///
/// This layer wraps services and replaces eligible response bodies with
/// their minified form.
#[derive(Clone)]
pub struct MinifyLayer {
    minifier: Arc<Minifier>,
    skip: Option<SkipPredicate>,
}

impl MinifyLayer {
    /// Creates a new minify layer with default settings.
    ///
    /// HTML, CSS and JavaScript are minified by default.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// Creates a minify layer using the bundled transformers.
    pub fn with_settings(settings: Settings) -> Self {
        Self::from_minifier(Minifier::new(settings))
    }

    /// Creates a minify layer around an existing minifier.
    pub fn from_minifier(minifier: impl Into<Arc<Minifier>>) -> Self {
        Self {
            minifier: minifier.into(),
            skip: None,
        }
    }

    /// Bypasses minification for requests matching `predicate`.
    ///
    /// The predicate runs before the inner service is called; matching
    /// responses are streamed through without being buffered.
    pub fn skip_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Parts) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(predicate));
        self
    }

    /// Returns the minifier shared by the services this layer creates.
    pub fn minifier(&self) -> &Arc<Minifier> {
        &self.minifier
    }
}

impl Default for MinifyLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MinifyLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinifyLayer")
            .field("minifier", &self.minifier)
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

impl<S> Layer<S> for MinifyLayer {
    type Service = MinifyService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MinifyService::new(inner, self.minifier.clone(), self.skip.clone())
    }
}
