use crate::capture::Capture;
use crate::config::Settings;
use crate::media::{Category, MediaType};
use crate::registry::Registry;
use crate::transform::{self, Transformer};
use http::{HeaderMap, StatusCode, header};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Why a response was sent without modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Skip {
    /// The skip predicate matched the request.
    Bypassed,
    /// The status is not `2xx`, or is `204 No Content`.
    Status,
    /// No `Content-Type` header was set.
    NoContentType,
    /// The body already has a `Content-Encoding`.
    Encoded,
    /// The response carries a `Content-Range`.
    PartialContent,
    /// The `Content-Type` header could not be parsed.
    InvalidContentType,
    /// No transformer is registered for the media type.
    NotEnabled,
    /// The body is empty.
    EmptyBody,
    /// The transformer failed.
    TransformFailed,
    /// The transformed body was not smaller than the original.
    NotSmaller,
    /// The body could not be read to the end.
    BodyError,
}

/// What the pipeline did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The body was replaced by its minified form.
    Minified {
        /// The category that matched.
        category: Category,
        /// Length of the body produced by the handler.
        original: usize,
        /// Length of the body that was sent.
        minified: usize,
    },
    /// The response was sent as produced by the handler.
    Skipped(Skip),
}

impl Outcome {
    /// Returns whether the body was replaced.
    pub fn is_minified(&self) -> bool {
        matches!(self, Outcome::Minified { .. })
    }
}

/// An eligible response: the transformer to run and the media type to run it
/// for.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    essence: String,
    category: Category,
    entry: usize,
}

/// The response rewrite pipeline.
///
/// A `Minifier` owns the [`Settings`] and the [`Registry`] built from them.
/// It is immutable once built and is shared between requests behind an
/// [`Arc`].
pub struct Minifier {
    settings: Settings,
    registry: Registry,
}

impl Minifier {
    /// Creates a minifier using the bundled transformers.
    pub fn new(settings: Settings) -> Self {
        Self::builder(settings).build()
    }

    /// Starts building a minifier whose transformers can be replaced.
    pub fn builder(settings: Settings) -> MinifierBuilder {
        MinifierBuilder {
            settings,
            overrides: HashMap::new(),
        }
    }

    /// Returns the settings this minifier was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Returns the transformer registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs the full rewrite decision over a captured response.
    ///
    /// Returns the response to commit (either untouched or with the minified
    /// body and a matching `Content-Length`) and what was decided.
    pub fn process(&self, mut capture: Capture) -> (Capture, Outcome) {
        let target = match self.target(capture.status(), capture.headers()) {
            Ok(target) => target,
            Err(skip) => return (capture, self.skipped(skip)),
        };

        match self.rewrite(&target, capture.body()) {
            Ok(minified) => {
                let original = capture.body().len();
                let outcome = self.minified(&target, original, minified.len());
                capture.replace_body(minified);
                (capture, outcome)
            }
            Err(skip) => (capture, self.skipped(skip)),
        }
    }

    /// Decides from the response head alone whether the body should be
    /// minified.
    pub(crate) fn target(&self, status: StatusCode, headers: &HeaderMap) -> Result<Target, Skip> {
        if !status.is_success() || status == StatusCode::NO_CONTENT {
            return Err(Skip::Status);
        }

        let content_type = headers.get(header::CONTENT_TYPE).ok_or(Skip::NoContentType)?;

        let encoded = headers
            .get(header::CONTENT_ENCODING)
            .is_some_and(|v| !v.as_bytes().eq_ignore_ascii_case(b"identity"));
        if encoded {
            return Err(Skip::Encoded);
        }

        if headers.contains_key(header::CONTENT_RANGE) {
            return Err(Skip::PartialContent);
        }

        let parsed = content_type
            .to_str()
            .map_err(|_| crate::error::ParseError::NotText)
            .and_then(MediaType::parse);
        let media_type = match parsed {
            Ok(media_type) => media_type,
            Err(err) => {
                let value = String::from_utf8_lossy(content_type.as_bytes());
                if self.settings.suppress_warnings {
                    debug!(content_type = %value, error = %err, "failed to parse media type");
                } else {
                    warn!(content_type = %value, error = %err, "failed to parse media type");
                }
                return Err(Skip::InvalidContentType);
            }
        };

        let entry = self
            .registry
            .position(media_type.essence())
            .ok_or(Skip::NotEnabled)?;

        Ok(Target {
            category: self.registry.entry(entry).category,
            essence: media_type.essence().to_owned(),
            entry,
        })
    }

    /// Transforms the body of an eligible response, returning the new body
    /// only when it is strictly smaller.
    pub(crate) fn rewrite(&self, target: &Target, body: &[u8]) -> Result<Vec<u8>, Skip> {
        if body.is_empty() {
            return Err(Skip::EmptyBody);
        }

        let transformer: &dyn Transformer = self.registry.entry(target.entry).transformer.as_ref();
        let minified = match transformer.transform(&target.essence, body) {
            Ok(minified) => minified,
            Err(err) => {
                if self.settings.suppress_warnings {
                    debug!(media_type = %target.essence, error = %err, "failed to minify");
                } else {
                    warn!(media_type = %target.essence, error = %err, "failed to minify");
                }
                return Err(Skip::TransformFailed);
            }
        };

        if minified.len() >= body.len() {
            return Err(Skip::NotSmaller);
        }
        Ok(minified)
    }

    pub(crate) fn skipped(&self, skip: Skip) -> Outcome {
        trace!(reason = ?skip, "response left unmodified");
        Outcome::Skipped(skip)
    }

    pub(crate) fn minified(&self, target: &Target, original: usize, minified: usize) -> Outcome {
        trace!(
            category = %target.category,
            media_type = %target.essence,
            original,
            minified,
            "response minified"
        );
        Outcome::Minified {
            category: target.category,
            original,
            minified,
        }
    }
}

impl fmt::Debug for Minifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Minifier")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .finish()
    }
}

impl Default for Minifier {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/// Builder for a [`Minifier`] with custom transformers.
pub struct MinifierBuilder {
    settings: Settings,
    overrides: HashMap<Category, Arc<dyn Transformer>>,
}

impl MinifierBuilder {
    /// Uses `transformer` for `category` instead of the bundled one.
    ///
    /// The transformer is only registered if the category is enabled.
    pub fn transformer<T>(mut self, category: Category, transformer: T) -> Self
    where
        T: Transformer + 'static,
    {
        self.overrides.insert(category, Arc::new(transformer));
        self
    }

    /// Builds the registry from the enabled categories, in priority order.
    pub fn build(mut self) -> Minifier {
        let mut registry = Registry::new();

        for category in Category::ALL {
            if !self.settings.is_enabled(category) {
                continue;
            }
            let transformer = self
                .overrides
                .remove(&category)
                .or_else(|| transform::default_transformer(category));
            match transformer {
                Some(transformer) => registry.register(category, transformer),
                None => warn!(
                    %category,
                    feature = transform::feature_for(category),
                    "no transformer available, category will not be minified"
                ),
            }
        }

        Minifier {
            settings: self.settings,
            registry,
        }
    }
}

impl fmt::Debug for MinifierBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinifierBuilder")
            .field("settings", &self.settings)
            .field("overrides", &self.overrides.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Responder;
    use crate::error::TransformError;
    use http::HeaderValue;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn capture(status: u16, content_type: Option<&'static str>, body: &str) -> Capture {
        let mut capture = Capture::new();
        capture.set_status(StatusCode::from_u16(status).unwrap());
        if let Some(content_type) = content_type {
            capture.set_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        capture.write_all(body.as_bytes()).unwrap();
        capture
    }

    fn uppercase(_: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(input.to_ascii_uppercase())
    }

    fn failing(_: &str, _: &[u8]) -> Result<Vec<u8>, TransformError> {
        Err(TransformError::new("boom"))
    }

    fn drop_spaces(_: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(input.iter().copied().filter(|b| *b != b' ').collect())
    }

    const PAGE: &str = "<html>  <body>  <h1>Hello World!</h1>  </body>  </html>";

    #[test]
    fn test_minifies_html() {
        let minifier = Minifier::new(Settings::default());
        let (out, outcome) = minifier.process(capture(200, Some("text/html"), PAGE));

        let expected = "<html><body><h1>Hello World!</h1></body></html>";
        assert_eq!(out.body(), expected.as_bytes());
        assert_eq!(
            out.headers().get(header::CONTENT_LENGTH).unwrap(),
            &expected.len().to_string()
        );
        assert_eq!(out.headers().get(header::CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(
            outcome,
            Outcome::Minified {
                category: Category::Html,
                original: PAGE.len(),
                minified: expected.len(),
            }
        );
    }

    #[test]
    fn test_accept_ranges() {
        let minifier = Minifier::new(Settings::default());

        let mut page = capture(200, Some("text/html"), PAGE);
        page.set_header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        let (out, outcome) = minifier.process(page);
        assert!(outcome.is_minified());
        assert!(out.headers().get(header::ACCEPT_RANGES).is_none());

        let mut missing = capture(404, Some("text/html"), PAGE);
        missing.set_header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        let (out, _) = minifier.process(missing);
        assert_eq!(out.headers().get(header::ACCEPT_RANGES).unwrap(), "bytes");
    }

    #[test]
    fn test_charset_preserved() {
        let minifier = Minifier::new(Settings::default());
        let (out, outcome) =
            minifier.process(capture(200, Some("text/html; Charset=\"UTF-8\""), PAGE));
        assert!(outcome.is_minified());
        assert_eq!(
            out.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; Charset=\"UTF-8\""
        );
    }

    #[test]
    fn test_status_gate() {
        let minifier = Minifier::new(Settings::all());
        for status in [101, 204, 301, 304, 404, 500] {
            let (out, outcome) = minifier.process(capture(status, Some("text/html"), PAGE));
            assert_eq!(outcome, Outcome::Skipped(Skip::Status), "{status}");
            assert_eq!(out.body(), PAGE.as_bytes());
            assert!(out.headers().get(header::CONTENT_LENGTH).is_none());
        }
        for status in [200, 201, 203, 206] {
            let (_, outcome) = minifier.process(capture(status, Some("text/html"), PAGE));
            assert!(outcome.is_minified(), "{status}");
        }
    }

    #[test]
    fn test_no_content_type() {
        let minifier = Minifier::new(Settings::all());
        let (out, outcome) = minifier.process(capture(200, None, PAGE));
        assert_eq!(outcome, Outcome::Skipped(Skip::NoContentType));
        assert_eq!(out.body(), PAGE.as_bytes());
    }

    #[test]
    fn test_invalid_content_type_suppressed() {
        let minifier = Minifier::new(Settings::all().suppress_warnings(true));
        let (out, outcome) = minifier.process(capture(200, Some("text/html; charset"), PAGE));
        assert_eq!(outcome, Outcome::Skipped(Skip::InvalidContentType));
        assert_eq!(out.body(), PAGE.as_bytes());

        let (out, outcome) = minifier.process(capture(200, Some("invalid/type"), PAGE));
        assert_eq!(outcome, Outcome::Skipped(Skip::NotEnabled));
        assert_eq!(out.body(), PAGE.as_bytes());
    }

    #[test]
    fn test_category_disabled() {
        let minifier = Minifier::new(Settings::default().html(false));
        let (out, outcome) = minifier.process(capture(200, Some("text/html"), PAGE));
        assert_eq!(outcome, Outcome::Skipped(Skip::NotEnabled));
        assert_eq!(out.body(), PAGE.as_bytes());
        assert!(!minifier.registry().contains(Category::Html));
    }

    #[test]
    fn test_encoded_and_partial() {
        let minifier = Minifier::new(Settings::default());

        let mut gzipped = capture(200, Some("text/html"), PAGE);
        gzipped.set_header(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        assert_eq!(minifier.process(gzipped).1, Outcome::Skipped(Skip::Encoded));

        let mut identity = capture(200, Some("text/html"), PAGE);
        identity.set_header(header::CONTENT_ENCODING, HeaderValue::from_static("Identity"));
        assert!(minifier.process(identity).1.is_minified());

        let mut partial = capture(200, Some("text/html"), PAGE);
        partial.set_header(header::CONTENT_RANGE, HeaderValue::from_static("bytes 0-9/100"));
        assert_eq!(minifier.process(partial).1, Outcome::Skipped(Skip::PartialContent));
    }

    #[test]
    fn test_empty_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let minifier = Minifier::builder(Settings::default())
            .transformer(Category::Html, move |_: &str, input: &[u8]| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TransformError>(input.to_vec())
            })
            .build();

        let (out, outcome) = minifier.process(capture(200, Some("text/html"), ""));
        assert_eq!(outcome, Outcome::Skipped(Skip::EmptyBody));
        assert!(out.body().is_empty());
        assert_eq!(out.headers().get(header::CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_transform_error_keeps_original() {
        let minifier = Minifier::builder(Settings::default().suppress_warnings(true))
            .transformer(Category::Css, failing)
            .build();
        let (out, outcome) = minifier.process(capture(200, Some("text/css"), "a { b: c }"));
        assert_eq!(outcome, Outcome::Skipped(Skip::TransformFailed));
        assert_eq!(out.body(), b"a { b: c }");
    }

    #[test]
    fn test_size_gate() {
        let minifier = Minifier::builder(Settings::default())
            .transformer(Category::Css, uppercase)
            .build();
        let (out, outcome) = minifier.process(capture(200, Some("text/css"), "a{b:c}"));
        assert_eq!(outcome, Outcome::Skipped(Skip::NotSmaller));
        assert_eq!(out.body(), b"a{b:c}");
        assert!(out.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_override_transformer() {
        let minifier = Minifier::builder(Settings::default())
            .transformer(Category::Js, drop_spaces)
            .build();
        let (out, outcome) =
            minifier.process(capture(200, Some("application/javascript"), "var a = 1 ;"));
        assert!(outcome.is_minified());
        assert_eq!(out.body(), b"vara=1;");
    }

    #[test]
    fn test_override_ignored_when_disabled() {
        let minifier = Minifier::builder(Settings::none())
            .transformer(Category::Js, drop_spaces)
            .build();
        assert!(minifier.registry().is_empty());
    }

    #[test]
    fn test_second_pass_is_not_smaller() {
        let minifier = Minifier::new(Settings::default());
        let (once, _) = minifier.process(capture(200, Some("text/html"), PAGE));
        let again = Capture::from_parts(once.status(), once.headers().clone(), once.body());
        let (twice, outcome) = minifier.process(again);
        assert_eq!(outcome, Outcome::Skipped(Skip::NotSmaller));
        assert_eq!(twice.body(), once.body());
    }

    #[test]
    fn test_json_disabled_by_default() {
        let minifier = Minifier::new(Settings::default());
        let (_, outcome) = minifier.process(capture(200, Some("application/json"), "{ }"));
        assert_eq!(outcome, Outcome::Skipped(Skip::NotEnabled));

        let minifier = Minifier::new(Settings::default().json(true));
        let (out, outcome) =
            minifier.process(capture(200, Some("application/problem+json"), "{ \"a\" : 1 }"));
        assert!(outcome.is_minified());
        assert_eq!(out.body(), b"{\"a\":1}");
    }
}
