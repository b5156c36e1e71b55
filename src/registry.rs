use crate::media::Category;
use crate::transform::Transformer;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Decides whether a media type essence (e.g. `text/html`) belongs to a
/// registry entry.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Matches one media type exactly.
    Exact(Cow<'static, str>),
    /// Matches media types accepted by a regular expression.
    Pattern(Regex),
}

impl Matcher {
    /// Creates a matcher comparing against a single media type.
    pub fn exact(media_type: impl Into<Cow<'static, str>>) -> Self {
        Matcher::Exact(media_type.into())
    }

    /// Creates a matcher from a regular expression.
    ///
    /// The expression is used as written; anchor it with `^...$` to match
    /// whole media types.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Matcher::Pattern)
    }

    /// Compiles one of the category patterns shipped with this crate.
    pub(crate) fn builtin_pattern(pattern: &'static str) -> Self {
        Matcher::Pattern(Regex::new(pattern).expect("built-in media type pattern is valid"))
    }

    /// Returns whether `essence` is accepted by this matcher.
    pub fn matches(&self, essence: &str) -> bool {
        match self {
            Matcher::Exact(media_type) => media_type == essence,
            Matcher::Pattern(regex) => regex.is_match(essence),
        }
    }
}

/// A single registered transformer.
pub(crate) struct Entry {
    pub(crate) category: Category,
    pub(crate) matcher: Matcher,
    pub(crate) transformer: Arc<dyn Transformer>,
}

/// Maps media types to the transformer that minifies them.
///
/// Entries are consulted in registration order and the first matching entry
/// wins. A registry is populated once while a
/// [`Minifier`](crate::Minifier) is built and is read-only afterwards, so
/// it can be shared by any number of concurrent requests.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transformer under the category's standard matcher.
    pub fn register(&mut self, category: Category, transformer: Arc<dyn Transformer>) {
        self.register_with(category, category.matcher(), transformer);
    }

    /// Registers a transformer under a custom matcher.
    pub fn register_with(
        &mut self,
        category: Category,
        matcher: Matcher,
        transformer: Arc<dyn Transformer>,
    ) {
        self.entries.push(Entry {
            category,
            matcher,
            transformer,
        });
    }

    /// Finds the transformer responsible for a media type essence.
    pub fn lookup(&self, essence: &str) -> Option<(Category, &dyn Transformer)> {
        self.position(essence).map(|index| {
            let entry = &self.entries[index];
            (entry.category, entry.transformer.as_ref())
        })
    }

    /// Returns whether any entry is registered for `category`.
    pub fn contains(&self, category: Category) -> bool {
        self.entries.iter().any(|entry| entry.category == category)
    }

    /// Returns the number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn position(&self, essence: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.matcher.matches(essence))
    }

    pub(crate) fn entry(&self, index: usize) -> &Entry {
        &self.entries[index]
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| (entry.category, &entry.matcher)))
            .finish()
    }
}
