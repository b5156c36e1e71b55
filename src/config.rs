use crate::media::Category;
use serde::{Deserialize, Serialize};

/// Which media type categories are minified, and how failures are reported.
///
/// `Settings` is captured when a [`Minifier`](crate::Minifier) is built and
/// never changes afterwards. It can be embedded in an application's own
/// configuration file; missing fields take their default values.
///
/// By default HTML, CSS and JavaScript are minified and JSON, XML and SVG are
/// left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minify `text/html`.
    pub html: bool,
    /// Minify `text/css`.
    pub css: bool,
    /// Minify JavaScript.
    pub js: bool,
    /// Minify JSON.
    pub json: bool,
    /// Minify XML, Atom and RSS.
    pub xml: bool,
    /// Minify `image/svg+xml`.
    pub svg: bool,
    /// Log parse and minification failures at debug level instead of warn.
    pub suppress_warnings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            html: true,
            css: true,
            js: true,
            json: false,
            xml: false,
            svg: false,
            suppress_warnings: false,
        }
    }
}

impl Settings {
    /// Creates the default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with every category enabled.
    pub fn all() -> Self {
        Self {
            html: true,
            css: true,
            js: true,
            json: true,
            xml: true,
            svg: true,
            suppress_warnings: false,
        }
    }

    /// Settings with every category disabled.
    pub fn none() -> Self {
        Self {
            html: false,
            css: false,
            js: false,
            json: false,
            xml: false,
            svg: false,
            suppress_warnings: false,
        }
    }

    /// Enables or disables HTML minification.
    pub fn html(mut self, enabled: bool) -> Self {
        self.html = enabled;
        self
    }

    /// Enables or disables CSS minification.
    pub fn css(mut self, enabled: bool) -> Self {
        self.css = enabled;
        self
    }

    /// Enables or disables JavaScript minification.
    pub fn js(mut self, enabled: bool) -> Self {
        self.js = enabled;
        self
    }

    /// Enables or disables JSON minification.
    pub fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    /// Enables or disables XML minification.
    pub fn xml(mut self, enabled: bool) -> Self {
        self.xml = enabled;
        self
    }

    /// Enables or disables SVG minification.
    pub fn svg(mut self, enabled: bool) -> Self {
        self.svg = enabled;
        self
    }

    /// Downgrades failure logs from warn to debug level.
    pub fn suppress_warnings(mut self, suppress: bool) -> Self {
        self.suppress_warnings = suppress;
        self
    }

    /// Returns whether `category` is enabled.
    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Html => self.html,
            Category::Css => self.css,
            Category::Js => self.js,
            Category::Json => self.json,
            Category::Xml => self.xml,
            Category::Svg => self.svg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.is_enabled(Category::Html));
        assert!(settings.is_enabled(Category::Css));
        assert!(settings.is_enabled(Category::Js));
        assert!(!settings.is_enabled(Category::Json));
        assert!(!settings.is_enabled(Category::Xml));
        assert!(!settings.is_enabled(Category::Svg));
        assert!(!settings.suppress_warnings);
    }

    #[test]
    fn test_builder() {
        let settings = Settings::none().json(true).svg(true).suppress_warnings(true);
        let enabled: Vec<_> = Category::ALL
            .into_iter()
            .filter(|c| settings.is_enabled(*c))
            .collect();
        assert_eq!(enabled, vec![Category::Svg, Category::Json]);
        assert!(settings.suppress_warnings);
        assert!(Category::ALL.iter().all(|c| Settings::all().is_enabled(*c)));
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: Settings = serde_json::from_str(r#"{"json": true, "js": false}"#).unwrap();
        assert_eq!(settings, Settings::default().json(true).js(false));
    }
}
