//! The transformer capability and the minifiers bundled with this crate.

#[cfg(feature = "css")]
mod css;
mod html;
#[cfg(feature = "js")]
mod js;
mod json;
#[cfg(feature = "xml")]
mod xml;

use crate::error::TransformError;
use crate::media::Category;
use std::sync::Arc;

#[cfg(feature = "css")]
pub use css::CssMinifier;
pub use html::HtmlMinifier;
#[cfg(feature = "js")]
pub use js::JsMinifier;
pub use json::JsonMinifier;
#[cfg(feature = "xml")]
pub use xml::XmlMinifier;

/// Rewrites a body of a given media type into a smaller equivalent.
///
/// Implementations must not have side effects visible to the middleware. An
/// error means "cannot transform": the response is sent unmodified.
pub trait Transformer: Send + Sync {
    /// Transforms `input`, whose bare media type is `media_type`.
    fn transform(&self, media_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError>;
}

impl<F> Transformer for F
where
    F: Fn(&str, &[u8]) -> Result<Vec<u8>, TransformError> + Send + Sync,
{
    fn transform(&self, media_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        self(media_type, input)
    }
}

/// Returns the bundled transformer for a category, if the feature providing
/// it is enabled.
pub(crate) fn default_transformer(category: Category) -> Option<Arc<dyn Transformer>> {
    match category {
        Category::Html => Some(Arc::new(HtmlMinifier::new())),
        Category::Json => Some(Arc::new(JsonMinifier::new())),
        #[cfg(feature = "css")]
        Category::Css => Some(Arc::new(CssMinifier::new())),
        #[cfg(feature = "js")]
        Category::Js => Some(Arc::new(JsMinifier::new())),
        #[cfg(feature = "xml")]
        Category::Xml | Category::Svg => Some(Arc::new(XmlMinifier::new())),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

/// Returns the cargo feature that provides the bundled transformer for a
/// category.
pub(crate) fn feature_for(category: Category) -> &'static str {
    match category {
        Category::Html | Category::Json => "default",
        Category::Css => "css",
        Category::Js => "js",
        Category::Xml | Category::Svg => "xml",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_transformer() {
        let t = |media_type: &str, input: &[u8]| -> Result<Vec<u8>, TransformError> {
            let mut out = media_type.as_bytes().to_vec();
            out.extend_from_slice(input);
            Ok(out)
        };
        assert_eq!(t.transform("a/b", b"!").unwrap(), b"a/b!");
    }

    #[test]
    fn test_defaults_always_present() {
        assert!(default_transformer(Category::Html).is_some());
        assert!(default_transformer(Category::Json).is_some());
    }

    #[test]
    #[cfg(feature = "xml")]
    fn test_svg_uses_xml_minifier() {
        let svg = default_transformer(Category::Svg).unwrap();
        let out = svg
            .transform("image/svg+xml", b"<svg>\n  <!-- c -->\n  <g/>\n</svg>")
            .unwrap();
        assert_eq!(out, b"<svg><g/></svg>");
    }

    #[test]
    #[cfg(not(feature = "css"))]
    fn test_css_missing_without_feature() {
        assert!(default_transformer(Category::Css).is_none());
    }
}
