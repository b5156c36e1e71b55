use super::Transformer;
use crate::error::TransformError;
use minify_html::Cfg;

/// HTML minifier backed by `minify-html`.
///
/// Document tags (`<html>`, `<head>`) and end tags are always kept. Comments
/// are dropped and inline `<style>` blocks are minified; inline scripts are
/// left as written.
#[derive(Debug, Clone, Default)]
pub struct HtmlMinifier {
    _priv: (),
}

impl HtmlMinifier {
    /// Creates a new HTML minifier.
    pub fn new() -> Self {
        Self::default()
    }
}

fn config() -> Cfg {
    Cfg {
        keep_closing_tags: true,
        keep_html_and_head_opening_tags: true,
        ensure_spec_compliant_unquoted_attribute_values: true,
        do_not_minify_doctype: true,
        keep_comments: false,
        minify_css: true,
        minify_js: false,
        ..Cfg::default()
    }
}

impl Transformer for HtmlMinifier {
    fn transform(&self, _media_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        Ok(minify_html::minify(input, &config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(input: &str) -> String {
        let out = HtmlMinifier::new().transform("text/html", input.as_bytes()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_collapses_whitespace_between_blocks() {
        assert_eq!(
            minify("<html>  <body>  <h1>Hello World!</h1>  </body>  </html>"),
            "<html><body><h1>Hello World!</h1></body></html>"
        );
    }

    #[test]
    fn test_keeps_document_and_end_tags() {
        let input = "
            <html>
                <head>
                    <title>Test</title>
                </head>
                <body>
                    <p>one</p>
                    <p>two</p>
                </body>
            </html>
        ";
        let out = minify(input);
        for tag in ["<html>", "<head>", "</head>", "</p>", "</body>", "</html>"] {
            assert!(out.contains(tag), "{tag} missing from {out}");
        }
        assert!(out.len() < input.len());
    }

    #[test]
    fn test_comments_removed() {
        let out = minify("<p>a <!-- note --> b</p>");
        assert!(!out.contains("note"));
        assert!(out.starts_with("<p>a"));
    }

    #[test]
    fn test_pre_kept_verbatim() {
        let out = minify("<div>\n  <pre>  a\n   b </pre>\n</div>");
        assert!(out.contains("<pre>  a\n   b </pre>"));
    }

    #[test]
    fn test_unquoted_attribute_before_self_closing() {
        let out = minify("<p><img src=logo.png /> <a href=/docs />x</a></p>");
        assert!(out.contains("logo.png"));
        assert!(!out.contains("logo.png/"), "{out}");
        assert!(out.contains("/docs"));
        assert!(!out.contains("/docs/"), "{out}");
    }

    #[test]
    fn test_fixed_point() {
        let once = minify("<div>\n  <span> a </span>\n  <span>b</span>\n</div>");
        assert_eq!(minify(&once), once);
    }
}
