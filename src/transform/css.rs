use super::Transformer;
use crate::error::TransformError;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

/// CSS minifier backed by `lightningcss`.
#[derive(Debug, Clone, Default)]
pub struct CssMinifier {
    _priv: (),
}

impl CssMinifier {
    /// Creates a new CSS minifier.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for CssMinifier {
    fn transform(&self, _media_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let source = std::str::from_utf8(input)?;
        let stylesheet = StyleSheet::parse(source, ParserOptions::default())
            .map_err(|err| TransformError::new(format!("invalid CSS: {err}")))?;
        let result = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|err| TransformError::new(format!("cannot print CSS: {err}")))?;
        Ok(result.code.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_rules() {
        let input = "
            body {
                background-color: #ffffff;
                color: #000000;
                font-family: Arial, sans-serif;
            }
        ";
        let out = CssMinifier::new().transform("text/css", input.as_bytes()).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("body{"));
        assert!(!out.contains('\n'));
        assert!(!out.contains("  "));
        assert!(out.len() < input.len());
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(CssMinifier::new().transform("text/css", &[0xc3, 0x28]).is_err());
    }
}
