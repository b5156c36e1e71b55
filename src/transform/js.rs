use super::Transformer;
use crate::error::TransformError;
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

/// JavaScript minifier backed by `oxc`.
///
/// Sources are parsed as classic scripts, falling back to modules for
/// sources with `import` or `export`. Identifiers are not mangled and the
/// top-level bindings of a script are never removed.
#[derive(Debug, Clone, Default)]
pub struct JsMinifier {
    _priv: (),
}

impl JsMinifier {
    /// Creates a new JavaScript minifier.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformer for JsMinifier {
    fn transform(&self, _media_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let source = std::str::from_utf8(input)?;
        let allocator = Allocator::default();

        // Top-level declarations of a classic script are globals and are kept.
        // Sources using import/export only parse as modules.
        let mut ret = Parser::new(&allocator, source, SourceType::script()).parse();
        if ret.panicked || !ret.errors.is_empty() {
            ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        }
        if ret.panicked || !ret.errors.is_empty() {
            return Err(TransformError::new(format!(
                "invalid JavaScript ({} syntax errors)",
                ret.errors.len()
            )));
        }

        let mut program = ret.program;
        let options = MinifierOptions {
            mangle: None,
            compress: Some(CompressOptions::default()),
        };
        let ret = Minifier::new(options).minify(&allocator, &mut program);
        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                comments: CommentOptions::disabled(),
                ..CodegenOptions::default()
            })
            .with_scoping(ret.scoping)
            .build(&program)
            .code;
        Ok(code.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_function() {
        let input = r#"
            // greeting
            function helloWorld() {
                console.log("Hello World");
                return {
                    message: "Hello World"
                };
            }
        "#;
        let out = JsMinifier::new()
            .transform("application/javascript", input.as_bytes())
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("helloWorld"));
        assert!(!out.contains("greeting"));
        assert!(out.len() < input.len());
    }

    #[test]
    fn test_script_of_only_declarations_kept() {
        let input = "function helloWorld() {\n  console.log(\"Hello World\");\n}\n\nvar counter = 0;\n";
        let out = JsMinifier::new()
            .transform("text/javascript", input.as_bytes())
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("function helloWorld()"), "{out}");
        assert!(out.contains("counter"), "{out}");
        assert!(out.len() < input.len());
    }

    #[test]
    fn test_module_syntax() {
        let input = "import { a } from \"./a.js\";\nexport function twice() {\n  return a * 2;\n}\n";
        let out = JsMinifier::new()
            .transform("text/javascript", input.as_bytes())
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("export"), "{out}");
        assert!(out.contains("twice"), "{out}");
    }

    #[test]
    fn test_syntax_error() {
        let result = JsMinifier::new().transform("text/javascript", b"function (");
        assert!(result.is_err());
    }
}
