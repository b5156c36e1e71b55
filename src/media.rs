use crate::error::ParseError;
use crate::registry::Matcher;
use std::fmt;
use std::str::FromStr;

/// A parsed `Content-Type` value: the bare media type plus its parameters.
///
/// The media type and parameter names are lowercased; parameter values are
/// kept as written (with quoting removed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType {
    essence: String,
    params: Vec<(String, String)>,
}

impl MediaType {
    /// Parses a header value such as `text/html; charset=utf-8`.
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let (head, mut rest) = match value.find(';') {
            Some(i) => (&value[..i], &value[i..]),
            None => (value, ""),
        };

        let head = head.trim_matches(is_space);
        if head.is_empty() {
            return Err(ParseError::Empty);
        }

        let (ty, subtype) = head.split_once('/').ok_or(ParseError::MissingSlash)?;
        if !is_token(ty) || !is_token(subtype) {
            return Err(ParseError::InvalidToken(head.to_owned()));
        }

        let mut params: Vec<(String, String)> = Vec::new();
        loop {
            rest = rest.trim_start_matches(is_space);
            if rest.is_empty() {
                break;
            }

            let Some(after) = rest.strip_prefix(';') else {
                return Err(ParseError::InvalidParameter(rest.to_owned()));
            };
            let after = after.trim_start_matches(is_space);
            // Trailing semicolons are tolerated.
            if after.is_empty() {
                break;
            }

            let (name, value, remaining) = consume_param(after)?;
            if params.iter().any(|(existing, _)| *existing == name) {
                return Err(ParseError::DuplicateParameter(name));
            }
            params.push((name, value));
            rest = remaining;
        }

        Ok(Self {
            essence: head.to_ascii_lowercase(),
            params,
        })
    }

    /// Returns `type/subtype`, lowercased and without parameters.
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Returns the value of a parameter; names compare case-insensitively.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the `charset` parameter, if any.
    pub fn charset(&self) -> Option<&str> {
        self.param("charset")
    }

    /// Returns all parameters in the order they appeared.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for MediaType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)?;
        for (name, value) in &self.params {
            if is_token(value) {
                write!(f, "; {name}={value}")?;
            } else {
                write!(f, "; {name}=\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

/// Parses `name=value` at the start of `s`, returning the lowercased name,
/// the unquoted value and the unconsumed remainder.
fn consume_param(s: &str) -> Result<(String, String, &str), ParseError> {
    let invalid = || ParseError::InvalidParameter(s.to_owned());

    let name_end = s.find(|c: char| !is_token_char(c)).unwrap_or(s.len());
    let name = &s[..name_end];
    if name.is_empty() {
        return Err(invalid());
    }

    let rest = s[name_end..].trim_start_matches(is_space);
    let rest = rest.strip_prefix('=').ok_or_else(invalid)?;
    let rest = rest.trim_start_matches(is_space);

    let (value, remaining) = if let Some(quoted) = rest.strip_prefix('"') {
        let mut value = String::new();
        let mut chars = quoted.char_indices();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    end = Some(i + 1);
                    break;
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(escaped),
                    None => return Err(invalid()),
                },
                _ => value.push(c),
            }
        }
        let end = end.ok_or_else(invalid)?;
        (value, &quoted[end..])
    } else {
        let value_end = rest.find(|c: char| !is_token_char(c)).unwrap_or(rest.len());
        if value_end == 0 {
            return Err(invalid());
        }
        (rest[..value_end].to_owned(), &rest[value_end..])
    };

    Ok((name.to_ascii_lowercase(), value, remaining))
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// RFC 2045 token characters: visible ASCII except tspecials.
fn is_token_char(c: char) -> bool {
    c.is_ascii_graphic() && !"()<>@,;:\\\"/[]?=".contains(c)
}

/// Media type categories a transformer can be registered for.
///
/// The variants are listed in matching priority order; the first category
/// whose matcher accepts a media type wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `text/html`.
    Html,
    /// `text/css`.
    Css,
    /// `image/svg+xml`.
    Svg,
    /// JavaScript media types such as `application/javascript`.
    Js,
    /// JSON media types, including `+json` suffixes, `json-seq` and `ld+json`.
    Json,
    /// XML media types, including Atom and RSS feeds.
    Xml,
}

const JS_PATTERN: &str = r"^(application|text)/(x-)?(java|ecma)script$";
const JSON_PATTERN: &str = r"^(application|text)/((.+\+)?json|json-seq|ld\+json)$";
const XML_PATTERN: &str = r"^(application|text)/(x-)?(xml|atom\+xml|rss\+xml)$";

impl Category {
    /// All categories in matching priority order.
    pub const ALL: [Category; 6] = [
        Category::Html,
        Category::Css,
        Category::Svg,
        Category::Js,
        Category::Json,
        Category::Xml,
    ];

    /// Returns a short lowercase name for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Html => "html",
            Category::Css => "css",
            Category::Svg => "svg",
            Category::Js => "js",
            Category::Json => "json",
            Category::Xml => "xml",
        }
    }

    /// Builds the matcher that recognizes media types of this category.
    pub fn matcher(&self) -> Matcher {
        match self {
            Category::Html => Matcher::exact("text/html"),
            Category::Css => Matcher::exact("text/css"),
            Category::Svg => Matcher::exact("image/svg+xml"),
            Category::Js => Matcher::builtin_pattern(JS_PATTERN),
            Category::Json => Matcher::builtin_pattern(JSON_PATTERN),
            Category::Xml => Matcher::builtin_pattern(XML_PATTERN),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
