use super::Transformer;
use crate::error::TransformError;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

/// XML and SVG minifier backed by `quick-xml`.
///
/// Removes comments and whitespace-only text nodes. Whitespace inside SVG
/// text content is collapsed to one space instead, and whitespace under
/// `xml:space="preserve"` is kept. Documents that are not well-formed are
/// rejected.
#[derive(Debug, Clone, Default)]
pub struct XmlMinifier {
    _priv: (),
}

impl XmlMinifier {
    /// Creates a new XML minifier.
    pub fn new() -> Self {
        Self::default()
    }
}

/// How whitespace-only text is treated inside an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Space {
    /// Dropped, unless it touches an entity reference.
    Strip,
    /// Replaced by a single space (SVG text content).
    Collapse,
    /// Kept as written (`xml:space="preserve"`).
    Preserve,
}

impl Space {
    fn for_element(element: &BytesStart<'_>, parent: Space) -> Space {
        let declared = match element.try_get_attribute("xml:space") {
            Ok(Some(attr)) if attr.value.as_ref() == b"preserve" => return Space::Preserve,
            Ok(Some(attr)) if attr.value.as_ref() == b"default" => Space::Strip,
            _ => parent,
        };
        let text_content = matches!(
            element.local_name().as_ref(),
            b"text" | b"tspan" | b"textPath"
        );
        if declared == Space::Strip && text_content {
            Space::Collapse
        } else {
            declared
        }
    }
}

impl Transformer for XmlMinifier {
    fn transform(&self, _media_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let mut reader = Reader::from_reader(input);
        let mut writer = Writer::new(Vec::with_capacity(input.len()));
        let mut open: Vec<Space> = Vec::new();
        let mut blank: Option<Event<'_>> = None;
        let mut after_ref = false;

        loop {
            let event = reader.read_event().map_err(|err| {
                TransformError::new(format!(
                    "invalid XML at byte {}: {err}",
                    reader.error_position()
                ))
            })?;
            let space = open.last().copied().unwrap_or(Space::Strip);
            match event {
                Event::Eof => break,
                Event::Comment(_) => {}
                Event::Text(ref text) if text.iter().all(u8::is_ascii_whitespace) => match space {
                    Space::Preserve => write(&mut writer, event)?,
                    Space::Collapse => {
                        write(&mut writer, Event::Text(BytesText::from_escaped(" ")))?
                    }
                    Space::Strip if after_ref => write(&mut writer, event)?,
                    Space::Strip => blank = Some(event),
                },
                event => {
                    match &event {
                        Event::Start(element) => open.push(Space::for_element(element, space)),
                        Event::End(_) => {
                            open.pop();
                        }
                        _ => {}
                    }
                    let is_ref = matches!(event, Event::GeneralRef(_));
                    if let Some(text) = blank.take().filter(|_| is_ref) {
                        write(&mut writer, text)?;
                    }
                    after_ref = is_ref;
                    write(&mut writer, event)?;
                }
            }
        }

        Ok(writer.into_inner())
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), TransformError> {
    writer
        .write_event(event)
        .map_err(|err| TransformError::new(format!("cannot write XML: {err}")))
}
