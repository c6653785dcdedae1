use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{Attributes, HtmlEvent, Tag};
use crate::error::Error;

/// Tokenize the whole input into a vector of events.
pub fn tokenize(html: &str) -> Result<Vec<HtmlEvent>, Error> {
    let mut events = Vec::new();
    for_each_event(html, |event| events.push(event))?;
    Ok(events)
}

/// Stream tag and text events in document order.
///
/// The reader is configured for editor HTML rather than XML: void elements
/// such as `<br>` need no closing tag, end names are not matched against
/// their start tags, and attributes may be unquoted or valueless. Text and
/// entity references between two tags are delivered as a single
/// [`HtmlEvent::Text`].
pub fn for_each_event<F>(html: &str, mut on_event: F) -> Result<(), Error>
where
    F: FnMut(HtmlEvent),
{
    let mut reader = Reader::from_str(html.trim());
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;

    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                flush_text(&mut text, &mut on_event);
                let (tag, attrs) = start_tag(&reader, &e)?;
                on_event(HtmlEvent::Start(tag, attrs));
            }
            Event::Empty(e) => {
                flush_text(&mut text, &mut on_event);
                let (tag, attrs) = start_tag(&reader, &e)?;
                on_event(HtmlEvent::Start(tag.clone(), attrs));
                on_event(HtmlEvent::End(tag));
            }
            Event::End(e) => {
                flush_text(&mut text, &mut on_event);
                let name = decode(&reader, e.name().as_ref())?;
                on_event(HtmlEvent::End(Tag::from_name(local_name(&name))));
            }
            Event::Text(e) => {
                let decoded = e.decode().map_err(|err| Error::Markup(err.to_string()))?;
                text.push_str(&decoded);
            }
            Event::CData(e) => {
                text.push_str(&decode(&reader, &e)?);
            }
            Event::GeneralRef(e) => {
                let name = e.decode().map_err(|err| Error::Markup(err.to_string()))?;
                match resolve_entity(&name) {
                    Some(resolved) => text.push_str(&resolved),
                    None => {
                        text.push('&');
                        text.push_str(&name);
                        text.push(';');
                    }
                }
            }
            Event::Eof => break,
            // comments, doctype, processing instructions
            _ => {}
        }
    }
    flush_text(&mut text, &mut on_event);
    Ok(())
}

fn flush_text<F: FnMut(HtmlEvent)>(text: &mut String, on_event: &mut F) {
    if !text.is_empty() {
        on_event(HtmlEvent::Text(std::mem::take(text)));
    }
}

fn decode(reader: &Reader<&[u8]>, bytes: &[u8]) -> Result<String, Error> {
    reader
        .decoder()
        .decode(bytes)
        .map(|s| s.into_owned())
        .map_err(|err| Error::Markup(err.to_string()))
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

fn start_tag(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<(Tag, Attributes), Error> {
    let name = decode(reader, e.name().as_ref())?;
    let tag = Tag::from_name(local_name(&name));

    let mut pairs = Vec::new();
    for attr in e.html_attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) => {
                log::debug!("skipping malformed attribute on <{name}>: {err}");
                continue;
            }
        };
        let key = decode(reader, attr.key.as_ref())?.to_ascii_lowercase();
        let raw = decode(reader, &attr.value)?;
        // Editors leave bare `&` in URLs; keep the raw value when it does not unescape.
        let value = match unescape_with(&raw, resolve_html5_entity) {
            Ok(value) => value.into_owned(),
            Err(_) => raw,
        };
        pairs.push((key, value));
    }
    Ok((tag, Attributes::new(pairs)))
}

fn resolve_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_html5_entity(name).map(String::from)
}
