use lightningcss::properties::Property;
use lightningcss::properties::text::{TextAlign, TextDecorationLine};
use lightningcss::stylesheet::{ParserOptions, StyleAttribute};
use lightningcss::values::length::{LengthPercentage, LengthPercentageOrAuto, LengthValue};

use crate::html::{Attributes, Tag};
use crate::model::{Alignment, Emu, FontAttribute};

/// Monospace font applied to `<code>` runs.
pub(crate) const MONOSPACE_FONT: &str = "Mono";

/// Paragraph-level directives read from a block tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockFormat {
    pub alignment: Option<Alignment>,
    pub left_indent: Option<Emu>,
}

/// Read `align`, `text-align` and `padding-left` from a paragraph tag.
///
/// A `text-align` declaration overrides the `align` attribute. Pixel padding
/// is taken as points without conversion.
pub fn block_format(attrs: &Attributes) -> BlockFormat {
    let mut format = BlockFormat {
        alignment: attrs.get("align").and_then(Alignment::from_keyword),
        left_indent: None,
    };

    for_each_declaration(attrs.get("style"), |prop| match prop {
        Property::TextAlign(align) => {
            format.alignment = alignment_from_css(align);
        }
        Property::PaddingLeft(LengthPercentageOrAuto::LengthPercentage(
            LengthPercentage::Dimension(LengthValue::Px(px)),
        )) => {
            let indent = Emu::from_pt(f64::from(*px));
            format.left_indent = (indent.0 != 0).then_some(indent);
        }
        _ => {}
    });

    format
}

/// Font toggles pushed by an inline formatting tag.
pub fn inline_scope(tag: &Tag, attrs: &Attributes) -> Vec<FontAttribute> {
    match tag {
        Tag::B | Tag::Strong => vec![FontAttribute::Bold],
        Tag::I | Tag::Em => vec![FontAttribute::Italic],
        Tag::U => vec![FontAttribute::Underline],
        Tag::Sub => vec![FontAttribute::Subscript],
        Tag::Sup => vec![FontAttribute::Superscript],
        Tag::Code => vec![FontAttribute::Name(MONOSPACE_FONT.to_string())],
        Tag::Span => decoration_scope(attrs),
        _ => Vec::new(),
    }
}

fn decoration_scope(attrs: &Attributes) -> Vec<FontAttribute> {
    let mut scope = Vec::new();
    for_each_declaration(attrs.get("style"), |prop| {
        let line: &TextDecorationLine = match prop {
            Property::TextDecoration(decoration, _) => &decoration.line,
            Property::TextDecorationLine(line, _) => line,
            _ => return,
        };
        if line.contains(TextDecorationLine::Underline) {
            scope.push(FontAttribute::Underline);
        }
        if line.contains(TextDecorationLine::LineThrough) {
            scope.push(FontAttribute::Strike);
        }
    });
    scope
}

fn alignment_from_css(value: &TextAlign) -> Option<Alignment> {
    match value {
        TextAlign::Left => Some(Alignment::Left),
        TextAlign::Center => Some(Alignment::Center),
        TextAlign::Right => Some(Alignment::Right),
        TextAlign::Justify => Some(Alignment::Justify),
        _ => None,
    }
}

fn for_each_declaration<F>(style: Option<&str>, mut f: F)
where
    F: FnMut(&Property),
{
    let Some(style) = style.filter(|s| !s.trim().is_empty()) else {
        return;
    };
    let options = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    let style_attr = match StyleAttribute::parse(style, options) {
        Ok(value) => value,
        Err(err) => {
            log::debug!("ignoring unparsable style {style:?}: {err}");
            return;
        }
    };
    for prop in style_attr.declarations.declarations.iter() {
        f(prop);
    }
    for prop in style_attr.declarations.important_declarations.iter() {
        f(prop);
    }
}
