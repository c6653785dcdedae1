//! Event-driven conversion of editor markup into a [`Document`].
//!
//! The converter is a plain struct fed one [`HtmlEvent`] at a time. It only
//! holds handles to the current paragraph and run; the [`DocumentBuilder`]
//! owns everything that has been emitted.

use crate::builder::{DocumentBuilder, ParagraphHandle, RunHandle};
use crate::error::Error;
use crate::html::{self, Attributes, HtmlEvent, Tag};
use crate::image::{ImageInfo, ImageResolver, image_size};
use crate::model::{Document, FontAttribute, ParagraphStyle, Picture};
use crate::options::PageArea;
use crate::style::{self, BlockFormat};

/// The bundled template defines three levels of each list style.
const MAX_LIST_LEVEL: u8 = 3;

/// Convert `html` into a document model titled `title`.
pub fn convert(
    html: &str,
    title: &str,
    page: &PageArea,
    images: &ImageResolver,
) -> Result<Document, Error> {
    let mut converter = Converter::new(title, *page, images);
    html::for_each_event(html, |event| converter.handle(event))?;
    Ok(converter.finish())
}

struct Bookmark {
    name: String,
    started: Option<(ParagraphHandle, u32)>,
}

/// State of the `a` element being converted.
#[derive(Default)]
struct OpenAnchor {
    /// External locator, shown after the link text.
    href: Option<String>,
    /// Fragment of an in-document link.
    target: Option<String>,
    bookmark: Option<Bookmark>,
    /// Run that received the most recent link text.
    last_run: Option<RunHandle>,
}

struct Converter<'a> {
    builder: DocumentBuilder,
    images: &'a ImageResolver,
    page: PageArea,

    paragraph: Option<ParagraphHandle>,
    run: Option<RunHandle>,
    scopes: Vec<Vec<FontAttribute>>,
    list_styles: Vec<ParagraphStyle>,
    /// List stacks of the enclosing containers while inside a table.
    saved_lists: Vec<Vec<ParagraphStyle>>,

    pending_format: BlockFormat,
    pending_bookmarks: Vec<String>,
    anchor: Option<OpenAnchor>,
    quote_depth: usize,

    pre: bool,
    collapse_space: bool,
}

impl<'a> Converter<'a> {
    fn new(title: &str, page: PageArea, images: &'a ImageResolver) -> Self {
        let mut builder = DocumentBuilder::new();
        builder.set_title(title);
        Converter {
            builder,
            images,
            page,
            paragraph: None,
            run: None,
            scopes: Vec::new(),
            list_styles: Vec::new(),
            saved_lists: Vec::new(),
            pending_format: BlockFormat::default(),
            pending_bookmarks: Vec::new(),
            anchor: None,
            quote_depth: 0,
            pre: false,
            collapse_space: true,
        }
    }

    fn handle(&mut self, event: HtmlEvent) {
        match event {
            HtmlEvent::Start(tag, attrs) => self.start_tag(tag, &attrs),
            HtmlEvent::End(tag) => self.end_tag(tag),
            HtmlEvent::Text(text) => self.text(&text),
        }
    }

    fn finish(mut self) -> Document {
        self.finish_paragraph();
        self.builder.finish()
    }

    fn start_tag(&mut self, tag: Tag, attrs: &Attributes) {
        match tag {
            Tag::A => self.start_anchor(attrs),
            Tag::Br => self.line_break(),
            Tag::H(level) => {
                self.finish_paragraph();
                let p = self.builder.add_heading(level);
                self.open_paragraph(p);
            }
            Tag::Img => self.add_picture(attrs),
            Tag::Li => {
                self.finish_paragraph();
                let p = self.prepare_paragraph();
                self.paragraph = Some(p);
            }
            Tag::Ol => self.push_list(ParagraphStyle::ListNumber),
            Tag::Ul => self.push_list(ParagraphStyle::ListBullet),
            Tag::P if !self.list_styles.is_empty() => {
                // Inside a list the item is the block; a paragraph only breaks the line.
                if let Some(p) = self.paragraph
                    && self.builder.has_runs(p)
                {
                    let r = self.ensure_run();
                    self.builder.add_break(r);
                }
                self.scopes.push(Vec::new());
            }
            Tag::P => {
                self.finish_paragraph();
                self.pending_format = style::block_format(attrs);
            }
            Tag::Pre => {
                self.finish_paragraph();
                self.pre = true;
            }
            Tag::Blockquote => {
                self.finish_paragraph();
                self.quote_depth += 1;
            }
            Tag::Table => {
                self.finish_paragraph();
                self.saved_lists.push(std::mem::take(&mut self.list_styles));
                self.builder.start_table();
            }
            Tag::Tr => {
                self.finish_paragraph();
                self.builder.start_row();
            }
            Tag::Td | Tag::Th => {
                self.finish_paragraph();
                self.builder.start_cell();
            }
            tag if tag.is_inline_formatting() => {
                let scope = style::inline_scope(&tag, attrs);
                if !scope.is_empty() {
                    self.run = None;
                }
                self.scopes.push(scope);
            }
            Tag::Other(name) => log::debug!("ignoring <{name}>"),
            tag => log::debug!("ignoring {tag:?}"),
        }
    }

    fn end_tag(&mut self, tag: Tag) {
        match tag {
            Tag::A => self.end_anchor(),
            Tag::P if !self.list_styles.is_empty() => {
                self.scopes.pop();
                self.collapse_space = true;
            }
            Tag::H(_) | Tag::P | Tag::Li | Tag::Td | Tag::Th | Tag::Tr => self.finish_paragraph(),
            Tag::Pre => {
                self.finish_paragraph();
                self.pre = false;
            }
            Tag::Ol | Tag::Ul => {
                self.finish_paragraph();
                self.list_styles.pop();
            }
            Tag::Blockquote => {
                self.finish_paragraph();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Tag::Table => {
                self.finish_paragraph();
                self.builder.end_table();
                self.list_styles = self.saved_lists.pop().unwrap_or_default();
            }
            tag if tag.is_inline_formatting() => {
                if self.scopes.pop().is_some_and(|scope| !scope.is_empty()) {
                    self.run = None;
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, data: &str) {
        let mut data = if self.pre {
            data.to_string()
        } else {
            collapse_whitespace(data)
        };
        if self.collapse_space {
            data = data.trim_start().to_string();
        }
        if data.is_empty() {
            return;
        }
        self.collapse_space = data.ends_with(' ');
        let r = self.ensure_run();
        self.builder.add_text(r, &data);
        if let Some(anchor) = self.anchor.as_mut() {
            anchor.last_run = Some(r);
        }
    }

    /// Breaks only go into an open run.
    fn line_break(&mut self) {
        if let Some(r) = self.run {
            self.builder.add_break(r);
        }
    }

    fn push_list(&mut self, style: fn(u8) -> ParagraphStyle) {
        self.finish_paragraph();
        let level = (self.list_styles.len() + 1).min(usize::from(MAX_LIST_LEVEL)) as u8;
        self.list_styles.push(style(level));
    }

    fn paragraph_style(&self) -> ParagraphStyle {
        match self.list_styles.last() {
            Some(style) => *style,
            None if self.quote_depth > 0 => ParagraphStyle::Quote,
            None => ParagraphStyle::Normal,
        }
    }

    /// Create a paragraph carrying the pending block format.
    fn prepare_paragraph(&mut self) -> ParagraphHandle {
        let p = self.builder.add_paragraph(self.paragraph_style());
        if let Some(alignment) = self.pending_format.alignment {
            self.builder.set_alignment(p, alignment);
        }
        if let Some(indent) = self.pending_format.left_indent {
            self.builder.set_left_indent(p, indent);
        }
        self.open_paragraph(p);
        p
    }

    /// Make `p` current and place bookmarks that closed before any paragraph existed.
    fn open_paragraph(&mut self, p: ParagraphHandle) {
        self.paragraph = Some(p);
        for name in std::mem::take(&mut self.pending_bookmarks) {
            let id = self.builder.add_bookmark_start(p, &name);
            self.builder.add_bookmark_end(p, id);
        }
    }

    fn current_paragraph(&mut self) -> ParagraphHandle {
        match self.paragraph {
            Some(p) => p,
            None => self.prepare_paragraph(),
        }
    }

    fn ensure_run(&mut self) -> RunHandle {
        if let Some(r) = self.run {
            return r;
        }
        let p = self.current_paragraph();
        self.start_bookmark(p);
        let r = self.builder.add_run(p);
        for attr in self.scopes.iter().flatten() {
            self.builder.set_font_attribute(r, attr);
        }
        if let Some(target) = self.anchor.as_ref().and_then(|a| a.target.as_deref()) {
            self.builder.set_run_anchor(r, target);
        }
        self.run = Some(r);
        r
    }

    fn finish_paragraph(&mut self) {
        if let Some(p) = self.paragraph.take() {
            self.builder.trim_end(p);
        }
        self.run = None;
        self.scopes.clear();
        self.pending_format = BlockFormat::default();
        self.collapse_space = true;
    }

    fn start_anchor(&mut self, attrs: &Attributes) {
        let href = attrs.get("href").map(str::trim).filter(|h| !h.is_empty());
        let mut anchor = OpenAnchor::default();
        match href {
            Some(href) => match href.strip_prefix('#') {
                Some("") => {}
                Some(fragment) => anchor.target = Some(fragment.to_string()),
                None => anchor.href = Some(href.to_string()),
            },
            None => {
                let name = attrs
                    .get("name")
                    .or_else(|| attrs.get("id"))
                    .map(str::trim)
                    .filter(|n| !n.is_empty());
                anchor.bookmark = name.map(|name| Bookmark {
                    name: name.to_string(),
                    started: None,
                });
            }
        }
        if anchor.target.is_some() || anchor.bookmark.is_some() {
            self.run = None;
        }
        self.anchor = Some(anchor);
        self.scopes.push(Vec::new());
    }

    /// Open the bookmark of the enclosing anchor in front of the next content.
    fn start_bookmark(&mut self, p: ParagraphHandle) {
        let Some(bookmark) = self.anchor.as_mut().and_then(|a| a.bookmark.as_mut()) else {
            return;
        };
        if bookmark.started.is_none() {
            let id = self.builder.add_bookmark_start(p, &bookmark.name);
            bookmark.started = Some((p, id));
        }
    }

    fn end_anchor(&mut self) {
        self.scopes.pop();
        let Some(anchor) = self.anchor.take() else {
            return;
        };
        if anchor.target.is_some() || anchor.bookmark.is_some() {
            self.run = None;
        }
        if let Some(bookmark) = anchor.bookmark {
            match (bookmark.started, self.paragraph) {
                (Some((_, id)), Some(p)) | (Some((p, id)), None) => {
                    self.builder.add_bookmark_end(p, id);
                }
                (None, Some(p)) => {
                    let id = self.builder.add_bookmark_start(p, &bookmark.name);
                    self.builder.add_bookmark_end(p, id);
                }
                (None, None) => self.pending_bookmarks.push(bookmark.name),
            }
        }
        if let Some(href) = anchor.href {
            let suffix = if self.collapse_space {
                format!("[{href}] ")
            } else {
                format!(" [{href}]")
            };
            self.collapse_space = suffix.ends_with(' ');
            let r = match anchor.last_run {
                Some(r) if Some(r.paragraph()) == self.paragraph => r,
                _ => self.ensure_run(),
            };
            self.builder.add_text(r, &suffix);
        }
    }

    fn add_picture(&mut self, attrs: &Attributes) {
        let src = attrs.get("src").unwrap_or_default();
        let width_px = pixel_attr(attrs.get("width"));
        let height_px = pixel_attr(attrs.get("height"));

        let data = self.images.load(src);
        let Some(info) = ImageInfo::from_bytes(&data) else {
            log::warn!("dropping image {src:?}: unreadable after resolution");
            return;
        };
        let size = image_size(&info, width_px, height_px, &self.page);
        let (width, height) = info.scaled(size);
        let picture = Picture {
            data,
            format: info.format,
            width,
            height,
        };

        let p = self.current_paragraph();
        self.start_bookmark(p);
        self.builder.add_picture(p, picture);
        self.run = None;
    }
}

/// `"120"` or `"120px"`; anything else is ignored.
fn pixel_attr(value: Option<&str>) -> Option<u32> {
    let value = value?.trim();
    let value = value.strip_suffix("px").unwrap_or(value);
    value.trim().parse().ok()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alignment, Block, Inline};
    use crate::options::FetchOptions;

    fn run_events(html: &str) -> (Vec<Vec<FontAttribute>>, Vec<ParagraphStyle>, Document) {
        let images = ImageResolver::offline(FetchOptions::default());
        let mut converter = Converter::new("t", PageArea::default(), &images);
        for event in html::tokenize(html).unwrap() {
            converter.handle(event);
        }
        let scopes = converter.scopes.clone();
        let lists = converter.list_styles.clone();
        (scopes, lists, converter.finish())
    }

    #[test]
    fn stacks_are_empty_after_well_formed_input() {
        let (scopes, lists, _) = run_events(
            "<ul><li><p>a <b>b</b></p><p><i>c</i></p></li></ul>\
             <p><span style=\"text-decoration: underline\">u<sub>2</sub></span></p>\
             <ol><li>x<ul><li><code>y</code></li></ul></li></ol>",
        );
        assert!(scopes.is_empty());
        assert!(lists.is_empty());
    }

    #[test]
    fn whitespace_collapses_to_one_space() {
        assert_eq!(collapse_whitespace("a \t\n  b\u{a0} c"), "a b c");
        let (_, _, doc) = run_events("<p>\n   one \n\t two  </p><p>  three</p>");
        let texts: Vec<String> = doc.paragraphs().map(|p| p.text()).collect();
        assert_eq!(texts, ["one two", "three"]);
    }

    #[test]
    fn preformatted_text_is_kept() {
        let (_, _, doc) = run_events("<pre>a  b\n  c</pre><p>d  e</p>");
        let texts: Vec<String> = doc.paragraphs().map(|p| p.text()).collect();
        assert_eq!(texts, ["a  b\n  c", "d e"]);
    }

    #[test]
    fn br_without_open_run_is_ignored() {
        let (_, _, doc) = run_events("<p><br>a<b>b</b><br>c<br>d</p>");
        let para = doc.paragraphs().next().unwrap();
        assert_eq!(para.text(), "abc\nd");
    }

    #[test]
    fn paragraph_inside_list_item_breaks_the_line() {
        let (_, _, doc) = run_events("<ul><li><p>one</p><p>two</p></li></ul>");
        let paras: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].style, ParagraphStyle::ListBullet(1));
        assert_eq!(paras[0].text(), "one\ntwo");
    }

    #[test]
    fn empty_list_item_still_makes_a_paragraph() {
        let (_, _, doc) = run_events("<ol><li></li></ol>");
        let paras: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].style, ParagraphStyle::ListNumber(1));
        assert!(paras[0].content.is_empty());
    }

    #[test]
    fn heading_levels() {
        let (_, _, doc) = run_events("<h1>a</h1><h6>b</h6>");
        let styles: Vec<_> = doc.paragraphs().map(|p| p.style).collect();
        assert_eq!(styles, [ParagraphStyle::Heading(1), ParagraphStyle::Heading(6)]);
    }

    #[test]
    fn block_format_is_consumed_by_one_paragraph() {
        let (_, _, doc) =
            run_events("<p align=\"center\" style=\"padding-left: 20px\">a</p><p>b</p>");
        let paras: Vec<_> = doc.paragraphs().collect();
        assert_eq!(paras[0].alignment, Some(Alignment::Center));
        assert!(paras[0].left_indent.is_some());
        assert_eq!(paras[1].alignment, None);
        assert_eq!(paras[1].left_indent, None);
    }

    #[test]
    fn blockquote_paragraphs_use_quote_style() {
        let (_, _, doc) = run_events("<blockquote><p>q</p></blockquote><p>n</p>");
        let styles: Vec<_> = doc.paragraphs().map(|p| p.style).collect();
        assert_eq!(styles, [ParagraphStyle::Quote, ParagraphStyle::Normal]);
    }

    #[test]
    fn external_link_gets_visible_suffix() {
        let (_, _, doc) = run_events("<p>see <a href=\"https://example.org\">site</a> now</p>");
        let para = doc.paragraphs().next().unwrap();
        assert_eq!(para.text(), "see site [https://example.org] now");
    }

    #[test]
    fn link_suffix_joins_formatted_link_text() {
        let (_, _, doc) = run_events("<p><a href=\"u\"><b>x</b></a> y</p>");
        let para = doc.paragraphs().next().unwrap();
        let runs: Vec<(String, bool)> = para.runs().map(|r| (r.text(), r.font.bold)).collect();
        assert_eq!(runs, [("x [u]".to_string(), true), (" y".to_string(), false)]);
    }

    #[test]
    fn bookmark_wraps_anchor_content() {
        let (_, _, doc) = run_events("<p>x <a name=\"top\">here</a></p>");
        let Some(Block::Paragraph(para)) = doc.body.first() else {
            panic!("expected a paragraph");
        };
        assert!(matches!(&para.content[1], Inline::BookmarkStart { name, .. } if name == "top"));
        assert!(matches!(para.content[3], Inline::BookmarkEnd { .. }));
    }

    #[test]
    fn pixel_attributes() {
        assert_eq!(pixel_attr(Some("12")), Some(12));
        assert_eq!(pixel_attr(Some(" 12px ")), Some(12));
        assert_eq!(pixel_attr(Some("50%")), None);
        assert_eq!(pixel_attr(None), None);
    }
}
