//! WordprocessingML package writer.

mod parts;

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::error::Error;
use crate::model::{
    Alignment, Block, Document, Emu, Font, Inline, Paragraph, ParagraphStyle, Picture, Run,
    RunItem, Table, VertAlign,
};
use parts::{DML_NS, MediaPart, PIC_NS, REL_NS, WML_NS, WPD_NS, XML_DECL};

/// Letter paper with 1in top/bottom and 1.25in side margins, in twips.
const PAGE_WIDTH: i64 = 12240;
const PAGE_HEIGHT: i64 = 15840;
const MARGIN_TOP: i64 = 1440;
const MARGIN_SIDE: i64 = 1800;
const TEXT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN_SIDE;

/// Serialize `doc` into an in-memory `.docx` package.
pub fn write(doc: &Document) -> Result<Vec<u8>, Error> {
    let mut body = BodyWriter::default();
    body.write_document(doc);
    let BodyWriter { xml, media, .. } = body;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let xml_parts = [
        ("[Content_Types].xml", parts::content_types(&media)),
        ("_rels/.rels", parts::package_rels()),
        ("docProps/core.xml", parts::core_properties(&doc.title)),
        ("docProps/app.xml", parts::app_properties()),
        ("word/document.xml", xml),
        ("word/styles.xml", parts::styles()),
        ("word/numbering.xml", parts::numbering()),
        ("word/settings.xml", parts::settings()),
        ("word/_rels/document.xml.rels", parts::document_rels(&media)),
    ];
    for (name, content) in xml_parts {
        zip.start_file(name, deflated)?;
        zip.write_all(content.as_bytes())?;
    }
    // already-compressed formats
    for part in &media {
        zip.start_file(format!("word/{}", part.target), stored)?;
        zip.write_all(part.data)?;
    }

    Ok(zip.finish()?.into_inner())
}

#[derive(Default)]
struct BodyWriter<'a> {
    xml: String,
    media: Vec<MediaPart<'a>>,
}

impl<'a> BodyWriter<'a> {
    fn write_document(&mut self, doc: &'a Document) {
        self.xml.push_str(XML_DECL);
        let _ = write!(
            self.xml,
            r#"<w:document xmlns:w="{WML_NS}" xmlns:r="{REL_NS}" xmlns:wp="{WPD_NS}" xmlns:a="{DML_NS}" xmlns:pic="{PIC_NS}"><w:body>"#
        );
        for block in &doc.body {
            self.write_block(block, TEXT_WIDTH);
        }
        let _ = write!(
            self.xml,
            r#"<w:sectPr><w:pgSz w:w="{PAGE_WIDTH}" w:h="{PAGE_HEIGHT}"/><w:pgMar w:top="{MARGIN_TOP}" w:right="{MARGIN_SIDE}" w:bottom="{MARGIN_TOP}" w:left="{MARGIN_SIDE}" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#
        );
        self.xml.push_str("</w:body></w:document>");
    }

    fn write_block(&mut self, block: &'a Block, width: i64) {
        match block {
            Block::Paragraph(p) => self.write_paragraph(p),
            Block::Table(t) => self.write_table(t, width),
        }
    }

    fn write_paragraph(&mut self, para: &'a Paragraph) {
        self.xml.push_str("<w:p>");
        let mut ppr = String::new();
        if para.style != ParagraphStyle::Normal {
            let _ = write!(ppr, r#"<w:pStyle w:val="{}"/>"#, para.style.id());
        }
        if let Some(indent) = para.left_indent {
            let _ = write!(ppr, r#"<w:ind w:left="{}"/>"#, indent.twips());
        }
        if let Some(alignment) = para.alignment {
            let jc = match alignment {
                Alignment::Left => "left",
                Alignment::Center => "center",
                Alignment::Right => "right",
                Alignment::Justify => "both",
            };
            let _ = write!(ppr, r#"<w:jc w:val="{jc}"/>"#);
        }
        if !ppr.is_empty() {
            let _ = write!(self.xml, "<w:pPr>{ppr}</w:pPr>");
        }

        // Consecutive runs pointing at the same bookmark share one hyperlink.
        let mut link: Option<&str> = None;
        for inline in &para.content {
            let anchor = match inline {
                Inline::Run(run) => run.anchor.as_deref(),
                _ => None,
            };
            if link.is_some() && link != anchor {
                self.xml.push_str("</w:hyperlink>");
                link = None;
            }
            if let Some(anchor) = anchor
                && link.is_none()
            {
                let _ = write!(
                    self.xml,
                    r#"<w:hyperlink w:anchor="{}" w:history="1">"#,
                    escape(anchor)
                );
                link = Some(anchor);
            }
            match inline {
                Inline::Run(run) => self.write_run(run),
                Inline::BookmarkStart { id, name } => {
                    let _ = write!(
                        self.xml,
                        r#"<w:bookmarkStart w:id="{id}" w:name="{}"/>"#,
                        escape(name.as_str())
                    );
                }
                Inline::BookmarkEnd { id } => {
                    let _ = write!(self.xml, r#"<w:bookmarkEnd w:id="{id}"/>"#);
                }
            }
        }
        if link.is_some() {
            self.xml.push_str("</w:hyperlink>");
        }
        self.xml.push_str("</w:p>");
    }

    fn write_run(&mut self, run: &'a Run) {
        self.xml.push_str("<w:r>");
        let rpr = run_properties(&run.font, run.anchor.is_some());
        if !rpr.is_empty() {
            let _ = write!(self.xml, "<w:rPr>{rpr}</w:rPr>");
        }
        for item in &run.content {
            match item {
                RunItem::Text(text) => {
                    let _ = write!(
                        self.xml,
                        r#"<w:t xml:space="preserve">{}</w:t>"#,
                        escape(text.as_str())
                    );
                }
                RunItem::Break => self.xml.push_str("<w:br/>"),
                RunItem::Tab => self.xml.push_str("<w:tab/>"),
                RunItem::Picture(picture) => self.write_drawing(picture),
            }
        }
        self.xml.push_str("</w:r>");
    }

    fn write_drawing(&mut self, picture: &'a Picture) {
        let n = self.media.len() + 1;
        let rel_id = format!("rId{}", n + 3);
        let file_name = format!("image{n}.{}", picture.format.extension());
        let Emu(cx) = picture.width;
        let Emu(cy) = picture.height;
        let _ = write!(
            self.xml,
            concat!(
                r#"<w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{n}" name="Picture {n}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="{pic}"><pic:pic>"#,
                r#"<pic:nvPicPr><pic:cNvPr id="0" name="{file}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                r#"</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>"#,
            ),
            cx = cx,
            cy = cy,
            n = n,
            pic = PIC_NS,
            file = file_name,
            rel = rel_id,
        );
        self.media.push(MediaPart {
            rel_id,
            target: format!("media/{file_name}"),
            format: picture.format,
            data: &picture.data,
        });
    }

    fn write_table(&mut self, table: &'a Table, width: i64) {
        let columns = table.column_count();
        if columns == 0 {
            return;
        }
        let col_width = width / columns as i64;
        let _ = write!(
            self.xml,
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="{width}" w:type="dxa"/><w:tblLook w:val="04A0"/></w:tblPr><w:tblGrid>"#
        );
        for _ in 0..columns {
            let _ = write!(self.xml, r#"<w:gridCol w:w="{col_width}"/>"#);
        }
        self.xml.push_str("</w:tblGrid>");

        for row in &table.rows {
            self.xml.push_str("<w:tr>");
            for i in 0..columns {
                let _ = write!(
                    self.xml,
                    r#"<w:tc><w:tcPr><w:tcW w:w="{col_width}" w:type="dxa"/></w:tcPr>"#
                );
                let blocks = row.cells.get(i).map(|c| c.blocks.as_slice()).unwrap_or_default();
                for block in blocks {
                    self.write_block(block, col_width);
                }
                // A cell must end with a paragraph.
                if !matches!(blocks.last(), Some(Block::Paragraph(_))) {
                    self.xml.push_str("<w:p/>");
                }
                self.xml.push_str("</w:tc>");
            }
            self.xml.push_str("</w:tr>");
        }
        self.xml.push_str("</w:tbl>");
    }
}

fn run_properties(font: &Font, hyperlink: bool) -> String {
    let mut rpr = String::new();
    if hyperlink {
        rpr.push_str(r#"<w:rStyle w:val="Hyperlink"/>"#);
    }
    if let Some(name) = &font.name {
        let name = escape(name.as_str());
        let _ = write!(
            rpr,
            r#"<w:rFonts w:ascii="{name}" w:hAnsi="{name}" w:cs="{name}"/>"#
        );
    }
    if font.bold {
        rpr.push_str("<w:b/>");
    }
    if font.italic {
        rpr.push_str("<w:i/>");
    }
    if font.strike {
        rpr.push_str("<w:strike/>");
    }
    if font.underline {
        rpr.push_str(r#"<w:u w:val="single"/>"#);
    }
    match font.vert_align {
        Some(VertAlign::Superscript) => rpr.push_str(r#"<w:vertAlign w:val="superscript"/>"#),
        Some(VertAlign::Subscript) => rpr.push_str(r#"<w:vertAlign w:val="subscript"/>"#),
        None => {}
    }
    rpr
}
