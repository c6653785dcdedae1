#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::{fs, io};

use html2docx::{ConvertOptions, FetchOptions, ImageResolver};

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().namespace() == Some(WML_NS) && n.tag_name().name() == name)
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().namespace() == Some(WML_NS) && node.tag_name().name() == name
}

/// Convert with remote images disabled.
pub fn convert(html: &str, title: &str) -> Vec<u8> {
    let options = ConvertOptions::default();
    let images = ImageResolver::offline(FetchOptions::default());
    html2docx::convert_html_to_docx_with(html, title, &options, &images)
        .expect("conversion failed")
}

#[derive(Debug, Default, Clone)]
pub struct RunInfo {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub subscript: bool,
    pub superscript: bool,
    pub font: Option<String>,
    /// Anchor of the enclosing `w:hyperlink`.
    pub hyperlink: Option<String>,
    /// (cx, cy) of each inline drawing, in EMU.
    pub extents: Vec<(i64, i64)>,
}

#[derive(Debug, Default, Clone)]
pub struct ParagraphInfo {
    /// Style display name.
    pub style: String,
    pub alignment: Option<String>,
    pub left_indent: Option<i64>,
    pub runs: Vec<RunInfo>,
    pub bookmarks: Vec<String>,
    /// Local names of the paragraph's children after `w:pPr`.
    pub children: Vec<String>,
}

impl ParagraphInfo {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub enum BodyItem {
    Paragraph(ParagraphInfo),
    Table(TableInfo),
}

#[derive(Debug, Default, Clone)]
pub struct TableInfo {
    pub grid_columns: usize,
    pub rows: Vec<Vec<Vec<BodyItem>>>,
}

impl TableInfo {
    pub fn cell(&self, row: usize, col: usize) -> &[BodyItem] {
        &self.rows[row][col]
    }

    /// Paragraph texts of a cell joined by newlines, like a word processor reports it.
    pub fn cell_text(&self, row: usize, col: usize) -> String {
        paragraphs(self.cell(row, col))
            .map(ParagraphInfo::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn cell_tables(&self, row: usize, col: usize) -> Vec<&TableInfo> {
        tables(self.cell(row, col)).collect()
    }
}

pub fn paragraphs(items: &[BodyItem]) -> impl Iterator<Item = &ParagraphInfo> {
    items.iter().filter_map(|item| match item {
        BodyItem::Paragraph(p) => Some(p),
        BodyItem::Table(_) => None,
    })
}

pub fn tables(items: &[BodyItem]) -> impl Iterator<Item = &TableInfo> {
    items.iter().filter_map(|item| match item {
        BodyItem::Table(t) => Some(t),
        BodyItem::Paragraph(_) => None,
    })
}

#[derive(Debug)]
pub struct Package {
    pub title: String,
    pub body: Vec<BodyItem>,
    pub part_names: Vec<String>,
}

impl Package {
    pub fn paragraphs(&self) -> Vec<&ParagraphInfo> {
        paragraphs(&self.body).collect()
    }

    pub fn tables(&self) -> Vec<&TableInfo> {
        tables(&self.body).collect()
    }
}

fn read_part(zip: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> String {
    let mut content = String::new();
    zip.by_name(name)
        .unwrap_or_else(|e| panic!("missing {name}: {e}"))
        .read_to_string(&mut content)
        .unwrap();
    content
}

/// Read a produced package back into the inspection model.
pub fn read_package(bytes: &[u8]) -> Package {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).expect("not a zip archive");
    let part_names = zip.file_names().map(str::to_string).collect();

    let styles_xml = read_part(&mut zip, "word/styles.xml");
    let styles = roxmltree::Document::parse(&styles_xml).unwrap();
    let mut style_names = HashMap::new();
    for style in styles.root_element().children().filter(|n| is_wml(*n, "style")) {
        if let (Some(id), Some(name)) = (style.attribute((WML_NS, "styleId")), wml_attr(style, "name")) {
            style_names.insert(id.to_string(), name.to_string());
        }
    }

    let core_xml = read_part(&mut zip, "docProps/core.xml");
    let core = roxmltree::Document::parse(&core_xml).unwrap();
    let title = core
        .descendants()
        .find(|n| n.tag_name().name() == "title")
        .and_then(|n| n.text())
        .unwrap_or_default()
        .to_string();

    let document_xml = read_part(&mut zip, "word/document.xml");
    let document = roxmltree::Document::parse(&document_xml).unwrap();
    let body = wml(document.root_element(), "body").expect("no w:body");

    Package {
        title,
        body: read_blocks(body, &style_names),
        part_names,
    }
}

fn read_blocks(parent: roxmltree::Node, styles: &HashMap<String, String>) -> Vec<BodyItem> {
    let mut items = Vec::new();
    for node in parent.children() {
        if is_wml(node, "p") {
            items.push(BodyItem::Paragraph(read_paragraph(node, styles)));
        } else if is_wml(node, "tbl") {
            items.push(BodyItem::Table(read_table(node, styles)));
        }
    }
    items
}

fn read_table(tbl: roxmltree::Node, styles: &HashMap<String, String>) -> TableInfo {
    let grid_columns = wml(tbl, "tblGrid")
        .map(|g| g.children().filter(|n| is_wml(*n, "gridCol")).count())
        .unwrap_or(0);
    let rows = tbl
        .children()
        .filter(|n| is_wml(*n, "tr"))
        .map(|tr| {
            tr.children()
                .filter(|n| is_wml(*n, "tc"))
                .map(|tc| read_blocks(tc, styles))
                .collect()
        })
        .collect();
    TableInfo { grid_columns, rows }
}

fn read_paragraph(p: roxmltree::Node, styles: &HashMap<String, String>) -> ParagraphInfo {
    let ppr = wml(p, "pPr");
    let style_id = ppr.and_then(|ppr| wml_attr(ppr, "pStyle")).unwrap_or("Normal");
    let mut info = ParagraphInfo {
        style: styles
            .get(style_id)
            .cloned()
            .unwrap_or_else(|| style_id.to_string()),
        alignment: ppr.and_then(|ppr| wml_attr(ppr, "jc")).map(str::to_string),
        left_indent: ppr
            .and_then(|ppr| wml(ppr, "ind"))
            .and_then(|ind| ind.attribute((WML_NS, "left")))
            .and_then(|v| v.parse().ok()),
        ..ParagraphInfo::default()
    };

    for child in p.children().filter(|n| n.is_element()) {
        let name = child.tag_name().name();
        if name == "pPr" {
            continue;
        }
        info.children.push(name.to_string());
        match name {
            "r" => info.runs.push(read_run(child, None)),
            "hyperlink" => {
                let anchor = child.attribute((WML_NS, "anchor")).map(str::to_string);
                for r in child.children().filter(|n| is_wml(*n, "r")) {
                    info.runs.push(read_run(r, anchor.clone()));
                }
            }
            "bookmarkStart" => {
                if let Some(name) = child.attribute((WML_NS, "name")) {
                    info.bookmarks.push(name.to_string());
                }
            }
            _ => {}
        }
    }
    info
}

fn read_run(r: roxmltree::Node, hyperlink: Option<String>) -> RunInfo {
    let mut run = RunInfo {
        hyperlink,
        ..RunInfo::default()
    };
    if let Some(rpr) = wml(r, "rPr") {
        run.bold = wml(rpr, "b").is_some();
        run.italic = wml(rpr, "i").is_some();
        run.underline = wml(rpr, "u").is_some();
        run.strike = wml(rpr, "strike").is_some();
        run.font = wml(rpr, "rFonts")
            .and_then(|f| f.attribute((WML_NS, "ascii")))
            .map(str::to_string);
        match wml_attr(rpr, "vertAlign") {
            Some("subscript") => run.subscript = true,
            Some("superscript") => run.superscript = true,
            _ => {}
        }
    }
    for child in r.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "t" => run.text.push_str(child.text().unwrap_or_default()),
            "br" => run.text.push('\n'),
            "tab" => run.text.push('\t'),
            "drawing" => {
                for extent in child
                    .descendants()
                    .filter(|n| n.tag_name().namespace() == Some(WPD_NS) && n.tag_name().name() == "extent")
                {
                    let cx = extent.attribute("cx").and_then(|v| v.parse().ok()).unwrap_or(0);
                    let cy = extent.attribute("cy").and_then(|v| v.parse().ok()).unwrap_or(0);
                    run.extents.push((cx, cy));
                }
            }
            _ => {}
        }
    }
    run
}

fn load_skiplist() -> HashSet<String> {
    let path = Path::new("tests/fixtures/SKIPLIST");
    let Ok(content) = fs::read_to_string(path) else {
        return HashSet::new();
    };
    content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect()
}

pub fn group_name(fixture: &Path) -> String {
    fixture
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

pub fn display_name(fixture: &Path) -> String {
    let case = fixture.file_name().unwrap().to_string_lossy();
    format!("{}/{}", group_name(fixture), case)
}

/// Discover fixtures under tests/fixtures/<group>/<case>/.
/// Filter with HTML2DOCX_CASE (case name) and HTML2DOCX_GROUP (folder name).
pub fn discover_fixtures() -> io::Result<Vec<PathBuf>> {
    let fixtures_dir = Path::new("tests/fixtures");
    let case_filter = std::env::var("HTML2DOCX_CASE").ok();
    let group_filter = std::env::var("HTML2DOCX_GROUP").ok();
    let skiplist = load_skiplist();
    let mut fixtures: Vec<PathBuf> = Vec::new();
    for group_entry in fs::read_dir(fixtures_dir)? {
        let group = group_entry?.path();
        if !group.is_dir() {
            continue;
        }
        let gname = group.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if let Some(ref gf) = group_filter
            && gname != gf.as_str()
        {
            continue;
        }
        for entry in fs::read_dir(&group)? {
            let path = entry?.path();
            if !path.join("input.html").is_file() {
                continue;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if let Some(ref filter) = case_filter {
                if name == filter.as_str() {
                    fixtures.push(path);
                }
            } else if !skiplist.contains(name) && !skiplist.contains(gname) {
                fixtures.push(path);
            }
        }
    }
    fixtures.sort();
    Ok(fixtures)
}
