//! Fixed package parts: content types, relationships, metadata, styles and
//! numbering definitions.

use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::model::{ImageFormat, ParagraphStyle};

pub(super) const XML_DECL: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(super) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(super) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(super) const WPD_NS: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(super) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(super) const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub(super) const STYLES_REL: &str = "rId1";
pub(super) const NUMBERING_REL: &str = "rId2";
pub(super) const SETTINGS_REL: &str = "rId3";

/// Numbering instance ids used by the list paragraph styles.
const BULLET_NUM_ID: u32 = 1;
const DECIMAL_NUM_ID: u32 = 2;

pub(super) struct MediaPart<'a> {
    pub rel_id: String,
    /// Relative to `word/`.
    pub target: String,
    pub format: ImageFormat,
    pub data: &'a [u8],
}

pub(super) fn content_types(media: &[MediaPart<'_>]) -> String {
    let mut xml = String::from(XML_DECL);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut formats: Vec<ImageFormat> = Vec::new();
    for part in media {
        if !formats.contains(&part.format) {
            formats.push(part.format);
        }
    }
    for format in formats {
        let _ = write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.content_type()
        );
    }

    let overrides = [
        (
            "/word/document.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
        ),
        (
            "/word/styles.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
        ),
        (
            "/word/numbering.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml",
        ),
        (
            "/word/settings.xml",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml",
        ),
        (
            "/docProps/core.xml",
            "application/vnd.openxmlformats-package.core-properties+xml",
        ),
        (
            "/docProps/app.xml",
            "application/vnd.openxmlformats-officedocument.extended-properties+xml",
        ),
    ];
    for (part, content_type) in overrides {
        let _ = write!(
            xml,
            r#"<Override PartName="{part}" ContentType="{content_type}"/>"#
        );
    }
    xml.push_str("</Types>");
    xml
}

pub(super) fn package_rels() -> String {
    format!(
        r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_TYPE}/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="{REL_TYPE}/extended-properties" Target="docProps/app.xml"/></Relationships>"#
    )
}

pub(super) fn document_rels(media: &[MediaPart<'_>]) -> String {
    let mut xml = format!(r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}">"#);
    let _ = write!(
        xml,
        r#"<Relationship Id="{STYLES_REL}" Type="{REL_TYPE}/styles" Target="styles.xml"/><Relationship Id="{NUMBERING_REL}" Type="{REL_TYPE}/numbering" Target="numbering.xml"/><Relationship Id="{SETTINGS_REL}" Type="{REL_TYPE}/settings" Target="settings.xml"/>"#
    );
    for part in media {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="{REL_TYPE}/image" Target="{}"/>"#,
            part.rel_id, part.target
        );
    }
    xml.push_str("</Relationships>");
    xml
}

pub(super) fn core_properties(title: &str) -> String {
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title></cp:coreProperties>"#,
        escape(title)
    )
}

pub(super) fn app_properties() -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>html2docx/{}</Application></Properties>"#,
        env!("CARGO_PKG_VERSION")
    )
}

pub(super) fn settings() -> String {
    format!(
        r#"{XML_DECL}<w:settings xmlns:w="{WML_NS}"><w:defaultTabStop w:val="720"/><w:characterSpacingControl w:val="doNotCompress"/><w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat></w:settings>"#
    )
}

fn paragraph_style(xml: &mut String, style: ParagraphStyle, ppr: &str, rpr: &str) {
    let based_on = match style {
        ParagraphStyle::Normal => String::new(),
        ParagraphStyle::ListBullet(_) | ParagraphStyle::ListNumber(_) | ParagraphStyle::Quote => {
            r#"<w:basedOn w:val="Normal"/>"#.to_string()
        }
        _ => r#"<w:basedOn w:val="Normal"/><w:next w:val="Normal"/>"#.to_string(),
    };
    let default = if style == ParagraphStyle::Normal {
        r#" w:default="1""#
    } else {
        ""
    };
    let _ = write!(
        xml,
        r#"<w:style w:type="paragraph"{default} w:styleId="{}"><w:name w:val="{}"/>{based_on}<w:qFormat/>"#,
        style.id(),
        style.name()
    );
    if !ppr.is_empty() {
        let _ = write!(xml, "<w:pPr>{ppr}</w:pPr>");
    }
    if !rpr.is_empty() {
        let _ = write!(xml, "<w:rPr>{rpr}</w:rPr>");
    }
    xml.push_str("</w:style>");
}

/// Point size for headings 1 to 9, in half-points.
const HEADING_SIZES: [u32; 9] = [28, 26, 24, 22, 22, 22, 22, 22, 22];

pub(super) fn styles() -> String {
    let mut xml = format!(r#"{XML_DECL}<w:styles xmlns:w="{WML_NS}">"#);
    xml.push_str(
        r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:asciiTheme="minorHAnsi" w:hAnsiTheme="minorHAnsi" w:cs="Times New Roman"/><w:sz w:val="24"/><w:szCs w:val="24"/><w:lang w:val="en-US"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>"#,
    );

    paragraph_style(&mut xml, ParagraphStyle::Normal, "", "");
    paragraph_style(
        &mut xml,
        ParagraphStyle::Title,
        r#"<w:spacing w:after="300"/><w:contextualSpacing/>"#,
        r#"<w:color w:val="17365D"/><w:spacing w:val="5"/><w:kern w:val="28"/><w:sz w:val="52"/><w:szCs w:val="52"/>"#,
    );
    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = i as u8 + 1;
        let before = if level == 1 { 480 } else { 200 };
        let ppr = format!(
            r#"<w:keepNext/><w:keepLines/><w:spacing w:before="{before}" w:after="0"/><w:outlineLvl w:val="{i}"/>"#
        );
        let italic = if level >= 4 { "<w:i/><w:iCs/>" } else { "" };
        let rpr = format!(
            r#"<w:b/><w:bCs/>{italic}<w:color w:val="365F91"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#
        );
        paragraph_style(&mut xml, ParagraphStyle::Heading(level), &ppr, &rpr);
    }
    paragraph_style(
        &mut xml,
        ParagraphStyle::Quote,
        r#"<w:ind w:left="720" w:right="720"/>"#,
        r#"<w:i/><w:iCs/><w:color w:val="404040"/>"#,
    );
    for level in 1..=3u8 {
        let ilvl = level - 1;
        paragraph_style(
            &mut xml,
            ParagraphStyle::ListBullet(level),
            &format!(
                r#"<w:numPr><w:ilvl w:val="{ilvl}"/><w:numId w:val="{BULLET_NUM_ID}"/></w:numPr><w:contextualSpacing/>"#
            ),
            "",
        );
        paragraph_style(
            &mut xml,
            ParagraphStyle::ListNumber(level),
            &format!(
                r#"<w:numPr><w:ilvl w:val="{ilvl}"/><w:numId w:val="{DECIMAL_NUM_ID}"/></w:numPr><w:contextualSpacing/>"#
            ),
            "",
        );
    }

    xml.push_str(
        r#"<w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0000FF"/><w:u w:val="single"/></w:rPr></w:style>"#,
    );
    xml.push_str(
        r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders><w:tblCellMar><w:left w:w="108" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>"#,
    );
    xml.push_str("</w:styles>");
    xml
}

fn abstract_num(xml: &mut String, id: u32, format: &str, texts: [&str; 3]) {
    let _ = write!(
        xml,
        r#"<w:abstractNum w:abstractNumId="{id}"><w:multiLevelType w:val="hybridMultilevel"/>"#
    );
    for (ilvl, text) in texts.iter().enumerate() {
        let left = 720 * (ilvl + 1);
        let _ = write!(
            xml,
            r#"<w:lvl w:ilvl="{ilvl}"><w:start w:val="1"/><w:numFmt w:val="{format}"/><w:lvlText w:val="{text}"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="{left}" w:hanging="360"/></w:pPr></w:lvl>"#
        );
    }
    xml.push_str("</w:abstractNum>");
}

pub(super) fn numbering() -> String {
    let mut xml = format!(r#"{XML_DECL}<w:numbering xmlns:w="{WML_NS}">"#);
    abstract_num(&mut xml, 0, "bullet", ["\u{2022}", "\u{25E6}", "\u{25AA}"]);
    abstract_num(&mut xml, 1, "decimal", ["%1.", "%2.", "%3."]);
    let _ = write!(
        xml,
        r#"<w:num w:numId="{BULLET_NUM_ID}"><w:abstractNumId w:val="0"/></w:num><w:num w:numId="{DECIMAL_NUM_ID}"><w:abstractNumId w:val="1"/></w:num>"#
    );
    xml.push_str("</w:numbering>");
    xml
}
