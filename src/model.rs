/// English Metric Units: the native length of WordprocessingML drawings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Emu(pub i64);

impl Emu {
    pub const PER_INCH: i64 = 914_400;
    pub const PER_POINT: i64 = 12_700;

    /// Truncates toward zero, like an integer cast.
    pub fn from_inches(inches: f64) -> Self {
        Emu((inches * Self::PER_INCH as f64) as i64)
    }

    pub fn from_pt(points: f64) -> Self {
        Emu((points * Self::PER_POINT as f64) as i64)
    }

    pub fn inches(self) -> f64 {
        self.0 as f64 / Self::PER_INCH as f64
    }

    pub fn pt(self) -> f64 {
        self.0 as f64 / Self::PER_POINT as f64
    }

    pub fn twips(self) -> i64 {
        self.0 / 635
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn from_keyword(val: &str) -> Option<Self> {
        match val.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertAlign {
    Superscript,
    Subscript,
}

/// Named paragraph styles available in the bundled styles part.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParagraphStyle {
    #[default]
    Normal,
    Title,
    Heading(u8),
    Quote,
    ListBullet(u8),
    ListNumber(u8),
}

impl ParagraphStyle {
    /// Display name, as shown in a word processor's style gallery.
    pub fn name(self) -> String {
        match self {
            ParagraphStyle::Normal => "Normal".to_string(),
            ParagraphStyle::Title => "Title".to_string(),
            ParagraphStyle::Heading(level) => format!("Heading {level}"),
            ParagraphStyle::Quote => "Quote".to_string(),
            ParagraphStyle::ListBullet(1) => "List Bullet".to_string(),
            ParagraphStyle::ListBullet(level) => format!("List Bullet {level}"),
            ParagraphStyle::ListNumber(1) => "List Number".to_string(),
            ParagraphStyle::ListNumber(level) => format!("List Number {level}"),
        }
    }

    /// Style id referenced from `w:pStyle`.
    pub fn id(self) -> String {
        self.name().replace(' ', "")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Font {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub vert_align: Option<VertAlign>,
    pub name: Option<String>,
}

impl Font {
    pub fn is_plain(&self) -> bool {
        *self == Font::default()
    }
}

/// A single font setting, as pushed by a formatting scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontAttribute {
    Bold,
    Italic,
    Underline,
    Strike,
    Subscript,
    Superscript,
    Name(String),
}

impl Font {
    pub fn apply(&mut self, attr: &FontAttribute) {
        match attr {
            FontAttribute::Bold => self.bold = true,
            FontAttribute::Italic => self.italic = true,
            FontAttribute::Underline => self.underline = true,
            FontAttribute::Strike => self.strike = true,
            FontAttribute::Subscript => self.vert_align = Some(VertAlign::Subscript),
            FontAttribute::Superscript => self.vert_align = Some(VertAlign::Superscript),
            FontAttribute::Name(name) => self.name = Some(name.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Bmp => "image/bmp",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Picture {
    pub data: Vec<u8>,
    pub format: ImageFormat,
    pub width: Emu,
    pub height: Emu,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunItem {
    Text(String),
    Break,
    Tab,
    Picture(Picture),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Run {
    pub font: Font,
    /// Bookmark name this run links to, rendered inside a `w:hyperlink`.
    pub anchor: Option<String>,
    pub content: Vec<RunItem>,
}

impl Run {
    /// Text as a word processor reports it: breaks read as newlines, tabs as tabs.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for item in &self.content {
            match item {
                RunItem::Text(t) => text.push_str(t),
                RunItem::Break => text.push('\n'),
                RunItem::Tab => text.push('\t'),
                RunItem::Picture(_) => {}
            }
        }
        text
    }

    pub fn pictures(&self) -> impl Iterator<Item = &Picture> {
        self.content.iter().filter_map(|item| match item {
            RunItem::Picture(p) => Some(p),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Run(Run),
    BookmarkStart { id: u32, name: String },
    BookmarkEnd { id: u32 },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub alignment: Option<Alignment>,
    pub left_indent: Option<Emu>,
    pub content: Vec<Inline>,
}

impl Paragraph {
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Run(r) => Some(r),
            _ => None,
        })
    }

    pub fn text(&self) -> String {
        self.runs().map(Run::text).collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub blocks: Vec<Block>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub title: String,
    pub body: Vec<Block>,
}

impl Document {
    /// Top-level paragraphs in document order, skipping tables.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|block| match block {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }
}
