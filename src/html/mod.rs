//! Tag/text event source for the restricted markup emitted by rich-text editors.

mod tokenizer;

pub use tokenizer::{for_each_event, tokenize};

/// The closed vocabulary the converter understands. Anything else is carried
/// as [`Tag::Other`] and ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tag {
    A,
    B,
    Blockquote,
    Br,
    Code,
    Em,
    H(u8),
    I,
    Img,
    Li,
    Ol,
    P,
    Pre,
    Span,
    Strong,
    Sub,
    Sup,
    Table,
    Td,
    Th,
    Tr,
    U,
    Ul,
    Other(String),
}

impl Tag {
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "a" => Tag::A,
            "b" => Tag::B,
            "blockquote" => Tag::Blockquote,
            "br" => Tag::Br,
            "code" => Tag::Code,
            "em" => Tag::Em,
            "h1" => Tag::H(1),
            "h2" => Tag::H(2),
            "h3" => Tag::H(3),
            "h4" => Tag::H(4),
            "h5" => Tag::H(5),
            "h6" => Tag::H(6),
            "i" => Tag::I,
            "img" => Tag::Img,
            "li" => Tag::Li,
            "ol" => Tag::Ol,
            "p" => Tag::P,
            "pre" => Tag::Pre,
            "span" => Tag::Span,
            "strong" => Tag::Strong,
            "sub" => Tag::Sub,
            "sup" => Tag::Sup,
            "table" => Tag::Table,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "tr" => Tag::Tr,
            "u" => Tag::U,
            "ul" => Tag::Ul,
            _ => Tag::Other(name),
        }
    }

    /// Tags that only push a formatting scope.
    pub fn is_inline_formatting(&self) -> bool {
        matches!(
            self,
            Tag::B | Tag::Code | Tag::Em | Tag::I | Tag::Span | Tag::Strong | Tag::Sub | Tag::Sup | Tag::U
        )
    }
}

/// Attributes in source order. Names are lower-cased, values unescaped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Attributes(pairs)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Attributes(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HtmlEvent {
    Start(Tag, Attributes),
    End(Tag),
    Text(String),
}
