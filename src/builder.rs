use crate::model::{
    Alignment, Block, Cell, Document, Emu, FontAttribute, Inline, Paragraph, ParagraphStyle,
    Picture, Row, Run, RunItem, Table,
};

/// Index of a paragraph in the container that was current when it was created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParagraphHandle(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunHandle {
    paragraph: usize,
    inline: usize,
}

impl RunHandle {
    pub fn paragraph(self) -> ParagraphHandle {
        ParagraphHandle(self.paragraph)
    }
}

/// Append-only owner of the document under construction.
///
/// Handles are plain indices into the current container (the body, or the
/// innermost open table cell). They go stale once a table is opened or
/// closed; operations on a stale handle are ignored.
#[derive(Default)]
pub struct DocumentBuilder {
    doc: Document,
    open_tables: Vec<Table>,
    next_bookmark_id: u32,
}

fn last_or_insert<T: Default>(items: &mut Vec<T>) -> &mut T {
    if items.is_empty() {
        items.push(T::default());
    }
    let last = items.len() - 1;
    &mut items[last]
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_title(&mut self, title: &str) {
        self.doc.title = title.to_string();
    }

    fn blocks_mut(&mut self) -> &mut Vec<Block> {
        match self.open_tables.last_mut() {
            None => &mut self.doc.body,
            Some(table) => {
                let row = last_or_insert(&mut table.rows);
                &mut last_or_insert(&mut row.cells).blocks
            }
        }
    }

    fn paragraph_mut(&mut self, p: ParagraphHandle) -> Option<&mut Paragraph> {
        match self.blocks_mut().get_mut(p.0) {
            Some(Block::Paragraph(para)) => Some(para),
            _ => None,
        }
    }

    fn run_mut(&mut self, r: RunHandle) -> Option<&mut Run> {
        match self.paragraph_mut(r.paragraph())?.content.get_mut(r.inline) {
            Some(Inline::Run(run)) => Some(run),
            _ => None,
        }
    }

    pub fn add_paragraph(&mut self, style: ParagraphStyle) -> ParagraphHandle {
        let blocks = self.blocks_mut();
        blocks.push(Block::Paragraph(Paragraph {
            style,
            ..Paragraph::default()
        }));
        ParagraphHandle(blocks.len() - 1)
    }

    /// Level 0 is the document title style; levels past 9 are clamped.
    pub fn add_heading(&mut self, level: u8) -> ParagraphHandle {
        let style = match level {
            0 => ParagraphStyle::Title,
            level => ParagraphStyle::Heading(level.min(9)),
        };
        self.add_paragraph(style)
    }

    pub fn set_alignment(&mut self, p: ParagraphHandle, alignment: Alignment) {
        if let Some(para) = self.paragraph_mut(p) {
            para.alignment = Some(alignment);
        }
    }

    pub fn set_left_indent(&mut self, p: ParagraphHandle, indent: Emu) {
        if let Some(para) = self.paragraph_mut(p) {
            para.left_indent = Some(indent);
        }
    }

    pub fn has_runs(&mut self, p: ParagraphHandle) -> bool {
        self.paragraph_mut(p)
            .is_some_and(|para| para.runs().next().is_some())
    }

    fn push_inline(&mut self, p: ParagraphHandle, inline: Inline) -> Option<usize> {
        let para = self.paragraph_mut(p)?;
        para.content.push(inline);
        Some(para.content.len() - 1)
    }

    pub fn add_run(&mut self, p: ParagraphHandle) -> RunHandle {
        let inline = self
            .push_inline(p, Inline::Run(Run::default()))
            .unwrap_or(usize::MAX);
        RunHandle {
            paragraph: p.0,
            inline,
        }
    }

    pub fn set_font_attribute(&mut self, r: RunHandle, attr: &FontAttribute) {
        if let Some(run) = self.run_mut(r) {
            run.font.apply(attr);
        }
    }

    pub fn set_run_anchor(&mut self, r: RunHandle, anchor: &str) {
        if let Some(run) = self.run_mut(r) {
            run.anchor = Some(anchor.to_string());
        }
    }

    /// Append text; `\n` becomes a break and `\t` a tab.
    pub fn add_text(&mut self, r: RunHandle, text: &str) {
        let Some(run) = self.run_mut(r) else {
            return;
        };
        let mut pending = String::new();
        for ch in text.chars() {
            let item = match ch {
                '\n' => RunItem::Break,
                '\t' => RunItem::Tab,
                '\r' => continue,
                ch => {
                    pending.push(ch);
                    continue;
                }
            };
            push_text(&mut run.content, &mut pending);
            run.content.push(item);
        }
        push_text(&mut run.content, &mut pending);
    }

    pub fn add_break(&mut self, r: RunHandle) {
        if let Some(run) = self.run_mut(r) {
            run.content.push(RunItem::Break);
        }
    }

    pub fn add_picture(&mut self, p: ParagraphHandle, picture: Picture) -> RunHandle {
        let run = Run {
            content: vec![RunItem::Picture(picture)],
            ..Run::default()
        };
        let inline = self.push_inline(p, Inline::Run(run)).unwrap_or(usize::MAX);
        RunHandle {
            paragraph: p.0,
            inline,
        }
    }

    /// Strip trailing whitespace, breaks and tabs from the paragraph's last
    /// run. A run left with nothing is removed from the paragraph instead of
    /// being written as an empty `w:r`.
    pub fn trim_end(&mut self, p: ParagraphHandle) {
        let Some(para) = self.paragraph_mut(p) else {
            return;
        };
        let Some(last) = para
            .content
            .iter()
            .rposition(|inline| matches!(inline, Inline::Run(_)))
        else {
            return;
        };
        let Inline::Run(run) = &mut para.content[last] else {
            return;
        };
        while let Some(item) = run.content.last_mut() {
            match item {
                RunItem::Break | RunItem::Tab => {
                    run.content.pop();
                }
                RunItem::Text(text) => {
                    let trimmed = text.trim_end().len();
                    text.truncate(trimmed);
                    if !text.is_empty() {
                        break;
                    }
                    run.content.pop();
                }
                RunItem::Picture(_) => break,
            }
        }
        if run.content.is_empty() {
            para.content.remove(last);
        }
    }

    pub fn add_bookmark_start(&mut self, p: ParagraphHandle, name: &str) -> u32 {
        let id = self.next_bookmark_id;
        self.next_bookmark_id += 1;
        self.push_inline(
            p,
            Inline::BookmarkStart {
                id,
                name: name.to_string(),
            },
        );
        id
    }

    pub fn add_bookmark_end(&mut self, p: ParagraphHandle, id: u32) {
        self.push_inline(p, Inline::BookmarkEnd { id });
    }

    /// Open a table in the current container. Content goes to its cells
    /// until [`DocumentBuilder::end_table`].
    pub fn start_table(&mut self) {
        self.open_tables.push(Table::default());
    }

    pub fn start_row(&mut self) {
        if let Some(table) = self.open_tables.last_mut() {
            table.rows.push(Row::default());
        }
    }

    pub fn start_cell(&mut self) {
        if let Some(table) = self.open_tables.last_mut() {
            last_or_insert(&mut table.rows).cells.push(Cell::default());
        }
    }

    pub fn end_table(&mut self) {
        if let Some(table) = self.open_tables.pop() {
            self.blocks_mut().push(Block::Table(table));
        }
    }

    pub fn finish(mut self) -> Document {
        while !self.open_tables.is_empty() {
            self.end_table();
        }
        self.doc
    }
}

fn push_text(content: &mut Vec<RunItem>, pending: &mut String) {
    if pending.is_empty() {
        return;
    }
    if let Some(RunItem::Text(last)) = content.last_mut() {
        last.push_str(pending);
        pending.clear();
    } else {
        content.push(RunItem::Text(std::mem::take(pending)));
    }
}
