//! Terminal rendering of bot markdown.
//!
//! Bot turns arrive as GitHub-flavored markdown.  [`render_markdown`] turns
//! them into plain or ANSI-styled text suitable for a terminal: tables are laid
//! out in aligned columns, lists and block quotes are indented, and inline
//! emphasis maps onto ANSI attributes.

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag};

const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_ITALIC: &str = "\x1b[3m";
const ANSI_UNDERLINE: &str = "\x1b[4m";
const ANSI_STRIKE: &str = "\x1b[9m";
const ANSI_CYAN: &str = "\x1b[36m";
const ANSI_RESET: &str = "\x1b[0m";

/// How markdown should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownStyle {
    /// Emit ANSI escape codes.
    pub use_color: bool,
    /// Width used for horizontal rules.
    pub width: usize,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            use_color: true,
            width: 80,
        }
    }
}

/// Renders `text` for display in a terminal.
pub fn render_markdown(text: &str, style: &MarkdownStyle) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    let mut writer = MarkdownWriter::new(*style);
    for event in Parser::new_ext(text, options) {
        writer.event(event);
    }
    writer.finish()
}

//////////////////////////////////////////// MarkdownWriter ////////////////////////////////////////////

struct MarkdownWriter {
    style: MarkdownStyle,
    out: String,
    line_start: bool,
    styles: Vec<&'static str>,
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    links: Vec<String>,
    table: Option<TableBuilder>,
}

impl MarkdownWriter {
    fn new(style: MarkdownStyle) -> Self {
        Self {
            style,
            out: String::new(),
            line_start: true,
            styles: Vec::new(),
            lists: Vec::new(),
            quote_depth: 0,
            in_code_block: false,
            links: Vec::new(),
            table: None,
        }
    }

    fn finish(mut self) -> String {
        let trimmed = self.out.trim_end_matches('\n').len();
        self.out.truncate(trimmed);
        self.out
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block && self.table.is_none() {
                    self.push_code(&text);
                } else {
                    self.push_inline(&text);
                }
            }
            Event::Code(code) => {
                if self.style.use_color {
                    self.push_inline(&format!("{ANSI_CYAN}{code}{ANSI_RESET}"));
                    self.reapply_styles();
                } else if self.table.is_some() {
                    self.push_inline(&code);
                } else {
                    self.push_inline(&format!("`{code}`"));
                }
            }
            Event::Html(html) => self.push_inline(&html),
            Event::SoftBreak => self.push_inline(" "),
            Event::HardBreak => self.newline(),
            Event::Rule => {
                self.block_break();
                let ch = if self.style.use_color { "─" } else { "-" };
                self.push_text(&ch.repeat(self.style.width.max(3)));
                self.newline();
            }
            Event::TaskListMarker(checked) => {
                self.push_inline(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.block_break();
                } else if !self.line_start {
                    self.newline();
                }
            }
            Tag::Heading(..) => {
                self.block_break();
                self.push_style(ANSI_BOLD);
                if !self.style.use_color {
                    self.push_text("# ");
                }
            }
            Tag::BlockQuote => {
                self.block_break();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.block_break();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    self.push_text(&self.dimmed(&format!("[{lang}]")));
                    self.newline();
                }
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.block_break();
                } else if !self.line_start {
                    self.newline();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                if !self.line_start {
                    self.newline();
                }
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.write_line_prefix(depth);
                self.out.push_str(&marker);
                self.line_start = false;
            }
            Tag::Table(alignments) => {
                self.block_break();
                self.table = Some(TableBuilder::new(alignments));
            }
            Tag::TableHead | Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.start_row();
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.start_cell();
                }
            }
            Tag::Emphasis => self.push_style(ANSI_ITALIC),
            Tag::Strong => self.push_style(ANSI_BOLD),
            Tag::Strikethrough => self.push_style(ANSI_STRIKE),
            Tag::Link(_, dest, _) => {
                self.links.push(dest.to_string());
                self.push_style(ANSI_UNDERLINE);
            }
            Tag::Image(_, dest, _) => {
                self.links.push(dest.to_string());
                self.push_inline("[image: ");
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.newline(),
            Tag::Heading(..) => {
                self.pop_style();
                self.newline();
            }
            Tag::BlockQuote => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                if !self.line_start {
                    self.newline();
                }
            }
            Tag::CodeBlock(_) => {
                self.in_code_block = false;
                if !self.line_start {
                    self.newline();
                }
            }
            Tag::List(_) => {
                self.lists.pop();
                if !self.line_start {
                    self.newline();
                }
            }
            Tag::Item => {
                if !self.line_start {
                    self.newline();
                }
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row(true);
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_row(false);
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.finish_cell();
                }
            }
            Tag::Table(_) => {
                if let Some(table) = self.table.take() {
                    for line in table.render(self.style.use_color) {
                        self.push_text(&line);
                        self.newline();
                    }
                }
            }
            Tag::Emphasis | Tag::Strong | Tag::Strikethrough => self.pop_style(),
            Tag::Link(..) => {
                let dest = self.links.pop().unwrap_or_default();
                let autolinked = self.current_inline().ends_with(dest.as_str());
                self.pop_style();
                if !dest.is_empty() && !autolinked {
                    self.push_inline(&format!(" ({dest})"));
                }
            }
            Tag::Image(..) => {
                let dest = self.links.pop().unwrap_or_default();
                self.push_inline(&format!("]({dest})"));
            }
            _ => {}
        }
    }

    fn push_style(&mut self, code: &'static str) {
        self.styles.push(code);
        if self.style.use_color {
            self.push_escape(code);
        }
    }

    fn pop_style(&mut self) {
        self.styles.pop();
        if self.style.use_color {
            self.push_escape(ANSI_RESET);
            self.reapply_styles();
        }
    }

    fn reapply_styles(&mut self) {
        if self.style.use_color {
            let codes = self.styles.concat();
            self.push_escape(&codes);
        }
    }

    /// Writes an escape sequence into the open table cell, or the output.
    fn push_escape(&mut self, code: &str) {
        match self.table.as_mut() {
            Some(table) => table.push_text(code),
            None => self.out.push_str(code),
        }
    }

    /// Writes inline text into the open table cell, or the output.
    fn push_inline(&mut self, text: &str) {
        match self.table.as_mut() {
            Some(table) => table.push_text(text),
            None => self.push_text(text),
        }
    }

    fn current_inline(&self) -> &str {
        match &self.table {
            Some(table) => &table.cell,
            None => &self.out,
        }
    }

    fn dimmed(&self, text: &str) -> String {
        if self.style.use_color {
            format!("{ANSI_DIM}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn write_line_prefix(&mut self, list_depth: usize) {
        for _ in 0..self.quote_depth {
            self.out.push_str("> ");
        }
        for _ in 0..list_depth {
            self.out.push_str("  ");
        }
    }

    fn push_text(&mut self, text: &str) {
        for segment in text.split_inclusive('\n') {
            if self.line_start {
                self.write_line_prefix(self.lists.len());
                self.line_start = false;
            }
            self.out.push_str(segment);
            if segment.ends_with('\n') {
                self.line_start = true;
            }
        }
    }

    fn push_code(&mut self, text: &str) {
        for segment in text.split_inclusive('\n') {
            let (line, newline) = match segment.strip_suffix('\n') {
                Some(line) => (line, true),
                None => (segment, false),
            };
            if self.line_start {
                self.write_line_prefix(self.lists.len());
                self.out.push_str("    ");
                self.line_start = false;
            }
            if self.style.use_color && !line.is_empty() {
                self.out.push_str(ANSI_CYAN);
                self.out.push_str(line);
                self.out.push_str(ANSI_RESET);
            } else {
                self.out.push_str(line);
            }
            if newline {
                self.newline();
            }
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.line_start = true;
    }

    /// Ensures the next block starts after a blank line.
    fn block_break(&mut self) {
        if self.out.is_empty() {
            return;
        }
        if !self.line_start {
            self.newline();
        }
        if !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
        self.line_start = true;
    }
}

//////////////////////////////////////////// TableBuilder ////////////////////////////////////////////

struct TableBuilder {
    alignments: Vec<Alignment>,
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl TableBuilder {
    fn new(alignments: Vec<Alignment>) -> Self {
        Self {
            alignments,
            header: None,
            rows: Vec::new(),
            row: Vec::new(),
            cell: String::new(),
        }
    }

    fn start_row(&mut self) {
        self.row.clear();
    }

    fn start_cell(&mut self) {
        self.cell.clear();
    }

    fn push_text(&mut self, text: &str) {
        self.cell.push_str(text);
    }

    fn finish_cell(&mut self) {
        self.row.push(self.cell.trim().to_string());
        self.cell.clear();
    }

    fn finish_row(&mut self, header: bool) {
        let row = std::mem::take(&mut self.row);
        if header {
            self.header = Some(row);
        } else {
            self.rows.push(row);
        }
    }

    fn column_count(&self) -> usize {
        self.header
            .iter()
            .chain(self.rows.iter())
            .map(Vec::len)
            .chain(std::iter::once(self.alignments.len()))
            .max()
            .unwrap_or(0)
    }

    fn render(&self, use_color: bool) -> Vec<String> {
        let columns = self.column_count();
        if columns == 0 {
            return Vec::new();
        }
        let mut widths = vec![1usize; columns];
        for row in self.header.iter().chain(self.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(display_width(cell));
            }
        }

        let (vertical, horizontal, cross) = if use_color {
            ("│", "─", "┼")
        } else {
            ("|", "-", "+")
        };

        let format_row = |row: &[String], bold: bool| -> String {
            let cells = (0..columns)
                .map(|i| {
                    let text = row.get(i).map(String::as_str).unwrap_or("");
                    let alignment = self.alignments.get(i).copied().unwrap_or(Alignment::None);
                    let padded = pad(text, widths[i], alignment);
                    if bold && use_color {
                        format!(" {ANSI_BOLD}{padded}{ANSI_RESET} ")
                    } else {
                        format!(" {padded} ")
                    }
                })
                .collect::<Vec<_>>();
            format!("{vertical}{}{vertical}", cells.join(vertical))
        };

        let mut lines = Vec::new();
        if let Some(header) = &self.header {
            lines.push(format_row(header, true));
            let separator = widths
                .iter()
                .map(|w| horizontal.repeat(w + 2))
                .collect::<Vec<_>>()
                .join(cross);
            lines.push(format!("{vertical}{separator}{vertical}"));
        }
        for row in &self.rows {
            lines.push(format_row(row, false));
        }
        lines
    }
}

/// Counts visible characters, skipping ANSI escape sequences.
fn display_width(text: &str) -> usize {
    let mut width = 0;
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            for ch in chars.by_ref() {
                if ch.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn pad(text: &str, width: usize, alignment: Alignment) -> String {
    let fill = width.saturating_sub(display_width(text));
    match alignment {
        Alignment::Right => format!("{}{text}", " ".repeat(fill)),
        Alignment::Center => {
            let left = fill / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(fill - left))
        }
        Alignment::Left | Alignment::None => format!("{text}{}", " ".repeat(fill)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> String {
        render_markdown(
            text,
            &MarkdownStyle {
                use_color: false,
                width: 20,
            },
        )
    }

    #[test]
    fn paragraphs() {
        assert_eq!(plain("hello\nworld"), "hello world");
        assert_eq!(plain("one\n\ntwo"), "one\n\ntwo");
    }

    #[test]
    fn table_columns_align() {
        let text = "| Name | Score |\n|:-----|------:|\n| alice | 7 |\n| bob | 12 |";
        assert_eq!(
            plain(text),
            "| Name  | Score |\n\
             |-------+-------|\n\
             | alice |     7 |\n\
             | bob   |    12 |"
        );
    }

    #[test]
    fn table_centered_and_ragged() {
        let text = "| a | b |\n|:-:|---|\n| xyz |";
        let rendered = plain(text);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "|  a  | b |");
        assert_eq!(lines[2], "| xyz |   |");
    }

    #[test]
    fn lists() {
        assert_eq!(plain("- a\n- b"), "• a\n• b");
        assert_eq!(plain("3. x\n4. y"), "3. x\n4. y");
        assert_eq!(plain("- a\n  - b"), "• a\n  • b");
        assert_eq!(plain("- [x] done\n- [ ] todo"), "• [x] done\n• [ ] todo");
    }

    #[test]
    fn code() {
        assert_eq!(plain("use `cargo`"), "use `cargo`");
        assert_eq!(
            plain("```rust\nfn main() {}\n```"),
            "[rust]\n    fn main() {}"
        );
    }

    #[test]
    fn headings_quotes_links() {
        assert_eq!(plain("# Title\n\nbody"), "# Title\n\nbody");
        assert_eq!(plain("> quoted"), "> quoted");
        assert_eq!(
            plain("[docs](https://example.com)"),
            "docs (https://example.com)"
        );
        assert_eq!(plain("<https://example.com>"), "https://example.com");
    }

    #[test]
    fn rule_uses_width() {
        assert_eq!(plain("a\n\n---\n\nb"), format!("a\n\n{}\n\nb", "-".repeat(20)));
    }

    #[test]
    fn ansi_styles() {
        let style = MarkdownStyle::default();
        let rendered = render_markdown("**bold** and *it*", &style);
        assert_eq!(
            rendered,
            format!("{ANSI_BOLD}bold{ANSI_RESET} and {ANSI_ITALIC}it{ANSI_RESET}")
        );
        let rendered = render_markdown("| h |\n|---|\n| v |", &style);
        assert!(rendered.contains("│"));
        assert!(rendered.contains(ANSI_BOLD));
    }

    #[test]
    fn table_cells_keep_inline_markup() {
        let rendered = plain("| a |\n|---|\n| [docs](https://e.com) **now** |");
        let cell = "docs (https://e.com) now";
        assert_eq!(
            rendered,
            format!(
                "| a{} |\n|{}|\n| {cell} |",
                " ".repeat(cell.len() - 1),
                "-".repeat(cell.len() + 2)
            )
        );

        let rendered = render_markdown("| h |\n|---|\n| **b** |", &MarkdownStyle::default());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], format!("│ {ANSI_BOLD}h{ANSI_RESET} │"));
        assert_eq!(lines[1], "│───│");
        assert_eq!(lines[2], format!("│ {ANSI_BOLD}b{ANSI_RESET} │"));
    }

    #[test]
    fn colored_autolink_is_not_repeated() {
        let rendered = render_markdown("<https://example.com>", &MarkdownStyle::default());
        assert_eq!(
            rendered,
            format!("{ANSI_UNDERLINE}https://example.com{ANSI_RESET}")
        );
    }

    #[test]
    fn width_ignores_escapes() {
        assert_eq!(display_width(&format!("{ANSI_BOLD}abc{ANSI_RESET}")), 3);
        assert_eq!(display_width("│ é"), 3);
    }
}
