//! Output rendering for the chat transcript.
//!
//! This module provides the [`Renderer`] trait, a plain-text implementation
//! with optional ANSI styling, and [`RenderObserver`], which subscribes a
//! renderer to conversation events so the transcript redraws itself as turns
//! are appended.

use std::io::{self, Stdout, Write};

use crate::conversation::{ConversationEvent, ConversationObserver};
use crate::error::FailureKind;
use crate::markdown::{MarkdownStyle, render_markdown};
use crate::types::{Model, Sender, Turn};

/// ANSI escape code for bold text (used for labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for red text (used for error notices).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for cyan text (used for informational messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI user bubble: white on blue.
const ANSI_USER_BUBBLE: &str = "\x1b[97;44m";

/// ANSI bot badge: white on grey.
const ANSI_BOT_BADGE: &str = "\x1b[97;100m";

/// ANSI escape to return to column zero and erase the line.
const ANSI_CLEAR_LINE: &str = "\r\x1b[2K";

/// Width of the bot badge column, including trailing space.
const BADGE_WIDTH: usize = 5;

/// Default transcript width in columns.
pub const DEFAULT_WIDTH: usize = 80;

/// Trait for rendering the chat transcript.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - Capturing output in tests
pub trait Renderer: Send {
    /// Print a turn the user wrote.
    fn print_user_turn(&mut self, turn: &Turn);

    /// Print a bot turn.  Its text is markdown.
    fn print_bot_turn(&mut self, turn: &Turn);

    /// Show that a response is being generated.
    fn start_typing(&mut self);

    /// Remove the typing indicator, if shown.
    fn stop_typing(&mut self);

    /// Print the notice for a failed request, outside the transcript.
    fn print_error_notice(&mut self, kind: &FailureKind);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print the model picker.
    fn print_models(&mut self, models: &[Model], selected: Model);

    /// Print a turn of either kind.
    fn print_turn(&mut self, turn: &Turn) {
        match turn.sender {
            Sender::User => self.print_user_turn(turn),
            Sender::Bot => self.print_bot_turn(turn),
        }
    }
}

/// Plain text renderer with optional ANSI styling.
///
/// User turns are right-aligned bubbles of plain text; bot turns sit on the
/// left behind an `AI` badge and are rendered as markdown.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
    width: usize,
    typing: bool,
}

impl PlainTextRenderer<Stdout> {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color, DEFAULT_WIDTH)
    }
}

impl Default for PlainTextRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Creates a renderer writing to `out`.
    pub fn with_writer(out: W, use_color: bool, width: usize) -> Self {
        Self {
            out,
            use_color,
            width: width.max(BADGE_WIDTH * 4),
            typing: false,
        }
    }

    /// Sets the transcript width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(BADGE_WIDTH * 4);
        self
    }

    /// Consumes the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }

    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{line}");
    }

    fn clear_typing(&mut self) {
        if self.typing {
            if self.use_color {
                let _ = write!(self.out, "{ANSI_CLEAR_LINE}");
            }
            self.typing = false;
        }
    }

    fn badge(&self) -> String {
        if self.use_color {
            format!("{ANSI_BOT_BADGE} AI {ANSI_RESET} ")
        } else {
            "[AI] ".to_string()
        }
    }

    fn bubble_width(&self) -> usize {
        self.width * 2 / 3
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_user_turn(&mut self, turn: &Turn) {
        self.clear_typing();
        let bubble_width = self.bubble_width();
        let lines = wrap(&turn.text, bubble_width.saturating_sub(2));
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let indent = " ".repeat(self.width.saturating_sub(inner + 2));
        for line in &lines {
            let fill = " ".repeat(inner - line.chars().count());
            let rendered = if self.use_color {
                format!("{indent}{ANSI_USER_BUBBLE} {line}{fill} {ANSI_RESET}")
            } else {
                format!("{indent} {line}{fill} ")
            };
            self.write_line(rendered.trim_end_matches(' '));
        }
        self.write_line("");
        self.flush();
    }

    fn print_bot_turn(&mut self, turn: &Turn) {
        self.clear_typing();
        let style = MarkdownStyle {
            use_color: self.use_color,
            width: self.width - BADGE_WIDTH,
        };
        let rendered = render_markdown(&turn.text, &style);
        let badge = self.badge();
        let continuation = " ".repeat(BADGE_WIDTH);
        for (i, line) in rendered.lines().enumerate() {
            let line = if i == 0 {
                format!("{badge}{line}")
            } else if line.is_empty() {
                String::new()
            } else {
                format!("{continuation}{line}")
            };
            self.write_line(&line);
        }
        if rendered.is_empty() {
            let badge = badge.trim_end().to_string();
            self.write_line(&badge);
        }
        self.write_line("");
        self.flush();
    }

    fn start_typing(&mut self) {
        if self.typing {
            return;
        }
        let badge = self.badge();
        if self.use_color {
            let _ = write!(self.out, "{badge}{ANSI_DIM}typing...{ANSI_RESET}");
        } else {
            let _ = writeln!(self.out, "{badge}typing...");
        }
        self.typing = true;
        self.flush();
    }

    fn stop_typing(&mut self) {
        self.clear_typing();
        self.flush();
    }

    fn print_error_notice(&mut self, kind: &FailureKind) {
        self.clear_typing();
        let notice = format!("Error: {kind}");
        let pad = " ".repeat(self.width.saturating_sub(notice.chars().count()) / 2);
        if self.use_color {
            self.write_line(&format!("{pad}{ANSI_RED}{notice}{ANSI_RESET}"));
        } else {
            self.write_line(&format!("{pad}{notice}"));
        }
        self.write_line("");
        self.flush();
    }

    fn print_info(&mut self, info: &str) {
        self.clear_typing();
        if self.use_color {
            self.write_line(&format!("{ANSI_CYAN}{info}{ANSI_RESET}"));
        } else {
            self.write_line(info);
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_typing();
        if self.use_color {
            self.write_line(&format!("{ANSI_RED}Error: {error}{ANSI_RESET}"));
        } else {
            self.write_line(&format!("Error: {error}"));
        }
        self.flush();
    }

    fn print_models(&mut self, models: &[Model], selected: Model) {
        self.clear_typing();
        if self.use_color {
            self.write_line(&format!("{ANSI_BOLD}Models{ANSI_RESET}"));
        } else {
            self.write_line("Models");
        }
        for model in models {
            let line = if *model == selected {
                if self.use_color {
                    format!("  {ANSI_USER_BUBBLE} {model} {ANSI_RESET}")
                } else {
                    format!("* {model}")
                }
            } else {
                format!("  {model}")
            };
            self.write_line(&line);
        }
        self.flush();
    }
}

/// Number of terminal rows taken by `prompt` followed by the echoed `input`.
pub fn echoed_rows(prompt: &str, input: &str, columns: usize) -> usize {
    let used = prompt.chars().count() + input.chars().count();
    used.div_ceil(columns.max(1)).max(1)
}

/// Escape sequence erasing the `rows` lines above the cursor.
pub fn erase_rows(rows: usize) -> String {
    "\x1b[1A\x1b[2K".repeat(rows)
}

/// Greedy word wrap on character counts.  Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if len > 0 {
                    lines.push(std::mem::take(&mut line));
                    len = 0;
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }
            if len > 0 && len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            if len > 0 {
                line.push(' ');
                len += 1;
            }
            len += word.len();
            line.extend(word);
        }
        lines.push(line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

///////////////////////////////////////// RenderObserver /////////////////////////////////////////

/// Redraws the transcript from conversation events.
///
/// New turns are printed at the bottom of the transcript, the typing indicator
/// follows the pending flag, and a recorded error is shown as a notice once the
/// failed turn has been printed.
pub struct RenderObserver<R: Renderer> {
    renderer: R,
    notice: Option<FailureKind>,
}

impl<R: Renderer> RenderObserver<R> {
    /// Wraps `renderer`.
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            notice: None,
        }
    }

    /// Consumes the observer, returning the renderer.
    pub fn into_inner(self) -> R {
        self.renderer
    }
}

impl<R: Renderer> ConversationObserver for RenderObserver<R> {
    fn notify(&mut self, event: &ConversationEvent) {
        match event {
            ConversationEvent::TurnAppended(turn) => self.renderer.print_turn(turn),
            ConversationEvent::PendingChanged(true) => self.renderer.start_typing(),
            ConversationEvent::PendingChanged(false) => {
                self.renderer.stop_typing();
                if let Some(kind) = self.notice.take() {
                    self.renderer.print_error_notice(&kind);
                }
            }
            ConversationEvent::ErrorRecorded(kind) => self.notice = Some(kind.clone()),
            ConversationEvent::ErrorCleared => self.notice = None,
            ConversationEvent::ModelSelected(model) => {
                self.renderer.print_info(&format!("Model changed to: {model}"));
            }
        }
    }
}
