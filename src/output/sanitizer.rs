//! Escape-sequence stripping via the VTE parser.

use vte::{Parser, Perform};

/// Turns raw command output into plain text for a chat message.
pub struct OutputSanitizer;

impl OutputSanitizer {
    /// Strip escape sequences and resolve carriage returns.
    ///
    /// `\r\n` becomes `\n`. A lone `\r` rewinds to the start of the current
    /// line, so only the final state of a progress bar survives. Control
    /// bytes other than newline and tab are dropped.
    pub fn to_plain_text(input: &[u8]) -> String {
        let mut text = ReplyText::default();
        let mut parser = Parser::new();
        parser.advance(&mut text, input);
        text.finish()
    }

    /// Same as [`to_plain_text`](Self::to_plain_text) for string input.
    pub fn to_plain_text_str(input: &str) -> String {
        Self::to_plain_text(input.as_bytes())
    }
}

#[derive(Default)]
struct ReplyText {
    out: String,
    line_start: usize,
    pending_cr: bool,
}

impl ReplyText {
    fn resolve_cr(&mut self) {
        if self.pending_cr {
            self.out.truncate(self.line_start);
            self.pending_cr = false;
        }
    }

    fn finish(mut self) -> String {
        self.pending_cr = false;
        self.out
    }
}

impl Perform for ReplyText {
    fn print(&mut self, c: char) {
        self.resolve_cr();
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => {
                self.pending_cr = false;
                self.out.push('\n');
                self.line_start = self.out.len();
            }
            b'\r' => self.pending_cr = true,
            b'\t' => {
                self.resolve_cr();
                self.out.push('\t');
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(OutputSanitizer::to_plain_text(b"hello world"), "hello world");
    }

    #[test]
    fn test_strip_color_codes() {
        let input = b"\x1b[1;31merror:\x1b[0m build failed";
        assert_eq!(OutputSanitizer::to_plain_text(input), "error: build failed");
    }

    #[test]
    fn test_crlf_becomes_lf() {
        assert_eq!(OutputSanitizer::to_plain_text(b"a\r\nb\r\n"), "a\nb\n");
    }

    #[test]
    fn test_progress_bar_keeps_last_frame() {
        let input = b"start\n 10%\r 50%\r100% done\nend";
        assert_eq!(
            OutputSanitizer::to_plain_text(input),
            "start\n100% done\nend"
        );
    }

    #[test]
    fn test_trailing_cr_is_dropped() {
        assert_eq!(OutputSanitizer::to_plain_text(b"line\r"), "line");
    }

    #[test]
    fn test_control_bytes_dropped_tabs_kept() {
        let input = b"col1\tcol2\x07\x08";
        assert_eq!(OutputSanitizer::to_plain_text(input), "col1\tcol2");
    }

    #[test]
    fn test_osc_title_removed() {
        let input = b"\x1b]0;user@host: ~\x07$ ls";
        assert_eq!(OutputSanitizer::to_plain_text(input), "$ ls");
    }

    #[test]
    fn test_utf8_preserved() {
        assert_eq!(OutputSanitizer::to_plain_text_str("输出: ✓"), "输出: ✓");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(OutputSanitizer::to_plain_text(b""), "");
    }
}
