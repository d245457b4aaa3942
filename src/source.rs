//! Line-oriented view over the text of one source file.
//!
//! Lines keep their exact terminators so that a file can be reassembled
//! byte-for-byte from its lines. A leading byte order mark is not part of
//! the first line: that line's offset starts right after it.

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One physical line borrowed from a [`SourceText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Byte offset of the first character of the line.
    pub offset: usize,
    /// Line content without its terminator.
    pub text: &'a str,
    /// `"\n"`, `"\r\n"`, or `""` for a final unterminated line.
    pub ending: &'a str,
}

impl<'a> Line<'a> {
    /// Leading whitespace (spaces and tabs).
    pub fn indent(&self) -> &'a str {
        let end = self
            .text
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(self.text.len());
        &self.text[..end]
    }

    /// Content after the indentation.
    pub fn body(&self) -> &'a str {
        &self.text[self.indent().len()..]
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn is_comment(&self) -> bool {
        self.body().starts_with('#')
    }

    /// Byte offset one past the terminator.
    pub fn end(&self) -> usize {
        self.offset + self.text.len() + self.ending.len()
    }
}

/// The full content of one file, split into lines.
///
/// Never mutated: rewriting produces a new `String`.
#[derive(Debug, Clone)]
pub struct SourceText<'a> {
    text: &'a str,
    lines: Vec<Line<'a>>,
}

impl<'a> SourceText<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut lines = Vec::new();
        let content = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
        let mut offset = text.len() - content.len();
        for raw in content.split_inclusive('\n') {
            let line = raw
                .strip_suffix("\r\n")
                .or_else(|| raw.strip_suffix('\n'))
                .unwrap_or(raw);
            lines.push(Line {
                offset,
                text: line,
                ending: &raw[line.len()..],
            });
            offset += raw.len();
        }
        Self { text, lines }
    }

    /// Bytes before the first line: the byte order mark, if any.
    pub fn preamble(&self) -> &'a str {
        let start = self.lines.first().map_or(self.text.len(), |l| l.offset);
        &self.text[..start]
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&Line<'a>> {
        self.lines.get(index)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text of lines `first..=last` without the final terminator.
    pub fn span(&self, first: usize, last: usize) -> &'a str {
        let start = self.lines[first].offset;
        let end = self.lines[last].offset + self.lines[last].text.len();
        &self.text[start..end]
    }
}
