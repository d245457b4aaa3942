//! Lexical state carried from one physical line to the next.
//!
//! Only as much of Python's tokenizer as is needed to tell whether a line
//! starts a new statement: open strings, bracket depth and backslash
//! continuations.

/// A string literal that is still open at the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenString {
    pub quote: u8,
    pub triple: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LexState {
    pub string: Option<OpenString>,
    pub depth: usize,
    pub continued: bool,
}

impl LexState {
    /// True when the next physical line begins a new logical line.
    pub fn at_statement_start(&self) -> bool {
        self.string.is_none() && self.depth == 0 && !self.continued
    }

    /// State after consuming `line` (without its terminator).
    pub fn advance(self, line: &str) -> LexState {
        let bytes = line.as_bytes();
        let last = bytes.len().saturating_sub(1);
        let mut string = self.string;
        let mut depth = self.depth;
        let mut continued = false;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            match string {
                Some(open) => {
                    if b == b'\\' {
                        continued = i == last;
                        i += 2;
                        continue;
                    }
                    if b == open.quote {
                        if !open.triple {
                            string = None;
                        } else if is_triple(bytes, i) {
                            string = None;
                            i += 3;
                            continue;
                        }
                    }
                    i += 1;
                }
                None => {
                    match b {
                        b'#' => break,
                        b'"' | b'\'' => {
                            let triple = is_triple(bytes, i);
                            string = Some(OpenString { quote: b, triple });
                            i += if triple { 3 } else { 1 };
                            continue;
                        }
                        b'(' | b'[' | b'{' => depth += 1,
                        b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                        b'\\' if i == last => continued = true,
                        _ => {}
                    }
                    i += 1;
                }
            }
        }

        // A single-quoted string cannot span lines without an escaped newline.
        if let Some(open) = string {
            if !open.triple && !continued {
                string = None;
            }
        }

        LexState {
            string,
            depth,
            continued,
        }
    }
}

fn is_triple(bytes: &[u8], at: usize) -> bool {
    let q = bytes[at];
    bytes.len() >= at + 3 && bytes[at + 1] == q && bytes[at + 2] == q
}
