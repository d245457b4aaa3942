//! Structural scanner: locates function definitions and their decorators.
//!
//! The scanner walks the source one physical line at a time. Lines that
//! continue a statement (open brackets, open strings, backslash
//! continuations) are never classified, so decorators and definitions are
//! only recognized where a statement starts. Decorator lines are buffered
//! until the definition they belong to arrives.

pub mod lexer;
pub mod lines;


use crate::error::{ScanError, ScanErrorKind};
use crate::marker::Decorator;
use crate::predicate::TestPredicate;
use crate::source::SourceText;

use self::lexer::LexState;
use self::lines::{classify, LineKind};

/// A function or method definition with its decorator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionBlock<'a> {
    pub name: &'a str,
    /// Dotted path through enclosing classes and functions.
    pub qualname: String,
    /// Leading whitespace of the definition line.
    pub indent: &'a str,
    /// Decorators in source order.
    pub decorators: Vec<Decorator<'a>>,
    pub is_test: bool,
    pub is_async: bool,
    /// 0-based index of the first line of the block.
    pub start: usize,
    /// 0-based index of the `def` line.
    pub def_line: usize,
}

impl DefinitionBlock<'_> {
    /// 1-based line number of the first line of the block.
    pub fn line(&self) -> usize {
        self.start + 1
    }
}

/// An enclosing `class` or `def` header.
#[derive(Debug)]
struct Scope<'a> {
    width: usize,
    name: &'a str,
}

/// Decorators seen since the last statement.
#[derive(Debug)]
struct Run<'a> {
    indent: &'a str,
    start: usize,
    decorators: Vec<Decorator<'a>>,
}

/// Scan `source` into its definition blocks, in source order.
pub fn scan<'a>(
    source: &SourceText<'a>,
    predicate: &dyn TestPredicate,
) -> Result<Vec<DefinitionBlock<'a>>, ScanError> {
    let mut blocks = Vec::new();
    let mut scopes: Vec<Scope<'a>> = Vec::new();
    let mut run: Option<Run<'a>> = None;
    // First line of a decorator still waiting for its brackets to close.
    let mut open_decorator: Option<usize> = None;
    let mut statement_line = 0;
    let mut state = LexState::default();

    for (idx, line) in source.lines().iter().enumerate() {
        let starts_statement = state.at_statement_start();
        state = state.advance(line.text);

        if !starts_statement {
            if let Some(first) = open_decorator {
                if state.at_statement_start() {
                    push_decorator(&mut run, source, first, idx);
                    open_decorator = None;
                }
            }
            continue;
        }
        statement_line = idx;

        if line.is_blank() || line.is_comment() {
            if run.is_some() {
                return Err(ScanError::new(ScanErrorKind::InterruptedDecoratorRun, idx + 1));
            }
            continue;
        }

        let indent = line.indent();
        while scopes.last().is_some_and(|s| s.width >= indent.len()) {
            scopes.pop();
        }

        match classify(line.body()) {
            LineKind::Decorator => {
                match run.as_ref().map(|r| r.indent) {
                    Some(expected) if expected != indent => {
                        return Err(ScanError::new(ScanErrorKind::MisalignedDecorator, idx + 1));
                    }
                    Some(_) => {}
                    None => {
                        run = Some(Run {
                            indent,
                            start: idx,
                            decorators: Vec::new(),
                        })
                    }
                }
                if state.at_statement_start() {
                    push_decorator(&mut run, source, idx, idx);
                } else {
                    open_decorator = Some(idx);
                }
            }
            LineKind::Definition { name, is_async } => {
                let (start, decorators) = match run.take() {
                    Some(r) if r.indent != indent => {
                        return Err(ScanError::new(ScanErrorKind::MisalignedDecorator, r.start + 1));
                    }
                    Some(r) => (r.start, r.decorators),
                    None => (idx, Vec::new()),
                };
                blocks.push(DefinitionBlock {
                    name,
                    qualname: qualify(&scopes, name),
                    indent,
                    decorators,
                    is_test: predicate.is_test(name),
                    is_async,
                    start,
                    def_line: idx,
                });
                scopes.push(Scope {
                    width: indent.len(),
                    name,
                });
            }
            LineKind::Container { name } => {
                // Class decorators belong to the class.
                run = None;
                scopes.push(Scope {
                    width: indent.len(),
                    name,
                });
            }
            LineKind::Other => {
                if let Some(r) = &run {
                    return Err(ScanError::new(ScanErrorKind::DanglingDecorator, r.start + 1));
                }
            }
        }
    }

    if state.string.is_some() {
        return Err(ScanError::new(ScanErrorKind::UnterminatedString, statement_line + 1));
    }
    if let Some(first) = open_decorator {
        return Err(ScanError::new(ScanErrorKind::UnbalancedDecorator, first + 1));
    }
    if let Some(r) = run {
        return Err(ScanError::new(ScanErrorKind::DanglingDecorator, r.start + 1));
    }

    Ok(blocks)
}

fn push_decorator<'a>(run: &mut Option<Run<'a>>, source: &SourceText<'a>, first: usize, last: usize) {
    if let Some(r) = run {
        r.decorators.push(Decorator::parse(source.span(first, last), first));
    }
}

fn qualify(scopes: &[Scope<'_>], name: &str) -> String {
    let mut parts: Vec<&str> = scopes.iter().map(|s| s.name).collect();
    parts.push(name);
    parts.join(".")
}
