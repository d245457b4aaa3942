//! Rewriter: splices new markers above unmarked test definitions.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AnnotateError, GenerateError};
use crate::ident::{IdGenerator, UuidGenerator};
use crate::marker::{MarkerDetector, MarkerName};
use crate::predicate::{PrefixRule, TestPredicate};
use crate::scanner::{scan, DefinitionBlock};
use crate::source::SourceText;

/// A marker added by a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insertion {
    /// 1-based line of the new marker in the rewritten text.
    pub line: usize,
    pub qualname: String,
    pub id: String,
}

/// Result of annotating one source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotated {
    pub text: String,
    pub insertions: Vec<Insertion>,
}

impl Annotated {
    pub fn is_changed(&self) -> bool {
        !self.insertions.is_empty()
    }
}

/// Rewrite `source`, adding a marker to every test block that lacks one.
///
/// Identifiers are drawn for all blocks before any text is assembled, so a
/// generator failure leaves nothing half-built.
pub fn rewrite(
    source: &SourceText<'_>,
    blocks: &[DefinitionBlock<'_>],
    detector: &MarkerDetector,
    generator: &dyn IdGenerator,
) -> Result<Annotated, GenerateError> {
    let mut pending = Vec::new();
    for block in blocks {
        if !block.is_test || detector.is_marked(block) {
            continue;
        }
        pending.push((block, generator.generate()?));
    }

    if pending.is_empty() {
        return Ok(Annotated {
            text: source.as_str().to_string(),
            insertions: Vec::new(),
        });
    }

    let text = source.as_str();
    let mut out = String::with_capacity(text.len() + pending.len() * 64);
    let mut insertions = Vec::with_capacity(pending.len());
    let mut copied = 0;

    for (inserted, (block, id)) in pending.into_iter().enumerate() {
        let first = &source.lines()[block.start];
        let def = &source.lines()[block.def_line];
        let ending = if def.ending.is_empty() { "\n" } else { def.ending };

        out.push_str(&text[copied..first.offset]);
        out.push_str(&detector.render(block.indent, &id));
        out.push_str(ending);
        copied = first.offset;

        insertions.push(Insertion {
            line: block.start + inserted + 1,
            qualname: block.qualname.clone(),
            id,
        });
    }
    out.push_str(&text[copied..]);

    Ok(Annotated { text: out, insertions })
}

/// The full scan, detect, rewrite pipeline for one source text.
#[derive(Clone)]
pub struct Annotator {
    detector: MarkerDetector,
    predicate: Arc<dyn TestPredicate>,
    generator: Arc<dyn IdGenerator>,
}

impl Annotator {
    pub fn new(marker: MarkerName) -> Self {
        Self {
            detector: MarkerDetector::new(marker),
            predicate: Arc::new(PrefixRule::default()),
            generator: Arc::new(UuidGenerator),
        }
    }

    pub fn with_predicate(mut self, predicate: impl TestPredicate + 'static) -> Self {
        self.predicate = Arc::new(predicate);
        self
    }

    pub fn with_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.generator = Arc::new(generator);
        self
    }

    pub fn with_shared_generator(mut self, generator: Arc<dyn IdGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn detector(&self) -> &MarkerDetector {
        &self.detector
    }

    /// Definition blocks of `source`.
    pub fn scan<'a>(&self, source: &SourceText<'a>) -> Result<Vec<DefinitionBlock<'a>>, AnnotateError> {
        Ok(scan(source, self.predicate.as_ref())?)
    }

    /// Test blocks of `text` that lack the marker.
    pub fn unmarked<'a>(&self, text: &'a str) -> Result<Vec<DefinitionBlock<'a>>, AnnotateError> {
        let source = SourceText::new(text);
        Ok(self
            .scan(&source)?
            .into_iter()
            .filter(|b| b.is_test && !self.detector.is_marked(b))
            .collect())
    }

    /// Annotate `text`. All-or-nothing: any error means no output.
    pub fn annotate(&self, text: &str) -> Result<Annotated, AnnotateError> {
        let source = SourceText::new(text);
        let blocks = self.scan(&source)?;
        Ok(rewrite(&source, &blocks, &self.detector, self.generator.as_ref())?)
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(MarkerName::default())
    }
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("marker", self.detector.marker())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::SequenceGenerator;
    use pretty_assertions::assert_eq;

    fn annotator() -> Annotator {
        Annotator::default().with_generator(SequenceGenerator::new("id-"))
    }

    #[test]
    fn test_inserts_above_bare_definition() {
        let out = annotator().annotate("import json\n\ndef test_x():\n    pass\n").unwrap();
        assert_eq!(out.text, "import json\n\n@pytest.mark.test_id('id-0')\ndef test_x():\n    pass\n");
        assert_eq!(
            out.insertions,
            [Insertion {
                line: 3,
                qualname: "test_x".into(),
                id: "id-0".into()
            }]
        );
    }

    #[test]
    fn test_inserts_above_existing_decorators() {
        let input = "@pytest.mark.foo('bar')\n@pytest.mark.bar('foo')\ndef test_x():\n    pass\n";
        let out = annotator().annotate(input).unwrap();
        assert_eq!(
            out.text,
            "@pytest.mark.test_id('id-0')\n@pytest.mark.foo('bar')\n@pytest.mark.bar('foo')\ndef test_x():\n    pass\n"
        );
    }

    #[test]
    fn test_byte_order_mark_is_kept_in_front() {
        let out = annotator().annotate("\u{feff}def test_b():\n    pass\n").unwrap();
        assert_eq!(out.text, "\u{feff}@pytest.mark.test_id('id-0')\ndef test_b():\n    pass\n");
        assert_eq!(out.insertions[0].line, 1);

        let marked = "\u{feff}@pytest.mark.test_id('keep')\ndef test_b():\n    pass\n";
        let out = annotator().annotate(marked).unwrap();
        assert!(!out.is_changed());
        assert_eq!(out.text, marked);
    }

    #[test]
    fn test_generic_definition_is_annotated() {
        let input = "@pytest.mark.slow\ndef test_g[T](x: T):\n    pass\n";
        let out = annotator().annotate(input).unwrap();
        assert_eq!(
            out.text,
            "@pytest.mark.test_id('id-0')\n@pytest.mark.slow\ndef test_g[T](x: T):\n    pass\n"
        );
    }

    #[test]
    fn test_marker_anywhere_in_stack_counts() {
        let input = "@pytest.mark.foo('bar')\n@pytest.mark.test_id('keep')\ndef test_x():\n    pass\n";
        let out = annotator().annotate(input).unwrap();
        assert!(!out.is_changed());
        assert_eq!(out.text, input);
    }

    #[test]
    fn test_helpers_are_not_annotated() {
        let input = "def helper():\n    pass\n";
        assert!(!annotator().annotate(input).unwrap().is_changed());
    }

    #[test]
    fn test_insertion_lines_account_for_earlier_insertions() {
        let out = annotator()
            .annotate("def test_a():\n    pass\n\ndef test_b():\n    pass\n")
            .unwrap();
        let lines: Vec<usize> = out.insertions.iter().map(|i| i.line).collect();
        assert_eq!(lines, [1, 5]);
        let text_lines: Vec<&str> = out.text.lines().collect();
        assert_eq!(text_lines[0], "@pytest.mark.test_id('id-0')");
        assert_eq!(text_lines[4], "@pytest.mark.test_id('id-1')");
    }

    #[test]
    fn test_crlf_is_preserved() {
        let out = annotator().annotate("def test_x():\r\n    pass\r\n").unwrap();
        assert_eq!(out.text, "@pytest.mark.test_id('id-0')\r\ndef test_x():\r\n    pass\r\n");
    }

    #[test]
    fn test_unterminated_last_line() {
        let out = annotator().annotate("def test_x(): pass").unwrap();
        assert_eq!(out.text, "@pytest.mark.test_id('id-0')\ndef test_x(): pass");
    }

    #[test]
    fn test_generator_not_called_for_marked_blocks() {
        let generator = Arc::new(SequenceGenerator::new("id-"));
        let annotator = Annotator::default().with_shared_generator(generator.clone());
        annotator
            .annotate("@pytest.mark.test_id('a')\ndef test_a():\n    pass\n")
            .unwrap();
        assert_eq!(generator.issued(), 0);
    }

    #[test]
    fn test_generator_failure_yields_no_output() {
        let annotator = Annotator::default()
            .with_generator(|| -> Result<String, GenerateError> { Err(GenerateError::new("boom")) });
        let err = annotator.annotate("def test_a():\n    pass\n").unwrap_err();
        assert!(matches!(err, AnnotateError::Generate(_)));
    }

    #[test]
    fn test_custom_marker_and_predicate() {
        let annotator = Annotator::new(MarkerName::new("trace.id").unwrap())
            .with_predicate(|name: &str| name.starts_with("check_"))
            .with_generator(SequenceGenerator::new("n"));
        let out = annotator
            .annotate("def check_a():\n    pass\n\ndef test_b():\n    pass\n")
            .unwrap();
        assert_eq!(out.text, "@trace.id('n0')\ndef check_a():\n    pass\n\ndef test_b():\n    pass\n");
    }

    #[test]
    fn test_unmarked_lists_only_missing() {
        let text = "@pytest.mark.test_id('a')\ndef test_a():\n    pass\n\ndef test_b():\n    pass\n";
        let missing = annotator().unmarked(text).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "test_b");
    }
}
