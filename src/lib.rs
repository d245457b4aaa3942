//! # testid
//!
//! Stamps every pytest test function with a traceability marker,
//! `@pytest.mark.test_id('<uuid>')`, leaving already-marked tests and all
//! other text byte-for-byte untouched.
//!
//! ```
//! use testid::{Annotator, SequenceGenerator};
//!
//! let annotator = Annotator::default().with_generator(SequenceGenerator::new("id-"));
//! let out = annotator.annotate("def test_login():\n    pass\n").unwrap();
//! assert_eq!(out.text, "@pytest.mark.test_id('id-0')\ndef test_login():\n    pass\n");
//!
//! // A second pass finds nothing to do.
//! assert!(!annotator.annotate(&out.text).unwrap().is_changed());
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod ident;
pub mod logging;
pub mod marker;
pub mod predicate;
pub mod report;
pub mod rewriter;
pub mod scanner;
pub mod source;

pub use batch::{Batch, Discovery, FileReport, Mode, Outcome};
pub use config::Config;
pub use error::{AnnotateError, ConfigError, FileError, GenerateError, ScanError, ScanErrorKind};
pub use ident::{IdGenerator, SequenceGenerator, UuidGenerator};
pub use marker::{Decorator, MarkerDetector, MarkerName, DEFAULT_MARKER};
pub use predicate::{PrefixRule, TestPredicate};
pub use report::BatchReport;
pub use rewriter::{rewrite, Annotated, Annotator, Insertion};
pub use scanner::{scan, DefinitionBlock};
pub use source::SourceText;
