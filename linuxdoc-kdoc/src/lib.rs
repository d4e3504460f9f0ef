//! # linuxdoc-kdoc
//!
//! Parser and translators for "kernel-doc" comments embedded in C/C++
//! sources.
//!
//! The architecture is small and deliberate:
//!
//! * [`Parser`] scans source line by line through a six-state machine,
//!   recognizes `/** ... */` comment blocks and the declaration that
//!   follows each one, and records a [`DeclEvent`] per declaration.
//! * Implementations of [`Translator`] render those events:
//!   [`NullTranslator`] records only, [`ListTranslator`] prints a symbol
//!   index, [`ReSTTranslator`] emits reStructuredText.
//! * [`ParseOptions`] carries the markup mode, name filters, export
//!   detection rules and everything else that shapes a parse.
//!
//! ## Quick start
//!
//! ```rust
//! use linuxdoc_kdoc::{ParseOptions, Parser, ReSTTranslator};
//!
//! let src = "/**\n * foo - frobnicate\n * @x: input value\n */\nint foo(int x);\n";
//! let opts = ParseOptions::new("demo.c");
//! let mut parser = Parser::new(opts, ReSTTranslator::new(Vec::new()));
//! parser.parse_string(src).unwrap();
//! parser.close().unwrap();
//!
//! let (_, translator, _) = parser.into_parts();
//! let rest = String::from_utf8(translator.into_inner()).unwrap();
//! assert!(rest.contains(".. c:function:: int foo(int x)"));
//! ```
//!
//! ## Parse once, render many
//!
//! Parsing with the [`NullTranslator`] fills the context's dump storage;
//! [`replay`] then drives any translator over the recorded events, any
//! number of times, with identical output to a direct parse.

mod context;
mod error;
mod options;
mod parser;
pub mod patterns;
mod proto;
mod report;
mod rest;
mod translate;
mod types;

pub use crate::{
  context::ParserContext,
  error::{KdocError, Result},
  options::{DirectiveAction, ExpMethod, Markup, ParseOptions, default_exp_ids},
  parser::{Parser, expand_tabs, parse_with_recovery},
  report::Reporter,
  rest::{ReSTTranslator, highlight_block, member_label},
  translate::{ListTranslator, NullTranslator, Translator, replay, wanted},
  types::{
    DeclEvent,
    DeclKind,
    DocDecl,
    EnumDecl,
    FunctionDecl,
    SECTION_DEFAULT,
    SectionMap,
    StructDecl,
    TypedefDecl,
    UNDESCRIBED,
    UNNAMED_STRUCT,
    UNNAMED_UNION,
    canonical_section_title,
  },
};
