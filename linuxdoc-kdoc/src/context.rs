//! Parse-time accumulator state.
use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
  report::Reporter,
  types::{DeclEvent, DeclKind, SectionMap},
};

/// Accumulator for one source file.
///
/// Per-declaration fields are reset by [`ParserContext::reset_decl`] on
/// every new `/**`; everything else (exported symbols, module metadata,
/// snippets, dump storage, line counter) spans the whole file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ParserContext {
  // Per-declaration state.
  pub decl_name: String,
  pub decl_kind: Option<DeclKind>,
  pub purpose:   String,

  /// Name of the section currently being collected.
  pub section:  String,
  /// Body of the section currently being collected.
  pub contents: String,

  pub prototype: String,

  pub parameter_list:  Vec<String>,
  pub parameter_types: SectionMap,
  pub parameter_descs: SectionMap,
  pub sections:        SectionMap,

  /// Line of the opening `/**` of the current declaration.
  pub decl_offset: u32,

  // Cross-declaration state.
  /// Current line number (1-based).
  pub line_no: u32,

  pub exported_symbols: Vec<String>,

  pub mod_authors: Vec<String>,
  pub mod_descr:   Option<String>,
  pub mod_license: Option<String>,

  /// Named source regions captured by `SNIP`/`SNAP` directives.
  pub snippets: IndexMap<String, String>,

  /// Ordered record of every parsed declaration.
  pub dump_storage: Vec<DeclEvent>,

  /// Names already emitted in this parse; re-emission is an error.
  pub(crate) emitted_names: HashSet<String>,
}

impl ParserContext {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Reset the per-declaration fields for a fresh `/**`.
  pub fn reset_decl(&mut self) {
    self.decl_name.clear();
    self.decl_kind = None;
    self.purpose.clear();
    self.section.clear();
    self.contents.clear();
    self.prototype.clear();
    self.parameter_list.clear();
    self.parameter_types.clear();
    self.parameter_descs.clear();
    self.sections.clear();
    self.decl_offset = self.line_no;
  }

  /// Store a completed named section.
  ///
  /// Duplicate titles concatenate with a blank-line separator and warn.
  pub fn store_section(
    &mut self,
    title: &str,
    text: &str,
    reporter: &mut Reporter,
  ) {
    let text = text.trim_end();
    if text.trim().is_empty() {
      return;
    }
    if let Some(existing) = self.sections.get_mut(title) {
      reporter.warn(
        self.decl_offset,
        &format!("duplicate section name '{title}'"),
      );
      existing.push_str("\n\n");
      existing.push_str(text);
    } else {
      self.sections.insert(title.to_owned(), text.to_owned());
    }
  }

  /// Store a completed `@param` description.
  pub fn store_param_desc(
    &mut self,
    name: &str,
    text: &str,
    reporter: &mut Reporter,
  ) {
    let text = text.trim_end();
    if let Some(existing) = self.parameter_descs.get_mut(name) {
      reporter.warn(
        self.decl_offset,
        &format!("duplicate parameter description '@{name}'"),
      );
      existing.push_str("\n\n");
      existing.push_str(text);
    } else {
      self.parameter_descs.insert(name.to_owned(), text.to_owned());
    }
  }

  /// Whether the file's prescan saw an export marker for `name`.
  #[must_use]
  pub fn is_exported(&self, name: &str) -> bool {
    self.exported_symbols.iter().any(|s| s == name)
  }
}
