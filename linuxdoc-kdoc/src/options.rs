//! Parser configuration.
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::patterns;

/// Markup flavor of the comment bodies.
///
/// `Rest` is the default and enables the stricter section-title whitelist;
/// `KernelDoc` is the legacy flavor, where any `Title:` line opens a section
/// and reST-significant characters are escaped on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Markup {
  #[default]
  #[serde(rename = "reST")]
  Rest,
  #[serde(rename = "kernel-doc")]
  KernelDoc,
}

impl std::str::FromStr for Markup {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "rest" => Ok(Self::Rest),
      "kernel-doc" => Ok(Self::KernelDoc),
      _ => Err(format!("unknown markup {s:?}")),
    }
  }
}

/// How exported symbols are marked in the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpMethod {
  /// `EXPORT_SYMBOL(name)` macro invocations.
  #[default]
  Macro,
  /// `EXPORT <type> name(...)` attribute prefixes.
  Attribute,
}

impl std::str::FromStr for ExpMethod {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "macro" => Ok(Self::Macro),
      "attribute" => Ok(Self::Attribute),
      _ => Err(format!("unknown export method {s:?}")),
    }
  }
}

/// Default identifiers recognized as export markers (macro method).
#[must_use]
pub fn default_exp_ids() -> Vec<String> {
  vec![
    "EXPORT_SYMBOL".to_owned(),
    "EXPORT_SYMBOL_GPL".to_owned(),
    "EXPORT_SYMBOL_GPL_FUTURE".to_owned(),
  ]
}

/// Action requested by an inline `/* parse-...: ... */` directive, beyond
/// option mutation the parser has to act on itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveAction {
  /// Option was applied; nothing else to do.
  Applied,
  /// Start recording a named snippet.
  Snip(String),
  /// Stop recording the current snippet.
  Snap,
}

/// Configuration bag for one parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOptions {
  /// Source file name, used in diagnostics and the preamble.
  pub fname: String,

  pub markup: Markup,

  /// Inline-markup substitution in the reST translator.
  pub highlight: bool,

  /// Prefix for generated anchor IDs.
  pub id_prefix: String,

  /// Allow-list of declaration/DOC names to emit; empty emits all.
  pub use_names: Vec<String>,

  /// Deny-list of declaration/DOC names.
  pub skip_names: Vec<String>,

  /// Emit every `DOC:` block even without an allow-list entry.
  pub use_all_docs: bool,

  /// Names in `use_names` that are never found are errors, not warnings.
  pub error_missing: bool,

  /// Emit non-severe warnings; `false` is "sloppy" linting.
  pub verbose_warn: bool,

  /// Prescan the whole file for exported symbols and module metadata.
  pub gather_context: bool,

  pub exp_method: ExpMethod,

  /// Identifiers considered export markers.
  pub exp_ids: Vec<String>,

  /// Attribute names hidden from displayed prototypes.
  pub known_attrs: Vec<String>,

  /// Tab-stop width applied before lexing.
  pub tab_width: usize,

  pub skip_preamble: bool,
  pub skip_epilog:   bool,

  /// Guarantee the output ends with a newline.
  pub eof_newline: bool,

  /// Emit a `:man-sect:` field on function declarations when set.
  pub man_sect: Option<u32>,

  #[serde(skip)]
  pub(crate) export_re: Option<Regex>,

  #[serde(skip)]
  pub(crate) known_attrs_re: Option<Regex>,
}

impl Default for ParseOptions {
  fn default() -> Self {
    Self {
      fname:           String::new(),
      markup:          Markup::default(),
      highlight:       true,
      id_prefix:       String::new(),
      use_names:       Vec::new(),
      skip_names:      Vec::new(),
      use_all_docs:    false,
      error_missing:   true,
      verbose_warn:    true,
      gather_context:  false,
      exp_method:      ExpMethod::default(),
      exp_ids:         default_exp_ids(),
      known_attrs:     Vec::new(),
      tab_width:       8,
      skip_preamble:   false,
      skip_epilog:     false,
      eof_newline:     true,
      man_sect:        None,
      export_re:       None,
      known_attrs_re:  None,
    }
  }
}

impl ParseOptions {
  #[must_use]
  pub fn new(fname: &str) -> Self {
    let mut opts = Self {
      fname: fname.to_owned(),
      ..Self::default()
    };
    opts.set_defaults();
    opts
  }

  /// Derive the active recognizers from the configured values.
  ///
  /// Must be called after mutating `exp_method`, `exp_ids` or
  /// `known_attrs`; `new` does it once.
  pub fn set_defaults(&mut self) {
    self.export_re = Some(match self.exp_method {
      ExpMethod::Macro => patterns::export_macro_re(&self.exp_ids),
      ExpMethod::Attribute => patterns::export_attr_re(&self.exp_ids),
    });
    if self.known_attrs.is_empty() {
      self.known_attrs_re = None;
    } else {
      let ids = self
        .known_attrs
        .iter()
        .map(|a| regex::escape(a))
        .collect::<Vec<_>>()
        .join("|");
      self.known_attrs_re = Regex::new(&format!(r"\b(?:{ids})\b")).ok();
    }
  }

  /// Apply an inline `/* parse-<opt>: <value> */` directive.
  ///
  /// # Errors
  ///
  /// Returns a message for unknown options or invalid values; the caller
  /// reports it and continues.
  pub fn apply_directive(
    &mut self,
    name: &str,
    value: &str,
  ) -> Result<DirectiveAction, String> {
    match name {
      "markup" => {
        self.markup = value.parse()?;
        Ok(DirectiveAction::Applied)
      },
      "highlight" => {
        match value {
          "on" => self.highlight = true,
          "off" => self.highlight = false,
          _ => return Err(format!("unknown highlight value {value:?}")),
        }
        Ok(DirectiveAction::Applied)
      },
      "SNIP" => {
        if value.is_empty() {
          return Err("SNIP directive without a snippet name".to_owned());
        }
        Ok(DirectiveAction::Snip(value.to_owned()))
      },
      "SNAP" => Ok(DirectiveAction::Snap),
      _ => Err(format!("unknown parse option {name:?}")),
    }
  }

  pub(crate) fn export_re(&self) -> Regex {
    self.export_re.clone().unwrap_or_else(|| {
      match self.exp_method {
        ExpMethod::Macro => patterns::export_macro_re(&self.exp_ids),
        ExpMethod::Attribute => patterns::export_attr_re(&self.exp_ids),
      }
    })
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::unwrap_used, reason = "Fine in tests")]
  use super::*;

  #[test]
  fn markup_parses_case_insensitive() {
    assert_eq!("reST".parse::<Markup>().unwrap(), Markup::Rest);
    assert_eq!("kernel-doc".parse::<Markup>().unwrap(), Markup::KernelDoc);
    assert!("docbook".parse::<Markup>().is_err());
  }

  #[test]
  fn directives_mutate_options() {
    let mut opts = ParseOptions::new("t.c");
    assert_eq!(
      opts.apply_directive("markup", "kernel-doc"),
      Ok(DirectiveAction::Applied)
    );
    assert_eq!(opts.markup, Markup::KernelDoc);

    assert_eq!(
      opts.apply_directive("SNIP", "hello-world"),
      Ok(DirectiveAction::Snip("hello-world".to_owned()))
    );
    assert_eq!(opts.apply_directive("SNAP", ""), Ok(DirectiveAction::Snap));
    assert!(opts.apply_directive("highlight", "maybe").is_err());
    assert!(opts.apply_directive("frobnicate", "yes").is_err());
  }
}
