//! Translator interface and the non-reST translators.
use std::io::Write;

use log::warn;

use crate::{
  context::ParserContext,
  error::Result,
  options::ParseOptions,
  types::{
    DeclEvent,
    DeclKind,
    DocDecl,
    EnumDecl,
    FunctionDecl,
    StructDecl,
    TypedefDecl,
  },
};

/// Consumer of completed declaration events.
///
/// The parser (or [`replay`]) drives these methods in source order. All
/// methods have no-op defaults, so a translator only implements what it
/// renders; [`NullTranslator`] implements nothing and is used for the
/// record-only pass.
pub trait Translator {
  /// Once per file, before the first declaration.
  fn output_preamble(&mut self, opts: &ParseOptions) -> Result<()> {
    let _ = opts;
    Ok(())
  }

  /// Once per file, after everything else.
  fn output_epilog(&mut self, opts: &ParseOptions) -> Result<()> {
    let _ = opts;
    Ok(())
  }

  fn output_doc(&mut self, opts: &ParseOptions, decl: &DocDecl) -> Result<()> {
    let _ = (opts, decl);
    Ok(())
  }

  fn output_function(
    &mut self,
    opts: &ParseOptions,
    decl: &FunctionDecl,
  ) -> Result<()> {
    let _ = (opts, decl);
    Ok(())
  }

  /// Struct and union declarations; `decl.kind` discriminates.
  fn output_struct(
    &mut self,
    opts: &ParseOptions,
    decl: &StructDecl,
  ) -> Result<()> {
    let _ = (opts, decl);
    Ok(())
  }

  fn output_enum(&mut self, opts: &ParseOptions, decl: &EnumDecl) -> Result<()> {
    let _ = (opts, decl);
    Ok(())
  }

  fn output_typedef(
    &mut self,
    opts: &ParseOptions,
    decl: &TypedefDecl,
  ) -> Result<()> {
    let _ = (opts, decl);
    Ok(())
  }

  /// Dispatch one event to the per-kind method.
  fn output_decl(&mut self, opts: &ParseOptions, event: &DeclEvent) -> Result<()> {
    match event {
      DeclEvent::Function(d) => self.output_function(opts, d),
      DeclEvent::Struct(d) => self.output_struct(opts, d),
      DeclEvent::Enum(d) => self.output_enum(opts, d),
      DeclEvent::Typedef(d) => self.output_typedef(opts, d),
      DeclEvent::Doc(d) => self.output_doc(opts, d),
    }
  }

  /// End of the parse; the context carries cross-declaration results.
  fn eof(&mut self, opts: &ParseOptions, ctx: &ParserContext) -> Result<()> {
    let _ = (opts, ctx);
    Ok(())
  }
}

/// Emission filter shared by the parser and [`replay`].
#[must_use]
pub fn wanted(opts: &ParseOptions, event: &DeclEvent) -> bool {
  let name = event.name();
  if !opts.use_names.is_empty() {
    return opts.use_names.iter().any(|n| n == name);
  }
  if opts.skip_names.iter().any(|n| n == name) {
    return false;
  }
  if event.kind() == DeclKind::Doc {
    return opts.use_all_docs;
  }
  true
}

/// Drive recorded dump storage through a translator.
///
/// The same options produce byte-identical output to a direct parse, which
/// is what makes the parse-once/render-many pattern safe.
///
/// # Errors
///
/// Propagates translator output failures.
pub fn replay<T: Translator>(
  events: &[DeclEvent],
  translator: &mut T,
  opts: &ParseOptions,
  ctx: &ParserContext,
) -> Result<()> {
  if !opts.skip_preamble {
    translator.output_preamble(opts)?;
  }
  for event in events.iter().filter(|e| wanted(opts, e)) {
    translator.output_decl(opts, event)?;
  }
  translator.eof(opts, ctx)?;
  if !opts.skip_epilog {
    translator.output_epilog(opts)?;
  }
  Ok(())
}

/// Translates nothing; parsing with it only fills dump storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTranslator;

impl Translator for NullTranslator {}

/// Prints an index of documented symbols, split exported/internal.
///
/// One `[kind name]` entry per line; exported symbols that never got a
/// kernel-doc comment are flagged as warnings at EOF.
#[derive(Debug)]
pub struct ListTranslator<W: Write> {
  out:            W,
  list_exports:   bool,
  /// Kind names to list among the internal symbols; `all` lists every kind.
  list_internals: Vec<String>,
  names:          Vec<(DeclKind, String)>,
}

impl<W: Write> ListTranslator<W> {
  pub fn new(out: W, list_exports: bool, list_internals: Vec<String>) -> Self {
    Self {
      out,
      list_exports,
      list_internals,
      names: Vec::new(),
    }
  }

  pub fn into_inner(self) -> W {
    self.out
  }

  fn lists_kind(&self, kind: DeclKind) -> bool {
    self
      .list_internals
      .iter()
      .any(|k| k == "all" || k == kind.as_str())
  }

  fn record(&mut self, kind: DeclKind, name: &str) {
    self.names.push((kind, name.to_owned()));
  }
}

impl<W: Write> Translator for ListTranslator<W> {
  fn output_doc(&mut self, _opts: &ParseOptions, decl: &DocDecl) -> Result<()> {
    self.record(DeclKind::Doc, &decl.name);
    Ok(())
  }

  fn output_function(
    &mut self,
    _opts: &ParseOptions,
    decl: &FunctionDecl,
  ) -> Result<()> {
    self.record(DeclKind::Function, &decl.name);
    Ok(())
  }

  fn output_struct(
    &mut self,
    _opts: &ParseOptions,
    decl: &StructDecl,
  ) -> Result<()> {
    self.record(decl.kind, &decl.name);
    Ok(())
  }

  fn output_enum(&mut self, _opts: &ParseOptions, decl: &EnumDecl) -> Result<()> {
    self.record(DeclKind::Enum, &decl.name);
    Ok(())
  }

  fn output_typedef(
    &mut self,
    _opts: &ParseOptions,
    decl: &TypedefDecl,
  ) -> Result<()> {
    self.record(DeclKind::Typedef, &decl.name);
    Ok(())
  }

  fn eof(&mut self, opts: &ParseOptions, ctx: &ParserContext) -> Result<()> {
    for (kind, name) in &self.names {
      let exported = ctx.is_exported(name);
      if exported && self.list_exports {
        writeln!(self.out, "[{kind} {name}]")?;
      }
      if !exported && self.lists_kind(*kind) {
        writeln!(self.out, "[{kind} {name}]")?;
      }
    }
    for sym in &ctx.exported_symbols {
      if !self.names.iter().any(|(_, n)| n == sym) {
        warn!("{}: exported symbol '{sym}' is undocumented", opts.fname);
      }
    }
    Ok(())
  }
}
