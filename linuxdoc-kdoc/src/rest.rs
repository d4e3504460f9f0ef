//! reStructuredText translator.
//!
//! Renders declaration events as reST: anchors, C-domain directives,
//! `:param:` fields, Definition/Members/Constants blocks. Comment bodies
//! run through a two-pass inline highlighter: a mask pass escaping
//! reST-significant characters (legacy kernel-doc markup only) and a
//! type-reference pass turning `&struct foo`, `foo()`, `%CONST`, `@param`
//! and `$ENV` into cross-references and literals. Both passes skip
//! literal blocks.
use std::{io::Write, sync::LazyLock};

use regex::Regex;

use crate::{
  error::Result,
  options::{Markup, ParseOptions},
  patterns::never_matching,
  translate::Translator,
  types::{
    DeclKind,
    DocDecl,
    EnumDecl,
    FunctionDecl,
    StructDecl,
    TypedefDecl,
  },
};

fn build(pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| {
    log::error!("Failed to compile highlight pattern {pattern:?}: {e}");
    never_matching()
  })
}

// Mask pass: escape reST-significant characters in legacy markup.
static MASK_SPECIAL: LazyLock<Regex> =
  LazyLock::new(|| build(r"([*|`])"));
static MASK_UNDERSCORE_LEAD: LazyLock<Regex> =
  LazyLock::new(|| build(r"(^|\s)_(\w)"));
static MASK_UNDERSCORE_TAIL: LazyLock<Regex> =
  LazyLock::new(|| build(r"(\w)_(\s|$)"));

// Type-reference pass, applied in order.
static REF_TYPE_KEYWORD: LazyLock<Regex> =
  LazyLock::new(|| build(r"&(struct|union|enum|typedef)\s+(\w+)"));
static REF_MEMBER: LazyLock<Regex> =
  LazyLock::new(|| build(r"&(\w+)\s*(?:->|\.)\s*(\w+)"));
static REF_FUNC_AT: LazyLock<Regex> =
  LazyLock::new(|| build(r"@(\w+)\(\)"));
static REF_FUNC: LazyLock<Regex> =
  LazyLock::new(|| build(r"\b([a-zA-Z_]\w+)\(\)"));
static REF_CONST: LazyLock<Regex> =
  LazyLock::new(|| build(r"%([-\w]+)"));
static REF_PARAM: LazyLock<Regex> =
  LazyLock::new(|| build(r"@(\w+(?:\.\w+)*)"));
static REF_ENV: LazyLock<Regex> =
  LazyLock::new(|| build(r"\$(\w+)"));
static REF_TYPE: LazyLock<Regex> =
  LazyLock::new(|| build(r"&(\w+)"));

/// Inline-markup substitutions for one line outside literal blocks.
fn highlight_line(line: &str, markup: Markup) -> String {
  let mut s = line.to_owned();
  if markup == Markup::KernelDoc {
    s = MASK_SPECIAL.replace_all(&s, r"\$1").into_owned();
    s = MASK_UNDERSCORE_LEAD.replace_all(&s, r"$1\_$2").into_owned();
    s = MASK_UNDERSCORE_TAIL.replace_all(&s, r"$1\_$2").into_owned();
  }
  s = REF_TYPE_KEYWORD
    .replace_all(&s, ":c:type:`$1 $2 <$2>`")
    .into_owned();
  s = REF_MEMBER.replace_all(&s, ":c:type:`$1->$2 <$1>`").into_owned();
  s = REF_FUNC_AT.replace_all(&s, ":c:func:`$1`").into_owned();
  s = REF_FUNC.replace_all(&s, ":c:func:`$1`").into_owned();
  s = REF_CONST.replace_all(&s, "``$1``").into_owned();
  s = REF_PARAM.replace_all(&s, "``$1``").into_owned();
  s = REF_ENV.replace_all(&s, "``$1``").into_owned();
  s = REF_TYPE.replace_all(&s, ":c:type:`$1`").into_owned();
  s
}

fn indent_width(line: &str) -> usize {
  line.len() - line.trim_start_matches(' ').len()
}

/// Apply the highlight passes to a text block, skipping literal regions.
///
/// A literal region opens after a line ending in `::` (or a
/// `.. code-block::` directive) and closes at the first non-blank line
/// indented no deeper than the opener.
#[must_use]
pub fn highlight_block(text: &str, opts: &ParseOptions) -> String {
  if !opts.highlight {
    return text.to_owned();
  }
  let mut out: Vec<String> = Vec::new();
  let mut literal_indent: Option<usize> = None;
  for line in text.lines() {
    if let Some(indent) = literal_indent {
      if line.trim().is_empty() || indent_width(line) > indent {
        out.push(line.to_owned());
        continue;
      }
      literal_indent = None;
    }
    let trimmed = line.trim_end();
    if trimmed.ends_with("::") || trimmed.trim_start().starts_with(".. code-block::") {
      literal_indent = Some(indent_width(line));
      out.push(highlight_line(line, opts.markup));
      continue;
    }
    out.push(highlight_line(line, opts.markup));
  }
  out.join("\n")
}

/// Rebuild a display declarator from a split `(type, name)` pair.
///
/// Pointer-to-function types get the name back inside the parentheses;
/// bitfield widths move behind the name.
#[must_use]
pub fn member_label(ty: &str, name: &str) -> String {
  if ty.is_empty() {
    return name.to_owned();
  }
  if ty.contains("(*") {
    return ty.replacen("(*", &format!("(*{name}"), 1);
  }
  if let Some((base, width)) = ty.rsplit_once(':') {
    if width.chars().all(|c| c.is_ascii_digit()) {
      return format!("{base} {name}:{width}");
    }
  }
  if ty.ends_with('*') {
    return format!("{ty}{name}");
  }
  format!("{ty} {name}")
}

/// Render kernel-doc events as reStructuredText.
#[derive(Debug)]
pub struct ReSTTranslator<W: Write> {
  out: W,
}

impl<W: Write> ReSTTranslator<W> {
  pub fn new(out: W) -> Self {
    Self { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }

  fn anchor(&mut self, opts: &ParseOptions, name: &str) -> Result<()> {
    if opts.id_prefix.is_empty() {
      writeln!(self.out, ".. _`{name}`:")?;
    } else {
      writeln!(self.out, ".. _`{}.{name}`:", opts.id_prefix)?;
    }
    writeln!(self.out)?;
    Ok(())
  }

  fn header(&mut self, title: &str, underline: char) -> Result<()> {
    writeln!(self.out, "{title}")?;
    let bar: String = std::iter::repeat_n(underline, title.chars().count()).collect();
    writeln!(self.out, "{bar}")?;
    writeln!(self.out)?;
    Ok(())
  }

  fn indented(&mut self, text: &str, indent: usize) -> Result<()> {
    let pad = " ".repeat(indent);
    for line in text.lines() {
      if line.trim().is_empty() {
        writeln!(self.out)?;
      } else {
        writeln!(self.out, "{pad}{line}")?;
      }
    }
    Ok(())
  }

  /// Render the trailing prose sections of a declaration.
  fn sections(&mut self, opts: &ParseOptions, sections: &crate::types::SectionMap) -> Result<()> {
    for (title, body) in sections {
      self.header(title, '-')?;
      self.indented(&highlight_block(body, opts), 0)?;
      writeln!(self.out)?;
    }
    Ok(())
  }

  fn param_fields(
    &mut self,
    opts: &ParseOptions,
    list: &[String],
    descs: &crate::types::SectionMap,
  ) -> Result<()> {
    for name in list {
      if name.contains('.') {
        // Dotted members render nested under their parent field.
        continue;
      }
      if name == "void" {
        continue;
      }
      writeln!(self.out, "    :param {name}:")?;
      if let Some(desc) = descs.get(name) {
        self.indented(&highlight_block(desc, opts), 8)?;
      }
      let subs: Vec<&String> = descs
        .keys()
        .filter(|k| k.starts_with(&format!("{name}.")))
        .collect();
      for sub in subs {
        writeln!(self.out)?;
        writeln!(self.out, "        {sub}")?;
        if let Some(desc) = descs.get(sub.as_str()) {
          self.indented(&highlight_block(desc, opts), 12)?;
        }
      }
      writeln!(self.out)?;
    }
    Ok(())
  }

  /// The argument list of a rendered function prototype.
  fn arg_string(decl: &FunctionDecl) -> String {
    decl
      .parameter_list
      .iter()
      .map(|name| {
        if name == "..." {
          "...".to_owned()
        } else {
          let ty = decl
            .parameter_types
            .get(name)
            .map_or("", String::as_str);
          member_label(ty, name)
        }
      })
      .collect::<Vec<_>>()
      .join(", ")
  }

  /// Re-indent a struct/union body as a C code block.
  fn format_definition(kind: DeclKind, name: &str, body: &str) -> String {
    let mut out = format!("{kind} {name} {{\n");
    let mut level = 1usize;
    let mut seg = String::new();
    for line in body.lines() {
      let line = line.trim();
      if line.starts_with('#') {
        // Preprocessor lines keep their shape and get no `;`.
        out.push_str(&"    ".repeat(level));
        out.push_str(line);
        out.push('\n');
        continue;
      }
      for c in line.chars() {
        match c {
          '{' => {
            out.push_str(&"    ".repeat(level));
            out.push_str(seg.trim());
            out.push_str(" {\n");
            seg.clear();
            level += 1;
          },
          '}' => {
            level = level.saturating_sub(1).max(1);
            seg.push('}');
          },
          ';' => {
            let text = seg.trim();
            if !text.is_empty() {
              out.push_str(&"    ".repeat(level));
              out.push_str(text);
              out.push_str(";\n");
            }
            seg.clear();
          },
          _ => seg.push(c),
        }
      }
      seg.push(' ');
    }
    let rest = seg.trim();
    if !rest.is_empty() {
      out.push_str(&"    ".repeat(level));
      out.push_str(rest);
      out.push('\n');
    }
    out.push_str("};");
    out
  }
}

impl<W: Write> Translator for ReSTTranslator<W> {
  fn output_preamble(&mut self, opts: &ParseOptions) -> Result<()> {
    writeln!(self.out, ".. -*- coding: utf-8; mode: rst -*-")?;
    writeln!(self.out, "..")?;
    writeln!(self.out, "..   Generated from {}", opts.fname)?;
    writeln!(self.out)?;
    Ok(())
  }

  fn output_epilog(&mut self, opts: &ParseOptions) -> Result<()> {
    if opts.eof_newline {
      writeln!(self.out)?;
    }
    Ok(())
  }

  fn output_doc(&mut self, opts: &ParseOptions, decl: &DocDecl) -> Result<()> {
    for (title, body) in &decl.sections {
      self.anchor(opts, title)?;
      self.header(title, '=')?;
      self.indented(&highlight_block(body, opts), 0)?;
      writeln!(self.out)?;
    }
    Ok(())
  }

  fn output_function(&mut self, opts: &ParseOptions, decl: &FunctionDecl) -> Result<()> {
    self.anchor(opts, &decl.name)?;
    self.header(&decl.name, '=')?;

    let args = Self::arg_string(decl);
    if decl.return_type.is_empty() {
      if decl.parameter_list.is_empty() {
        writeln!(self.out, ".. c:function:: {}", decl.name)?;
      } else {
        writeln!(self.out, ".. c:function:: {}({args})", decl.name)?;
      }
    } else {
      writeln!(self.out, ".. c:function:: {} {}({args})", decl.return_type, decl.name)?;
    }
    if let Some(sect) = opts.man_sect {
      writeln!(self.out, "    :man-sect: {sect}")?;
    }
    writeln!(self.out)?;

    if !decl.purpose.is_empty() {
      self.indented(&highlight_block(&decl.purpose, opts), 4)?;
      writeln!(self.out)?;
    }

    self.param_fields(opts, &decl.parameter_list, &decl.parameter_descs)?;
    self.sections(opts, &decl.sections)?;
    Ok(())
  }

  fn output_struct(&mut self, opts: &ParseOptions, decl: &StructDecl) -> Result<()> {
    let title = format!("{} {}", decl.kind, decl.name);
    self.anchor(opts, &decl.name)?;
    self.header(&title, '=')?;

    let directive = if decl.kind == DeclKind::Union {
      "c:union"
    } else {
      "c:struct"
    };
    writeln!(self.out, ".. {directive}:: {}", decl.name)?;
    writeln!(self.out)?;

    if !decl.purpose.is_empty() {
      self.indented(&highlight_block(&decl.purpose, opts), 4)?;
      writeln!(self.out)?;
    }

    self.header("Definition", '-')?;
    writeln!(self.out, ".. code-block:: c")?;
    writeln!(self.out)?;
    let definition =
      Self::format_definition(decl.kind, &decl.name, &decl.definition);
    self.indented(&definition, 4)?;
    writeln!(self.out)?;

    self.header("Members", '-')?;
    for name in &decl.parameter_list {
      let ty = decl.parameter_types.get(name).map_or("", String::as_str);
      let label = member_label(ty, name);
      let indent = if name.contains('.') { 4 } else { 0 };
      self.indented(&format!("``{label}``"), indent)?;
      if let Some(desc) = decl.parameter_descs.get(name) {
        self.indented(&highlight_block(desc, opts), indent + 4)?;
      }
      writeln!(self.out)?;
    }

    self.sections(opts, &decl.sections)?;
    Ok(())
  }

  fn output_enum(&mut self, opts: &ParseOptions, decl: &EnumDecl) -> Result<()> {
    self.anchor(opts, &decl.name)?;
    self.header(&format!("enum {}", decl.name), '=')?;

    writeln!(self.out, ".. c:enum:: {}", decl.name)?;
    writeln!(self.out)?;

    if !decl.purpose.is_empty() {
      self.indented(&highlight_block(&decl.purpose, opts), 4)?;
      writeln!(self.out)?;
    }

    self.header("Definition", '-')?;
    writeln!(self.out, "::")?;
    writeln!(self.out)?;
    writeln!(self.out, "    enum {} {{", decl.name)?;
    let last = decl.parameter_list.len().saturating_sub(1);
    for (idx, constant) in decl.parameter_list.iter().enumerate() {
      if idx == last {
        writeln!(self.out, "        {constant}")?;
      } else {
        writeln!(self.out, "        {constant},")?;
      }
    }
    writeln!(self.out, "    }};")?;
    writeln!(self.out)?;

    self.header("Constants", '-')?;
    for constant in &decl.parameter_list {
      writeln!(self.out, "``{constant}``")?;
      if let Some(desc) = decl.parameter_descs.get(constant) {
        self.indented(&highlight_block(desc, opts), 4)?;
      }
      writeln!(self.out)?;
    }

    self.sections(opts, &decl.sections)?;
    Ok(())
  }

  fn output_typedef(&mut self, opts: &ParseOptions, decl: &TypedefDecl) -> Result<()> {
    self.anchor(opts, &decl.name)?;
    self.header(&format!("typedef {}", decl.name), '=')?;

    writeln!(self.out, ".. c:type:: {}", decl.name)?;
    writeln!(self.out)?;

    if !decl.purpose.is_empty() {
      self.indented(&highlight_block(&decl.purpose, opts), 4)?;
      writeln!(self.out)?;
    }

    self.sections(opts, &decl.sections)?;
    Ok(())
  }
}
