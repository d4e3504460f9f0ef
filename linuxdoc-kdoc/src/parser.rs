//! The kernel-doc state machine.
//!
//! Source text is fed one line at a time. Every line passes through tab
//! expansion, the inline parse-option directive check and snippet
//! recording before the current state's handler sees it. Completed
//! declarations are recorded in dump storage and handed to the active
//! translator in source order.
use std::{
  fs,
  panic::{AssertUnwindSafe, catch_unwind},
  path::Path,
};

use crate::{
  context::ParserContext,
  error::{KdocError, Result},
  options::{DirectiveAction, Markup, ParseOptions},
  patterns, proto,
  report::Reporter,
  translate::{Translator, wanted},
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
    canonical_section_title,
  },
};

/// Primary parser states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  /// Scanning plain source, waiting for `/**`.
  Normal,
  /// Inside a comment, looking for the declaration name or `DOC:`.
  Name,
  /// Scanning the comment body's sections.
  Body,
  /// Comment closed; accumulating the following declaration.
  Proto,
  /// Inside a free-form `DOC:` block.
  DocBlock,
  /// Inside a comment embedded in a struct/union body.
  SplitDoc(SplitState),
}

/// Sub-states of a split-doc comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitState {
  /// Expecting the leading `@member:` header.
  Begin,
  /// Collecting the member description.
  Member,
  /// First line was not a parameter header; skip the rest.
  Invalid,
}

/// Expand tabs to the next multiple of `width` columns.
#[must_use]
pub fn expand_tabs(line: &str, width: usize) -> String {
  if !line.contains('\t') {
    return line.to_owned();
  }
  let width = width.max(1);
  let mut out = String::with_capacity(line.len());
  let mut col = 0usize;
  for c in line.chars() {
    if c == '\t' {
      let pad = width - (col % width);
      out.extend(std::iter::repeat_n(' ', pad));
      col += pad;
    } else {
      out.push(c);
      col += 1;
    }
  }
  out
}

/// The kernel-doc parser.
///
/// One parser instance handles one source file and owns its translator
/// and context for the duration of the parse; it is not meant to be
/// shared. Callers that process many files create one parser per file.
pub struct Parser<T: Translator> {
  opts:       ParseOptions,
  translator: T,
  ctx:        ParserContext,
  reporter:   Reporter,

  state:      State,
  in_purpose: bool,
  in_define:  bool,
  brcount:    i32,

  /// Name of the snippet currently being recorded.
  snippet: Option<String>,

  split_section:  String,
  split_contents: String,
}

impl<T: Translator> Parser<T> {
  #[must_use]
  pub fn new(opts: ParseOptions, translator: T) -> Self {
    let reporter = Reporter::new(&opts.fname, opts.verbose_warn);
    Self {
      opts,
      translator,
      ctx: ParserContext::new(),
      reporter,
      state: State::Normal,
      in_purpose: false,
      in_define: false,
      brcount: 0,
      snippet: None,
      split_section: String::new(),
      split_contents: String::new(),
    }
  }

  #[must_use]
  pub fn errors(&self) -> usize {
    self.reporter.errors()
  }

  #[must_use]
  pub fn warnings(&self) -> usize {
    self.reporter.warnings()
  }

  #[must_use]
  pub const fn context(&self) -> &ParserContext {
    &self.ctx
  }

  #[must_use]
  pub const fn options(&self) -> &ParseOptions {
    &self.opts
  }

  /// Tear the parser apart after [`Parser::close`].
  #[must_use]
  pub fn into_parts(self) -> (ParseOptions, T, ParserContext) {
    (self.opts, self.translator, self.ctx)
  }

  /// Parse a whole file.
  ///
  /// # Errors
  ///
  /// I/O failures reading the file, and translator output failures.
  pub fn parse_file(&mut self, path: &Path) -> Result<()> {
    let raw = fs::read(path)?;
    let src = String::from_utf8_lossy(&raw).replace("\r\n", "\n").replace('\r', "\n");
    self.parse_string(&src)
  }

  /// Parse source text.
  ///
  /// # Errors
  ///
  /// Translator output failures. Parse-level diagnostics never error out;
  /// they are counted on the reporter.
  pub fn parse_string(&mut self, src: &str) -> Result<()> {
    if self.opts.gather_context {
      Self::gather_context(src, &mut self.ctx, &self.opts);
    }
    if !self.opts.skip_preamble {
      self.translator.output_preamble(&self.opts)?;
    }
    for raw_line in src.lines() {
      self.ctx.line_no += 1;
      let line = expand_tabs(raw_line, self.opts.tab_width);
      self.feed_line(&line)?;
    }
    if self.state != State::Normal {
      self
        .reporter
        .warn(self.ctx.line_no, "parse error: missing end of block comment '*/'");
      self.state = State::Normal;
    }
    Ok(())
  }

  /// Finish the parse: verify requested names, flush the translator.
  ///
  /// # Errors
  ///
  /// Translator output failures.
  pub fn close(&mut self) -> Result<()> {
    for name in self.opts.use_names.clone() {
      if !self.ctx.emitted_names.contains(&name) {
        let msg = format!("no documentation for '{name}' found");
        if self.opts.error_missing {
          self.reporter.error(self.ctx.line_no, &msg);
        } else {
          self.reporter.warn(self.ctx.line_no, &msg);
        }
      }
    }
    self.translator.eof(&self.opts, &self.ctx)?;
    if !self.opts.skip_epilog {
      self.translator.output_epilog(&self.opts)?;
    }
    Ok(())
  }

  /// Prescan a whole source for exported symbols and module metadata.
  pub fn gather_context(src: &str, ctx: &mut ParserContext, opts: &ParseOptions) {
    let export_re = opts.export_re();
    for line in src.lines() {
      if let Some(caps) = export_re.captures(line) {
        let name = caps[1].to_owned();
        if !ctx.exported_symbols.contains(&name) {
          ctx.exported_symbols.push(name);
        }
      }
      if let Some(caps) = patterns::MODULE_INFO.captures(line) {
        let value = caps[2].to_owned();
        match &caps[1] {
          "AUTHOR" => ctx.mod_authors.push(value),
          "DESCRIPTION" => ctx.mod_descr = Some(value),
          _ => ctx.mod_license = Some(value),
        }
      }
    }
  }

  fn feed_line(&mut self, line: &str) -> Result<()> {
    if let Some(caps) = patterns::PARSE_OPTION.captures(line) {
      let (name, value) = (caps[1].to_owned(), caps[2].to_owned());
      match self.opts.apply_directive(&name, &value) {
        Ok(DirectiveAction::Applied) => {},
        Ok(DirectiveAction::Snip(snip)) => {
          self.ctx.snippets.entry(snip.clone()).or_default();
          self.snippet = Some(snip);
        },
        Ok(DirectiveAction::Snap) => self.snippet = None,
        Err(msg) => self.reporter.warn(self.ctx.line_no, &msg),
      }
      return Ok(());
    }

    if let Some(name) = &self.snippet {
      if let Some(body) = self.ctx.snippets.get_mut(name) {
        body.push_str(line);
        body.push('\n');
      }
    }

    match self.state {
      State::Normal => {
        self.normal(line);
        Ok(())
      },
      State::Name => {
        self.name(line);
        Ok(())
      },
      State::Body => self.body(line),
      State::Proto => self.proto(line),
      State::DocBlock => self.doc_block(line),
      State::SplitDoc(sub) => {
        self.split_doc(sub, line);
        Ok(())
      },
    }
  }

  // State 0: plain source.
  fn normal(&mut self, line: &str) {
    if patterns::DOC_START.is_match(line) {
      self.ctx.reset_decl();
      self.in_purpose = false;
      self.in_define = false;
      self.state = State::Name;
    }
  }

  // State 1: identify what the comment documents.
  fn name(&mut self, line: &str) {
    if let Some(caps) = patterns::DOC_BLOCK.captures(line) {
      let title = if caps[1].is_empty() {
        "Introduction".to_owned()
      } else {
        caps[1].to_owned()
      };
      self.ctx.decl_kind = Some(DeclKind::Doc);
      self.ctx.decl_name = title.clone();
      self.ctx.section = title;
      self.ctx.contents.clear();
      self.state = State::DocBlock;
      return;
    }

    let (kind, name, rest_start) =
      if let Some(caps) = patterns::DOC_DECL_KIND.captures(line) {
        let kind = DeclKind::from_keyword(&caps[1]).unwrap_or(DeclKind::Function);
        (kind, caps[2].to_owned(), caps.get(0).map_or(0, |m| m.end()))
      } else if let Some(caps) = patterns::DOC_DECL_NAME.captures(line) {
        (
          DeclKind::Function,
          caps[1].to_owned(),
          caps.get(0).map_or(0, |m| m.end()),
        )
      } else {
        self.reporter.warn(
          self.ctx.line_no,
          &format!("cannot understand '{}' - I thought it was a doc line", line.trim()),
        );
        self.state = State::Normal;
        return;
      };

    let mut rest = line[rest_start..].trim_start();
    if let Some(r) = rest.strip_prefix("()") {
      rest = r.trim_start();
    }

    self.ctx.decl_kind = Some(kind);
    self.ctx.decl_name = name;
    self.ctx.section = SECTION_DEFAULT.to_owned();
    self.ctx.contents.clear();
    self.in_purpose = true;

    let purpose = rest
      .strip_prefix('-')
      .map_or(rest, str::trim_start)
      .trim()
      .trim_end_matches("*/")
      .trim();
    self.ctx.purpose = purpose.to_owned();

    if patterns::DOC_END.is_match(line) {
      // One-line comment: `/** name - purpose */` has no body.
      self.ctx.prototype.clear();
      self.brcount = 0;
      self.in_purpose = false;
      self.state = State::Proto;
    } else {
      self.state = State::Body;
    }
  }

  /// Recognize a section header under the active markup rules.
  fn match_section(&self, line: &str) -> Option<(String, String)> {
    if let Some(caps) = patterns::SECT_PARAM.captures(line) {
      return Some((format!("@{}", &caps[1]), caps[2].to_owned()));
    }
    match self.opts.markup {
      Markup::Rest => {
        if let Some(caps) = patterns::SECT_KNOWN.captures(line) {
          return Some((canonical_section_title(&caps[1]), caps[2].to_owned()));
        }
        if !self.ctx.section.starts_with('@') {
          if let Some(caps) = patterns::SECT_BARE_TITLE.captures(line) {
            return Some((canonical_section_title(&caps[1]), String::new()));
          }
        }
        None
      },
      Markup::KernelDoc => {
        let caps = patterns::SECT_TITLE.captures(line)?;
        // A trailing URL is content, not a section header.
        if caps[2].starts_with("//") {
          return None;
        }
        Some((canonical_section_title(&caps[1]), caps[2].to_owned()))
      },
    }
  }

  fn flush_section(&mut self) {
    let section = std::mem::take(&mut self.ctx.section);
    let contents = std::mem::take(&mut self.ctx.contents);
    if section.is_empty() {
      return;
    }
    if let Some(pname) = section.strip_prefix('@') {
      self.ctx.store_param_desc(pname, &contents, &mut self.reporter);
    } else {
      self.ctx.store_section(&section, &contents, &mut self.reporter);
    }
  }

  // State 2: the comment body.
  fn body(&mut self, line: &str) -> Result<()> {
    if let Some((section, rest)) = self.match_section(line) {
      self.flush_section();
      self.in_purpose = false;
      self.ctx.section = section;
      if !rest.is_empty() {
        self.ctx.contents.push_str(&rest);
        self.ctx.contents.push('\n');
      }
      return Ok(());
    }

    if patterns::DOC_END.is_match(line) {
      self.flush_section();
      self.ctx.section = SECTION_DEFAULT.to_owned();
      self.ctx.prototype.clear();
      self.brcount = 0;
      self.in_define = false;
      self.state = State::Proto;
      return Ok(());
    }

    let content = patterns::DOC_COM.replace(line, "").into_owned();

    if content.trim().is_empty() {
      if self.in_purpose {
        self.in_purpose = false;
        self.ctx.section = SECTION_DEFAULT.to_owned();
        self.ctx.contents.clear();
      } else if self.ctx.section.starts_with('@') {
        // Blank line closes a parameter description.
        self.flush_section();
        self.ctx.section = SECTION_DEFAULT.to_owned();
      } else {
        self.ctx.contents.push('\n');
      }
      return Ok(());
    }

    if self.in_purpose {
      if !self.ctx.purpose.is_empty() {
        self.ctx.purpose.push(' ');
      }
      self.ctx.purpose.push_str(content.trim());
      return Ok(());
    }

    let in_param = self.ctx.section.starts_with('@');
    if self.opts.markup == Markup::Rest && in_param {
      let text = content.trim_start();
      if patterns::SECT_BARE_TITLE.is_match(line) {
        // A nested `Title:` keeps its own paragraph.
        self.ctx.contents.push('\n');
        self.ctx.contents.push_str(text);
        self.ctx.contents.push_str("\n\n");
      } else {
        self.ctx.contents.push_str(text);
        self.ctx.contents.push('\n');
      }
    } else {
      self.ctx.contents.push_str(&content);
      self.ctx.contents.push('\n');
    }
    Ok(())
  }

  // State 3: accumulate the declaration following the comment.
  fn proto(&mut self, line: &str) -> Result<()> {
    if patterns::DOC_SPLIT_START.is_match(line) {
      self.split_section.clear();
      self.split_contents.clear();
      self.state = State::SplitDoc(SplitState::Begin);
      return Ok(());
    }
    if self.ctx.decl_kind == Some(DeclKind::Function) {
      self.proto_function(line)
    } else {
      self.proto_type(line)
    }
  }

  fn proto_function(&mut self, line: &str) -> Result<()> {
    let line = proto::strip_c99_comments(line);
    let line = patterns::C89_COMMENT.replace_all(&line, " ").into_owned();
    let trimmed = line.trim();

    if self.ctx.prototype.is_empty() && trimmed.starts_with('#') {
      self.in_define = true;
    }

    if self.in_define {
      self.ctx.prototype.push_str(trimmed.trim_end_matches('\\'));
      self.ctx.prototype.push(' ');
      if !trimmed.ends_with('\\') {
        self.in_define = false;
        return self.dump_function();
      }
      return Ok(());
    }

    let mut done = false;
    for c in line.chars() {
      if c == '{' || c == ';' {
        done = true;
        break;
      }
      self.ctx.prototype.push(c);
    }
    if done {
      self.dump_function()
    } else {
      self.ctx.prototype.push(' ');
      Ok(())
    }
  }

  fn proto_type(&mut self, line: &str) -> Result<()> {
    let line = proto::strip_c99_comments(line);
    let mut done = false;
    for c in line.chars() {
      match c {
        '{' => {
          self.brcount += 1;
          self.ctx.prototype.push(c);
        },
        '}' => {
          self.brcount -= 1;
          self.ctx.prototype.push(c);
        },
        ';' if self.brcount == 0 => {
          self.ctx.prototype.push(c);
          done = true;
          break;
        },
        _ => self.ctx.prototype.push(c),
      }
    }
    if done {
      self.dump_type()
    } else {
      self.ctx.prototype.push('\n');
      Ok(())
    }
  }

  fn dump_function(&mut self) -> Result<()> {
    self.state = State::Normal;
    let raw = proto::normalize_ws(&self.ctx.prototype);
    if raw.is_empty() {
      self.reporter.warn(self.ctx.decl_offset, "cannot understand empty prototype");
      return Ok(());
    }

    let rewritten = proto::normalize_syscall(&raw)
      .or_else(|| proto::normalize_tracepoint(&raw))
      .unwrap_or(raw);

    let (return_type, name, args) = if rewritten.starts_with('#') {
      let Some(caps) = patterns::DEFINE_PROTO.captures(&rewritten) else {
        self.reporter.warn(
          self.ctx.decl_offset,
          &format!("cannot understand macro prototype: '{rewritten}'"),
        );
        return Ok(());
      };
      let name = caps[1].to_owned();
      let args = caps.get(2).map(|m| m.as_str().to_owned());
      (String::new(), name, args)
    } else {
      let cleaned =
        proto::sanitize_prototype(&rewritten, self.opts.known_attrs_re.as_ref());
      let Some(caps) = patterns::FUNC_PROTOTYPES
        .iter()
        .find_map(|re| re.captures(&cleaned))
      else {
        self.reporter.warn(
          self.ctx.decl_offset,
          &format!("cannot understand function prototype: '{cleaned}'"),
        );
        return Ok(());
      };
      (
        caps[1].trim().to_owned(),
        caps[2].to_owned(),
        Some(caps[3].to_owned()),
      )
    };

    self.check_decl_name(&name, DeclKind::Function);
    if let Some(args) = args {
      proto::create_parameterlist(&args, ',', &mut self.ctx, &mut self.reporter);
    }
    self.check_sections(&name);
    self.check_purpose(&name);

    let event = DeclEvent::Function(FunctionDecl {
      name,
      purpose: self.ctx.purpose.clone(),
      return_type,
      parameter_list: self.ctx.parameter_list.clone(),
      parameter_types: self.ctx.parameter_types.clone(),
      parameter_descs: self.ctx.parameter_descs.clone(),
      sections: self.ctx.sections.clone(),
      line_no: self.ctx.decl_offset,
    });
    self.output_decl_event(event)
  }

  fn dump_type(&mut self) -> Result<()> {
    self.state = State::Normal;
    match self.ctx.decl_kind {
      Some(DeclKind::Struct | DeclKind::Union) => self.dump_struct(),
      Some(DeclKind::Enum) => self.dump_enum(),
      Some(DeclKind::Typedef) => self.dump_typedef(),
      _ => Ok(()),
    }
  }

  fn dump_struct(&mut self) -> Result<()> {
    let prototype = self.ctx.prototype.clone();
    let Some(caps) = patterns::STRUCT_PROTO.captures(&prototype) else {
      self
        .reporter
        .warn(self.ctx.decl_offset, "cannot parse struct or union!");
      return Ok(());
    };
    let kind = if &caps[1] == "union" {
      DeclKind::Union
    } else {
      DeclKind::Struct
    };
    let name = caps[2].to_owned();
    if self.ctx.decl_kind != Some(kind) {
      self.reporter.warn(
        self.ctx.decl_offset,
        &format!(
          "declaration kind differs from comment: {} <--> {kind}",
          self.ctx.decl_kind.map_or("?", DeclKind::as_str),
        ),
      );
    }
    self.check_decl_name(&name, kind);

    let definition = proto::cleanup_struct_body(&caps[3]).trim().to_owned();
    let members = proto::flatten_nested(&definition);
    proto::create_parameterlist(&members, ';', &mut self.ctx, &mut self.reporter);
    self.check_sections(&name);
    self.check_purpose(&name);

    let event = DeclEvent::Struct(StructDecl {
      kind,
      name,
      purpose: self.ctx.purpose.clone(),
      parameter_list: self.ctx.parameter_list.clone(),
      parameter_types: self.ctx.parameter_types.clone(),
      parameter_descs: self.ctx.parameter_descs.clone(),
      sections: self.ctx.sections.clone(),
      definition,
      line_no: self.ctx.decl_offset,
    });
    self.output_decl_event(event)
  }

  fn dump_enum(&mut self) -> Result<()> {
    let prototype = self.ctx.prototype.clone();
    let Some(caps) = patterns::ENUM_PROTO.captures(&prototype) else {
      self.reporter.warn(self.ctx.decl_offset, "cannot parse enum!");
      return Ok(());
    };
    let name = caps[1].to_owned();
    self.check_decl_name(&name, DeclKind::Enum);

    let body = proto::strip_c89_comments(&caps[2]);
    for member in proto::split_outer(&body, ',') {
      let head = member.split('=').next().unwrap_or("");
      let Some(constant) = head.split_whitespace().next() else {
        continue;
      };
      if !self.ctx.parameter_list.iter().any(|p| p == constant) {
        self.ctx.parameter_list.push(constant.to_owned());
      }
    }
    self.check_sections(&name);
    self.check_purpose(&name);

    let event = DeclEvent::Enum(EnumDecl {
      name,
      purpose: self.ctx.purpose.clone(),
      parameter_list: self.ctx.parameter_list.clone(),
      parameter_descs: self.ctx.parameter_descs.clone(),
      sections: self.ctx.sections.clone(),
      line_no: self.ctx.decl_offset,
    });
    self.output_decl_event(event)
  }

  fn dump_typedef(&mut self) -> Result<()> {
    let prototype = proto::strip_c89_comments(&self.ctx.prototype);
    let name = patterns::TYPEDEF_FUNC_PTR
      .captures(&prototype)
      .or_else(|| patterns::TYPEDEF_FUNC.captures(&prototype))
      .or_else(|| patterns::TYPEDEF_SIMPLE.captures(&prototype))
      .map(|caps| caps[1].to_owned());
    let Some(name) = name else {
      self.reporter.warn(self.ctx.decl_offset, "cannot parse typedef!");
      return Ok(());
    };
    self.check_decl_name(&name, DeclKind::Typedef);
    self.check_purpose(&name);

    let event = DeclEvent::Typedef(TypedefDecl {
      name,
      purpose: self.ctx.purpose.clone(),
      sections: self.ctx.sections.clone(),
      line_no: self.ctx.decl_offset,
    });
    self.output_decl_event(event)
  }

  // State 4: free-form DOC block.
  fn doc_block(&mut self, line: &str) -> Result<()> {
    if let Some(caps) = patterns::DOC_BLOCK.captures(line) {
      self.dump_doc()?;
      let title = if caps[1].is_empty() {
        "Introduction".to_owned()
      } else {
        caps[1].to_owned()
      };
      self.ctx.decl_name = title.clone();
      self.ctx.section = title;
      self.ctx.contents.clear();
      self.ctx.decl_offset = self.ctx.line_no;
      return Ok(());
    }
    if patterns::DOC_END.is_match(line) {
      self.dump_doc()?;
      self.state = State::Normal;
      return Ok(());
    }
    let content = patterns::DOC_COM.replace(line, "").into_owned();
    if content.trim().is_empty() {
      self.ctx.contents.push('\n');
    } else {
      self.ctx.contents.push_str(&content);
      self.ctx.contents.push('\n');
    }
    Ok(())
  }

  fn dump_doc(&mut self) -> Result<()> {
    let title = self.ctx.decl_name.clone();
    if title.is_empty() {
      self.reporter.warn(self.ctx.decl_offset, "DOC: block without a title");
      return Ok(());
    }
    let mut sections = SectionMap::new();
    sections.insert(title.clone(), self.ctx.contents.trim().to_owned());
    let event = DeclEvent::Doc(DocDecl {
      name: title,
      sections,
      line_no: self.ctx.decl_offset,
    });
    self.output_decl_event(event)
  }

  // State 5: comment inside a struct/union body.
  fn split_doc(&mut self, sub: SplitState, line: &str) {
    match sub {
      SplitState::Begin => {
        if let Some(caps) = patterns::SECT_PARAM.captures(line) {
          self.split_section = caps[1].to_owned();
          self.split_contents.clear();
          if !caps[2].is_empty() {
            self.split_contents.push_str(&caps[2]);
            self.split_contents.push('\n');
          }
          self.state = State::SplitDoc(SplitState::Member);
        } else if patterns::DOC_END.is_match(line) {
          self.state = State::Proto;
        } else {
          self.reporter.error(
            self.ctx.line_no,
            "comment within a declaration does not start with a parameter description",
          );
          self.state = State::SplitDoc(SplitState::Invalid);
        }
      },
      SplitState::Member => {
        if let Some(caps) = patterns::SECT_PARAM.captures(line) {
          self.flush_split();
          self.split_section = caps[1].to_owned();
          if !caps[2].is_empty() {
            self.split_contents.push_str(&caps[2]);
            self.split_contents.push('\n');
          }
        } else if patterns::DOC_END.is_match(line) {
          self.flush_split();
          self.state = State::Proto;
        } else {
          let content = patterns::DOC_COM.replace(line, "").into_owned();
          if content.trim().is_empty() {
            self.split_contents.push('\n');
          } else {
            self.split_contents.push_str(&content);
            self.split_contents.push('\n');
          }
        }
      },
      SplitState::Invalid => {
        if patterns::DOC_END.is_match(line) {
          self.state = State::Proto;
        }
      },
    }
  }

  fn flush_split(&mut self) {
    let section = std::mem::take(&mut self.split_section);
    let contents = std::mem::take(&mut self.split_contents);
    if section.is_empty() {
      return;
    }
    self
      .ctx
      .store_param_desc(&section, &contents, &mut self.reporter);
  }

  /// Warn when the comment and the declaration disagree on the name; the
  /// declaration wins.
  fn check_decl_name(&mut self, parsed: &str, kind: DeclKind) {
    let comment_name = self.ctx.decl_name.trim_end_matches("()");
    if !comment_name.is_empty() && comment_name != parsed {
      self.reporter.warn(
        self.ctx.decl_offset,
        &format!("{kind} name from comment differs: {comment_name} <--> {parsed}"),
      );
    }
  }

  fn check_purpose(&mut self, name: &str) {
    if self.ctx.purpose.trim().is_empty() {
      self.reporter.vwarn(
        self.ctx.decl_offset,
        &format!("missing initial short description of '{name}'"),
      );
    }
  }

  /// Enforce the description/declaration parameter invariants.
  fn check_sections(&mut self, decl_name: &str) {
    let offset = self.ctx.decl_offset;

    let excess: Vec<String> = self
      .ctx
      .parameter_descs
      .keys()
      .filter(|key| {
        let parent = key.split('.').next().unwrap_or(key.as_str());
        !self.ctx.parameter_list.iter().any(|p| p == *key || p == parent)
      })
      .cloned()
      .collect();
    for key in excess {
      self.reporter.warn(
        offset,
        &format!("excess parameter description '@{key}' in '{decl_name}'"),
      );
    }

    let missing: Vec<String> = self
      .ctx
      .parameter_list
      .iter()
      .filter(|p| {
        self
          .ctx
          .parameter_descs
          .get(*p)
          .is_none_or(|d| d.trim().is_empty())
      })
      .cloned()
      .collect();
    for name in missing {
      self.reporter.vwarn(
        offset,
        &format!("missing description of parameter '{name}' in '{decl_name}'"),
      );
      self
        .ctx
        .parameter_descs
        .insert(name, UNDESCRIBED.to_owned());
    }
  }

  fn output_decl_event(&mut self, event: DeclEvent) -> Result<()> {
    let name = event.name().to_owned();
    if self.ctx.emitted_names.contains(&name) {
      self.reporter.error(
        self.ctx.decl_offset,
        &format!("name '{name}' used several times"),
      );
      return Ok(());
    }
    self.ctx.emitted_names.insert(name);
    self.ctx.dump_storage.push(event.clone());
    if wanted(&self.opts, &event) {
      self.translator.output_decl(&self.opts, &event)?;
    }
    Ok(())
  }
}

/// Parse with panic recovery.
///
/// Corrupt input that defeats the state machine aborts this file only;
/// the panic is mapped to [`KdocError::Fatal`] so callers can count it
/// and continue with their remaining files.
///
/// # Errors
///
/// Everything [`Parser::parse_string`] returns, plus `Fatal` on panic.
pub fn parse_with_recovery<T: Translator>(
  parser: &mut Parser<T>,
  src: &str,
) -> Result<()> {
  let result = catch_unwind(AssertUnwindSafe(|| parser.parse_string(src)));
  match result {
    Ok(res) => res,
    Err(panic_err) => {
      let message = panic_err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic_err.downcast_ref::<&str>().map(|s| (*s).to_owned()))
        .unwrap_or_else(|| "unknown panic".to_owned());
      Err(KdocError::Fatal {
        file: parser.options().fname.clone(),
        message,
      })
    },
  }
}
