//! The `rest` subcommand: kernel-doc comments to reST on stdout.
use std::{io, path::PathBuf};

use anyhow::Result;
use linuxdoc_kdoc::{
  ExpMethod,
  ListTranslator,
  NullTranslator,
  ParseOptions,
  Parser,
  ParserContext,
  ReSTTranslator,
  Translator,
  parse_with_recovery,
};
use log::error;

use crate::utils;

/// Resolved `rest` arguments.
#[derive(Debug)]
pub struct RestOpts {
  pub files:          Vec<PathBuf>,
  pub id_prefix:      String,
  pub markup:         String,
  pub use_names:      Vec<String>,
  pub exported:       bool,
  pub internal:       bool,
  pub list_exports:   bool,
  pub list_internals: Vec<String>,
  pub skip_preamble:  bool,
  pub skip_epilog:    bool,
  pub exp_method:     String,
  pub exp_ids:        Vec<String>,
  pub known_attrs:    Vec<String>,
  pub sloppy:         bool,
  pub man_sect:       Option<u32>,
}

/// Run the command; returns the number of kernel-doc errors.
pub fn run(cmd: &RestOpts) -> Result<usize> {
  let mut errors = 0usize;

  for file in &cmd.files {
    let path = utils::resolve(file);
    let src = utils::read_source(&path)?;

    let mut opts =
      utils::base_options(&file.display().to_string(), &cmd.markup, cmd.sloppy)?;
    opts.id_prefix = cmd.id_prefix.clone();
    opts.skip_preamble = cmd.skip_preamble;
    opts.skip_epilog = cmd.skip_epilog;
    opts.man_sect = cmd.man_sect;
    opts.exp_method = cmd
      .exp_method
      .parse::<ExpMethod>()
      .map_err(|e| anyhow::anyhow!(e))?;
    if !cmd.exp_ids.is_empty() {
      opts.exp_ids = cmd.exp_ids.clone();
    }
    opts.known_attrs = cmd.known_attrs.clone();
    opts.set_defaults();

    errors += if cmd.list_exports || !cmd.list_internals.is_empty() {
      opts.gather_context = true;
      // Every event reaches the list translator; it selects by kind.
      opts.use_all_docs = true;
      let translator = ListTranslator::new(
        io::stdout().lock(),
        cmd.list_exports,
        cmd.list_internals.clone(),
      );
      parse_one(opts, translator, &src)
    } else {
      if !cmd.use_names.is_empty() {
        opts.use_names = cmd.use_names.clone();
      } else if cmd.exported || cmd.internal {
        // Gather the exported symbols first, then select by name.
        let mut ctx = ParserContext::new();
        Parser::<NullTranslator>::gather_context(&src, &mut ctx, &opts);
        opts.error_missing = false;
        if cmd.internal {
          opts.skip_names = ctx.exported_symbols;
        } else {
          opts.use_names = ctx.exported_symbols;
        }
      } else {
        // Nothing selected by use-names, exported or internal: emit
        // everything, DOC sections included.
        opts.use_all_docs = true;
      }
      let translator = ReSTTranslator::new(io::stdout().lock());
      parse_one(opts, translator, &src)
    };
  }

  Ok(errors)
}

fn parse_one<T: Translator>(opts: ParseOptions, translator: T, src: &str) -> usize {
  let mut parser = Parser::new(opts, translator);
  if let Err(e) = parse_with_recovery(&mut parser, src) {
    error!("{e}");
    return parser.errors() + 1;
  }
  if let Err(e) = parser.close() {
    error!("{e}");
    return parser.errors() + 1;
  }
  parser.errors()
}
