#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! End-to-end reST rendering checks.
use linuxdoc_kdoc::{
  Markup,
  NullTranslator,
  ParseOptions,
  Parser,
  ReSTTranslator,
  replay,
};

fn default_opts() -> ParseOptions {
  let mut opts = ParseOptions::new("test.c");
  opts.use_all_docs = true;
  opts
}

fn render(src: &str, opts: ParseOptions) -> String {
  let mut parser = Parser::new(opts, ReSTTranslator::new(Vec::new()));
  parser.parse_string(src).expect("parse must not fail");
  parser.close().expect("close must not fail");
  let (_, translator, _) = parser.into_parts();
  String::from_utf8(translator.into_inner()).expect("output must be UTF-8")
}

fn assert_rest_contains(rest: &str, expected: &[&str]) {
  for &needle in expected {
    assert!(
      rest.contains(needle),
      "Expected reST output to contain '{needle}', but it did not.\nFull \
       output:\n{rest}"
    );
  }
}

const FUNC_SRC: &str = "/**\n * vfs_read - read bytes from a file\n * @file: file to read from\n * @count: maximum number of bytes\n *\n * Works like read(), honoring %O_NONBLOCK.\n *\n * Return: number of bytes read, or a negative errno\n */\nssize_t vfs_read(struct file *file, size_t count);\n";

#[test]
fn function_rendering() {
  let rest = render(FUNC_SRC, default_opts());
  assert_rest_contains(&rest, &[
    ".. _`vfs_read`:",
    "vfs_read\n========",
    ".. c:function:: ssize_t vfs_read(struct file *file, size_t count)",
    "    :param file:",
    "        file to read from",
    "    :param count:",
    "Return\n------",
    "number of bytes read, or a negative errno",
  ]);
}

#[test]
fn highlighting_in_section_bodies() {
  let rest = render(FUNC_SRC, default_opts());
  assert_rest_contains(&rest, &[":c:func:`read`", "``O_NONBLOCK``"]);
}

#[test]
fn id_prefix_namespaces_anchors() {
  let mut opts = default_opts();
  opts.id_prefix = "vfs".to_owned();
  let rest = render(FUNC_SRC, opts);
  assert_rest_contains(&rest, &[".. _`vfs.vfs_read`:"]);
}

#[test]
fn man_sect_field() {
  let mut opts = default_opts();
  opts.man_sect = Some(9);
  let rest = render(FUNC_SRC, opts);
  assert_rest_contains(&rest, &["    :man-sect: 9"]);
}

#[test]
fn preamble_and_skipping() {
  let rest = render(FUNC_SRC, default_opts());
  assert!(rest.starts_with(".. -*- coding: utf-8; mode: rst -*-"));

  let mut opts = default_opts();
  opts.skip_preamble = true;
  let rest = render(FUNC_SRC, opts);
  assert!(rest.starts_with(".. _`vfs_read`:"));
}

#[test]
fn struct_rendering() {
  let src = "/**\n * struct inode - filesystem object\n * @ino: inode number\n * @count: usage counter\n */\nstruct inode {\n\tunsigned long ino;\n\tint count;\n};\n";
  let rest = render(src, default_opts());
  assert_rest_contains(&rest, &[
    "struct inode\n============",
    ".. c:struct:: inode",
    "Definition\n----------",
    ".. code-block:: c",
    "    struct inode {",
    "        unsigned long ino;",
    "    };",
    "Members\n-------",
    "``unsigned long ino``",
    "    inode number",
  ]);
}

#[test]
fn union_uses_union_directive() {
  let src = "/**\n * union payload - wire value\n * @word: numeric form\n * @bytes: raw form\n */\nunion payload {\n\tu32 word;\n\tu8 bytes[4];\n};\n";
  let rest = render(src, default_opts());
  assert_rest_contains(&rest, &[".. c:union:: payload", "union payload\n============="]);
}

#[test]
fn enum_rendering() {
  let src = "/**\n * enum mode - transfer modes\n * @POLL: busy waiting\n * @IRQ: interrupt driven\n */\nenum mode {\n\tPOLL,\n\tIRQ,\n};\n";
  let rest = render(src, default_opts());
  assert_rest_contains(&rest, &[
    ".. c:enum:: mode",
    "    enum mode {",
    "        POLL,",
    "        IRQ",
    "Constants\n---------",
    "``POLL``",
    "    busy waiting",
  ]);
}

#[test]
fn typedef_rendering() {
  let src = "/**\n * typedef sector_t - device sector index\n */\ntypedef unsigned long sector_t;\n";
  let rest = render(src, default_opts());
  assert_rest_contains(&rest, &[
    ".. c:type:: sector_t",
    "typedef sector_t\n================",
    "device sector index",
  ]);
}

#[test]
fn doc_block_rendering() {
  let src = "/**\n * DOC: Theory of Operation\n *\n * The device is driven by a ring buffer.\n */\n";
  let rest = render(src, default_opts());
  assert_rest_contains(&rest, &[
    ".. _`Theory of Operation`:",
    "Theory of Operation\n===================",
    "The device is driven by a ring buffer.",
  ]);
}

#[test]
fn doc_blocks_skipped_without_use_all_docs() {
  let mut opts = default_opts();
  opts.use_all_docs = false;
  let src = "/**\n * DOC: Hidden\n * text\n */\n/**\n * foo - purpose\n * @x: input\n */\nint foo(int x);\n";
  let rest = render(src, opts);
  assert!(!rest.contains("Hidden"));
  assert!(rest.contains(".. c:function:: int foo(int x)"));
}

#[test]
fn use_names_filters_output() {
  let mut opts = default_opts();
  opts.use_names = vec!["bar".to_owned()];
  let src = "/**\n * foo - one\n * @x: input\n */\nint foo(int x);\n/**\n * bar - two\n * @x: input\n */\nint bar(int x);\n";
  let rest = render(src, opts);
  assert!(!rest.contains(".. c:function:: int foo"));
  assert!(rest.contains(".. c:function:: int bar(int x)"));
}

#[test]
fn skip_names_filters_output() {
  let mut opts = default_opts();
  opts.skip_names = vec!["foo".to_owned()];
  let src = "/**\n * foo - one\n * @x: input\n */\nint foo(int x);\n/**\n * bar - two\n * @x: input\n */\nint bar(int x);\n";
  let rest = render(src, opts);
  assert!(!rest.contains(".. c:function:: int foo"));
  assert!(rest.contains(".. c:function:: int bar(int x)"));
}

#[test]
fn sub_parameters_nest_under_parent() {
  let src = "/**\n * setup - configure the device\n * @cfg: main config\n * @cfg.rate: sampling rate\n */\nint setup(struct cfg cfg);\n";
  let rest = render(src, default_opts());
  assert_rest_contains(&rest, &[
    "    :param cfg:",
    "        cfg.rate",
    "            sampling rate",
  ]);
}

#[test]
fn legacy_markup_masks_special_characters() {
  let mut opts = default_opts();
  opts.markup = Markup::KernelDoc;
  let src = "/**\n * foo - multiply a * b\n * @x: input\n */\nint foo(int x);\n";
  let rest = render(src, opts);
  assert_rest_contains(&rest, &[r"multiply a \* b"]);
}

#[test]
fn replay_matches_direct_translation() {
  let src = "/**\n * DOC: Intro\n * text\n */\n/**\n * foo - one\n * @x: input\n * Return: zero\n */\nint foo(int x);\n/**\n * struct s - two\n * @a: member\n */\nstruct s { int a; };\n";
  let opts = default_opts();

  let direct = render(src, opts.clone());

  let mut parser = Parser::new(opts.clone(), NullTranslator);
  parser.parse_string(src).expect("parse must not fail");
  parser.close().expect("close must not fail");
  let (_, _, ctx) = parser.into_parts();

  let mut translator = ReSTTranslator::new(Vec::new());
  replay(&ctx.dump_storage, &mut translator, &opts, &ctx)
    .expect("replay must not fail");
  let replayed =
    String::from_utf8(translator.into_inner()).expect("output must be UTF-8");

  assert_eq!(direct, replayed, "replay must be byte-identical");
}

#[test]
fn replay_is_deterministic() {
  let src = "/**\n * foo - one\n * @x: input\n */\nint foo(int x);\n";
  let opts = default_opts();
  let mut parser = Parser::new(opts.clone(), NullTranslator);
  parser.parse_string(src).expect("parse must not fail");
  parser.close().expect("close must not fail");
  let (_, _, ctx) = parser.into_parts();

  let mut first = ReSTTranslator::new(Vec::new());
  replay(&ctx.dump_storage, &mut first, &opts, &ctx).expect("replay");
  let mut second = ReSTTranslator::new(Vec::new());
  replay(&ctx.dump_storage, &mut second, &opts, &ctx).expect("replay");
  assert_eq!(first.into_inner(), second.into_inner());
}
