#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! End-to-end parser checks against the null translator.
use linuxdoc_kdoc::{
  DeclEvent,
  DeclKind,
  Markup,
  NullTranslator,
  ParseOptions,
  Parser,
  UNDESCRIBED,
};

fn default_opts() -> ParseOptions {
  let mut opts = ParseOptions::new("test.c");
  opts.use_all_docs = true;
  opts
}

/// Parse and return (events, errors, warnings).
fn parse(src: &str) -> (Vec<DeclEvent>, usize, usize) {
  parse_with(src, default_opts())
}

fn parse_with(src: &str, opts: ParseOptions) -> (Vec<DeclEvent>, usize, usize) {
  let mut parser = Parser::new(opts, NullTranslator);
  parser.parse_string(src).expect("parse must not fail");
  parser.close().expect("close must not fail");
  let errors = parser.errors();
  let warnings = parser.warnings();
  let (_, _, ctx) = parser.into_parts();
  (ctx.dump_storage, errors, warnings)
}

fn single_function(events: &[DeclEvent]) -> &linuxdoc_kdoc::FunctionDecl {
  match events {
    [DeclEvent::Function(f)] => f,
    other => panic!("expected exactly one function event, got {other:?}"),
  }
}

#[test]
fn simple_function() {
  let src = "/**\n * foo - purpose\n * @x: input\n */\nint foo(int x);\n";
  let (events, errors, warnings) = parse(src);
  assert_eq!(errors, 0);
  assert_eq!(warnings, 0);

  let f = single_function(&events);
  assert_eq!(f.name, "foo");
  assert_eq!(f.return_type, "int");
  assert_eq!(f.purpose, "purpose");
  assert_eq!(f.parameter_list, vec!["x"]);
  assert_eq!(f.parameter_types["x"], "int");
  assert_eq!(f.parameter_descs["x"], "input");
  assert_eq!(f.line_no, 1);
}

#[test]
fn missing_purpose_warns_but_emits() {
  let src = "/**\n * foo\n * @x: input\n */\nvoid foo(int x);\n";
  let (events, errors, warnings) = parse(src);
  assert_eq!(errors, 0);
  assert!(warnings >= 1, "missing short description must warn");
  assert_eq!(single_function(&events).name, "foo");
}

#[test]
fn syscall_define3() {
  let src = "/**\n * sys_bar - s\n * @a: A\n * @b: B\n * @c: C\n */\nSYSCALL_DEFINE3(bar, int, a, int, b, int, c)\n{\n\treturn 0;\n}\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  let f = single_function(&events);
  assert_eq!(f.name, "sys_bar");
  assert_eq!(f.return_type, "long");
  assert_eq!(f.parameter_list, vec!["a", "b", "c"]);
  for p in ["a", "b", "c"] {
    assert_eq!(f.parameter_types[p], "int");
  }
}

#[test]
fn syscall_define0_yields_void() {
  let src = "/**\n * sys_sync - flush\n */\nSYSCALL_DEFINE0(sync)\n{\n}\n";
  let (events, _, _) = parse(src);
  let f = single_function(&events);
  assert_eq!(f.name, "sys_sync");
  assert_eq!(f.parameter_list, vec!["void"]);
  assert_eq!(f.parameter_descs["void"], "no arguments");
}

#[test]
fn trace_event_macro() {
  let src = "/**\n * trace_sched_switch - log a context switch\n * @prev: previous task\n * @next: next task\n */\nTRACE_EVENT(sched_switch,\n\tTP_PROTO(struct task *prev, struct task *next),\n\tTP_ARGS(prev, next)\n);\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  let f = single_function(&events);
  assert_eq!(f.name, "trace_sched_switch");
  assert_eq!(f.return_type, "void");
  assert_eq!(f.parameter_list, vec!["prev", "next"]);
  assert_eq!(f.parameter_types["prev"], "struct task *");
}

#[test]
fn struct_with_private_section() {
  let src = "/**\n * struct s - d\n * @a: x\n */\nstruct s {\n\tint a;\n\t/* private: */\n\tint secret;\n};\n";
  let (events, errors, warnings) = parse(src);
  assert_eq!(errors, 0);
  assert_eq!(warnings, 0);
  match &events[..] {
    [DeclEvent::Struct(s)] => {
      assert_eq!(s.kind, DeclKind::Struct);
      assert_eq!(s.name, "s");
      assert_eq!(s.parameter_list, vec!["a"]);
      assert!(!s.parameter_descs.contains_key("secret"));
      assert!(!s.definition.contains("secret"));
    },
    other => panic!("expected one struct event, got {other:?}"),
  }
}

#[test]
fn private_member_description_is_excess() {
  let src = "/**\n * struct s - d\n * @a: x\n * @secret: hidden\n */\nstruct s {\n\tint a;\n\t/* private: */\n\tint secret;\n};\n";
  let (_, _, warnings) = parse(src);
  assert!(warnings >= 1, "description of a private member must warn");
}

#[test]
fn doc_block_only() {
  let src = "/**\n * DOC: Overview\n *\n * Body text.\n */\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  match &events[..] {
    [DeclEvent::Doc(d)] => {
      assert_eq!(d.name, "Overview");
      assert_eq!(d.sections["Overview"], "Body text.");
    },
    other => panic!("expected one DOC event, got {other:?}"),
  }
}

#[test]
fn doc_block_without_title_is_introduction() {
  let src = "/**\n * DOC:\n * Body.\n */\n";
  let (events, _, _) = parse(src);
  assert_eq!(events[0].name(), "Introduction");
}

#[test]
fn dotted_sub_parameters() {
  let src = "/**\n * foo - purpose\n * @cfg: the config\n * @cfg.opts: nested options\n */\nint foo(struct cfg cfg);\n";
  let (events, errors, warnings) = parse(src);
  assert_eq!(errors, 0);
  assert_eq!(warnings, 0, "a dotted child of a real parameter is not excess");
  let f = single_function(&events);
  assert_eq!(f.parameter_list, vec!["cfg"]);
  assert_eq!(f.parameter_descs["cfg.opts"], "nested options");
}

#[test]
fn excess_parameter_description() {
  let src = "/**\n * foo - purpose\n * @x: input\n * @y: not there\n */\nint foo(int x);\n";
  let (_, _, warnings) = parse(src);
  assert!(warnings >= 1, "excess description must warn");
}

#[test]
fn missing_parameter_description() {
  let src = "/**\n * foo - purpose\n */\nint foo(int x);\n";
  let (events, _, warnings) = parse(src);
  assert!(warnings >= 1);
  assert_eq!(single_function(&events).parameter_descs["x"], UNDESCRIBED);
}

#[test]
fn sloppy_mode_suppresses_missing_description() {
  let mut opts = default_opts();
  opts.verbose_warn = false;
  let src = "/**\n * foo - purpose\n */\nint foo(int x);\n";
  let (_, errors, warnings) = parse_with(src, opts);
  assert_eq!(errors, 0);
  assert_eq!(warnings, 0);
}

#[test]
fn duplicate_section_concatenates_and_warns() {
  let src = "/**\n * foo - purpose\n * @x: input\n * Return: zero\n * Return: or minus one\n */\nint foo(int x);\n";
  let (events, _, warnings) = parse(src);
  assert!(warnings >= 1);
  let f = single_function(&events);
  let body = &f.sections["Return"];
  assert!(body.contains("zero") && body.contains("or minus one"));
  assert!(body.contains("\n\n"), "duplicates join with a blank line");
}

#[test]
fn duplicate_name_is_an_error() {
  let src = "/**\n * foo - one\n * @x: input\n */\nint foo(int x);\n/**\n * foo - two\n * @x: input\n */\nint foo(int x);\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 1);
  assert_eq!(events.len(), 1, "the duplicate must not be recorded");
}

#[test]
fn name_drift_prefers_declaration() {
  let src = "/**\n * fo - typo\n * @x: input\n */\nint foo(int x);\n";
  let (events, _, warnings) = parse(src);
  assert!(warnings >= 1, "name drift must warn");
  assert_eq!(single_function(&events).name, "foo");
}

#[test]
fn enum_declaration() {
  let src = "/**\n * enum state - machine states\n * @IDLE: nothing to do\n * @BUSY: working\n */\nenum state {\n\tIDLE,\n\tBUSY = 5,\n};\n";
  let (events, errors, warnings) = parse(src);
  assert_eq!(errors, 0);
  assert_eq!(warnings, 0);
  match &events[..] {
    [DeclEvent::Enum(e)] => {
      assert_eq!(e.name, "state");
      assert_eq!(e.parameter_list, vec!["IDLE", "BUSY"]);
      assert_eq!(e.parameter_descs["BUSY"], "working");
    },
    other => panic!("expected one enum event, got {other:?}"),
  }
}

#[test]
fn typedef_declarations() {
  let src = "/**\n * typedef counter_t - running counter\n */\ntypedef unsigned long counter_t;\n/**\n * typedef hook_fn - completion callback\n */\ntypedef int (*hook_fn)(void *data);\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  let names: Vec<&str> = events.iter().map(DeclEvent::name).collect();
  assert_eq!(names, vec!["counter_t", "hook_fn"]);
  assert!(events.iter().all(|e| e.kind() == DeclKind::Typedef));
}

#[test]
fn function_like_macro() {
  let src = "/**\n * max_of - larger of two values\n * @a: first value\n * @b: second value\n */\n#define max_of(a, b) ((a) > (b) ? (a) : (b))\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  let f = single_function(&events);
  assert_eq!(f.name, "max_of");
  assert_eq!(f.return_type, "");
  assert_eq!(f.parameter_list, vec!["a", "b"]);
}

#[test]
fn object_like_macro_has_no_parameters() {
  let src = "/**\n * MAX_SLOTS - table capacity\n */\n#define MAX_SLOTS 32\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  let f = single_function(&events);
  assert_eq!(f.name, "MAX_SLOTS");
  assert!(f.parameter_list.is_empty());
}

#[test]
fn split_doc_comment_documents_member() {
  let src = "/**\n * struct s2 - demo\n */\nstruct s2 {\n\t/**\n\t * @a: first member\n\t */\n\tint a;\n};\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  match &events[..] {
    [DeclEvent::Struct(s)] => {
      assert_eq!(s.parameter_descs["a"], "first member");
    },
    other => panic!("expected one struct event, got {other:?}"),
  }
}

#[test]
fn split_doc_without_parameter_header_is_an_error() {
  let src = "/**\n * struct s3 - demo\n * @a: member\n */\nstruct s3 {\n\t/**\n\t * free text\n\t */\n\tint a;\n};\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 1);
  assert_eq!(events.len(), 1, "the struct itself is still emitted");
}

#[test]
fn nested_struct_members_are_dotted() {
  let src = "/**\n * struct outer - demo\n * @a: plain\n * @ops: nested ops\n * @ops.open: open hook\n */\nstruct outer {\n\tint a;\n\tstruct {\n\t\tint open;\n\t} ops;\n};\n";
  let (events, errors, warnings) = parse(src);
  assert_eq!(errors, 0);
  assert_eq!(warnings, 0);
  match &events[..] {
    [DeclEvent::Struct(s)] => {
      assert_eq!(s.parameter_list, vec!["a", "ops", "ops.open"]);
    },
    other => panic!("expected one struct event, got {other:?}"),
  }
}

#[test]
fn missing_comment_end_warns() {
  let src = "/**\n * foo - purpose\n * @x: input\n";
  let (_, _, warnings) = parse(src);
  assert!(warnings >= 1, "EOF inside a comment must warn");
}

#[test]
fn markup_directive_switches_section_rules() {
  // In reST markup an arbitrary `Word:` with trailing text is plain
  // content; after switching to kernel-doc markup it opens a section.
  let src = "/* parse-markup: kernel-doc */\n/**\n * foo - purpose\n * @x: input\n * Locking: caller holds the lock\n */\nint foo(int x);\n";
  let (events, _, _) = parse(src);
  let f = single_function(&events);
  assert_eq!(f.sections["Locking"], "caller holds the lock");
}

#[test]
fn url_is_not_a_section_header() {
  let mut opts = default_opts();
  opts.markup = Markup::KernelDoc;
  let src = "/**\n * foo - purpose\n * @x: input\n *\n * See http://example.com/doc for details.\n */\nint foo(int x);\n";
  let (events, _, _) = parse_with(src, opts);
  let f = single_function(&events);
  assert!(!f.sections.contains_key("See http"));
  assert!(f.sections["Description"].contains("http://example.com/doc"));
}

#[test]
fn snippets_survive_declaration_resets() {
  let src = "/* parse-SNIP: setup */\nint init(void);\n/* parse-SNAP: */\n/**\n * foo - purpose\n * @x: input\n */\nint foo(int x);\n";
  let mut parser = Parser::new(default_opts(), NullTranslator);
  parser.parse_string(src).unwrap();
  parser.close().unwrap();
  let (_, _, ctx) = parser.into_parts();
  assert_eq!(ctx.snippets["setup"], "int init(void);\n");
  assert_eq!(ctx.dump_storage.len(), 1);
}

#[test]
fn blank_line_after_parameters_opens_description() {
  let src = "/**\n * foo - purpose\n * @x: input\n *\n * Longer prose about foo.\n */\nint foo(int x);\n";
  let (events, _, _) = parse(src);
  let f = single_function(&events);
  assert_eq!(f.parameter_descs["x"], "input");
  assert_eq!(f.sections["Description"], "Longer prose about foo.");
}

#[test]
fn section_titles_canonicalize() {
  let src = "/**\n * foo - purpose\n * @x: input\n * Returns: zero on success\n */\nint foo(int x);\n";
  let (events, _, _) = parse(src);
  let f = single_function(&events);
  assert!(f.sections.contains_key("Return"));
}

#[test]
fn dump_storage_serializes_to_json() {
  let src = "/**\n * foo - purpose\n * @x: input\n */\nint foo(int x);\n";
  let (events, _, _) = parse(src);
  let json = serde_json::to_string(&events).expect("events must serialize");
  assert!(json.contains("\"function\""));
  assert!(json.contains("\"foo\""));

  let back: Vec<DeclEvent> =
    serde_json::from_str(&json).expect("events must deserialize");
  assert_eq!(back, events);
}

#[test]
fn events_keep_source_order() {
  let src = "/**\n * DOC: Intro block\n * text\n */\n/**\n * first - a\n * @x: input\n */\nint first(int x);\n/**\n * struct thing - b\n * @n: count\n */\nstruct thing { int n; };\n";
  let (events, errors, _) = parse(src);
  assert_eq!(errors, 0);
  let names: Vec<&str> = events.iter().map(DeclEvent::name).collect();
  assert_eq!(names, vec!["Intro block", "first", "thing"]);
}
