//! Data model of the kernel-doc parser: declaration events and sections.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Description text assigned to parameters the comment never mentions.
pub const UNDESCRIBED: &str = "*undescribed*";

/// Synthetic member name for anonymous nested structs.
pub const UNNAMED_STRUCT: &str = "{unnamed_struct}";

/// Synthetic member name for anonymous nested unions.
pub const UNNAMED_UNION: &str = "{unnamed_union}";

/// Default prose section opened when a comment body leaves purpose mode.
pub const SECTION_DEFAULT: &str = "Description";

/// Ordered map used for sections and parameter descriptions.
///
/// Insertion order is a correctness requirement: replaying a dump through a
/// translator must observe sections in the order they appeared in the
/// comment.
pub type SectionMap = IndexMap<String, String>;

/// What kind of C declaration a comment documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
  Function,
  Struct,
  Union,
  Enum,
  Typedef,
  Doc,
}

impl DeclKind {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Function => "function",
      Self::Struct => "struct",
      Self::Union => "union",
      Self::Enum => "enum",
      Self::Typedef => "typedef",
      Self::Doc => "DOC",
    }
  }

  /// Recognize a declaration keyword from a comment's name line.
  #[must_use]
  pub fn from_keyword(word: &str) -> Option<Self> {
    match word {
      "struct" => Some(Self::Struct),
      "union" => Some(Self::Union),
      "enum" => Some(Self::Enum),
      "typedef" => Some(Self::Typedef),
      "function" => Some(Self::Function),
      _ => None,
    }
  }
}

impl std::fmt::Display for DeclKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A documented function (or function-like macro).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
  pub name:            String,
  pub purpose:         String,
  /// Empty for function-like and object-like macros.
  pub return_type:     String,
  /// Parameter names in declaration order.
  pub parameter_list:  Vec<String>,
  /// Parameter name -> type string, from the declaration.
  pub parameter_types: SectionMap,
  /// Parameter name -> description, from the comment.
  pub parameter_descs: SectionMap,
  pub sections:        SectionMap,
  /// Line of the opening `/**`.
  pub line_no:         u32,
}

/// A documented struct or union; `kind` discriminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDecl {
  pub kind:            DeclKind,
  pub name:            String,
  pub purpose:         String,
  /// Member names in declaration order, dotted for flattened sub-members.
  pub parameter_list:  Vec<String>,
  pub parameter_types: SectionMap,
  pub parameter_descs: SectionMap,
  pub sections:        SectionMap,
  /// Cleaned body text, rendered as the Definition block.
  pub definition:      String,
  pub line_no:         u32,
}

/// A documented enum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDecl {
  pub name:            String,
  pub purpose:         String,
  /// Constant names in declaration order.
  pub parameter_list:  Vec<String>,
  pub parameter_descs: SectionMap,
  pub sections:        SectionMap,
  pub line_no:         u32,
}

/// A documented typedef.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefDecl {
  pub name:     String,
  pub purpose:  String,
  pub sections: SectionMap,
  pub line_no:  u32,
}

/// A free-form `DOC:` block not attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocDecl {
  /// The `DOC:` title, also the emitted name.
  pub name:     String,
  pub sections: SectionMap,
  pub line_no:  u32,
}

/// One completed declaration, as recorded in dump storage.
///
/// Translators match on the variant; the ordered event list is the
/// intermediate representation that makes the parse-once/render-many
/// pattern work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclEvent {
  Function(FunctionDecl),
  Struct(StructDecl),
  Enum(EnumDecl),
  Typedef(TypedefDecl),
  Doc(DocDecl),
}

impl DeclEvent {
  #[must_use]
  pub fn kind(&self) -> DeclKind {
    match self {
      Self::Function(_) => DeclKind::Function,
      Self::Struct(s) => s.kind,
      Self::Enum(_) => DeclKind::Enum,
      Self::Typedef(_) => DeclKind::Typedef,
      Self::Doc(_) => DeclKind::Doc,
    }
  }

  #[must_use]
  pub fn name(&self) -> &str {
    match self {
      Self::Function(d) => &d.name,
      Self::Struct(d) => &d.name,
      Self::Enum(d) => &d.name,
      Self::Typedef(d) => &d.name,
      Self::Doc(d) => &d.name,
    }
  }
}

/// Canonicalize a section title.
///
/// `returns`/`return` collapse to `Return`, `intro`/`introduction` to
/// `Introduction`; everything else keeps its spelling. Lookups are
/// case-insensitive.
#[must_use]
pub fn canonical_section_title(title: &str) -> String {
  let trimmed = title.trim();
  match trimmed.to_ascii_lowercase().as_str() {
    "return" | "returns" => "Return".to_owned(),
    "intro" | "introduction" => "Introduction".to_owned(),
    "description" => SECTION_DEFAULT.to_owned(),
    "context" => "Context".to_owned(),
    "example" => "Example".to_owned(),
    _ => trimmed.to_owned(),
  }
}
