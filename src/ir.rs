// Strongly-typed declaration IR for codegen. No serde_json::Value here.

/// One Go type expression. Every tree is freshly built by lowering and
/// exclusively owned by its declaration; no sharing, no cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ty {
    Bool,
    Int,                     // emitted as int64
    Float,                   // emitted as float64
    String,
    Interface,               // universal fallback (interface{})
    Optional(Box<Ty>),       // absence-capable wrapper; the printer spells it *T
    Slice(Box<Ty>),          // []T
    Struct {
        fields: Vec<Field>,  // stable order for deterministic codegen
    },
    Ident(String),           // reference to a pre-existing named type
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub tag: String,         // `json:"..."` literal, backticks included
}

/// A named top-level type declaration. Immutable once built; the declaration
/// list is the final artifact handed to the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub ty: Ty,
}
