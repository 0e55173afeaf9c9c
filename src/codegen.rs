//! Go source rendering.
//!
//! Consumes the finished declaration list and renders `gofmt`-shaped source:
//! tab indentation, aligned field columns, tags in backticks. Layout only;
//! no synthesis decisions are made here.

use crate::ir::{Decl, Field, Ty};

pub struct Codegen {
    out: String,
}

impl Codegen {
    pub fn new() -> Self {
        Self { out: String::new() }
    }

    /// Prepend a `package` clause. Call before the first `emit`.
    pub fn emit_package(&mut self, name: &str) {
        self.out.push_str("package ");
        self.out.push_str(name);
        self.out.push_str("\n\n");
    }

    pub fn emit(&mut self, decl: &Decl) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
        self.out.push_str("type ");
        self.out.push_str(&decl.name);
        self.out.push(' ');
        self.out.push_str(&render_ty(&decl.ty, 0));
        self.out.push('\n');
    }

    pub fn emit_all(&mut self, decls: &[Decl]) {
        for decl in decls {
            self.emit(decl);
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

fn render_ty(ty: &Ty, indent: usize) -> String {
    match ty {
        Ty::Bool => "bool".to_string(),
        Ty::Int => "int64".to_string(),
        Ty::Float => "float64".to_string(),
        Ty::String => "string".to_string(),
        Ty::Interface => "interface{}".to_string(),
        Ty::Ident(name) => name.clone(),
        Ty::Optional(inner) => format!("*{}", render_ty(inner, indent)),
        Ty::Slice(inner) => format!("[]{}", render_ty(inner, indent)),
        Ty::Struct { fields } => render_struct(fields, indent),
    }
}

fn render_struct(fields: &[Field], indent: usize) -> String {
    if fields.is_empty() {
        return "struct{}".to_string();
    }

    let mut out = String::from("struct {\n");
    let tabs = "\t".repeat(indent + 1);

    let rendered: Vec<(&str, String, &str)> = fields
        .iter()
        .map(|f| (f.name.as_str(), render_ty(&f.ty, indent + 1), f.tag.as_str()))
        .collect();

    // gofmt aligns name and type columns within runs of single-line fields;
    // a field with a nested struct type breaks the run.
    let mut i = 0;
    while i < rendered.len() {
        if rendered[i].1.contains('\n') {
            let (name, ty, tag) = &rendered[i];
            out.push_str(&format!("{tabs}{name} {ty} {tag}\n"));
            i += 1;
            continue;
        }
        let mut j = i;
        while j < rendered.len() && !rendered[j].1.contains('\n') {
            j += 1;
        }
        let name_w = rendered[i..j].iter().map(|r| r.0.len()).max().unwrap_or(0);
        let ty_w = rendered[i..j].iter().map(|r| r.1.len()).max().unwrap_or(0);
        for (name, ty, tag) in &rendered[i..j] {
            out.push_str(&tabs);
            out.push_str(name);
            out.push_str(&" ".repeat(name_w - name.len() + 1));
            out.push_str(ty);
            out.push_str(&" ".repeat(ty_w - ty.len() + 1));
            out.push_str(tag);
            out.push('\n');
        }
        i = j;
    }

    out.push_str(&"\t".repeat(indent));
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_decl() -> Decl {
        Decl {
            name: "Person".to_string(),
            ty: Ty::Struct {
                fields: vec![
                    Field {
                        name: "Age".to_string(),
                        ty: Ty::Int,
                        tag: "`json:\"age\"`".to_string(),
                    },
                    Field {
                        name: "Name".to_string(),
                        ty: Ty::Optional(Box::new(Ty::String)),
                        tag: "`json:\"name,omitempty\"`".to_string(),
                    },
                ],
            },
        }
    }

    #[test]
    fn struct_fields_align_like_gofmt() {
        let mut cg = Codegen::new();
        cg.emit(&person_decl());
        let expected = "\
type Person struct {
\tAge  int64   `json:\"age\"`
\tName *string `json:\"name,omitempty\"`
}
";
        assert_eq!(cg.into_string(), expected);
    }

    #[test]
    fn package_clause_and_decl_separation() {
        let mut cg = Codegen::new();
        cg.emit_package("models");
        cg.emit_all(&[
            Decl {
                name: "A".to_string(),
                ty: Ty::Bool,
            },
            Decl {
                name: "B".to_string(),
                ty: Ty::Slice(Box::new(Ty::Interface)),
            },
        ]);
        let expected = "\
package models

type A bool

type B []interface{}
";
        assert_eq!(cg.into_string(), expected);
    }

    #[test]
    fn nested_structs_indent_with_tabs() {
        let decl = Decl {
            name: "Outer".to_string(),
            ty: Ty::Struct {
                fields: vec![Field {
                    name: "Inner".to_string(),
                    ty: Ty::Struct {
                        fields: vec![Field {
                            name: "Leaf".to_string(),
                            ty: Ty::Float,
                            tag: "`json:\"leaf\"`".to_string(),
                        }],
                    },
                    tag: "`json:\"inner\"`".to_string(),
                }],
            },
        };
        let mut cg = Codegen::new();
        cg.emit(&decl);
        let expected = "\
type Outer struct {
\tInner struct {
\t\tLeaf float64 `json:\"leaf\"`
\t} `json:\"inner\"`
}
";
        assert_eq!(cg.into_string(), expected);
    }

    #[test]
    fn slice_of_struct_renders_inline() {
        let decl = Decl {
            name: "Items".to_string(),
            ty: Ty::Slice(Box::new(Ty::Struct {
                fields: vec![Field {
                    name: "ID".to_string(),
                    ty: Ty::Int,
                    tag: "`json:\"id\"`".to_string(),
                }],
            })),
        };
        let mut cg = Codegen::new();
        cg.emit(&decl);
        let expected = "\
type Items []struct {
\tID int64 `json:\"id\"`
}
";
        assert_eq!(cg.into_string(), expected);
    }

    #[test]
    fn empty_struct_collapses() {
        let decl = Decl {
            name: "Empty".to_string(),
            ty: Ty::Struct { fields: vec![] },
        };
        let mut cg = Codegen::new();
        cg.emit(&decl);
        assert_eq!(cg.into_string(), "type Empty struct{}\n");
    }

    #[test]
    fn optional_ident_renders_as_pointer() {
        let decl = Decl {
            name: "Stamp".to_string(),
            ty: Ty::Optional(Box::new(Ty::Ident("time.Time".to_string()))),
        };
        let mut cg = Codegen::new();
        cg.emit(&decl);
        assert_eq!(cg.into_string(), "type Stamp *time.Time\n");
    }
}
