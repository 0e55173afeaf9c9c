//! Shape tree → declaration lowering.
//!
//! Pure functions over an immutable `ShapeNode` tree; each call builds a
//! fresh, exclusively-owned `Ty` tree. There is no failure path: anything
//! the classification match does not recognize lowers to `interface{}`.

use crate::ident::derive_ident;
use crate::ir::{Decl, Field, Ty};
use crate::shape::{Kind, ShapeNode};

/// Build one declaration per root node, in input order.
///
/// Roots whose key derives to no identifier are skipped; the remaining
/// declarations keep their relative order. Unlike struct fields, roots are
/// never sorted.
pub fn lower_roots(roots: &[ShapeNode]) -> Vec<Decl> {
    let mut decls = Vec::with_capacity(roots.len());
    for root in roots {
        let name = derive_ident(&root.key);
        if name.is_empty() {
            continue;
        }
        decls.push(Decl {
            name,
            ty: lower_shape(root),
        });
    }
    decls
}

/// Map one shape node to a type expression.
///
/// Slices are never wrapped in `Optional`, whatever `required` says: an
/// absent slice is already representable by its empty/nil state.
pub fn lower_shape(node: &ShapeNode) -> Ty {
    let mut optional_eligible = false;

    let base = match node.kind {
        Kind::Bool => {
            optional_eligible = true;
            Ty::Bool
        }
        Kind::Int => {
            optional_eligible = true;
            Ty::Int
        }
        Kind::Float => {
            optional_eligible = true;
            Ty::Float
        }
        Kind::Str => {
            optional_eligible = true;
            Ty::String
        }
        Kind::Object => {
            optional_eligible = true;
            lower_struct(node)
        }
        Kind::External => {
            optional_eligible = true;
            let name = match node.external_type_id.as_deref() {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => derive_ident(&node.key),
            };
            Ty::Ident(name)
        }

        Kind::ArrayUnknown | Kind::ArrayMixed => Ty::Slice(Box::new(Ty::Interface)),
        Kind::ArrayBool => Ty::Slice(Box::new(Ty::Bool)),
        Kind::ArrayInt => Ty::Slice(Box::new(Ty::Int)),
        Kind::ArrayFloat => Ty::Slice(Box::new(Ty::Float)),
        Kind::ArrayStr => Ty::Slice(Box::new(Ty::String)),
        Kind::ArrayObject => Ty::Slice(Box::new(lower_struct(node))),

        // Fallback arm: unrecognized classifications degrade, never fail.
        Kind::Any => Ty::Interface,
    };

    if optional_eligible && !node.required {
        Ty::Optional(Box::new(base))
    } else {
        base
    }
}

/// Lower an object-shaped node to a struct with a deterministic field list.
///
/// Fields are sorted by original key (byte-wise ascending), independent of
/// the children map's insertion order. Fields whose key derives to no
/// identifier are dropped without disturbing their siblings.
fn lower_struct(node: &ShapeNode) -> Ty {
    let mut entries: Vec<(&String, &ShapeNode)> = node.children.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut fields = Vec::with_capacity(entries.len());
    for (key, child) in entries {
        let name = derive_ident(key);
        if name.is_empty() {
            continue;
        }
        fields.push(Field {
            name,
            ty: lower_shape(child),
            tag: json_tag(key, !child.required),
        });
    }

    Ty::Struct { fields }
}

/// Build the `` `json:"..."` `` tag literal binding a field to its original
/// key. The key is embedded verbatim apart from the escaping the tag's own
/// quoting syntax forces (`\` and `"`); `omitempty` is the only directive.
pub fn json_tag(key: &str, omitempty: bool) -> String {
    let mut tag = String::with_capacity(key.len() + 24);
    tag.push_str("`json:\"");
    for ch in key.chars() {
        match ch {
            '\\' => tag.push_str("\\\\"),
            '"' => tag.push_str("\\\""),
            _ => tag.push(ch),
        }
    }
    if omitempty {
        tag.push_str(",omitempty");
    }
    tag.push_str("\"`");
    tag
}

/// Report every key (root or nested) whose derived identifier is empty and
/// which lowering therefore silently omits. Separate pure scan so the
/// synthesis functions keep their silent-drop contract.
pub fn dropped_keys(roots: &[ShapeNode]) -> Vec<String> {
    let mut out = Vec::new();
    for root in roots {
        collect_dropped(root, &mut out);
    }
    out
}

fn collect_dropped(node: &ShapeNode, out: &mut Vec<String>) {
    if derive_ident(&node.key).is_empty() {
        out.push(node.key.clone());
    }
    let mut children: Vec<(&String, &ShapeNode)> = node.children.iter().collect();
    children.sort_by(|a, b| a.0.cmp(b.0));
    for (_, child) in children {
        collect_dropped(child, out);
    }
}
