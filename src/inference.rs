//! Sample merging: stream JSON documents in, solve one shape tree out.
//!
//! Evidence accumulation is a join semilattice: `join` is associative,
//! commutative, and idempotent, so the solved shape never depends on the
//! order samples arrive in. Requiredness is presence-based: a key is
//! required iff it appeared in every merged object sample (a null value
//! still counts as present).
//!
//! Field insertion order in the evidence maps carries no meaning; lowering
//! sorts struct fields by key before anything is emitted.

use chrono::DateTime;
use indexmap::IndexMap;
use serde_json::Value;

use crate::shape::{Kind, ShapeNode};

// ------------------------------- Options ---------------------------------- //

#[derive(Debug, Clone, Copy)]
pub struct InferOptions {
    /// Classify RFC 3339 strings as `time.Time` external references.
    pub detect_timestamps: bool,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            detect_timestamps: true,
        }
    }
}

// ------------------------------ Evidence ---------------------------------- //

/// Sufficient statistics for one value position. `default()` is bottom.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    saw_bool: bool,
    saw_int: bool,
    saw_float: bool,
    saw_str: bool,
    saw_time: bool,
    obj: Option<ObjEv>,
    arr: Option<ArrEv>,
}

#[derive(Debug, Clone, Default)]
struct ObjEv {
    fields: IndexMap<String, FieldEv>,
    seen: u64,
}

#[derive(Debug, Clone, Default)]
struct FieldEv {
    ev: Evidence,
    present_in: u64,
}

#[derive(Debug, Clone, Default)]
struct ArrEv {
    elem: Box<Evidence>,
    saw_elems: bool,
}

// ------------------------------ Observe ----------------------------------- //

pub fn observe(v: &Value, opts: &InferOptions) -> Evidence {
    match v {
        // Null contributes presence only; the position's kind comes from
        // whatever non-null samples show up.
        Value::Null => Evidence::default(),
        Value::Bool(_) => Evidence {
            saw_bool: true,
            ..Evidence::default()
        },
        Value::Number(n) => {
            // Anything that doesn't fit i64 (fractions, u64 overflow) is a
            // float so the emitted 64-bit integer never silently truncates.
            if n.as_i64().is_some() {
                Evidence {
                    saw_int: true,
                    ..Evidence::default()
                }
            } else {
                Evidence {
                    saw_float: true,
                    ..Evidence::default()
                }
            }
        }
        Value::String(s) => {
            if opts.detect_timestamps && DateTime::parse_from_rfc3339(s).is_ok() {
                Evidence {
                    saw_time: true,
                    ..Evidence::default()
                }
            } else {
                Evidence {
                    saw_str: true,
                    ..Evidence::default()
                }
            }
        }
        Value::Array(xs) => {
            let mut elem = Evidence::default();
            for el in xs {
                elem = join(&elem, &observe(el, opts));
            }
            Evidence {
                arr: Some(ArrEv {
                    elem: Box::new(elem),
                    saw_elems: !xs.is_empty(),
                }),
                ..Evidence::default()
            }
        }
        Value::Object(map) => {
            let mut fields = IndexMap::with_capacity(map.len());
            for (k, v) in map {
                fields.insert(
                    k.clone(),
                    FieldEv {
                        ev: observe(v, opts),
                        present_in: 1,
                    },
                );
            }
            Evidence {
                obj: Some(ObjEv { fields, seen: 1 }),
                ..Evidence::default()
            }
        }
    }
}

// ------------------------------ Join (⊔) ---------------------------------- //

pub fn join(a: &Evidence, b: &Evidence) -> Evidence {
    Evidence {
        saw_bool: a.saw_bool || b.saw_bool,
        saw_int: a.saw_int || b.saw_int,
        saw_float: a.saw_float || b.saw_float,
        saw_str: a.saw_str || b.saw_str,
        saw_time: a.saw_time || b.saw_time,
        obj: match (&a.obj, &b.obj) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(join_obj(x, y)),
        },
        arr: match (&a.arr, &b.arr) {
            (None, None) => None,
            (Some(x), None) | (None, Some(x)) => Some(x.clone()),
            (Some(x), Some(y)) => Some(ArrEv {
                elem: Box::new(join(&x.elem, &y.elem)),
                saw_elems: x.saw_elems || y.saw_elems,
            }),
        },
    }
}

fn join_obj(a: &ObjEv, b: &ObjEv) -> ObjEv {
    let mut out = ObjEv {
        fields: IndexMap::with_capacity(a.fields.len().max(b.fields.len())),
        seen: a.seen + b.seen,
    };
    for (k, fa) in &a.fields {
        let merged = match b.fields.get(k) {
            None => fa.clone(),
            Some(fb) => FieldEv {
                ev: join(&fa.ev, &fb.ev),
                present_in: fa.present_in + fb.present_in,
            },
        };
        out.fields.insert(k.clone(), merged);
    }
    for (k, fb) in &b.fields {
        if !out.fields.contains_key(k) {
            out.fields.insert(k.clone(), fb.clone());
        }
    }
    out
}

// ------------------------------- Solve ------------------------------------ //

/// Resolve accumulated evidence into a classified shape node.
pub fn solve(key: impl Into<String>, required: bool, ev: &Evidence) -> ShapeNode {
    let key = key.into();

    let scalar = solve_scalar(ev);
    let arm_count = usize::from(scalar.is_some())
        + usize::from(ev.obj.is_some())
        + usize::from(ev.arr.is_some());

    // Conflicting shapes at one position (object ∪ string, array ∪ number, …)
    // have no common Go type besides interface{}; so does a position seen
    // only as null.
    if arm_count != 1 {
        return ShapeNode::new(key, Kind::Any, required);
    }

    if let Some(obj) = &ev.obj {
        return ShapeNode::with_children(key, Kind::Object, required, solve_fields(obj));
    }

    if let Some(arr) = &ev.arr {
        return solve_array(key, required, arr);
    }

    match scalar.unwrap_or(Kind::Any) {
        Kind::External => {
            let mut node = ShapeNode::new(key, Kind::External, required);
            node.external_type_id = Some("time.Time".to_string());
            node
        }
        kind => ShapeNode::new(key, kind, required),
    }
}

fn solve_scalar(ev: &Evidence) -> Option<Kind> {
    let num = ev.saw_int || ev.saw_float;
    let text = ev.saw_str || ev.saw_time;
    match (ev.saw_bool, num, text) {
        (true, false, false) => Some(Kind::Bool),
        (false, true, false) => Some(if ev.saw_float { Kind::Float } else { Kind::Int }),
        // a single non-timestamp sample demotes the whole position to string
        (false, false, true) => Some(if ev.saw_str { Kind::Str } else { Kind::External }),
        (false, false, false) => None,
        // scalar kinds disagree
        _ => Some(Kind::Any),
    }
}

fn solve_fields(obj: &ObjEv) -> IndexMap<String, ShapeNode> {
    let mut children = IndexMap::with_capacity(obj.fields.len());
    for (k, f) in &obj.fields {
        let required = f.present_in == obj.seen;
        children.insert(k.clone(), solve(k.clone(), required, &f.ev));
    }
    children
}

fn solve_array(key: String, required: bool, arr: &ArrEv) -> ShapeNode {
    if !arr.saw_elems {
        return ShapeNode::new(key, Kind::ArrayUnknown, required);
    }
    let elem = solve("", true, &arr.elem);
    let kind = match elem.kind {
        Kind::Bool => Kind::ArrayBool,
        Kind::Int => Kind::ArrayInt,
        Kind::Float => Kind::ArrayFloat,
        Kind::Str => Kind::ArrayStr,
        // no array-of-external classification exists; timestamps arrive as strings
        Kind::External => Kind::ArrayStr,
        Kind::Object => {
            return ShapeNode::with_children(key, Kind::ArrayObject, required, elem.children);
        }
        // heterogeneous or nested-array elements
        _ => Kind::ArrayMixed,
    };
    ShapeNode::new(key, kind, required)
}

// ------------------------------ Front API --------------------------------- //

pub struct Inference {
    state: Evidence,
    opts: InferOptions,
}

impl Inference {
    pub fn new() -> Self {
        Self::with_options(InferOptions::default())
    }

    pub fn with_options(opts: InferOptions) -> Self {
        Self {
            state: Evidence::default(),
            opts,
        }
    }

    pub fn observe_value(&mut self, v: &Value) {
        let obs = observe(v, &self.opts);
        self.state = join(&self.state, &obs);
    }

    /// Solve the accumulated evidence into a root shape node. Roots are
    /// always required; optionality only means something for object fields.
    pub fn solve(&self, root_key: &str) -> ShapeNode {
        solve(root_key, true, &self.state)
    }
}

impl Default for Inference {
    fn default() -> Self {
        Self::new()
    }
}

pub fn infer_from_values<'a, I>(root_key: &str, values: I) -> ShapeNode
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut inf = Inference::new();
    for v in values {
        inf.observe_value(v);
    }
    inf.solve(root_key)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field<'a>(node: &'a ShapeNode, key: &str) -> &'a ShapeNode {
        node.children
            .get(key)
            .unwrap_or_else(|| panic!("missing field {key}"))
    }

    #[test]
    fn presence_drives_requiredness() {
        let a = json!({"x": 1, "y": "a"});
        let b = json!({"x": 2});
        let root = infer_from_values("doc", [&a, &b]);
        assert_eq!(root.kind, Kind::Object);
        assert!(field(&root, "x").required);
        assert!(!field(&root, "y").required);
    }

    #[test]
    fn null_counts_as_present() {
        let a = json!({"x": 1});
        let b = json!({"x": null});
        let root = infer_from_values("doc", [&a, &b]);
        let x = field(&root, "x");
        assert!(x.required, "null keeps the key present");
        assert_eq!(x.kind, Kind::Int, "null adds no kind evidence");
    }

    #[test]
    fn null_only_fields_fall_back() {
        let a = json!({"x": null});
        let root = infer_from_values("doc", [&a]);
        assert_eq!(field(&root, "x").kind, Kind::Any);
    }

    #[test]
    fn int_widens_to_float() {
        let a = json!({"n": 1});
        let b = json!({"n": 2.5});
        let root = infer_from_values("doc", [&a, &b]);
        assert_eq!(field(&root, "n").kind, Kind::Float);

        let only_ints = infer_from_values("doc", [&json!({"n": 1}), &json!({"n": 7})]);
        assert_eq!(field(&only_ints, "n").kind, Kind::Int);
    }

    #[test]
    fn u64_overflow_is_float_not_int() {
        let a = json!({"n": u64::MAX});
        let root = infer_from_values("doc", [&a]);
        assert_eq!(field(&root, "n").kind, Kind::Float);
    }

    #[test]
    fn conflicting_scalars_fall_back() {
        let a = json!({"v": true});
        let b = json!({"v": "yes"});
        let root = infer_from_values("doc", [&a, &b]);
        assert_eq!(field(&root, "v").kind, Kind::Any);
    }

    #[test]
    fn object_vs_scalar_falls_back() {
        let a = json!({"v": {"k": 1}});
        let b = json!({"v": 3});
        let root = infer_from_values("doc", [&a, &b]);
        assert_eq!(field(&root, "v").kind, Kind::Any);
    }

    #[test]
    fn timestamps_become_external_references() {
        let a = json!({"at": "2024-05-01T10:00:00Z"});
        let b = json!({"at": "2024-06-02T11:30:00+02:00"});
        let root = infer_from_values("doc", [&a, &b]);
        let at = field(&root, "at");
        assert_eq!(at.kind, Kind::External);
        assert_eq!(at.external_type_id.as_deref(), Some("time.Time"));
    }

    #[test]
    fn one_plain_string_demotes_timestamps() {
        let a = json!({"at": "2024-05-01T10:00:00Z"});
        let b = json!({"at": "yesterday"});
        let root = infer_from_values("doc", [&a, &b]);
        assert_eq!(field(&root, "at").kind, Kind::Str);
    }

    #[test]
    fn timestamp_detection_can_be_disabled() {
        let mut inf = Inference::with_options(InferOptions {
            detect_timestamps: false,
        });
        inf.observe_value(&json!({"at": "2024-05-01T10:00:00Z"}));
        let root = inf.solve("doc");
        assert_eq!(field(&root, "at").kind, Kind::Str);
    }

    #[test]
    fn array_element_kinds() {
        let cases = [
            (json!([true, false]), Kind::ArrayBool),
            (json!([1, 2, 3]), Kind::ArrayInt),
            (json!([1, 2.5]), Kind::ArrayFloat),
            (json!(["a", "b"]), Kind::ArrayStr),
            (json!([]), Kind::ArrayUnknown),
            (json!([1, "a"]), Kind::ArrayMixed),
            (json!([[1], [2]]), Kind::ArrayMixed),
            (json!([null, null]), Kind::ArrayMixed),
        ];
        for (sample, expected) in cases {
            let root = infer_from_values("doc", [&sample]);
            assert_eq!(root.kind, expected, "sample {sample}");
        }
    }

    #[test]
    fn timestamp_elements_degrade_to_string_arrays() {
        let sample = json!(["2024-05-01T10:00:00Z", "2024-06-02T11:30:00Z"]);
        let root = infer_from_values("doc", [&sample]);
        assert_eq!(root.kind, Kind::ArrayStr);
    }

    #[test]
    fn empty_arrays_join_with_typed_ones() {
        let a = json!({"xs": []});
        let b = json!({"xs": [1, 2]});
        let root = infer_from_values("doc", [&a, &b]);
        assert_eq!(field(&root, "xs").kind, Kind::ArrayInt);
    }

    #[test]
    fn array_of_objects_merges_element_fields() {
        let sample = json!([
            {"id": 1, "name": "a"},
            {"id": 2}
        ]);
        let root = infer_from_values("doc", [&sample]);
        assert_eq!(root.kind, Kind::ArrayObject);
        assert!(field(&root, "id").required);
        assert!(!field(&root, "name").required);
    }

    #[test]
    fn nested_objects_merge_recursively() {
        let a = json!({"meta": {"a": 1}});
        let b = json!({"meta": {"b": "x"}});
        let root = infer_from_values("doc", [&a, &b]);
        let meta = field(&root, "meta");
        assert_eq!(meta.kind, Kind::Object);
        assert!(!field(meta, "a").required);
        assert!(!field(meta, "b").required);
    }

    #[test]
    fn go_source_end_to_end() {
        let a = json!({
            "id": 1,
            "name": "a",
            "tags": ["x"],
            "meta": {"created_at": "2024-05-01T10:00:00Z"},
            "score": 3.5
        });
        let b = json!({
            "id": 2,
            "tags": [],
            "meta": {"created_at": "2024-06-01T10:00:00Z"}
        });

        let root = infer_from_values("Document", [&a, &b]);
        let decls = crate::lower::lower_roots(std::slice::from_ref(&root));
        let mut cg = crate::codegen::Codegen::new();
        cg.emit_all(&decls);

        let expected = "\
type Document struct {
\tID int64 `json:\"id\"`
\tMeta struct {
\t\tCreatedAt time.Time `json:\"created_at\"`
\t} `json:\"meta\"`
\tName  *string  `json:\"name,omitempty\"`
\tScore *float64 `json:\"score,omitempty\"`
\tTags  []string `json:\"tags\"`
}
";
        assert_eq!(cg.into_string(), expected);
    }

    #[test]
    fn join_laws_idempotent_commutative_associative() {
        let opts = InferOptions::default();
        let a = observe(&json!({"x": 1, "xs": [1]}), &opts);
        let b = observe(&json!({"x": 2.5, "y": "s"}), &opts);
        let c = observe(&json!({"xs": ["s"], "y": null}), &opts);

        let render = |ev: &Evidence| {
            let root = solve("doc", true, ev);
            let decls = crate::lower::lower_roots(std::slice::from_ref(&root));
            let mut cg = crate::codegen::Codegen::new();
            cg.emit_all(&decls);
            cg.into_string()
        };

        // idempotent
        assert_eq!(render(&join(&a, &a)), render(&a));
        // commutative
        assert_eq!(render(&join(&a, &b)), render(&join(&b, &a)));
        // associative
        assert_eq!(
            render(&join(&join(&a, &b), &c)),
            render(&join(&a, &join(&b, &c)))
        );
    }
}
