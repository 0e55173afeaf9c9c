//! Input acquisition: paths/globs → JSON sample values.
//!
//! Files are read and parsed in parallel; everything downstream of here is
//! pure and synchronous. Per-document processing order: optional JSON
//! Pointer selection first, then the optional jq filter (each filter output
//! becomes one sample).

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {detail}", path.display())]
    Parse { path: PathBuf, detail: String },
    #[error("invalid glob pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("unreadable glob entry: {source}")]
    Glob {
        #[from]
        source: glob::GlobError,
    },
    #[error("glob pattern matched no files: {pattern}")]
    NoMatches { pattern: String },
    #[error("JSON pointer `{pointer}` selects nothing in {}", path.display())]
    Pointer { path: PathBuf, pointer: String },
    #[error("jq filter failed on {}: {detail}", path.display())]
    Jq { path: PathBuf, detail: String },
}

#[derive(Debug, Clone, Default)]
pub struct InputOptions {
    /// One JSON document per non-blank line instead of one per file.
    pub ndjson: bool,
    /// JSON Pointer applied to each document before anything else.
    pub json_pointer: Option<String>,
    /// jq filter applied to each (pointer-selected) document.
    pub jq_expr: Option<String>,
}

/// Resolve literal paths and glob patterns into concrete files, in the order
/// given. A pattern that is explicitly a glob but matches nothing is an
/// error rather than a silent no-op.
pub fn resolve_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, LoadError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let entries = glob::glob(pattern).map_err(|source| LoadError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
            let mut matched_any = false;
            for entry in entries {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(LoadError::NoMatches {
                    pattern: pattern.to_string(),
                });
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

/// Load every sample from the given paths/patterns. Deterministic: results
/// follow the input order even though files parse in parallel.
pub fn load_samples(patterns: &[String], opts: &InputOptions) -> Result<Vec<Value>, LoadError> {
    let paths = resolve_patterns(patterns)?;
    let per_file: Vec<Vec<Value>> = paths
        .par_iter()
        .map(|path| {
            let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            })?;
            documents_from_source(path, &source, opts)
        })
        .collect::<Result<_, _>>()?;
    Ok(per_file.into_iter().flatten().collect())
}

/// Split, parse, and post-process one file's contents. Pure over the source
/// text; kept separate from I/O so it can be exercised directly.
pub fn documents_from_source(
    path: &Path,
    source: &str,
    opts: &InputOptions,
) -> Result<Vec<Value>, LoadError> {
    let mut docs = Vec::new();
    if opts.ndjson {
        for line in source.lines() {
            if line.trim().is_empty() {
                continue;
            }
            docs.push(parse_value(path, line)?);
        }
    } else {
        docs.push(parse_value(path, source)?);
    }

    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let doc = match opts.json_pointer.as_deref() {
            None => doc,
            Some(pointer) => {
                doc.pointer(pointer)
                    .cloned()
                    .ok_or_else(|| LoadError::Pointer {
                        path: path.to_path_buf(),
                        pointer: pointer.to_string(),
                    })?
            }
        };
        match opts.jq_expr.as_deref() {
            None => out.push(doc),
            Some(expr) => {
                let produced = run_jq(expr, &doc).map_err(|detail| LoadError::Jq {
                    path: path.to_path_buf(),
                    detail,
                })?;
                out.extend(produced);
            }
        }
    }
    Ok(out)
}

fn parse_value(path: &Path, src: &str) -> Result<Value, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, Value>(de).map_err(|err| {
        let pointer = err.path().to_string();
        LoadError::Parse {
            path: path.to_path_buf(),
            detail: format!("at JSON path {pointer} → {}", err.into_inner()),
        }
    })
}

// ------------------------------ jq filtering ------------------------------- //

/// Run a jq filter over one document; every filter output becomes one value.
pub fn run_jq(filter_src: &str, input: &Value) -> Result<Vec<Value>, String> {
    use jaq_core::{Compiler, Ctx, RcIter, load};
    use jaq_json::Val;

    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File {
        code: filter_src,
        path: (),
    };

    let modules = loader.load(&arena, program).map_err(|errs| {
        let mut s = String::new();
        for (file, err) in errs {
            s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
        }
        s
    })?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            let mut s = String::new();
            for (file, list) in errs {
                for (name, undef) in list {
                    s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
                }
            }
            s
        })?;

    let inputs = RcIter::new(core::iter::empty());
    let mut out = Vec::new();
    for item in filter.run((Ctx::new([], &inputs), Val::from(input.clone()))) {
        let val = item.map_err(|e| format!("{e:?}"))?;
        // Val renders as JSON text; round-trip back into a Value
        let text = format!("{val}");
        let value = serde_json::from_str::<Value>(&text).map_err(|e| e.to_string())?;
        out.push(value);
    }
    Ok(out)
}
