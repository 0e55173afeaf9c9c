//! Minimal CLI: infer → (go | shape)
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::inference::{Inference, InferOptions};
use crate::load::{self, InputOptions};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer structure from JSON/NDJSON samples and emit Go type declarations
#[derive(Parser, Debug)]
#[command(name = "json2go")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer and emit Go type declarations
    Go(GoOut),
    /// infer and print the solved shape tree as JSON (debug view)
    Shape(ShapeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items)
    #[arg(long)]
    json_pointer: Option<String>,

    /// jq pre-process filter for each document; every output becomes a sample
    #[arg(long)]
    jq_expr: Option<String>,

    /// keep RFC 3339 strings as plain strings instead of time.Time
    #[arg(long, default_value_t = false)]
    no_timestamps: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct GoOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// top-level Go type name
    #[arg(long, default_value = "Document")]
    root_type: String,

    /// package clause to prepend to the output
    #[arg(long)]
    package: Option<String>,

    /// output .go file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ShapeOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// top-level name for the root shape node
    #[arg(long, default_value = "Document")]
    root_type: String,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn solve_root(&self, root_type: &str) -> Result<crate::shape::ShapeNode> {
        let opts = InputOptions {
            ndjson: self.ndjson,
            json_pointer: self.json_pointer.clone(),
            jq_expr: self.jq_expr.clone(),
        };
        let samples = load::load_samples(&self.input, &opts)?;
        if samples.is_empty() {
            bail!("no JSON samples loaded from {:?}", self.input);
        }

        let mut inf = Inference::with_options(InferOptions {
            detect_timestamps: !self.no_timestamps,
        });
        for sample in &samples {
            inf.observe_value(sample);
        }
        Ok(inf.solve(root_type))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Go(target) => {
                let root = target.input_settings.solve_root(&target.root_type)?;
                let roots = std::slice::from_ref(&root);

                let decls = crate::lower::lower_roots(roots);
                if decls.is_empty() {
                    bail!(
                        "root type name {:?} derives no Go identifier",
                        target.root_type
                    );
                }
                warn_dropped(&crate::lower::dropped_keys(roots));

                let mut cg = crate::codegen::Codegen::new();
                if let Some(package) = target.package.as_deref() {
                    cg.emit_package(package);
                }
                cg.emit_all(&decls);
                write_output(target.out.as_deref(), &cg.into_string())
            }
            Command::Shape(target) => {
                let root = target.input_settings.solve_root(&target.root_type)?;
                let mut rendered = serde_json::to_string_pretty(&root)
                    .context("failed to serialize shape tree")?;
                rendered.push('\n');
                write_output(target.out.as_deref(), &rendered)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn warn_dropped(dropped: &[String]) {
    if dropped.is_empty() {
        return;
    }
    let listed = dropped
        .iter()
        .map(|k| format!("{k:?}"))
        .collect::<Vec<_>>()
        .join(", ");
    eprintln!(
        "{} {} key(s) derive no Go identifier and were dropped: {listed}",
        "warning:".yellow().bold(),
        dropped.len(),
    );
}

fn write_output(out: Option<&std::path::Path>, contents: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, contents)
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            print!("{contents}");
            Ok(())
        }
    }
}
