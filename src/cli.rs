//! Minimal CLI: unit description → (plan | rust)
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use parcel_gen::UnitModel;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate binary write/read routines for Rust data types from a JSON unit description
#[derive(Parser, Debug)]
#[command(name = "parcel-gen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve the unit and print its property trees and adapters as JSON
    Plan(PlanOut),
    /// resolve the unit and emit Rust source for every class
    Rust(RustOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more unit files. May be literal paths or quoted glob patterns;
    /// several files are merged into one unit in the order given
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct PlanOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct RustOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// override the module path generated code uses for the wire runtime
    #[arg(long)]
    runtime_path: Option<String>,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_unit(&self) -> Result<UnitModel> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut unit = UnitModel::default();
        for source_path in source_paths {
            let source = std::fs::read(&source_path)
                .with_context(|| format!("failed to read {}", source_path.display()))?;
            let part = UnitModel::from_json_slice(&source)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid unit description {}", source_path.display()))?;
            log::info!("loaded {} ({} class(es))", source_path.display(), part.classes.len());
            unit.merge(part);
        }
        Ok(unit)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Plan(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let unit = target.input_settings.load_unit()?;
                let resolved = parcel_gen::resolve_unit(&unit)?;
                let plan_src = serde_json::to_string_pretty(&resolved.plan())?;
                write_output(target.out.as_deref(), &plan_src)
            }
            Command::Rust(target) => {
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }
                let mut unit = target.input_settings.load_unit()?;
                if let Some(runtime_path) = &target.runtime_path {
                    unit.config.runtime_path = runtime_path.clone();
                }
                let rust_src = parcel_gen::generate(&unit)?;
                write_output(target.out.as_deref(), &rust_src)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&Path>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))?;
            log::info!("wrote {}", out.display());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rust_subcommand() {
        let cli = CommandLineInterface::try_parse_from(["parcel-gen", "rust", "-i", "a.json", "b/*.json", "--out", "gen.rs"])
            .unwrap();
        let Command::Rust(target) = cli.cmd else { panic!("expected rust") };
        assert_eq!(target.input_settings.input, ["a.json", "b/*.json"]);
        assert_eq!(target.out.as_deref(), Some(Path::new("gen.rs")));
    }

    #[test]
    fn empty_glob_is_an_error() {
        let err = resolve_file_path_patterns(["/definitely/not/here/*.json"]).unwrap_err();
        assert!(err.to_string().contains("matched no files"));
    }
}
