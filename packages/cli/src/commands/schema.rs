use super::{load_into, open_session, parse_path, FileArgs};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use metaconf_editor::{Path, Resolution, SessionMode};
use serde_json::Value;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Data location whose schema is shown; the root when omitted
    pub path: Option<String>,
}

/// Effective schema at one data location
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaReport {
    pub data_path: Path,
    pub schema_path: Path,
    pub resolution: Resolution,
    pub schema: Value,
}

pub fn schema(args: SchemaArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let report = run_schema(&args, &config)?;

    let status = match &report.resolution {
        Resolution::Plain => "plain".normal(),
        Resolution::Merged => "merged allOf".green(),
        Resolution::Unresolved(failure) => format!("unresolved ({})", failure).as_str().yellow(),
    };
    println!("{} {}", "Data path:".bold(), display_path(&report.data_path));
    println!("{} {}", "Schema path:".bold(), display_path(&report.schema_path));
    println!("{} {}", "Composition:".bold(), status);
    println!();
    println!("{}", serde_json::to_string_pretty(&report.schema)?);
    Ok(())
}

pub fn run_schema(args: &SchemaArgs, config: &Config) -> Result<SchemaReport> {
    let mut session = open_session(config);
    load_into(&mut session, SessionMode::SchemaEditor, &args.input.file, args.input.format.as_deref())?;

    let data_path = parse_path(args.path.as_deref().unwrap_or(""))?;
    let effective = session.effective_schema_at(SessionMode::DataEditor, &data_path);
    Ok(SchemaReport {
        data_path,
        schema_path: effective.schema_path.clone(),
        resolution: effective.resolution.clone(),
        schema: effective.schema.clone(),
    })
}

fn display_path(path: &Path) -> String {
    if path.is_root() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}
