use super::{load_into, open_session, parse_path, parse_value, with_trailing_newline, FileArgs};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use metaconf_editor::SessionMode;
use std::path::{Path as FsPath, PathBuf};

#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Location to set (`a.b[0]` or `/a/b/0`)
    pub path: String,

    /// New value as JSON; anything that is not JSON is taken as a string
    pub value: String,

    /// Schema whose property order is used for new keys
    #[arg(short, long)]
    pub schema: Option<PathBuf>,

    /// Write the result back to the file instead of printing it
    #[arg(short, long)]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Location to remove (`a.b[0]` or `/a/b/0`)
    pub path: String,

    /// Write the result back to the file instead of printing it
    #[arg(short, long)]
    pub write: bool,
}

/// Result of an edit command
#[derive(Debug, Clone, PartialEq)]
pub struct EditOutcome {
    pub changed: bool,
    pub text: String,
}

pub fn set(args: SetArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let outcome = run_set(&args, &config)?;
    finish(&args.input.file, outcome, args.write)
}

pub fn remove(args: RemoveArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let outcome = run_remove(&args, &config)?;
    finish(&args.input.file, outcome, args.write)
}

pub fn run_set(args: &SetArgs, config: &Config) -> Result<EditOutcome> {
    let mut session = open_session(config);
    if let Some(schema) = &args.schema {
        load_into(&mut session, SessionMode::SchemaEditor, schema, None)?;
    }
    load_into(&mut session, SessionMode::DataEditor, &args.input.file, args.input.format.as_deref())?;

    let path = parse_path(&args.path)?;
    let changed = session.set_at(SessionMode::DataEditor, &path, parse_value(&args.value))?;
    Ok(EditOutcome {
        changed,
        text: session.read(SessionMode::DataEditor)?,
    })
}

pub fn run_remove(args: &RemoveArgs, config: &Config) -> Result<EditOutcome> {
    let mut session = open_session(config);
    load_into(&mut session, SessionMode::DataEditor, &args.input.file, args.input.format.as_deref())?;

    let path = parse_path(&args.path)?;
    let changed = session.remove_at(SessionMode::DataEditor, &path);
    Ok(EditOutcome {
        changed,
        text: session.read(SessionMode::DataEditor)?,
    })
}

fn finish(file: &FsPath, outcome: EditOutcome, write: bool) -> Result<()> {
    if !write {
        println!("{}", outcome.text.trim_end());
        return Ok(());
    }
    if outcome.changed {
        std::fs::write(file, with_trailing_newline(outcome.text))?;
        eprintln!("{} Updated {}", "✓".green(), file.display());
    } else {
        eprintln!("{} No changes to {}", "•".dimmed(), file.display());
    }
    Ok(())
}
