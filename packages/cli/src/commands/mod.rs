pub mod convert;
pub mod edit;
pub mod get;
pub mod schema;

pub use convert::{convert, ConvertArgs};
pub use edit::{remove, set, RemoveArgs, SetArgs};
pub use get::{get, GetArgs};
pub use schema::{schema, SchemaArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use metaconf_editor::{format_for_name, DataFormat, Path, Session, SessionMode, Settings};
use serde_json::Value;
use std::path::{Path as FsPath, PathBuf};

/// A document on disk plus an optional explicit format
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// Document to read (JSON or YAML)
    pub file: PathBuf,

    /// Format of the file (json, yaml); defaults to the extension, then `dataFormat`
    #[arg(short, long)]
    pub format: Option<String>,
}

/// Format name for `file`: explicit flag, else extension, else settings
pub fn format_name_for(file: &FsPath, flag: Option<&str>, settings: &Settings) -> String {
    if let Some(name) = flag {
        return name.to_string();
    }
    match file.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ["json", "yaml", "yml"].contains(&ext.to_ascii_lowercase().as_str()) => ext.to_string(),
        _ => settings.data_format.clone(),
    }
}

pub fn format_for(file: &FsPath, flag: Option<&str>, settings: &Settings) -> Result<Box<dyn DataFormat>> {
    let name = format_name_for(file, flag, settings);
    Ok(format_for_name(&name, settings.code_editor.indentation)?)
}

/// Session initialized with the settings document from `config`
pub fn open_session(config: &Config) -> Session {
    let mut session = Session::new();
    session.set_data(SessionMode::Settings, config.document.clone());
    session
}

/// Read `file` into the document of `mode`; the text must parse
pub fn load_into(session: &mut Session, mode: SessionMode, file: &FsPath, format: Option<&str>) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("Cannot read {}", file.display()))?;
    let format = format_for(file, format, session.settings())?;
    let name = format.name();
    if let Err(e) = format.parse(&text) {
        anyhow::bail!("{} is not valid {}: {}", file.display(), name, e);
    }
    session.data_mut(mode).set_format(format);
    session.write(mode, &text);
    tracing::debug!("Loaded {} as {} into {}", file.display(), name, mode);
    Ok(())
}

/// Parse a path argument: JSON Pointer when it starts with `/`, canonical form otherwise
pub fn parse_path(text: &str) -> Result<Path> {
    let path = if text.starts_with('/') {
        Path::from_json_pointer(text)?
    } else {
        Path::parse(text)?
    };
    Ok(path)
}

/// Parse a value argument as JSON, falling back to a plain string
pub fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Text as it should be written to a file
pub fn with_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
