use super::{load_into, open_session, parse_path, FileArgs};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use metaconf_editor::SessionMode;

#[derive(Args, Debug)]
pub struct GetArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Location to read (`a.b[0]` or `/a/b/0`); the whole document when omitted
    pub path: Option<String>,
}

pub fn get(args: GetArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let text = run_get(&args, &config)?;
    println!("{}", text.trim_end());
    Ok(())
}

/// Value at the requested path, in the file's format
pub fn run_get(args: &GetArgs, config: &Config) -> Result<String> {
    let mut session = open_session(config);
    load_into(&mut session, SessionMode::DataEditor, &args.input.file, args.input.format.as_deref())?;

    let path = parse_path(args.path.as_deref().unwrap_or(""))?;
    let value = session
        .at(SessionMode::DataEditor, &path)
        .ok_or_else(|| anyhow::anyhow!("No value at '{}'", path))?;
    Ok(session.store(SessionMode::DataEditor).format().stringify(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::FileArgs;
    use std::path::PathBuf;

    fn args(file: PathBuf, path: Option<&str>) -> GetArgs {
        GetArgs {
            input: FileArgs { file, format: None },
            path: path.map(str::to_string),
        }
    }

    #[test]
    fn test_get_nested_value() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.json");
        std::fs::write(&file, r#"{"server": {"ports": [80, 443]}}"#).unwrap();

        let config = Config::default();
        assert_eq!(run_get(&args(file.clone(), Some("server.ports[1]")), &config).unwrap(), "443");
        assert_eq!(run_get(&args(file.clone(), Some("/server/ports")), &config).unwrap(), "[\n  80,\n  443\n]");
        assert!(run_get(&args(file, Some("server.missing")), &config).is_err());
    }

    #[test]
    fn test_get_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.yaml");
        std::fs::write(&file, "server:\n  host: example.org\n").unwrap();

        let text = run_get(&args(file, Some("server")), &Config::default()).unwrap();
        assert_eq!(text, "host: example.org\n");
    }
}
