use super::{load_into, open_session, with_trailing_newline, FileArgs};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use metaconf_editor::{format_for_name, SessionMode};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Target format (json, yaml)
    #[arg(short, long)]
    pub to: String,

    /// Output file; printed to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn convert(args: ConvertArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let text = run_convert(&args, &config)?;

    match &args.output {
        Some(output) => {
            std::fs::write(output, with_trailing_newline(text))?;
            eprintln!(
                "{} Converted {} → {}",
                "✓".green(),
                args.input.file.display(),
                output.display()
            );
        }
        None => println!("{}", text.trim_end()),
    }
    Ok(())
}

pub fn run_convert(args: &ConvertArgs, config: &Config) -> Result<String> {
    let mut session = open_session(config);
    load_into(&mut session, SessionMode::DataEditor, &args.input.file, args.input.format.as_deref())?;

    let target = format_for_name(&args.to, session.settings().code_editor.indentation)?;
    session.data_mut(SessionMode::DataEditor).set_format(target);
    Ok(session.read(SessionMode::DataEditor)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_yaml_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let json_file = dir.path().join("data.json");
        std::fs::write(&json_file, r#"{"b": 1, "a": {"list": ["x"]}}"#).unwrap();

        let args = ConvertArgs {
            input: FileArgs {
                file: json_file,
                format: None,
            },
            to: "yaml".to_string(),
            output: None,
        };
        let yaml = run_convert(&args, &Config::default()).unwrap();
        assert_eq!(yaml, "b: 1\na:\n  list:\n  - x\n");

        let yaml_file = dir.path().join("data.yml");
        std::fs::write(&yaml_file, &yaml).unwrap();
        let back = ConvertArgs {
            input: FileArgs {
                file: yaml_file,
                format: None,
            },
            to: "json".to_string(),
            output: None,
        };
        let json_text = run_convert(&back, &Config::default()).unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&json_text).unwrap(), json!({"b": 1, "a": {"list": ["x"]}}));
    }

    #[test]
    fn test_indentation_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.yaml");
        std::fs::write(&file, "a: 1\n").unwrap();

        let config = Config {
            document: json!({"codeEditor": {"indentation": 4}}),
        };
        let args = ConvertArgs {
            input: FileArgs { file, format: None },
            to: "json".to_string(),
            output: None,
        };
        assert_eq!(run_convert(&args, &config).unwrap(), "{\n    \"a\": 1\n}");
    }

    #[test]
    fn test_unknown_target_format() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("data.json");
        std::fs::write(&file, "{}").unwrap();
        let args = ConvertArgs {
            input: FileArgs { file, format: None },
            to: "xml".to_string(),
            output: None,
        };
        assert!(run_convert(&args, &Config::default()).is_err());
    }
}
