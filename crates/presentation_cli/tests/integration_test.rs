//! Integration tests for CLI
//!
//! These tests verify CLI functionality without running actual commands,
//! but instead test the command parsing and structure.

#![allow(clippy::panic)] // Allow panic! in tests for clear failure messages

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

// Mock CLI structure for testing (mirrors main.rs)
#[derive(Parser)]
#[command(name = "voxchain")]
struct Cli {
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    Chat {
        message: Option<String>,
        #[arg(long)]
        text_only: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Converse {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        text_only: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    InitConfig,
}

fn parse_args(args: &[&str]) -> Result<Cli, clap::Error> {
    let os_args: Vec<OsString> = args.iter().map(OsString::from).collect();
    Cli::try_parse_from(os_args)
}

#[test]
fn cli_parses_single_chat_message() {
    let cli = parse_args(&["voxchain", "chat", "Hello, world!"]).unwrap();
    if let Commands::Chat {
        message, text_only, ..
    } = cli.command
    {
        assert_eq!(message.as_deref(), Some("Hello, world!"));
        assert!(!text_only);
    } else {
        panic!("Expected Chat command");
    }
}

#[test]
fn cli_chat_without_message_reads_stdin() {
    let cli = parse_args(&["voxchain", "chat", "--text-only"]).unwrap();
    if let Commands::Chat {
        message, text_only, ..
    } = cli.command
    {
        assert!(message.is_none());
        assert!(text_only);
    } else {
        panic!("Expected Chat command");
    }
}

#[test]
fn cli_chat_output_directory() {
    let cli = parse_args(&["voxchain", "chat", "hi", "-o", "replies"]).unwrap();
    if let Commands::Chat { output, .. } = cli.command {
        assert_eq!(output, Some(PathBuf::from("replies")));
    } else {
        panic!("Expected Chat command");
    }
}

#[test]
fn cli_converse_keeps_file_order() {
    let cli = parse_args(&["voxchain", "converse", "first.wav", "second.wav"]).unwrap();
    if let Commands::Converse { inputs, .. } = cli.command {
        assert_eq!(
            inputs,
            vec![PathBuf::from("first.wav"), PathBuf::from("second.wav")]
        );
    } else {
        panic!("Expected Converse command");
    }
}

#[test]
fn cli_converse_requires_input() {
    assert!(parse_args(&["voxchain", "converse"]).is_err());
}

#[test]
fn cli_parses_init_config() {
    let cli = parse_args(&["voxchain", "init-config"]).unwrap();
    assert!(matches!(cli.command, Commands::InitConfig));
}

#[test]
fn cli_config_path_is_global_option() {
    let cli = parse_args(&["voxchain", "-c", "custom.toml", "chat", "hi"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
}

#[test]
fn cli_verbosity_zero_by_default() {
    let cli = parse_args(&["voxchain", "init-config"]).unwrap();
    assert_eq!(cli.verbose, 0);
}

#[test]
fn cli_verbosity_counts() {
    let cli = parse_args(&["voxchain", "-vvv", "init-config"]).unwrap();
    assert_eq!(cli.verbose, 3);
}

#[test]
fn cli_rejects_unknown_command() {
    assert!(parse_args(&["voxchain", "serve"]).is_err());
}
