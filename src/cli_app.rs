//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use avatar_badge::core::config::Config;
use avatar_badge::core::errors::AvatarError;
use avatar_badge::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};
use avatar_badge::resolver::color::ColorCode;
use avatar_badge::resolver::{DisplayResult, Resolver};
use avatar_badge::widget::{AvatarProps, AvatarView, AvatarWidget};

/// Avatar badge: resolve avatar initials, colour classes and views.
#[derive(Debug, Parser)]
#[command(
    name = "avatar-badge",
    author,
    version,
    about = "Avatar badge - initials and placeholder resolution",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Resolve what an avatar with the given props displays.
    Resolve(ResolveArgs),
    /// View and validate configuration.
    Config(ConfigArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args, Default)]
struct ResolveArgs {
    /// User name. Pass an empty string for the "no display name" icon; omit
    /// for the generic silhouette.
    #[arg(long)]
    name: Option<String>,
    /// "male" or "female" (any case).
    #[arg(long)]
    gender: Option<String>,
    /// Width in pixels (defaults to config).
    #[arg(long)]
    width: Option<f64>,
    /// Height in pixels (defaults to config).
    #[arg(long)]
    height: Option<f64>,
    /// Text shown verbatim instead of derived initials.
    #[arg(long)]
    custom_text: Option<String>,
    /// Image source; takes precedence over initials.
    #[arg(long, value_name = "URL")]
    img_src: Option<String>,
    /// Treat the image as failed to load.
    #[arg(long, requires = "img_src")]
    image_failed: bool,
    /// Square corners instead of a round avatar.
    #[arg(long)]
    square: bool,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// Config operation to run.
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print resolved config file path.
    Path,
    /// Print effective merged configuration.
    Show,
    /// Validate configuration and exit.
    Validate,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completions for.
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

impl From<AvatarError> for CliError {
    fn from(err: AvatarError) -> Self {
        if matches!(err, AvatarError::InvalidGender { .. }) {
            Self::User(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Resolve(args) => run_resolve(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

fn props_from_args(config: &Config, args: &ResolveArgs) -> AvatarProps {
    let mut props = AvatarProps::from_config(&config.widget);
    props.name.clone_from(&args.name);
    props.gender.clone_from(&args.gender);
    props.custom_text.clone_from(&args.custom_text);
    props.img_src.clone_from(&args.img_src);
    if let Some(width) = args.width {
        props.width = width;
    }
    if let Some(height) = args.height {
        props.height = height;
    }
    if args.square {
        props.is_round = false;
    }
    props
}

fn open_activity_log(config: &Config) -> Option<JsonlWriter> {
    if !config.logging.enabled {
        return None;
    }
    let mut writer = JsonlWriter::open(JsonlConfig::from(&config.logging));
    let hash = config.stable_hash().unwrap_or_default();
    writer.write_entry(
        &LogEntry::new(EventType::ConfigLoaded, Severity::Info)
            .with_details(format!("config_hash={hash}")),
    );
    Some(writer)
}

fn run_resolve(cli: &Cli, args: &ResolveArgs) -> Result<(), CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let props = props_from_args(&config, args);
    let resolver = Resolver::new(config.resolver);

    let mut widget = match AvatarWidget::with_resolver(props, resolver) {
        Ok(widget) => widget,
        Err(err) => {
            if let Some(mut writer) = open_activity_log(&config) {
                writer.write_entry(&LogEntry::for_error(&err));
            }
            return Err(err.into());
        }
    };
    if let Some(writer) = open_activity_log(&config) {
        widget = widget.with_activity_log(writer);
    }
    if args.image_failed {
        widget.mark_image_failed();
    }

    let view = widget.view();
    match output_mode(cli) {
        OutputMode::Human => print_resolve_human(widget.result(), &view),
        OutputMode::Json => {
            let payload = json!({
                "command": "resolve",
                "result": serde_json::to_value(widget.result())?,
                "view": serde_json::to_value(&view)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_resolve_human(result: &DisplayResult, view: &AvatarView) {
    match view {
        AvatarView::Initials { text, class, .. } => {
            let badge = format!(" {text} ");
            let badge = match result.color_code {
                ColorCode::Zero => badge.as_str().black().on_magenta(),
                ColorCode::One => badge.as_str().black().on_cyan(),
            };
            println!("{badge}");
            println!("  Class: {class}");
        }
        AvatarView::Image { src, .. } => println!("Image: {src}"),
        AvatarView::NoDisplayName { .. } => println!("(no display name)"),
        AvatarView::Nobody { .. } => println!("(nobody)"),
    }
    let style = view.style();
    println!("  View: {}", view.kind());
    println!("  Color code: {}", result.color_code);
    println!("  Font size: {}px", result.font_size);
    println!(
        "  Box: {}x{}px, radius {}",
        style.width, style.height, style.border_radius
    );
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    let payload = json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    });
                    write_json_line(&payload)?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;

                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": true,
                            "path": config.paths.config_file.to_string_lossy(),
                            "hash": hash,
                        });
                        write_json_line(&payload)?;
                    }
                }
                Ok(())
            }
            Err(e) => {
                match output_mode(cli) {
                    OutputMode::Human => {
                        eprintln!("Configuration is INVALID: {e}");
                    }
                    OutputMode::Json => {
                        let payload = json!({
                            "command": "config validate",
                            "valid": false,
                            "error": e.to_string(),
                            "code": e.code(),
                        });
                        write_json_line(&payload)?;
                    }
                }
                Err(CliError::User(format!("invalid config: {e}")))
            }
        },
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("AVB_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
