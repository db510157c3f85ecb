use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use config::{Configuration, PathManager, load_env_file};
use evalexpr::HashMapContext;
use scopeshell::flags::{Flag, FlagValue};
use scopeshell::{Command, Console, ConsoleConfig, Evaluator, Scope, eval_command, print_info};

#[cfg(not(debug_assertions))]
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const ENV_PREFIX: &str = "SCOPESHELL_";

#[derive(Parser, Debug)]
#[command(name = "scopeshell-demo", about = "Sample nested command console")]
struct Args {
    /// Name of the root scope
    #[arg(short, long, default_value = "mercator")]
    name: String,

    /// Minimum level written to the log file
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Settings file backing env/get/set (defaults to the config dir)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Do not read or write line history
    #[arg(long)]
    no_history: bool,
}

/// `evalexpr` with variables kept between lines
struct ExprEvaluator {
    context: HashMapContext,
}

impl Evaluator for ExprEvaluator {
    fn eval(&mut self, source: &str) -> Result<String> {
        let value = evalexpr::eval_with_context_mut(source, &mut self.context)?;
        Ok(value.to_string())
    }
}

fn risk_command() -> Command {
    Command::new("risk")
        .with_summary("risk calculates an investment risk")
        .with_flags(|flags| {
            flags
                .string("config", None, "", "config file (default is $HOME/.scopeshell.toml)")
                .string("author", Some('a'), "YOUR NAME", "author name for copyright attribution")
                .string("license", Some('l'), "", "name of license for the project")
                .bool("viper", None, true, "use Viper for configuration");
        })
        .with_flag(
            Flag::new("color", FlagValue::String("red".into()), "color of the report")
                .with_suggestions(["red", "green", "blue"]),
        )
        .with_run(|session, command, args| {
            let (author, license, viper, color) = {
                let flags = command.flags();
                (
                    flags.get_str("author").unwrap_or_default().to_string(),
                    flags.get_str("license").unwrap_or_default().to_string(),
                    flags.get_bool("viper").unwrap_or_default(),
                    flags.get_str("color").unwrap_or_default().to_string(),
                )
            };
            tracing::debug!(%author, %license, viper, %color, ?args, "risk");
            let out = session.out();
            writeln!(out, "author:  {}", author)?;
            writeln!(out, "license: {}", license)?;
            writeln!(out, "viper:   {}", viper)?;
            writeln!(out, "color:   {}", color)?;
            Ok(())
        })
}

fn settings_path(args: &Args) -> Option<PathBuf> {
    args.settings.clone().or_else(PathManager::settings_path)
}

fn load_settings(path: Option<&PathBuf>) -> Configuration {
    let mut settings = match path {
        Some(path) if path.exists() => Configuration::load(path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring unreadable settings");
            Configuration::new()
        }),
        _ => Configuration::new(),
    };
    settings.merge(Configuration::from_env(ENV_PREFIX));
    settings
}

fn main() -> Result<()> {
    load_env_file();
    let args = Args::parse();

    // Stdout belongs to the prompt, so logs go to a file.
    // Dev builds recreate ./scopeshell.log on each run; release builds
    // rotate daily under the data directory.
    #[cfg(debug_assertions)]
    let log_file = {
        let path = PathBuf::from("./scopeshell.log");
        let _ = std::fs::remove_file(&path);
        std::fs::File::create(&path)?
    };
    #[cfg(debug_assertions)]
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    #[cfg(not(debug_assertions))]
    let (non_blocking, _guard) = {
        let log_dir = PathManager::logs_dir().unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&log_dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "scopeshell.log");
        tracing_appender::non_blocking(file_appender)
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(args.log_level))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    tracing::info!(name = %args.name, "starting scopeshell demo");

    if let Err(err) = PathManager::ensure_dirs_exist() {
        tracing::warn!(error = %err, "could not create data directories");
    }
    let settings_path = settings_path(&args);

    let mut console_config = ConsoleConfig::default()
        .with_title(args.name.clone())
        .with_title_screen(|| print_info("scopeshell", "type `help` to list commands, Ctrl-D to leave"));
    if !args.no_history
        && let Some(history) = PathManager::history_path()
    {
        console_config = console_config.with_history(history);
    }

    let mut console = Console::with_config(args.name.clone(), console_config);
    console
        .session()
        .borrow_mut()
        .configuration_mut()
        .merge(load_settings(settings_path.as_ref()));

    let binance = Scope::new("binance", "Utilities for accessing the Binance crypto exchange");
    binance.add_command(risk_command());
    binance.add_sub_scope(Scope::new("account", "Access account info"));
    console.add_scope(binance);
    console.add_command(eval_command(ExprEvaluator {
        context: HashMapContext::new(),
    }));

    console.run()?;

    if let Some(path) = settings_path {
        console.session().borrow().configuration().save(&path)?;
    }
    tracing::info!("scopeshell demo finished");
    Ok(())
}
