mod cli;
mod config;
mod paths;
mod run;
mod settings;
mod typewriter;

use anyhow::Result;
use cli::{Command, RunArgs, SettingsAction};
use config::LoadedConfig;
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Type(args)) => typewriter::run(&cli.run, args),
        Some(Command::Settings(settings_cmd)) => {
            handle_settings_command(&cli.run, settings_cmd.action)
        }
        Some(Command::Where) => run_where(&cli.run),
        None => run::run(cli.run),
    }
}

fn handle_settings_command(args: &RunArgs, action: SettingsAction) -> Result<()> {
    let paths = AppPaths::discover()?;
    let loaded = LoadedConfig::load(&paths, args.config.as_deref())?;
    let resolved = loaded.resolve_settings(args.preset.as_deref(), &args.overrides())?;

    match action {
        SettingsAction::List => print!("{}", settings::render_list(&resolved)),
        SettingsAction::Dump { format } => {
            println!("{}", settings::render_dump(&resolved, format)?.trim_end())
        }
    }
    Ok(())
}

fn run_where(args: &RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let loaded = LoadedConfig::load(&paths, args.config.as_deref())?;
    println!("Configuration:");
    println!("  config dir:   {}", paths.config_dir().display());
    println!(
        "  config file:  {} ({})",
        loaded.path.display(),
        if loaded.from_file { "loaded" } else { "missing" }
    );
    println!(
        "Presets: {}",
        if loaded.config.presets.is_empty() {
            "(none)".to_string()
        } else {
            loaded
                .config
                .presets
                .keys()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!(
        "Reveal: char_delay={:?} settle={:?}",
        loaded.config.reveal.char_delay, loaded.config.reveal.settle
    );
    Ok(())
}
