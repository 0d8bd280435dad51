//! Plugin host entry point
//!
//! Loads configuration, sets up logging, loads the built-in plugins against a
//! fresh registry, runs a short scripted event sequence and unloads.

use clap::{Arg, Command};
use plugin_events::{Argument, ArgumentStack, EffectHandle, Events, ObjectId};
use plugin_host::plugins::builtin_plugins;
use plugin_host::{setup_logging, AppConfig, PluginHost};
use std::path::PathBuf;
use tracing::{error, info};

/// Command line arguments
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl CliArgs {
    pub fn parse() -> Self {
        let matches = Command::new("Plugin Host")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Runs engine plugins against a shared event registry")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("plugin_host.toml"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("plugin_host.toml")),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}

fn run_script(host: &PluginHost<'_>) {
    let target = Argument::Object(ObjectId(0x1a));

    let damage: ArgumentStack = vec![target.clone(), Argument::Int(12)];
    for (plugin, result) in host.broadcast("OnDamage", &damage) {
        info!(
            "OnDamage -> {}: {}",
            plugin,
            result.map(|r| r.to_string()).unwrap_or_default()
        );
    }

    match host.dispatch(
        "combat",
        "OnApplyEffect",
        &[target.clone(), Argument::Effect(EffectHandle::new(7))],
    ) {
        Ok(Some(result)) => info!("OnApplyEffect -> {}", result),
        Ok(None) => info!("OnApplyEffect produced no result"),
        Err(e) => error!("OnApplyEffect failed: {}", e),
    }

    host.broadcast("OnDeath", &[target]);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let mut config = AppConfig::load_from_file(&args.config_path).await?;
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if let Err(e) = config.validate() {
        return Err(format!("Configuration validation failed: {}", e).into());
    }

    setup_logging(&config.logging)?;
    info!("Config: {}", args.config_path.display());

    let events = Events::with_config(config.registry.clone());
    let mut host = PluginHost::new(&events, config.plugins.clone());

    for plugin in builtin_plugins() {
        let name = plugin.name().to_string();
        if let Err(e) = host.load_plugin(plugin) {
            error!("Failed to load plugin {}: {}", name, e);
        }
    }

    run_script(&host);

    host.shutdown_all()?;

    let stats = events.stats();
    info!(
        "Registry closed: {} registered, {} cleared, {} dispatched, {} live",
        stats.events_registered,
        stats.events_cleared,
        stats.events_dispatched,
        stats.total_registrations
    );
    Ok(())
}
