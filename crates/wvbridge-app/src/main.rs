mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;
use wvbridge_common::{ConfigError, ShutdownHooks, WvBridgeError};
use wvbridge_config::BridgeConfig;
use wvbridge_native::{DirectoryResources, NativeModuleLoader, Platform};

use cli::Command;

const DEFAULT_LOG_DIRECTIVE: &str = "wvbridge=info";

fn main() -> ExitCode {
    let args = cli::parse();

    // Logging needs the configured level, so config errors are reported
    // once the subscriber is up.
    let loaded = load_config(args.config.as_deref());
    let level = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.level.clone(),
        (None, Err(_)) => DEFAULT_LOG_DIRECTIVE.to_string(),
    };
    init_logging(&level);

    let config = loaded.unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BridgeConfig::default()
    });

    // Removes staged libraries and closes anything still attached.
    let _shutdown = ShutdownHooks::global().guard();

    match run(args.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = match level.parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(e) => {
            eprintln!("invalid log level {level:?} ({e}), using {DEFAULT_LOG_DIRECTIVE}");
            EnvFilter::new(DEFAULT_LOG_DIRECTIVE)
        }
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    match path {
        Some(path) => {
            let config = wvbridge_config::load_from_path(path)?;
            wvbridge_config::validation::validate(&config)?;
            Ok(config)
        }
        None => wvbridge_config::load_config(),
    }
}

fn run(command: Command, config: BridgeConfig) -> Result<(), WvBridgeError> {
    match command {
        Command::Config => {
            println!("{}", wvbridge_config::config_to_json(&config));
        }
        Command::ResourceName { os } => {
            let platform = match os {
                Some(os) => Platform::from_os(&os)?,
                None => Platform::current()?,
            };
            println!("{}", platform.resource_name(&config.loader.library_name));
        }
        Command::Probe { resource_dir } => {
            let dir = resource_dir_for(resource_dir, &config)?;
            probe(dir, &config)?;
        }
    }
    Ok(())
}

fn resource_dir_for(
    flag: Option<PathBuf>,
    config: &BridgeConfig,
) -> Result<PathBuf, WvBridgeError> {
    flag.or_else(|| config.loader.resource_dir.clone())
        .ok_or_else(|| {
            WvBridgeError::Other(
                "no resource directory: pass --resource-dir or set loader.resource_dir".into(),
            )
        })
}

fn probe(dir: PathBuf, config: &BridgeConfig) -> Result<(), WvBridgeError> {
    tracing::info!(dir = %dir.display(), "probing native module");
    let loader = NativeModuleLoader::install(NativeModuleLoader::new(
        DirectoryResources::new(dir),
        config.loader.clone(),
    ));
    let module = loader.ensure_loaded()?;
    println!("loaded {} from {}", module.resource, module.path.display());
    Ok(())
}
