use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// wvbridge: inspect and probe the bundled native web view engine.
#[derive(Parser, Debug)]
#[command(name = "wvbridge", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Stage and load the native library from a resource directory.
    Probe {
        /// Directory holding the per-platform library files.
        /// Defaults to `loader.resource_dir` from the config.
        #[arg(long)]
        resource_dir: Option<PathBuf>,
    },

    /// Print the library file name bundled for a platform.
    ResourceName {
        /// Target OS (`macos`, `linux`, `windows`). Defaults to the host.
        #[arg(long)]
        os: Option<String>,
    },

    /// Print the effective configuration as JSON.
    Config,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe_with_resource_dir() {
        let args =
            Args::try_parse_from(["wvbridge", "probe", "--resource-dir", "/opt/wv"]).unwrap();
        assert_eq!(
            args.command,
            Command::Probe {
                resource_dir: Some(PathBuf::from("/opt/wv"))
            }
        );
        assert!(args.config.is_none());
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let args = Args::try_parse_from([
            "wvbridge",
            "resource-name",
            "--os",
            "windows",
            "--log-level",
            "debug",
            "--config",
            "/tmp/wv.toml",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::ResourceName {
                os: Some("windows".into())
            }
        );
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/wv.toml")));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["wvbridge"]).is_err());
    }
}
