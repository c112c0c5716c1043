//! Command-line options.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::SupervisorConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Clone, Parser, Default)]
#[command(name = "process-supervisor")]
#[command(about = "Lifecycle supervisor for domain-partitioned applications", long_about = None)]
pub struct CommandLine {
    /// Configuration file (TOML).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Name of the Process
    #[arg(long, value_name = "processName")]
    pub name: Option<String>,

    /// Cold Start
    #[arg(long)]
    pub cold: bool,

    /// Schedules to run before initialisation
    #[arg(long = "preinit", value_name = "scheduleFile")]
    pub pre_init: Vec<PathBuf>,

    /// Schedules to run after initialisation
    #[arg(long = "postinit", value_name = "scheduleFile")]
    pub post_init: Vec<PathBuf>,

    /// Idle for this many seconds instead of running until shutdown
    #[arg(long, value_name = "SECONDS")]
    pub idle_secs: Option<u64>,
}

impl CommandLine {
    /// Load the config file (or defaults) and apply the overrides.
    pub fn resolve(&self) -> Result<SupervisorConfig, ConfigError> {
        let config = match &self.config {
            Some(path) => load_config(path)?,
            None => SupervisorConfig::default(),
        };
        let config = self.apply(config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Merge command-line options over a loaded configuration.
    pub fn apply(&self, mut config: SupervisorConfig) -> SupervisorConfig {
        if let Some(name) = &self.name {
            config.process.name = Some(name.clone());
        }
        config.process.cold_start |= self.cold;
        config.schedules.pre_init.extend(self.pre_init.iter().cloned());
        config.schedules.post_init.extend(self.post_init.iter().cloned());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeatable_schedule_options() {
        let cli = CommandLine::parse_from([
            "process-supervisor",
            "--name",
            "billing-1",
            "--cold",
            "--preinit",
            "a.sch",
            "--preinit",
            "b.sch",
            "--postinit",
            "c.sch",
        ]);

        assert_eq!(cli.name.as_deref(), Some("billing-1"));
        assert!(cli.cold);
        assert_eq!(cli.pre_init, vec![PathBuf::from("a.sch"), PathBuf::from("b.sch")]);
        assert_eq!(cli.post_init, vec![PathBuf::from("c.sch")]);
    }

    #[test]
    fn overrides_append_after_config() {
        let mut config = SupervisorConfig::default();
        config.schedules.pre_init = vec![PathBuf::from("from_file.sch")];
        config.process.name = Some("configured".into());

        let cli = CommandLine::parse_from(["process-supervisor", "--preinit", "extra.sch"]);
        let merged = cli.apply(config);

        assert_eq!(merged.process.name.as_deref(), Some("configured"));
        assert!(!merged.process.cold_start);
        assert_eq!(
            merged.schedules.pre_init,
            vec![PathBuf::from("from_file.sch"), PathBuf::from("extra.sch")]
        );
    }

    #[test]
    fn resolve_without_file_uses_defaults() {
        let cli = CommandLine::parse_from(["process-supervisor", "--name", "solo"]);
        let config = cli.resolve().unwrap();
        assert_eq!(config.process.name.as_deref(), Some("solo"));
        assert_eq!(config.process.project_name, "process");
    }
}
