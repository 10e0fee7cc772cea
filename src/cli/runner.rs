//! Runner wiring one registry check to the process

use crate::checker::{Checker, RunReport};
use crate::cli::args::Args;
use crate::config::{WatchConfig, template};
use crate::error::{Result, WatchError};
use crate::logging::Logger;
use crate::status::FileStateStore;
use std::path::Path;
use std::sync::Arc;

pub struct Runner {
    args: Args,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Self {
        let output = if args.quiet {
            Logger::new_quiet()
        } else {
            Logger::new(args.verbose)
        };

        Self { args, output }
    }

    /// Run one check and print the report; returns the process exit code
    pub async fn run(&self) -> i32 {
        match self.execute().await {
            Ok(report) => match self.render(&report) {
                Ok(json) => {
                    println!("{}", json);
                    0
                }
                Err(e) => {
                    self.output.error(&e.to_string());
                    1
                }
            },
            Err(e) => {
                self.output.error(&e.to_string());
                1
            }
        }
    }

    pub async fn execute(&self) -> Result<RunReport> {
        self.args.validate().map_err(WatchError::Config)?;

        self.output.step(&format!("Loading configuration from {}", self.args.config));
        let watch = WatchConfig::load(Path::new(&self.args.config))?;
        let matrix = watch.matrix();
        let policies = watch.policies(&template::env_vars())?;

        self.output.info(&format!(
            "Watching {} tags across {} repositories",
            matrix.values().map(Vec::len).sum::<usize>(),
            matrix.len()
        ));

        let store = Arc::new(FileStateStore::new(&self.args.state_file));
        self.output
            .detail(&format!("State file: {}", store.path().display()));

        let checker = Checker::from_config(
            &self.args.checker_config(),
            None,
            store,
            self.output.clone(),
        )?
        .with_persist(!self.args.dry_run);

        checker.run(&matrix, &policies).await
    }

    fn render(&self, report: &RunReport) -> Result<String> {
        let json = if self.args.pretty {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_missing_config_is_hard_failure() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "registry-notify",
            "-q",
            "-c",
            dir.path().join("missing.json").to_str().unwrap(),
        ])
        .unwrap();

        let runner = Runner::new(args);
        assert!(matches!(runner.execute().await, Err(WatchError::Config(_))));
        assert_eq!(runner.run().await, 1);
    }

    #[tokio::test]
    async fn test_empty_config_produces_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        std::fs::write(&config, "[]").unwrap();
        let state = dir.path().join("state");

        let args = Args::try_parse_from([
            "registry-notify",
            "-q",
            "-c",
            config.to_str().unwrap(),
            "-s",
            state.to_str().unwrap(),
        ])
        .unwrap();

        let report = Runner::new(args).execute().await.unwrap();
        assert!(report.changes.is_empty());
        assert!(report.notifications.is_empty());
        assert!(report.status.is_empty());
        assert!(state.exists());
    }
}
