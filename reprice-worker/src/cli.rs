use clap::{Parser, Subcommand};

/// Reprice worker command line
#[derive(Parser, Debug)]
#[command(name = "reprice-worker")]
#[command(about = "Batch repricing of the product catalog", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Reprice the whole product table once and print the job as JSON
    Run {
        /// Recorded on the job as its trigger
        #[arg(default_value = "manual")]
        triggered_by: String,
    },

    /// Write an empty snapshot with default parameters and fee tables
    Init,
}

impl Cli {
    /// The requested command; a bare invocation is a manual run
    pub fn command(self) -> Command {
        self.command.unwrap_or(Command::Run {
            triggered_by: "manual".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(args).map(Cli::command)
    }

    #[test]
    fn test_run_with_trigger() {
        let command = parse(&["reprice-worker", "run", "cron"]).unwrap();
        assert_eq!(
            command,
            Command::Run {
                triggered_by: "cron".to_string()
            }
        );
    }

    #[test]
    fn test_run_defaults_to_manual() {
        let manual = Command::Run {
            triggered_by: "manual".to_string(),
        };
        assert_eq!(parse(&["reprice-worker", "run"]).unwrap(), manual);
        assert_eq!(parse(&["reprice-worker"]).unwrap(), manual);
    }

    #[test]
    fn test_init() {
        assert_eq!(parse(&["reprice-worker", "init"]).unwrap(), Command::Init);
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        let err = parse(&["reprice-worker", "reprice-all"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidSubcommand);

        // init takes no trigger
        assert!(parse(&["reprice-worker", "init", "cron"]).is_err());
    }
}
