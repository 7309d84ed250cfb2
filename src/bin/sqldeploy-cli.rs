use clap::{Parser, Subcommand};
use sqldeploy::errors::ConfigError;
use sqldeploy::{
    BatchSplitter, LogFacade, PgConnector, Script, ScriptExecutor, SqlScriptExecutor,
};
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Parser)]
#[clap(author, version, about = "Apply batch-separated SQL deployment scripts to a PostgreSQL database", long_about = None)]
pub struct Arguments {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run scripts in the given order, each in its own transaction. Stops at the first failure.
    Run(RunArgs),
}

#[derive(Debug, Parser)]
#[non_exhaustive]
pub struct RunArgs {
    /// PostgreSQL connection URL
    #[clap(long, env = "DATABASE_URL")]
    pub database_url: Url,

    /// Keyword that separates batches when alone on a line
    #[clap(
        long,
        default_value = sqldeploy::split::DEFAULT_SEPARATOR,
        value_parser = parse_separator
    )]
    pub separator: BatchSplitter,

    /// Script files to execute
    #[clap(required = true)]
    pub scripts: Vec<PathBuf>,
}

fn parse_separator(separator: &str) -> Result<BatchSplitter, ConfigError> {
    BatchSplitter::new(separator.to_owned())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Arguments::parse();

    match args.command {
        Commands::Run(args) => {
            let executor = SqlScriptExecutor::new(PgConnector).with_splitter(args.separator);
            let log = LogFacade::with_target("sqldeploy");
            for path in &args.scripts {
                let script = Script::from_file(path)?;
                executor.execute(args.database_url.as_str(), &script, &log)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Arguments, Commands};
    use clap::Parser;

    fn parse(separator: &str) -> Result<Arguments, clap::Error> {
        Arguments::try_parse_from([
            "sqldeploy-cli",
            "run",
            "--database-url",
            "postgres://localhost/db",
            "--separator",
            separator,
            "001.sql",
        ])
    }

    #[test]
    fn blank_separator_is_a_usage_error() {
        for separator in ["", "  "] {
            let err = parse(separator).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn separator_is_trimmed() {
        let Commands::Run(args) = parse(" END ").unwrap().command;
        assert_eq!(args.separator.separator(), "END");
    }
}
