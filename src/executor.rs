//! Runs a script's batches inside one transaction.
use crate::driver::{Connection, Connector, DriverError, IsolationLevel, Transaction};
use crate::errors::{ExecutionError, ExecutionPhase};
use crate::log_sink::LogSink;
use crate::script::Script;
use crate::split::{Batch, BatchSplitter};
use log::debug;
use std::fmt::Display;

pub trait ScriptExecutor {
    /// Execute `script` against the database at `connection_string`. Either every batch is
    /// committed or none is.
    fn execute(
        &self,
        connection_string: &str,
        script: &Script,
        log: &dyn LogSink,
    ) -> Result<(), ExecutionError>;
}

/// Executes scripts batch by batch through a [`Connector`].
///
/// All batches share a single transaction, opened at [`IsolationLevel::ReadUncommitted`]
/// unless configured otherwise, so a batch can rely on objects created by earlier batches.
/// The transaction is committed only after the last batch succeeds. On any failure the
/// transaction is rolled back and the connection released before the failure is logged
/// and returned.
#[derive(Debug, Clone, Default)]
pub struct SqlScriptExecutor<C> {
    connector: C,
    isolation: IsolationLevel,
    splitter: BatchSplitter,
}

impl<C> SqlScriptExecutor<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            isolation: IsolationLevel::default(),
            splitter: BatchSplitter::default(),
        }
    }

    pub fn with_isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_splitter(mut self, splitter: BatchSplitter) -> Self {
        self.splitter = splitter;
        self
    }
}

impl<C: Connector> ScriptExecutor for SqlScriptExecutor<C> {
    fn execute(
        &self,
        connection_string: &str,
        script: &Script,
        log: &dyn LogSink,
    ) -> Result<(), ExecutionError> {
        log.info(format_args!("Executing script '{}'", script.name()));
        let batches = self.splitter.batches(script.contents());
        debug!(
            "script '{}' split into {} batches",
            script.name(),
            batches.len()
        );

        match self.run_batches(connection_string, &batches) {
            Ok(()) => {
                debug!("committed script '{}'", script.name());
                Ok(())
            }
            Err(failure) => Err(report_failure(script, &batches, failure, log)),
        }
    }
}

impl<C: Connector> SqlScriptExecutor<C> {
    /// Connection and transaction live only inside this call, so both are released, and an
    /// uncommitted transaction rolled back, by the time it returns.
    fn run_batches(&self, connection_string: &str, batches: &[Batch<'_>]) -> Result<(), Failure> {
        let mut connection = self
            .connector
            .open(connection_string)
            .map_err(Failure::during(ExecutionPhase::Connect))?;
        let mut transaction = connection
            .begin(self.isolation)
            .map_err(Failure::during(ExecutionPhase::Begin))?;

        for batch in batches {
            debug!(
                "executing batch {} starting at line {}",
                batch.index, batch.start_line
            );
            transaction
                .execute(batch.text)
                .map_err(Failure::during(ExecutionPhase::Batch { index: batch.index }))?;
        }

        transaction
            .commit()
            .map_err(Failure::during(ExecutionPhase::Commit))
    }
}

struct Failure {
    phase: ExecutionPhase,
    error: DriverError,
}

impl Failure {
    fn during(phase: ExecutionPhase) -> impl FnOnce(DriverError) -> Failure {
        move |error| Failure { phase, error }
    }
}

fn report_failure(
    script: &Script,
    batches: &[Batch<'_>],
    failure: Failure,
    log: &dyn LogSink,
) -> ExecutionError {
    let Failure { phase, error } = failure;
    match error {
        DriverError::Engine {
            line,
            procedure,
            code,
            message,
            source,
        } => {
            let script_line = phase
                .batch_index()
                .and_then(|index| batches.get(index))
                .zip(line)
                .map(|(batch, line)| batch.start_line + (line as usize).saturating_sub(1));

            log.info(format_args!(
                "Engine error occurred. Transaction rolled back for script: '{}'",
                script.name()
            ));
            log.error(format_args!(
                "Script batch number: {}; Batch line: {}; Script line: {}; Procedure: {}; Error number: {}; Message: {}",
                or_none(phase.batch_index()),
                or_none(line),
                or_none(script_line),
                or_none(procedure.as_deref()),
                or_none(code.as_deref()),
                message
            ));
            log.error(format_args!("{source:?}"));

            ExecutionError::EngineExecutionError {
                script: script.name().to_owned(),
                phase,
                line,
                script_line,
                procedure,
                code,
                message,
                source,
            }
        }
        DriverError::Other(source) => {
            log.info(format_args!(
                "Error occurred during {phase}. Transaction rolled back for script: '{}'",
                script.name()
            ));
            log.error(format_args!("{source:?}"));

            ExecutionError::GenericExecutionError {
                script: script.name().to_owned(),
                phase,
                message: source.to_string(),
                source,
            }
        }
    }
}

fn or_none<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |value| value.to_string())
}
