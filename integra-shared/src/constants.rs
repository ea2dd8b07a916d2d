//! System-wide constants: queue names, parameter codes and operational knobs.

use std::time::Duration;

/// Input queue carrying integration messages.
pub const WORK_QUEUE: &str = "integracaoCron";

/// Output queue receiving `LogIntegrRMS` audit records.
pub const LOG_QUEUE: &str = "log";

/// Worker count used when `WORKERS` is unset or invalid.
pub const DEFAULT_WORKERS: usize = 20;

/// Fixed backoff between broker (re)connection attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Poll interval of the background connection monitor.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// A worker logs the gap when a delivery arrives after this much inactivity.
pub const IDLE_LOG_THRESHOLD: Duration = Duration::from_secs(30);

/// Per-call timeout applied to every database operation.
pub const DB_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Exit code used when a worker panics outside handler recovery. The
/// supervisor is expected to restart the process.
pub const PANIC_EXIT_CODE: i32 = 70;

/// Tuning parameter: minutes subtracted from now for the soft-removal cutoff.
/// When absent the whole cleanup pipeline is disabled.
pub const PARAM_REMOVE_TRANSACTION_MINUTES: &str = "REMOVER_TRANSACAO_MINUTOS";

/// Tuning parameter: days subtracted from now for the hard-purge cutoff.
pub const PARAM_PURGE_DAYS: &str = "EXPURGO_INTEGRACAO_DIAS";

/// Last-execution timestamp of the soft-removal phase.
pub const PARAM_REMOVE_LAST_RUN: &str = "RemoverTransacaoUltimaExecucao";

/// Last-execution timestamp of the hard-purge phase.
pub const PARAM_PURGE_LAST_RUN: &str = "Parametro_ExpurgoIntegracaoUltimaExecucao";

/// Parameter environment meaning "applies globally".
pub const GLOBAL_ENVIRONMENT: &str = "*";

/// Message published with every successful stored-procedure outcome.
pub const SUCCESS_MESSAGE: &str = "Processamento realizado com sucesso.";
