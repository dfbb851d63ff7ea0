use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming};

/// Starts file logging under `logs/` with 1MB rotation, echoing everything to stdout
/// and warnings to stderr. Keep the returned handle alive for the program's lifetime.
pub fn setup_logging(base_level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(base_level)?
        .log_to_file(
            FileSpec::default()
                .directory("logs")
                .basename("sprout_vision"),
        )
        .duplicate_to_stderr(Duplicate::Warn)
        .duplicate_to_stdout(Duplicate::All)
        .rotate(
            Criterion::Size(1024 * 1024),
            Naming::Timestamps,
            Cleanup::KeepLogFiles(5),
        )
        .start()
}
