//! Linear stage running: each stage is a fallible step; the first failure
//! aborts the run and decides the process exit code. A finish hook logs
//! the outcome on every exit path, success or not.

use crate::error::Result;
use crate::logging::Logger;

/// Run one named stage, logging its start and mapping any failure back to
/// the caller untouched. Stages carry their own error kinds; nothing here
/// inspects messages.
pub fn run_stage<T>(
    logger: &Logger,
    name: &str,
    stage: impl FnOnce() -> Result<T>,
) -> Result<T> {
    logger.info(format!("==> {}", name));
    match stage() {
        Ok(value) => Ok(value),
        Err(err) => {
            logger.error(format!("{} failed: {}", name, err));
            Err(err)
        }
    }
}

/// Terminal hook: log the run outcome and produce the process exit code.
/// Runs for every exit path; informational only, no rollback.
pub fn finish<T>(logger: &Logger, result: &Result<T>) -> i32 {
    let code = match result {
        Ok(_) => {
            logger.info("Run completed successfully");
            0
        }
        Err(err) => {
            logger.error(format!(
                "Run aborted: {} [{}] (exit {})",
                err,
                err.code(),
                err.exit_code()
            ));
            err.exit_code()
        }
    };

    if let Some(path) = logger.path() {
        logger.info(format!("Log saved to {}", path.display()));
    }
    code
}
