use std::future::Future;

use crate::core::{TaskState, retry_delay};
use crate::data::TransferConfig;
use crate::error::{Result, TransferError};

/// Drive `op` through the task state machine.
///
/// Retryable failures sleep with exponential backoff and run `op` again until the
/// budget is spent, which yields [`TransferError::MaxRetriesExceeded`]. Other failures
/// are returned on the spot.
pub(crate) async fn with_retries<T, F, Fut>(config: &TransferConfig, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut state = TaskState::default();
    loop {
        state = state.begin();
        let error = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        state = state.fail(error.is_retryable(), config.max_retries);
        match state {
            TaskState::Pending { attempt } => {
                let delay = retry_delay(attempt - 1, config.retry_backoff);
                tracing::warn!(
                    path = label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying transfer"
                );
                tokio::time::sleep(delay).await;
            }
            TaskState::Failed { attempts, exhausted: true } => {
                return Err(TransferError::MaxRetriesExceeded { count: attempts, last: Box::new(error) });
            }
            _ => return Err(error),
        }
    }
}
