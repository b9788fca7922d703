//! Suspending adapter: the calling task yields until the handle resumes it.

use std::time::Duration;

use tokio::sync::oneshot;

use crate::dispatcher::{protocol_violation, CompletionHandle};
use crate::error::{Error, Result};
use crate::invoker;
use crate::outcome::{AuthenticationOutcome, TIMED_OUT_MESSAGE};
use crate::platform::BiometricPlatform;
use crate::request::AuthenticationRequest;

/// Submit `request` and suspend the current task until it is answered
///
/// Only the task is suspended; the runtime thread keeps driving other
/// work. Dropping the returned future stops waiting but does not cancel
/// the evaluation.
pub async fn wait_suspending(
    platform: &dyn BiometricPlatform,
    request: AuthenticationRequest,
    timeout: Option<Duration>,
) -> Result<AuthenticationOutcome> {
    let (tx, rx) = oneshot::channel();
    let handle = CompletionHandle::new(move |outcome| {
        if tx.send(outcome).is_err() {
            tracing::debug!("Outcome arrived after the waiting task stopped listening");
        }
    });
    invoker::submit(platform, request, handle);

    let received = match timeout {
        Some(limit) => match tokio::time::timeout(limit, rx).await {
            Ok(received) => received,
            Err(_) => {
                tracing::debug!("Suspended wait gave up; the evaluation keeps running");
                return Err(Error::Timeout(TIMED_OUT_MESSAGE.to_string()));
            }
        },
        None => rx.await,
    };

    match received {
        Ok(outcome) => Ok(outcome),
        Err(_) => protocol_violation("completion handle abandoned while a task was suspended on it"),
    }
}
