//! Request deadlines shared by every collaborator call in a run.

use std::future::Future;

use tokio::time::Instant;

/// Reason recorded for a call that outlived the request deadline.
pub(crate) const TIMEOUT: &str = "timeout";

/// Await `call`, giving up at `deadline`. Errors and timeouts collapse into
/// the message that ends up in the report.
pub(crate) async fn within<F, T, E>(deadline: Option<Instant>, call: F) -> Result<T, String>
where
  F: Future<Output = Result<T, E>>,
  E: std::error::Error,
{
  let result = match deadline {
    Some(at) => match tokio::time::timeout_at(at, call).await {
      Ok(result) => result,
      Err(_elapsed) => return Err(TIMEOUT.to_owned()),
    },
    None => call.await,
  };
  result.map_err(|e| e.to_string())
}
