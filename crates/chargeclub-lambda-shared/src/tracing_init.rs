//! Structured logging for the Lambda functions.
//!
//! Every event is written as one flat JSON object per line, which CloudWatch
//! Logs Insights can query by field (`request_id`, `total_init_ms`, ...).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the JSON subscriber.
///
/// `run` calls this before building [`LambdaRuntime`](crate::LambdaRuntime) so
/// the cold-start timings are logged. `RUST_LOG` selects the filter (`info`
/// when unset or unparseable). Installing twice keeps the first subscriber,
/// so handler tests may call it freely.
///
/// ```no_run
/// #[tokio::main]
/// async fn main() -> Result<(), lambda_runtime::Error> {
///     chargeclub_lambda_shared::init_tracing();
///     Ok(())
/// }
/// ```
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Span context is dropped; handlers put `request_id` on each event instead.
    let json = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false);

    let _ = tracing_subscriber::registry().with(filter).with(json).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_does_not_panic() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing initialized twice");
    }
}
