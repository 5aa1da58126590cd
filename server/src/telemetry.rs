// commerce_server/src/telemetry.rs

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` selects levels (default `info`);
/// `LOG_FORMAT=json` switches to JSON lines. Calling it twice is a no-op.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let json = std::env::var("LOG_FORMAT")
    .map(|v| v.eq_ignore_ascii_case("json"))
    .unwrap_or(false);

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);

  let result = if json {
    builder.json().try_init()
  } else {
    builder.try_init()
  };
  if let Err(e) = result {
    tracing::debug!(error = %e, "Tracing subscriber already installed.");
  }
}
