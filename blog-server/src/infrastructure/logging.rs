use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. Output is JSON unless `LOG_FORMAT=pretty`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blog_server=debug,sqlx=warn"));
    let pretty = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("pretty"));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let result = if pretty {
        tracing::subscriber::set_global_default(builder.pretty().finish())
    } else {
        tracing::subscriber::set_global_default(builder.json().finish())
    };
    if result.is_err() {
        tracing::debug!("global subscriber already installed");
    }
}
