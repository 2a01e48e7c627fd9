/// Logging is opt-in: stdout stays clean for `--json` event streams, and
/// tracing-subscriber writes to stderr. `RUST_LOG` supplies the filter;
/// `CAMLINK_FLASHER_LOG` turns logging on at `info` without one.
pub fn init_tracing() {
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.trim().is_empty() => spec,
        _ => {
            if std::env::var_os("CAMLINK_FLASHER_LOG").is_none() {
                return;
            }
            "info".to_string()
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
