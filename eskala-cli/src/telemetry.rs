use std::{
    env,
    sync::OnceLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

static TELEMETRY_ENABLED: OnceLock<bool> = OnceLock::new();

pub fn emit_success(op: &str, elapsed: Duration) {
    if !telemetry_enabled() {
        return;
    }
    eprintln!(
        "eskala_telemetry ts_unix_ms={} op={} status=ok duration_ms={}",
        unix_ms_now(),
        sanitize(op),
        elapsed.as_millis(),
    );
}

pub fn emit_failure(op: &str, elapsed: Duration, error: &str) {
    if !telemetry_enabled() {
        return;
    }
    eprintln!(
        "eskala_telemetry ts_unix_ms={} op={} status=error duration_ms={} error={}",
        unix_ms_now(),
        sanitize(op),
        elapsed.as_millis(),
        sanitize(error),
    );
}

fn telemetry_enabled() -> bool {
    *TELEMETRY_ENABLED.get_or_init(|| {
        let value = env::var("ESKALA_TELEMETRY").unwrap_or_default();
        parse_bool_flag(value.as_str())
    })
}

fn parse_bool_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn unix_ms_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0)
}

fn sanitize(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace(' ', "_")
}
