//! Human-readable elapsed time for alert payloads.

use std::time::Duration;

/// Render a duration compactly, largest unit first.
///
/// Sub-second durations are shown in milliseconds (`850ms`), longer ones as
/// hours, minutes and seconds with zero components dropped (`1h2m`, `5m3s`,
/// `12.5s`). Fractional seconds keep one decimal and only below a minute.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_ms = elapsed.as_millis();
    if total_ms < 1_000 {
        return format!("{total_ms}ms");
    }

    let total_secs = elapsed.as_secs();
    if total_secs < 60 {
        let tenths = (elapsed.subsec_millis() / 100) as u64;
        return if tenths == 0 {
            format!("{total_secs}s")
        } else {
            format!("{total_secs}.{tenths}s")
        };
    }

    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    out
}
