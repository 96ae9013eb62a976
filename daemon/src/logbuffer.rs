//! Backs `GET /api/logs`: a small fixed-capacity ring of the
//! most recently formatted log lines, fed from inside `env_logger`'s own
//! format callback so every line that reaches stderr also lands here —
//! one log call site, two destinations, rather than a second logger.

use ::std::collections::VecDeque;
use ::std::sync::{Arc, Mutex};

const CAPACITY: usize = 500;

#[derive(Clone)]
pub struct LogRing {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl LogRing {
    pub fn new() -> Self {
        LogRing {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(CAPACITY))),
        }
    }

    pub fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap();
        if lines.len() == CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Oldest first, newest last.
    pub fn render(&self) -> String {
        let lines = self.lines.lock().unwrap();
        let mut out = String::new();
        for line in lines.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Installs `env_logger` with a format hook that mirrors every formatted
/// line into `ring` before writing it to stderr as usual. `log_level`, if
/// given, overrides `RUST_LOG` (and the `env_logger` default of `error`)
/// with a filter directive such as `debug` or `daemon=trace`.
pub fn init(ring: LogRing, log_level: Option<&str>) {
    use ::std::io::Write;
    let mut builder = ::env_logger::Builder::from_default_env();
    if let Some(level) = log_level {
        builder.parse_filters(level);
    }
    builder.format(move |buf, record| {
        let line = format!(
            "{} {:5} {}: {}",
            timestamp_secs(),
            record.level(),
            record.target(),
            record.args()
        );
        ring.push(line.clone());
        writeln!(buf, "{}", line)
    });
    builder.init();
}

/// A dependency-free timestamp good enough for a human-facing log line:
/// seconds since the Unix epoch. `env_logger`'s own default formatter
/// already timestamps stderr when no custom `format` is installed, but
/// installing one to capture the ring buffer means we format it
/// ourselves here too.
fn timestamp_secs() -> u64 {
    ::std::time::SystemTime::now()
        .duration_since(::std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_keeps_only_most_recent_lines() {
        let ring = LogRing::new();
        for i in 0..(CAPACITY + 10) {
            ring.push(format!("line {}", i));
        }
        let rendered = ring.render();
        assert!(!rendered.contains("line 0\n"));
        assert!(rendered.contains(&format!("line {}\n", CAPACITY + 9)));
    }

    #[test]
    fn render_is_oldest_first() {
        let ring = LogRing::new();
        ring.push("a".into());
        ring.push("b".into());
        assert_eq!(ring.render(), "a\nb\n");
    }
}
