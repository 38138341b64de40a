//! Logging setup for binaries built on this crate.
//!
//! The library itself only emits `tracing` events. A binary calls [`init`]
//! once at startup to install a subscriber: journald when stderr is
//! connected to the systemd journal, otherwise a compact stderr formatter
//! filtered by `RUST_LOG` (default `info`).

use std::fmt;
use std::io::IsTerminal;

use time::OffsetDateTime;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    prelude::*,
    registry::LookupSpan,
};

pub mod prelude {
    #[allow(unused_imports)]
    pub use tracing::{debug, error, info, trace, warn};
}

const CRATE_PREFIX: &str = "urbit_channel::";

/// Install the process-wide subscriber.
pub fn init() {
    #[cfg(target_os = "linux")]
    {
        if journal::stderr_is_journal_stream() {
            match tracing_journald::layer() {
                Ok(layer) => {
                    tracing_subscriber::registry().with(layer).init();
                    return;
                }
                Err(e) => eprintln!("journald unavailable ({}), logging to stderr", e),
            }
        }
    }

    init_stderr(LevelFilter::INFO);
}

/// Log to stderr at `default_level`, unless `RUST_LOG` says otherwise.
pub fn init_stderr(default_level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let color = std::io::stderr().is_terminal();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(CompactFormat { color }),
        )
        .init();
}

#[cfg(target_os = "linux")]
mod journal {
    use std::env;
    use std::os::unix::io::AsRawFd;

    use nix::libc;

    /// True if `JOURNAL_STREAM` names the device and inode of our stderr.
    pub(super) fn stderr_is_journal_stream() -> bool {
        let Ok(value) = env::var("JOURNAL_STREAM") else {
            return false;
        };
        let Some((dev, ino)) = value.split_once(':') else {
            return false;
        };
        let (Ok(dev), Ok(ino)) = (dev.parse::<u64>(), ino.parse::<u64>()) else {
            return false;
        };

        let fd = std::io::stderr().as_raw_fd();
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut stat) } != 0 {
            return false;
        }

        stat.st_dev as u64 == dev && stat.st_ino as u64 == ino
    }
}

/// One line per event: time, level, short target, message, then fields.
struct CompactFormat {
    color: bool,
}

#[derive(Default)]
struct Fields {
    message: Option<String>,
    rest: Vec<(&'static str, String)>,
}

impl Visit for Fields {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.rest.push((field.name(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let value = format!("{:?}", value);
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.rest.push((field.name(), value));
        }
    }
}

fn short_target(target: &str) -> &str {
    target.strip_prefix(CRATE_PREFIX).unwrap_or(target)
}

impl<S, N> FormatEvent<S, N> for CompactFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = Fields::default();
        event.record(&mut fields);

        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let format = time::macros::format_description!("[hour]:[minute]:[second]");
        let timestamp = now.format(format).map_err(|_| fmt::Error)?;
        write!(writer, "{} ", timestamp)?;

        let level = *event.metadata().level();
        let label = match level {
            Level::ERROR => "ERROR",
            Level::WARN => "WARN ",
            Level::INFO => "INFO ",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
        };
        if self.color {
            let code = match level {
                Level::ERROR => 31,
                Level::WARN => 33,
                Level::INFO => 32,
                Level::DEBUG => 34,
                Level::TRACE => 35,
            };
            write!(writer, "\x1b[{}m{}\x1b[0m ", code, label)?;
        } else {
            write!(writer, "{} ", label)?;
        }

        write!(writer, "{}: ", short_target(event.metadata().target()))?;
        if let Some(message) = &fields.message {
            write!(writer, "{}", message)?;
        }
        for (name, value) in &fields.rest {
            write!(writer, " {}={}", name, value)?;
        }
        writeln!(writer)
    }
}
