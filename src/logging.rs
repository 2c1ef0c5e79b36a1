use chrono::Local;
use colored::*;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Event formatter for the soak harness output.
///
/// Each line starts with a dimmed wall clock time, so interval reports can be
/// lined up with poller ticks, followed by the event fields colored by level.
/// Warnings and errors also get a level marker since they usually mean a
/// poller fell behind or the counts did not reconcile.
pub struct ColorizedFormatter;

impl<S, N> FormatEvent<S, N> for ColorizedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut buffer = String::new();
        ctx.format_fields(Writer::new(&mut buffer), event)?;

        let level = *event.metadata().level();
        let line = match level {
            Level::ERROR => format!("ERROR {}", buffer).red().bold(),
            Level::WARN => format!("WARN  {}", buffer).yellow(),
            Level::INFO => buffer.white(),
            Level::DEBUG => buffer.blue(),
            Level::TRACE => buffer.purple(),
        };

        let time = Local::now().format("%H:%M:%S%.3f").to_string();
        writeln!(writer, "{} {}", time.dimmed(), line)
    }
}
