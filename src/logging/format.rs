use colored::{Color, Colorize};
use std::fmt;
use std::fmt::Debug;
use std::fmt::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

/// One line per event: time, level, target, request trace id, message, fields.
pub(super) struct Formatter {
    use_colors: bool,
}

impl Formatter {
    pub(super) fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }
}

impl<S, N> FormatEvent<S, N> for Formatter
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
        let meta = event.metadata();
        let now = chrono::Local::now();
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut target = meta.target().replace("device_registry", "registry");
        let mut span_fields = String::new();
        for span in ctx
            .event_scope()
            .into_iter()
            .flat_map(tracing_subscriber::registry::Scope::from_root)
        {
            let exts = span.extensions();
            let Some(fields) = exts.get::<FormattedFields<N>>() else {
                continue;
            };
            if fields.is_empty() {
                continue;
            }
            if let Some(trace_id) = fields.strip_prefix("trace_id=") {
                target.push('@');
                target.push_str(trace_id);
                continue;
            }
            span_fields.push(if span_fields.is_empty() { '{' } else { ' ' });
            span_fields.push_str(fields);
        }
        if !span_fields.is_empty() {
            span_fields.push('}');
        }

        if self.use_colors {
            write!(
                writer,
                "[{} {}] {} {}{}",
                now.format("%X%.3f").to_string().bright_black(),
                level_label(meta.level()).color(level_color(meta.level())),
                format!("{target}{span_fields}:").bright_black(),
                visitor.message,
                visitor.fields
            )?;
        } else {
            write!(
                writer,
                "{} {}{} {} {}{}",
                now.format("%F %X%.3f"),
                target,
                span_fields,
                level_label(meta.level()),
                visitor.message,
                visitor.fields
            )?;
        }
        writeln!(writer)
    }
}

fn level_label(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "ERR",
        Level::WARN => "WRN",
        Level::INFO => "INF",
        Level::DEBUG => "DBG",
        Level::TRACE => "TRC",
    }
}

fn level_color(level: &Level) -> Color {
    match *level {
        Level::ERROR => Color::BrightRed,
        Level::WARN => Color::BrightYellow,
        Level::INFO => Color::BrightBlue,
        Level::DEBUG => Color::BrightMagenta,
        Level::TRACE => Color::BrightWhite,
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: String,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            write!(self.fields, " {}={}", field.name(), value).ok();
        }
    }
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            write!(self.message, "{:?}", value).ok();
        } else {
            write!(self.fields, " {}={:?}", field.name(), value).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_labels() {
        assert_eq!(level_label(&Level::ERROR), "ERR");
        assert_eq!(level_label(&Level::TRACE), "TRC");
        assert_eq!(level_color(&Level::WARN), Color::BrightYellow);
    }
}
