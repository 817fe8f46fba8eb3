use crate::log::log_msg::Record;

/// Field separator of the default line layout.
pub const SEPARATOR: char = '|';

/// Turns a [`Record`] into the exact bytes appended to the sink, terminator included.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record<'_>) -> String;
}

impl<F> Formatter for F
where
    F: Fn(&Record<'_>) -> String + Send + Sync,
{
    fn format(&self, record: &Record<'_>) -> String {
        self(record)
    }
}

/// Default layout:
/// `level | timestamp | LABEL | text | file | line\n`, with `|` in the text
/// escaped as `\|`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeFormatter;

impl Formatter for PipeFormatter {
    fn format(&self, record: &Record<'_>) -> String {
        let text = escape_separator(record.text);
        let line = record.callsite.line_field();
        let fields: [&str; 6] = [
            record.level.as_str(),
            record.timestamp,
            record.label,
            text.as_str(),
            record.callsite.file_field(),
            line.as_str(),
        ];

        let sep = format!(" {SEPARATOR} ");
        let mut out = fields.join(sep.as_str());
        out.push('\n');
        out
    }
}

/// Escapes every separator in `text`. Not meant to be reversed.
#[must_use]
pub fn escape_separator(text: &str) -> String {
    text.replace(SEPARATOR, "\\|")
}
