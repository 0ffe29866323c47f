use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} [{bar:32.green/bright_black}] {pos:>3}%")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICKS)
        .progress_chars("█▆▁")
}

/// Span that carries the conversion progress bar.
///
/// The bar is drawn while the span is entered and disappears once the span
/// is closed, so holding the entered guard in a scope is enough to release it
/// on every exit path.
pub fn conversion_span(plan_id: &str) -> Span {
    let span = info_span!("conversion", indicatif.pb_show = true);
    span.pb_set_style(&bar_style());
    span.pb_set_length(100);
    span.pb_set_message(&format!("Converting {plan_id}"));
    span
}

pub fn report_conversion_progress(span: &Span, percent: u8) {
    span.pb_set_position(u64::from(percent));
}

pub fn finish(span: &Span) {
    span.pb_set_position(100);
}
