use colored::*;

use crate::terminal::colors;

pub fn gy(dose: f64) -> ColoredString {
    format!("{dose:.3} Gy").color(colors::DOSE)
}

pub fn eqd2_gy(dose: f64) -> ColoredString {
    format!("{dose:.3} Gy").color(colors::EQD2).bold()
}

pub fn factor(value: f64) -> ColoredString {
    format!("{value:.6}").color(colors::ACCENT)
}

/// Signed deviation from 1 in percent, e.g. `-0.426 %`.
pub fn deviation_percent(factor: f64) -> ColoredString {
    let percent = (factor - 1.0) * 100.0;
    let text = format!("{percent:+.3} %");
    if percent.abs() > 1.0 {
        text.yellow().bold()
    } else {
        text.normal()
    }
}

pub fn optional(value: &str) -> ColoredString {
    if value.is_empty() {
        "-".color(colors::SEPARATOR)
    } else {
        value.normal()
    }
}
