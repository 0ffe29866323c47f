use std::{cell::Cell, fmt::Display};

use crate::terminal::colors;
use colored::*;
use console::measure_text_width;
use tracing::info;

/// Width of rules, headers and centred lines.
pub const TOTAL_WIDTH: usize = 64;

/// Target of events that are printed verbatim instead of logged.
pub const PRINT_TARGET: &str = "eqd2::print";

thread_local! {
    static KEY_WIDTH: Cell<usize> = const { Cell::new(0) }
}

#[macro_export]
macro_rules! tprint {
    () => {
        $crate::terminal::print::print("");
    };
    ($msg:expr) => {
        $crate::terminal::print::print($msg);
    };
}

pub fn print(msg: &str) {
    info!(target: "eqd2::print", raw_msg = msg);
}

/// `msg` centred on a rule of `fill`, measured by display width.
fn ruled(msg: &str, fill: &str) -> String {
    let pad = TOTAL_WIDTH.saturating_sub(measure_text_width(msg));
    let left = pad / 2;
    format!(
        "{}{}{}",
        fill.repeat(left).color(colors::SEPARATOR),
        msg,
        fill.repeat(pad - left).color(colors::SEPARATOR)
    )
}

pub fn banner(no_banner: bool, q_level: u8) {
    if no_banner || q_level > 0 {
        return;
    }
    let title = format!("⟦ EQD2 v{} ⟧", env!("CARGO_PKG_VERSION"))
        .color(colors::PRIMARY)
        .bold();
    print(&ruled(&title.to_string(), "═"));
    centerln(
        &"equivalent dose in 2 Gy fractions"
            .color(colors::SEPARATOR)
            .italic()
            .to_string(),
    );
}

pub fn header(msg: &str, q_level: u8) {
    if q_level > 0 {
        return;
    }
    let title = format!("⟦ {} ⟧", msg.to_uppercase()).color(colors::PRIMARY);
    print(&ruled(&title.to_string(), "─"));
}

pub fn fat_separator() {
    print(&"═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR).to_string());
}

/// Aligns subsequent [`aligned_line`] calls on the longest of `keys`.
pub fn set_key_width(keys: &[&str]) {
    KEY_WIDTH.set(keys.iter().map(|k| k.chars().count()).max().unwrap_or(0));
}

/// `> key.....: value`, padded to the width set by [`set_key_width`].
pub fn aligned_line(key: &str, value: impl Display) {
    let dots = ".".repeat((KEY_WIDTH.get() + 1).saturating_sub(key.chars().count()));
    print(&format!(
        "{} {}{} {}",
        ">".color(colors::SEPARATOR),
        key.color(colors::PRIMARY),
        format!("{dots}:").color(colors::SEPARATOR),
        value
    ));
}

pub fn tree_head(idx: usize, name: &str) {
    print(&format!(
        "{}{}{} {}",
        "[".color(colors::SEPARATOR),
        idx.to_string().color(colors::ACCENT),
        "]".color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    ));
}

/// One level of `├─ key..: value` lines, keys padded to the longest.
pub fn as_tree_one_level(entries: Vec<(String, ColoredString)>) {
    let width = entries.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let last = entries.len().saturating_sub(1);

    for (i, (key, value)) in entries.iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        let dots = ".".repeat(width + 1 - key.chars().count());
        print(&format!(
            " {} {}{} {}",
            branch.color(colors::SEPARATOR),
            key.color(colors::TEXT_DEFAULT),
            format!("{dots}:").color(colors::SEPARATOR),
            value
        ));
    }
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(measure_text_width(msg)) / 2);
    print(&format!("{space}{msg}"));
}

pub fn end_of_program(q_level: u8) {
    if q_level == 0 {
        fat_separator();
    }
}
