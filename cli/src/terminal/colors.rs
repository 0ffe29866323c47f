use colored::Color;

pub const PRIMARY: Color = Color::TrueColor {
    r: 102,
    g: 204,
    b: 255,
};
pub const ACCENT: Color = Color::TrueColor {
    r: 255,
    g: 176,
    b: 59,
};
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;
pub const DOSE: Color = Color::BrightGreen;
pub const EQD2: Color = Color::BrightMagenta;
