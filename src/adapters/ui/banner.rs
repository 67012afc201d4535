//! Gradient ASCII banner (BIOMATHFORGE).

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Deep teal (#006d77).
const DEEP_TEAL: (u8, u8, u8) = (0x00, 0x6d, 0x77);
/// Enzyme green (#83e377).
const ENZYME_GREEN: (u8, u8, u8) = (0x83, 0xe3, 0x77);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Banner art, or the plain title when the built-in font cannot render it.
fn banner_art(title: &str) -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert(title).map(|figure| figure.to_string()))
        .unwrap_or_else(|| title.to_string())
}

/// Prints "BIOMATHFORGE" with a teal to green gradient, then the version line.
pub fn print_welcome() {
    let mut out = stdout();
    let art = banner_art("BIOMATHFORGE");
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(DEEP_TEAL, ENZYME_GREEN, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let (r, g, b) = ENZYME_GREEN;
    let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
    let _ = out.execute(Print(format!(
        "v{}  reaction network generation\r\n",
        env!("CARGO_PKG_VERSION")
    )));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
