//! Gradient ASCII banner (NEWS DIGEST), figlet standard font.

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Ticker-tape green (#16a34a).
const MARKET_GREEN: (u8, u8, u8) = (0x16, 0xa3, 0x4a);
/// Headline amber (#f59e0b).
const HEADLINE_AMBER: (u8, u8, u8) = (0xf5, 0x9e, 0x0b);

/// Linear interpolation between two RGB colors. `t` in [0.0, 1.0].
fn lerp_rgb(a: (u8, u8, u8), b: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    let r = (f64::from(a.0) * (1.0 - t) + f64::from(b.0) * t).round() as u8;
    let g = (f64::from(a.1) * (1.0 - t) + f64::from(b.1) * t).round() as u8;
    let bl = (f64::from(a.2) * (1.0 - t) + f64::from(b.2) * t).round() as u8;
    (r, g, bl)
}

/// Banner art, or the plain title if the font cannot render it.
fn banner_art() -> String {
    FIGfont::standard()
        .ok()
        .and_then(|font| font.convert("NEWS DIGEST").map(|f| f.to_string()))
        .unwrap_or_else(|| "NEWS DIGEST".to_string())
}

/// Prints "NEWS DIGEST" with a green-to-amber gradient, then the version.
pub fn print_welcome() {
    let mut out = stdout();
    let art = banner_art();
    let lines: Vec<&str> = art.lines().collect();
    let total = lines.len().max(1);

    for (i, line) in lines.iter().enumerate() {
        let t = if total <= 1 {
            1.0
        } else {
            i as f64 / (total - 1) as f64
        };
        let (r, g, b) = lerp_rgb(MARKET_GREEN, HEADLINE_AMBER, t);
        let _ = out.execute(SetForegroundColor(Color::Rgb { r, g, b }));
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
        let _ = out.execute(ResetColor);
    }

    let _ = out.execute(Print(format!(
        "v{} · portfolio headlines & sentiment\r\n",
        env!("CARGO_PKG_VERSION")
    )));
    let _ = out.flush();
}
