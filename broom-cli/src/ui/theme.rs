use broom_core::{Candidate, Status};
use ratatui::style::Color;

/// Catppuccin Mocha-inspired dark theme with 24-bit RGB colors
pub struct Theme {
    // Base colors
    pub bg: Color,
    pub bg_surface: Color,
    pub bg_highlight: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub fg_muted: Color,

    // Accent colors
    pub blue: Color,
    pub green: Color,
    pub yellow: Color,
    pub red: Color,
    pub purple: Color,
    pub teal: Color,

    // UI elements
    pub border: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bg: Color::Rgb(30, 30, 46),           // Base
            bg_surface: Color::Rgb(49, 50, 68),   // Surface0
            bg_highlight: Color::Rgb(69, 71, 90), // Surface1
            fg: Color::Rgb(205, 214, 244),        // Text
            fg_dim: Color::Rgb(166, 173, 200),    // Subtext0
            fg_muted: Color::Rgb(127, 132, 156),  // Overlay0

            blue: Color::Rgb(137, 180, 250),   // Blue
            green: Color::Rgb(166, 227, 161),  // Green
            yellow: Color::Rgb(249, 226, 175), // Yellow
            red: Color::Rgb(243, 139, 168),    // Red
            purple: Color::Rgb(203, 166, 247), // Mauve
            teal: Color::Rgb(148, 226, 213),   // Teal

            border: Color::Rgb(88, 91, 112),         // Surface2
            selection_bg: Color::Rgb(137, 180, 250), // Blue
            selection_fg: Color::Rgb(30, 30, 46),    // Base
        }
    }
}

/// Days after which the age gradient is fully red
const STALE_DAYS: f64 = 90.0;

impl Theme {
    pub fn status_color(&self, status: &Status) -> Color {
        match status.as_str() {
            "orphaned" => self.red,
            "unavailable" => self.yellow,
            "unknown" => self.purple,
            _ => self.fg_dim,
        }
    }

    /// Color for the inactivity column: green when recent, red when old
    pub fn days_color(&self, candidate: &Candidate) -> Color {
        if candidate.is_duration_unknown() {
            return self.fg_muted;
        }
        let t = (candidate.days_unavailable as f64 / STALE_DAYS).min(1.0);
        if t < 0.5 {
            interpolate_color(self.green, self.yellow, t * 2.0)
        } else {
            interpolate_color(self.yellow, self.red, (t - 0.5) * 2.0)
        }
    }
}

/// Interpolate between two RGB colors
fn interpolate_color(from: Color, to: Color, t: f64) -> Color {
    match (from, to) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            Color::Rgb(lerp(r1, r2, t), lerp(g1, g2, t), lerp(b1, b2, t))
        }
        _ => to,
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    let a = a as f64;
    let b = b as f64;
    (a + (b - a) * t).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_color_endpoints() {
        let theme = Theme::default();
        let fresh = Candidate::new("a", "a", "p", Status::unavailable(), 0);
        let old = Candidate::new("b", "b", "p", Status::unavailable(), 400);
        let unknown = Candidate::new("c", "c", "p", Status::orphaned(), 9999);

        assert_eq!(theme.days_color(&fresh), theme.green);
        assert_eq!(theme.days_color(&old), theme.red);
        assert_eq!(theme.days_color(&unknown), theme.fg_muted);
    }
}
