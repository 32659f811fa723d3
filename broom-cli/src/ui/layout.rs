use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main application layout
pub struct AppLayout {
    pub header: Rect,
    pub summary: Rect,
    pub table: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Length(1), // Filter/sort summary
                Constraint::Min(5),    // Candidate table
                Constraint::Length(1), // Footer
            ])
            .split(area);

        Self {
            header: chunks[0],
            summary: chunks[1],
            table: chunks[2],
            footer: chunks[3],
        }
    }
}

/// Centered dialog rectangle of at most `width` x `height`
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(4));
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Shorten `s` to `max` characters, ending in "…" when cut
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("sensor.kitchen", 20), "sensor.kitchen");
        assert_eq!(truncate("sensor.kitchen", 7), "sensor…");
        assert_eq!(truncate("Küche", 3), "Kü…");
        assert_eq!(truncate("abc", 0), "");
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 30, 10);
        let r = centered_rect(60, 9, area);
        assert_eq!(r.width, 26);
        assert_eq!(r.height, 6);
        assert_eq!(r.x, 2);
    }
}
