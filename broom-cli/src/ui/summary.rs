use broom_core::{PanelSnapshot, StatusFilter};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use super::theme::Theme;

/// One-line summary of the active filter and sort order
pub struct SummaryBar<'a> {
    snapshot: &'a PanelSnapshot,
    theme: &'a Theme,
}

impl<'a> SummaryBar<'a> {
    pub fn new(snapshot: &'a PanelSnapshot, theme: &'a Theme) -> Self {
        Self { snapshot, theme }
    }
}

impl Widget for SummaryBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 1 {
            return;
        }

        let label_style = Style::default().fg(self.theme.fg_muted);
        let value_style = Style::default()
            .fg(self.theme.teal)
            .add_modifier(Modifier::BOLD);

        let mut x = area.x + 1;
        buf.set_string(x, area.y, "Filter:", label_style);
        x += 8;
        let filter = self.snapshot.filter.to_string();
        let filter_style = match &self.snapshot.filter {
            StatusFilter::All => value_style,
            StatusFilter::Only(status) => value_style.fg(self.theme.status_color(status)),
        };
        buf.set_string(x, area.y, &filter, filter_style);
        x += filter.chars().count() as u16 + 3;

        buf.set_string(x, area.y, "Sort:", label_style);
        x += 6;
        let sort = format!(
            "{} {}",
            self.snapshot.sort.field.label(),
            self.snapshot.sort.direction.arrow()
        );
        buf.set_string(x, area.y, &sort, value_style);
        x += sort.chars().count() as u16 + 3;

        let hidden = self.snapshot.selected_outside_view();
        if hidden > 0 && x + 30 < area.x + area.width {
            buf.set_string(
                x,
                area.y,
                format!("{} selected outside this filter", hidden),
                Style::default().fg(self.theme.yellow),
            );
        }
    }
}
