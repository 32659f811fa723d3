use broom_core::PanelSnapshot;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use crate::app::AppMode;

use super::theme::Theme;

/// Footer widget showing keyboard hints and table counts
pub struct Footer<'a> {
    mode: AppMode,
    snapshot: &'a PanelSnapshot,
    deleted_total: usize,
    theme: &'a Theme,
}

impl<'a> Footer<'a> {
    pub fn new(
        mode: AppMode,
        snapshot: &'a PanelSnapshot,
        deleted_total: usize,
        theme: &'a Theme,
    ) -> Self {
        Self {
            mode,
            snapshot,
            deleted_total,
            theme,
        }
    }

    fn hints(&self) -> Vec<(&'static str, &'static str)> {
        match self.mode {
            AppMode::Loading | AppMode::Pending => vec![("q", "Quit")],
            AppMode::Browsing => vec![
                ("↑↓", "Navigate"),
                ("Space", "Select"),
                ("a", "All"),
                ("1-5", "Sort"),
                ("f", "Filter"),
                ("+/-", "Days"),
                ("d", "Delete"),
                ("?", "Help"),
                ("q", "Quit"),
            ],
            AppMode::Help => vec![("Esc", "Close help"), ("q", "Close help")],
            AppMode::Prompt => vec![("y", "Yes"), ("n", "No"), ("Esc", "Cancel")],
            AppMode::Notice => vec![("Enter", "OK"), ("q", "Quit")],
        }
    }
}

impl Widget for Footer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 1 {
            return;
        }

        // Counts on the right: "Total: N │ Shown: M │ Selected: K"
        let mut counts = format!(
            "Total: {} │ Shown: {} │ Selected: {}",
            self.snapshot.total,
            self.snapshot.visible.len(),
            self.snapshot.selection.len()
        );
        if self.deleted_total > 0 {
            counts = format!("Deleted: {} │ {}", self.deleted_total, counts);
        }
        let counts_len = counts.chars().count() as u16;
        let counts_x = area.x + area.width.saturating_sub(counts_len + 1);

        let key_style = Style::default()
            .fg(self.theme.fg)
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(self.theme.fg_dim);
        let sep_style = Style::default().fg(self.theme.border);

        let hints = self.hints();
        let mut x = area.x + 1;
        for (i, (key, desc)) in hints.iter().enumerate() {
            let needed = (key.chars().count() + desc.chars().count() + 1) as u16;
            if x + needed + 2 >= counts_x {
                break;
            }

            buf.set_string(x, area.y, *key, key_style);
            x += key.chars().count() as u16 + 1;
            buf.set_string(x, area.y, *desc, desc_style);
            x += desc.chars().count() as u16;

            if i < hints.len() - 1 {
                buf.set_string(x, area.y, " │ ", sep_style);
                x += 3;
            }
        }

        if counts_x > area.x {
            buf.set_string(
                counts_x,
                area.y,
                &counts,
                Style::default().fg(self.theme.green),
            );
        }
    }
}
