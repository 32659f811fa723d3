use broom_core::{PanelSnapshot, SortField, format_days};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use super::layout::truncate;
use super::theme::Theme;

const CHECK_WIDTH: u16 = 4;
const PLATFORM_WIDTH: u16 = 14;
const STATUS_WIDTH: u16 = 13;
const DAYS_WIDTH: u16 = 10;

/// Column x offsets and widths for a given table width
struct Columns {
    name: (u16, u16),
    entity_id: (u16, u16),
    platform: (u16, u16),
    status: (u16, u16),
    days: (u16, u16),
}

impl Columns {
    fn new(width: u16) -> Self {
        let fixed = CHECK_WIDTH + PLATFORM_WIDTH + STATUS_WIDTH + DAYS_WIDTH;
        let flexible = width.saturating_sub(fixed);
        let name_width = flexible * 2 / 5;
        let id_width = flexible - name_width;

        let name_x = CHECK_WIDTH;
        let id_x = name_x + name_width;
        let platform_x = id_x + id_width;
        let status_x = platform_x + PLATFORM_WIDTH;
        let days_x = status_x + STATUS_WIDTH;
        Self {
            name: (name_x, name_width),
            entity_id: (id_x, id_width),
            platform: (platform_x, PLATFORM_WIDTH),
            status: (status_x, STATUS_WIDTH),
            days: (days_x, DAYS_WIDTH),
        }
    }

    fn for_field(&self, field: SortField) -> (u16, u16) {
        match field {
            SortField::Name => self.name,
            SortField::EntityId => self.entity_id,
            SortField::Platform => self.platform,
            SortField::Status => self.status,
            SortField::DaysUnavailable => self.days,
        }
    }
}

/// Candidate table with selection checkboxes and sortable columns
pub struct CandidateTable<'a> {
    snapshot: &'a PanelSnapshot,
    selected_index: usize,
    scroll_offset: usize,
    loaded: bool,
    theme: &'a Theme,
}

impl<'a> CandidateTable<'a> {
    pub fn new(
        snapshot: &'a PanelSnapshot,
        selected_index: usize,
        scroll_offset: usize,
        loaded: bool,
        theme: &'a Theme,
    ) -> Self {
        Self {
            snapshot,
            selected_index,
            scroll_offset,
            loaded,
            theme,
        }
    }

    /// Rows available for candidates once the column header is drawn
    pub fn body_height(area: Rect) -> usize {
        area.height.saturating_sub(1) as usize
    }

    fn render_header(&self, cols: &Columns, area: Rect, buf: &mut Buffer) {
        let style = Style::default()
            .fg(self.theme.fg_dim)
            .bg(self.theme.bg_surface)
            .add_modifier(Modifier::BOLD);
        for x in 0..area.width {
            buf.set_string(area.x + x, area.y, " ", style);
        }

        let checkbox = if self.snapshot.all_visible_selected {
            "[x]"
        } else {
            "[ ]"
        };
        buf.set_string(area.x, area.y, checkbox, style);

        for field in SortField::ALL {
            let (x, width) = cols.for_field(field);
            let mut label = field.label().to_string();
            let field_style = if self.snapshot.sort.field == field {
                label.push(' ');
                label.push_str(self.snapshot.sort.direction.arrow());
                style.fg(self.theme.blue)
            } else {
                style
            };
            buf.set_string(
                area.x + x,
                area.y,
                truncate(&label, width.saturating_sub(1) as usize),
                field_style,
            );
        }
    }
}

impl Widget for CandidateTable<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 2 || area.width < 40 {
            return;
        }

        let cols = Columns::new(area.width);
        self.render_header(&cols, area, buf);

        let body = Rect::new(area.x, area.y + 1, area.width, area.height - 1);
        if self.snapshot.visible.is_empty() {
            let msg = if !self.loaded {
                "No candidates loaded (r to retry)"
            } else if self.snapshot.total > 0 {
                "No candidates match this filter"
            } else {
                "Nothing to clean up"
            };
            let x = body.x + (body.width.saturating_sub(msg.len() as u16)) / 2;
            let y = body.y + body.height / 2;
            buf.set_string(x, y, msg, Style::default().fg(self.theme.fg_dim));
            return;
        }

        for (i, candidate) in self
            .snapshot
            .visible
            .iter()
            .skip(self.scroll_offset)
            .take(body.height as usize)
            .enumerate()
        {
            let y = body.y + i as u16;
            let is_cursor = i + self.scroll_offset == self.selected_index;
            let is_selected = self.snapshot.is_selected(&candidate.entity_id);

            let bg = if is_cursor {
                self.theme.selection_bg
            } else if is_selected {
                self.theme.bg_highlight
            } else {
                self.theme.bg
            };
            let cell = |color: Color| {
                if is_cursor {
                    Style::default().bg(bg).fg(self.theme.selection_fg)
                } else {
                    Style::default().bg(bg).fg(color)
                }
            };

            // Clear the row
            for x in 0..body.width {
                buf.set_string(body.x + x, y, " ", cell(self.theme.fg));
            }

            let checkbox = if is_selected { "[x]" } else { "[ ]" };
            buf.set_string(body.x, y, checkbox, cell(self.theme.purple));

            let text_cells = [
                (cols.name, candidate.name.as_str(), self.theme.fg),
                (cols.entity_id, candidate.entity_id.as_str(), self.theme.fg_dim),
                (cols.platform, candidate.platform.as_str(), self.theme.fg_muted),
                (
                    cols.status,
                    candidate.status.as_str(),
                    self.theme.status_color(&candidate.status),
                ),
            ];
            for ((x, width), text, color) in text_cells {
                buf.set_string(
                    body.x + x,
                    y,
                    truncate(text, width.saturating_sub(1) as usize),
                    cell(color),
                );
            }

            let (days_x, days_width) = cols.days;
            let days = format!(
                "{:>width$}",
                format_days(candidate.days_unavailable),
                width = days_width.saturating_sub(1) as usize
            );
            buf.set_string(
                body.x + days_x,
                y,
                &days,
                cell(self.theme.days_color(candidate)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_fill_width() {
        let cols = Columns::new(100);
        assert_eq!(cols.days.0 + cols.days.1, 100);
        assert!(cols.entity_id.1 >= cols.name.1);
    }
}
