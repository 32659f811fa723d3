use broom_core::Notice;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap},
};

use super::layout::centered_rect;
use super::theme::Theme;

/// Message box for workflow outcomes and load errors
pub struct NoticeView<'a> {
    notice: &'a Notice,
    remaining: usize,
    theme: &'a Theme,
}

impl<'a> NoticeView<'a> {
    /// `remaining` counts the notices queued behind this one
    pub fn new(notice: &'a Notice, remaining: usize, theme: &'a Theme) -> Self {
        Self {
            notice,
            remaining,
            theme,
        }
    }
}

impl Widget for NoticeView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dialog_area = centered_rect(56, 8, area);
        Clear.render(dialog_area, buf);

        let (title, color) = if self.notice.is_error() {
            (" Error ", self.theme.red)
        } else {
            (" Done ", self.theme.green)
        };
        let block = Block::default()
            .title(title)
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .style(Style::default().bg(self.theme.bg_surface))
            .padding(Padding::uniform(1));

        let inner = block.inner(dialog_area);
        block.render(dialog_area, buf);

        if inner.height < 2 {
            return;
        }

        let text_area = Rect::new(inner.x, inner.y, inner.width, inner.height - 1);
        Paragraph::new(self.notice.message())
            .style(Style::default().fg(self.theme.fg))
            .wrap(Wrap { trim: true })
            .render(text_area, buf);

        let hints_y = inner.y + inner.height - 1;
        buf.set_string(
            inner.x,
            hints_y,
            "[Enter]",
            Style::default()
                .fg(self.theme.green)
                .add_modifier(Modifier::BOLD),
        );
        buf.set_string(inner.x + 8, hints_y, "OK", Style::default().fg(self.theme.fg));
        if self.remaining > 0 {
            buf.set_string(
                inner.x + 12,
                hints_y,
                format!("({} more)", self.remaining),
                Style::default().fg(self.theme.fg_muted),
            );
        }
    }
}
