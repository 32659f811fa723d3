use broom_core::Prompt;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Widget, Wrap},
};

use super::layout::centered_rect;
use super::theme::Theme;

/// Yes/no dialog for the deletion workflow
pub struct PromptView<'a> {
    prompt: &'a Prompt,
    theme: &'a Theme,
}

impl<'a> PromptView<'a> {
    pub fn new(prompt: &'a Prompt, theme: &'a Theme) -> Self {
        Self { prompt, theme }
    }

    fn answers(&self) -> [(&'static str, &'static str); 3] {
        match self.prompt {
            Prompt::OfferBackup { .. } => [
                ("[y]", "Backup & delete"),
                ("[n]", "No backup"),
                ("[Esc]", "Cancel"),
            ],
            Prompt::ConfirmWithoutBackup { .. } => {
                [("[y]", "Delete"), ("[n]", "Cancel"), ("", "")]
            }
            Prompt::BackupFailed { .. } => {
                [("[y]", "Delete anyway"), ("[n]", "Cancel"), ("", "")]
            }
        }
    }
}

impl Widget for PromptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dialog_area = centered_rect(56, 10, area);
        Clear.render(dialog_area, buf);

        let border = match self.prompt {
            Prompt::OfferBackup { .. } => self.theme.yellow,
            _ => self.theme.red,
        };
        let block = Block::default()
            .title(format!(" {} ", self.prompt.title()))
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .style(Style::default().bg(self.theme.bg_surface))
            .padding(Padding::uniform(1));

        let inner = block.inner(dialog_area);
        block.render(dialog_area, buf);

        if inner.height < 2 {
            return;
        }

        let text_area = Rect::new(inner.x, inner.y, inner.width, inner.height - 1);
        Paragraph::new(self.prompt.message())
            .style(Style::default().fg(self.theme.fg))
            .wrap(Wrap { trim: true })
            .render(text_area, buf);

        let key_style = Style::default()
            .fg(self.theme.green)
            .add_modifier(Modifier::BOLD);
        let text_style = Style::default().fg(self.theme.fg);
        let hints_y = inner.y + inner.height - 1;
        let mut x = inner.x;
        for (key, label) in self.answers() {
            if key.is_empty() {
                continue;
            }
            buf.set_string(x, hints_y, key, key_style);
            x += key.len() as u16 + 1;
            buf.set_string(x, hints_y, label, text_style);
            x += label.len() as u16 + 2;
        }
    }
}
