use broom_core::{WorkflowState, pluralize_entities};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use super::layout::centered_rect;
use super::theme::Theme;

/// Braille spinner characters
const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub fn spinner_char(frame: usize) -> char {
    SPINNER[frame % SPINNER.len()]
}

/// Spinner overlay while waiting on the backend
pub struct ProgressView<'a> {
    workflow: &'a WorkflowState,
    spinner_frame: usize,
    theme: &'a Theme,
}

impl<'a> ProgressView<'a> {
    pub fn new(workflow: &'a WorkflowState, spinner_frame: usize, theme: &'a Theme) -> Self {
        Self {
            workflow,
            spinner_frame,
            theme,
        }
    }

    fn status_text(&self) -> String {
        match self.workflow {
            WorkflowState::BackupInProgress { .. } => "Creating backup...".to_string(),
            WorkflowState::Deleting { count } => {
                format!("Deleting {}...", pluralize_entities(*count))
            }
            _ => "Loading candidates...".to_string(),
        }
    }
}

impl Widget for ProgressView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dialog_area = centered_rect(44, 5, area);
        Clear.render(dialog_area, buf);

        let block = Block::default()
            .title(" Working ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.yellow))
            .style(Style::default().bg(self.theme.bg_surface))
            .padding(Padding::horizontal(1));

        let inner = block.inner(dialog_area);
        block.render(dialog_area, buf);

        if inner.height < 1 || inner.width < 10 {
            return;
        }

        let spinner_style = Style::default()
            .fg(self.theme.blue)
            .add_modifier(Modifier::BOLD);
        buf.set_string(
            inner.x,
            inner.y,
            spinner_char(self.spinner_frame).to_string(),
            spinner_style,
        );
        buf.set_string(
            inner.x + 2,
            inner.y,
            self.status_text(),
            Style::default().fg(self.theme.fg),
        );

        if self.workflow.is_pending() && inner.height > 2 {
            buf.set_string(
                inner.x,
                inner.y + 2,
                "Waiting for the registry to answer",
                Style::default().fg(self.theme.fg_muted),
            );
        }
    }
}
