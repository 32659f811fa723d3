use broom_core::{BackupInfo, PanelSnapshot, format_backup_time};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::Widget,
};

use super::layout::truncate;
use super::progress::spinner_char;
use super::theme::Theme;

/// Header widget showing title, registry source, threshold and backups
pub struct Header<'a> {
    snapshot: &'a PanelSnapshot,
    backups: &'a BackupInfo,
    source: &'a str,
    /// Spinner frame while a refresh is in flight
    refreshing: Option<usize>,
    theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(
        snapshot: &'a PanelSnapshot,
        backups: &'a BackupInfo,
        source: &'a str,
        theme: &'a Theme,
    ) -> Self {
        Self {
            snapshot,
            backups,
            source,
            refreshing: None,
            theme,
        }
    }

    pub fn refreshing(mut self, spinner_frame: Option<usize>) -> Self {
        self.refreshing = spinner_frame;
        self
    }

    fn status_text(&self) -> String {
        let status = format!(
            "Threshold: {}d │ Backup: auto {} · manual {}",
            self.snapshot.threshold_days,
            format_backup_time(self.backups.last_auto),
            format_backup_time(self.backups.last_manual),
        );
        match self.refreshing {
            Some(frame) => format!("{} {}", spinner_char(frame), status),
            None => status,
        }
    }
}

impl Widget for Header<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 1 {
            return;
        }

        let title_style = Style::default()
            .fg(self.theme.blue)
            .add_modifier(Modifier::BOLD);
        buf.set_string(area.x + 1, area.y, "BROOM", title_style);
        buf.set_string(
            area.x + 7,
            area.y,
            "─",
            Style::default().fg(self.theme.border),
        );

        let status = self.status_text();
        let status_len = status.chars().count() as u16;
        let max_source = area.width.saturating_sub(status_len + 12) as usize;
        buf.set_string(
            area.x + 9,
            area.y,
            truncate(self.source, max_source),
            Style::default().fg(self.theme.fg),
        );

        if status_len + 2 < area.width {
            let status_style = if self.refreshing.is_some() {
                Style::default().fg(self.theme.yellow)
            } else {
                Style::default().fg(self.theme.fg_dim)
            };
            buf.set_string(
                area.x + area.width - status_len - 1,
                area.y,
                &status,
                status_style,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broom_core::{CandidateStore, SelectionSet, SortState, StatusFilter, WorkflowState};

    fn row_text(buf: &Buffer, width: u16) -> String {
        (0..width).map(|x| buf[(x, 0)].symbol()).collect()
    }

    #[test]
    fn test_header_reads_threshold_from_snapshot() {
        let store = CandidateStore::new(14);
        let snapshot = PanelSnapshot::capture(
            &store,
            &SelectionSet::new(),
            &StatusFilter::All,
            SortState::default(),
            &WorkflowState::Idle,
        );
        let theme = Theme::default();
        let backups = BackupInfo::default();
        let area = Rect::new(0, 0, 100, 1);
        let mut buf = Buffer::empty(area);

        Header::new(&snapshot, &backups, "reg.json", &theme).render(area, &mut buf);

        let text = row_text(&buf, 100);
        assert!(text.contains("Threshold: 14d"));
        assert!(text.contains("auto never"));
        assert!(text.contains("reg.json"));
    }

    #[test]
    fn test_header_shows_spinner_while_refreshing() {
        let store = CandidateStore::new(0);
        let snapshot = PanelSnapshot::capture(
            &store,
            &SelectionSet::new(),
            &StatusFilter::All,
            SortState::default(),
            &WorkflowState::Idle,
        );
        let theme = Theme::default();
        let backups = BackupInfo::default();

        let header = Header::new(&snapshot, &backups, "reg.json", &theme).refreshing(Some(0));
        assert!(header.status_text().starts_with(spinner_char(0)));
    }
}
