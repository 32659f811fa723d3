use std::io::{BufRead, Write};

use broom_core::{
    Backend, Candidate, CandidateStore, DeletionWorkflow, Notice, Operator, Prompt, SelectionSet,
    SortState, StatusFilter, WorkflowPhase, derive, format_days, visible_ids,
};
use color_eyre::Result;
use color_eyre::eyre::bail;
use tracing::info;

/// Answers workflow prompts from a line-oriented stream (stdin in practice)
pub struct LineOperator<R, W> {
    input: R,
    output: W,
    assume_yes: bool,
}

impl<R: BufRead, W: Write> LineOperator<R, W> {
    pub fn new(input: R, output: W, assume_yes: bool) -> Self {
        Self {
            input,
            output,
            assume_yes,
        }
    }
}

impl<R: BufRead, W: Write> Operator for LineOperator<R, W> {
    fn confirm(&mut self, prompt: &Prompt) -> bool {
        let _ = write!(self.output, "{} [y/N] ", prompt.message());
        if self.assume_yes {
            // --yes does not cover deleting after a failed backup
            let yes = !matches!(prompt, Prompt::BackupFailed { .. });
            let _ = writeln!(self.output, "{}", if yes { "y" } else { "n" });
            return yes;
        }
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            // EOF counts as "no"
            Ok(0) | Err(_) => {
                let _ = writeln!(self.output);
                false
            }
            Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
        }
    }

    fn notify(&mut self, notice: &Notice) {
        let _ = writeln!(self.output, "{}", notice.message());
    }
}

/// Render candidates as an aligned plain-text table
pub fn format_table(visible: &[&Candidate]) -> String {
    let headers = ["NAME", "ENTITY ID", "PLATFORM", "STATUS", "INACTIVE"];
    let rows: Vec<[String; 5]> = visible
        .iter()
        .map(|c| {
            [
                c.name.clone(),
                c.entity_id.clone(),
                c.platform.clone(),
                c.status.to_string(),
                format_days(c.days_unavailable),
            ]
        })
        .collect();

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: [&str; 5]| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = w))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };

    push_row(headers);
    for row in &rows {
        push_row([
            row[0].as_str(),
            row[1].as_str(),
            row[2].as_str(),
            row[3].as_str(),
            row[4].as_str(),
        ]);
    }
    out
}

fn fetch(backend: &dyn Backend, threshold_days: u32) -> Result<CandidateStore> {
    let mut store = CandidateStore::new(threshold_days);
    store.refresh(backend)?;
    Ok(store)
}

/// `--list`: print the filtered, sorted table
pub fn run_list(
    backend: &dyn Backend,
    threshold_days: u32,
    filter: &StatusFilter,
    sort: SortState,
    out: &mut impl Write,
) -> Result<()> {
    let store = fetch(backend, threshold_days)?;
    let visible = derive(store.candidates(), filter, sort);

    write!(out, "{}", format_table(&visible))?;
    writeln!(
        out,
        "\nTotal: {}  Shown: {}  (threshold {}d, filter {})",
        store.len(),
        visible.len(),
        threshold_days,
        filter
    )?;
    Ok(())
}

/// `--purge`: delete every candidate shown under `filter` through the
/// regular confirmation workflow
pub fn run_purge(
    backend: &dyn Backend,
    threshold_days: u32,
    filter: &StatusFilter,
    sort: SortState,
    operator: &mut dyn Operator,
    out: &mut impl Write,
) -> Result<WorkflowPhase> {
    let mut store = fetch(backend, threshold_days)?;

    let ids = {
        let visible = derive(store.candidates(), filter, sort);
        if visible.is_empty() {
            writeln!(out, "Nothing to clean up.")?;
            return Ok(WorkflowPhase::Idle);
        }
        write!(out, "{}", format_table(&visible))?;
        visible_ids(&visible)
    };

    let mut selection = SelectionSet::new();
    selection.select_all_visible(&ids);
    info!(count = selection.len(), %filter, "purge requested");

    let outcome =
        DeletionWorkflow::new().run(backend, operator, &mut store, &mut selection)?;
    match outcome {
        WorkflowPhase::Failed => bail!("deletion failed, registry left unchanged"),
        WorkflowPhase::Succeeded => {}
        _ => writeln!(out, "Nothing was deleted.")?,
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use broom_core::registry::{RegistryEntry, RegistryFile, load_registry, save_registry};
    use broom_core::{RegistryBackend, SortField, Status};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn setup() -> (TempDir, RegistryBackend) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registry.json");
        let entities = ["sensor.a", "sensor.b"]
            .into_iter()
            .map(|id| RegistryEntry {
                entity_id: id.to_string(),
                name: None,
                original_name: None,
                platform: "mqtt".to_string(),
                disabled: false,
                state: None,
                last_changed: None,
            })
            .collect();
        save_registry(&path, &RegistryFile { entities }).unwrap();
        let backend = RegistryBackend::new(path, temp.path().join("backups"));
        (temp, backend)
    }

    fn registry_len(backend: &RegistryBackend) -> usize {
        load_registry(backend.path()).unwrap().entities.len()
    }

    #[test]
    fn test_format_table_aligns() {
        let a = Candidate::new("sensor.a", "Kitchen", "zha", Status::orphaned(), 9999);
        let b = Candidate::new("light.b", "B", "hue", Status::unavailable(), 3);
        let table = format_table(&[&a, &b]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("NAME     ENTITY ID"));
        assert!(lines[1].ends_with("unknown"));
        assert!(lines[2].ends_with("3 days"));
    }

    #[test]
    fn test_line_operator_answers() {
        let mut out = Vec::new();
        let mut op = LineOperator::new(Cursor::new("yes\nn\n"), &mut out, false);
        let prompt = Prompt::OfferBackup { count: 2 };
        assert!(op.confirm(&prompt));
        assert!(!op.confirm(&prompt));
        // EOF
        assert!(!op.confirm(&prompt));
    }

    #[test]
    fn test_purge_with_yes_creates_backup() {
        let (temp, backend) = setup();
        let mut out = Vec::new();
        let mut op = LineOperator::new(Cursor::new(""), Vec::new(), true);

        let outcome = run_purge(
            &backend,
            0,
            &StatusFilter::All,
            SortState::by(SortField::EntityId),
            &mut op,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome, WorkflowPhase::Succeeded);
        assert_eq!(registry_len(&backend), 0);
        assert_eq!(
            std::fs::read_dir(temp.path().join("backups")).unwrap().count(),
            1
        );
    }

    #[test]
    fn test_purge_with_yes_aborts_when_backup_fails() {
        let (temp, _) = setup();
        // A regular file where the backup directory should be
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let backend = RegistryBackend::new(
            temp.path().join("registry.json"),
            blocker.join("backups"),
        );
        let mut out = Vec::new();
        let mut answers = Vec::new();
        let mut op = LineOperator::new(Cursor::new(""), &mut answers, true);

        let outcome = run_purge(
            &backend,
            0,
            &StatusFilter::All,
            SortState::default(),
            &mut op,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome, WorkflowPhase::Idle);
        assert_eq!(registry_len(&backend), 2);
        assert!(String::from_utf8(answers).unwrap().contains("anyway? [y/N] n"));
    }

    #[test]
    fn test_purge_declined_keeps_registry() {
        let (_temp, backend) = setup();
        let mut out = Vec::new();
        let mut op = LineOperator::new(Cursor::new("n\nn\n"), Vec::new(), false);

        let outcome = run_purge(
            &backend,
            0,
            &StatusFilter::All,
            SortState::default(),
            &mut op,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome, WorkflowPhase::Idle);
        assert_eq!(registry_len(&backend), 2);
        assert!(String::from_utf8(out).unwrap().contains("Nothing was deleted."));
    }

    #[test]
    fn test_purge_respects_filter() {
        let (_temp, backend) = setup();
        let mut out = Vec::new();
        let mut op = LineOperator::new(Cursor::new(""), Vec::new(), true);

        let outcome = run_purge(
            &backend,
            0,
            &StatusFilter::Only(Status::unavailable()),
            SortState::default(),
            &mut op,
            &mut out,
        )
        .unwrap();

        assert_eq!(outcome, WorkflowPhase::Idle);
        assert_eq!(registry_len(&backend), 2);
    }

    #[test]
    fn test_list_output() {
        let (_temp, backend) = setup();
        let mut out = Vec::new();
        run_list(&backend, 0, &StatusFilter::All, SortState::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("sensor.a"));
        assert!(text.contains("Total: 2  Shown: 2"));
    }
}
