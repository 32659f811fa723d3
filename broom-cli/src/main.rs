mod app;
mod headless;
mod logging;
mod tui;
mod ui;

use std::io::{self, stdout};
use std::path::PathBuf;
use std::sync::Arc;

use broom_core::{Config, RegistryBackend, SortField, SortState, StatusFilter};
use clap::Parser;
use color_eyre::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, style::Style, widgets::Widget};
use tracing::info;

use app::{Action, AppMode, AppState};
use headless::LineOperator;
use tui::{AppEvent, EventHandler, handle_key};
use ui::{
    AppLayout, CandidateTable, Footer, Header, HelpView, NoticeView, ProgressView, PromptView,
    SummaryBar, Theme,
};

/// BROOM - review and bulk-remove stale registry entities
#[derive(Parser, Debug)]
#[command(name = "broom")]
#[command(about = "Review and bulk-remove orphaned or unavailable entities from an entity registry")]
#[command(version)]
struct Args {
    /// Registry file to clean (overrides config)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Directory for automatic backups (overrides config)
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Minimum days an entity must be unavailable
    #[arg(short, long)]
    threshold: Option<u32>,

    /// Initial status filter: "all" or a status such as "orphaned"
    #[arg(long, default_value = "all")]
    status: StatusFilter,

    /// Initial sort column: name, entity-id, platform, status or days
    #[arg(long)]
    sort: Option<SortField>,

    /// Print the candidate table and exit
    #[arg(long, conflicts_with = "purge")]
    list: bool,

    /// Delete every candidate shown under --status, confirming on stdin
    #[arg(long)]
    purge: bool,

    /// Answer yes to the purge prompts; a failed backup still aborts the purge
    #[arg(long, requires = "purge")]
    yes: bool,

    /// Config file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log to stderr instead of the log file (list/purge only)
    #[arg(long)]
    log_stderr: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let headless = args.list || args.purge;
    let _log_guard = logging::init_logging(args.log_stderr && headless);

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let registry = args.registry.clone().unwrap_or(config.registry_path);
    let backup_dir = args.backup_dir.clone().unwrap_or(config.backup_dir);
    let threshold = args.threshold.unwrap_or(config.threshold_days);
    let sort = SortState::by(args.sort.unwrap_or(config.default_sort));

    // Validate registry
    if !registry.is_file() {
        eprintln!("Error: Registry file does not exist: {}", registry.display());
        std::process::exit(1);
    }

    info!(
        registry = %registry.display(),
        backup_dir = %backup_dir.display(),
        threshold,
        "starting"
    );
    let backend = RegistryBackend::new(registry.clone(), backup_dir);

    if args.list {
        return headless::run_list(&backend, threshold, &args.status, sort, &mut stdout());
    }
    if args.purge {
        let mut operator = LineOperator::new(io::stdin().lock(), stdout(), args.yes);
        headless::run_purge(
            &backend,
            threshold,
            &args.status,
            sort,
            &mut operator,
            &mut stdout(),
        )?;
        return Ok(());
    }

    let mut state = AppState::new(Arc::new(backend), threshold, sort, args.status.clone());
    let source = registry.display().to_string();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run app
    let result = run_app(&mut terminal, &mut state, &source, config.tick_rate_ms);

    // Restore terminal
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    if state.deleted_total > 0 {
        println!("Removed {} this session.", broom_core::pluralize_entities(state.deleted_total));
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    source: &str,
    tick_rate_ms: u64,
) -> Result<()> {
    let theme = Theme::default();
    let event_handler = EventHandler::new(tick_rate_ms);
    state.start();

    loop {
        // Fold in finished background calls
        state.poll();

        let mode = state.mode();
        terminal.draw(|frame| {
            let area = frame.area();
            let layout = AppLayout::new(area);

            // Background
            frame
                .buffer_mut()
                .set_style(area, Style::default().bg(theme.bg));

            // Update visible height for scrolling
            state.visible_height = CandidateTable::body_height(layout.table);

            Header::new(&state.snapshot, &state.backup_info, source, &theme)
                .refreshing(state.is_refreshing().then_some(state.spinner_frame))
                .render(layout.header, frame.buffer_mut());
            SummaryBar::new(&state.snapshot, &theme).render(layout.summary, frame.buffer_mut());
            CandidateTable::new(
                &state.snapshot,
                state.selected_index,
                state.scroll_offset,
                state.store.is_loaded(),
                &theme,
            )
            .render(layout.table, frame.buffer_mut());

            // Overlays
            match mode {
                AppMode::Help => HelpView::new(&theme).render(area, frame.buffer_mut()),
                AppMode::Prompt => {
                    if let Some(prompt) = state.workflow_state().prompt() {
                        PromptView::new(&prompt, &theme).render(area, frame.buffer_mut());
                    }
                }
                AppMode::Loading | AppMode::Pending => {
                    ProgressView::new(state.workflow_state(), state.spinner_frame, &theme)
                        .render(area, frame.buffer_mut());
                }
                AppMode::Notice => {
                    if let Some(notice) = state.notices.front() {
                        NoticeView::new(notice, state.notices.len() - 1, &theme)
                            .render(area, frame.buffer_mut());
                    }
                }
                AppMode::Browsing => {}
            }

            Footer::new(mode, &state.snapshot, state.deleted_total, &theme)
                .render(layout.footer, frame.buffer_mut());
        })?;

        // Handle events
        match event_handler.next()? {
            AppEvent::Key(key) => {
                let action = handle_key(key, state.mode());
                handle_action(state, action);
            }
            AppEvent::Resize => {
                // Terminal will redraw on next loop
            }
            AppEvent::Tick => {
                if state.is_busy() {
                    state.tick_spinner();
                }
            }
        }

        if state.should_quit {
            break;
        }
    }

    info!(deleted = state.deleted_total, "exiting");
    Ok(())
}

fn handle_action(state: &mut AppState, action: Action) {
    match action {
        Action::MoveUp => state.move_up(),
        Action::MoveDown => state.move_down(),
        Action::PageUp => state.page_up(),
        Action::PageDown => state.page_down(),
        Action::GoToFirst => state.go_to_first(),
        Action::GoToLast => state.go_to_last(),
        Action::ToggleSelect => state.toggle_select(),
        Action::ToggleSelectAll => state.toggle_select_all(),
        Action::SortBy(field) => state.sort_by(field),
        Action::NextFilter => state.cycle_filter(true),
        Action::PrevFilter => state.cycle_filter(false),
        Action::IncreaseThreshold => state.adjust_threshold(1),
        Action::DecreaseThreshold => state.adjust_threshold(-1),
        Action::Refresh => state.request_refresh(),
        Action::Delete => state.request_delete(),
        Action::Yes => state.answer(true),
        Action::No => state.answer(false),
        Action::CancelPrompt => state.cancel_prompt(),
        Action::DismissNotice => state.dismiss_notice(),
        Action::ShowHelp => state.show_help(),
        Action::HideHelp => state.hide_help(),
        Action::Quit => state.quit(),
        Action::Tick => {}
    }
}
