mod candidate_table;
mod footer;
mod header;
mod help;
mod layout;
mod notice;
mod progress;
mod prompt;
mod summary;
mod theme;

pub use candidate_table::CandidateTable;
pub use footer::Footer;
pub use header::Header;
pub use help::HelpView;
pub use layout::AppLayout;
pub use notice::NoticeView;
pub use progress::ProgressView;
pub use prompt::PromptView;
pub use summary::SummaryBar;
pub use theme::Theme;
