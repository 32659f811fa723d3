//! Pure derivation of the visible, ordered candidate sequence.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::BroomError;
use crate::candidate::{Candidate, Status};

/// Sortable candidate attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    Name,
    EntityId,
    Platform,
    Status,
    #[serde(alias = "days")]
    DaysUnavailable,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Name,
        SortField::EntityId,
        SortField::Platform,
        SortField::Status,
        SortField::DaysUnavailable,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::EntityId => "Entity ID",
            SortField::Platform => "Integration",
            SortField::Status => "Status",
            SortField::DaysUnavailable => "Inactive",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, SortField::DaysUnavailable)
    }

    /// Direction applied when switching to this field: A→Z for text,
    /// longest-inactive first for durations
    pub fn default_direction(&self) -> SortDirection {
        if self.is_numeric() {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }

    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        match self {
            SortField::Name => compare_text(&a.name, &b.name),
            SortField::EntityId => compare_text(&a.entity_id, &b.entity_id),
            SortField::Platform => compare_text(&a.platform, &b.platform),
            SortField::Status => compare_text(a.status.as_str(), b.status.as_str()),
            SortField::DaysUnavailable => a.days_unavailable.cmp(&b.days_unavailable),
        }
    }
}

impl FromStr for SortField {
    type Err = BroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "entity-id" | "entity_id" | "id" => Ok(SortField::EntityId),
            "platform" | "integration" => Ok(SortField::Platform),
            "status" => Ok(SortField::Status),
            "days" | "days-unavailable" | "days_unavailable" => Ok(SortField::DaysUnavailable),
            other => Err(BroomError::Config(format!("unknown sort field: {}", other))),
        }
    }
}

/// Case-insensitive lexicographic comparison without allocating
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Active sort field and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::DaysUnavailable,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    /// Start sorted by `field` in its default direction
    pub fn by(field: SortField) -> Self {
        Self {
            field,
            direction: field.default_direction(),
        }
    }

    /// Handle an explicit sort request: the active field toggles direction,
    /// a new field starts in its default direction
    pub fn request(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = field.default_direction();
        }
    }
}

/// Status filter: everything, or one concrete status
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    pub fn matches(&self, candidate: &Candidate) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => candidate.status == *status,
        }
    }

    /// Keep the filter if its status still occurs in `candidates`, else fall back to `All`
    pub fn revalidated(&self, candidates: &[Candidate]) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::All,
            StatusFilter::Only(status) => {
                if candidates.iter().any(|c| c.status == *status) {
                    self.clone()
                } else {
                    StatusFilter::All
                }
            }
        }
    }

    /// The filter options offered for `candidates`: `All` first, then each status
    pub fn options(candidates: &[Candidate]) -> Vec<StatusFilter> {
        let mut options = vec![StatusFilter::All];
        options.extend(available_statuses(candidates).into_iter().map(StatusFilter::Only));
        options
    }

    /// Step through the options for `candidates`, wrapping around
    pub fn cycled(&self, candidates: &[Candidate], forward: bool) -> StatusFilter {
        let options = Self::options(candidates);
        let len = options.len();
        let pos = options.iter().position(|o| o == self).unwrap_or(0);
        let next = if forward {
            (pos + 1) % len
        } else {
            (pos + len - 1) % len
        };
        options[next].clone()
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = BroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(BroomError::Config("empty status filter".to_string())),
            "all" => Ok(StatusFilter::All),
            other => Ok(StatusFilter::Only(Status::new(other))),
        }
    }
}

/// Distinct statuses in first-seen order
pub fn available_statuses(candidates: &[Candidate]) -> Vec<Status> {
    let mut statuses: Vec<Status> = Vec::new();
    for candidate in candidates {
        if !statuses.contains(&candidate.status) {
            statuses.push(candidate.status.clone());
        }
    }
    statuses
}

/// Filter then stable-sort `candidates`.
///
/// Equal keys keep their relative input order in either direction.
pub fn derive<'a>(
    candidates: &'a [Candidate],
    filter: &StatusFilter,
    sort: SortState,
) -> Vec<&'a Candidate> {
    let mut visible: Vec<&Candidate> = candidates.iter().filter(|c| filter.matches(c)).collect();

    visible.sort_by(|a, b| {
        let ord = sort.field.compare(a, b);
        match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });

    visible
}

/// Entity ids of a derived sequence, in order
pub fn visible_ids(visible: &[&Candidate]) -> Vec<String> {
    visible.iter().map(|c| c.entity_id.clone()).collect()
}
