mod aggregate;
mod period;
mod projects;

pub use aggregate::{aggregate, aggregate_by_project, total_hours, Bucket, DayFill};
pub use period::{Period, PeriodRange};
pub use projects::{DirectoryState, ProjectDirectory, UNASSIGNED_LABEL};
