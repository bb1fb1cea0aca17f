use std::collections::HashMap;

use crate::api::{ApiError, Project};

/// Name shown for entries whose project is missing or unknown
pub const UNASSIGNED_LABEL: &str = "Unassigned";

#[derive(Debug, Clone, Default)]
pub enum DirectoryState {
    #[default]
    Loading,
    Loaded(HashMap<String, String>),
    /// The fetch failed; names degrade to the sentinel until the next session
    Unavailable(String),
}

/// Project id to display name lookup, built once per session
#[derive(Debug, Clone, Default)]
pub struct ProjectDirectory {
    state: DirectoryState,
}

impl ProjectDirectory {
    pub fn from_fetch(result: Result<Vec<Project>, ApiError>) -> Self {
        let state = match result {
            Ok(projects) => {
                let names = projects.into_iter().map(|p| (p.id, p.name)).collect();
                DirectoryState::Loaded(names)
            }
            Err(e) => {
                log::warn!("Project directory unavailable: {}", e);
                DirectoryState::Unavailable(e.to_string())
            }
        };
        Self { state }
    }

    pub fn state(&self) -> &DirectoryState {
        &self.state
    }

    pub fn resolve(&self, project_id: Option<&str>) -> &str {
        match (&self.state, project_id) {
            (DirectoryState::Loaded(names), Some(id)) => {
                names.get(id).map(String::as_str).unwrap_or(UNASSIGNED_LABEL)
            }
            _ => UNASSIGNED_LABEL,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, DirectoryState::Loaded(_))
    }

    /// Why names cannot be resolved, if the fetch failed
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            DirectoryState::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.state {
            DirectoryState::Loaded(names) => names.len(),
            _ => 0,
        }
    }
}
