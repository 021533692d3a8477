//! Build history: filtered, paged, deduplicated, with per-build actions.

use metis_client::{BuildBackend, HistoryQuery};
use metis_types::{BuildAction, BuildDetails, BuildState, HistoryItem};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::ConsoleConfig;
use crate::countdown::CountdownBoard;
use crate::error::ConsoleError;

/// Client-side view of `GET /history`.
///
/// Pages are appended in order. A row whose `iso_name` was already seen is
/// not appended again, but its lock flag and countdown are refreshed from the
/// newer copy. A page that comes back empty or shorter than the page size
/// ends the feed, and so does a full page with nothing new on it.
pub struct HistoryFeed {
    backend: Arc<dyn BuildBackend>,
    page_size: usize,
    project: String,
    version: String,
    version_options: Vec<String>,
    rows: Vec<HistoryItem>,
    locks: HashMap<String, bool>,
    countdowns: CountdownBoard,
    next_page: u32,
    has_more: bool,
}

impl HistoryFeed {
    pub fn new(backend: Arc<dyn BuildBackend>, config: &ConsoleConfig) -> Self {
        Self {
            backend,
            page_size: config.history_page_size as usize,
            project: String::new(),
            version: String::new(),
            version_options: Vec::new(),
            rows: Vec::new(),
            locks: HashMap::new(),
            countdowns: CountdownBoard::new(config.retention_days),
            next_page: 1,
            has_more: true,
        }
    }

    pub fn rows(&self) -> &[HistoryItem] {
        &self.rows
    }

    pub fn row(&self, deploy_id: &str) -> Option<&HistoryItem> {
        self.rows.iter().find(|r| r.iso_name == deploy_id)
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Versions of the selected project, for the version filter.
    pub fn version_options(&self) -> &[String] {
        &self.version_options
    }

    pub fn countdowns(&self) -> &CountdownBoard {
        &self.countdowns
    }

    pub fn is_locked(&self, deploy_id: &str) -> bool {
        self.locks.get(deploy_id).copied().unwrap_or(false)
    }

    /// Filter by project. Clears the version filter, restarts paging and
    /// loads the project's versions; an empty project has none.
    pub async fn select_project(&mut self, project: &str) -> Result<(), ConsoleError> {
        self.project = project.to_string();
        self.version.clear();
        self.version_options.clear();
        self.reset();
        if project.is_empty() {
            return Ok(());
        }
        match self.backend.versions(project).await {
            Ok(versions) => {
                self.version_options = versions;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(project, error = %e, "failed to fetch versions");
                Err(e.into())
            }
        }
    }

    /// Filter by version and restart paging.
    pub fn select_version(&mut self, version: &str) {
        self.version = version.to_string();
        self.reset();
    }

    fn reset(&mut self) {
        self.rows.clear();
        self.next_page = 1;
        self.has_more = true;
    }

    /// Fetch the next page. Returns how many new rows were appended; zero
    /// without a request once the feed has ended.
    pub async fn load_next_page(&mut self) -> Result<usize, ConsoleError> {
        if !self.has_more {
            return Ok(0);
        }
        let query = HistoryQuery {
            page: self.next_page,
            project: self.project.clone(),
            version: self.version.clone(),
        };
        let page = self.backend.history(&query).await.map_err(|e| {
            tracing::warn!(page = query.page, error = %e, "failed to fetch history");
            ConsoleError::from(e)
        })?;
        self.next_page += 1;

        if page.is_empty() {
            self.has_more = false;
            return Ok(0);
        }
        if page.len() < self.page_size {
            self.has_more = false;
        }

        for item in &page {
            self.locks.insert(item.iso_name.clone(), item.is_locked());
            self.countdowns
                .track(&item.iso_name, item.end_build_time.as_deref());
        }

        let mut seen: HashSet<String> = self.rows.iter().map(|r| r.iso_name.clone()).collect();
        let before = self.rows.len();
        for item in page {
            if seen.insert(item.iso_name.clone()) {
                self.rows.push(item);
            }
        }
        let added = self.rows.len() - before;
        if added == 0 && self.has_more {
            tracing::warn!(page = query.page, "history page repeated earlier rows, stopping");
            self.has_more = false;
        }
        tracing::debug!(
            page = query.page,
            added,
            has_more = self.has_more,
            "history page loaded"
        );
        Ok(added)
    }

    /// Load pages until the feed ends or `max_pages` more have been fetched.
    pub async fn load_pages(&mut self, max_pages: u32) -> Result<usize, ConsoleError> {
        let mut added = 0;
        for _ in 0..max_pages {
            if !self.has_more {
                break;
            }
            added += self.load_next_page().await?;
        }
        Ok(added)
    }

    /// Find a build, fetching further pages until it shows up or the feed
    /// ends.
    pub async fn locate(&mut self, deploy_id: &str) -> Result<&HistoryItem, ConsoleError> {
        while self.row(deploy_id).is_none() && self.has_more {
            self.load_next_page().await?;
        }
        self.row(deploy_id)
            .ok_or_else(|| ConsoleError::UnknownBuild(deploy_id.to_string()))
    }

    /// Flip a build's lock. Returns the new lock state.
    pub async fn toggle_lock(&mut self, deploy_id: &str) -> Result<bool, ConsoleError> {
        let lock = !self.is_locked(deploy_id);
        let action = if lock {
            BuildAction::Lock
        } else {
            BuildAction::Unlock
        };
        self.backend.build_action(action, deploy_id).await?;
        self.locks.insert(deploy_id.to_string(), lock);
        if let Some(row) = self.rows.iter_mut().find(|r| r.iso_name == deploy_id) {
            row.is_lock = u8::from(lock);
        }
        tracing::info!(deploy_id, locked = lock, "lock toggled");
        Ok(lock)
    }

    /// Delete a build. Locked builds are refused without asking the backend.
    pub async fn delete(&mut self, deploy_id: &str) -> Result<(), ConsoleError> {
        if self.is_locked(deploy_id) {
            return Err(ConsoleError::LockedResource(deploy_id.to_string()));
        }
        self.backend
            .build_action(BuildAction::Delete, deploy_id)
            .await?;
        self.rows.retain(|r| r.iso_name != deploy_id);
        self.locks.remove(deploy_id);
        self.countdowns.forget(deploy_id);
        tracing::info!(deploy_id, "build deleted");
        Ok(())
    }

    /// Stop a build's running task; the row is marked stopped.
    pub async fn stop(&mut self, deploy_id: &str) -> Result<(), ConsoleError> {
        self.backend
            .build_action(BuildAction::Revoke, deploy_id)
            .await?;
        if let Some(row) = self.rows.iter_mut().find(|r| r.iso_name == deploy_id) {
            row.state = BuildState::Stopped;
        }
        tracing::info!(deploy_id, "build task stopped");
        Ok(())
    }

    pub async fn details(&self, deploy_id: &str) -> Result<BuildDetails, ConsoleError> {
        Ok(self.backend.build_details(deploy_id).await?)
    }
}
