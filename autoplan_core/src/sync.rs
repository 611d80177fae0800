//! Routine synchronization against the remote store.
//!
//! Per run: snapshot the local cache, discover remote routines, identify the
//! managed routine (trusting only ids present in the snapshot), then create
//! or update it. A final refresh re-caches the remote list, best effort.

use crate::cache::RoutineCache;
use crate::remote::{RemoteError, RoutineStore};
use crate::retry::RetryPolicy;
use crate::config::RoutineConfig;
use crate::{Config, RemoteRoutine, RoutinePayload};

/// Whether the managed routine was created or updated
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    Updated,
}

#[derive(Clone, Debug)]
pub struct SyncOutcome {
    pub action: SyncAction,
    pub routine: RemoteRoutine,
}

pub struct RoutineSynchronizer<'a> {
    store: &'a dyn RoutineStore,
    cache: &'a RoutineCache,
    policy: RetryPolicy,
    routine: &'a RoutineConfig,
    page_size: u32,
}

impl<'a> RoutineSynchronizer<'a> {
    pub fn new(store: &'a dyn RoutineStore, cache: &'a RoutineCache, config: &'a Config) -> Self {
        Self {
            store,
            cache,
            policy: RetryPolicy::from_config(&config.retry),
            routine: &config.routine,
            page_size: config.api.page_size.max(1),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetch every page of routines, retrying transient failures.
    /// A successful fetch replaces the local cache.
    pub async fn fetch_all(&self) -> Result<Vec<RemoteRoutine>, RemoteError> {
        let mut routines = Vec::new();
        let mut page = 1;
        loop {
            let body = self
                .policy
                .run("list routines", RemoteError::is_transient, || {
                    self.store.list_routines(page, self.page_size)
                })
                .await?;
            let received = body.routines.len();
            routines.extend(body.routines);
            if received == 0 || page >= body.page_count {
                break;
            }
            page += 1;
        }

        if let Err(e) = self.cache.store(&routines) {
            tracing::warn!("Failed to write routine cache: {}", e);
        }
        tracing::debug!("Fetched {} remote routines", routines.len());
        Ok(routines)
    }

    /// Remote routines, falling back to the cache and then to nothing
    pub async fn discover(&self) -> Vec<RemoteRoutine> {
        match self.fetch_all().await {
            Ok(routines) => routines,
            Err(e) => {
                let cached = self.cache.load();
                tracing::warn!(
                    "Listing routines failed ({}); falling back to {} cached routines",
                    e,
                    cached.len()
                );
                cached
            }
        }
    }

    /// Find the managed routine among `remote`, trusting only ids in `trusted`
    pub fn identify<'r>(
        &self,
        remote: &'r [RemoteRoutine],
        trusted: &[RemoteRoutine],
    ) -> Option<&'r RemoteRoutine> {
        let mut managed: Vec<&RemoteRoutine> = remote
            .iter()
            .filter(|r| self.routine.is_managed_title(&r.title))
            .filter(|r| {
                let known = trusted.iter().any(|t| t.id == r.id);
                if !known {
                    tracing::warn!(
                        "Managed routine {} ('{}') is not in the local cache, ignoring it",
                        r.id,
                        r.title
                    );
                }
                known
            })
            .collect();

        // Most recently updated first
        managed.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        if managed.len() > 1 {
            tracing::warn!(
                "{} managed routines found, using {}",
                managed.len(),
                managed[0].id
            );
        }
        managed.into_iter().next()
    }

    /// Create the managed routine or update it in place
    pub async fn sync(&self, payload: &RoutinePayload) -> crate::Result<SyncOutcome> {
        let snapshot = self.cache.load();
        let remote = self.discover().await;

        match self.identify(&remote, &snapshot) {
            Some(existing) => {
                tracing::info!("Updating managed routine {}", existing.id);
                let routine = self.update(&existing.id, payload).await?;
                Ok(SyncOutcome {
                    action: SyncAction::Updated,
                    routine,
                })
            }
            None => {
                tracing::info!("No trusted managed routine found, creating one");
                let routine = self.create(payload).await?;
                Ok(SyncOutcome {
                    action: SyncAction::Created,
                    routine,
                })
            }
        }
    }

    pub async fn create(&self, payload: &RoutinePayload) -> Result<RemoteRoutine, RemoteError> {
        self.policy
            .run("create routine", RemoteError::is_transient, || {
                self.store.create_routine(payload)
            })
            .await
    }

    /// Update in place, retrying any failure. Exhausting the retries is an
    /// error; falling back to create would leave two managed routines.
    pub async fn update(
        &self,
        id: &str,
        payload: &RoutinePayload,
    ) -> Result<RemoteRoutine, RemoteError> {
        self.policy
            .run("update routine", |_| true, || self.store.update_routine(id, payload))
            .await
    }

    /// Re-fetch and re-cache the routine list; failures are only logged
    pub async fn refresh(&self) {
        match self.fetch_all().await {
            Ok(routines) => tracing::debug!("Refreshed cache with {} routines", routines.len()),
            Err(e) => tracing::warn!("Routine cache refresh failed: {}", e),
        }
    }
}
