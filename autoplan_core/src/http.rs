//! HTTP client for the workout-tracking REST API.
//!
//! Authenticates with an `api-key` header. Lists are paginated with
//! `page`/`pageSize`; routines are created with POST and updated with PUT
//! inside a `{"routine": {...}}` envelope. History and template pages are
//! retried here on 429 and 5xx; routine calls are retried by the synchronizer.

use crate::config::ApiConfig;
use crate::remote::{RemoteError, RoutinePage, RoutineStore, WorkoutSource};
use crate::retry::RetryPolicy;
use crate::{Error, ExerciseTemplate, RemoteRoutine, Result, RoutinePayload, WorkoutSession};
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct WorkoutsPage {
    #[serde(default)]
    page_count: u32,
    #[serde(default)]
    workouts: Vec<WorkoutSession>,
}

#[derive(Debug, Deserialize)]
struct TemplatesPage {
    #[serde(default)]
    page_count: u32,
    #[serde(default)]
    exercise_templates: Vec<ExerciseTemplate>,
}

#[derive(Debug, Deserialize)]
struct RoutinesPage {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    page_count: u32,
    #[serde(default)]
    routines: Vec<RemoteRoutine>,
}

#[derive(Serialize)]
struct RoutineEnvelope<'a> {
    routine: &'a RoutinePayload,
}

/// The API answers create/update with either one routine or a list of one
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(RemoteRoutine),
    Many(Vec<RemoteRoutine>),
}

#[derive(Deserialize)]
struct RoutineResponse {
    routine: OneOrMany,
}

impl RoutineResponse {
    fn into_routine(self) -> std::result::Result<RemoteRoutine, RemoteError> {
        match self.routine {
            OneOrMany::One(routine) => Ok(routine),
            OneOrMany::Many(routines) => routines
                .into_iter()
                .next()
                .ok_or_else(|| RemoteError::Decode("empty routine list in response".into())),
        }
    }
}

/// REST client for history, templates and routines
#[derive(Clone, Debug)]
pub struct TrackerClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    template_page_size: u32,
    retry: RetryPolicy,
}

impl TrackerClient {
    /// Build a client, resolving the API key from the environment or config
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Self::with_key(config, api_key)
    }

    pub fn with_key(config: &ApiConfig, api_key: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            page_size: config.page_size.max(1),
            template_page_size: config.template_page_size.max(1),
            retry: RetryPolicy::default(),
        })
    }

    /// Retry policy for history and template fetches
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        page_size: u32,
    ) -> std::result::Result<T, RemoteError> {
        tracing::debug!("GET {} page {}", path, page);
        let response = self
            .http
            .get(self.url(path))
            .header("api-key", &self.api_key)
            .query(&[("page", page), ("pageSize", page_size)])
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        decode(response).await
    }

    /// `get` with transient failures retried per page
    async fn get_retrying<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        page_size: u32,
    ) -> std::result::Result<T, RemoteError> {
        let operation = format!("GET {} page {}", path, page);
        self.retry
            .run(&operation, RemoteError::is_transient, || {
                self.get(path, page, page_size)
            })
            .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: &RoutinePayload,
    ) -> std::result::Result<T, RemoteError> {
        tracing::debug!("{} {}", method, path);
        let response = self
            .http
            .request(method, self.url(path))
            .header("api-key", &self.api_key)
            .json(&RoutineEnvelope { routine: payload })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> std::result::Result<T, RemoteError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RemoteError::Transport(e.to_string()))?;

    if !status.is_success() {
        tracing::debug!("Request failed with status {}: {}", status, body);
        return Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl WorkoutSource for TrackerClient {
    async fn recent_workouts(&self, limit: usize) -> Result<Vec<WorkoutSession>> {
        let mut sessions = Vec::new();
        let mut page = 1;
        loop {
            let body: WorkoutsPage = self
                .get_retrying("/v1/workouts", page, self.page_size)
                .await?;
            let received = body.workouts.len();
            sessions.extend(body.workouts);
            if sessions.len() >= limit || received == 0 || page >= body.page_count {
                break;
            }
            page += 1;
        }
        sessions.truncate(limit);
        tracing::info!("Fetched {} workouts", sessions.len());
        Ok(sessions)
    }

    async fn exercise_templates(&self) -> Result<Vec<ExerciseTemplate>> {
        let mut templates = Vec::new();
        let mut page = 1;
        loop {
            let body: TemplatesPage = self
                .get_retrying("/v1/exercise_templates", page, self.template_page_size)
                .await?;
            let received = body.exercise_templates.len();
            templates.extend(body.exercise_templates);
            if received == 0 || page >= body.page_count {
                break;
            }
            page += 1;
        }
        tracing::info!("Fetched {} exercise templates", templates.len());
        Ok(templates)
    }
}

#[async_trait]
impl RoutineStore for TrackerClient {
    async fn list_routines(
        &self,
        page: u32,
        page_size: u32,
    ) -> std::result::Result<RoutinePage, RemoteError> {
        let body: RoutinesPage = self.get("/v1/routines", page, page_size).await?;
        Ok(RoutinePage {
            page: body.page,
            page_count: body.page_count,
            routines: body.routines,
        })
    }

    async fn create_routine(
        &self,
        payload: &RoutinePayload,
    ) -> std::result::Result<RemoteRoutine, RemoteError> {
        let body: RoutineResponse = self.send(Method::POST, "/v1/routines", payload).await?;
        body.into_routine()
    }

    async fn update_routine(
        &self,
        id: &str,
        payload: &RoutinePayload,
    ) -> std::result::Result<RemoteRoutine, RemoteError> {
        let path = format!("/v1/routines/{}", id);
        let body: RoutineResponse = self.send(Method::PUT, &path, payload).await?;
        body.into_routine()
    }
}
