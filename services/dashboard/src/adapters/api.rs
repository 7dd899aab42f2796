//! services/dashboard/src/adapters/api.rs
//!
//! This module contains the API adapter, the authenticated HTTP read path.
//! Every story reference it receives is resolved through the same `TitleLookup`
//! the database adapter uses, so titles never differ by origin.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use practice_diff_core::domain::{
    AccessToken, Assignment, EntityId, RemainingRights, Student, SuggestedStory,
};
use practice_diff_core::policy::drop_most_recent;
use practice_diff_core::ports::{BundleProvider, BundleSource, PortError, PortResult, TitleLookup};
use practice_diff_core::titles::resolve_titles;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::adapters::convert::{entity_id_from_json, parse_timestamp};
use crate::adapters::http::{check_response, request_error};

const LOGIN_PATH: &str = "/auth/student/bearer/login";
const REMAINING_RIGHTS_PATH: &str = "/student/remaining_rights";
const INCOMPLETE_ASSIGNMENTS_PATH: &str = "/assignment/student/incomplete";
const COMPLETED_ASSIGNMENTS_PATH: &str = "/assignment/student/completed";
const SUGGESTIONS_PATH: &str = "/story/suggestions/student";

//=========================================================================================
// Wire Shapes
//=========================================================================================

#[derive(Deserialize)]
struct LoginResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct RemainingRightsWire {
    daily_story_practice: Option<i64>,
}

#[derive(Deserialize)]
struct StoryRefWire {
    #[serde(default)]
    id: Value,
}

#[derive(Deserialize)]
struct AssignmentWire {
    story: Option<StoryRefWire>,
    #[serde(default)]
    started: Option<bool>,
    #[serde(default)]
    deducts_practice_rights: Option<bool>,
    #[serde(default)]
    due_date: Option<String>,
}

#[derive(Deserialize)]
struct SuggestionWire {
    #[serde(default)]
    id: Value,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Reads bundles through the HTTP API using one pooled client.
#[derive(Clone)]
pub struct ApiAdapter {
    http: reqwest::Client,
    base_url: String,
    login_password: String,
    titles: Arc<dyn TitleLookup>,
}

impl ApiAdapter {
    /// Creates a new `ApiAdapter`. `http` should be the process-wide client.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        login_password: impl Into<String>,
        titles: Arc<dyn TitleLookup>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            login_password: login_password.into(),
            titles,
        }
    }

    /// Builds the pooled client shared by every call.
    pub fn build_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(concat!("practice-diff-dashboard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchanges a student's contact address for a bearer token.
    pub async fn authenticate(&self, contact: &str) -> PortResult<AccessToken> {
        let resp = self
            .http
            .post(self.url(LOGIN_PATH))
            .form(&[("username", contact), ("password", self.login_password.as_str())])
            .send()
            .await
            .map_err(request_error)?;

        // Form logins answer bad credentials with 400 or 422 as well as 401.
        let status = resp.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            return Err(PortError::Unauthorized(format!("HTTP {}", status.as_u16())));
        }
        let resp = check_response(resp).await?;
        let body: LoginResponse = resp.json().await.map_err(request_error)?;

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .map(AccessToken::new)
            .ok_or_else(|| {
                PortError::Unauthorized("Login response carried no access token".to_string())
            })?;
        debug!("Obtained API access token");
        Ok(token)
    }

    async fn get(&self, path: &str, token: &AccessToken) -> PortResult<reqwest::Response> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(request_error)?;
        debug!(path, status = resp.status().as_u16(), "API response");
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &AccessToken) -> PortResult<T> {
        let resp = check_response(self.get(path, token).await?).await?;
        resp.json().await.map_err(request_error)
    }

    pub async fn fetch_remaining_rights(
        &self,
        token: &AccessToken,
    ) -> PortResult<Option<RemainingRights>> {
        let resp = self.get(REMAINING_RIGHTS_PATH, token).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = check_response(resp).await?;
        let wire: Option<RemainingRightsWire> = resp.json().await.map_err(request_error)?;
        Ok(wire.map(|w| RemainingRights {
            daily_story_practice: w.daily_story_practice,
        }))
    }

    pub async fn fetch_incomplete_assignments(
        &self,
        token: &AccessToken,
    ) -> PortResult<Vec<Assignment>> {
        let wire: Vec<AssignmentWire> = self.get_json(INCOMPLETE_ASSIGNMENTS_PATH, token).await?;
        Ok(self.enrich_assignments(wire, false).await)
    }

    pub async fn fetch_completed_assignments(
        &self,
        token: &AccessToken,
    ) -> PortResult<Vec<Assignment>> {
        let wire: Vec<AssignmentWire> = self.get_json(COMPLETED_ASSIGNMENTS_PATH, token).await?;
        Ok(self.enrich_assignments(wire, true).await)
    }

    /// Suggestion history, truncated with the same policy as the store side.
    pub async fn fetch_suggested_stories(
        &self,
        token: &AccessToken,
    ) -> PortResult<Vec<SuggestedStory>> {
        let wire: Vec<SuggestionWire> = self.get_json(SUGGESTIONS_PATH, token).await?;
        let story_ids: Vec<Option<EntityId>> = drop_most_recent(wire)
            .iter()
            .map(|s| entity_id_from_json(&s.id))
            .collect();
        let titles = resolve_titles(self.titles.as_ref(), &story_ids).await;

        Ok(story_ids
            .into_iter()
            .zip(titles)
            .map(|(story_id, story_title)| SuggestedStory {
                story_id,
                story_title,
            })
            .collect())
    }

    async fn enrich_assignments(&self, wire: Vec<AssignmentWire>, completed: bool) -> Vec<Assignment> {
        let story_ids: Vec<Option<EntityId>> = wire
            .iter()
            .map(|a| a.story.as_ref().and_then(|s| entity_id_from_json(&s.id)))
            .collect();
        let titles = resolve_titles(self.titles.as_ref(), &story_ids).await;

        wire.into_iter()
            .zip(story_ids)
            .zip(titles)
            .map(|((a, story_id), story_title)| Assignment {
                story_id,
                story_title,
                completed,
                due_date: a.due_date.as_deref().and_then(parse_timestamp),
                // Completed assignments do not report progress flags.
                started: if completed { None } else { a.started },
                deducts_practice_rights: if completed {
                    None
                } else {
                    a.deducts_practice_rights
                },
            })
            .collect()
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

/// The API side of one student's bundle, bound to an access token.
pub struct ApiSession {
    adapter: ApiAdapter,
    token: AccessToken,
}

#[async_trait]
impl BundleSource for ApiSession {
    async fn fetch_remaining_rights(&self) -> PortResult<Option<RemainingRights>> {
        self.adapter.fetch_remaining_rights(&self.token).await
    }

    async fn fetch_incomplete_assignments(&self) -> PortResult<Vec<Assignment>> {
        self.adapter.fetch_incomplete_assignments(&self.token).await
    }

    async fn fetch_completed_assignments(&self) -> PortResult<Vec<Assignment>> {
        self.adapter.fetch_completed_assignments(&self.token).await
    }

    async fn fetch_suggested_stories(&self) -> PortResult<Vec<SuggestedStory>> {
        self.adapter.fetch_suggested_stories(&self.token).await
    }
}

#[async_trait]
impl BundleProvider for ApiAdapter {
    /// Authenticates first; no bundle read is issued without a token.
    async fn open(&self, student: &Student) -> PortResult<Box<dyn BundleSource>> {
        let contact = student.contact.as_deref().ok_or_else(|| {
            PortError::Unauthorized(format!("Student {} has no contact address", student.id))
        })?;
        let token = self.authenticate(contact).await?;
        Ok(Box::new(ApiSession {
            adapter: self.clone(),
            token,
        }))
    }
}
