//! crates/practice_diff_core/src/reconcile.rs
//!
//! Runs both read paths for one student and lays the results side by side.
//! Nothing here merges or diffs the two views; the operator compares them.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Assignment, EntityId, RemainingRights, Student, SuggestedStory};
use crate::ports::{
    BundleProvider, BundleSource, FailureKind, PortError, PortResult, StudentDirectory,
};

//=========================================================================================
// Rendered Shapes
//=========================================================================================

/// What went wrong, kept in a form the display surface can render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&PortError> for FailureReport {
    fn from(err: &PortError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// The outcome of one read within a bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
    Loaded { data: T },
    Failed { failure: FailureReport },
}

impl<T> Section<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            Section::Loaded { data } => Some(data),
            Section::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReport> {
        match self {
            Section::Loaded { .. } => None,
            Section::Failed { failure } => Some(failure),
        }
    }
}

impl<T> From<PortResult<T>> for Section<T> {
    fn from(result: PortResult<T>) -> Self {
        match result {
            Ok(data) => Section::Loaded { data },
            Err(err) => Section::Failed {
                failure: FailureReport::from(&err),
            },
        }
    }
}

/// The four reads of one source for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bundle {
    pub remaining_rights: Section<Option<RemainingRights>>,
    pub incomplete_assignments: Section<Vec<Assignment>>,
    pub completed_assignments: Section<Vec<Assignment>>,
    pub suggested_stories: Section<Vec<SuggestedStory>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Database,
    Api,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Database => "database",
            SourceKind::Api => "api",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Ready { bundle: Bundle },
    /// The source could not be opened at all, e.g. its credential was refused.
    Unavailable { failure: FailureReport },
}

/// One pane of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceView {
    pub source: SourceKind,
    pub outcome: SourceOutcome,
}

impl SourceView {
    pub fn bundle(&self) -> Option<&Bundle> {
        match &self.outcome {
            SourceOutcome::Ready { bundle } => Some(bundle),
            SourceOutcome::Unavailable { .. } => None,
        }
    }
}

/// Both panes for one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub student: Student,
    pub database: SourceView,
    pub api: SourceView,
}

//=========================================================================================
// Assembly
//=========================================================================================

/// Issues the four reads of `source` concurrently and records each outcome
/// on its own, so one failing read leaves the other three intact.
pub async fn assemble_bundle(source: &dyn BundleSource) -> Bundle {
    let (rights, incomplete, completed, suggested) = futures::join!(
        source.fetch_remaining_rights(),
        source.fetch_incomplete_assignments(),
        source.fetch_completed_assignments(),
        source.fetch_suggested_stories(),
    );

    Bundle {
        remaining_rights: rights.into(),
        incomplete_assignments: incomplete.into(),
        completed_assignments: completed.into(),
        suggested_stories: suggested.into(),
    }
}

//=========================================================================================
// Reconciler
//=========================================================================================

/// Composes the student directory and the two bundle providers.
#[derive(Clone)]
pub struct Reconciler {
    directory: Arc<dyn StudentDirectory>,
    database: Arc<dyn BundleProvider>,
    api: Arc<dyn BundleProvider>,
}

impl Reconciler {
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        database: Arc<dyn BundleProvider>,
        api: Arc<dyn BundleProvider>,
    ) -> Self {
        Self {
            directory,
            database,
            api,
        }
    }

    pub async fn students(&self) -> PortResult<Vec<Student>> {
        self.directory.fetch_students().await
    }

    /// Looks the student up in the directory, then compares.
    pub async fn compare_by_id(&self, student_id: &EntityId) -> PortResult<Comparison> {
        let student = self
            .students()
            .await?
            .into_iter()
            .find(|s| &s.id == student_id)
            .ok_or_else(|| PortError::NotFound(format!("Student {} not found", student_id)))?;
        Ok(self.compare(student).await)
    }

    /// Reads both sources for `student` concurrently.
    pub async fn compare(&self, student: Student) -> Comparison {
        info!(student_id = %student.id, "Comparing sources");
        let (database, api) = futures::join!(
            view(SourceKind::Database, self.database.as_ref(), &student),
            view(SourceKind::Api, self.api.as_ref(), &student),
        );
        Comparison {
            student,
            database,
            api,
        }
    }
}

async fn view(kind: SourceKind, provider: &dyn BundleProvider, student: &Student) -> SourceView {
    let outcome = match provider.open(student).await {
        Ok(source) => SourceOutcome::Ready {
            bundle: assemble_bundle(source.as_ref()).await,
        },
        Err(e) => {
            warn!(source = kind.as_str(), student_id = %student.id, error = %e, "Source unavailable");
            SourceOutcome::Unavailable {
                failure: FailureReport::from(&e),
            }
        }
    };
    SourceView {
        source: kind,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn student(n: u8) -> Student {
        Student {
            id: EntityId::from_bytes([n; 12]),
            display_name: Some(format!("Student {n}")),
            contact: Some(format!("s{n}@x.com")),
        }
    }

    struct FixedSource {
        fail_completed: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BundleSource for FixedSource {
        async fn fetch_remaining_rights(&self) -> PortResult<Option<RemainingRights>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(RemainingRights {
                daily_story_practice: Some(3),
            }))
        }

        async fn fetch_incomplete_assignments(&self) -> PortResult<Vec<Assignment>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Assignment {
                story_id: None,
                story_title: Some("Red Fox".to_string()),
                completed: false,
                due_date: None,
                started: Some(false),
                deducts_practice_rights: Some(true),
            }])
        }

        async fn fetch_completed_assignments(&self) -> PortResult<Vec<Assignment>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_completed {
                return Err(PortError::Transport("connection reset".to_string()));
            }
            Ok(Vec::new())
        }

        async fn fetch_suggested_stories(&self) -> PortResult<Vec<SuggestedStory>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    struct FixedProvider {
        open_error: Option<PortError>,
        fail_completed: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FixedProvider {
        fn healthy() -> Self {
            Self {
                open_error: None,
                fail_completed: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl BundleProvider for FixedProvider {
        async fn open(&self, _student: &Student) -> PortResult<Box<dyn BundleSource>> {
            if let Some(err) = &self.open_error {
                return Err(err.clone());
            }
            Ok(Box::new(FixedSource {
                fail_completed: self.fail_completed,
                calls: self.calls.clone(),
            }))
        }
    }

    struct FixedDirectory(Vec<Student>);

    #[async_trait]
    impl StudentDirectory for FixedDirectory {
        async fn fetch_students(&self) -> PortResult<Vec<Student>> {
            Ok(self.0.clone())
        }
    }

    fn reconciler(db: FixedProvider, api: FixedProvider) -> Reconciler {
        Reconciler::new(
            Arc::new(FixedDirectory(vec![student(1), student(2)])),
            Arc::new(db),
            Arc::new(api),
        )
    }

    #[tokio::test]
    async fn both_panes_are_ready_when_both_sources_answer() {
        let comparison = reconciler(FixedProvider::healthy(), FixedProvider::healthy())
            .compare(student(1))
            .await;

        assert_eq!(comparison.database.source, SourceKind::Database);
        assert_eq!(comparison.api.source, SourceKind::Api);
        assert_eq!(comparison.database.bundle(), comparison.api.bundle());
        let bundle = comparison.database.bundle().unwrap();
        assert_eq!(
            bundle.remaining_rights.data(),
            Some(&Some(RemainingRights {
                daily_story_practice: Some(3)
            }))
        );
    }

    #[tokio::test]
    async fn rejected_credential_marks_only_the_api_pane_unavailable() {
        let api = FixedProvider {
            open_error: Some(PortError::Unauthorized("HTTP 401".to_string())),
            ..FixedProvider::healthy()
        };
        let api_calls = api.calls.clone();
        let comparison = reconciler(FixedProvider::healthy(), api)
            .compare(student(1))
            .await;

        assert!(comparison.database.bundle().is_some());
        match &comparison.api.outcome {
            SourceOutcome::Unavailable { failure } => {
                assert_eq!(failure.kind, FailureKind::Unauthorized)
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
        assert_eq!(api_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failing_section_keeps_the_other_three() {
        let db = FixedProvider {
            fail_completed: true,
            ..FixedProvider::healthy()
        };
        let calls = db.calls.clone();
        let comparison = reconciler(db, FixedProvider::healthy())
            .compare(student(1))
            .await;

        let bundle = comparison.database.bundle().unwrap();
        assert_eq!(
            bundle.completed_assignments.failure().map(|f| f.kind),
            Some(FailureKind::Transport)
        );
        assert!(bundle.remaining_rights.data().is_some());
        assert_eq!(bundle.incomplete_assignments.data().map(Vec::len), Some(1));
        assert!(bundle.suggested_stories.data().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn compare_by_id_rejects_unknown_students() {
        let reconciler = reconciler(FixedProvider::healthy(), FixedProvider::healthy());
        let err = reconciler
            .compare_by_id(&EntityId::from_bytes([9; 12]))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));

        let found = reconciler.compare_by_id(&student(2).id).await.unwrap();
        assert_eq!(found.student, student(2));
    }

    #[test]
    fn sections_serialize_with_a_status_tag() {
        let loaded: Section<Vec<u8>> = Ok(vec![1]).into();
        let failed: Section<Vec<u8>> = Err(PortError::Transport("down".to_string())).into();

        assert_eq!(
            serde_json::to_value(&loaded).unwrap(),
            serde_json::json!({"status": "loaded", "data": [1]})
        );
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            serde_json::json!({
                "status": "failed",
                "failure": {"kind": "transport", "message": "Transport failure: down"}
            })
        );
    }
}
