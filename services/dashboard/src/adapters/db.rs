//! services/dashboard/src/adapters/db.rs
//!
//! This module contains the database adapter, the direct read path. It implements
//! the `StudentDirectory`, `TitleLookup` and `BundleProvider` ports from the `core`
//! crate on top of any `DocumentStore`.

use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use practice_diff_core::domain::{Assignment, EntityId, RemainingRights, Student, SuggestedStory};
use practice_diff_core::policy::drop_most_recent;
use practice_diff_core::ports::{
    BundleProvider, BundleSource, PortError, PortResult, StudentDirectory, TitleLookup,
};
use practice_diff_core::titles::resolve_titles;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::adapters::convert::{
    entity_id_from_bson, entity_id_from_object_id, object_id_from_entity_id, timestamp_from_bson,
};
use crate::adapters::store::DocumentStore;

const STUDENTS: &str = "b2b_student";
const REMAINING_RIGHTS: &str = "remaining_rights";
const STORIES: &str = "story";
const ASSIGNMENTS: &str = "b2b_student_assignment";
const SUGGESTIONS: &str = "suggested_story";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter reading straight from the document store.
#[derive(Clone)]
pub struct DbAdapter {
    store: Arc<dyn DocumentStore>,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn fetch_remaining_rights(
        &self,
        student_id: &EntityId,
    ) -> PortResult<Option<RemainingRights>> {
        let document = self
            .store
            .find_one(
                REMAINING_RIGHTS,
                doc! { "_id": object_id_from_entity_id(student_id) },
                doc! { "daily_story_practice": 1, "_id": 0 },
            )
            .await?;
        document
            .map(|d| decode::<RemainingRightsRecord>(d).map(RemainingRightsRecord::to_domain))
            .transpose()
    }

    pub async fn fetch_incomplete_assignments(
        &self,
        student_id: &EntityId,
    ) -> PortResult<Vec<Assignment>> {
        self.fetch_assignments(
            student_id,
            false,
            doc! { "story_id": 1, "started": 1, "deducts_practice_rights": 1, "due_date": 1, "_id": 0 },
        )
        .await
    }

    pub async fn fetch_completed_assignments(
        &self,
        student_id: &EntityId,
    ) -> PortResult<Vec<Assignment>> {
        self.fetch_assignments(
            student_id,
            true,
            doc! { "story_id": 1, "due_date": 1, "_id": 0 },
        )
        .await
    }

    /// Suggestion history in insertion order, without the current suggestion.
    pub async fn fetch_suggested_stories(
        &self,
        student_id: &EntityId,
    ) -> PortResult<Vec<SuggestedStory>> {
        let documents = self
            .store
            .find_many(
                SUGGESTIONS,
                doc! { "suggested_for_id": object_id_from_entity_id(student_id) },
                doc! { "story_id": 1, "_id": 0 },
                doc! { "_id": 1 },
            )
            .await?;

        let story_ids = drop_most_recent(documents)
            .into_iter()
            .map(|d| decode::<StoryRefRecord>(d).map(|r| entity_id_from_bson(r.story_id.as_ref())))
            .collect::<PortResult<Vec<_>>>()?;
        let titles = resolve_titles(self, &story_ids).await;

        Ok(story_ids
            .into_iter()
            .zip(titles)
            .map(|(story_id, story_title)| SuggestedStory {
                story_id,
                story_title,
            })
            .collect())
    }

    async fn fetch_assignments(
        &self,
        student_id: &EntityId,
        completed: bool,
        projection: Document,
    ) -> PortResult<Vec<Assignment>> {
        let documents = self
            .store
            .find_many(
                ASSIGNMENTS,
                doc! { "student_id": object_id_from_entity_id(student_id), "completed": completed },
                projection,
                doc! { "_id": 1 },
            )
            .await?;
        debug!(student_id = %student_id, completed, count = documents.len(), "Assignments read from store");

        let records = documents
            .into_iter()
            .map(decode::<AssignmentRecord>)
            .collect::<PortResult<Vec<_>>>()?;
        let story_ids: Vec<Option<EntityId>> = records
            .iter()
            .map(|r| entity_id_from_bson(r.story_id.as_ref()))
            .collect();
        let titles = resolve_titles(self, &story_ids).await;

        Ok(records
            .into_iter()
            .zip(story_ids)
            .zip(titles)
            .map(|((record, story_id), story_title)| {
                record.to_domain(story_id, story_title, completed)
            })
            .collect())
    }
}

fn decode<T: DeserializeOwned>(document: Document) -> PortResult<T> {
    bson::from_document(document).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// "Impure" Store Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct StudentRecord {
    #[serde(rename = "_id")]
    id: bson::oid::ObjectId,
    first_name: Option<String>,
    email: Option<String>,
}
impl StudentRecord {
    fn to_domain(self) -> Student {
        Student {
            id: entity_id_from_object_id(&self.id),
            display_name: self.first_name,
            contact: self.email,
        }
    }
}

#[derive(Deserialize)]
struct RemainingRightsRecord {
    #[serde(default)]
    daily_story_practice: Option<Bson>,
}
impl RemainingRightsRecord {
    fn to_domain(self) -> RemainingRights {
        let daily_story_practice = match self.daily_story_practice {
            Some(Bson::Int32(n)) => Some(i64::from(n)),
            Some(Bson::Int64(n)) => Some(n),
            Some(Bson::Double(n)) if n.fract() == 0.0 => Some(n as i64),
            _ => None,
        };
        RemainingRights {
            daily_story_practice,
        }
    }
}

#[derive(Deserialize)]
struct AssignmentRecord {
    #[serde(default)]
    story_id: Option<Bson>,
    #[serde(default)]
    started: Option<Bson>,
    #[serde(default)]
    deducts_practice_rights: Option<Bson>,
    #[serde(default)]
    due_date: Option<Bson>,
}
impl AssignmentRecord {
    fn to_domain(
        self,
        story_id: Option<EntityId>,
        story_title: Option<String>,
        completed: bool,
    ) -> Assignment {
        Assignment {
            story_id,
            story_title,
            completed,
            due_date: timestamp_from_bson(self.due_date.as_ref()),
            started: self.started.as_ref().and_then(Bson::as_bool),
            deducts_practice_rights: self.deducts_practice_rights.as_ref().and_then(Bson::as_bool),
        }
    }
}

#[derive(Deserialize)]
struct StoryRefRecord {
    #[serde(default)]
    story_id: Option<Bson>,
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl StudentDirectory for DbAdapter {
    async fn fetch_students(&self) -> PortResult<Vec<Student>> {
        let documents = self
            .store
            .find_many(
                STUDENTS,
                doc! {},
                doc! { "_id": 1, "first_name": 1, "email": 1 },
                doc! { "_id": 1 },
            )
            .await?;

        Ok(documents
            .into_iter()
            .filter_map(|d| match decode::<StudentRecord>(d) {
                Ok(record) => Some(record.to_domain()),
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable student document");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl TitleLookup for DbAdapter {
    async fn fetch_story_title(&self, story_id: &EntityId) -> PortResult<Option<String>> {
        let document = self
            .store
            .find_one(
                STORIES,
                doc! { "_id": object_id_from_entity_id(story_id) },
                doc! { "title": 1, "_id": 0 },
            )
            .await?;
        Ok(document.and_then(|d| d.get_str("title").ok().map(str::to_string)))
    }
}

/// The database side of one student's bundle.
pub struct StudentScope {
    adapter: DbAdapter,
    student_id: EntityId,
}

#[async_trait]
impl BundleSource for StudentScope {
    async fn fetch_remaining_rights(&self) -> PortResult<Option<RemainingRights>> {
        self.adapter.fetch_remaining_rights(&self.student_id).await
    }

    async fn fetch_incomplete_assignments(&self) -> PortResult<Vec<Assignment>> {
        self.adapter.fetch_incomplete_assignments(&self.student_id).await
    }

    async fn fetch_completed_assignments(&self) -> PortResult<Vec<Assignment>> {
        self.adapter.fetch_completed_assignments(&self.student_id).await
    }

    async fn fetch_suggested_stories(&self) -> PortResult<Vec<SuggestedStory>> {
        self.adapter.fetch_suggested_stories(&self.student_id).await
    }
}

#[async_trait]
impl BundleProvider for DbAdapter {
    async fn open(&self, student: &Student) -> PortResult<Box<dyn BundleSource>> {
        Ok(Box::new(StudentScope {
            adapter: self.clone(),
            student_id: student.id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::memory::MemoryStore;
    use bson::oid::ObjectId;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn oid(n: u8) -> ObjectId {
        let mut bytes = [0u8; 12];
        bytes[11] = n;
        ObjectId::from_bytes(bytes)
    }

    fn id(n: u8) -> EntityId {
        entity_id_from_object_id(&oid(n))
    }

    const STUDENT: u8 = 1;
    const OTHER_STUDENT: u8 = 2;
    const RED_FOX: u8 = 10;
    const BLUE_OWL: u8 = 11;
    const GREEN_FROG: u8 = 12;

    fn stories(store: MemoryStore) -> MemoryStore {
        store
            .insert(STORIES, doc! { "_id": oid(RED_FOX), "title": "Red Fox" })
            .insert(STORIES, doc! { "_id": oid(BLUE_OWL), "title": "Blue Owl" })
            .insert(STORIES, doc! { "_id": oid(GREEN_FROG), "title": "Green Frog" })
    }

    fn adapter(store: MemoryStore) -> DbAdapter {
        DbAdapter::new(Arc::new(store))
    }

    fn assignment(n: u8, student: u8, story: Bson, completed: bool) -> Document {
        doc! {
            "_id": oid(n),
            "student_id": oid(student),
            "story_id": story,
            "completed": completed,
            "started": true,
            "deducts_practice_rights": false,
            "due_date": bson::DateTime::from_chrono(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
        }
    }

    fn suggestion(n: u8, student: u8, story: u8) -> Document {
        doc! { "_id": oid(n), "suggested_for_id": oid(student), "story_id": oid(story) }
    }

    #[tokio::test]
    async fn lists_students_with_name_and_contact() {
        let store = MemoryStore::new()
            .insert(STUDENTS, doc! { "_id": oid(2), "first_name": "Bo", "email": "b@x.com", "password": "x" })
            .insert(STUDENTS, doc! { "_id": oid(1), "first_name": "Al", "email": "a@x.com" });

        let students = adapter(store).fetch_students().await.unwrap();
        assert_eq!(
            students,
            vec![
                Student {
                    id: id(1),
                    display_name: Some("Al".to_string()),
                    contact: Some("a@x.com".to_string())
                },
                Student {
                    id: id(2),
                    display_name: Some("Bo".to_string()),
                    contact: Some("b@x.com".to_string())
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_store_lists_no_students() {
        let students = adapter(MemoryStore::new()).fetch_students().await.unwrap();
        assert!(students.is_empty());
    }

    #[tokio::test]
    async fn missing_rights_document_is_absent_not_an_error() {
        let store = MemoryStore::new()
            .insert(REMAINING_RIGHTS, doc! { "_id": oid(OTHER_STUDENT), "daily_story_practice": 2 });
        let adapter = adapter(store);

        assert_eq!(adapter.fetch_remaining_rights(&id(STUDENT)).await.unwrap(), None);
        assert_eq!(
            adapter.fetch_remaining_rights(&id(OTHER_STUDENT)).await.unwrap(),
            Some(RemainingRights {
                daily_story_practice: Some(2)
            })
        );
    }

    #[tokio::test]
    async fn incomplete_assignment_carries_its_story_title() {
        let store = stories(MemoryStore::new())
            .insert(STUDENTS, doc! { "_id": oid(STUDENT), "first_name": "Al", "email": "a@x.com" })
            .insert(ASSIGNMENTS, assignment(20, STUDENT, Bson::ObjectId(oid(RED_FOX)), false));

        let assignments = adapter(store)
            .fetch_incomplete_assignments(&id(STUDENT))
            .await
            .unwrap();

        assert_eq!(
            assignments,
            vec![Assignment {
                story_id: Some(id(RED_FOX)),
                story_title: Some("Red Fox".to_string()),
                completed: false,
                due_date: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
                started: Some(true),
                deducts_practice_rights: Some(false),
            }]
        );
    }

    #[tokio::test]
    async fn completion_filters_split_assignments_into_disjoint_sets() {
        let store = stories(MemoryStore::new())
            .insert(ASSIGNMENTS, assignment(20, STUDENT, Bson::ObjectId(oid(RED_FOX)), false))
            .insert(ASSIGNMENTS, assignment(21, STUDENT, Bson::ObjectId(oid(BLUE_OWL)), true))
            .insert(ASSIGNMENTS, assignment(22, STUDENT, Bson::ObjectId(oid(GREEN_FROG)), true))
            .insert(ASSIGNMENTS, assignment(23, OTHER_STUDENT, Bson::ObjectId(oid(RED_FOX)), false));
        let adapter = adapter(store);

        let incomplete = adapter.fetch_incomplete_assignments(&id(STUDENT)).await.unwrap();
        let completed = adapter.fetch_completed_assignments(&id(STUDENT)).await.unwrap();

        assert_eq!(incomplete.len(), 1);
        assert!(incomplete.iter().all(|a| !a.completed));
        assert_eq!(completed.len(), 2);
        assert!(completed.iter().all(|a| a.completed));
        assert!(incomplete
            .iter()
            .all(|a| completed.iter().all(|c| c.story_id != a.story_id)));

        // Completed assignments keep their due date but project no progress flags.
        assert!(completed.iter().all(|a| a.due_date.is_some()));
        assert!(completed.iter().all(|a| a.started.is_none()));
        assert!(completed.iter().all(|a| a.deducts_practice_rights.is_none()));
    }

    #[tokio::test]
    async fn unresolvable_story_references_keep_the_assignment() {
        let store = stories(MemoryStore::new())
            .insert(ASSIGNMENTS, assignment(20, STUDENT, Bson::ObjectId(oid(99)), false))
            .insert(ASSIGNMENTS, assignment(21, STUDENT, Bson::String("S1".to_string()), false));

        let assignments = adapter(store)
            .fetch_incomplete_assignments(&id(STUDENT))
            .await
            .unwrap();

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].story_id, Some(id(99)));
        assert_eq!(assignments[0].story_title, None);
        assert_eq!(assignments[1].story_id, None);
        assert_eq!(assignments[1].story_title, None);
    }

    #[tokio::test]
    async fn suggestions_drop_the_most_recent_entry() {
        // Inserted out of order; `_id` decides recency.
        let store = stories(MemoryStore::new())
            .insert(SUGGESTIONS, suggestion(32, STUDENT, GREEN_FROG))
            .insert(SUGGESTIONS, suggestion(30, STUDENT, RED_FOX))
            .insert(SUGGESTIONS, suggestion(31, STUDENT, BLUE_OWL))
            .insert(SUGGESTIONS, suggestion(33, OTHER_STUDENT, RED_FOX));

        let suggestions = adapter(store).fetch_suggested_stories(&id(STUDENT)).await.unwrap();

        assert_eq!(
            suggestions,
            vec![
                SuggestedStory {
                    story_id: Some(id(RED_FOX)),
                    story_title: Some("Red Fox".to_string())
                },
                SuggestedStory {
                    story_id: Some(id(BLUE_OWL)),
                    story_title: Some("Blue Owl".to_string())
                },
            ]
        );
    }

    #[tokio::test]
    async fn zero_or_one_suggestion_yields_empty_history() {
        let store = stories(MemoryStore::new()).insert(SUGGESTIONS, suggestion(30, OTHER_STUDENT, RED_FOX));
        let adapter = adapter(store);

        assert!(adapter.fetch_suggested_stories(&id(STUDENT)).await.unwrap().is_empty());
        assert!(adapter.fetch_suggested_stories(&id(OTHER_STUDENT)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn title_lookup_is_idempotent_and_absent_for_missing_stories() {
        let adapter = adapter(stories(MemoryStore::new()));

        let first = adapter.fetch_story_title(&id(RED_FOX)).await.unwrap();
        let second = adapter.fetch_story_title(&id(RED_FOX)).await.unwrap();
        assert_eq!(first.as_deref(), Some("Red Fox"));
        assert_eq!(first, second);

        assert_eq!(adapter.fetch_story_title(&id(99)).await.unwrap(), None);
        assert_eq!(adapter.fetch_story_title(&id(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unreachable_store_surfaces_transport_errors() {
        let adapter = adapter(MemoryStore::offline());

        assert!(matches!(
            adapter.fetch_remaining_rights(&id(STUDENT)).await,
            Err(PortError::Transport(_))
        ));
        assert!(matches!(
            adapter.fetch_students().await,
            Err(PortError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn opened_scope_reads_the_selected_student() {
        let store = MemoryStore::new()
            .insert(REMAINING_RIGHTS, doc! { "_id": oid(STUDENT), "daily_story_practice": 4_i64 });
        let adapter = adapter(store);
        let student = Student {
            id: id(STUDENT),
            display_name: None,
            contact: None,
        };

        let scope = adapter.open(&student).await.unwrap();
        assert_eq!(
            scope.fetch_remaining_rights().await.unwrap(),
            Some(RemainingRights {
                daily_story_practice: Some(4)
            })
        );
    }
}
