//! In-memory implementation of EnrollmentStore.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{CourseId, DomainError, EnrollmentId, UserId};
use crate::ports::EnrollmentStore;

/// In-memory enrollment store.
pub struct InMemoryEnrollmentStore {
    records: RwLock<HashMap<EnrollmentId, Enrollment>>,
    counts: RwLock<HashMap<CourseId, u64>>,
}

impl InMemoryEnrollmentStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            counts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryEnrollmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        if records.contains_key(&enrollment.id) {
            return Ok(false);
        }
        records.insert(enrollment.id, enrollment.clone());
        Ok(true)
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|e| &e.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn increment_enrolled_count(&self, course_id: &CourseId) -> Result<(), DomainError> {
        let mut counts = self.counts.write().await;
        *counts.entry(*course_id).or_insert(0) += 1;
        Ok(())
    }

    async fn enrolled_count(&self, course_id: &CourseId) -> Result<u64, DomainError> {
        let counts = self.counts.read().await;
        Ok(counts.get(course_id).copied().unwrap_or(0))
    }
}
