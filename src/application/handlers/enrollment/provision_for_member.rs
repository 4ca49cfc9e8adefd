//! ProvisionCourseAccessHandler - idempotent enrollment provisioning.

use std::sync::Arc;

use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{DomainError, ErrorCode, OrganizationId, UserId};
use crate::ports::{EnrollmentStore, OrganizationStore};

/// Command to provision enrollments for one member across their
/// organization's purchased courses.
#[derive(Debug, Clone)]
pub struct ProvisionCourseAccessCommand {
    pub organization_id: OrganizationId,
    pub user_id: UserId,
}

/// What a provisioning pass created.
#[derive(Debug, Clone)]
pub struct ProvisionCourseAccessResult {
    /// Enrollments newly created by this pass.
    pub provisioned: u32,

    /// Courses the organization has purchased.
    pub total_courses: u32,
}

/// Provisions enrollments for a member.
///
/// The pass walks the organization's purchased courses and inserts an
/// enrollment per (user, course) pair. Identities are derived, and inserts
/// go through `insert_if_absent`, so a retried or replayed pass creates
/// nothing new and inflates no counters.
pub struct ProvisionCourseAccessHandler {
    organizations: Arc<dyn OrganizationStore>,
    enrollments: Arc<dyn EnrollmentStore>,
}

impl ProvisionCourseAccessHandler {
    pub fn new(
        organizations: Arc<dyn OrganizationStore>,
        enrollments: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            organizations,
            enrollments,
        }
    }

    pub async fn handle(
        &self,
        command: ProvisionCourseAccessCommand,
    ) -> Result<ProvisionCourseAccessResult, DomainError> {
        let organization = self
            .organizations
            .get(&command.organization_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::OrganizationNotFound,
                    format!("Organization not found: {}", command.organization_id),
                )
            })?;

        let total_courses = organization.purchased_course_ids.len() as u32;
        let mut provisioned = 0u32;

        for course_id in &organization.purchased_course_ids {
            let enrollment =
                Enrollment::provision(command.user_id.clone(), *course_id, organization.id);

            if self.enrollments.insert_if_absent(&enrollment).await? {
                // Counter moves only with an actual insert.
                self.enrollments.increment_enrolled_count(course_id).await?;
                provisioned += 1;
            }
        }

        tracing::info!(
            organization_id = %command.organization_id,
            user_id = %command.user_id.as_str(),
            provisioned,
            total_courses,
            "enrollment provisioning pass complete"
        );

        Ok(ProvisionCourseAccessResult {
            provisioned,
            total_courses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::CourseId;
    use crate::domain::organization::{Organization, OrganizationKind, SubscriptionStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    struct MockOrganizationStore {
        organization: Option<Organization>,
    }

    #[async_trait]
    impl OrganizationStore for MockOrganizationStore {
        async fn insert(&self, _organization: &Organization) -> Result<(), DomainError> {
            Ok(())
        }

        async fn get(&self, _id: &OrganizationId) -> Result<Option<Organization>, DomainError> {
            Ok(self.organization.clone())
        }

        async fn find_by_billing_subscription(
            &self,
            _billing_subscription_id: &str,
        ) -> Result<Option<Organization>, DomainError> {
            Ok(None)
        }

        async fn update(&self, _organization: &Organization) -> Result<(), DomainError> {
            Ok(())
        }

        async fn set_subscription(
            &self,
            _id: &OrganizationId,
            _status: SubscriptionStatus,
            _plan: Option<&str>,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn adjust_member_count(
            &self,
            _id: &OrganizationId,
            _delta: i32,
        ) -> Result<(), DomainError> {
            Ok(())
        }

        async fn reserve_member_slot(
            &self,
            _id: &OrganizationId,
            _cap: Option<u32>,
        ) -> Result<bool, DomainError> {
            Ok(true)
        }
    }

    struct MockEnrollmentStore {
        enrollments: RwLock<HashMap<crate::domain::foundation::EnrollmentId, Enrollment>>,
        counters: RwLock<HashMap<CourseId, u64>>,
    }

    impl MockEnrollmentStore {
        fn new() -> Self {
            Self {
                enrollments: RwLock::new(HashMap::new()),
                counters: RwLock::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl EnrollmentStore for MockEnrollmentStore {
        async fn insert_if_absent(&self, enrollment: &Enrollment) -> Result<bool, DomainError> {
            let mut enrollments = self.enrollments.write().await;
            if enrollments.contains_key(&enrollment.id) {
                Ok(false)
            } else {
                enrollments.insert(enrollment.id, enrollment.clone());
                Ok(true)
            }
        }

        async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Enrollment>, DomainError> {
            Ok(self
                .enrollments
                .read()
                .await
                .values()
                .filter(|e| &e.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn increment_enrolled_count(&self, course_id: &CourseId) -> Result<(), DomainError> {
            *self.counters.write().await.entry(*course_id).or_insert(0) += 1;
            Ok(())
        }

        async fn enrolled_count(&self, course_id: &CourseId) -> Result<u64, DomainError> {
            Ok(self.counters.read().await.get(course_id).copied().unwrap_or(0))
        }
    }

    fn org_with_courses(courses: Vec<CourseId>) -> Organization {
        let mut organization = Organization::create(
            OrganizationId::new(),
            "Acme Corp",
            OrganizationKind::Company,
            UserId::new("owner-1").unwrap(),
        );
        organization.purchased_course_ids = courses;
        organization
    }

    fn handler(
        organization: Option<Organization>,
        enrollments: Arc<MockEnrollmentStore>,
    ) -> ProvisionCourseAccessHandler {
        ProvisionCourseAccessHandler::new(
            Arc::new(MockOrganizationStore { organization }),
            enrollments,
        )
    }

    #[tokio::test]
    async fn provisions_every_purchased_course() {
        let courses = vec![CourseId::new(), CourseId::new(), CourseId::new()];
        let organization = org_with_courses(courses.clone());
        let store = Arc::new(MockEnrollmentStore::new());
        let handler = handler(Some(organization.clone()), Arc::clone(&store));

        let result = handler
            .handle(ProvisionCourseAccessCommand {
                organization_id: organization.id,
                user_id: UserId::new("user-1").unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(result.provisioned, 3);
        assert_eq!(result.total_courses, 3);
        for course in &courses {
            assert_eq!(store.enrolled_count(course).await.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn repeated_pass_creates_nothing_and_keeps_counters() {
        let course = CourseId::new();
        let organization = org_with_courses(vec![course]);
        let store = Arc::new(MockEnrollmentStore::new());
        let handler = handler(Some(organization.clone()), Arc::clone(&store));
        let command = ProvisionCourseAccessCommand {
            organization_id: organization.id,
            user_id: UserId::new("user-2").unwrap(),
        };

        let first = handler.handle(command.clone()).await.unwrap();
        let second = handler.handle(command).await.unwrap();

        assert_eq!(first.provisioned, 1);
        assert_eq!(second.provisioned, 0);
        assert_eq!(store.enrolled_count(&course).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn partial_failure_retry_fills_only_gaps() {
        let course_a = CourseId::new();
        let course_b = CourseId::new();
        let organization = org_with_courses(vec![course_a, course_b]);
        let store = Arc::new(MockEnrollmentStore::new());
        let user = UserId::new("user-3").unwrap();

        // First pass landed only course A before failing.
        let pre_existing = Enrollment::provision(user.clone(), course_a, organization.id);
        store.insert_if_absent(&pre_existing).await.unwrap();
        store.increment_enrolled_count(&course_a).await.unwrap();

        let handler = handler(Some(organization.clone()), Arc::clone(&store));
        let result = handler
            .handle(ProvisionCourseAccessCommand {
                organization_id: organization.id,
                user_id: user,
            })
            .await
            .unwrap();

        assert_eq!(result.provisioned, 1);
        assert_eq!(store.enrolled_count(&course_a).await.unwrap(), 1);
        assert_eq!(store.enrolled_count(&course_b).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_organization_fails() {
        let store = Arc::new(MockEnrollmentStore::new());
        let handler = handler(None, store);

        let result = handler
            .handle(ProvisionCourseAccessCommand {
                organization_id: OrganizationId::new(),
                user_id: UserId::new("user-4").unwrap(),
            })
            .await;

        assert!(matches!(
            result,
            Err(ref e) if e.code == ErrorCode::OrganizationNotFound
        ));
    }
}
