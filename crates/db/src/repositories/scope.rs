//! Resolves an [`AuthorizationScope`] into the set of students it may see.

use bursar_core::fees::{AuthorizationScope, FeeError, Visibility};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use super::unit_of_work::db_err;
use crate::entities::{class_teachers, student_guardians, students};

/// Students visible to a scope. `None` means unrestricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleStudents(Option<Vec<Uuid>>);

impl VisibleStudents {
    /// Unrestricted visibility.
    #[must_use]
    pub const fn all() -> Self {
        Self(None)
    }

    /// Visibility limited to the given students.
    #[must_use]
    pub const fn only(student_ids: Vec<Uuid>) -> Self {
        Self(Some(student_ids))
    }

    /// The allowed student IDs, or `None` when unrestricted.
    #[must_use]
    pub fn ids(&self) -> Option<&[Uuid]> {
        self.0.as_deref()
    }

    /// Returns true if the scope can see nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.as_ref().is_some_and(Vec::is_empty)
    }

    /// Returns true if the student is visible.
    #[must_use]
    pub fn contains(&self, student_id: Uuid) -> bool {
        self.0.as_ref().is_none_or(|ids| ids.contains(&student_id))
    }
}

/// Loads the students a scope may see.
///
/// - admin and staff see everyone
/// - a teacher sees students enrolled in classes they teach
/// - a student sees the student record linked to their user
/// - a parent sees the students they are a guardian of
pub async fn visible_students<C: ConnectionTrait>(
    conn: &C,
    scope: &AuthorizationScope,
) -> Result<VisibleStudents, FeeError> {
    let ids: Vec<Uuid> = match scope.visibility() {
        Visibility::All => return Ok(VisibleStudents::all()),
        Visibility::TaughtBy(teacher_id) => {
            let class_ids: Vec<Uuid> = class_teachers::Entity::find()
                .select_only()
                .column(class_teachers::Column::ClassId)
                .filter(class_teachers::Column::TeacherId.eq(teacher_id))
                .into_tuple()
                .all(conn)
                .await
                .map_err(db_err)?;
            if class_ids.is_empty() {
                return Ok(VisibleStudents::only(Vec::new()));
            }
            students::Entity::find()
                .select_only()
                .column(students::Column::Id)
                .filter(students::Column::ClassId.is_in(class_ids))
                .into_tuple()
                .all(conn)
                .await
                .map_err(db_err)?
        }
        Visibility::SelfStudent(user_id) => students::Entity::find()
            .select_only()
            .column(students::Column::Id)
            .filter(students::Column::UserId.eq(user_id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(db_err)?,
        Visibility::ChildrenOf(guardian_id) => student_guardians::Entity::find()
            .select_only()
            .column(student_guardians::Column::StudentId)
            .filter(student_guardians::Column::GuardianId.eq(guardian_id))
            .into_tuple()
            .all(conn)
            .await
            .map_err(db_err)?,
    };

    Ok(VisibleStudents::only(ids))
}
