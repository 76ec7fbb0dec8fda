use crate::{CourseId, Time};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct EnrollmentId(pub i64);

/// Links the current user to a course; at most one per (user, course)
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub course: CourseId,
    pub enrolled_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewEnrollment {
    pub course: CourseId,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EnrollmentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseId>,
}
