use crate::{CourseId, LectureId, Time};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct ProgressId(pub i64);

/// Completion state of one lecture for the current user
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProgressRecord {
    pub id: ProgressId,
    pub lecture: LectureId,
    pub completed: bool,

    /// Between 0 and 100
    #[serde(default)]
    pub progress_percentage: u8,

    pub updated_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewProgress {
    pub lecture: LectureId,
    pub completed: bool,
    pub progress_percentage: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProgressUpdate {
    pub completed: bool,
    pub progress_percentage: u8,
}

impl ProgressUpdate {
    pub fn completed() -> ProgressUpdate {
        ProgressUpdate {
            completed: true,
            progress_percentage: 100,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ProgressQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecture: Option<LectureId>,
    #[serde(rename = "lecture__course", skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseId>,
}
