use crate::{LectureId, Time, UserSummary};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub i64);

/// A comment as returned by the server: a flat record, replies point to their
/// parent through `parent`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub lecture: LectureId,
    pub author: UserSummary,

    /// None for a root comment
    #[serde(default)]
    pub parent: Option<CommentId>,

    pub content: String,
    pub created_at: Time,
    pub updated_at: Time,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub lecture: LectureId,
    pub parent: Option<CommentId>,
    pub content: String,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentUpdate {
    pub content: String,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum CommentOrdering {
    #[serde(rename = "created_at")]
    OldestFirst,
    #[default]
    #[serde(rename = "-created_at")]
    NewestFirst,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lecture: Option<LectureId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<CommentOrdering>,
}

impl CommentQuery {
    pub fn for_lecture(lecture: LectureId, ordering: CommentOrdering) -> CommentQuery {
        CommentQuery {
            lecture: Some(lecture),
            ordering: Some(ordering),
        }
    }
}
