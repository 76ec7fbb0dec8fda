use crate::{CourseId, Time};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct LectureId(pub i64);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Video,
    Text,
    Link,
    File,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Text => "text",
            ContentKind::Link => "link",
            ContentKind::File => "file",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<ContentKind, String> {
        match s {
            "video" => Ok(ContentKind::Video),
            "text" => Ok(ContentKind::Text),
            "link" => Ok(ContentKind::Link),
            "file" => Ok(ContentKind::File),
            _ => Err(format!("unknown content kind {s:?}")),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Lecture {
    pub id: LectureId,
    pub course: CourseId,
    pub title: String,
    pub content_type: ContentKind,

    #[serde(default)]
    pub content_text: String,
    /// Video URL for `video`, target URL for `link`
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub file_url: Option<String>,

    /// Display order within the course
    pub order: u32,
    /// In seconds
    #[serde(default)]
    pub duration: u32,

    pub created_at: Time,
    pub updated_at: Time,
}

impl Lecture {
    pub fn summary(&self) -> LectureSummary {
        LectureSummary {
            id: self.id,
            course: self.course,
            title: self.title.clone(),
            content_type: self.content_type,
            order: self.order,
            duration: self.duration,
        }
    }
}

/// Lecture as listed inside a course
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LectureSummary {
    pub id: LectureId,
    pub course: CourseId,
    pub title: String,
    pub content_type: ContentKind,
    pub order: u32,
    #[serde(default)]
    pub duration: u32,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewLecture {
    pub course: CourseId,
    pub title: String,
    pub content_type: ContentKind,
    #[serde(default)]
    pub content_text: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    pub order: u32,
    pub duration: u32,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LectureUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LectureQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<CourseId>,
}
