use chrono::Utc;

pub type Time = chrono::DateTime<Utc>;

mod auth;
pub use auth::{AccessToken, LoginRequest, RefreshRequest, TokenPair};

mod comment;
pub use comment::{Comment, CommentId, CommentOrdering, CommentQuery, CommentUpdate, NewComment};

mod course;
pub use course::{Course, CourseDetail, CourseId, CourseQuery, CourseUpdate, NewCourse};

mod enrollment;
pub use enrollment::{Enrollment, EnrollmentId, EnrollmentQuery, NewEnrollment};

mod error;
pub use error::Error;

mod lecture;
pub use lecture::{
    ContentKind, Lecture, LectureId, LectureQuery, LectureSummary, LectureUpdate, NewLecture,
};

mod page;
pub use page::Page;

mod progress;
pub use progress::{NewProgress, ProgressId, ProgressQuery, ProgressRecord, ProgressUpdate};

mod user;
pub use user::{PasswordChange, ProfileUpdate, Registration, User, UserId, UserSummary};

/// Generates the `Display` impl used to splice ids into REST paths
macro_rules! display_id {
    ($($id:ty),*) => {
        $(
            impl std::fmt::Display for $id {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }
        )*
    };
}

display_id!(
    CommentId,
    CourseId,
    EnrollmentId,
    LectureId,
    ProgressId,
    UserId
);
