//! Per-screen controllers: each owns the view state of one screen and
//! drives the backend calls behind its user actions.

mod authoring;
pub use authoring::{Authoring, CourseLectures, DashboardCourse};

mod catalog;
pub use catalog::{Catalog, EnrolledCourse, MyCourses};

mod comments;
pub use comments::CommentThread;

mod course;
pub use course::{CoursePage, CourseView};

mod lecture;
pub use lecture::{CourseOutline, LecturePlayer, LectureView};
