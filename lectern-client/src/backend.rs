use async_trait::async_trait;

use crate::{
    api::{
        AccessToken, Comment, CommentId, CommentQuery, CommentUpdate, Course, CourseDetail,
        CourseId, CourseQuery, CourseUpdate, Enrollment, EnrollmentId, EnrollmentQuery, Lecture,
        LectureId, LectureQuery, LectureUpdate, LoginRequest, NewComment, NewCourse, NewLecture,
        NewProgress, Page, PasswordChange, ProfileUpdate, ProgressId, ProgressQuery,
        ProgressRecord, ProgressUpdate, Registration, TokenPair, User,
    },
    Result,
};

/// Everything the client can ask of the e-learning server.
///
/// Implementations hold the current bearer tokens; calls that need
/// authentication use them implicitly.
#[async_trait]
pub trait Backend: Send + Sync {
    fn tokens(&self) -> Option<TokenPair>;
    fn set_tokens(&self, tokens: Option<TokenPair>);

    // Authentication
    async fn login(&self, req: &LoginRequest) -> Result<TokenPair>;
    async fn register(&self, req: &Registration) -> Result<()>;
    async fn profile(&self) -> Result<User>;
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User>;
    async fn change_password(&self, change: &PasswordChange) -> Result<()>;
    async fn refresh_token(&self, refresh: &str) -> Result<AccessToken>;

    // Courses
    async fn list_courses(&self, query: &CourseQuery) -> Result<Page<Course>>;
    async fn get_course(&self, id: CourseId) -> Result<CourseDetail>;
    async fn create_course(&self, course: &NewCourse) -> Result<Course>;
    async fn update_course(&self, id: CourseId, update: &CourseUpdate) -> Result<Course>;
    async fn delete_course(&self, id: CourseId) -> Result<()>;

    // Lectures
    async fn list_lectures(&self, query: &LectureQuery) -> Result<Page<Lecture>>;
    async fn get_lecture(&self, id: LectureId) -> Result<Lecture>;
    async fn create_lecture(&self, lecture: &NewLecture) -> Result<Lecture>;
    async fn update_lecture(&self, id: LectureId, update: &LectureUpdate) -> Result<Lecture>;
    async fn delete_lecture(&self, id: LectureId) -> Result<()>;

    // Enrollments
    async fn list_enrollments(&self, query: &EnrollmentQuery) -> Result<Page<Enrollment>>;
    async fn enroll(&self, course: CourseId) -> Result<Enrollment>;
    async fn unenroll(&self, id: EnrollmentId) -> Result<()>;

    // Progress
    async fn list_progress(&self, query: &ProgressQuery) -> Result<Page<ProgressRecord>>;
    async fn create_progress(&self, progress: &NewProgress) -> Result<ProgressRecord>;
    async fn update_progress(&self, id: ProgressId, update: &ProgressUpdate)
        -> Result<ProgressRecord>;

    // Comments
    async fn list_comments(&self, query: &CommentQuery) -> Result<Page<Comment>>;
    async fn create_comment(&self, comment: &NewComment) -> Result<Comment>;
    async fn update_comment(&self, id: CommentId, update: &CommentUpdate) -> Result<Comment>;
    async fn delete_comment(&self, id: CommentId) -> Result<()>;
}
