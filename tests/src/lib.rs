//! Shared fixtures for the integration tests: a mock server populated with
//! one instructor, one student and a published three-lecture course.

use std::sync::Arc;

use lectern_api::{
    ContentKind, Course, CourseId, Lecture, LoginRequest, NewCourse, NewLecture, UserId,
};
use lectern_client::Backend;
use lectern_mock_server::MockServer;

pub const PASSWORD: &str = "correct horse battery";

pub const INSTRUCTOR: &str = "prof";
pub const STUDENT: &str = "student";

/// Length of every video lecture of the fixture, in seconds
pub const VIDEO_DURATION: u32 = 600;

pub struct Fixture {
    pub server: MockServer,
    pub instructor: UserId,
    pub student: UserId,
    pub course: Course,
    /// In display order: video, text, video
    pub lectures: Vec<Lecture>,
}

impl Fixture {
    pub fn new() -> Fixture {
        let server = MockServer::new();
        let instructor = server.admin_create_user(INSTRUCTOR, PASSWORD);
        let student = server.admin_create_user(STUDENT, PASSWORD);
        let course = server.admin_create_course(instructor, new_course("Rust for everyone"));
        // created out of order, to check clients sort by display order
        let third = server.admin_create_lecture(video_lecture(course.id, "Traits", 3));
        let first = server.admin_create_lecture(video_lecture(course.id, "Ownership", 1));
        let second = server.admin_create_lecture(text_lecture(course.id, "Borrowing", 2));
        Fixture {
            server,
            instructor,
            student,
            course,
            lectures: vec![first, second, third],
        }
    }

    /// A fresh connection, logged out
    pub fn anonymous(&self) -> Arc<MockServer> {
        Arc::new(self.server.client())
    }

    pub async fn as_student(&self) -> Arc<MockServer> {
        self.logged_in(STUDENT).await
    }

    pub async fn as_instructor(&self) -> Arc<MockServer> {
        self.logged_in(INSTRUCTOR).await
    }

    pub async fn logged_in(&self, username: &str) -> Arc<MockServer> {
        let client = self.anonymous();
        login(&*client, username).await;
        client
    }

    pub fn lecture_ids(&self) -> Vec<lectern_api::LectureId> {
        self.lectures.iter().map(|l| l.id).collect()
    }
}

impl Default for Fixture {
    fn default() -> Fixture {
        Fixture::new()
    }
}

pub async fn login(backend: &MockServer, username: &str) {
    let tokens = backend
        .login(&LoginRequest {
            username: String::from(username),
            password: String::from(PASSWORD),
        })
        .await
        .unwrap_or_else(|e| panic!("logging in as {username}: {e:?}"));
    backend.set_tokens(Some(tokens));
}

pub fn new_course(title: &str) -> NewCourse {
    NewCourse {
        title: String::from(title),
        description: String::from("Everything you need to get started"),
        thumbnail: Some(String::from("https://cdn.example.org/thumb.png")),
        category: Some(String::from("programming")),
        is_published: true,
    }
}

pub fn video_lecture(course: CourseId, title: &str, order: u32) -> NewLecture {
    NewLecture {
        course,
        title: String::from(title),
        content_type: ContentKind::Video,
        content_text: String::new(),
        video_url: format!("https://videos.example.org/{order}.mp4"),
        file_url: None,
        order,
        duration: VIDEO_DURATION,
    }
}

pub fn text_lecture(course: CourseId, title: &str, order: u32) -> NewLecture {
    NewLecture {
        course,
        title: String::from(title),
        content_type: ContentKind::Text,
        content_text: String::from("Read this carefully."),
        video_url: String::new(),
        file_url: None,
        order,
        duration: 0,
    }
}
