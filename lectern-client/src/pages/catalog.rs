use std::sync::Arc;

use futures::future;

use crate::{
    api::{Course, CourseDetail, CourseQuery, Enrollment, EnrollmentQuery, Page},
    progress, Backend, Loadable, Result, Screen,
};

/// The public course list, with search, category and ordering filters
pub struct Catalog<B> {
    backend: Arc<B>,
    query: CourseQuery,
    state: Loadable<Page<Course>>,
}

impl<B: Backend> Catalog<B> {
    pub fn new(backend: Arc<B>, query: CourseQuery) -> Catalog<B> {
        Catalog {
            backend,
            query,
            state: Loadable::Loading,
        }
    }

    pub fn query(&self) -> &CourseQuery {
        &self.query
    }

    pub fn state(&self) -> &Loadable<Page<Course>> {
        &self.state
    }

    pub async fn load(&mut self) -> &Loadable<Page<Course>> {
        self.state = Loadable::Loading;
        let res = self.backend.list_courses(&self.query).await;
        self.state = Loadable::from_result(Screen::Catalog, res, |p| p.is_empty());
        &self.state
    }

    pub async fn set_query(&mut self, query: CourseQuery) -> &Loadable<Page<Course>> {
        self.query = query;
        self.load().await
    }

    pub async fn retry(&mut self) -> &Loadable<Page<Course>> {
        self.load().await
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnrolledCourse {
    pub enrollment: Enrollment,
    pub course: CourseDetail,
    pub completed_lectures: usize,
    pub percentage: u8,
}

/// Courses the current user is enrolled in, with their progress
pub struct MyCourses<B> {
    backend: Arc<B>,
    state: Loadable<Vec<EnrolledCourse>>,
}

impl<B: Backend> MyCourses<B> {
    pub fn new(backend: Arc<B>) -> MyCourses<B> {
        MyCourses {
            backend,
            state: Loadable::Loading,
        }
    }

    pub fn state(&self) -> &Loadable<Vec<EnrolledCourse>> {
        &self.state
    }

    /// Courses whose details fail to load are left out rather than failing
    /// the whole list
    pub async fn load(&mut self) -> &Loadable<Vec<EnrolledCourse>> {
        self.state = Loadable::Loading;
        let res = self.fetch().await;
        self.state = Loadable::from_result(Screen::MyCourses, res, |v| v.is_empty());
        &self.state
    }

    async fn fetch(&self) -> Result<Vec<EnrolledCourse>> {
        let enrollments = self
            .backend
            .list_enrollments(&EnrollmentQuery::default())
            .await?
            .results;
        let courses = future::join_all(enrollments.into_iter().map(|e| self.fetch_one(e))).await;
        Ok(courses.into_iter().flatten().collect())
    }

    async fn fetch_one(&self, enrollment: Enrollment) -> Option<EnrolledCourse> {
        let res = futures::try_join!(
            self.backend.get_course(enrollment.course),
            progress::course_progress(&*self.backend, enrollment.course),
        );
        match res {
            Ok((course, records)) => Some(EnrolledCourse {
                completed_lectures: records.iter().filter(|r| r.completed).count(),
                percentage: progress::calculate_course_progress(
                    &records,
                    course.lectures.len() as i64,
                ),
                enrollment,
                course,
            }),
            Err(e) => {
                tracing::warn!(course = %enrollment.course, err=?e, "failed loading enrolled course");
                None
            }
        }
    }
}
