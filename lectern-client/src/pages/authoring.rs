use std::sync::Arc;

use futures::future;

use crate::{
    api::{
        Course, CourseId, CourseQuery, CourseUpdate, EnrollmentQuery, Lecture, LectureId,
        LectureQuery, LectureUpdate, NewCourse, NewLecture, UserId,
    },
    forms, Backend, Loadable, Result, Screen,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DashboardCourse {
    pub course: Course,
    pub enrollments: u64,
}

/// Course and lecture management for an instructor.
///
/// Every write is validated locally first; invalid input never reaches the
/// backend.
pub struct Authoring<B> {
    backend: Arc<B>,
    instructor: UserId,
    state: Loadable<Vec<DashboardCourse>>,
}

impl<B: Backend> Authoring<B> {
    pub fn new(backend: Arc<B>, instructor: UserId) -> Authoring<B> {
        Authoring {
            backend,
            instructor,
            state: Loadable::Loading,
        }
    }

    pub fn state(&self) -> &Loadable<Vec<DashboardCourse>> {
        &self.state
    }

    pub fn published_count(&self) -> usize {
        self.state
            .ready()
            .map(|v| v.iter().filter(|c| c.course.is_published).count())
            .unwrap_or(0)
    }

    pub fn total_enrollments(&self) -> u64 {
        self.state
            .ready()
            .map(|v| v.iter().map(|c| c.enrollments).sum())
            .unwrap_or(0)
    }

    pub async fn load(&mut self) -> &Loadable<Vec<DashboardCourse>> {
        self.state = Loadable::Loading;
        let res = self.fetch().await;
        self.state = Loadable::from_result(Screen::InstructorDashboard, res, |v| v.is_empty());
        &self.state
    }

    async fn fetch(&self) -> Result<Vec<DashboardCourse>> {
        let courses = self
            .backend
            .list_courses(&CourseQuery {
                instructor: Some(self.instructor),
                ..CourseQuery::default()
            })
            .await?
            .results;
        Ok(future::join_all(courses.into_iter().map(|c| self.with_stats(c))).await)
    }

    /// Statistics that fail to load show as zero
    async fn with_stats(&self, course: Course) -> DashboardCourse {
        let res = self
            .backend
            .list_enrollments(&EnrollmentQuery {
                course: Some(course.id),
            })
            .await;
        let enrollments = match res {
            Ok(page) => page.count,
            Err(e) => {
                tracing::warn!(course = %course.id, err=?e, "failed loading course statistics");
                0
            }
        };
        DashboardCourse {
            course,
            enrollments,
        }
    }

    async fn refetch(&mut self) {
        let res = self.fetch().await;
        self.state
            .refresh(Screen::InstructorDashboard, res, |v| v.is_empty());
    }

    pub async fn create_course(&mut self, course: &NewCourse) -> Result<Course> {
        forms::validate_new_course(course)?;
        let created = self.backend.create_course(course).await?;
        tracing::info!(course = %created.id, title = %created.title, "created course");
        self.refetch().await;
        Ok(created)
    }

    pub async fn update_course(&mut self, id: CourseId, update: &CourseUpdate) -> Result<Course> {
        forms::validate_course_update(update)?;
        let updated = self.backend.update_course(id, update).await?;
        self.refetch().await;
        Ok(updated)
    }

    pub async fn delete_course(&mut self, id: CourseId) -> Result<()> {
        self.backend.delete_course(id).await?;
        tracing::info!(course = %id, "deleted course");
        self.refetch().await;
        Ok(())
    }

    /// Lecture management for one of the instructor's courses
    pub fn lectures(&self, course: CourseId) -> CourseLectures<B> {
        CourseLectures::new(self.backend.clone(), course)
    }

    pub async fn create_lecture(&mut self, lecture: &NewLecture) -> Result<Lecture> {
        let created = create_lecture(&*self.backend, lecture).await?;
        self.refetch().await;
        Ok(created)
    }

    pub async fn update_lecture(
        &mut self,
        existing: &Lecture,
        update: &LectureUpdate,
    ) -> Result<Lecture> {
        let updated = update_lecture(&*self.backend, existing, update).await?;
        self.refetch().await;
        Ok(updated)
    }

    pub async fn delete_lecture(&mut self, id: LectureId) -> Result<()> {
        delete_lecture(&*self.backend, id).await?;
        self.refetch().await;
        Ok(())
    }
}

/// The lectures of one course, in display order, as its instructor edits
/// them
pub struct CourseLectures<B> {
    backend: Arc<B>,
    course: CourseId,
    state: Loadable<Vec<Lecture>>,
}

impl<B: Backend> CourseLectures<B> {
    pub fn new(backend: Arc<B>, course: CourseId) -> CourseLectures<B> {
        CourseLectures {
            backend,
            course,
            state: Loadable::Loading,
        }
    }

    pub fn course(&self) -> CourseId {
        self.course
    }

    pub fn state(&self) -> &Loadable<Vec<Lecture>> {
        &self.state
    }

    /// Display order to give a lecture appended at the end
    pub fn next_order(&self) -> u32 {
        self.state
            .ready()
            .and_then(|l| l.iter().map(|l| l.order).max())
            .map_or(1, |o| o + 1)
    }

    pub async fn load(&mut self) -> &Loadable<Vec<Lecture>> {
        self.state = Loadable::Loading;
        let res = self.fetch().await;
        self.state = Loadable::from_result(Screen::CourseLectures, res, |v| v.is_empty());
        &self.state
    }

    async fn fetch(&self) -> Result<Vec<Lecture>> {
        let mut lectures = self
            .backend
            .list_lectures(&LectureQuery {
                course: Some(self.course),
            })
            .await?
            .results;
        lectures.sort_by_key(|l| l.order);
        Ok(lectures)
    }

    async fn refetch(&mut self) {
        let res = self.fetch().await;
        self.state
            .refresh(Screen::CourseLectures, res, |v| v.is_empty());
    }

    pub async fn create(&mut self, lecture: &NewLecture) -> Result<Lecture> {
        let created = create_lecture(&*self.backend, lecture).await?;
        self.refetch().await;
        Ok(created)
    }

    pub async fn update(&mut self, existing: &Lecture, update: &LectureUpdate) -> Result<Lecture> {
        let updated = update_lecture(&*self.backend, existing, update).await?;
        self.refetch().await;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: LectureId) -> Result<()> {
        delete_lecture(&*self.backend, id).await?;
        self.refetch().await;
        Ok(())
    }
}

async fn create_lecture<B: Backend + ?Sized>(backend: &B, lecture: &NewLecture) -> Result<Lecture> {
    forms::validate_new_lecture(lecture)?;
    let created = backend.create_lecture(lecture).await?;
    tracing::info!(lecture = %created.id, course = %created.course, "created lecture");
    Ok(created)
}

async fn update_lecture<B: Backend + ?Sized>(
    backend: &B,
    existing: &Lecture,
    update: &LectureUpdate,
) -> Result<Lecture> {
    forms::validate_lecture_update(existing, update)?;
    backend.update_lecture(existing.id, update).await
}

async fn delete_lecture<B: Backend + ?Sized>(backend: &B, id: LectureId) -> Result<()> {
    backend.delete_lecture(id).await?;
    tracing::info!(lecture = %id, "deleted lecture");
    Ok(())
}
