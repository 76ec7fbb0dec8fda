use std::{collections::HashMap, sync::Arc};

use crate::{
    api::{CourseDetail, CourseId, Enrollment, EnrollmentQuery, LectureId, ProgressRecord},
    progress, Backend, Loadable, Result, Screen,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CourseView {
    pub detail: CourseDetail,
    /// `None` when not enrolled, or when browsing anonymously
    pub enrollment: Option<Enrollment>,
    pub progress: HashMap<LectureId, bool>,
    pub percentage: u8,
}

impl CourseView {
    pub fn is_enrolled(&self) -> bool {
        self.enrollment.is_some()
    }

    /// Where "start learning" leads
    pub fn first_lecture(&self) -> Option<LectureId> {
        self.detail
            .lectures
            .iter()
            .min_by_key(|l| l.order)
            .map(|l| l.id)
    }
}

/// Details of one course, along with the user's enrollment and progress
pub struct CoursePage<B> {
    backend: Arc<B>,
    id: CourseId,
    state: Loadable<CourseView>,
}

impl<B: Backend> CoursePage<B> {
    pub fn new(backend: Arc<B>, id: CourseId) -> CoursePage<B> {
        CoursePage {
            backend,
            id,
            state: Loadable::Loading,
        }
    }

    pub fn id(&self) -> CourseId {
        self.id
    }

    pub fn state(&self) -> &Loadable<CourseView> {
        &self.state
    }

    pub async fn load(&mut self) -> &Loadable<CourseView> {
        self.state = Loadable::Loading;
        let res = self.fetch().await;
        self.state = Loadable::from_result(Screen::Course, res, |_| false);
        &self.state
    }

    async fn fetch(&self) -> Result<CourseView> {
        let (detail, enrollment, records) = if self.backend.tokens().is_some() {
            futures::try_join!(
                self.backend.get_course(self.id),
                self.enrollment(),
                progress::course_progress(&*self.backend, self.id),
            )?
        } else {
            (self.backend.get_course(self.id).await?, None, Vec::new())
        };
        Ok(view(detail, enrollment, &records))
    }

    /// A failed enrollment lookup shows the course as not enrolled
    async fn enrollment(&self) -> Result<Option<Enrollment>> {
        let res = self
            .backend
            .list_enrollments(&EnrollmentQuery {
                course: Some(self.id),
            })
            .await;
        match res {
            Ok(page) => Ok(page.results.into_iter().next()),
            Err(e) => {
                tracing::warn!(course = %self.id, err=?e, "failed checking enrollment");
                Ok(None)
            }
        }
    }

    pub async fn enroll(&mut self) -> Result<Enrollment> {
        let enrollment = self.backend.enroll(self.id).await?;
        tracing::info!(course = %self.id, "enrolled");
        self.refetch().await;
        Ok(enrollment)
    }

    /// No-op when not enrolled
    pub async fn unenroll(&mut self) -> Result<()> {
        let enrollment = match self.state.ready().and_then(|v| v.enrollment.as_ref()) {
            Some(e) => e.id,
            None => return Ok(()),
        };
        self.backend.unenroll(enrollment).await?;
        tracing::info!(course = %self.id, "unenrolled");
        self.refetch().await;
        Ok(())
    }

    async fn refetch(&mut self) {
        let res = self.fetch().await;
        self.state.refresh(Screen::Course, res, |_| false);
    }
}

fn view(
    detail: CourseDetail,
    enrollment: Option<Enrollment>,
    records: &[ProgressRecord],
) -> CourseView {
    CourseView {
        percentage: progress::calculate_course_progress(records, detail.lectures.len() as i64),
        progress: progress::build_progress_map(records),
        detail,
        enrollment,
    }
}
