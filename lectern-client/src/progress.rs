use std::collections::HashMap;

use crate::{
    api::{
        CourseId, LectureId, NewProgress, ProgressQuery, ProgressRecord, ProgressUpdate,
    },
    Backend, Result,
};

/// A lecture counts as completed once this much of it has been watched
pub const COMPLETION_THRESHOLD: u8 = 90;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VideoCompletion {
    pub percentage: u8,
    pub completed: bool,
}

impl From<VideoCompletion> for ProgressUpdate {
    fn from(c: VideoCompletion) -> ProgressUpdate {
        ProgressUpdate {
            completed: c.completed,
            progress_percentage: c.percentage,
        }
    }
}

/// Percentage of the course's lectures that are completed.
///
/// Every completed record counts, even several for the same lecture.
pub fn calculate_course_progress(records: &[ProgressRecord], total_lectures: i64) -> u8 {
    if total_lectures <= 0 {
        return 0;
    }
    let completed = records.iter().filter(|r| r.completed).count();
    let ratio = 100.0 * completed as f64 / total_lectures as f64;
    ratio.round().min(100.0) as u8
}

/// Completion flag per lecture; when a lecture has several records the last
/// one wins
pub fn build_progress_map(records: &[ProgressRecord]) -> HashMap<LectureId, bool> {
    let mut map = HashMap::with_capacity(records.len());
    for r in records {
        map.insert(r.lecture, r.completed);
    }
    map
}

/// Returns None when the duration is unknown, in which case there is nothing
/// to persist
pub fn derive_video_completion(current_secs: f64, duration_secs: f64) -> Option<VideoCompletion> {
    if !(duration_secs.is_finite() && duration_secs > 0.0) || !current_secs.is_finite() {
        return None;
    }
    let percentage = (100.0 * current_secs / duration_secs).round().clamp(0.0, 100.0) as u8;
    Some(VideoCompletion {
        percentage,
        completed: percentage >= COMPLETION_THRESHOLD,
    })
}

pub async fn lecture_progress<B: Backend + ?Sized>(
    backend: &B,
    lecture: LectureId,
) -> Result<Option<ProgressRecord>> {
    let page = backend
        .list_progress(&ProgressQuery {
            lecture: Some(lecture),
            course: None,
        })
        .await?;
    Ok(page.results.into_iter().next())
}

pub async fn course_progress<B: Backend + ?Sized>(
    backend: &B,
    course: CourseId,
) -> Result<Vec<ProgressRecord>> {
    let page = backend
        .list_progress(&ProgressQuery {
            lecture: None,
            course: Some(course),
        })
        .await?;
    Ok(page.results)
}

/// Update the lecture's progress record, creating it if there is none yet
pub async fn save_progress<B: Backend + ?Sized>(
    backend: &B,
    lecture: LectureId,
    update: ProgressUpdate,
) -> Result<ProgressRecord> {
    match lecture_progress(backend, lecture).await? {
        Some(existing) => backend.update_progress(existing.id, &update).await,
        None => {
            backend
                .create_progress(&NewProgress {
                    lecture,
                    completed: update.completed,
                    progress_percentage: update.progress_percentage,
                })
                .await
        }
    }
}

pub async fn mark_completed<B: Backend + ?Sized>(
    backend: &B,
    lecture: LectureId,
) -> Result<ProgressRecord> {
    save_progress(backend, lecture, ProgressUpdate::completed()).await
}

pub async fn save_video_completion<B: Backend + ?Sized>(
    backend: &B,
    lecture: LectureId,
    completion: VideoCompletion,
) -> Result<ProgressRecord> {
    save_progress(backend, lecture, completion.into()).await
}
