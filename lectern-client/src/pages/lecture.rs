use std::{collections::HashMap, sync::Arc, time::Duration};

use futures::channel::mpsc;

use crate::{
    api::{CourseId, Lecture, LectureId, LectureQuery, ProgressRecord},
    progress::{self, VideoCompletion},
    Backend, ClientConfig, Debouncer, Loadable, Result, Screen,
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LectureView {
    pub lecture: Lecture,
    pub progress: Option<ProgressRecord>,
}

/// The lectures of the course being watched, in display order, with the
/// user's progress over them
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CourseOutline {
    pub lectures: Vec<Lecture>,
    pub records: Vec<ProgressRecord>,
}

impl CourseOutline {
    pub fn progress_map(&self) -> HashMap<LectureId, bool> {
        progress::build_progress_map(&self.records)
    }

    pub fn percentage(&self) -> u8 {
        progress::calculate_course_progress(&self.records, self.lectures.len() as i64)
    }

    fn position(&self, id: LectureId) -> Option<usize> {
        self.lectures.iter().position(|l| l.id == id)
    }

    fn record(&mut self, record: ProgressRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(r) => *r = record,
            None => self.records.push(record),
        }
    }
}

/// Plays one lecture and keeps the server informed of how far it was
/// watched.
///
/// Playback samples are saved once playback has been quiet for a while;
/// reaching the end or marking the lecture completed saves right away, after
/// any save already running. Records saved in the background are folded
/// into the view the next time it is read. Dropping the player drops any
/// save still pending.
pub struct LecturePlayer<B> {
    backend: Arc<B>,
    course: CourseId,
    lecture: LectureId,
    state: Loadable<LectureView>,
    outline: Option<CourseOutline>,
    completed: bool,
    autosave: Debouncer<VideoCompletion>,
    saved: mpsc::UnboundedReceiver<Result<ProgressRecord>>,
}

impl<B: Backend + 'static> LecturePlayer<B> {
    pub fn new(
        backend: Arc<B>,
        course: CourseId,
        lecture: LectureId,
        quiet: Duration,
    ) -> LecturePlayer<B> {
        let (tx, saved) = mpsc::unbounded();
        let autosave = {
            let backend = backend.clone();
            Debouncer::new(quiet, move |c: VideoCompletion| {
                let backend = backend.clone();
                let tx = tx.clone();
                async move {
                    let res = progress::save_video_completion(&*backend, lecture, c).await;
                    if let Err(e) = &res {
                        tracing::error!(%lecture, err=?e, "failed saving playback progress");
                    }
                    // the player may be gone already
                    let _ = tx.unbounded_send(res);
                }
            })
        };
        LecturePlayer {
            backend,
            course,
            lecture,
            state: Loadable::Loading,
            outline: None,
            completed: false,
            autosave,
            saved,
        }
    }

    pub fn from_config(
        backend: Arc<B>,
        config: &ClientConfig,
        course: CourseId,
        lecture: LectureId,
    ) -> LecturePlayer<B> {
        LecturePlayer::new(backend, course, lecture, config.autosave_quiet_period)
    }

    pub fn lecture(&self) -> LectureId {
        self.lecture
    }

    pub fn course(&self) -> CourseId {
        self.course
    }

    pub fn state(&mut self) -> &Loadable<LectureView> {
        self.absorb_saved();
        &self.state
    }

    /// `None` until loaded, or if the course's lectures failed to load
    pub fn outline(&mut self) -> Option<&CourseOutline> {
        self.absorb_saved();
        self.outline.as_ref()
    }

    pub fn is_completed(&mut self) -> bool {
        self.absorb_saved();
        self.completed
    }

    pub fn previous(&self) -> Option<&Lecture> {
        let outline = self.outline.as_ref()?;
        let pos = outline.position(self.lecture)?;
        outline.lectures.get(pos.checked_sub(1)?)
    }

    pub fn next(&self) -> Option<&Lecture> {
        let outline = self.outline.as_ref()?;
        let pos = outline.position(self.lecture)?;
        outline.lectures.get(pos + 1)
    }

    pub fn has_pending_save(&mut self) -> bool {
        self.autosave.is_armed()
    }

    /// Fetch the lecture and the outline of its course; only the former can
    /// fail the screen
    pub async fn load(&mut self) -> &Loadable<LectureView> {
        self.state = Loadable::Loading;
        // whatever was saved so far is part of what gets fetched
        while let Ok(Some(_)) = self.saved.try_next() {}
        let (view, outline) = futures::join!(self.fetch_view(), self.fetch_outline());
        if let Ok(v) = &view {
            self.completed = v.progress.as_ref().map(|p| p.completed).unwrap_or(false);
        }
        self.state = Loadable::from_result(Screen::Lecture, view, |_| false);
        self.outline = match outline {
            Ok(o) => Some(o),
            Err(e) => {
                tracing::warn!(course = %self.course, err=?e, "failed loading course outline");
                None
            }
        };
        &self.state
    }

    async fn fetch_view(&self) -> Result<LectureView> {
        let (lecture, progress) = futures::try_join!(
            self.backend.get_lecture(self.lecture),
            progress::lecture_progress(&*self.backend, self.lecture),
        )?;
        Ok(LectureView { lecture, progress })
    }

    async fn fetch_outline(&self) -> Result<CourseOutline> {
        let query = LectureQuery {
            course: Some(self.course),
        };
        let (lectures, records) = futures::try_join!(
            self.backend.list_lectures(&query),
            progress::course_progress(&*self.backend, self.course),
        )?;
        let mut lectures = lectures.results;
        lectures.sort_by_key(|l| l.order);
        Ok(CourseOutline { lectures, records })
    }

    fn apply(&mut self, record: ProgressRecord) {
        self.completed = record.completed;
        if let Some(view) = self.state.ready_mut() {
            view.progress = Some(record.clone());
        }
        if let Some(outline) = &mut self.outline {
            outline.record(record);
        }
    }

    /// Folds in the outcome of background saves, returning the latest one
    fn absorb_saved(&mut self) -> Option<Result<ProgressRecord>> {
        let mut latest = None;
        while let Ok(Some(res)) = self.saved.try_next() {
            if let Ok(record) = &res {
                self.apply(record.clone());
            }
            latest = Some(res);
        }
        latest
    }

    /// Playback position changed; schedules a save of the derived progress
    pub fn on_time_update(&mut self, current_secs: f64, duration_secs: f64) {
        self.absorb_saved();
        match progress::derive_video_completion(current_secs, duration_secs) {
            Some(c) => self.autosave.schedule(c),
            None => tracing::trace!(duration_secs, "ignoring sample without a duration"),
        }
    }

    /// Save the playback position right away, without waiting for playback
    /// to be quiet. Returns `None` for a position without a known duration.
    pub async fn save_position(
        &mut self,
        current_secs: f64,
        duration_secs: f64,
    ) -> Result<Option<ProgressRecord>> {
        let completion = match progress::derive_video_completion(current_secs, duration_secs) {
            Some(c) => c,
            None => return Ok(None),
        };
        self.autosave.flush(completion).await;
        self.absorb_saved().transpose()
    }

    /// Playback reached the end
    pub async fn on_ended(&mut self) -> Result<ProgressRecord> {
        self.mark_completed().await
    }

    pub async fn mark_completed(&mut self) -> Result<ProgressRecord> {
        self.autosave.settle().await;
        self.absorb_saved();
        let record = progress::mark_completed(&*self.backend, self.lecture).await?;
        self.apply(record.clone());
        tracing::debug!(lecture = %self.lecture, "lecture completed");
        Ok(record)
    }
}
