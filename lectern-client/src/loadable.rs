use crate::Error;

/// Screens that fetch data, each with its own generic failure message
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Screen {
    Catalog,
    Course,
    Lecture,
    Comments,
    MyCourses,
    InstructorDashboard,
    CourseLectures,
}

impl Screen {
    pub fn failure_message(&self) -> &'static str {
        match self {
            Screen::Catalog => "Failed to load courses",
            Screen::Course => "Failed to load the course",
            Screen::Lecture => "Failed to load the lecture",
            Screen::Comments => "Failed to load comments",
            Screen::MyCourses => "Failed to load your courses",
            Screen::InstructorDashboard => "Failed to load your dashboard",
            Screen::CourseLectures => "Failed to load lectures",
        }
    }
}

/// State of an asynchronous view
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Loadable<T> {
    Loading,
    /// The fetch failed, the view offers a retry
    Failed(String),
    NotFound,
    /// The fetch succeeded but there is nothing to show
    Empty,
    Ready(T),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    /// Turns the outcome of a fetch into a view state, logging failures
    pub fn from_result(
        screen: Screen,
        res: Result<T, Error>,
        is_empty: impl FnOnce(&T) -> bool,
    ) -> Loadable<T> {
        match res {
            Ok(v) if is_empty(&v) => Loadable::Empty,
            Ok(v) => Loadable::Ready(v),
            Err(e) if e.is_not_found() => Loadable::NotFound,
            Err(e) => {
                tracing::error!(?screen, err=?e, "fetch failed");
                Loadable::Failed(String::from(screen.failure_message()))
            }
        }
    }

    /// Refetch after a write: same as `from_result`, except that a failure
    /// keeps the data currently shown
    pub fn refresh(
        &mut self,
        screen: Screen,
        res: Result<T, Error>,
        is_empty: impl FnOnce(&T) -> bool,
    ) {
        match res {
            Err(e) => tracing::warn!(?screen, err=?e, "refetch failed, keeping stale data"),
            res => *self = Loadable::from_result(screen, res, is_empty),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Loadable::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Loadable::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Failed(m) => Loadable::Failed(m),
            Loadable::NotFound => Loadable::NotFound,
            Loadable::Empty => Loadable::Empty,
            Loadable::Ready(v) => Loadable::Ready(f(v)),
        }
    }
}
