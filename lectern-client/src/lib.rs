mod backend;
pub use backend::Backend;

mod comment;
pub use comment::{build_tree, can_reply, CommentNode, MAX_REPLY_DEPTH};

mod config;
pub use config::{ClientConfig, DEFAULT_AUTOSAVE_QUIET_PERIOD};

mod debounce;
pub use debounce::Debouncer;

mod error;
pub use error::{Error, Result};

pub mod forms;
pub use forms::FieldErrors;

mod rest;
pub use rest::HttpBackend;

mod loadable;
pub use loadable::{Loadable, Screen};

pub mod pages;

pub mod progress;
pub use progress::{
    build_progress_map, calculate_course_progress, derive_video_completion, VideoCompletion,
    COMPLETION_THRESHOLD,
};

mod session;
pub use session::{FileStore, MemoryStore, Session, SessionStore, StoredSession};

pub mod api {
    pub use lectern_api::*;
}
