//! Client-side checks run before submitting a form to the server.
//!
//! Each validator returns every problem it found at once, keyed by field name,
//! so that a form can display them next to the relevant inputs.

use std::{collections::BTreeMap, fmt};

use regex::Regex;

use crate::api::{
    ContentKind, CourseUpdate, Lecture, LectureUpdate, NewCourse, NewLecture, PasswordChange,
    Registration,
};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MIN_COURSE_TITLE_LEN: usize = 3;
pub const MIN_COURSE_DESCRIPTION_LEN: usize = 10;

lazy_static::lazy_static! {
    static ref USERNAME: Regex = Regex::new(r"^[A-Za-z0-9_.@+-]+$").expect("invalid username regex");
    static ref EMAIL: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex");
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> FieldErrors {
        FieldErrors::default()
    }

    /// Records `msg` for `field`, unless an earlier check already complained
    /// about it
    pub fn add(&mut self, field: &'static str, msg: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| msg.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|m| m as &str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(f, m)| (*f, m as &str))
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        match self.is_empty() {
            true => Ok(()),
            false => Err(self),
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, msg) in self.0.iter() {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{field}: {msg}")?;
        }
        Ok(())
    }
}

pub fn is_valid_url(s: &str) -> bool {
    reqwest::Url::parse(s).is_ok()
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn check_required_url(errs: &mut FieldErrors, field: &'static str, what: &str, url: &str) {
    if is_blank(url) {
        errs.add(field, format!("{what} is required"));
    } else if !is_valid_url(url.trim()) {
        errs.add(field, "not a valid URL");
    }
}

pub fn validate_registration(r: &Registration) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();

    if is_blank(&r.username) {
        errs.add("username", "username is required");
    } else if char_len(&r.username) < MIN_USERNAME_LEN {
        errs.add(
            "username",
            format!("username must be at least {MIN_USERNAME_LEN} characters"),
        );
    } else if !USERNAME.is_match(&r.username) {
        errs.add(
            "username",
            "username may only contain letters, digits and @/./+/-/_",
        );
    }

    if is_blank(&r.email) {
        errs.add("email", "email is required");
    } else if !EMAIL.is_match(&r.email) {
        errs.add("email", "not a valid email address");
    }

    if r.password.is_empty() {
        errs.add("password", "password is required");
    } else if char_len(&r.password) < MIN_PASSWORD_LEN {
        errs.add(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }

    if r.password2.is_empty() {
        errs.add("password2", "password confirmation is required");
    } else if r.password != r.password2 {
        errs.add("password2", "passwords do not match");
    }

    errs.into_result()
}

pub fn validate_password_change(c: &PasswordChange) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();
    if c.old_password.is_empty() {
        errs.add("old_password", "current password is required");
    }
    if char_len(&c.new_password) < MIN_PASSWORD_LEN {
        errs.add(
            "new_password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    if c.new_password != c.new_password2 {
        errs.add("new_password2", "passwords do not match");
    }
    errs.into_result()
}

fn check_course_title(errs: &mut FieldErrors, title: &str) {
    if is_blank(title) {
        errs.add("title", "course title is required");
    } else if char_len(title) < MIN_COURSE_TITLE_LEN {
        errs.add(
            "title",
            format!("course title must be at least {MIN_COURSE_TITLE_LEN} characters"),
        );
    }
}

fn check_course_description(errs: &mut FieldErrors, description: &str) {
    if !is_blank(description) && char_len(description) < MIN_COURSE_DESCRIPTION_LEN {
        errs.add(
            "description",
            format!("description must be at least {MIN_COURSE_DESCRIPTION_LEN} characters"),
        );
    }
}

fn check_thumbnail(errs: &mut FieldErrors, thumbnail: Option<&str>) {
    if let Some(t) = thumbnail {
        if !is_blank(t) && !is_valid_url(t.trim()) {
            errs.add("thumbnail", "not a valid URL");
        }
    }
}

pub fn validate_new_course(c: &NewCourse) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();
    check_course_title(&mut errs, &c.title);
    check_course_description(&mut errs, &c.description);
    check_thumbnail(&mut errs, c.thumbnail.as_deref());
    errs.into_result()
}

pub fn validate_course_update(c: &CourseUpdate) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();
    if let Some(title) = &c.title {
        check_course_title(&mut errs, title);
    }
    if let Some(description) = &c.description {
        check_course_description(&mut errs, description);
    }
    check_thumbnail(&mut errs, c.thumbnail.as_deref());
    errs.into_result()
}

fn check_lecture_content(
    errs: &mut FieldErrors,
    kind: ContentKind,
    text: &str,
    video_url: &str,
    file_url: Option<&str>,
) {
    match kind {
        ContentKind::Video => check_required_url(errs, "video_url", "video URL", video_url),
        ContentKind::Text => {
            if is_blank(text) {
                errs.add("content_text", "text content is required");
            }
        }
        ContentKind::Link => check_required_url(errs, "video_url", "link URL", video_url),
        ContentKind::File => {
            check_required_url(errs, "file_url", "file URL", file_url.unwrap_or(""))
        }
    }
}

pub fn validate_new_lecture(l: &NewLecture) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();
    if is_blank(&l.title) {
        errs.add("title", "lecture title is required");
    }
    check_lecture_content(
        &mut errs,
        l.content_type,
        &l.content_text,
        &l.video_url,
        l.file_url.as_deref(),
    );
    errs.into_result()
}

/// Updates are checked against the lecture they apply to, as switching the
/// content kind may require a field the update does not carry
pub fn validate_lecture_update(existing: &Lecture, u: &LectureUpdate) -> Result<(), FieldErrors> {
    let mut errs = FieldErrors::new();
    if let Some(title) = &u.title {
        if is_blank(title) {
            errs.add("title", "lecture title is required");
        }
    }
    check_lecture_content(
        &mut errs,
        u.content_type.unwrap_or(existing.content_type),
        u.content_text.as_deref().unwrap_or(&existing.content_text),
        u.video_url.as_deref().unwrap_or(&existing.video_url),
        u.file_url.as_deref().or(existing.file_url.as_deref()),
    );
    errs.into_result()
}

/// Returns the trimmed content, or an error if there is nothing to post
pub fn validate_comment(content: &str) -> Result<String, FieldErrors> {
    let content = content.trim();
    if content.is_empty() {
        let mut errs = FieldErrors::new();
        errs.add("content", "comment must not be empty");
        return Err(errs);
    }
    Ok(String::from(content))
}
