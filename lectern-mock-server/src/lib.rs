use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::TimeZone;
use lectern_client::{
    api::{
        self, AccessToken, Comment, CommentId, CommentOrdering, CommentQuery, CommentUpdate,
        Course, CourseDetail, CourseId, CourseQuery, CourseUpdate, Enrollment, EnrollmentId,
        EnrollmentQuery, Lecture, LectureId, LectureQuery, LectureUpdate, LoginRequest,
        NewComment, NewCourse, NewLecture, NewProgress, Page, PasswordChange, ProfileUpdate,
        ProgressId, ProgressQuery, ProgressRecord, ProgressUpdate, Registration, Time, TokenPair,
        User, UserId,
    },
    Backend, Result,
};
use parking_lot::{Mutex, MutexGuard};

/// Courses per page of the catalog
pub const PAGE_SIZE: usize = 10;

/// In-memory stand-in for the e-learning server.
///
/// Each handle is one client connection with its own bearer tokens; handles
/// obtained through [`MockServer::client`] share the same data.
pub struct MockServer {
    state: Arc<Mutex<State>>,
    tokens: Mutex<Option<TokenPair>>,
}

#[derive(Debug)]
struct DbUser {
    user: User,
    password: String,
}

#[derive(Debug)]
struct State {
    next_id: i64,
    clock: Time,
    users: BTreeMap<UserId, DbUser>,
    access: HashMap<String, UserId>,
    refresh: HashMap<String, UserId>,
    courses: BTreeMap<CourseId, Course>,
    lectures: BTreeMap<LectureId, Lecture>,
    enrollments: BTreeMap<EnrollmentId, (UserId, Enrollment)>,
    progress: BTreeMap<ProgressId, (UserId, ProgressRecord)>,
    comments: BTreeMap<CommentId, Comment>,
    calls: BTreeMap<&'static str, usize>,
    failures: HashMap<&'static str, VecDeque<api::Error>>,
}

impl State {
    fn new() -> State {
        State {
            next_id: 1,
            clock: chrono::Utc
                .timestamp_opt(1_704_067_200, 0)
                .single()
                .unwrap_or_else(chrono::Utc::now),
            users: BTreeMap::new(),
            access: HashMap::new(),
            refresh: HashMap::new(),
            courses: BTreeMap::new(),
            lectures: BTreeMap::new(),
            enrollments: BTreeMap::new(),
            progress: BTreeMap::new(),
            comments: BTreeMap::new(),
            calls: BTreeMap::new(),
            failures: HashMap::new(),
        }
    }

    fn id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Every write happens one second after the previous one, which keeps
    /// timestamp orderings unambiguous
    fn tick(&mut self) -> Time {
        self.clock = self.clock + chrono::Duration::seconds(1);
        self.clock
    }

    fn issue_tokens(&mut self, user: UserId) -> TokenPair {
        let n = self.id();
        let pair = TokenPair {
            access: format!("access-{n}"),
            refresh: format!("refresh-{n}"),
        };
        self.access.insert(pair.access.clone(), user);
        self.refresh.insert(pair.refresh.clone(), user);
        pair
    }

    fn user_by_name(&self, name: &str) -> Option<&DbUser> {
        self.users.values().find(|u| u.user.username == name)
    }

    fn can_see(&self, user: Option<UserId>, course: &Course) -> bool {
        course.is_published || Some(course.instructor.id) == user
    }

    fn visible_course(&self, user: Option<UserId>, id: CourseId) -> Result<&Course> {
        match self.courses.get(&id) {
            Some(c) if self.can_see(user, c) => Ok(c),
            _ => Err(api::Error::NotFound.into()),
        }
    }

    fn owned_course(&self, user: UserId, id: CourseId) -> Result<&Course> {
        let course = self
            .courses
            .get(&id)
            .ok_or(api::Error::NotFound)?;
        if course.instructor.id != user {
            return Err(api::Error::PermissionDenied.into());
        }
        Ok(course)
    }

    fn owned_lecture(&self, user: UserId, id: LectureId) -> Result<&Lecture> {
        let lecture = self
            .lectures
            .get(&id)
            .ok_or(api::Error::NotFound)?;
        self.owned_course(user, lecture.course)?;
        Ok(lecture)
    }

    fn visible_lecture(&self, user: Option<UserId>, id: LectureId) -> Result<&Lecture> {
        let lecture = self
            .lectures
            .get(&id)
            .ok_or(api::Error::NotFound)?;
        self.visible_course(user, lecture.course)?;
        Ok(lecture)
    }

    fn course_lectures(&self, course: CourseId) -> Vec<Lecture> {
        let mut lectures = self
            .lectures
            .values()
            .filter(|l| l.course == course)
            .cloned()
            .collect::<Vec<_>>();
        lectures.sort_by_key(|l| (l.order, l.id));
        lectures
    }

    fn refresh_course_stats(&mut self, course: CourseId) {
        let lectures = self.course_lectures(course);
        if let Some(c) = self.courses.get_mut(&course) {
            c.lectures_count = lectures.len() as u32;
            c.total_duration = lectures.iter().map(|l| l.duration).sum();
        }
    }

    fn insert_course(&mut self, instructor: UserId, new: &NewCourse) -> Result<Course> {
        let instructor = self
            .users
            .get(&instructor)
            .ok_or(api::Error::NotFound)?
            .user
            .summary();
        let course = Course {
            id: CourseId(self.id()),
            title: new.title.clone(),
            description: new.description.clone(),
            thumbnail: new.thumbnail.clone(),
            category: new.category.clone(),
            instructor,
            is_published: new.is_published,
            lectures_count: 0,
            total_duration: 0,
            created_at: self.tick(),
        };
        self.courses.insert(course.id, course.clone());
        Ok(course)
    }

    fn insert_lecture(&mut self, new: &NewLecture) -> Result<Lecture> {
        if !self.courses.contains_key(&new.course) {
            return Err(api::Error::validation("course", "Invalid course").into());
        }
        let now = self.tick();
        let lecture = Lecture {
            id: LectureId(self.id()),
            course: new.course,
            title: new.title.clone(),
            content_type: new.content_type,
            content_text: new.content_text.clone(),
            video_url: new.video_url.clone(),
            file_url: new.file_url.clone(),
            order: new.order,
            duration: new.duration,
            created_at: now,
            updated_at: now,
        };
        self.lectures.insert(lecture.id, lecture.clone());
        self.refresh_course_stats(lecture.course);
        Ok(lecture)
    }
}

fn order_courses(courses: &mut [Course], ordering: Option<&str>) {
    match ordering.unwrap_or("-created_at") {
        "created_at" => courses.sort_by_key(|c| c.created_at),
        "lectures_count" => courses.sort_by_key(|c| c.lectures_count),
        "-lectures_count" => courses.sort_by_key(|c| std::cmp::Reverse(c.lectures_count)),
        "total_duration" => courses.sort_by_key(|c| c.total_duration),
        "-total_duration" => courses.sort_by_key(|c| std::cmp::Reverse(c.total_duration)),
        _ => courses.sort_by_key(|c| std::cmp::Reverse(c.created_at)),
    }
}

fn paginate<T>(items: Vec<T>, page: Option<u32>) -> Result<Page<T>> {
    let page = page.unwrap_or(1).max(1) as usize;
    let count = items.len();
    let start = (page - 1) * PAGE_SIZE;
    if start >= count && page > 1 {
        return Err(api::Error::NotFound.into());
    }
    let results = items
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE)
        .collect::<Vec<_>>();
    Ok(Page {
        count: count as u64,
        next: (start + PAGE_SIZE < count).then(|| format!("?page={}", page + 1)),
        previous: (page > 1).then(|| format!("?page={}", page - 1)),
        results,
    })
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            state: Arc::new(Mutex::new(State::new())),
            tokens: Mutex::new(None),
        }
    }

    /// Another connection to the same server, logged out
    pub fn client(&self) -> MockServer {
        MockServer {
            state: self.state.clone(),
            tokens: Mutex::new(None),
        }
    }

    pub fn admin_create_user(&self, username: &str, password: &str) -> UserId {
        let mut st = self.state.lock();
        let id = UserId(st.id());
        let created_at = st.tick();
        st.users.insert(
            id,
            DbUser {
                user: User {
                    id,
                    username: String::from(username),
                    email: format!("{username}@example.org"),
                    profile_image: None,
                    bio: String::new(),
                    courses_count: 0,
                    created_at,
                },
                password: String::from(password),
            },
        );
        id
    }

    /// Create a course without going through authentication
    pub fn admin_create_course(&self, instructor: UserId, course: NewCourse) -> Course {
        match self.state.lock().insert_course(instructor, &course) {
            Ok(c) => c,
            Err(e) => panic!("creating course for unknown user {instructor}: {e}"),
        }
    }

    /// Create a lecture without going through authentication
    pub fn admin_create_lecture(&self, lecture: NewLecture) -> Lecture {
        match self.state.lock().insert_lecture(&lecture) {
            Ok(l) => l,
            Err(e) => panic!("creating lecture in unknown course {}: {e}", lecture.course),
        }
    }

    /// Invalidate all access tokens, leaving refresh tokens usable
    pub fn expire_access_tokens(&self) {
        self.state.lock().access.clear();
    }

    /// Invalidate all tokens of `user`
    pub fn revoke_sessions(&self, user: UserId) {
        let mut st = self.state.lock();
        st.access.retain(|_, u| *u != user);
        st.refresh.retain(|_, u| *u != user);
    }

    /// Make the next call to `op` (a `Backend` method name) fail with `err`
    pub fn fail_next(&self, op: &'static str, err: api::Error) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// Number of times `op` was called, failed calls included
    pub fn calls(&self, op: &str) -> usize {
        self.state.lock().calls.get(op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().calls.values().sum()
    }

    /// All comments of a lecture as stored, ignoring visibility
    pub fn test_comments(&self, lecture: LectureId) -> Vec<Comment> {
        self.state
            .lock()
            .comments
            .values()
            .filter(|c| c.lecture == lecture)
            .cloned()
            .collect()
    }

    /// All progress records of a user as stored
    pub fn test_progress(&self, user: UserId) -> Vec<ProgressRecord> {
        self.state
            .lock()
            .progress
            .values()
            .filter(|(u, _)| *u == user)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn enter(&self, op: &'static str) -> Result<MutexGuard<'_, State>> {
        let mut st = self.state.lock();
        *st.calls.entry(op).or_insert(0) += 1;
        if let Some(err) = st.failures.get_mut(op).and_then(|f| f.pop_front()) {
            tracing::debug!(op, ?err, "injected failure");
            return Err(err.into());
        }
        Ok(st)
    }

    fn caller(&self, st: &State) -> Option<UserId> {
        let tokens = self.tokens.lock();
        let access = &tokens.as_ref()?.access;
        st.access.get(access).copied()
    }

    fn authed(&self, st: &State) -> Result<UserId> {
        self.caller(st)
            .ok_or_else(|| api::Error::Unauthorized.into())
    }
}

#[async_trait]
impl Backend for MockServer {
    fn tokens(&self) -> Option<TokenPair> {
        self.tokens.lock().clone()
    }

    fn set_tokens(&self, tokens: Option<TokenPair>) {
        *self.tokens.lock() = tokens;
    }

    async fn login(&self, req: &LoginRequest) -> Result<TokenPair> {
        let mut st = self.enter("login")?;
        let user = match st.user_by_name(&req.username) {
            Some(u) if u.password == req.password => u.user.id,
            _ => return Err(api::Error::Unauthorized.into()),
        };
        Ok(st.issue_tokens(user))
    }

    async fn register(&self, req: &Registration) -> Result<()> {
        let mut st = self.enter("register")?;
        if st.user_by_name(&req.username).is_some() {
            return Err(api::Error::validation(
                "username",
                "A user with that username already exists.",
            )
            .into());
        }
        if req.password != req.password2 {
            return Err(api::Error::validation("password", "Passwords do not match.").into());
        }
        let id = UserId(st.id());
        let created_at = st.tick();
        st.users.insert(
            id,
            DbUser {
                user: User {
                    id,
                    username: req.username.clone(),
                    email: req.email.clone(),
                    profile_image: None,
                    bio: String::new(),
                    courses_count: 0,
                    created_at,
                },
                password: req.password.clone(),
            },
        );
        Ok(())
    }

    async fn profile(&self) -> Result<User> {
        let st = self.enter("profile")?;
        let user = self.authed(&st)?;
        Ok(st.users[&user].user.clone())
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let mut st = self.enter("update_profile")?;
        let id = self.authed(&st)?;
        let db = st.users.get_mut(&id).ok_or(api::Error::NotFound)?;
        if let Some(email) = &update.email {
            db.user.email = email.clone();
        }
        if let Some(bio) = &update.bio {
            db.user.bio = bio.clone();
        }
        if let Some(image) = &update.profile_image {
            db.user.profile_image = Some(image.clone());
        }
        Ok(db.user.clone())
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        let mut st = self.enter("change_password")?;
        let id = self.authed(&st)?;
        let db = st.users.get_mut(&id).ok_or(api::Error::NotFound)?;
        if db.password != change.old_password {
            return Err(
                api::Error::validation("old_password", "Old password is not correct").into(),
            );
        }
        if change.new_password != change.new_password2 {
            return Err(api::Error::validation("new_password", "Passwords do not match.").into());
        }
        db.password = change.new_password.clone();
        Ok(())
    }

    async fn refresh_token(&self, refresh: &str) -> Result<AccessToken> {
        let mut st = self.enter("refresh_token")?;
        let user = *st.refresh.get(refresh).ok_or(api::Error::Unauthorized)?;
        let access = format!("access-{}", st.id());
        st.access.insert(access.clone(), user);
        Ok(AccessToken {
            access,
            refresh: None,
        })
    }

    async fn list_courses(&self, query: &CourseQuery) -> Result<Page<Course>> {
        let st = self.enter("list_courses")?;
        let caller = self.caller(&st);
        let search = query.search.as_ref().map(|s| s.to_lowercase());
        let mut courses = st
            .courses
            .values()
            .filter(|c| st.can_see(caller, c))
            .filter(|c| query.category.is_none() || c.category == query.category)
            .filter(|c| query.instructor.map(|i| i == c.instructor.id).unwrap_or(true))
            .filter(|c| match &search {
                None => true,
                Some(s) => {
                    c.title.to_lowercase().contains(s)
                        || c.description.to_lowercase().contains(s)
                        || c.instructor.username.to_lowercase().contains(s)
                }
            })
            .cloned()
            .collect::<Vec<_>>();
        order_courses(&mut courses, query.ordering.as_deref());
        paginate(courses, query.page)
    }

    async fn get_course(&self, id: CourseId) -> Result<CourseDetail> {
        let st = self.enter("get_course")?;
        let course = st.visible_course(self.caller(&st), id)?.clone();
        let lectures = st
            .course_lectures(id)
            .iter()
            .map(Lecture::summary)
            .collect();
        Ok(CourseDetail { course, lectures })
    }

    async fn create_course(&self, course: &NewCourse) -> Result<Course> {
        let mut st = self.enter("create_course")?;
        let user = self.authed(&st)?;
        st.insert_course(user, course)
    }

    async fn update_course(&self, id: CourseId, update: &CourseUpdate) -> Result<Course> {
        let mut st = self.enter("update_course")?;
        let user = self.authed(&st)?;
        st.owned_course(user, id)?;
        let course = st.courses.get_mut(&id).ok_or(api::Error::NotFound)?;
        if let Some(title) = &update.title {
            course.title = title.clone();
        }
        if let Some(description) = &update.description {
            course.description = description.clone();
        }
        if let Some(thumbnail) = &update.thumbnail {
            course.thumbnail = Some(thumbnail.clone());
        }
        if let Some(category) = &update.category {
            course.category = Some(category.clone());
        }
        if let Some(published) = update.is_published {
            course.is_published = published;
        }
        Ok(course.clone())
    }

    async fn delete_course(&self, id: CourseId) -> Result<()> {
        let mut st = self.enter("delete_course")?;
        let user = self.authed(&st)?;
        st.owned_course(user, id)?;
        st.courses.remove(&id);
        let lectures = st
            .lectures
            .values()
            .filter(|l| l.course == id)
            .map(|l| l.id)
            .collect::<Vec<_>>();
        for l in &lectures {
            st.lectures.remove(l);
        }
        st.enrollments.retain(|_, (_, e)| e.course != id);
        st.progress.retain(|_, (_, p)| !lectures.contains(&p.lecture));
        st.comments.retain(|_, c| !lectures.contains(&c.lecture));
        Ok(())
    }

    async fn list_lectures(&self, query: &LectureQuery) -> Result<Page<Lecture>> {
        let st = self.enter("list_lectures")?;
        let caller = self.caller(&st);
        let lectures = st
            .lectures
            .values()
            .filter(|l| query.course.map(|c| c == l.course).unwrap_or(true))
            .filter(|l| st.visible_course(caller, l.course).is_ok())
            .cloned()
            .collect();
        Ok(Page::single(lectures))
    }

    async fn get_lecture(&self, id: LectureId) -> Result<Lecture> {
        let st = self.enter("get_lecture")?;
        Ok(st.visible_lecture(self.caller(&st), id)?.clone())
    }

    async fn create_lecture(&self, lecture: &NewLecture) -> Result<Lecture> {
        let mut st = self.enter("create_lecture")?;
        let user = self.authed(&st)?;
        st.owned_course(user, lecture.course)?;
        st.insert_lecture(lecture)
    }

    async fn update_lecture(&self, id: LectureId, update: &LectureUpdate) -> Result<Lecture> {
        let mut st = self.enter("update_lecture")?;
        let user = self.authed(&st)?;
        st.owned_lecture(user, id)?;
        let now = st.tick();
        let lecture = st.lectures.get_mut(&id).ok_or(api::Error::NotFound)?;
        if let Some(title) = &update.title {
            lecture.title = title.clone();
        }
        if let Some(kind) = update.content_type {
            lecture.content_type = kind;
        }
        if let Some(text) = &update.content_text {
            lecture.content_text = text.clone();
        }
        if let Some(url) = &update.video_url {
            lecture.video_url = url.clone();
        }
        if let Some(url) = &update.file_url {
            lecture.file_url = Some(url.clone());
        }
        if let Some(order) = update.order {
            lecture.order = order;
        }
        if let Some(duration) = update.duration {
            lecture.duration = duration;
        }
        lecture.updated_at = now;
        let lecture = lecture.clone();
        st.refresh_course_stats(lecture.course);
        Ok(lecture)
    }

    async fn delete_lecture(&self, id: LectureId) -> Result<()> {
        let mut st = self.enter("delete_lecture")?;
        let user = self.authed(&st)?;
        let course = st.owned_lecture(user, id)?.course;
        st.lectures.remove(&id);
        st.progress.retain(|_, (_, p)| p.lecture != id);
        st.comments.retain(|_, c| c.lecture != id);
        st.refresh_course_stats(course);
        Ok(())
    }

    async fn list_enrollments(&self, query: &EnrollmentQuery) -> Result<Page<Enrollment>> {
        let st = self.enter("list_enrollments")?;
        let user = self.authed(&st)?;
        // instructors see everyone enrolled in their own course
        let teaches = query
            .course
            .map(|c| st.owned_course(user, c).is_ok())
            .unwrap_or(false);
        let enrollments = st
            .enrollments
            .values()
            .filter(|(u, _)| teaches || *u == user)
            .filter(|(_, e)| query.course.map(|c| c == e.course).unwrap_or(true))
            .map(|(_, e)| e.clone())
            .collect();
        Ok(Page::single(enrollments))
    }

    async fn enroll(&self, course: CourseId) -> Result<Enrollment> {
        let mut st = self.enter("enroll")?;
        let user = self.authed(&st)?;
        st.visible_course(Some(user), course)?;
        if st
            .enrollments
            .values()
            .any(|(u, e)| *u == user && e.course == course)
        {
            return Err(api::Error::validation(
                "non_field_errors",
                "Already enrolled in this course.",
            )
            .into());
        }
        let enrollment = Enrollment {
            id: EnrollmentId(st.id()),
            course,
            enrolled_at: st.tick(),
        };
        st.enrollments
            .insert(enrollment.id, (user, enrollment.clone()));
        Ok(enrollment)
    }

    async fn unenroll(&self, id: EnrollmentId) -> Result<()> {
        let mut st = self.enter("unenroll")?;
        let user = self.authed(&st)?;
        match st.enrollments.get(&id).map(|(u, _)| *u) {
            Some(u) if u == user => {
                st.enrollments.remove(&id);
                Ok(())
            }
            Some(_) => Err(api::Error::PermissionDenied.into()),
            None => Err(api::Error::NotFound.into()),
        }
    }

    async fn list_progress(&self, query: &ProgressQuery) -> Result<Page<ProgressRecord>> {
        let st = self.enter("list_progress")?;
        let user = self.authed(&st)?;
        let records = st
            .progress
            .values()
            .filter(|(u, _)| *u == user)
            .map(|(_, p)| p)
            .filter(|p| query.lecture.map(|l| l == p.lecture).unwrap_or(true))
            .filter(|p| match query.course {
                None => true,
                Some(c) => st.lectures.get(&p.lecture).map(|l| l.course) == Some(c),
            })
            .cloned()
            .collect();
        Ok(Page::single(records))
    }

    async fn create_progress(&self, progress: &NewProgress) -> Result<ProgressRecord> {
        let mut st = self.enter("create_progress")?;
        let user = self.authed(&st)?;
        st.visible_lecture(Some(user), progress.lecture)?;
        if st
            .progress
            .values()
            .any(|(u, p)| *u == user && p.lecture == progress.lecture)
        {
            return Err(api::Error::validation(
                "non_field_errors",
                "Progress already recorded for this lecture.",
            )
            .into());
        }
        let record = ProgressRecord {
            id: ProgressId(st.id()),
            lecture: progress.lecture,
            completed: progress.completed,
            progress_percentage: progress.progress_percentage.min(100),
            updated_at: st.tick(),
        };
        st.progress.insert(record.id, (user, record.clone()));
        Ok(record)
    }

    async fn update_progress(
        &self,
        id: ProgressId,
        update: &ProgressUpdate,
    ) -> Result<ProgressRecord> {
        let mut st = self.enter("update_progress")?;
        let user = self.authed(&st)?;
        let now = st.tick();
        match st.progress.get_mut(&id) {
            Some((u, record)) if *u == user => {
                record.completed = update.completed;
                record.progress_percentage = update.progress_percentage.min(100);
                record.updated_at = now;
                Ok(record.clone())
            }
            Some(_) => Err(api::Error::PermissionDenied.into()),
            None => Err(api::Error::NotFound.into()),
        }
    }

    async fn list_comments(&self, query: &CommentQuery) -> Result<Page<Comment>> {
        let st = self.enter("list_comments")?;
        let mut comments = st
            .comments
            .values()
            .filter(|c| query.lecture.map(|l| l == c.lecture).unwrap_or(true))
            .cloned()
            .collect::<Vec<_>>();
        match query.ordering.unwrap_or(CommentOrdering::OldestFirst) {
            CommentOrdering::OldestFirst => comments.sort_by_key(|c| (c.created_at, c.id)),
            CommentOrdering::NewestFirst => {
                comments.sort_by_key(|c| std::cmp::Reverse((c.created_at, c.id)))
            }
        }
        Ok(Page::single(comments))
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        let mut st = self.enter("create_comment")?;
        let user = self.authed(&st)?;
        st.visible_lecture(Some(user), comment.lecture)?;
        if comment.content.trim().is_empty() {
            return Err(api::Error::validation("content", "This field may not be blank.").into());
        }
        if let Some(parent) = comment.parent {
            match st.comments.get(&parent) {
                Some(p) if p.lecture == comment.lecture => (),
                Some(_) => {
                    return Err(api::Error::validation(
                        "parent",
                        "Replies must belong to the same lecture.",
                    )
                    .into())
                }
                None => {
                    return Err(api::Error::validation("parent", "Invalid comment.").into())
                }
            }
        }
        let now = st.tick();
        let created = Comment {
            id: CommentId(st.id()),
            lecture: comment.lecture,
            author: st.users[&user].user.summary(),
            parent: comment.parent,
            content: comment.content.clone(),
            created_at: now,
            updated_at: now,
        };
        st.comments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_comment(&self, id: CommentId, update: &CommentUpdate) -> Result<Comment> {
        let mut st = self.enter("update_comment")?;
        let user = self.authed(&st)?;
        if update.content.trim().is_empty() {
            return Err(api::Error::validation("content", "This field may not be blank.").into());
        }
        let now = st.tick();
        match st.comments.get_mut(&id) {
            Some(c) if c.author.id == user => {
                c.content = update.content.clone();
                c.updated_at = now;
                Ok(c.clone())
            }
            Some(_) => Err(api::Error::PermissionDenied.into()),
            None => Err(api::Error::NotFound.into()),
        }
    }

    /// Replies are left in place, now pointing to a missing parent
    async fn delete_comment(&self, id: CommentId) -> Result<()> {
        let mut st = self.enter("delete_comment")?;
        let user = self.authed(&st)?;
        match st.comments.get(&id).map(|c| c.author.id) {
            Some(author) if author == user => {
                st.comments.remove(&id);
                Ok(())
            }
            Some(_) => Err(api::Error::PermissionDenied.into()),
            None => Err(api::Error::NotFound.into()),
        }
    }
}
