use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    api::{
        self, AccessToken, Comment, CommentId, CommentQuery, CommentUpdate, Course, CourseDetail,
        CourseId, CourseQuery, CourseUpdate, Enrollment, EnrollmentId, EnrollmentQuery, Lecture,
        LectureId, LectureQuery, LectureUpdate, LoginRequest, NewComment, NewCourse,
        NewEnrollment, NewLecture, NewProgress, Page, PasswordChange, ProfileUpdate, ProgressId,
        ProgressQuery, ProgressRecord, ProgressUpdate, RefreshRequest, Registration, TokenPair,
        User,
    },
    Backend, ClientConfig, Error, Result,
};

const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Auth {
    Anonymous,
    Bearer,
}

/// `Backend` talking to the real server over HTTP
pub struct HttpBackend {
    host: String,
    client: reqwest::Client,
    tokens: RwLock<Option<TokenPair>>,
}

impl HttpBackend {
    pub fn new(host: impl Into<String>) -> HttpBackend {
        HttpBackend {
            host: host.into(),
            client: reqwest::Client::new(),
            tokens: RwLock::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> HttpBackend {
        HttpBackend::new(config.host.clone())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.host.trim_end_matches('/'), path)
    }

    async fn attempt<F>(
        &self,
        auth: Auth,
        method: &Method,
        path: &str,
        build: &F,
    ) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let mut req = build(self.client.request(method.clone(), self.url(path)));
        if auth == Auth::Bearer {
            let access = self.tokens.read().as_ref().map(|t| t.access.clone());
            if let Some(access) = access {
                req = req.bearer_auth(access);
            }
        }
        Ok(req
            .send()
            .await
            .with_context(|| format!("sending {method} request to {path}"))?)
    }

    /// Sends the request, refreshing the access token and retrying once if
    /// the server rejected it
    async fn send<F>(&self, auth: Auth, method: Method, path: &str, build: F) -> Result<Response>
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync,
    {
        let resp = self.attempt(auth, &method, path, &build).await?;
        if auth == Auth::Anonymous || resp.status() != StatusCode::UNAUTHORIZED {
            return check(resp).await;
        }
        let stored = self.tokens.read().clone();
        let tokens = match stored {
            Some(tokens) => tokens,
            None => return check(resp).await,
        };
        tracing::debug!(path, "access token rejected, refreshing it");
        let fresh = self.request_refresh(&tokens.refresh).await?;
        *self.tokens.write() = Some(tokens.refreshed(fresh));
        let resp = self.attempt(auth, &method, path, &build).await?;
        check(resp).await
    }

    async fn request_refresh(&self, refresh: &str) -> Result<AccessToken> {
        let body = RefreshRequest {
            refresh: String::from(refresh),
        };
        let resp = self
            .attempt(Auth::Anonymous, &Method::POST, "auth/token/refresh/", &|r| {
                r.json(&body)
            })
            .await?;
        parse(check(resp).await?, "auth/token/refresh/").await
    }

    async fn get<Q, R>(&self, path: &str, query: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .send(Auth::Bearer, Method::GET, path, |r| r.query(query))
            .await?;
        parse(resp, path).await
    }

    async fn post<B, R>(&self, auth: Auth, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .send(auth, Method::POST, path, |r| r.json(body))
            .await?;
        parse(resp, path).await
    }

    async fn patch<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let resp = self
            .send(Auth::Bearer, Method::PATCH, path, |r| r.json(body))
            .await?;
        parse(resp, path).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send(Auth::Bearer, Method::DELETE, path, |r| r)
            .await?;
        Ok(())
    }
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .bytes()
        .await
        .context("reading error response body")?;
    let err = api::Error::parse(status, &body);
    tracing::debug!(%status, ?err, "server returned an error");
    Err(Error::Api(err))
}

async fn parse<R: DeserializeOwned>(resp: Response, path: &str) -> Result<R> {
    Ok(resp
        .json()
        .await
        .with_context(|| format!("parsing response to {path}"))?)
}

#[async_trait]
impl Backend for HttpBackend {
    fn tokens(&self) -> Option<TokenPair> {
        self.tokens.read().clone()
    }

    fn set_tokens(&self, tokens: Option<TokenPair>) {
        *self.tokens.write() = tokens;
    }

    async fn login(&self, req: &LoginRequest) -> Result<TokenPair> {
        self.post(Auth::Anonymous, "auth/login/", req).await
    }

    async fn register(&self, req: &Registration) -> Result<()> {
        self.send(Auth::Anonymous, Method::POST, "auth/register/", |r| {
            r.json(req)
        })
        .await?;
        Ok(())
    }

    async fn profile(&self) -> Result<User> {
        self.get("auth/profile/", NO_QUERY).await
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        self.patch("auth/profile/", update).await
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        self.send(Auth::Bearer, Method::POST, "auth/password/change/", |r| {
            r.json(change)
        })
        .await?;
        Ok(())
    }

    async fn refresh_token(&self, refresh: &str) -> Result<AccessToken> {
        self.request_refresh(refresh).await
    }

    async fn list_courses(&self, query: &CourseQuery) -> Result<Page<Course>> {
        self.get("courses/", query).await
    }

    async fn get_course(&self, id: CourseId) -> Result<CourseDetail> {
        self.get(&format!("courses/{id}/"), NO_QUERY).await
    }

    async fn create_course(&self, course: &NewCourse) -> Result<Course> {
        self.post(Auth::Bearer, "courses/", course).await
    }

    async fn update_course(&self, id: CourseId, update: &CourseUpdate) -> Result<Course> {
        self.patch(&format!("courses/{id}/"), update).await
    }

    async fn delete_course(&self, id: CourseId) -> Result<()> {
        self.delete(&format!("courses/{id}/")).await
    }

    async fn list_lectures(&self, query: &LectureQuery) -> Result<Page<Lecture>> {
        self.get("lectures/", query).await
    }

    async fn get_lecture(&self, id: LectureId) -> Result<Lecture> {
        self.get(&format!("lectures/{id}/"), NO_QUERY).await
    }

    async fn create_lecture(&self, lecture: &NewLecture) -> Result<Lecture> {
        self.post(Auth::Bearer, "lectures/", lecture).await
    }

    async fn update_lecture(&self, id: LectureId, update: &LectureUpdate) -> Result<Lecture> {
        self.patch(&format!("lectures/{id}/"), update).await
    }

    async fn delete_lecture(&self, id: LectureId) -> Result<()> {
        self.delete(&format!("lectures/{id}/")).await
    }

    async fn list_enrollments(&self, query: &EnrollmentQuery) -> Result<Page<Enrollment>> {
        self.get("enrollments/", query).await
    }

    async fn enroll(&self, course: CourseId) -> Result<Enrollment> {
        self.post(Auth::Bearer, "enrollments/", &NewEnrollment { course })
            .await
    }

    async fn unenroll(&self, id: EnrollmentId) -> Result<()> {
        self.delete(&format!("enrollments/{id}/")).await
    }

    async fn list_progress(&self, query: &ProgressQuery) -> Result<Page<ProgressRecord>> {
        self.get("progress/", query).await
    }

    async fn create_progress(&self, progress: &NewProgress) -> Result<ProgressRecord> {
        self.post(Auth::Bearer, "progress/", progress).await
    }

    async fn update_progress(
        &self,
        id: ProgressId,
        update: &ProgressUpdate,
    ) -> Result<ProgressRecord> {
        self.patch(&format!("progress/{id}/"), update).await
    }

    async fn list_comments(&self, query: &CommentQuery) -> Result<Page<Comment>> {
        self.get("comments/", query).await
    }

    async fn create_comment(&self, comment: &NewComment) -> Result<Comment> {
        self.post(Auth::Bearer, "comments/", comment).await
    }

    async fn update_comment(&self, id: CommentId, update: &CommentUpdate) -> Result<Comment> {
        self.patch(&format!("comments/{id}/"), update).await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<()> {
        self.delete(&format!("comments/{id}/")).await
    }
}
