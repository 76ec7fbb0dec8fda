use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use parking_lot::Mutex;

use crate::{
    api::{LoginRequest, PasswordChange, ProfileUpdate, Registration, TokenPair, User},
    forms, Backend, Result,
};

/// What survives between two runs of the client
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct StoredSession {
    pub tokens: TokenPair,
    pub user: User,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> anyhow::Result<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> anyhow::Result<()>;
    fn clear(&self) -> anyhow::Result<()>;
}

/// Keeps the session as a JSON file
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> FileStore {
        FileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileStore {
    fn load(&self) -> anyhow::Result<Option<StoredSession>> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("reading session file {:?}", self.path))
            }
        };
        let session = serde_json::from_slice(&data)
            .with_context(|| format!("parsing session file {:?}", self.path))?;
        Ok(Some(session))
    }

    fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating session directory {dir:?}"))?;
            }
        }
        let data = serde_json::to_vec_pretty(session).context("serializing session")?;
        std::fs::write(&self.path, data)
            .with_context(|| format!("writing session file {:?}", self.path))
    }

    fn clear(&self) -> anyhow::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing session file {:?}", self.path))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore(Mutex<Option<StoredSession>>);

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with(session: StoredSession) -> MemoryStore {
        MemoryStore(Mutex::new(Some(session)))
    }

    pub fn get(&self) -> Option<StoredSession> {
        self.0.lock().clone()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<StoredSession>> {
        Ok(self.0.lock().clone())
    }

    fn save(&self, session: &StoredSession) -> anyhow::Result<()> {
        *self.0.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        *self.0.lock() = None;
        Ok(())
    }
}

/// The logged-in user, shared by all screens of the client
pub struct Session<B, S> {
    backend: Arc<B>,
    store: S,
    user: Option<User>,
}

impl<B: Backend, S: SessionStore> Session<B, S> {
    pub fn new(backend: Arc<B>, store: S) -> Session<B, S> {
        Session {
            backend,
            store,
            user: None,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Restore the session saved by a previous run.
    ///
    /// The stored user is adopted right away and refreshed from the server
    /// when possible. Unreadable or rejected sessions are cleared.
    pub async fn hydrate(&mut self) -> Option<&User> {
        let stored = match self.store.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(err=?e, "dropping unreadable saved session");
                self.forget();
                return None;
            }
        };
        self.backend.set_tokens(Some(stored.tokens));
        self.user = Some(stored.user);
        match self.backend.profile().await {
            Ok(user) => {
                tracing::info!(user = %user.username, "restored saved session");
                if let Err(e) = self.save_user(&user) {
                    tracing::warn!(err=?e, "failed saving refreshed session");
                }
                self.user = Some(user);
            }
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("saved session was rejected by the server");
                self.forget();
            }
            Err(e) => {
                tracing::warn!(err=?e, "failed refreshing profile, keeping saved one");
            }
        }
        self.user.as_ref()
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<&User> {
        let tokens = self
            .backend
            .login(&LoginRequest {
                username: String::from(username),
                password: String::from(password),
            })
            .await?;
        self.backend.set_tokens(Some(tokens));
        let user = match self.backend.profile().await {
            Ok(user) => user,
            Err(e) => {
                self.backend.set_tokens(None);
                return Err(e);
            }
        };
        tracing::info!(user = %user.username, "logged in");
        self.save_user(&user)?;
        Ok(self.user.insert(user))
    }

    /// Create the account then log into it
    pub async fn register(&mut self, registration: &Registration) -> Result<&User> {
        forms::validate_registration(registration)?;
        self.backend.register(registration).await?;
        tracing::info!(user = %registration.username, "registered");
        self.login(&registration.username, &registration.password)
            .await
    }

    pub fn logout(&mut self) {
        if let Some(user) = &self.user {
            tracing::info!(user = %user.username, "logging out");
        }
        self.forget();
    }

    pub async fn update_profile(&mut self, update: &ProfileUpdate) -> Result<&User> {
        let user = self.backend.update_profile(update).await?;
        self.save_user(&user)?;
        Ok(self.user.insert(user))
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        forms::validate_password_change(change)?;
        self.backend.change_password(change).await?;
        tracing::info!("password changed");
        Ok(())
    }

    /// Save the current tokens, which the backend may have refreshed since
    /// the last save
    pub fn persist(&self) -> anyhow::Result<()> {
        match &self.user {
            Some(user) => self.save_user(user),
            None => self.store.clear(),
        }
    }

    fn save_user(&self, user: &User) -> anyhow::Result<()> {
        match self.backend.tokens() {
            Some(tokens) => self.store.save(&StoredSession {
                tokens,
                user: user.clone(),
            }),
            None => self.store.clear(),
        }
    }

    fn forget(&mut self) {
        self.user = None;
        self.backend.set_tokens(None);
        if let Err(e) = self.store.clear() {
            tracing::warn!(err=?e, "failed clearing saved session");
        }
    }
}
