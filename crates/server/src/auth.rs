//! Password authentication with a home directory check.
//!
//! A session is accepted only when its password is valid AND its home
//! directory exists. Both checks always run and the caller only sees the
//! combined answer, so a client cannot tell a wrong password from a
//! missing home.

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use common::prelude::{FileSystemFactory, Session, SubsystemFactory};

/// Checks a username and password
#[async_trait]
pub trait PasswordAuthenticator: Send + Sync {
    async fn authenticate_password(&self, username: &str, password: &str, session: &Session)
        -> bool;
}

/// Checks that a session's home directory exists
#[async_trait]
pub trait HomeDirExistsChecker: Send + Sync {
    async fn check(&self, session: &Session) -> bool;
}

/// Fixed table of usernames and passwords
#[derive(Default)]
pub struct SimpleAuthenticator {
    permitted: HashMap<String, String>,
}

impl std::fmt::Debug for SimpleAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleAuthenticator")
            .field("users", &self.permitted.len())
            .finish()
    }
}

impl SimpleAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.permitted.insert(username.into(), password.into());
    }
}

impl From<&BTreeMap<String, String>> for SimpleAuthenticator {
    fn from(users: &BTreeMap<String, String>) -> Self {
        let mut authenticator = Self::new();
        for (username, password) in users {
            authenticator.add_user(username, password);
        }
        authenticator
    }
}

#[async_trait]
impl PasswordAuthenticator for SimpleAuthenticator {
    async fn authenticate_password(
        &self,
        username: &str,
        password: &str,
        _session: &Session,
    ) -> bool {
        match self.permitted.get(username) {
            Some(expected) if expected == password => {
                tracing::info!("user: '{}', password: okay", username);
                true
            }
            Some(_) => {
                tracing::warn!("user: '{}', password: invalid", username);
                false
            }
            None => {
                tracing::warn!("user: '{}': unknown", username);
                false
            }
        }
    }
}

/// Builds the session's filesystem and checks that `.` resolves to
/// something that exists
#[derive(Debug, Clone)]
pub struct DefaultHomeDirExistsChecker {
    subsystems: SubsystemFactory,
    file_systems: Arc<FileSystemFactory>,
}

impl DefaultHomeDirExistsChecker {
    pub fn new(subsystems: SubsystemFactory, file_systems: Arc<FileSystemFactory>) -> Self {
        Self {
            subsystems,
            file_systems,
        }
    }
}

#[async_trait]
impl HomeDirExistsChecker for DefaultHomeDirExistsChecker {
    async fn check(&self, session: &Session) -> bool {
        tracing::trace!("check({})", session);
        let username = session.username();
        let mut subsystem = self.subsystems.create(session.clone());
        let file_system = match self.file_systems.create_file_system(session).await {
            Ok(file_system) => file_system,
            Err(e) => {
                tracing::warn!("Creating filesystem for '{}': {}", username, e);
                return false;
            }
        };
        subsystem.set_file_system(file_system);

        let home = match subsystem.resolve_file(".") {
            Ok(home) => home,
            Err(e) => {
                tracing::warn!("Checking home directory exists for '{}': {}", username, e);
                return false;
            }
        };
        match home.exists().await {
            Ok(true) => {
                tracing::info!("user: '{}', homeDir:'{}': found", username, home.path());
                true
            }
            Ok(false) => {
                tracing::warn!("user: '{}', homeDir:'{}': does not exist", username, home.path());
                false
            }
            Err(e) => {
                tracing::warn!("Checking home directory exists for '{}': {}", username, e);
                false
            }
        }
    }
}

/// Accepts a session when both the password and the home directory check
/// pass
#[derive(Clone)]
pub struct AuthenticationProvider {
    passwords: Arc<dyn PasswordAuthenticator>,
    home_dirs: Arc<dyn HomeDirExistsChecker>,
}

impl std::fmt::Debug for AuthenticationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticationProvider").finish_non_exhaustive()
    }
}

impl AuthenticationProvider {
    pub fn new(
        passwords: Arc<dyn PasswordAuthenticator>,
        home_dirs: Arc<dyn HomeDirExistsChecker>,
    ) -> Self {
        Self {
            passwords,
            home_dirs,
        }
    }

    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
        client_address: Option<SocketAddr>,
    ) -> bool {
        let session = Session::new(username, client_address);
        let is_user_authenticated = self
            .passwords
            .authenticate_password(username, password, &session)
            .await;
        let is_home_dir_found = self.home_dirs.check(&session).await;
        is_user_authenticated && is_home_dir_found
    }
}
