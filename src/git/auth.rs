//! Git authentication callbacks
//!
//! Authentication is delegated entirely to git's native credential system:
//! - SSH agent, then keys from ~/.ssh/
//! - Git credential helpers for HTTPS
//! - Anonymous access for public repositories
//!
//! libgit2 calls the credentials callback again after every rejected attempt, so each
//! method is only offered once per connection.

use std::cell::Cell;
use std::path::PathBuf;

use git2::{Cred, CredentialType, Error, ErrorClass, ErrorCode, RemoteCallbacks};

const SSH_KEY_NAMES: &[&str] = &["id_ed25519", "id_ecdsa", "id_rsa"];

fn auth_error(message: &str) -> Error {
    Error::new(ErrorCode::Auth, ErrorClass::Callback, message)
}

/// Private keys in ~/.ssh that exist, in preference order
fn ssh_key_candidates() -> Vec<(PathBuf, Option<PathBuf>)> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    let ssh_dir = home.join(".ssh");
    SSH_KEY_NAMES
        .iter()
        .map(|name| ssh_dir.join(name))
        .filter(|key| key.is_file())
        .map(|key| {
            let public = key.with_extension("pub");
            let public = public.is_file().then_some(public);
            (key, public)
        })
        .collect()
}

/// Credentials for one connection attempt sequence
#[derive(Default)]
struct Attempts {
    agent_tried: Cell<bool>,
    next_key: Cell<usize>,
    helper_tried: Cell<bool>,
    default_tried: Cell<bool>,
}

impl Attempts {
    fn ssh(&self, username: &str) -> Result<Cred, Error> {
        if !self.agent_tried.replace(true) {
            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        let keys = ssh_key_candidates();
        while self.next_key.get() < keys.len() {
            let (private, public) = &keys[self.next_key.get()];
            self.next_key.set(self.next_key.get() + 1);
            if let Ok(cred) = Cred::ssh_key(username, public.as_deref(), private, None) {
                return Ok(cred);
            }
        }

        Err(auth_error("no usable SSH key (tried agent and ~/.ssh)"))
    }

    fn user_pass(&self, url: &str, username: Option<&str>) -> Result<Cred, Error> {
        if !self.helper_tried.replace(true) {
            let config = git2::Config::open_default().or_else(|_| git2::Config::new())?;
            if let Ok(cred) = Cred::credential_helper(&config, url, username) {
                return Ok(cred);
            }
        }
        Err(auth_error("no credentials available from git credential helpers"))
    }

    fn default_cred(&self) -> Result<Cred, Error> {
        if self.default_tried.replace(true) {
            return Err(auth_error("default credentials rejected"));
        }
        Cred::default()
    }
}

/// Set up authentication callbacks for git operations
pub fn setup_auth_callbacks(callbacks: &mut RemoteCallbacks<'_>) {
    let attempts = Attempts::default();
    callbacks.credentials(move |url, username_from_url, allowed| {
        if allowed.contains(CredentialType::SSH_KEY) {
            return attempts.ssh(username_from_url.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
            return attempts.user_pass(url, username_from_url);
        }
        if allowed.contains(CredentialType::DEFAULT) {
            return attempts.default_cred();
        }
        if allowed.contains(CredentialType::USERNAME) {
            return Cred::username(username_from_url.unwrap_or("git"));
        }
        Err(auth_error("no supported authentication method"))
    });
}
