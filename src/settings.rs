use std::fmt;

use anyhow::Context;

use crate::{Result, api::BITBUCKET_URI};

/// Second positional argument meaning "ask me for the password".
pub const PASSWORD_PLACEHOLDER: &str = "-p";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials { username: username.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Source of interactively entered credentials. Implementations must only
/// return non-blank values.
pub trait Prompter {
    fn username(&mut self) -> std::io::Result<String>;
    fn password(&mut self) -> std::io::Result<String>;
}

/// Everything the report needs, resolved once from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_uri: String,
    pub credentials: Credentials,
    pub owner_filter: Option<String>,
}

impl Settings {
    /// Resolves `[USERNAME] [PASSWORD|-p] [OWNERFILTER]`, prompting for
    /// whatever is missing. A blank owner filter disables filtering.
    pub fn resolve(args: &[String], prompter: &mut impl Prompter) -> Result<Settings> {
        let username = match args.first() {
            Some(username) if !username.trim().is_empty() => username.clone(),
            _ => prompter.username().context("Cannot read username")?,
        };

        let password = match args.get(1) {
            Some(password) if !password.trim().is_empty() && password != PASSWORD_PLACEHOLDER => {
                password.clone()
            }
            _ => prompter.password().context("Cannot read password")?,
        };

        let owner_filter = args.get(2).filter(|owner| !owner.trim().is_empty()).cloned();
        log::debug!("resolved user {username}, owner filter {owner_filter:?}");

        Ok(Settings {
            base_uri: BITBUCKET_URI.to_string(),
            credentials: Credentials { username, password },
            owner_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Scripted {
        username_prompts: usize,
        password_prompts: usize,
    }

    impl Prompter for Scripted {
        fn username(&mut self) -> std::io::Result<String> {
            self.username_prompts += 1;
            Ok("prompted-user".to_string())
        }

        fn password(&mut self) -> std::io::Result<String> {
            self.password_prompts += 1;
            Ok("prompted-pass".to_string())
        }
    }

    struct Closed;

    impl Prompter for Closed {
        fn username(&mut self) -> std::io::Result<String> {
            Err(std::io::Error::other("no terminal"))
        }

        fn password(&mut self) -> std::io::Result<String> {
            Err(std::io::Error::other("no terminal"))
        }
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn everything_from_arguments() {
        let mut prompter = Scripted::default();
        let settings = Settings::resolve(&args(&["alice", "secret", "team"]), &mut prompter).unwrap();

        assert_eq!(settings.credentials, Credentials::new("alice", "secret"));
        assert_eq!(settings.owner_filter.as_deref(), Some("team"));
        assert_eq!(settings.base_uri, BITBUCKET_URI);
        assert_eq!(prompter.username_prompts, 0);
        assert_eq!(prompter.password_prompts, 0);
    }

    #[test]
    fn prompts_for_missing_credentials() {
        let mut prompter = Scripted::default();
        let settings = Settings::resolve(&[], &mut prompter).unwrap();

        assert_eq!(settings.credentials, Credentials::new("prompted-user", "prompted-pass"));
        assert_eq!(settings.owner_filter, None);
        assert_eq!(prompter.username_prompts, 1);
        assert_eq!(prompter.password_prompts, 1);
    }

    #[test]
    fn placeholder_password_prompts() {
        let mut prompter = Scripted::default();
        let settings = Settings::resolve(&args(&["alice", "-p", "team"]), &mut prompter).unwrap();

        assert_eq!(settings.credentials, Credentials::new("alice", "prompted-pass"));
        assert_eq!(settings.owner_filter.as_deref(), Some("team"));
        assert_eq!(prompter.username_prompts, 0);
        assert_eq!(prompter.password_prompts, 1);
    }

    #[test]
    fn blank_password_prompts() {
        let mut prompter = Scripted::default();
        let settings = Settings::resolve(&args(&["alice", "  "]), &mut prompter).unwrap();

        assert_eq!(settings.credentials.password, "prompted-pass");
    }

    #[test]
    fn blank_owner_filter_is_none() {
        let mut prompter = Scripted::default();
        let settings = Settings::resolve(&args(&["alice", "secret", " "]), &mut prompter).unwrap();

        assert_eq!(settings.owner_filter, None);
    }

    #[test]
    fn prompt_failure_is_reported() {
        let err = Settings::resolve(&args(&["alice"]), &mut Closed).unwrap_err();

        assert_eq!(err.to_string(), "Cannot read password");
    }

    #[test]
    fn debug_hides_password() {
        let shown = format!("{:?}", Credentials::new("alice", "secret"));

        assert!(shown.contains("alice"));
        assert!(!shown.contains("secret"));
    }
}
