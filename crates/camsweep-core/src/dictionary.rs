// ── Attack dictionaries ──
//
// Parsing only. Reading files and choosing between built-in and custom
// dictionaries is the configuration layer's job.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{Credentials, normalize_path};

/// Ordered candidate route paths, tried in listed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteDictionary {
    paths: Vec<String>,
}

impl RouteDictionary {
    /// Build from paths, normalizing leading slashes and dropping duplicates.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: IndexSet<String> = paths
            .into_iter()
            .map(|p| normalize_path(p.as_ref()))
            .collect();
        Self {
            paths: unique.into_iter().collect(),
        }
    }

    /// Parse a one-path-per-line dictionary.
    ///
    /// Blank lines and `#` comments are skipped; a line holding just `/`
    /// names the root path.
    pub fn parse(content: &str) -> Self {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Usernames × passwords, iterated username-major.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialDictionary {
    pub usernames: Vec<String>,
    pub passwords: Vec<String>,
}

impl CredentialDictionary {
    pub fn new(usernames: Vec<String>, passwords: Vec<String>) -> Self {
        Self {
            usernames,
            passwords,
        }
    }

    /// Parse the combined `{"usernames": [...], "passwords": [...]}` form.
    ///
    /// Empty strings are kept: an empty password is a real candidate.
    pub fn from_json(content: &str) -> Result<Self, CoreError> {
        let dict: Self = serde_json::from_str(content)?;
        dict.validate()?;
        Ok(dict)
    }

    /// Build from two newline-delimited lists. Blank lines are skipped.
    pub fn from_lists(usernames: &str, passwords: &str) -> Result<Self, CoreError> {
        let dict = Self::new(parse_list(usernames), parse_list(passwords));
        dict.validate()?;
        Ok(dict)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.usernames.is_empty() {
            return Err(CoreError::Dictionary {
                message: "credential dictionary has no usernames".into(),
            });
        }
        if self.passwords.is_empty() {
            return Err(CoreError::Dictionary {
                message: "credential dictionary has no passwords".into(),
            });
        }
        Ok(())
    }

    /// Every pair, username outer loop, password inner loop.
    pub fn pairs(&self) -> impl Iterator<Item = Credentials> + '_ {
        self.usernames.iter().flat_map(move |username| {
            self.passwords
                .iter()
                .map(move |password| Credentials::new(username.clone(), password.clone()))
        })
    }

    pub fn len(&self) -> usize {
        self.usernames.len() * self.passwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
