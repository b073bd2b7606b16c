//! Project source descriptors.
//!
//! A source is either a local directory or a branch of a remote git
//! repository. On the command line a remote source is written as
//! `<branch>~<repository-url>`; anything without the separator is a path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

const REMOTE_SEPARATOR: char = '~';

/// Where a buildable project comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProjectSource {
    /// A project already checked out on disk.
    Local { path: PathBuf },
    /// A branch (or tag) of a remote git repository.
    Remote { branch: String, repository: String },
}

impl ProjectSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        ProjectSource::Local { path: path.into() }
    }

    pub fn remote(branch: impl Into<String>, repository: impl Into<String>) -> Self {
        ProjectSource::Remote {
            branch: branch.into(),
            repository: repository.into(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ProjectSource::Remote { .. })
    }
}

impl FromStr for ProjectSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidSource(s.to_string()));
        }

        match trimmed.split_once(REMOTE_SEPARATOR) {
            Some((branch, repository)) => {
                if branch.is_empty() || repository.is_empty() {
                    return Err(Error::InvalidSource(s.to_string()));
                }
                Ok(ProjectSource::remote(branch, repository))
            }
            None => Ok(ProjectSource::local(trimmed)),
        }
    }
}

impl fmt::Display for ProjectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectSource::Local { path } => write!(f, "{}", path.display()),
            ProjectSource::Remote { branch, repository } => {
                write!(f, "{}{}{}", branch, REMOTE_SEPARATOR, repository)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        let source: ProjectSource = "../my-sdk".parse().unwrap();
        assert_eq!(source, ProjectSource::local("../my-sdk"));
        assert!(!source.is_remote());
    }

    #[test]
    fn test_parse_remote() {
        let source: ProjectSource = "5.0.0~https://github.com/Adyen/adyen-ios.git"
            .parse()
            .unwrap();
        assert_eq!(
            source,
            ProjectSource::remote("5.0.0", "https://github.com/Adyen/adyen-ios.git")
        );
        assert_eq!(
            source.to_string(),
            "5.0.0~https://github.com/Adyen/adyen-ios.git"
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<ProjectSource>().is_err());
        assert!("~https://example.com".parse::<ProjectSource>().is_err());
        assert!("develop~".parse::<ProjectSource>().is_err());
    }
}
