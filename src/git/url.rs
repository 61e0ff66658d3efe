//! Repository URL helpers.
//!
//! Patterns accept two URL shapes: absolute `http(s)://` URLs and the scp-like
//! SSH form `git@host:org/repo.git`.

use thiserror::Error;
use url::Url;

const SSH_PREFIX: &str = "git@";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("repository URL must be either http/https or start with git@ when using ssh authentication: {0}")]
    UnsupportedScheme(String),
    #[error("invalid ssh git URL: {0}")]
    InvalidSsh(String),
    #[error("error parsing URL {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("error parsing URL (empty hostname): {0}")]
    EmptyHostname(String),
}

/// Accept `git@...`, `https://...` and `http://...` repository URLs
pub fn validate_repo_url(repo_url: &str) -> Result<(), UrlError> {
    if repo_url.starts_with(SSH_PREFIX)
        || repo_url.starts_with("https://")
        || repo_url.starts_with("http://")
    {
        Ok(())
    } else {
        Err(UrlError::UnsupportedScheme(repo_url.to_string()))
    }
}

/// Last path component of a repository URL without the `.git` suffix.
///
/// `https://github.com/org/common.git` and `git@github.com:org/common.git/`
/// both yield `common`.
pub fn extract_repository_name(git_url: &str) -> Result<String, UrlError> {
    if git_url.starts_with(SSH_PREFIX) {
        let path = ssh_path(git_url)?;
        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        return Ok(last_segment(path).to_string());
    }

    let parsed = parse_absolute(git_url)?;
    let name = last_segment(parsed.path().trim_end_matches('/'));
    let name = match name.strip_suffix(".git") {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => name,
    };
    Ok(name.to_string())
}

/// Host name of a repository URL, e.g. `github.com`
pub fn extract_hostname(git_url: &str) -> Result<String, UrlError> {
    if let Some(rest) = git_url.strip_prefix(SSH_PREFIX) {
        if rest.contains('@') {
            return Err(UrlError::InvalidSsh(git_url.to_string()));
        }
        let host = rest.split(':').next().unwrap_or_default();
        if host.is_empty() {
            return Err(UrlError::EmptyHostname(git_url.to_string()));
        }
        return Ok(host.to_string());
    }

    // `https:///org/repo` would otherwise be read as host `org`
    if git_url
        .split_once("://")
        .is_some_and(|(_, rest)| rest.starts_with('/'))
    {
        return Err(UrlError::EmptyHostname(git_url.to_string()));
    }

    let parsed = parse_absolute(git_url)?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_string()),
        _ => Err(UrlError::EmptyHostname(git_url.to_string())),
    }
}

fn ssh_path(git_url: &str) -> Result<&str, UrlError> {
    let mut parts = git_url.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(path), None) => Ok(path),
        _ => Err(UrlError::InvalidSsh(git_url.to_string())),
    }
}

fn parse_absolute(git_url: &str) -> Result<Url, UrlError> {
    Url::parse(git_url).map_err(|e| UrlError::Parse {
        url: git_url.to_string(),
        reason: e.to_string(),
    })
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_repo_url() {
        assert!(validate_repo_url("git@example.com:username/repo.git").is_ok());
        assert!(validate_repo_url("http://example.com/username/repo.git").is_ok());
        assert!(validate_repo_url("https://example.com/username/repo.git").is_ok());

        let err = validate_repo_url("ftp://example.com/username/repo.git").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("repository URL must be either http/https"));
        assert!(message.contains("ftp://example.com/username/repo.git"));
    }

    #[test]
    fn test_repository_name_and_hostname_table() {
        let cases = [
            ("https://github.com/org/common.git", "common", "github.com"),
            ("https://github.com/org/common", "common", "github.com"),
            ("https://github.com/org/common/", "common", "github.com"),
            ("https://gitlab.example.com:8443/group/sub/multicloud-gitops.git", "multicloud-gitops", "gitlab.example.com"),
            ("git@github.com:org/common.git", "common", "github.com"),
            ("git@github.com:org/common.git/", "common", "github.com"),
            ("git@github.com:org/common", "common", "github.com"),
        ];
        for (url, name, host) in cases {
            assert_eq!(extract_repository_name(url).unwrap(), name, "{url}");
            assert_eq!(extract_hostname(url).unwrap(), host, "{url}");
        }
    }

    #[test]
    fn test_repository_name_rejects_bad_urls() {
        assert!(extract_repository_name("git@github.com:user:repo.git").is_err());
        assert!(extract_repository_name("git@github.com:user/repo:extra").is_err());
        assert!(extract_repository_name("https//github.com@2/user://").is_err());
        assert!(extract_repository_name("github.com/user/repo.git").is_err());
    }

    #[test]
    fn test_hostname_rejects_bad_urls() {
        assert!(extract_hostname("git@github.com:@user/repo:extra").is_err());
        assert!(extract_hostname("https://github.com:user/repo.git").is_err());
        assert!(extract_hostname("github.com/user/repo.git").is_err());
        assert_eq!(
            extract_hostname("git@:org/repo.git"),
            Err(UrlError::EmptyHostname("git@:org/repo.git".to_string()))
        );
        assert_eq!(
            extract_hostname("https:///user/repo.git"),
            Err(UrlError::EmptyHostname("https:///user/repo.git".to_string()))
        );
    }
}
