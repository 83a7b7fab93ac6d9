use thiserror::Error;
use url::Url;

/// Substrings that mark an entry as a URL rather than a bare host fragment.
const FORBIDDEN_SUBSTRINGS: &[&str] = &["/", "http", ":"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("instance must not be empty")]
    Empty,
    #[error("instance must be a bare host, found {needle:?}")]
    ForbiddenSubstring { needle: &'static str },
    #[error("instance is already in the list")]
    Duplicate,
    #[error("instance is not a valid host name")]
    NotAHost,
}

/// Expands each instance into its https and http wildcard match patterns.
pub fn derive_patterns<S: AsRef<str>>(instances: &[S]) -> Vec<String> {
    let mut patterns = Vec::with_capacity(instances.len() * 2);
    for instance in instances {
        let instance = instance.as_ref();
        patterns.push(format!("https://*.{instance}/*"));
        patterns.push(format!("http://*.{instance}/*"));
    }
    patterns
}

/// Checks a candidate instance against the current list.
pub fn validate_instance<S: AsRef<str>>(candidate: &str, existing: &[S]) -> Result<(), InstanceError> {
    if candidate.trim().is_empty() {
        return Err(InstanceError::Empty);
    }
    if let Some(needle) = FORBIDDEN_SUBSTRINGS
        .iter()
        .copied()
        .find(|needle| candidate.contains(needle))
    {
        return Err(InstanceError::ForbiddenSubstring { needle });
    }
    if existing.iter().any(|entry| entry.as_ref() == candidate) {
        return Err(InstanceError::Duplicate);
    }

    // The URL parser silently drops tabs and newlines, so they never reach it.
    if candidate.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(InstanceError::NotAHost);
    }

    // The wildcard is replaced by a concrete label so the host parser sees a real name.
    let probe = format!("https://www.{candidate}/");
    match Url::parse(&probe) {
        Ok(url)
            if url.host_str().is_some()
                && url.username().is_empty()
                && url.path() == "/"
                && url.query().is_none()
                && url.fragment().is_none() =>
        {
            Ok(())
        }
        _ => Err(InstanceError::NotAHost),
    }
}
