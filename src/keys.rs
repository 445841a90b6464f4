//! Deterministic composite keys for repository, application and file records.
//!
//! Backend responses identify entities by plain name tuples. Recomputing the
//! same key from those names lets a response be matched back to the local
//! record without a server-assigned id.

/// Separator between normalized parts. `normalize` escapes `_` so the
/// separator cannot occur inside a part.
const SEPARATOR: &str = "__";

/// File name every dependency update targets.
pub const POM_FILE_NAME: &str = "pom.xml";

/// Normalize one key part: trim, lowercase, collapse whitespace runs to `-`,
/// then escape `%` and `_`.
fn normalize(part: &str) -> String {
    part.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
        .replace('%', "%25")
        .replace('_', "%5f")
}

/// Build a key from ordered parts. Missing parts contribute an empty string.
///
/// Ordering is significant: callers pass parts in the fixed order of the
/// entity's key fields (see the typed helpers below).
pub fn make_key(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .map(|p| normalize(p.unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

/// Key of a `DependentRepository`: (project, repo, dependency).
pub fn repository_key(project: &str, repo: &str, dependency: &str) -> String {
    make_key(&[Some(project), Some(repo), Some(dependency)])
}

/// Key of a `DependentApplication`: (project, repo, module, dependency).
pub fn application_key(project: &str, repo: &str, module: &str, dependency: &str) -> String {
    make_key(&[Some(project), Some(repo), Some(module), Some(dependency)])
}

/// Key of a `PomFile`: (project, repo, module, dependency, file name).
pub fn pom_file_key(
    project: &str,
    repo: &str,
    module: &str,
    dependency: &str,
    file_name: &str,
) -> String {
    make_key(&[
        Some(project),
        Some(repo),
        Some(module),
        Some(dependency),
        Some(file_name),
    ])
}
