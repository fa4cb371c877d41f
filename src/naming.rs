//! Name derivations shared by the schema, the renderer and the CLI.
//!
//! Project names are usually written in kebab case (`my-cool-app`) while the
//! importable package inside the project needs an identifier
//! (`my_cool_app`). The derivation is a pure string transformation so it can
//! run before any file is rendered, which keeps directory names such as
//! `{{ package_name }}/` stable.

/// Derive a package identifier from a project name.
///
/// Every `-` becomes `_`; nothing else changes. The function is idempotent:
/// applying it to its own output returns the same string.
///
/// # Examples
///
/// ```
/// use stamp_cli::naming::package_name;
///
/// assert_eq!(package_name("test-project"), "test_project");
/// assert_eq!(package_name("my-cool-app"), "my_cool_app");
/// assert_eq!(package_name(&package_name("amazing-tool")), "amazing_tool");
/// ```
#[must_use]
pub fn package_name(project_name: &str) -> String {
    project_name.replace('-', "_")
}

/// Whether `name` can be referenced from a template token.
///
/// Template tokens accept `[A-Za-z_][A-Za-z0-9_]*`, so question names are
/// held to the same rule.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
