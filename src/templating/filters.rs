//! Custom Tera filters available to every template.
//!
//! # Examples
//!
//! ```text
//! [project]
//! name = "{{ project_name }}"
//! packages = ["{{ project_name | package_name }}"]
//! ```

use std::collections::HashMap;

use crate::naming;

/// Register every custom filter on a fresh Tera instance.
pub fn register_filters(tera: &mut tera::Tera) {
    tera.register_filter("package_name", create_package_name_filter());
}

/// Creates the `package_name` filter.
///
/// Applies [`naming::package_name`] to a string value, so templates can
/// derive identifiers from any answer, not only `project_name`.
///
/// # Errors
///
/// The returned filter fails when its input is not a string.
pub fn create_package_name_filter() -> impl tera::Filter + 'static {
    move |value: &tera::Value, _args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
        let name = value
            .as_str()
            .ok_or_else(|| tera::Error::msg("package_name filter requires a string value"))?;
        Ok(tera::Value::String(naming::package_name(name)))
    }
}
