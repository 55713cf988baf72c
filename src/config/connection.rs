//! Named connection-string resolution.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// Source of named connection strings.
pub trait ConnectionStringProvider {
    /// Look up the connection string registered under `name`.
    fn connection_string(&self, name: &str) -> Option<String>;
}

impl ConnectionStringProvider for BTreeMap<String, String> {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<S: BuildHasher> ConnectionStringProvider for HashMap<String, String, S> {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Whether `value` is a connection target rather than a name.
fn is_raw_target(value: &str) -> bool {
    value.contains("://") || value.contains('=')
}

/// Resolve a configured connection value.
///
/// Values that look like a target (`scheme://…` or `key=value`) are returned
/// as-is. Anything else is treated as a name and looked up in `provider`; an
/// unknown name resolves to an empty string, which option validation rejects.
pub fn resolve_connection(value: &str, provider: &dyn ConnectionStringProvider) -> String {
    let value = value.trim();
    if is_raw_target(value) {
        return value.to_string();
    }

    match provider.connection_string(value) {
        Some(target) => target,
        None => {
            tracing::warn!(name = %value, "Connection string not found");
            String::new()
        }
    }
}
