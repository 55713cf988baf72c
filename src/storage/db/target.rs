//! Connection targets.

use std::sync::OnceLock;

use regex::Regex;

/// Query parameter that enables client-side bulk transfer on MySQL-family servers.
pub const LOCAL_INFILE_PARAM: &str = "allow_load_local_infile";

/// Server family behind a connection target, detected from its URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Sqlite,
    Other,
}

impl Backend {
    pub fn from_target(target: &str) -> Self {
        let scheme = target
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .unwrap_or_default();
        match scheme.as_str() {
            "mysql" | "mariadb" => Backend::MySql,
            "sqlite" => Backend::Sqlite,
            _ => Backend::Other,
        }
    }
}

/// Return `target` with the bulk-transfer flag set to `true`.
///
/// An existing flag (any key casing, optional whitespace around `=`) has its
/// value replaced in place. Otherwise the flag is appended, starting a query
/// string with `?` or joining an existing one with `&`. Idempotent.
///
/// The flag is carried for server-side tooling that reads the target. sqlx's
/// MySQL URL parser ignores unknown parameters, so it does not enable
/// `LOAD DATA LOCAL INFILE` in the driver; bulk transfer runs as multi-row
/// inserts either way.
///
/// ```
/// use logsink::storage::db::with_local_infile;
///
/// assert_eq!(
///     with_local_infile("mysql://db/logs"),
///     "mysql://db/logs?allow_load_local_infile=true"
/// );
/// assert_eq!(
///     with_local_infile("mysql://db/logs?Allow_Load_Local_Infile = false&ssl-mode=required"),
///     "mysql://db/logs?Allow_Load_Local_Infile = true&ssl-mode=required"
/// );
/// ```
pub fn with_local_infile(target: &str) -> String {
    static FLAG_REGEX: OnceLock<Regex> = OnceLock::new();

    let regex = FLAG_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(allow_load_local_infile\s*=\s*)[^&;#]*")
            .expect("failed to compile local infile regex")
    });

    if regex.is_match(target) {
        return regex.replace_all(target, "${1}true").into_owned();
    }

    let mut rewritten = String::with_capacity(target.len() + LOCAL_INFILE_PARAM.len() + 6);
    rewritten.push_str(target);
    if !target.contains('?') {
        rewritten.push('?');
    } else if !(target.ends_with('?') || target.ends_with('&')) {
        rewritten.push('&');
    }
    rewritten.push_str(LOCAL_INFILE_PARAM);
    rewritten.push_str("=true");
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        assert_eq!(Backend::from_target("mysql://u@h/db"), Backend::MySql);
        assert_eq!(Backend::from_target("MariaDB://u@h/db"), Backend::MySql);
        assert_eq!(Backend::from_target("sqlite:///tmp/x.db?mode=rwc"), Backend::Sqlite);
        assert_eq!(Backend::from_target("postgres://h/db"), Backend::Other);
        assert_eq!(Backend::from_target("no scheme"), Backend::Other);
    }

    #[test]
    fn test_appends_flag() {
        assert_eq!(
            with_local_infile("mysql://h/db"),
            "mysql://h/db?allow_load_local_infile=true"
        );
        assert_eq!(
            with_local_infile("mysql://h/db?ssl-mode=disabled"),
            "mysql://h/db?ssl-mode=disabled&allow_load_local_infile=true"
        );
        assert_eq!(
            with_local_infile("mysql://h/db?"),
            "mysql://h/db?allow_load_local_infile=true"
        );
        assert_eq!(
            with_local_infile("mysql://h/db?a=1&"),
            "mysql://h/db?a=1&allow_load_local_infile=true"
        );
    }

    #[test]
    fn test_replaces_existing_flag_value_only() {
        assert_eq!(
            with_local_infile("mysql://h/db?ALLOW_LOAD_LOCAL_INFILE=false&b=2"),
            "mysql://h/db?ALLOW_LOAD_LOCAL_INFILE=true&b=2"
        );
        assert_eq!(
            with_local_infile("mysql://h/db?a=1&allow_load_local_infile ="),
            "mysql://h/db?a=1&allow_load_local_infile =true"
        );
    }

    #[test]
    fn test_idempotent() {
        for target in [
            "mysql://h/db",
            "mysql://h/db?x=1",
            "mysql://h/db?allow_load_local_infile=no",
        ] {
            let once = with_local_infile(target);
            assert_eq!(with_local_infile(&once), once);
        }
    }
}
