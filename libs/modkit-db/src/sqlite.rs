//! SQLite DSN handling: pragma extraction, in-memory detection and
//! parent directory preparation for file databases.

use std::collections::HashMap;
use std::path::PathBuf;

const PRAGMA_PARAMS: &[&str] = &["wal", "synchronous", "busy_timeout", "journal_mode"];

pub(crate) const DEFAULT_BUSY_TIMEOUT_MS: i64 = 5000;

/// Split pragma query parameters off a DSN.
///
/// Returns the DSN without them plus the extracted pairs (lowercased keys).
pub(crate) fn extract_sqlite_pragmas(dsn: &str) -> (String, HashMap<String, String>) {
    let Some((base, query)) = dsn.split_once('?') else {
        return (dsn.to_string(), HashMap::new());
    };

    let mut pragmas = HashMap::new();
    let mut kept = Vec::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        let key = k.to_ascii_lowercase();
        if PRAGMA_PARAMS.contains(&key.as_str()) {
            pragmas.insert(key, v.to_string());
        } else {
            kept.push(pair);
        }
    }

    let clean = if kept.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", kept.join("&"))
    };
    (clean, pragmas)
}

pub(crate) fn is_memory_dsn(dsn: &str) -> bool {
    let lower = dsn.to_ascii_lowercase();
    lower.contains(":memory:") || lower.contains("mode=memory")
}

/// Filesystem path of a file DSN, `None` for in-memory databases.
fn file_path_of(dsn: &str) -> Option<PathBuf> {
    if is_memory_dsn(dsn) {
        return None;
    }
    let rest = dsn
        .strip_prefix("sqlite://")
        .or_else(|| dsn.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

/// Create the parent directory of a file database when asked to.
pub(crate) fn prepare_sqlite_path(dsn: &str, create_dirs: bool) -> std::io::Result<()> {
    if !create_dirs {
        return Ok(());
    }
    if let Some(parent) = file_path_of(dsn).as_deref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JournalMode {
    Delete,
    Wal,
    Memory,
    Truncate,
    Persist,
    Off,
}

impl JournalMode {
    fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "DELETE" => Self::Delete,
            "WAL" => Self::Wal,
            "MEMORY" => Self::Memory,
            "TRUNCATE" => Self::Truncate,
            "PERSIST" => Self::Persist,
            "OFF" => Self::Off,
            _ => return None,
        })
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Wal => "WAL",
            Self::Memory => "MEMORY",
            Self::Truncate => "TRUNCATE",
            Self::Persist => "PERSIST",
            Self::Off => "OFF",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SyncMode {
    Off,
    Normal,
    Full,
    Extra,
}

impl SyncMode {
    fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "OFF" => Self::Off,
            "NORMAL" => Self::Normal,
            "FULL" => Self::Full,
            "EXTRA" => Self::Extra,
            _ => return None,
        })
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

/// Validated pragma settings. Invalid values are dropped with a warning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pragmas {
    pub journal_mode: Option<JournalMode>,
    pub synchronous: Option<SyncMode>,
    pub busy_timeout_ms: Option<i64>,
}

impl Pragmas {
    pub(crate) fn from_pairs(pairs: &HashMap<String, String>) -> Self {
        let mut out = Pragmas::default();
        for (key, value) in pairs {
            match key.as_str() {
                "journal_mode" => match JournalMode::parse(value) {
                    Some(m) => out.journal_mode = Some(m),
                    None => tracing::warn!(value, "invalid 'journal_mode' pragma, ignoring"),
                },
                // legacy toggle; an explicit journal_mode wins
                "wal" if out.journal_mode.is_none() => match value.to_ascii_lowercase().as_str()
                {
                    "true" | "1" => out.journal_mode = Some(JournalMode::Wal),
                    "false" | "0" => out.journal_mode = Some(JournalMode::Delete),
                    _ => tracing::warn!(value, "invalid 'wal' pragma, ignoring"),
                },
                "synchronous" => match SyncMode::parse(value) {
                    Some(m) => out.synchronous = Some(m),
                    None => tracing::warn!(value, "invalid 'synchronous' pragma, ignoring"),
                },
                "busy_timeout" => match value.parse::<i64>() {
                    Ok(ms) if ms >= 0 => out.busy_timeout_ms = Some(ms),
                    _ => tracing::warn!(value, "invalid 'busy_timeout' pragma, ignoring"),
                },
                _ => {}
            }
        }
        out
    }

    /// PRAGMA statements run on every new connection.
    ///
    /// In-memory databases get DELETE journaling and no busy timeout.
    pub(crate) fn statements(&self, memory: bool, default_busy_ms: i64) -> Vec<String> {
        let journal = match (self.journal_mode, memory) {
            (Some(m), _) => m,
            (None, true) => JournalMode::Delete,
            (None, false) => JournalMode::Wal,
        };
        let sync = self.synchronous.unwrap_or(SyncMode::Normal);

        let mut stmts = vec![
            format!("PRAGMA journal_mode = {}", journal.as_sql()),
            format!("PRAGMA synchronous = {}", sync.as_sql()),
            "PRAGMA foreign_keys = ON".to_string(),
        ];
        if !memory {
            stmts.push(format!(
                "PRAGMA busy_timeout = {}",
                self.busy_timeout_ms.unwrap_or(default_busy_ms)
            ));
        }
        stmts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_pragmas_and_keeps_other_params() {
        let (clean, pairs) =
            extract_sqlite_pragmas("sqlite:///data/em.db?WAL=true&mode=rwc&synchronous=full");
        assert_eq!(clean, "sqlite:///data/em.db?mode=rwc");
        assert_eq!(pairs.get("wal").map(String::as_str), Some("true"));
        assert_eq!(pairs.get("synchronous").map(String::as_str), Some("full"));
        assert!(!pairs.contains_key("mode"));
    }

    #[test]
    fn dsn_without_query_is_untouched() {
        let (clean, pairs) = extract_sqlite_pragmas("sqlite::memory:");
        assert_eq!(clean, "sqlite::memory:");
        assert!(pairs.is_empty());
    }

    #[test]
    fn memory_detection() {
        assert!(is_memory_dsn("sqlite::memory:"));
        assert!(is_memory_dsn("sqlite://:memory:"));
        assert!(is_memory_dsn("sqlite:file:x?MODE=Memory&cache=shared"));
        assert!(!is_memory_dsn("sqlite:///tmp/em.db"));
    }

    #[test]
    fn file_path_extraction() {
        assert_eq!(
            file_path_of("sqlite:///abs/dir/em.db?mode=rwc"),
            Some(PathBuf::from("/abs/dir/em.db"))
        );
        assert_eq!(file_path_of("sqlite:rel.db"), Some(PathBuf::from("rel.db")));
        assert_eq!(file_path_of("sqlite::memory:"), None);
    }

    #[test]
    fn prepare_creates_parent_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let db = tmp.path().join("nested/more/em.db");
        let dsn = format!("sqlite://{}", db.to_string_lossy().replace('\\', "/"));
        prepare_sqlite_path(&dsn, true).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }

    #[test]
    fn pragma_parsing_validates_values() {
        let pairs = HashMap::from([
            ("journal_mode".to_string(), "truncate".to_string()),
            ("synchronous".to_string(), "bogus".to_string()),
            ("busy_timeout".to_string(), "-5".to_string()),
        ]);
        let p = Pragmas::from_pairs(&pairs);
        assert_eq!(p.journal_mode, Some(JournalMode::Truncate));
        assert_eq!(p.synchronous, None);
        assert_eq!(p.busy_timeout_ms, None);
    }

    #[test]
    fn statements_for_memory_and_file() {
        let p = Pragmas::default();
        let mem = p.statements(true, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(mem[0], "PRAGMA journal_mode = DELETE");
        assert!(mem.iter().all(|s| !s.contains("busy_timeout")));

        let file = p.statements(false, 1234);
        assert_eq!(file[0], "PRAGMA journal_mode = WAL");
        assert!(file.contains(&"PRAGMA busy_timeout = 1234".to_string()));
        assert!(file.contains(&"PRAGMA foreign_keys = ON".to_string()));
    }
}
