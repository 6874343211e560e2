use serde::Serialize;

use crate::schema::{relation_exists, RelationKind, ALL_TABLES};
use crate::store::Store;
use crate::types::Result;
use crate::views::ALL_VIEWS;

const MAX_FINDINGS: usize = 32;

/// Specifies the depth of verification checks to perform.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyLevel {
    /// Relations and foreign keys only.
    Fast,
    /// Also runs SQLite's page-level `integrity_check` and natural-key checks.
    Full,
}

/// Indicates the severity level of a verification finding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    /// Something is absent but nothing is inconsistent (e.g. views not built).
    Warning,
    /// Integrity failure.
    Error,
}

/// Represents a single issue discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// The severity level of this finding.
    pub severity: VerifySeverity,
    /// Human-readable description of the issue.
    pub message: String,
}

impl VerifyFinding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Warning,
            message: message.into(),
        }
    }
}

/// Complete report of a verification operation.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// The verification level that was performed.
    pub level: VerifyLevel,
    /// True when no error-level finding was recorded.
    pub success: bool,
    /// Issues discovered, capped at a fixed count.
    pub findings: Vec<VerifyFinding>,
}

/// Checks relations, referential integrity and, at [`VerifyLevel::Full`],
/// page integrity and natural-key uniqueness.
pub fn verify(store: &Store, level: VerifyLevel) -> Result<VerifyReport> {
    let conn = store.connect_read_only()?;
    let mut findings = Vec::new();

    for table in ALL_TABLES {
        if !relation_exists(&conn, RelationKind::Table, table.name)? {
            findings.push(VerifyFinding::error(format!("table '{}' is missing", table.name)));
        }
    }
    for view in ALL_VIEWS {
        if !relation_exists(&conn, RelationKind::View, view)? {
            findings.push(VerifyFinding::warning(format!("view '{view}' is missing")));
        }
    }

    let mut stmt = conn.prepare("SELECT `table`, rowid, parent FROM pragma_foreign_key_check")?;
    let violations = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<i64>>(1)?,
            row.get::<_, String>(2)?,
        ))
    })?;
    for violation in violations {
        let (table, rowid, parent) = violation?;
        findings.push(VerifyFinding::error(format!(
            "{table} row {} references a missing {parent} row",
            rowid.map_or_else(|| "?".to_string(), |id| id.to_string())
        )));
    }

    if matches!(level, VerifyLevel::Full) {
        let mut stmt = conn.prepare("PRAGMA integrity_check")?;
        let messages = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for message in messages {
            let message = message?;
            if message != "ok" {
                findings.push(VerifyFinding::error(format!("integrity: {message}")));
            }
        }
        for table in ALL_TABLES {
            let Some(key) = table.natural_key else {
                continue;
            };
            if !relation_exists(&conn, RelationKind::Table, table.name)? {
                continue;
            }
            let sql = format!(
                "SELECT {key}, COUNT(*) FROM {name} GROUP BY {key} HAVING COUNT(*) > 1",
                name = table.name
            );
            let mut stmt = conn.prepare(&sql)?;
            let dupes = stmt.query_map([], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?))
            })?;
            for dupe in dupes {
                let (code, count) = dupe?;
                findings.push(VerifyFinding::error(format!(
                    "{}.{key} '{}' appears {count} times",
                    table.name,
                    code.unwrap_or_default()
                )));
            }
        }
    }

    findings.truncate(MAX_FINDINGS);
    let success = findings
        .iter()
        .all(|f| f.severity != VerifySeverity::Error);
    Ok(VerifyReport {
        level,
        success,
        findings,
    })
}
