//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - Registry versions are contiguous starting at 1; a gap is a fatal
//!   configuration error surfaced before any step runs.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Either every pending step commits or the database is left untouched.

use crate::db::{DbError, DbResult};
use crate::model::task::now_epoch_ms;
use log::info;
use rusqlite::{Connection, Transaction};

/// One schema-version transition.
///
/// Steps are plain functions over the migration transaction so a step can
/// compute values at apply time (see `add_created_at`).
#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    description: &'static str,
    up: fn(&Transaction<'_>) -> DbResult<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_tasks_table",
        up: create_tasks_table,
    },
    Migration {
        version: 2,
        description: "add_created_at",
        up: add_created_at,
    },
    Migration {
        version: 3,
        description: "add_priority",
        up: add_priority,
    },
    Migration {
        version: 4,
        description: "add_due_date",
        up: add_due_date,
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - [`DbError::BrokenMigrationChain`] when the compiled registry skips a
///   version.
/// - [`DbError::UnsupportedSchemaVersion`] when the database was written by
///   a newer binary.
/// - [`DbError::Sqlite`] when a step fails; the transaction rolls back and
///   `user_version` keeps its pre-migration value.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    verify_registry(MIGRATIONS)?;

    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        (migration.up)(&tx)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} step={}",
            migration.version, migration.description
        );
    }
    tx.commit()?;

    Ok(())
}

fn verify_registry(migrations: &[Migration]) -> DbResult<()> {
    let mut expected = 1;
    for migration in migrations {
        if migration.version != expected {
            return Err(DbError::BrokenMigrationChain {
                expected,
                found: migration.version,
            });
        }
        expected += 1;
    }
    Ok(())
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// v1: base task table. `is_done` is stored as an integer 0/1 flag.
fn create_tasks_table(tx: &Transaction<'_>) -> DbResult<()> {
    tx.execute_batch(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            is_done INTEGER NOT NULL DEFAULT 0
        );",
    )?;
    Ok(())
}

/// v2: creation timestamps. Rows written before v2 predate creation
/// tracking and are stamped with the apply-time clock as a fixed default.
fn add_created_at(tx: &Transaction<'_>) -> DbResult<()> {
    let backfill = now_epoch_ms();
    tx.execute_batch(&format!(
        "ALTER TABLE tasks ADD COLUMN created_at INTEGER NOT NULL DEFAULT {backfill};"
    ))?;
    Ok(())
}

/// v3: priority classification, defaulting every pre-existing row to NORMAL.
fn add_priority(tx: &Transaction<'_>) -> DbResult<()> {
    tx.execute_batch("ALTER TABLE tasks ADD COLUMN priority TEXT NOT NULL DEFAULT 'NORMAL';")?;
    Ok(())
}

/// v4: optional due dates. Nullable on purpose: absence is NULL, never 0.
fn add_due_date(tx: &Transaction<'_>) -> DbResult<()> {
    tx.execute_batch("ALTER TABLE tasks ADD COLUMN due_date INTEGER;")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{latest_version, verify_registry, Migration, MIGRATIONS};
    use crate::db::{DbError, DbResult};
    use rusqlite::Transaction;

    fn noop(_tx: &Transaction<'_>) -> DbResult<()> {
        Ok(())
    }

    #[test]
    fn compiled_registry_is_contiguous_from_one() {
        verify_registry(MIGRATIONS).unwrap();
        assert_eq!(latest_version(), MIGRATIONS.len() as u32);
    }

    #[test]
    fn registry_with_a_gap_is_rejected() {
        let gapped = [
            Migration {
                version: 1,
                description: "first",
                up: noop,
            },
            Migration {
                version: 3,
                description: "skipped_second",
                up: noop,
            },
        ];

        match verify_registry(&gapped).unwrap_err() {
            DbError::BrokenMigrationChain { expected, found } => {
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn registry_must_start_at_version_one() {
        let offset = [Migration {
            version: 2,
            description: "late_start",
            up: noop,
        }];

        match verify_registry(&offset).unwrap_err() {
            DbError::BrokenMigrationChain { expected, found } => {
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
