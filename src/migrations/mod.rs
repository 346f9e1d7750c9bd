//! Schema migrations for the metrics table.
//!
//! Migrations are plain data: each one renders the SQL statements to apply
//! (or revert) for a given dialect, and the host's migration runner executes
//! them in version order. The MongoDB store applies the same index list
//! from [`schema`] when it connects.

pub mod schema;

use std::fmt;
use std::str::FromStr;

use schema::{IndexSpec, METRICS_TABLE, SECONDARY_INDEXES, UNIQUE_RESOURCE_METRIC};

/// SQL dialects a migration can be rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            other => Err(format!(
                "unknown SQL dialect '{}'. Valid values: postgres, mysql, sqlite",
                other
            )),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::Postgres => "postgres",
            Dialect::MySql => "mysql",
            Dialect::Sqlite => "sqlite",
        };
        f.write_str(name)
    }
}

/// A single reversible migration.
#[derive(Clone, Copy)]
pub struct Migration {
    pub version: &'static str,
    pub name: &'static str,
    up: fn(Dialect) -> Vec<String>,
    down: fn(Dialect) -> Vec<String>,
}

impl Migration {
    pub fn up(&self, dialect: Dialect) -> Vec<String> {
        (self.up)(dialect)
    }

    pub fn down(&self, dialect: Dialect) -> Vec<String> {
        (self.down)(dialect)
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish()
    }
}

/// An ordered set of migrations owned by one plugin.
#[derive(Debug, Clone)]
pub struct MigrationSource {
    pub name: String,
    pub migrations: Vec<Migration>,
}

/// The migrations of the metrics resource.
pub fn metrics_migrations() -> MigrationSource {
    MigrationSource {
        name: "resource-metrics".to_string(),
        migrations: vec![Migration {
            version: "20260207000003000",
            name: "create_metrics_table",
            up: create_metrics_table,
            down: drop_metrics_table,
        }],
    }
}

fn quote(dialect: Dialect, column: &str) -> String {
    match (dialect, column) {
        (Dialect::MySql, "key") => "`key`".to_string(),
        _ => column.to_string(),
    }
}

fn column_list(dialect: Dialect, index: &IndexSpec) -> String {
    index
        .columns
        .iter()
        .map(|c| quote(dialect, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn create_metrics_table(dialect: Dialect) -> Vec<String> {
    let unique = &UNIQUE_RESOURCE_METRIC;
    match dialect {
        Dialect::Postgres => {
            let mut statements = vec![format!(
                "CREATE TABLE IF NOT EXISTS {table} (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    resource TEXT NOT NULL,
    resource_id UUID NOT NULL,
    key VARCHAR(255) NOT NULL,
    value BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMP(0) WITH TIME ZONE NOT NULL DEFAULT CURRENT_TIMESTAMP,
    CONSTRAINT {unique_name} UNIQUE ({unique_columns})
)",
                table = METRICS_TABLE,
                unique_name = unique.name,
                unique_columns = column_list(dialect, unique),
            )];
            statements.extend(create_indexes(dialect));
            statements
        }
        Dialect::MySql => {
            let indexes = SECONDARY_INDEXES
                .iter()
                .map(|i| format!("    INDEX {} ({})", i.name, column_list(dialect, i)))
                .collect::<Vec<_>>()
                .join(",\n");
            vec![format!(
                "CREATE TABLE IF NOT EXISTS {table} (
    id CHAR(36) PRIMARY KEY,
    resource VARCHAR(255) NOT NULL,
    resource_id CHAR(36) NOT NULL,
    `key` VARCHAR(255) NOT NULL,
    value BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE KEY {unique_name} ({unique_columns}),
{indexes}
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_unicode_ci",
                table = METRICS_TABLE,
                unique_name = unique.name,
                unique_columns = column_list(dialect, unique),
            )]
        }
        Dialect::Sqlite => {
            let mut statements = vec![format!(
                "CREATE TABLE IF NOT EXISTS {table} (
    id TEXT PRIMARY KEY,
    resource TEXT NOT NULL,
    resource_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    CONSTRAINT {unique_name} UNIQUE ({unique_columns})
)",
                table = METRICS_TABLE,
                unique_name = unique.name,
                unique_columns = column_list(dialect, unique),
            )];
            statements.extend(create_indexes(dialect));
            statements
        }
    }
}

fn create_indexes(dialect: Dialect) -> Vec<String> {
    SECONDARY_INDEXES
        .iter()
        .map(|i| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                i.name,
                METRICS_TABLE,
                column_list(dialect, i)
            )
        })
        .collect()
}

fn drop_metrics_table(dialect: Dialect) -> Vec<String> {
    let mut statements = Vec::new();
    // MySQL drops the indexes along with the table.
    if dialect != Dialect::MySql {
        statements.extend(
            SECONDARY_INDEXES
                .iter()
                .map(|i| format!("DROP INDEX IF EXISTS {}", i.name)),
        );
    }
    statements.push(format!("DROP TABLE IF EXISTS {}", METRICS_TABLE));
    statements
}
