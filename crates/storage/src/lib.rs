use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use heating::{
    catalog::{duplicate_marker, duplicate_name, name_key},
    seed_programs,
    validator::check_definition,
    HeatingError, ProgramCatalog,
};
use shared::domain::HeatingProgramDefinition;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};

const SELECT_COLUMNS: &str =
    "name, food, time_in_seconds, power, heating_char, instructions, is_predefined";

/// SQLite-backed program catalog.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    DuplicateName,
    DuplicateMarker,
}

impl Storage {
    /// Opens (creating if needed) the database, applies migrations and makes
    /// sure the predefined programs are present.
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let storage = Self { pool };
        storage.seed_predefined_programs().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    async fn seed_predefined_programs(&self) -> Result<()> {
        let mut seeded = 0;
        for program in seed_programs() {
            let result = sqlx::query(
                "INSERT INTO heating_programs
                 (name, name_key, food, time_in_seconds, power, heating_char, instructions, is_predefined)
                 VALUES (?, ?, ?, ?, ?, ?, ?, 1)
                 ON CONFLICT DO NOTHING",
            )
            .bind(&program.name)
            .bind(name_key(&program.name))
            .bind(&program.food)
            .bind(i64::from(program.time_in_seconds))
            .bind(i64::from(program.power))
            .bind(program.heating_char.to_string())
            .bind(&program.instructions)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to seed program '{}'", program.name))?;
            seeded += result.rows_affected();
        }

        if seeded > 0 {
            info!(seeded, "predefined heating programs seeded");
        } else {
            debug!("predefined heating programs already present");
        }
        Ok(())
    }

    pub async fn list_programs(&self) -> Result<Vec<HeatingProgramDefinition>> {
        let rows = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM heating_programs ORDER BY name_key"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(program_from_row).collect()
    }

    /// Case-insensitive for any script; matches on the stored `name_key`.
    pub async fn find_program_by_name(&self, name: &str) -> Result<Option<HeatingProgramDefinition>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM heating_programs WHERE name_key = ?"
        ))
        .bind(name_key(name))
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(program_from_row).transpose()
    }

    pub async fn heating_char_exists(&self, heating_char: char) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM heating_programs WHERE heating_char = ?")
                .bind(heating_char.to_string())
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Inserts inside one transaction so a duplicate never leaves a row
    /// behind.
    pub async fn insert_program(&self, program: &HeatingProgramDefinition) -> Result<InsertOutcome> {
        let key = name_key(&program.name);
        let mut tx = self.pool.begin().await?;

        let name_taken: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM heating_programs WHERE name_key = ?")
                .bind(&key)
                .fetch_one(&mut *tx)
                .await?;
        if name_taken > 0 {
            return Ok(InsertOutcome::DuplicateName);
        }

        let marker_taken: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM heating_programs WHERE heating_char = ?")
                .bind(program.heating_char.to_string())
                .fetch_one(&mut *tx)
                .await?;
        if marker_taken > 0 {
            return Ok(InsertOutcome::DuplicateMarker);
        }

        let inserted = sqlx::query(
            "INSERT INTO heating_programs
             (name, name_key, food, time_in_seconds, power, heating_char, instructions, is_predefined)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&program.name)
        .bind(&key)
        .bind(&program.food)
        .bind(i64::from(program.time_in_seconds))
        .bind(i64::from(program.power))
        .bind(program.heating_char.to_string())
        .bind(&program.instructions)
        .bind(program.is_predefined)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Ok(if db.message().contains("heating_programs.name_key") {
                    InsertOutcome::DuplicateName
                } else {
                    InsertOutcome::DuplicateMarker
                });
            }
            Err(error) => return Err(error.into()),
        }

        tx.commit().await?;
        Ok(InsertOutcome::Inserted)
    }
}

fn program_from_row(row: &SqliteRow) -> Result<HeatingProgramDefinition> {
    let name: String = row.try_get("name")?;
    let heating_char: String = row.try_get("heating_char")?;
    let heating_char = heating_char
        .chars()
        .next()
        .ok_or_else(|| anyhow!("program '{name}' has an empty heating character"))?;
    let time_in_seconds = u32::try_from(row.try_get::<i64, _>("time_in_seconds")?)
        .with_context(|| format!("program '{name}' has an invalid time"))?;
    let power = u8::try_from(row.try_get::<i64, _>("power")?)
        .with_context(|| format!("program '{name}' has an invalid power"))?;

    Ok(HeatingProgramDefinition {
        food: row.try_get("food")?,
        time_in_seconds,
        power,
        heating_char,
        instructions: row.try_get("instructions")?,
        is_predefined: row.try_get("is_predefined")?,
        name,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[async_trait]
impl ProgramCatalog for Storage {
    async fn list_all(&self) -> Result<Vec<HeatingProgramDefinition>, HeatingError> {
        self.list_programs().await.map_err(HeatingError::Store)
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<HeatingProgramDefinition>, HeatingError> {
        self.find_program_by_name(name)
            .await
            .map_err(HeatingError::Store)
    }

    async fn marker_in_use(&self, marker: char) -> Result<bool, HeatingError> {
        self.heating_char_exists(marker)
            .await
            .map_err(HeatingError::Store)
    }

    async fn insert(&self, program: HeatingProgramDefinition) -> Result<(), HeatingError> {
        check_definition(&program)?;
        match self
            .insert_program(&program)
            .await
            .map_err(HeatingError::Store)?
        {
            InsertOutcome::Inserted => Ok(()),
            InsertOutcome::DuplicateName => Err(duplicate_name(&program.name)),
            InsertOutcome::DuplicateMarker => Err(duplicate_marker(program.heating_char)),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
