use async_trait::async_trait;
use shared::{domain::HeatingProgramDefinition, protocol::NewProgram};
use tokio::sync::RwLock;
use tracing::info;

use crate::{
    error::HeatingError,
    validator::{check_definition, validate_new_program},
};

/// Store of named heating programs.
///
/// Name lookups are case-insensitive. Implementations must reject a
/// duplicate name or marker on insert without writing anything.
#[async_trait]
pub trait ProgramCatalog: Send + Sync {
    async fn list_all(&self) -> Result<Vec<HeatingProgramDefinition>, HeatingError>;

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<HeatingProgramDefinition>, HeatingError>;

    async fn marker_in_use(&self, marker: char) -> Result<bool, HeatingError>;

    async fn insert(&self, program: HeatingProgramDefinition) -> Result<(), HeatingError>;
}

/// Validates a user submission and inserts it.
///
/// Uniqueness is checked up front to produce a precise message; the
/// catalog's own insert check still guards against a racing writer.
pub async fn register_program(
    catalog: &dyn ProgramCatalog,
    program: NewProgram,
) -> Result<HeatingProgramDefinition, HeatingError> {
    let definition = validate_new_program(&program)?;

    if catalog.find_by_name(&definition.name).await?.is_some() {
        return Err(duplicate_name(&definition.name));
    }
    if catalog.marker_in_use(definition.heating_char).await? {
        return Err(duplicate_marker(definition.heating_char));
    }

    catalog.insert(definition.clone()).await?;
    info!(
        name = %definition.name,
        marker = %definition.heating_char,
        time_in_seconds = definition.time_in_seconds,
        power = definition.power,
        "heating program registered"
    );
    Ok(definition)
}

/// Comparison form of a program name: trimmed and Unicode-lowercased.
/// Every catalog matches and deduplicates names on this key.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn duplicate_name(name: &str) -> HeatingError {
    HeatingError::validation(format!("A program named '{name}' already exists."))
}

pub fn duplicate_marker(marker: char) -> HeatingError {
    HeatingError::validation(format!(
        "The heating character '{marker}' is already used by another program."
    ))
}

/// The five programs every catalog starts with.
pub fn seed_programs() -> Vec<HeatingProgramDefinition> {
    vec![
        predefined(
            "Popcorn",
            "Popcorn (microwave bag)",
            3 * 60,
            7,
            'P',
            "Listen to the kernels popping. If more than 10 seconds pass between pops, stop the heating.",
        ),
        predefined(
            "Milk",
            "Milk",
            5 * 60,
            5,
            'M',
            "Take care when heating liquids: thermal shock combined with moving the container can cause sudden boiling and burns.",
        ),
        predefined(
            "Beef",
            "Beef, chunks or slices",
            14 * 60,
            4,
            'B',
            "Stop halfway through and turn the food over so it thaws evenly.",
        ),
        predefined(
            "Chicken",
            "Chicken (any cut)",
            8 * 60,
            7,
            'C',
            "Stop halfway through and turn the food over so it thaws evenly.",
        ),
        predefined(
            "Beans",
            "Frozen beans",
            8 * 60,
            9,
            '#',
            "Leave the container uncovered. Plastic containers can soften at high temperature, so handle them with care.",
        ),
    ]
}

fn predefined(
    name: &str,
    food: &str,
    time_in_seconds: u32,
    power: u8,
    heating_char: char,
    instructions: &str,
) -> HeatingProgramDefinition {
    HeatingProgramDefinition {
        name: name.to_string(),
        food: food.to_string(),
        time_in_seconds,
        power,
        heating_char,
        instructions: Some(instructions.to_string()),
        is_predefined: true,
    }
}

/// Process-local catalog, seeded on construction.
pub struct InMemoryCatalog {
    programs: RwLock<Vec<HeatingProgramDefinition>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::with_programs(seed_programs())
    }

    pub fn with_programs(programs: Vec<HeatingProgramDefinition>) -> Self {
        Self {
            programs: RwLock::new(programs),
        }
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgramCatalog for InMemoryCatalog {
    async fn list_all(&self) -> Result<Vec<HeatingProgramDefinition>, HeatingError> {
        let mut programs = self.programs.read().await.clone();
        programs.sort_by_key(|program| name_key(&program.name));
        Ok(programs)
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<HeatingProgramDefinition>, HeatingError> {
        let wanted = name_key(name);
        Ok(self
            .programs
            .read()
            .await
            .iter()
            .find(|program| name_key(&program.name) == wanted)
            .cloned())
    }

    async fn marker_in_use(&self, marker: char) -> Result<bool, HeatingError> {
        Ok(self
            .programs
            .read()
            .await
            .iter()
            .any(|program| program.heating_char == marker))
    }

    async fn insert(&self, program: HeatingProgramDefinition) -> Result<(), HeatingError> {
        check_definition(&program)?;

        let mut programs = self.programs.write().await;
        let key = name_key(&program.name);
        if programs.iter().any(|p| name_key(&p.name) == key) {
            return Err(duplicate_name(&program.name));
        }
        if programs.iter().any(|p| p.heating_char == program.heating_char) {
            return Err(duplicate_marker(program.heating_char));
        }
        programs.push(program);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
