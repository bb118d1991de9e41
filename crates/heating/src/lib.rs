//! Heating-session state machine for the microwave controller.
//!
//! [`HeatingController`] owns the single live [`HeatingSession`] behind one
//! async mutex and consults a [`ProgramCatalog`] for named programs. Nothing
//! in this crate performs I/O of its own; the server drives
//! [`HeatingController::advance_one_second`] from its ticker and pushes the
//! returned snapshots to observers.

pub mod catalog;
pub mod controller;
pub mod error;
pub mod session;
pub mod validator;

pub use catalog::{register_program, seed_programs, InMemoryCatalog, ProgramCatalog};
pub use controller::{Applied, ControllerPolicy, HeatingController, ManualStart, PredefinedStart};
pub use error::HeatingError;
pub use session::{format_display_time, HeatingSession};
pub use validator::{validate_heating_input, validate_new_program, ValidatedInput};
