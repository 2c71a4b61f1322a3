//! Domain models for Leafling

pub mod plant;
pub mod session;

pub use plant::{PlantDetails, PlantRecord, ScientificDetails, StoredPlantSummary};
pub use session::{AddPlantSession, PhaseTransition, SessionError, SessionPhase};
