pub mod config;
pub mod corrector;
pub mod diagnostics;
pub mod error;
pub mod geo;
pub mod matcher;
pub mod model;
pub mod pipeline;
pub mod power;
pub mod registry;
pub mod spatial;
pub mod table;

pub use config::AssociationConfig;
pub use error::{AssociationError, AssociationResult};
pub use model::{AssociationRecord, InputTables};
pub use pipeline::{AssociationPipeline, PipelineOutput};

#[cfg(test)]
mod tests;
