pub mod catalog;
pub mod extractor;
pub mod media;
pub mod pipeline;
pub mod scorer;
pub mod selector;
pub mod traits;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use catalog::{Catalog, InsertOutcome, VenuePatch};
pub use pipeline::{Collaborators, Curator, PipelineConfig, RunMode, RunStats};
