pub mod artifact;
pub mod dataset;
pub mod store;

pub use artifact::{load_bundle, save_bundle, ArtifactInfo, FORMAT_VERSION};
pub use dataset::{load_records, read_records};
pub use store::ModelStore;
