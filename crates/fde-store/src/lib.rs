pub mod error;
pub mod location;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use location::{DATA_DIR_ENV, DB_FILE_NAME, default_base_dir, open_default};
pub use store::{AnalysisRecord, Store};
