pub mod image_probe;
pub mod import_service;
pub mod row_engine;
pub mod session;
pub mod session_store;

pub use image_probe::{ImageProbe, ProbeError, ProbeStatus};
pub use import_service::{ImportError, ImportService, ImportSource};
pub use row_engine::{RowEngine, SortDirection, SortState, TableView};
pub use session::{Session, SessionEvent};
pub use session_store::{SessionSnapshot, SessionStore};
