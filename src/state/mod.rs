mod snapshot;
mod store;

pub use snapshot::{load_snapshot, watch_snapshot};
pub use store::{Action, AppState, BrowserConfig, ProfileDescription, Store};
