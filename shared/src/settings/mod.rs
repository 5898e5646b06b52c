pub mod types;

pub use types::{PanelRect, Tab, UserSettings};
