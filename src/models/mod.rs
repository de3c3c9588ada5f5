mod config;
mod profile;
mod state;
mod stored_file;
mod target;

pub use config::{NamePolicyKind, PlaceholderAsset, PlacementConfig};
pub use profile::{FitMode, ThumbnailProfile, parse_hex_color};
pub use state::AppState;
pub use stored_file::StoredFile;
pub use target::{HostRecord, Scenario, UploadTarget, stored_file_name};
