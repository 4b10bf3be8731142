// AssetStore - Church asset inventory over a JSONL+SQLite store

pub mod config;
pub mod controller;
pub mod currency;
pub mod filter;
pub mod jsonl;
pub mod models;
pub mod page;
pub mod qr;
pub mod record;
pub mod repository;
pub mod selection;
pub mod session;
pub mod stats;
pub mod store;
pub mod toast;
pub mod users;

// Re-export main types for convenience
pub use config::Config;
pub use controller::{AssetListController, ControllerError, FormMode, ListView};
pub use filter::FilterState;
pub use models::{AssetInput, AssetLocation, AssetRecord, AssetStatus, Role, UserProfile, ValidationErrors, now_ms};
pub use page::{Page, PageButton};
pub use qr::{Label, QrOptions, ScannableCode};
pub use record::{IndexFilter, Record};
pub use repository::AssetRepository;
pub use selection::SelectionSet;
pub use session::{Forbidden, Session};
pub use stats::{StatCard, Stats};
pub use store::Store;
pub use users::{InviteRequest, UserDirectory, UserError};
