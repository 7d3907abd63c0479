pub mod ai;
pub mod clipboard;
pub mod config;
pub mod credentials;
pub mod editor;
pub mod export;
pub mod grouping;
pub mod image;
pub mod models;
pub mod session;
pub mod store;

// Re-export commonly used types
pub use ai::{AiError, AnalysisJob, Analyzer, GeminiClient, MockVisionClient, VisionClient};
pub use clipboard::{Clipboard, ClipboardError, LazyClipboard, MemoryClipboard, SystemClipboard};
pub use config::{get_config_dir, get_config_path, AppConfig};
pub use credentials::{
    mask_key, resolve_api_key_from_env, ApiKey, CredentialError, FileKeyValueStore, KeySource,
    KeyValueStore, MemoryKeyValueStore,
};
pub use editor::{DropOutcome, TableAction, TableEditor, TableEvent, TitleCommit};
pub use export::{export_region_csv, to_csv, to_tsv, CsvExport};
pub use grouping::{group_by_region, RegionGroup, RegionSnapshot, RegionViewCache};
pub use image::{ImageError, ImageFormat, ImagePayload, DEFAULT_MAX_IMAGE_BYTES};
pub use models::{ItemField, RequirementItem, UNNAMED_REGION};
pub use session::{BeginError, Completion, Notice, Session, Severity};
pub use store::{ItemStore, StoreError};
