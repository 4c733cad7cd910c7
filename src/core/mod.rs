pub mod catalog;
pub mod error;
pub mod history;
pub mod metadata;
pub mod notifications;
pub mod operations;
pub mod preview;
pub mod search;
pub mod timer;
pub mod transfer;
pub mod tree;

pub use catalog::{CatalogConfig, CatalogEngine, CatalogView, FilterMode, SortMode};
pub use error::{CoreError, CoreResult};
pub use history::NavigationHistory;
pub use metadata::{EntryKind, EntryMetadata, Field};
pub use notifications::{
    NotificationEvent, NotificationScheduler, NotificationSettings, Phase, Severity,
};
pub use preview::{ItemInfo, Preview, PreviewLimits};
pub use search::{SearchEngine, SearchMatch};
pub use timer::{ManualTimer, TimerFired, TimerService, TokioTimer};
pub use transfer::{ClipboardItem, PastePlan, TransferEngine, TransferMode};
pub use tree::{TreeGenerator, TreeMode};
