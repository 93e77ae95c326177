//! Service ports: traits + data contracts.

pub mod codec;
pub mod file;
pub mod navigator;
pub mod notify;
pub mod runtime;
pub mod settings;
pub mod store;

pub use codec::{CodecError, DocumentCodec, DocumentState};
pub use file::{DirEntry, FileContent, FileError, FileSystem, Result as FileResult};
pub use navigator::{NavigationError, Navigator};
pub use notify::{FileClosedListener, Notice, NoticeLevel, Notifier};
pub use runtime::{AsyncExecutor, BoxFuture};
pub use settings::Settings;
pub use store::{
    EditorRecord, EditorStateUpdate, EditorUpsert, FileRecord, FileUpsert, PaneItem, PaneRecord,
    SerializedSelection, Store, StoreError, StoreResult, WorkspaceRecord,
};
