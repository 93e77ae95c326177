use crate::kernel::file::FileEffect;
use crate::kernel::pane::PaneEffect;
use crate::kernel::route::Route;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    File(FileEffect),
    Pane(PaneEffect),
    LoadDir(PathBuf),
    Navigate(Route),
    /// The file is gone from disk; drop its store record.
    ForgetFile(PathBuf),
}
