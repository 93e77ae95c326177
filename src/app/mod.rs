//! 应用层：把 kernel、运行时与文件监听接到一个事件循环上

pub mod workbench;

pub use workbench::{Workbench, WorkbenchError};
