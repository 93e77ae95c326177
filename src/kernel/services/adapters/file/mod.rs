//! 本地文件系统适配器

pub mod local;

pub use local::LocalFileSystem;
