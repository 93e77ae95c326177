//! docket - 文件生命周期内核
//!
//! 模块结构：
//! - kernel: 状态机（文件生命周期、窗格命令）、reducer、服务端口与适配器
//! - models: 数据模型（FileTree, Cid, Etag, 记录 id）
//! - app: 应用层（Workbench 事件循环）

pub mod app;
pub mod kernel;
pub mod models;
