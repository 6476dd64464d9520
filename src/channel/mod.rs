//! # 方法通道模块
//!
//! ## 设计思路
//!
//! 嵌入应用与宿主之间的 RPC 只有"方法名 + 参数 → 单个回复"这一种形状。
//! 本模块把它抽象成与具体传输无关的几个类型：
//!
//! - `call`：`MethodCall` 与参数解析（路径字符串 / 带 `path` 键的映射）
//! - `result`：`MethodResult`（Success / Error / NotImplemented）
//! - `dispatcher`：`MethodChannel` 持有已注册的处理器，保证每次调用恰好回复一次
//! - `transport`：按行 JSON 的标准输入输出传输，供独立进程宿主使用

mod call;
mod dispatcher;
mod result;
pub mod transport;

pub use call::{extract_path, MethodCall};
pub use dispatcher::{MethodCallHandler, MethodChannel};
pub use result::{MethodPayload, MethodResult};
