//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 对外的剪贴板方法本身不返回错误（失败降级为空结果），
//! `AppError` 只服务于"外壳"层：配置加载、通道传输、窗口创建。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `ImageError` / `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，便于写回传输通道。

use serde::Serialize;

use crate::clipboard_image::ImageError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片处理链路错误
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件不可用或取值非法
    #[error("配置错误: {0}")]
    Config(String),

    /// 方法通道传输 / 请求格式错误
    #[error("通道错误: {0}")]
    Channel(String),

    /// 窗口或嵌入引擎初始化失败
    #[error("窗口操作失败: {0}")]
    Window(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
