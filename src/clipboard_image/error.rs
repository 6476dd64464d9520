//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 剪贴板图片链路中的所有失败来源统一收敛到 `ImageError`。
//! 对外的三个方法不会把它透传给调用方（失败降级为空列表 / `false`），
//! 但内部流程全部以 `Result<_, ImageError>` + `?` 编排，日志里带上稳定的 `code()`。

/// 剪贴板图片处理统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 剪贴板被其他进程占用，无法打开
    #[error("剪贴板忙：{0}")]
    ClipboardBusy(String),

    /// 格式已登记，但取不到对应的剪贴板数据
    #[error("剪贴板数据不可用：{0}")]
    FormatUnavailable(String),

    #[error("位图数据无效：{0}")]
    InvalidBitmap(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("编码错误：{0}")]
    Encode(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("不支持：{0}")]
    Unsupported(String),
}

impl ImageError {
    /// 稳定的错误码，用于日志检索。
    pub fn code(&self) -> &'static str {
        match self {
            Self::ClipboardBusy(_) => "clipboard_busy",
            Self::FormatUnavailable(_) => "format_unavailable",
            Self::InvalidBitmap(_) => "invalid_bitmap",
            Self::Decode(_) => "decode_failed",
            Self::Encode(_) => "encode_failed",
            Self::FileSystem(_) => "file_system",
            Self::ResourceLimit(_) => "resource_limit",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl From<std::io::Error> for ImageError {
    fn from(error: std::io::Error) -> Self {
        Self::FileSystem(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::ImageError;

    #[test]
    fn codes_are_stable_snake_case() {
        assert_eq!(ImageError::ClipboardBusy("x".into()).code(), "clipboard_busy");
        assert_eq!(ImageError::FormatUnavailable("CF_HDROP".into()).code(), "format_unavailable");
        assert_eq!(ImageError::ResourceLimit("x".into()).code(), "resource_limit");
    }

    #[test]
    fn io_errors_map_to_file_system() {
        let err: ImageError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.code(), "file_system");
        assert!(err.to_string().contains("gone"));
    }
}
