//! 方法调用结果。

use serde::Serialize;

/// 成功结果的负载。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MethodPayload {
    /// 文件路径列表（UTF-8）。
    Paths(Vec<String>),
    /// 成功标志。
    Flag(bool),
}

/// 方法调用的唯一回复。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResult {
    Success { payload: MethodPayload },
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodResult {
    pub fn paths(paths: Vec<String>) -> Self {
        Self::Success {
            payload: MethodPayload::Paths(paths),
        }
    }

    pub fn flag(value: bool) -> Self {
        Self::Success {
            payload: MethodPayload::Flag(value),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
