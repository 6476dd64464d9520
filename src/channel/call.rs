//! 方法调用与参数解析。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 一次方法调用：方法名 + 可选参数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// 参数中的文件路径，见 [`extract_path`]。
    pub fn path_argument(&self) -> Option<&str> {
        extract_path(self.arguments.as_ref())
    }
}

/// 从参数中取出文件路径。
///
/// 接受两种形状：字符串本身，或含字符串 `path` 键的映射。
/// 其它形状、缺失或空字符串一律返回 `None`。
pub fn extract_path(argument: Option<&Value>) -> Option<&str> {
    let path = match argument? {
        Value::String(path) => path.as_str(),
        Value::Object(map) => map.get("path")?.as_str()?,
        _ => return None,
    };

    if path.is_empty() { None } else { Some(path) }
}
