//! # 按行 JSON 传输
//!
//! 每行一个请求：`{"channel": "app.clipboard", "method": "...", "arguments": ...}`，
//! `channel` 可省略。每个非空请求行恰好写回一行 `MethodResult` JSON。
//! 无法解析或发往其他通道的请求回复 `Error`，不会中断服务循环。

use std::io::{BufRead, Write};

use serde::Deserialize;
use serde_json::Value;

use super::{MethodCall, MethodChannel, MethodResult};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct Request {
    #[serde(default)]
    channel: Option<String>,
    method: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// 解析一行请求。
pub fn decode_request(line: &str, expected_channel: &str) -> Result<MethodCall, AppError> {
    let request: Request = serde_json::from_str(line)
        .map_err(|e| AppError::Channel(format!("请求格式错误: {}", e)))?;

    if let Some(channel) = request.channel.as_deref() {
        if channel != expected_channel {
            return Err(AppError::Channel(format!("未知通道: {}", channel)));
        }
    }

    Ok(MethodCall::new(request.method, request.arguments))
}

/// 编码一条回复（不含换行）。
pub fn encode_reply(result: &MethodResult) -> Result<String, AppError> {
    serde_json::to_string(result).map_err(|e| AppError::Channel(format!("序列化回复失败: {}", e)))
}

/// 逐行读取请求并写回回复，直到输入结束；返回处理的请求数。
///
/// 按原始字节读行，非 UTF-8 的行同样回复 `bad_request`。
pub fn serve<R: BufRead, W: Write>(channel: &MethodChannel, mut reader: R, mut writer: W) -> Result<usize, AppError> {
    let mut handled = 0;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let result = match std::str::from_utf8(&buf) {
            Ok(text) => {
                let line = text.trim();
                if line.is_empty() {
                    continue;
                }
                match decode_request(line, channel.name()) {
                    Ok(call) => {
                        log::debug!("收到调用：{}", call.method);
                        channel.invoke(&call)
                    }
                    Err(err) => {
                        log::warn!("丢弃无效请求：{}", err);
                        MethodResult::error("bad_request", err.to_string())
                    }
                }
            }
            Err(err) => {
                log::warn!("丢弃非 UTF-8 请求：{}", err);
                MethodResult::error("bad_request", format!("请求不是有效的 UTF-8: {}", err))
            }
        };

        writeln!(writer, "{}", encode_reply(&result)?)?;
        writer.flush()?;
        handled += 1;
    }

    Ok(handled)
}
