//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有"可调策略"集中到 `BridgeConfig`：通道名、导出目录与文件名、
//! 导出容器格式以及解码阶段的资源上限。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用配置，与原生外壳的固定行为一致。
//! - 所有字段 `#[serde(default)]`，配置文件只需写出要覆盖的项。
//! - `from_env` 从 `CLIPBOARD_BRIDGE_CONFIG` 指向的 JSON 文件加载，未设置时回退默认值。
//! - `validate` 拒绝会导致运行期异常的取值（空前缀、零上限等）。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 指向 JSON 配置文件的环境变量名。
pub const CONFIG_ENV_VAR: &str = "CLIPBOARD_BRIDGE_CONFIG";

/// 默认方法通道名。
pub const DEFAULT_CHANNEL_NAME: &str = "app.clipboard";

/// 剪贴板图片导出的容器格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Bmp,
}

impl ExportFormat {
    /// 导出文件扩展名（不含点）。
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Bmp => "bmp",
        }
    }
}

/// 剪贴板桥接服务配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// 方法通道名，嵌入应用按此名称发起调用。
    pub channel_name: String,
    /// 导出目录；为空时使用系统临时目录。
    pub temp_dir: Option<PathBuf>,
    /// 导出文件名前缀，完整文件名为 `<prefix><tick>.<ext>`。
    pub file_prefix: String,
    /// 导出容器格式。
    pub export_format: ExportFormat,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 32 位像素估算，字节）。
    pub max_decoded_bytes: u64,
    /// 文件名冲突时最多尝试的候选名数量。
    pub max_name_attempts: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            temp_dir: None,
            file_prefix: "pasted_".to_string(),
            export_format: ExportFormat::Png,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            max_name_attempts: 16,
        }
    }
}

impl BridgeConfig {
    /// 从 JSON 文件加载配置并校验。
    pub fn load_from_path(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("读取配置文件 '{}' 失败: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 按环境变量加载配置；变量未设置时返回默认配置。
    pub fn from_env() -> Result<Self, AppError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::load_from_path(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.channel_name.trim().is_empty() {
            return Err(AppError::Config("channel_name 不能为空".to_string()));
        }
        if self.file_prefix.is_empty() {
            return Err(AppError::Config("file_prefix 不能为空".to_string()));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(AppError::Config("file_prefix 不能包含路径分隔符".to_string()));
        }
        if self.max_decoded_pixels == 0 || self.max_decoded_bytes == 0 {
            return Err(AppError::Config("解码资源上限必须大于 0".to_string()));
        }
        if self.max_name_attempts == 0 {
            return Err(AppError::Config("max_name_attempts 必须大于 0".to_string()));
        }
        Ok(())
    }

    /// 实际使用的导出目录。
    pub fn export_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
