//! # 导出文件模块
//!
//! ## 设计思路
//!
//! 每次导出在临时目录创建一个全新文件 `<prefix><tick>.<ext>`，路径交给调用方，
//! 之后文件归嵌入应用所有，本服务从不删除已成功写出的文件。
//!
//! ## 实现思路
//!
//! - 以 `create_new` 独占创建，同一 tick 内的重复导出改用 `<prefix><tick>_<n>.<ext>`，
//!   不会覆盖已有文件。
//! - 写入是一个事务：编码或刷盘任一步失败都会删除半成品文件，视为"未产出"。

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use super::decoded::DecodedImage;
use super::ImageError;
use crate::config::ExportFormat;

/// 导出得到的临时图片文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileImageHandle {
    path: PathBuf,
}

impl FileImageHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 以 UTF-8 字符串形式交出路径。
    pub fn into_utf8(self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

/// 第 `attempt` 个候选文件名；`attempt == 0` 时不带后缀。
pub fn candidate_name(prefix: &str, tick: u64, attempt: u32, extension: &str) -> String {
    if attempt == 0 {
        format!("{prefix}{tick}.{extension}")
    } else {
        format!("{prefix}{tick}_{attempt}.{extension}")
    }
}

/// 独占创建导出文件，遇到同名文件时顺延后缀。
fn create_unique(
    dir: &Path,
    prefix: &str,
    tick: u64,
    extension: &str,
    max_attempts: u32,
) -> Result<(PathBuf, File), ImageError> {
    for attempt in 0..max_attempts {
        let path = dir.join(candidate_name(prefix, tick, attempt, extension));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                log::debug!("导出文件名已存在，顺延：{}", path.display());
            }
            Err(e) => {
                return Err(ImageError::FileSystem(format!(
                    "创建导出文件 '{}' 失败：{}",
                    path.display(),
                    e
                )));
            }
        }
    }

    Err(ImageError::FileSystem(format!(
        "tick {} 下 {} 个候选文件名均已存在",
        tick, max_attempts
    )))
}

/// 将图像写入新的导出文件。
pub(crate) fn write_image_file(
    image: &DecodedImage,
    format: ExportFormat,
    dir: &Path,
    prefix: &str,
    tick: u64,
    max_attempts: u32,
) -> Result<FileImageHandle, ImageError> {
    let (path, file) = create_unique(dir, prefix, tick, format.extension(), max_attempts)?;

    if let Err(err) = image.encode(format, BufWriter::new(file)) {
        if let Err(remove_err) = fs::remove_file(&path) {
            log::warn!("清理未完成的导出文件失败：{}（{}）", path.display(), remove_err);
        }
        return Err(err);
    }

    Ok(FileImageHandle { path })
}

/// 单调毫秒计数，用于生成导出文件名。
pub fn system_tick_count() -> u64 {
    #[cfg(target_os = "windows")]
    {
        super::win32::tick_count()
    }

    #[cfg(not(target_os = "windows"))]
    {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_test_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("clipboard_bridge_export_{name}_{nanos}"));
        fs::create_dir_all(&dir).expect("create test dir");
        dir
    }

    #[test]
    fn candidate_names_follow_pattern() {
        assert_eq!(candidate_name("pasted_", 1234, 0, "png"), "pasted_1234.png");
        assert_eq!(candidate_name("pasted_", 1234, 2, "bmp"), "pasted_1234_2.bmp");
    }

    #[test]
    fn same_tick_exports_do_not_overwrite() {
        let dir = unique_test_dir("collide");
        let image = DecodedImage::solid(2, 2, [1, 2, 3, 255]);

        let first = write_image_file(&image, ExportFormat::Png, &dir, "pasted_", 7, 4).expect("first");
        let second = write_image_file(&image, ExportFormat::Png, &dir, "pasted_", 7, 4).expect("second");

        assert_eq!(first.path().file_name().and_then(|n| n.to_str()), Some("pasted_7.png"));
        assert_eq!(second.path().file_name().and_then(|n| n.to_str()), Some("pasted_7_1.png"));
        assert!(first.path().exists() && second.path().exists());

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn exhausted_names_fail_without_touching_existing_files() {
        let dir = unique_test_dir("exhausted");
        fs::write(dir.join("pasted_9.png"), b"keep").expect("seed");
        let image = DecodedImage::solid(1, 1, [0, 0, 0, 255]);

        let err = write_image_file(&image, ExportFormat::Png, &dir, "pasted_", 9, 1).unwrap_err();
        assert_eq!(err.code(), "file_system");
        assert_eq!(fs::read(dir.join("pasted_9.png")).expect("read"), b"keep");

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_directory_is_file_system_error() {
        let image = DecodedImage::solid(1, 1, [0, 0, 0, 255]);
        let err = write_image_file(
            &image,
            ExportFormat::Png,
            Path::new("/no/such/dir/for/clipboard/bridge"),
            "pasted_",
            1,
            1,
        )
        .unwrap_err();
        assert_eq!(err.code(), "file_system");
    }
}
