// Integration tests for the app.clipboard channel over the in-memory clipboard
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use clipboard_bridge::channel::{MethodCall, MethodChannel, MethodPayload, MethodResult};
use clipboard_bridge::clipboard_image::{
    build_dib, BitmapFormat, ClipboardImageService, DecodedImage, MemoryClipboard,
};
use clipboard_bridge::config::{BridgeConfig, ExportFormat};
use serde_json::json;

fn unique_test_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("clipboard_bridge_it_{name}_{nanos}"));
    fs::create_dir_all(&dir).expect("create test dir");
    dir
}

fn fixed_tick() -> u64 {
    1_000
}

fn setup(dir: &Path) -> (Arc<MemoryClipboard>, MethodChannel) {
    let clipboard = Arc::new(MemoryClipboard::new());
    let config = BridgeConfig {
        temp_dir: Some(dir.to_path_buf()),
        ..BridgeConfig::default()
    };
    let service = ClipboardImageService::new(Arc::clone(&clipboard), config).with_tick_source(fixed_tick);

    let mut channel = MethodChannel::new("app.clipboard");
    channel.set_method_call_handler(service);
    (clipboard, channel)
}

fn write_solid_png(path: &Path, rgba: [u8; 4], width: u32, height: u32) {
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
        .save_with_format(path, image::ImageFormat::Png)
        .expect("write source png");
}

fn paths_of(result: MethodResult) -> Vec<String> {
    match result {
        MethodResult::Success { payload: MethodPayload::Paths(paths) } => paths,
        other => panic!("expected path list, got {other:?}"),
    }
}

#[test]
fn import_then_export_preserves_solid_color() {
    let dir = unique_test_dir("roundtrip");
    let (clipboard, channel) = setup(&dir);
    let source = dir.join("source.png");
    write_solid_png(&source, [30, 144, 255, 255], 7, 5);

    let set = channel.invoke(&MethodCall::new("setClipboardImage", Some(json!(source.to_string_lossy()))));
    assert_eq!(set, MethodResult::flag(true));
    assert_eq!(clipboard.bitmap().map(|(format, _)| format), Some(BitmapFormat::Dib));

    let paths = paths_of(channel.invoke(&MethodCall::new("getClipboardImages", None)));
    assert_eq!(paths.len(), 1);
    let exported = Path::new(&paths[0]);
    assert_eq!(exported.file_name().and_then(|n| n.to_str()), Some("pasted_1000.png"));
    assert_eq!(exported.parent(), Some(dir.as_path()));

    let decoded = image::open(exported).expect("open exported png").into_rgba8();
    assert_eq!(decoded.dimensions(), (7, 5));
    for pixel in decoded.pixels() {
        assert_eq!(pixel.0, [30, 144, 255, 255]);
    }

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn import_then_export_preserves_translucent_color() {
    let dir = unique_test_dir("translucent");
    let (_clipboard, channel) = setup(&dir);
    let source = dir.join("source.png");
    write_solid_png(&source, [30, 144, 255, 128], 3, 3);

    let set = channel.invoke(&MethodCall::new("setClipboardImage", Some(json!(source.to_string_lossy()))));
    assert_eq!(set, MethodResult::flag(true));

    let paths = paths_of(channel.invoke(&MethodCall::new("getClipboardImages", None)));
    assert_eq!(paths.len(), 1);
    let decoded = image::open(&paths[0]).expect("open exported png").into_rgba8();
    assert_eq!(decoded.dimensions(), (3, 3));
    for pixel in decoded.pixels() {
        assert_eq!(pixel.0, [30, 144, 255, 128]);
    }

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn mapping_argument_with_path_key_is_accepted() {
    let dir = unique_test_dir("mapping");
    let (clipboard, channel) = setup(&dir);
    let source = dir.join("source.png");
    write_solid_png(&source, [0, 0, 0, 255], 2, 2);

    let set = channel.invoke(&MethodCall::new(
        "setClipboardImage",
        Some(json!({ "path": source.to_string_lossy() })),
    ));
    assert_eq!(set, MethodResult::flag(true));
    assert!(clipboard.bitmap().is_some());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn failed_import_keeps_prior_bitmap() {
    let dir = unique_test_dir("sentinel");
    let (clipboard, channel) = setup(&dir);
    let sentinel = build_dib(&DecodedImage::solid(1, 1, [1, 2, 3, 255])).expect("sentinel dib");
    clipboard.put_bitmap(BitmapFormat::Dib, sentinel.clone());

    let garbage = dir.join("garbage.png");
    fs::write(&garbage, b"not an image").expect("write garbage");

    let arguments = [
        None,
        Some(json!({ "file": "/tmp/x.png" })),
        Some(json!(42)),
        Some(json!("")),
        Some(json!(dir.join("missing.png").to_string_lossy())),
        Some(json!(garbage.to_string_lossy())),
    ];
    for argument in arguments {
        let result = channel.invoke(&MethodCall::new("setClipboardImage", argument.clone()));
        assert_eq!(result, MethodResult::flag(false), "argument: {argument:?}");
        assert_eq!(clipboard.bitmap(), Some((BitmapFormat::Dib, sentinel.clone())));
    }

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn rejected_clipboard_write_reports_false() {
    let dir = unique_test_dir("rejected");
    let (clipboard, channel) = setup(&dir);
    let source = dir.join("source.png");
    write_solid_png(&source, [9, 9, 9, 255], 1, 1);
    clipboard.set_reject_writes(true);

    let result = channel.invoke(&MethodCall::new("setClipboardImage", Some(json!(source.to_string_lossy()))));
    assert_eq!(result, MethodResult::flag(false));
    // 清空已发生而写入失败时，剪贴板保持为空
    assert_eq!(clipboard.bitmap(), None);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn file_drop_list_keeps_order_and_count() {
    let dir = unique_test_dir("files");
    let (clipboard, channel) = setup(&dir);

    assert!(paths_of(channel.invoke(&MethodCall::new("getClipboardFiles", None))).is_empty());

    let files = vec![
        "C:\\Users\\me\\b.txt".to_string(),
        "C:\\Users\\me\\a.txt".to_string(),
        "D:\\照片\\猫.png".to_string(),
    ];
    clipboard.put_files(files.clone());
    assert_eq!(paths_of(channel.invoke(&MethodCall::new("getClipboardFiles", None))), files);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn busy_clipboard_degrades_to_empty_results() {
    let dir = unique_test_dir("busy");
    let (clipboard, channel) = setup(&dir);
    clipboard.put_files(vec!["C:\\a.txt".into()]);
    clipboard.set_busy(true);

    assert!(paths_of(channel.invoke(&MethodCall::new("getClipboardFiles", None))).is_empty());
    assert!(paths_of(channel.invoke(&MethodCall::new("getClipboardImages", None))).is_empty());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn unknown_method_is_not_implemented() {
    let dir = unique_test_dir("unknown");
    let (_clipboard, channel) = setup(&dir);

    let result = channel.invoke(&MethodCall::new("getClipboardVideo", None));
    assert_eq!(result, MethodResult::NotImplemented);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn exports_within_same_tick_get_distinct_files() {
    let dir = unique_test_dir("same_tick");
    let (clipboard, channel) = setup(&dir);
    let dib = build_dib(&DecodedImage::solid(3, 3, [0, 255, 0, 255])).expect("dib");
    clipboard.put_bitmap(BitmapFormat::DibV5, dib);

    let first = paths_of(channel.invoke(&MethodCall::new("getClipboardImages", None)));
    let second = paths_of(channel.invoke(&MethodCall::new("getClipboardImages", None)));

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first[0], second[0]);
    assert!(second[0].ends_with("pasted_1000_1.png"));
    assert!(Path::new(&first[0]).exists());
    assert!(Path::new(&second[0]).exists());

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn bmp_export_format_uses_bmp_extension() {
    let dir = unique_test_dir("bmp");
    let clipboard = Arc::new(MemoryClipboard::new());
    let config = BridgeConfig {
        temp_dir: Some(dir.clone()),
        export_format: ExportFormat::Bmp,
        ..BridgeConfig::default()
    };
    let service = ClipboardImageService::new(Arc::clone(&clipboard), config).with_tick_source(fixed_tick);
    clipboard.put_bitmap(
        BitmapFormat::Dib,
        build_dib(&DecodedImage::solid(2, 2, [0, 0, 255, 255])).expect("dib"),
    );

    let paths = service.get_clipboard_images();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].ends_with("pasted_1000.bmp"));
    let decoded = image::open(&paths[0]).expect("open bmp").into_rgba8();
    assert_eq!(decoded.get_pixel(1, 1).0, [255, 0, 0, 255]);

    let _ = fs::remove_dir_all(dir);
}
