//! 配置与日志集成测试
//!
//! 测试范围:
//! - 配置文件的加载与保存
//! - 配置项对编解码行为的影响
//! - 日志系统的初始化与关闭

mod common;

use std::io::Write;

use chcodec::core::codec::CodecError;
use chcodec::core::value::Value;
use chcodec::format::{open_reader, open_writer, Format};
use chcodec::utils::logging;
use chcodec::{CodecConfig, Config};
use chrono::NaiveDate;
use common::assertions::{assert_bytes, assert_root_err};
use common::{columns, read_rows, write_rows};
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::{NamedTempFile, TempDir};

fn load(content: &str) -> Result<Config, CodecError> {
    let mut file = NamedTempFile::new().expect("创建临时文件失败");
    file.write_all(content.as_bytes()).expect("写入临时文件失败");
    Config::load(file.path())
}

#[test]
fn test_full_config_file() {
    let config = load(
        r#"
[codec]
format = "Native"
widen_unsigned_types = true
use_binary_string = true
server_time_zone = "Europe/Berlin"
use_time_zone = "Asia/Tokyo"
date_time_zone = "America/New_York"
block_rows = 128

[log]
level = "debug"
dir = "/tmp/chcodec-logs"
file = "codec"
max_file_size = 1024
max_files = 2
duplicate_to_stderr = true
"#,
    )
    .expect("加载配置失败");

    assert_eq!(config.codec.format, Format::Native);
    assert!(config.codec.widen_unsigned_types);
    assert!(config.codec.use_binary_string);
    assert_eq!(config.codec.server_zone().unwrap(), chrono_tz::Europe::Berlin);
    assert_eq!(config.codec.use_zone().unwrap(), Some(chrono_tz::Asia::Tokyo));
    assert_eq!(config.codec.date_zone().unwrap(), Some(chrono_tz::America::New_York));
    assert_eq!(config.codec.block_rows, 128);
    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.max_files, 2);
    assert!(config.log.duplicate_to_stderr);
}

#[test]
fn test_empty_file_uses_defaults() {
    assert_eq!(load("").unwrap(), Config::default());
}

#[test]
fn test_invalid_values_rejected() {
    assert_root_err(load("[codec]\nformat = \"CSV\"\n"), |e| matches!(e, CodecError::Config(_)));
    assert_root_err(load("[codec]\nblock_rows = 0\n"), |e| matches!(e, CodecError::Config(_)));
    assert_root_err(load("[codec]\nuse_time_zone = \"Nowhere\"\n"), |e| {
        matches!(e, CodecError::Config(msg) if msg.contains("use_time_zone"))
    });
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    assert_root_err(Config::load(dir.path().join("absent.toml")), |e| matches!(e, CodecError::Io(_)));
}

#[test]
fn test_save_then_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chcodec.toml");
    let mut config = Config::default();
    config.codec.format = Format::RowBinaryWithNames;
    config.codec.date_time_zone = Some("Asia/Kolkata".to_string());
    config.log.level = "warn".to_string();
    config.save(&path).unwrap();
    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_invalid_zone_blocks_opening_drivers() {
    let config = CodecConfig {
        server_time_zone: "Not/AZone".to_string(),
        ..CodecConfig::default()
    };
    assert_root_err(open_writer(&config, Vec::new(), columns(&[("a", "Int8")])), |e| {
        matches!(e, CodecError::Config(_))
    });
    assert_root_err(open_reader(&config, &[][..], Some(columns(&[("a", "Int8")]))), |e| {
        matches!(e, CodecError::Config(_))
    });
}

#[test]
fn test_use_time_zone_applies_to_plain_date_time() {
    let config = CodecConfig {
        use_time_zone: Some("Asia/Shanghai".to_string()),
        ..CodecConfig::default()
    };
    let columns = columns(&[("local", "DateTime"), ("utc", "DateTime('UTC')")]);
    let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
    let row = vec![Value::DateTime(at), Value::DateTime(at)];
    let bytes = write_rows(&config, &columns, &[row.clone()]);

    let mut expected = 1_704_067_200u32.to_le_bytes().to_vec();
    expected.extend_from_slice(&1_704_096_000u32.to_le_bytes());
    assert_bytes(&bytes, &expected);

    let (_, rows) = read_rows(&config, &bytes, Some(columns));
    assert_eq!(rows, vec![row]);
}

#[test]
fn test_widen_and_binary_string_options() {
    let config = CodecConfig {
        format: Format::RowBinaryWithNamesAndTypes,
        widen_unsigned_types: true,
        use_binary_string: true,
        ..CodecConfig::default()
    };
    let columns = columns(&[("n", "UInt32"), ("s", "String")]);
    let plain = CodecConfig {
        format: Format::RowBinaryWithNamesAndTypes,
        ..CodecConfig::default()
    };
    let bytes = write_rows(&plain, &columns, &[vec![Value::UInt32(u32::MAX), Value::from("hi")]]);

    let (_, rows) = read_rows(&config, &bytes, None);
    assert_eq!(rows, vec![vec![Value::Int64(u32::MAX as i64), Value::Bytes(b"hi".to_vec())]]);
}

#[test]
#[serial]
fn test_logging_lifecycle() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.log.dir = dir.path().to_string_lossy().into_owned();
    config.log.file = "integration".to_string();
    config.log.level = "debug".to_string();

    logging::init(&config).expect("日志初始化失败");
    assert!(logging::is_initialized());
    logging::init(&config).expect("重复初始化应直接返回");

    let bytes = write_rows(&config.codec, &columns(&[("a", "Int8")]), &[vec![Value::Int8(1)]]);
    assert_eq!(bytes, vec![1]);

    logging::shutdown();
    assert!(!logging::is_initialized());
}
