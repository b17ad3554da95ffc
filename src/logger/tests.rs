//! Tests for the logger module

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::logger::config::*;
use crate::logger::writer::{RotatingFileWriter, rotated_name, shift_rotated_files};

fn file_config(path: PathBuf, max_size: u64, max_files: usize) -> FileConfig {
    FileConfig {
        enabled: true,
        path,
        append: true,
        format: LogFormat::Full,
        rotation: RotationConfig {
            max_size,
            max_files,
        },
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoggerConfig::default();
        assert!(config.console.enabled);
        assert!(!config.file.enabled);
        assert_eq!(config.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_no_outputs_fails() {
        let mut config = LoggerConfig::default();
        config.console.enabled = false;
        config.file.enabled = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_directive_level_parses_leading_level() {
        let config = LoggerConfig {
            level: "debug,hyper=warn".to_string(),
            ..LoggerConfig::default()
        };
        assert_eq!(config.parse_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_base_level_of_directives() {
        assert_eq!(base_level("warn"), "warn");
        assert_eq!(base_level(" warn , launchpad_edge::sdk=debug"), "warn");
        assert_eq!(base_level("hyper=warn"), "info");
        assert_eq!(base_level(""), "info");
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::names(), vec!["full", "compact", "json"]);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_empty_path_fails_only_when_enabled() {
        let mut file = FileConfig {
            path: PathBuf::new(),
            ..FileConfig::default()
        };
        assert!(file.validate().is_ok());
        file.enabled = true;
        assert!(file.validate().is_err());
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}

mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn property_valid_configs_validate(
            console_enabled in any::<bool>(),
            file_enabled in any::<bool>(),
            colored in any::<bool>(),
            max_size in 1u64..1_000_000u64,
            max_files in 1usize..100usize,
            level in prop::sample::select(VALID_LOG_LEVELS.to_vec()),
        ) {
            prop_assume!(console_enabled || file_enabled);

            let config = LoggerConfig {
                console: ConsoleConfig::new(console_enabled, colored),
                file: FileConfig {
                    enabled: file_enabled,
                    ..file_config(PathBuf::from("test.log"), max_size, max_files)
                },
                level: level.to_string(),
            };

            prop_assert!(config.validate().is_ok());
        }

        #[test]
        fn property_invalid_levels_fail(level in "[a-z]{6,12}") {
            prop_assume!(!VALID_LOG_LEVELS.contains(&level.as_str()));
            let config = LoggerConfig { level, ..LoggerConfig::default() };
            prop_assert!(config.validate().is_err());
        }

        #[test]
        fn property_rotation_zero_values_fail(value in 1u64..1000u64) {
            prop_assert!(RotationConfig::new(0, value as usize).is_err());
            prop_assert!(RotationConfig::new(value, 0).is_err());
            prop_assert!(RotationConfig::new(value, value as usize).is_ok());
        }
    }
}

mod writer_tests {
    use super::*;
    use tempfile::tempdir;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_writer_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/logs/app.log");
        let writer = RotatingFileWriter::new(&file_config(path.clone(), 1024, 2)).unwrap();

        writer.make_writer().write_all(b"hello\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(!writer.is_in_fallback_mode());
    }

    #[test]
    fn test_writer_rotates_when_size_exceeded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = RotatingFileWriter::new(&file_config(path.clone(), 10, 3)).unwrap();

        writer.make_writer().write_all(b"first-line\n").unwrap();
        writer.make_writer().write_all(b"second\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert_eq!(
            fs::read_to_string(rotated_name(&path, 1)).unwrap(),
            "first-line\n"
        );
    }

    #[test]
    fn test_shift_keeps_at_most_max_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");

        for round in 0..5 {
            fs::write(&path, format!("round {round}")).unwrap();
            shift_rotated_files(&path, 2).unwrap();
        }

        assert!(!path.exists());
        assert_eq!(
            fs::read_to_string(rotated_name(&path, 1)).unwrap(),
            "round 4"
        );
        assert_eq!(
            fs::read_to_string(rotated_name(&path, 2)).unwrap(),
            "round 3"
        );
        assert!(!rotated_name(&path, 3).exists());
    }

    #[test]
    fn test_truncate_mode_starts_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "stale contents").unwrap();

        let mut config = file_config(path.clone(), 1024, 2);
        config.append = false;
        let writer = RotatingFileWriter::new(&config).unwrap();
        writer.make_writer().write_all(b"fresh").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "fresh");
    }
}

mod handle_tests {
    use crate::logger::LogLevelHandle;
    use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, reload};

    #[test]
    fn test_set_level_swaps_filter() {
        let (layer, inner) = reload::Layer::<EnvFilter, Registry>::new(EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry().with(layer);
        let handle = LogLevelHandle { inner };

        tracing::subscriber::with_default(subscriber, || {
            handle.set_level("debug").unwrap();
            assert_eq!(handle.current().as_deref(), Some("debug"));
            assert!(handle.set_level("launchpad_edge=loud").is_err());
        });
    }
}
