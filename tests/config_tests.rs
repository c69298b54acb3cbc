//! Validation tests for configuration loading and checks

use theremin_lab::config::{load_config, save_config, validate_config, Config};
use theremin_lab::output::ImageFormat;
use theremin_lab::{validate_input, AnalysisError};

fn expect_invalid(config: &Config, what: &str) {
    match validate_config(config) {
        Err(AnalysisError::ConfigValidation(msg)) => {
            println!("{}: {}", what, msg);
        }
        other => panic!("Expected validation error for {}, got {:?}", what, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.roles.reference_note, 24);
        assert_eq!(config.roles.gesture_note, 60);
        assert_eq!(config.roles.control_note, 48);
        assert_eq!(config.trace.target_fps, 30.0);
        assert_eq!(config.gestures.default_bpm, 120.0);
        assert_eq!(config.output.image_format, ImageFormat::Png);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.roles.gesture_note = 72;
        config.trace.target_fps = 60.0;
        config.output.image_format = ImageFormat::Both;
        save_config(&config, &path).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.roles, config.roles);
        assert_eq!(loaded.trace.target_fps, 60.0);
        assert_eq!(loaded.output.image_format, ImageFormat::Both);
        assert_eq!(loaded.sync.grade_thresholds_ms, config.sync.grade_thresholds_ms);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(
            &path,
            r#"{"roles": {"control_note": 50}, "output": {"image_format": "svg"}}"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.roles.control_note, 50);
        assert_eq!(config.roles.reference_note, 24, "Unset role keeps its default");
        assert_eq!(config.output.image_format, ImageFormat::Svg);
        assert_eq!(config.output.chart_size, [1200, 800]);
        assert_eq!(config.trace.vsync_event_names, vec!["BeginFrame", "FireAnimationFrame"]);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = Config::default();
        config.roles.control_note = config.roles.gesture_note;
        expect_invalid(&config, "shared role note");

        let mut config = Config::default();
        config.roles.reference_note = 200;
        expect_invalid(&config, "note out of range");

        let mut config = Config::default();
        config.sync.grade_thresholds_ms = [50.0, 40.0, 150.0];
        expect_invalid(&config, "unordered grades");

        let mut config = Config::default();
        config.sync.histogram_edges = 1;
        expect_invalid(&config, "single histogram edge");

        let mut config = Config::default();
        config.trace.target_fps = 0.0;
        expect_invalid(&config, "zero target fps");

        let mut config = Config::default();
        config.gestures.default_bpm = -1.0;
        expect_invalid(&config, "negative bpm");

        let mut config = Config::default();
        config.gestures.assessment_thresholds = [0.4, 0.6, 0.8];
        expect_invalid(&config, "ascending assessment thresholds");

        let mut config = Config::default();
        config.gestures.note_axis = [100, 20];
        expect_invalid(&config, "inverted note axis");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(load_config(&missing), Err(AnalysisError::InputNotFound(_))));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"roles\": ").unwrap();
        assert!(matches!(load_config(&broken), Err(AnalysisError::Json(_))));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{"trace": {"target_fps": -5}}"#).unwrap();
        assert!(matches!(load_config(&invalid), Err(AnalysisError::ConfigValidation(_))));
    }

    #[test]
    fn test_validate_input() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("capture.mid");
        std::fs::write(&present, b"MThd").unwrap();
        let config = Config::default();

        assert!(validate_input(&[&present], &config).is_ok());
        assert!(matches!(
            validate_input(&[present.clone(), dir.path().join("absent.json")], &config),
            Err(AnalysisError::InputNotFound(_))
        ));
        assert!(
            validate_input(&[dir.path()], &config).is_err(),
            "A directory is not an input file"
        );
    }
}
