use super::*;

#[test]
fn parses_kebab_case_json() {
    let cfg = RenderConfig::from_json(r#"{"duration_secs": 3, "effect": "pan-left"}"#).unwrap();
    assert_eq!(cfg.duration_secs, 3);
    assert_eq!(cfg.effect, Effect::PanLeft);
}

#[test]
fn duration_bounds_are_inclusive() {
    assert!(RenderConfig::new(MIN_DURATION_SECS, Effect::Fade).is_ok());
    assert!(RenderConfig::new(MAX_DURATION_SECS, Effect::Fade).is_ok());

    for bad in [0, MAX_DURATION_SECS + 1] {
        let err = RenderConfig::new(bad, Effect::Fade).unwrap_err();
        assert!(matches!(err, StillmotionError::InvalidConfig(_)));
    }
}

#[test]
fn negative_duration_is_invalid_config() {
    let err = RenderConfig::from_json(r#"{"duration_secs": -2, "effect": "fade"}"#).unwrap_err();
    assert!(matches!(err, StillmotionError::InvalidConfig(_)));
}

#[test]
fn unknown_effect_and_unknown_fields_are_rejected() {
    for json in [
        r#"{"duration_secs": 2, "effect": "spin"}"#,
        r#"{"duration_secs": 2, "effect": "fade", "loop": true}"#,
        r#"{"effect": "fade"}"#,
    ] {
        let err = RenderConfig::from_json(json).unwrap_err();
        assert!(matches!(err, StillmotionError::InvalidConfig(_)), "{json}");
    }
}

#[test]
fn from_path_reads_json_file() {
    let dir = std::env::temp_dir().join(format!("stillmotion_cfg_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("render.json");
    std::fs::write(&path, r#"{"duration_secs": 5, "effect": "rotate"}"#).unwrap();

    let cfg = RenderConfig::from_path(&path).unwrap();
    assert_eq!(cfg, RenderConfig::new(5, Effect::Rotate).unwrap());

    let missing = RenderConfig::from_path(dir.join("missing.json")).unwrap_err();
    assert!(matches!(missing, StillmotionError::InvalidConfig(_)));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn default_output_is_thirty_fps_720p() {
    let out = OutputSpec::default();
    assert_eq!(out.fps, Fps::whole(30));
    assert_eq!((out.canvas.width, out.canvas.height), (1280, 720));
    assert!(out.validate().is_ok());
}

#[test]
fn odd_output_canvas_is_rejected() {
    let out = OutputSpec {
        canvas: Canvas {
            width: 33,
            height: 18,
        },
        ..OutputSpec::default()
    };
    assert!(matches!(
        out.validate().unwrap_err(),
        StillmotionError::InvalidConfig(_)
    ));
}

#[test]
fn output_spec_json_uses_plain_integers() {
    let json = serde_json::to_string(&OutputSpec::default()).unwrap();
    assert_eq!(
        json,
        r#"{"fps":{"num":30,"den":1},"canvas":{"width":1280,"height":720}}"#
    );
    let back: OutputSpec = serde_json::from_str(&json).unwrap();
    assert_eq!(back, OutputSpec::default());
}
