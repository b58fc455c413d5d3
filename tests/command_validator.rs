// tests/command_validator.rs

use serde_json::json;

use pipevisor::command::args::{json_or_passthrough, substitute_secret, SECRET_PLACEHOLDER};
use pipevisor::command::validate::{
    validate_args, validate_outputs, validate_path, validate_topics,
};
use pipevisor::errors::PipevisorError;

#[test]
fn path_must_mention_tool_case_insensitively() {
    assert_eq!(
        validate_path("/usr/local/bin/FFmpeg", "ffmpeg").unwrap(),
        "/usr/local/bin/FFmpeg"
    );
    assert_eq!(validate_path("  ffmpeg  ", "ffmpeg").unwrap(), "ffmpeg");

    let err = validate_path("/usr/bin/cat", "ffmpeg").unwrap_err();
    assert!(matches!(err, PipevisorError::InvalidPath(_)));
    assert!(err.is_validation());

    assert!(matches!(
        validate_path("   ", "ffmpeg"),
        Err(PipevisorError::InvalidPath(_))
    ));
}

#[test]
fn args_must_be_a_list_of_strings() {
    let args = validate_args(&json!(["-i", "pipe:0", "-f", "null", "-"])).unwrap();
    assert_eq!(args, vec!["-i", "pipe:0", "-f", "null", "-"]);

    assert!(validate_args(&json!([])).unwrap().is_empty());

    // A single opaque string is not split.
    assert!(matches!(
        validate_args(&json!("-i in.mp4 out.mp4")),
        Err(PipevisorError::InvalidArgs(_))
    ));
    assert!(matches!(
        validate_args(&json!(["-t", 5])),
        Err(PipevisorError::InvalidArgs(_))
    ));
}

#[test]
fn outputs_must_be_an_integer_within_range() {
    assert_eq!(validate_outputs(&json!(0), 5).unwrap(), 0);
    assert_eq!(validate_outputs(&json!(5), 5).unwrap(), 5);

    for bad in [json!(6), json!(-1), json!(1.5), json!("2"), json!(null)] {
        let err = validate_outputs(&bad, 5).unwrap_err();
        assert!(
            matches!(err, PipevisorError::InvalidOutputCount(_)),
            "{bad} should be rejected, got {err:?}"
        );
    }

    assert_eq!(validate_outputs(&json!(12), 16).unwrap(), 12);
}

#[test]
fn topics_must_match_outputs_and_be_unique() {
    assert_eq!(
        validate_topics(&json!(["video", "log"]), 2).unwrap(),
        vec!["video", "log"]
    );

    let cases = [
        json!(["video"]),
        json!(["video", "log", "extra"]),
        json!(["video", "video"]),
        json!(["status", "log"]),
        json!(["video", 3]),
        json!("video"),
    ];

    for case in cases {
        assert!(
            matches!(
                validate_topics(&case, 2),
                Err(PipevisorError::InvalidTopics(_))
            ),
            "{case} should be rejected"
        );
    }
}

#[test]
fn argument_strings_are_json_or_passthrough() {
    assert_eq!(json_or_passthrough(r#"["-i", "in.mp4"]"#), json!(["-i", "in.mp4"]));
    assert_eq!(json_or_passthrough("-version"), json!("-version"));

    // Passthrough strings are then rejected as args.
    assert!(validate_args(&json_or_passthrough("-i in.mp4")).is_err());
}

#[test]
fn secret_replaces_first_placeholder_only() {
    let mut args = vec![
        "-key".to_string(),
        SECRET_PLACEHOLDER.to_string(),
        SECRET_PLACEHOLDER.to_string(),
    ];
    assert!(substitute_secret(&mut args, "hunter2"));
    assert_eq!(args, vec!["-key", "hunter2", SECRET_PLACEHOLDER]);

    let mut plain = vec!["-version".to_string()];
    assert!(!substitute_secret(&mut plain, "hunter2"));
    assert_eq!(plain, vec!["-version"]);
}
