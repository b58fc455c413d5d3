// tests/config_loading.rs

use std::error::Error;
use std::io::Write;
use std::time::Duration;

use tempfile::{tempdir, NamedTempFile};

use pipevisor::config::model::{DEFAULT_ESCALATION_TIMEOUT, DEFAULT_OUTPUTS_MAX};
use pipevisor::config::{load_and_validate, load_or_default, ConfigFile, RawConfigFile};
use pipevisor::errors::PipevisorError;
use pipevisor::types::{DeliveryMode, KillSignal};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn parse(contents: &str) -> Result<ConfigFile, PipevisorError> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    ConfigFile::try_from(raw)
}

#[test]
fn empty_config_yields_defaults() -> TestResult {
    let cfg = parse("")?;
    let s = cfg.supervisor;

    assert_eq!(s.tool, "ffmpeg");
    assert_eq!(s.cmd_path, "ffmpeg");
    assert_eq!(s.cmd_args, vec!["-version"]);
    assert_eq!(s.cmd_outputs, 2);
    assert_eq!(s.outputs_max, DEFAULT_OUTPUTS_MAX);
    assert_eq!(s.kill_signal, KillSignal::Term);
    assert_eq!(s.delivery, DeliveryMode::Combined);
    assert_eq!(s.topics, None);
    assert_eq!(s.escalation_timeout, DEFAULT_ESCALATION_TIMEOUT);
    Ok(())
}

#[test]
fn full_config_is_validated_and_resolved() -> TestResult {
    let file = write_config(
        r#"
[supervisor]
cmd_path = "/opt/FFmpeg/bin/ffmpeg"
cmd_args = ["-i", "pipe:0", "-f", "mp4", "pipe:1"]
cmd_outputs = 3
kill_signal = "SIGINT"
delivery = "combined"
topics = ["video", "log", "progress"]
topic_prefix = "cam1/"
escalation_timeout_ms = 750
"#,
    );

    let s = load_and_validate(file.path())?.supervisor;
    assert_eq!(s.cmd_path, "/opt/FFmpeg/bin/ffmpeg");
    assert_eq!(s.cmd_args, vec!["-i", "pipe:0", "-f", "mp4", "pipe:1"]);
    assert_eq!(s.cmd_outputs, 3);
    assert_eq!(s.kill_signal, KillSignal::Int);
    assert_eq!(
        s.topics,
        Some(vec!["video".to_string(), "log".to_string(), "progress".to_string()])
    );
    assert_eq!(s.topic_prefix, "cam1/");
    assert_eq!(s.escalation_timeout, Duration::from_millis(750));
    Ok(())
}

#[test]
fn args_string_is_parsed_as_json() -> TestResult {
    let s = parse(
        r#"
[supervisor]
cmd_args = '["-hide_banner", "-version"]'
"#,
    )?
    .supervisor;
    assert_eq!(s.cmd_args, vec!["-hide_banner", "-version"]);

    let blank = parse("[supervisor]\ncmd_args = \"\"\n")?.supervisor;
    assert_eq!(blank.cmd_args, vec!["-version"]);
    Ok(())
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        ("[supervisor]\ncmd_path = \"/usr/bin/cat\"\n", "path"),
        ("[supervisor]\ncmd_args = \"-i in.mp4\"\n", "args"),
        ("[supervisor]\ncmd_outputs = 6\n", "outputs"),
        ("[supervisor]\ncmd_outputs = 1\ntopics = [\"a\", \"b\"]\n", "topics"),
        ("[supervisor]\nkill_signal = \"SIGUSR1\"\n", "config"),
        ("[supervisor]\nescalation_timeout_ms = 0\n", "config"),
        ("[supervisor]\noutputs_max = 65\n", "config"),
        ("[supervisor]\ntool = \"  \"\n", "config"),
    ];

    for (contents, kind) in cases {
        let err = parse(contents).unwrap_err();
        let ok = match kind {
            "path" => matches!(err, PipevisorError::InvalidPath(_)),
            "args" => matches!(err, PipevisorError::InvalidArgs(_)),
            "outputs" => matches!(err, PipevisorError::InvalidOutputCount(_)),
            "topics" => matches!(err, PipevisorError::InvalidTopics(_)),
            _ => matches!(err, PipevisorError::ConfigError(_)),
        };
        assert!(ok, "{contents:?} produced unexpected error {err:?}");
    }
}

#[test]
fn outputs_max_can_only_be_raised() -> TestResult {
    let raised = parse("[supervisor]\noutputs_max = 12\ncmd_outputs = 10\n")?.supervisor;
    assert_eq!(raised.outputs_max, 12);
    assert_eq!(raised.cmd_outputs, 10);

    let lowered = parse("[supervisor]\noutputs_max = 1\ncmd_outputs = 4\n")?.supervisor;
    assert_eq!(lowered.outputs_max, DEFAULT_OUTPUTS_MAX);
    assert_eq!(lowered.cmd_outputs, 4);
    Ok(())
}

#[test]
fn topics_are_ignored_with_split_delivery() -> TestResult {
    let s = parse(
        r#"
[supervisor]
delivery = "split"
topics = ["only-one"]
"#,
    )?
    .supervisor;
    assert_eq!(s.delivery, DeliveryMode::Split);
    assert_eq!(s.topics, None);
    Ok(())
}

#[test]
fn secret_placeholder_is_substituted() -> TestResult {
    let s = parse(
        r#"
[supervisor]
cmd_args = ["-decryption_key", "SECRET", "-i", "pipe:0"]
secret = "0badc0de"
"#,
    )?
    .supervisor;
    assert_eq!(s.cmd_args, vec!["-decryption_key", "0badc0de", "-i", "pipe:0"]);
    Ok(())
}

#[test]
fn unknown_delivery_mode_fails_to_parse() {
    let err = parse("[supervisor]\ndelivery = \"both\"\n").unwrap_err();
    assert!(matches!(err, PipevisorError::TomlError(_)));
}

#[test]
fn missing_file_falls_back_to_defaults() -> TestResult {
    let dir = tempdir()?;
    let cfg = load_or_default(dir.path().join("Pipevisor.toml"))?;
    assert_eq!(cfg.supervisor.cmd_path, "ffmpeg");

    // `load_and_validate` insists on the file.
    let err = load_and_validate(dir.path().join("Pipevisor.toml")).unwrap_err();
    assert!(matches!(err, PipevisorError::IoError(_)));
    Ok(())
}
