// tests/stdio_routing.rs

use serde_json::json;

use pipevisor::engine::{Payload, Router, StatusPayload};
use pipevisor::errors::PipevisorError;
use pipevisor::stdio::{default_topic, ChannelRole, StdioPlan, TopicSet};
use pipevisor::types::DeliveryMode;

use ChannelRole::{Discard, Pipe};

#[test]
fn plan_for_small_output_counts() {
    assert_eq!(StdioPlan::for_outputs(0).roles(), &[Pipe, Discard, Discard]);
    assert_eq!(StdioPlan::for_outputs(1).roles(), &[Pipe, Pipe, Discard]);
    assert_eq!(StdioPlan::for_outputs(2).roles(), &[Pipe, Pipe, Pipe]);
    assert_eq!(StdioPlan::for_outputs(3).roles(), &[Pipe, Pipe, Pipe, Pipe]);
}

#[test]
fn plan_lists_extra_fds_from_three() {
    let plan = StdioPlan::for_outputs(4);
    assert_eq!(plan.piped_outputs().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert_eq!(plan.extra_fds().collect::<Vec<_>>(), vec![3, 4]);

    assert_eq!(StdioPlan::for_outputs(2).extra_fds().count(), 0);
    assert_eq!(StdioPlan::for_outputs(0).piped_outputs().count(), 0);
}

#[test]
fn default_topics_name_well_known_channels() {
    assert_eq!(default_topic(0), "status");
    assert_eq!(default_topic(1), "stdout");
    assert_eq!(default_topic(2), "stderr");
    assert_eq!(default_topic(3), "stdio3");

    assert_eq!(
        TopicSet::defaults(3).as_slice(),
        &["status", "stdout", "stderr", "stdio3"]
    );
    assert_eq!(TopicSet::defaults(0).as_slice(), &["status"]);
}

#[test]
fn overrides_apply_in_combined_mode_only() {
    let overrides = json!(["video", "log"]);

    let combined =
        TopicSet::resolve(2, Some(&overrides), DeliveryMode::Combined, "").unwrap();
    assert_eq!(combined.as_slice(), &["status", "video", "log"]);

    let split = TopicSet::resolve(2, Some(&overrides), DeliveryMode::Split, "").unwrap();
    assert_eq!(split.as_slice(), &["status", "stdout", "stderr"]);
}

#[test]
fn invalid_overrides_are_rejected_in_combined_mode() {
    let err = TopicSet::resolve(2, Some(&json!(["only-one"])), DeliveryMode::Combined, "")
        .unwrap_err();
    assert!(matches!(err, PipevisorError::InvalidTopics(_)));
}

#[test]
fn prefix_is_prepended_to_every_topic() {
    let topics = TopicSet::resolve(1, None, DeliveryMode::Combined, "cam1/").unwrap();
    assert_eq!(topics.as_slice(), &["cam1/status", "cam1/stdout"]);
    assert_eq!(topics.status(), "cam1/status");
}

fn router(outputs: usize, delivery: DeliveryMode, filenames: &[&str]) -> Router {
    Router::new(
        StdioPlan::for_outputs(outputs),
        TopicSet::defaults(outputs),
        filenames.iter().map(|f| f.to_string()).collect(),
        delivery,
    )
}

#[test]
fn split_delivery_uses_channel_index_as_port() {
    let router = router(3, DeliveryMode::Split, &[]);

    let out = router.route(1, b"a".to_vec()).unwrap();
    assert_eq!(out.port, 1);
    assert_eq!(out.message.topic, "stdout");

    let extra = router.route(3, b"c".to_vec()).unwrap();
    assert_eq!(extra.port, 3);
    assert_eq!(extra.message.topic, "stdio3");
    assert_eq!(extra.data(), Some(&b"c"[..]));
}

#[test]
fn combined_delivery_uses_port_zero() {
    let router = router(2, DeliveryMode::Combined, &[]);

    let err = router.route(2, b"oops".to_vec()).unwrap();
    assert_eq!(err.port, 0);
    assert_eq!(err.message.topic, "stderr");
}

#[test]
fn discarded_and_input_channels_are_not_routed() {
    let router = router(1, DeliveryMode::Split, &[]);
    assert!(router.route(0, b"x".to_vec()).is_none());
    assert!(router.route(2, b"x".to_vec()).is_none());
    assert!(router.route(9, b"x".to_vec()).is_none());
}

#[test]
fn filenames_attach_by_output_position() {
    let router = router(3, DeliveryMode::Combined, &["out.mp4", "", "thumb.jpg"]);

    let first = router.route(1, vec![1]).unwrap();
    assert_eq!(first.message.filename.as_deref(), Some("out.mp4"));

    // Empty names are treated as absent.
    let second = router.route(2, vec![2]).unwrap();
    assert_eq!(second.message.filename, None);

    let third = router.route(3, vec![3]).unwrap();
    assert_eq!(third.message.filename.as_deref(), Some("thumb.jpg"));
}

#[test]
fn status_always_goes_to_port_zero() {
    let router = router(2, DeliveryMode::Split, &["out.mp4"]);
    let spawn = router.status(StatusPayload::Spawn { pid: 42 });

    assert_eq!(spawn.port, 0);
    assert_eq!(spawn.message.topic, "status");
    assert_eq!(spawn.message.filename, None);
    assert_eq!(
        spawn.message.payload,
        Payload::Status(StatusPayload::Spawn { pid: 42 })
    );
}

#[test]
fn emissions_serialize_as_flat_json() {
    let router = router(2, DeliveryMode::Split, &["out.mp4"]);

    let close = router.status(StatusPayload::Close {
        pid: 7,
        code: Some(0),
        signal: None,
        killed: false,
    });
    assert_eq!(
        serde_json::to_value(&close).unwrap(),
        json!({
            "port": 0,
            "topic": "status",
            "payload": {"status": "close", "pid": 7, "code": 0, "signal": null, "killed": false}
        })
    );

    let data = router.route(1, vec![104, 105]).unwrap();
    assert_eq!(
        serde_json::to_value(&data).unwrap(),
        json!({"port": 1, "topic": "stdout", "payload": [104, 105], "filename": "out.mp4"})
    );
}
