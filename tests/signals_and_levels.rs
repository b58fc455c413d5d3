// tests/signals_and_levels.rs

use pipevisor::cli::LogLevel;
use pipevisor::exec::signals::{is_alive, signal_if_alive, signal_name};
use pipevisor::logging::resolve_level;
use pipevisor::types::{DeliveryMode, KillSignal};

#[test]
fn kill_signals_parse_by_exact_name() {
    for signal in KillSignal::ALL {
        assert_eq!(signal.name().parse::<KillSignal>(), Ok(signal));
    }
    assert!("sigterm".parse::<KillSignal>().is_err());
    assert!("TERM".parse::<KillSignal>().is_err());
    assert!("SIGUSR1".parse::<KillSignal>().is_err());
}

#[test]
fn unsupported_signals_resolve_to_default() {
    assert_eq!(KillSignal::resolve(None, KillSignal::Int), KillSignal::Int);
    assert_eq!(
        KillSignal::resolve(Some("SIGHUP"), KillSignal::Int),
        KillSignal::Hup
    );
    assert_eq!(
        KillSignal::resolve(Some("SIGSTOP"), KillSignal::Term),
        KillSignal::Term
    );
}

#[test]
fn delivery_mode_parses_case_insensitively() {
    assert_eq!(" Split ".parse::<DeliveryMode>(), Ok(DeliveryMode::Split));
    assert_eq!("combined".parse::<DeliveryMode>(), Ok(DeliveryMode::Combined));
    assert!("both".parse::<DeliveryMode>().is_err());
    assert_eq!(DeliveryMode::default(), DeliveryMode::Combined);
}

#[test]
fn raw_signal_numbers_are_named() {
    assert_eq!(signal_name(9), "SIGKILL");
    assert_eq!(signal_name(15), "SIGTERM");
    assert_eq!(signal_name(2), "SIGINT");
}

#[test]
fn own_process_is_alive() {
    assert!(is_alive(std::process::id()));
}

#[test]
fn log_level_prefers_cli_then_env() {
    assert_eq!(
        resolve_level(Some(LogLevel::Trace), Some("error")),
        tracing::Level::TRACE
    );
    assert_eq!(resolve_level(None, Some(" DEBUG ")), tracing::Level::DEBUG);
    assert_eq!(resolve_level(None, Some("warning")), tracing::Level::WARN);
    assert_eq!(resolve_level(None, Some("loud")), tracing::Level::INFO);
    assert_eq!(resolve_level(None, None), tracing::Level::INFO);
}

#[tokio::test]
async fn exited_process_is_never_signalled() {
    let mut child = tokio::process::Command::new("/bin/sh")
        .args(["-c", "true"])
        .spawn()
        .expect("spawn sh");
    let pid = child.id().expect("pid before exit");

    let status = child.wait().await.expect("wait for sh");
    assert!(status.success());

    assert!(!signal_if_alive(&mut child, pid, KillSignal::Kill));
    assert!(!signal_if_alive(&mut child, pid, KillSignal::Term));
    assert!(!is_alive(pid));
}
