use std::sync::Arc;
use std::time::Duration;

use crate::configuration::types::CaptureConfig;
use crate::data_capture::capture_source::testing::{ScriptedOpener, Tail};
use crate::data_capture::frame_classifier::testing::tcp_frame;
use crate::data_capture::pipeline::DeliveryEnd;
use crate::error_handling::types::{DeviceError, SessionError};
use crate::session_management::{CaptureSession, SessionState, Transition};
use crate::storage::storage_trait::testing::MemorySink;
use crate::storage::storage_trait::ReportSink;

fn session(opener: Arc<ScriptedOpener>, sink: Arc<MemorySink>) -> CaptureSession {
    let sinks: Vec<Arc<dyn ReportSink>> = vec![sink];
    CaptureSession::new(CaptureConfig::default(), opener, sinks)
}

async fn wait_until<F: Fn() -> bool>(cond: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn start_then_stop_releases_the_handle() {
    let opener = Arc::new(ScriptedOpener::idle());
    let mut session = session(opener.clone(), Arc::new(MemorySink::default()));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.active_session_id().is_none());

    let id = match session.start().await.unwrap() {
        Transition::Started(id) => id,
        other => panic!("unexpected transition {:?}", other),
    };
    assert_eq!(session.state(), SessionState::Capturing);
    assert_eq!(session.active_session_id(), Some(id));
    assert_eq!(opener.handles_open(), 1);

    match session.stop().await.unwrap() {
        Transition::Stopped(summary) => {
            assert_eq!(summary.id, id);
            assert_eq!(summary.end, DeliveryEnd::StopRequested);
        }
        other => panic!("unexpected transition {:?}", other),
    }
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(opener.handles_open(), 0);
}

#[tokio::test]
async fn repeated_commands_are_no_ops() {
    let opener = Arc::new(ScriptedOpener::idle());
    let mut session = session(opener.clone(), Arc::new(MemorySink::default()));

    assert!(matches!(session.stop().await.unwrap(), Transition::AlreadyIdle));

    let id = match session.start().await.unwrap() {
        Transition::Started(id) => id,
        other => panic!("unexpected transition {:?}", other),
    };
    match session.start().await.unwrap() {
        Transition::AlreadyCapturing(same) => assert_eq!(same, id),
        other => panic!("unexpected transition {:?}", other),
    }
    assert_eq!(opener.opens.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(opener.handles_open(), 1);

    assert!(matches!(session.stop().await.unwrap(), Transition::Stopped(_)));
    assert!(matches!(session.stop().await.unwrap(), Transition::AlreadyIdle));
    assert_eq!(session.state(), SessionState::Idle);
}

#[derive(Debug, Clone, Copy)]
enum Cmd {
    Start,
    Stop,
}

#[tokio::test]
async fn every_start_stop_sequence_ends_in_the_expected_state() {
    for len in 1..=5u32 {
        for bits in 0..(1u32 << len) {
            let cmds: Vec<Cmd> = (0..len)
                .map(|i| if bits & (1 << i) != 0 { Cmd::Start } else { Cmd::Stop })
                .collect();

            let opener = Arc::new(ScriptedOpener::idle());
            let mut session = session(opener.clone(), Arc::new(MemorySink::default()));
            let mut effective_starts = 0;
            let mut effective_stops = 0;
            for cmd in &cmds {
                match cmd {
                    Cmd::Start => {
                        if matches!(session.start().await.unwrap(), Transition::Started(_)) {
                            effective_starts += 1;
                        }
                    }
                    Cmd::Stop => {
                        if matches!(session.stop().await.unwrap(), Transition::Stopped(_)) {
                            effective_stops += 1;
                        }
                    }
                }
            }

            let idle = session.state() == SessionState::Idle;
            assert_eq!(idle, effective_starts == effective_stops, "{:?}", cmds);
            assert!(effective_starts - effective_stops <= 1, "{:?}", cmds);
            assert_eq!(
                opener.opens.load(std::sync::atomic::Ordering::SeqCst),
                effective_starts,
                "{:?}",
                cmds
            );
            assert_eq!(opener.handles_open(), if idle { 0 } else { 1 }, "{:?}", cmds);
            session.stop().await.unwrap();
        }
    }
}

#[tokio::test]
async fn device_failure_keeps_the_session_idle() {
    let opener = Arc::new(ScriptedOpener::failing());
    let mut session = session(opener, Arc::new(MemorySink::default()));

    let err = session.start().await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Device(DeviceError::OpenFailed { .. })
    ));
    assert_eq!(session.state(), SessionState::Idle);
    assert!(matches!(session.stop().await.unwrap(), Transition::AlreadyIdle));
}

#[tokio::test]
async fn no_reports_after_stop_returns() {
    let opener = Arc::new(ScriptedOpener::new(vec![tcp_frame(7, 64)], Tail::RepeatLast));
    let sink = Arc::new(MemorySink::default());
    let mut session = session(opener.clone(), sink.clone());

    session.start().await.unwrap();
    wait_until(|| sink.len() >= 3).await;
    session.stop().await.unwrap();

    let emitted = sink.len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(sink.len(), emitted);
    assert_eq!(opener.handles_open(), 0);

    let summary = session.last_summary().unwrap();
    assert_eq!(summary.metrics.packet_count as usize, emitted);
    // the same frame over and over: everything after the first is a repeat
    assert_eq!(summary.metrics.retransmitted_packets as usize, emitted - 1);
}

#[tokio::test]
async fn restart_begins_with_fresh_metrics() {
    let opener = Arc::new(ScriptedOpener::new(vec![tcp_frame(7, 64)], Tail::RepeatLast));
    let sink = Arc::new(MemorySink::default());
    let mut session = session(opener, sink.clone());

    session.start().await.unwrap();
    wait_until(|| sink.len() >= 3).await;
    session.stop().await.unwrap();
    let first_run = sink.len();

    let second = match session.start().await.unwrap() {
        Transition::Started(id) => id,
        other => panic!("unexpected transition {:?}", other),
    };
    wait_until(|| sink.len() > first_run).await;
    session.stop().await.unwrap();

    let reports = sink.reports();
    let first_of_second = &reports[first_run];
    assert_eq!(first_of_second.session_id, second);
    assert_eq!(first_of_second.packet_index, 1);
    assert_eq!(first_of_second.retransmitted_packets, 0);
    assert!(!first_of_second.is_retransmission);
}

#[tokio::test]
async fn source_ending_returns_the_session_to_idle() {
    let frames = vec![tcp_frame(1, 64), tcp_frame(2, 64)];
    let opener = Arc::new(ScriptedOpener::new(frames, Tail::End));
    let sink = Arc::new(MemorySink::default());
    let mut session = session(opener.clone(), sink.clone());

    let id = match session.start().await.unwrap() {
        Transition::Started(id) => id,
        other => panic!("unexpected transition {:?}", other),
    };
    wait_until(|| session.state() == SessionState::Idle).await;

    // no command has been issued since start: the summary is already there
    assert!(session.active_session_id().is_none());
    assert_eq!(opener.handles_open(), 0);
    let summary = session.last_summary().unwrap();
    assert_eq!(summary.id, id);
    assert_eq!(summary.end, DeliveryEnd::SourceEnded);
    assert_eq!(summary.metrics.packet_count, 2);
    assert_eq!(sink.len(), 2);

    assert!(matches!(session.stop().await.unwrap(), Transition::AlreadyIdle));
    assert_eq!(session.last_summary().unwrap().id, id);

    // a new start opens a fresh handle
    assert!(matches!(session.start().await.unwrap(), Transition::Started(_)));
    session.stop().await.unwrap();
}

#[tokio::test]
async fn throughput_reported_one_second_into_the_session() {
    let opener = ScriptedOpener::new(vec![tcp_frame(1, 100)], Tail::Idle)
        .with_clock_offset(chrono::Duration::seconds(1));
    let sink = Arc::new(MemorySink::default());
    let mut session = session(Arc::new(opener), sink.clone());

    session.start().await.unwrap();
    wait_until(|| sink.len() == 1).await;
    session.stop().await.unwrap();

    let report = &sink.reports()[0];
    assert_eq!(report.packet_index, 1);
    assert_eq!(report.frame_length, 100);
    assert_eq!(report.retransmitted_packets, 0);
    let mbps = report.throughput_mbps.unwrap();
    // elapsed is one second plus scheduling delay
    assert!(mbps <= 0.0008 && mbps > 0.0008 * 0.9, "got {}", mbps);
}

#[tokio::test]
async fn summary_replaces_the_previous_one_on_each_end() {
    let opener = Arc::new(ScriptedOpener::new(vec![tcp_frame(1, 64)], Tail::End));
    let sink = Arc::new(MemorySink::default());
    let mut session = session(opener.clone(), sink.clone());
    assert!(session.last_summary().is_none());

    let first = match session.start().await.unwrap() {
        Transition::Started(id) => id,
        other => panic!("unexpected transition {:?}", other),
    };
    wait_until(|| session.state() == SessionState::Idle).await;
    assert_eq!(session.last_summary().unwrap().id, first);

    // the finished worker is reaped by the next start
    let second = match session.start().await.unwrap() {
        Transition::Started(id) => id,
        other => panic!("unexpected transition {:?}", other),
    };
    wait_until(|| session.state() == SessionState::Idle).await;
    let summary = session.last_summary().unwrap();
    assert_eq!(summary.id, second);
    assert_eq!(summary.metrics.packet_count, 1);
    assert_eq!(opener.handles_open(), 0);
}
