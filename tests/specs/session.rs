// SPDX-License-Identifier: MIT

//! Session fan-out end to end (spec scenario: two subscribers, one exit).

use super::support::sh_manager;
use el_core::{SessionEvent, SessionStatus};
use el_daemon::session::StartOptions;
use std::time::Duration;

async fn drain(sub: &mut el_daemon::session::StreamSubscription) -> (Vec<String>, Option<(Option<i32>, Option<i32>)>) {
    let mut msg_ids = Vec::new();
    let mut exit = None;
    loop {
        match sub.receiver.recv().await {
            Some(SessionEvent::Agent(e)) => msg_ids.push(e.msg_id),
            Some(SessionEvent::Exit { code, signal }) => {
                exit = Some((code, signal));
                break;
            }
            Some(SessionEvent::Overflow { .. }) => {}
            None => break,
        }
    }
    (msg_ids, exit)
}

#[tokio::test]
async fn fan_out_delivers_prefix_extension_to_late_subscriber() {
    let (manager, engine, agent, _dir) = sh_manager();

    // Three spaced events, then a clean exit.
    let script = r#"
        sleep 0.2; echo '{"type":"assistant","message":"one"}'
        sleep 0.4; echo '{"type":"assistant","message":"two"}'
        sleep 0.2; echo '{"type":"assistant","message":"three"}'
    "#;
    let record = manager
        .start_session(
            agent.as_str(),
            StartOptions { initial_prompt: Some(script.to_string()), ..Default::default() },
        )
        .await
        .unwrap();

    // A connects immediately; B connects after the first event.
    let mut sub_a = manager.subscribe(agent.as_str()).unwrap();
    assert_eq!(sub_a.initial_prompt.as_deref(), Some(script));

    tokio::time::sleep(Duration::from_millis(400)).await;
    let mut sub_b = manager.subscribe(agent.as_str()).unwrap();
    // The cached initial prompt is still available to late joiners.
    assert_eq!(sub_b.initial_prompt.as_deref(), Some(script));

    let (ids_a, exit_a) = drain(&mut sub_a).await;
    let (ids_b, exit_b) = drain(&mut sub_b).await;

    // Both saw the same clean exit, exactly once.
    assert_eq!(exit_a, Some((Some(0), None)));
    assert_eq!(exit_b, Some((Some(0), None)));

    // A saw everything; B saw a suffix; B's sequence is A's tail.
    assert!(ids_a.len() >= ids_b.len());
    assert!(!ids_b.is_empty(), "late subscriber saw no events");
    assert_eq!(&ids_a[ids_a.len() - ids_b.len()..], ids_b.as_slice());

    // The session record reflects the exit.
    for _ in 0..100 {
        if let Some(rec) = engine.session(record.id.as_str()) {
            if rec.status == SessionStatus::Terminated {
                assert_eq!(rec.exit_code, Some(0));
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("session never terminated");
}

#[tokio::test]
async fn messages_endpoint_resumes_after_msg_id() {
    let (manager, engine, agent, _dir) = sh_manager();
    let script = r#"echo '{"type":"assistant","message":"a"}'; echo '{"type":"assistant","message":"b"}'"#;
    let record = manager
        .start_session(
            agent.as_str(),
            StartOptions { initial_prompt: Some(script.to_string()), ..Default::default() },
        )
        .await
        .unwrap();

    for _ in 0..100 {
        if engine
            .session(record.id.as_str())
            .map(|r| r.status == SessionStatus::Terminated)
            .unwrap_or(false)
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let all = engine.session_messages(record.id.as_str(), None);
    assert!(all.len() >= 3, "prompt + two assistant lines expected, got {}", all.len());

    // Resume after the first id: everything strictly later comes back.
    let after = engine.session_messages(record.id.as_str(), Some(&all[0].id));
    assert_eq!(after.len(), all.len() - 1);
    assert_eq!(after.first().map(|m| m.id.clone()), Some(all[1].id.clone()));
}
