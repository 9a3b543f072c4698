//! End-to-end: assignment workflow publishing into the dispatcher.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use trackr_config::NotifyConfig;
use trackr_core::entities::{Issue, User};
use trackr_core::enums::MemberRole;
use trackr_db::TrackrDb;
use trackr_db::repos::issue::NewIssue;
use trackr_db::service::TrackrService;
use trackr_notify::{Dispatcher, MailTransport, OutgoingMessage, TransportError};

#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl Outbox {
    fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for Outbox {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

struct Setup {
    svc: TrackrService,
    dispatcher: Arc<Dispatcher>,
    outbox: Arc<Outbox>,
    lead: User,
    alice: User,
    bob: User,
    carol: User,
    issue: Issue,
}

async fn setup() -> Setup {
    let config = NotifyConfig {
        base_delay_ms: 1,
        max_delay_ms: 5,
        ..NotifyConfig::default()
    };
    let outbox = Arc::new(Outbox::default());
    let dispatcher = Arc::new(Dispatcher::start(&config, outbox.clone()));

    let db = TrackrDb::open_local(":memory:").await.unwrap();
    let svc = TrackrService::from_db(db, dispatcher.clone());

    let project = svc.create_project("PROJ", "Payments").await.unwrap();
    let lead = svc.create_user("Lee", Some("lee@example.com")).await.unwrap();
    let alice = svc.create_user("Alice", Some("alice@example.com")).await.unwrap();
    let bob = svc.create_user("Bob", Some("bob@example.com")).await.unwrap();
    let carol = svc.create_user("Carol", None).await.unwrap();
    svc.add_member(&project.id, &lead.id, MemberRole::ProjectLeader)
        .await
        .unwrap();
    for user in [&alice, &bob, &carol] {
        svc.add_member(&project.id, &user.id, MemberRole::Member)
            .await
            .unwrap();
    }
    let issue = svc
        .create_issue(&lead.id, &project.id, NewIssue::new("Checkout button unresponsive"))
        .await
        .unwrap()
        .data;

    Setup {
        svc,
        dispatcher,
        outbox,
        lead,
        alice,
        bob,
        carol,
        issue,
    }
}

/// Wait until `count` messages went out and `key` has been released.
async fn wait_until_delivered(s: &Setup, key: &str, count: usize) {
    for _ in 0..200 {
        if s.outbox.sent().len() >= count && s.dispatcher.job(key).is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job {key} was not delivered");
}

#[tokio::test]
async fn assignment_lifecycle_sends_expected_mail() {
    let s = setup().await;
    let issue_id = s.issue.id.clone();

    s.svc
        .assign_issue(&s.lead.id, &issue_id, &s.alice.id, None)
        .await
        .unwrap();
    s.svc
        .reassign_issue(&s.lead.id, &issue_id, &s.bob.id, Some("Alice is on leave"), None)
        .await
        .unwrap();
    s.svc
        .unassign_issue(&s.lead.id, &issue_id, None, None)
        .await
        .unwrap();
    s.dispatcher.shutdown().await;

    assert!(s.dispatcher.jobs().is_empty(), "delivered jobs are not retained");

    let sent = s.outbox.sent();
    let mut delivered: Vec<(&str, &str)> = sent
        .iter()
        .map(|m| (m.to.as_str(), m.subject.split(':').next().unwrap_or_default()))
        .collect();
    delivered.sort_unstable();
    assert_eq!(
        delivered,
        vec![
            ("alice@example.com", "Issue Reassigned"),
            ("alice@example.com", "New Issue Assigned"),
            ("bob@example.com", "Issue Unassigned"),
            ("bob@example.com", "New Issue Assigned"),
        ]
    );
    let to_alice: Vec<&str> = sent
        .iter()
        .filter(|m| m.to == "alice@example.com")
        .map(|m| m.subject.as_str())
        .collect();
    assert!(to_alice.contains(&"New Issue Assigned: Checkout button unresponsive"));
    assert!(to_alice.contains(&"Issue Reassigned: Checkout button unresponsive"));
    let old_assignee = sent
        .iter()
        .find(|m| m.subject.starts_with("Issue Reassigned"))
        .unwrap();
    assert!(old_assignee.html.contains("<strong>New Assignee:</strong> Bob"));
    assert!(old_assignee.html.contains("Alice is on leave"));
}

#[tokio::test]
async fn assignee_without_email_gets_no_job() {
    let s = setup().await;

    s.svc
        .assign_issue(&s.lead.id, &s.issue.id, &s.carol.id, None)
        .await
        .unwrap();
    s.dispatcher.shutdown().await;

    assert!(s.dispatcher.jobs().is_empty());
    assert!(s.outbox.sent().is_empty());
}

#[tokio::test]
async fn delivered_key_is_reused_by_a_later_assignment() {
    let s = setup().await;
    let issue_id = s.issue.id.clone();
    let alice_key = format!("notify-assignee-{issue_id}-{}", s.alice.id);

    s.svc
        .assign_issue(&s.lead.id, &issue_id, &s.alice.id, None)
        .await
        .unwrap();
    wait_until_delivered(&s, &alice_key, 1).await;

    s.svc
        .unassign_issue(&s.lead.id, &issue_id, None, None)
        .await
        .unwrap();
    s.svc
        .assign_issue(&s.lead.id, &issue_id, &s.alice.id, None)
        .await
        .unwrap();
    s.dispatcher.shutdown().await;

    let assigned_to_alice = s
        .outbox
        .sent()
        .iter()
        .filter(|m| m.subject.starts_with("New Issue Assigned") && m.to == "alice@example.com")
        .count();
    assert_eq!(assigned_to_alice, 2);
}

#[tokio::test]
async fn workflow_survives_a_closed_dispatcher() {
    let s = setup().await;
    s.dispatcher.shutdown().await;

    let issue = s
        .svc
        .assign_issue(&s.lead.id, &s.issue.id, &s.alice.id, None)
        .await
        .unwrap()
        .data;

    assert_eq!(issue.assignee_id.as_deref(), Some(s.alice.id.as_str()));
    assert!(s.outbox.sent().is_empty());
}
