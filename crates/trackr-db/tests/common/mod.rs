//! Helpers shared by the trackr-db integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use trackr_core::entities::{Member, Project, User};
use trackr_core::enums::MemberRole;
use trackr_core::errors::CoreError;
use trackr_core::events::{EventSink, IssueEvent};
use trackr_db::TrackrDb;
use trackr_db::error::DatabaseError;
use trackr_db::oracle::{MembershipOracle, SqlDirectory};
use trackr_db::service::TrackrService;

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<IssueEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<IssueEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: IssueEvent) -> Result<(), CoreError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Membership oracle that suspends once before answering, so that two
/// operations joined on one task both finish their reads before either writes.
pub struct YieldingOracle(pub SqlDirectory);

#[async_trait]
impl MembershipOracle for YieldingOracle {
    async fn active_member(
        &self,
        project_id: &str,
        user_id: &str,
    ) -> Result<Option<Member>, DatabaseError> {
        tokio::task::yield_now().await;
        self.0.active_member(project_id, user_id).await
    }
}

pub struct World {
    pub svc: TrackrService,
    pub sink: Arc<RecordingSink>,
    pub project: Project,
    pub lead: User,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

async fn build(yielding: bool) -> World {
    let db = TrackrDb::open_local(":memory:").await.unwrap();
    let sink = Arc::new(RecordingSink::default());
    let directory = SqlDirectory::new(db.reader());
    let mut svc = TrackrService::from_db(db, sink.clone());
    if yielding {
        svc = svc.with_oracle(Arc::new(YieldingOracle(directory)));
    }

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

    World {
        svc,
        sink,
        project,
        lead,
        alice,
        bob,
        carol,
    }
}

pub async fn world() -> World {
    build(false).await
}

pub async fn yielding_world() -> World {
    build(true).await
}
