//! Shared test utilities for trackr-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use trackr_core::entities::{Project, User};
    use trackr_core::enums::MemberRole;
    use trackr_core::errors::CoreError;
    use trackr_core::events::{EventSink, IssueEvent};

    use crate::TrackrDb;
    use crate::service::TrackrService;

    /// Event sink that keeps everything it is handed.
    #[derive(Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<IssueEvent>>,
        fail_next: AtomicBool,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<IssueEvent> {
            self.events.lock().unwrap().clone()
        }

        /// Reject the next publish, as a stopped dispatcher would.
        pub fn fail_next(&self) {
            self.fail_next.store(true, Ordering::SeqCst);
        }
    }

    impl EventSink for RecordingSink {
        fn publish(&self, event: IssueEvent) -> Result<(), CoreError> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(CoreError::Other(anyhow::anyhow!("sink closed")));
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    /// A project with a reporter and two active members.
    pub struct Fixture {
        pub project: Project,
        pub reporter: User,
        pub alice: User,
        pub bob: User,
    }

    /// Create an in-memory service recording its events.
    pub async fn test_service() -> (TrackrService, Arc<RecordingSink>) {
        let db = TrackrDb::open_local(":memory:").await.unwrap();
        let sink = Arc::new(RecordingSink::default());
        (TrackrService::from_db(db, sink.clone()), sink)
    }

    /// In-memory service with the `PROJ` project seeded.
    pub async fn seeded_service() -> (TrackrService, Fixture, Arc<RecordingSink>) {
        let (svc, sink) = test_service().await;
        let project = svc.create_project("PROJ", "Payments").await.unwrap();
        let reporter = svc.create_user("Riley", None).await.unwrap();
        let alice = svc
            .create_user("Alice", Some("alice@example.com"))
            .await
            .unwrap();
        let bob = svc.create_user("Bob", Some("bob@example.com")).await.unwrap();
        svc.add_member(&project.id, &reporter.id, MemberRole::ProjectLeader)
            .await
            .unwrap();
        for user in [&alice, &bob] {
            svc.add_member(&project.id, &user.id, MemberRole::Member)
                .await
                .unwrap();
        }
        let fixture = Fixture {
            project,
            reporter,
            alice,
            bob,
        };
        (svc, fixture, sink)
    }
}
