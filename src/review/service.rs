//! Async facade over the synchronous lifecycle engine.
//!
//! Diesel's `SQLite` connections block, so every engine call runs on the
//! Tokio blocking pool. Each call carries a [`CancellationToken`] that fires
//! when the caller's future is dropped, so an abandoned write rolls back
//! instead of committing behind the caller's back.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::engine::ReviewEngine;
use super::error::ReviewError;
use super::model::{
    NewPullRequest, NewTeam, PullRequest, PullRequestWithReviewers, TeamStats, TeamWithMembers,
    User,
};
use super::repository::{PullRequestRepository, TeamRepository};

/// Operations offered to the request handling layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Creates a pull request and assigns reviewers.
    async fn create_pull_request(
        &self,
        request: NewPullRequest,
    ) -> Result<PullRequestWithReviewers, ReviewError>;

    /// Merges a pull request idempotently.
    async fn merge_pull_request(
        &self,
        pull_request_id: String,
    ) -> Result<PullRequestWithReviewers, ReviewError>;

    /// Replaces a reviewer and returns the replacement's id.
    async fn reassign_reviewer(
        &self,
        pull_request_id: String,
        old_reviewer_id: String,
    ) -> Result<String, ReviewError>;

    /// Creates a team and upserts its members.
    async fn add_team(&self, team: NewTeam) -> Result<TeamWithMembers, ReviewError>;

    /// Loads a team with its members.
    async fn get_team(&self, team_name: String) -> Result<TeamWithMembers, ReviewError>;

    /// Counts a team's users and pull requests.
    async fn team_stats(&self, team_name: String) -> Result<TeamStats, ReviewError>;

    /// Sets a user's activity flag.
    async fn set_user_active(
        &self,
        user_id: String,
        is_active: bool,
    ) -> Result<User, ReviewError>;

    /// Lists the pull requests a user is reviewing.
    async fn review_assignments(&self, user_id: String) -> Result<Vec<PullRequest>, ReviewError>;
}

/// [`ReviewService`] that runs the engine on `tokio::task::spawn_blocking`.
pub struct BlockingReviewService<Teams, PullRequests> {
    engine: Arc<ReviewEngine<Teams, PullRequests>>,
}

impl<Teams, PullRequests> BlockingReviewService<Teams, PullRequests>
where
    Teams: TeamRepository + 'static,
    PullRequests: PullRequestRepository + 'static,
{
    /// Wraps `engine` for use from async code.
    #[must_use]
    pub fn new(engine: ReviewEngine<Teams, PullRequests>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    async fn run<T, F>(&self, operation: F) -> Result<T, ReviewError>
    where
        T: Send + 'static,
        F: FnOnce(&ReviewEngine<Teams, PullRequests>, &CancellationToken) -> Result<T, ReviewError>
            + Send
            + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let cancellation = CancellationToken::new();
        // Fires if this future is dropped before the blocking task finishes.
        let _cancel_on_drop = cancellation.clone().drop_guard();
        tokio::task::spawn_blocking(move || operation(&engine, &cancellation))
            .await
            .unwrap_or_else(|error| {
                tracing::error!("review task did not complete: {error}");
                Err(ReviewError::Internal)
            })
    }
}

#[async_trait]
impl<Teams, PullRequests> ReviewService for BlockingReviewService<Teams, PullRequests>
where
    Teams: TeamRepository + 'static,
    PullRequests: PullRequestRepository + 'static,
{
    async fn create_pull_request(
        &self,
        request: NewPullRequest,
    ) -> Result<PullRequestWithReviewers, ReviewError> {
        self.run(move |engine, cancellation| engine.create_pull_request(&request, cancellation))
            .await
    }

    async fn merge_pull_request(
        &self,
        pull_request_id: String,
    ) -> Result<PullRequestWithReviewers, ReviewError> {
        self.run(move |engine, cancellation| {
            engine.merge_pull_request(&pull_request_id, cancellation)
        })
            .await
    }

    async fn reassign_reviewer(
        &self,
        pull_request_id: String,
        old_reviewer_id: String,
    ) -> Result<String, ReviewError> {
        self.run(move |engine, cancellation| {
            engine.reassign_reviewer(&pull_request_id, &old_reviewer_id, cancellation)
        })
            .await
    }

    async fn add_team(&self, team: NewTeam) -> Result<TeamWithMembers, ReviewError> {
        self.run(move |engine, cancellation| engine.add_team(&team, cancellation))
            .await
    }

    async fn get_team(&self, team_name: String) -> Result<TeamWithMembers, ReviewError> {
        self.run(move |engine, _| engine.get_team(&team_name)).await
    }

    async fn team_stats(&self, team_name: String) -> Result<TeamStats, ReviewError> {
        self.run(move |engine, _| engine.team_stats(&team_name)).await
    }

    async fn set_user_active(
        &self,
        user_id: String,
        is_active: bool,
    ) -> Result<User, ReviewError> {
        self.run(move |engine, cancellation| {
            engine.set_user_active(&user_id, is_active, cancellation)
        })
            .await
    }

    async fn review_assignments(&self, user_id: String) -> Result<Vec<PullRequest>, ReviewError> {
        self.run(move |engine, _| engine.review_assignments(&user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, mpsc};
    use std::time::Duration;

    use rstest::{fixture, rstest};

    use super::{BlockingReviewService, ReviewService};
    use crate::persistence::{DatabasePool, IN_MEMORY_DATABASE_URL, PullRequestStore, TeamStore};
    use crate::review::engine::ReviewEngine;
    use crate::review::error::ReviewError;
    use crate::review::model::{NewPullRequest, NewTeam, PullRequestStatus, TeamMember};
    use crate::review::policy::ReviewerSelectionPolicy;
    use crate::review::repository::{MockPullRequestRepository, MockTeamRepository};
    use crate::telemetry::NoopTelemetrySink;

    type StoreService = BlockingReviewService<TeamStore, PullRequestStore>;

    #[fixture]
    fn service() -> StoreService {
        let pool =
            DatabasePool::connect(IN_MEMORY_DATABASE_URL, 1).expect("pool should build");
        pool.run_migrations(&NoopTelemetrySink)
            .expect("migrations should run");
        BlockingReviewService::new(ReviewEngine::new(
            TeamStore::new(pool.clone()),
            PullRequestStore::new(pool),
            ReviewerSelectionPolicy::Random,
            Arc::new(NoopTelemetrySink),
        ))
    }

    fn member(id: &str) -> TeamMember {
        TeamMember {
            id: id.to_owned(),
            username: id.to_uppercase(),
            is_active: true,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn lifecycle_runs_through_the_blocking_pool(service: StoreService) {
        service
            .add_team(NewTeam {
                team_name: "pair".to_owned(),
                members: vec![member("u1"), member("u2")],
            })
            .await
            .expect("team should be created");

        let created = service
            .create_pull_request(NewPullRequest {
                id: "pr1".to_owned(),
                name: "Add rota".to_owned(),
                author_id: "u1".to_owned(),
            })
            .await
            .expect("pull request should be created");
        let merged = service
            .merge_pull_request("pr1".to_owned())
            .await
            .expect("merge should succeed");
        let rejected = service
            .reassign_reviewer("pr1".to_owned(), "u2".to_owned())
            .await;

        assert_eq!(created.assigned_reviewers, vec!["u2"]);
        assert_eq!(merged.pull_request.status, PullRequestStatus::Merged);
        assert_eq!(rejected, Err(ReviewError::PullRequestMerged));
        assert_eq!(
            service
                .review_assignments("u2".to_owned())
                .await
                .expect("listing should succeed")
                .len(),
            1
        );
    }

    async fn add_pair(service: &StoreService) {
        service
            .add_team(NewTeam {
                team_name: "pair".to_owned(),
                members: vec![member("u1"), member("u2")],
            })
            .await
            .expect("team should be created");
    }

    fn pr1() -> NewPullRequest {
        NewPullRequest {
            id: "pr1".to_owned(),
            name: "Add rota".to_owned(),
            author_id: "u1".to_owned(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn abandoned_create_rolls_back(service: StoreService) {
        add_pair(&service).await;
        let (release, held) = mpsc::channel::<()>();
        let (report, finished) = mpsc::channel();
        let request = pr1();

        let abandoned = tokio::time::timeout(
            Duration::ZERO,
            service.run(move |engine, cancellation| {
                held.recv().expect("release signal should arrive");
                let outcome = engine.create_pull_request(&request, cancellation);
                report
                    .send(outcome.clone())
                    .expect("outcome should be reported");
                outcome
            }),
        )
        .await;
        assert!(abandoned.is_err(), "caller should have stopped waiting");

        release.send(()).expect("blocking task should be waiting");
        let outcome = finished
            .recv()
            .expect("blocking task should report its outcome");

        assert_eq!(outcome, Err(ReviewError::Internal));
        assert!(
            service
                .review_assignments("u2".to_owned())
                .await
                .expect("listing should succeed")
                .is_empty(),
            "abandoned create must not leave reviewer edges"
        );
        let retried = service
            .create_pull_request(pr1())
            .await
            .expect("retrying the abandoned create should succeed");
        assert_eq!(retried.assigned_reviewers, vec!["u2"]);
    }

    #[tokio::test]
    async fn panicking_operation_becomes_internal() {
        let mut teams = MockTeamRepository::new();
        teams
            .expect_team_with_members()
            .returning(|_| panic!("store exploded"));
        let service = BlockingReviewService::new(ReviewEngine::new(
            teams,
            MockPullRequestRepository::new(),
            ReviewerSelectionPolicy::Random,
            Arc::new(NoopTelemetrySink),
        ));

        assert_eq!(
            service.get_team("core".to_owned()).await,
            Err(ReviewError::Internal)
        );
    }
}
