//! Row-level SQL shared by the team and pull request stores.
//!
//! Every function runs on a connection that is already inside a transaction
//! opened by the calling store, so several of them compose into one atomic
//! unit of work.

use chrono::{DateTime, Utc};
use diesel::OptionalExtension;
use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Bool, Nullable, Text};
use diesel::sqlite::SqliteConnection;

use crate::review::model::{
    NewPullRequest, PullRequest, PullRequestStatus, PullRequestWithReviewers, User,
};

use super::error::is_unique_violation;
use super::{PersistenceError, StoreError};

#[derive(Debug, QueryableByName)]
struct UserRow {
    #[diesel(sql_type = Text)]
    user_id: String,
    #[diesel(sql_type = Text)]
    username: String,
    #[diesel(sql_type = Text)]
    team_name: String,
    #[diesel(sql_type = Bool)]
    is_active: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.user_id,
            username: row.username,
            team_name: row.team_name,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, QueryableByName)]
struct PullRequestRow {
    #[diesel(sql_type = Text)]
    pull_request_id: String,
    #[diesel(sql_type = Text)]
    pull_request_name: String,
    #[diesel(sql_type = Text)]
    author_id: String,
    #[diesel(sql_type = Text)]
    status: String,
    #[diesel(sql_type = BigInt)]
    created_at: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    merged_at: Option<i64>,
}

impl TryFrom<PullRequestRow> for PullRequest {
    type Error = PersistenceError;

    fn try_from(row: PullRequestRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<PullRequestStatus>()
            .map_err(|error| PersistenceError::CorruptRow {
                message: format!("pull request {}: {error}", row.pull_request_id),
            })?;
        let created_at = timestamp_from_millis(row.created_at)?;
        let merged_at = row.merged_at.map(timestamp_from_millis).transpose()?;

        Ok(Self {
            id: row.pull_request_id,
            name: row.pull_request_name,
            author_id: row.author_id,
            status,
            created_at,
            merged_at,
        })
    }
}

#[derive(Debug, QueryableByName)]
struct ReviewerRow {
    #[diesel(sql_type = Text)]
    user_id: String,
}

/// Converts stored unix milliseconds into a UTC timestamp.
fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| PersistenceError::CorruptRow {
        message: format!("timestamp {millis} is out of range"),
    })
}

fn expect_affected(affected: usize, expected: usize, statement: &str) -> Result<(), StoreError> {
    if affected == expected {
        return Ok(());
    }
    Err(PersistenceError::WriteFailed {
        message: format!("{statement}: expected to touch {expected} row(s) but touched {affected}"),
    }
    .into())
}

pub(super) fn team_exists(
    connection: &mut SqliteConnection,
    team_name: &str,
) -> Result<bool, StoreError> {
    #[derive(Debug, QueryableByName)]
    struct Row {
        #[diesel(sql_type = Text)]
        team_name: String,
    }

    let found: Option<Row> = sql_query("SELECT team_name FROM teams WHERE team_name = ? LIMIT 1;")
        .bind::<Text, _>(team_name)
        .get_result(connection)
        .optional()?;

    Ok(found.is_some_and(|row| row.team_name == team_name))
}

pub(super) fn insert_team(
    connection: &mut SqliteConnection,
    team_name: &str,
) -> Result<(), StoreError> {
    sql_query("INSERT INTO teams (team_name) VALUES (?);")
        .bind::<Text, _>(team_name)
        .execute(connection)
        .map_err(|error| {
            if is_unique_violation(&error) {
                StoreError::TeamAlreadyExists
            } else {
                StoreError::from(error)
            }
        })
        .and_then(|affected| expect_affected(affected, 1, "insert team"))
}

pub(super) fn upsert_user(connection: &mut SqliteConnection, user: &User) -> Result<(), StoreError> {
    let affected = sql_query(
        "INSERT INTO users (user_id, username, team_name, is_active) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET \
           username = excluded.username, \
           team_name = excluded.team_name, \
           is_active = excluded.is_active;",
    )
    .bind::<Text, _>(user.id.as_str())
    .bind::<Text, _>(user.username.as_str())
    .bind::<Text, _>(user.team_name.as_str())
    .bind::<Bool, _>(user.is_active)
    .execute(connection)?;

    expect_affected(affected, 1, "upsert user")
}

pub(super) fn find_user(
    connection: &mut SqliteConnection,
    user_id: &str,
) -> Result<User, StoreError> {
    let row: Option<UserRow> = sql_query(
        "SELECT user_id, username, team_name, is_active \
         FROM users WHERE user_id = ? LIMIT 1;",
    )
    .bind::<Text, _>(user_id)
    .get_result(connection)
    .optional()?;

    row.map(User::from).ok_or(StoreError::UserNotFound)
}

pub(super) fn set_user_active(
    connection: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
) -> Result<(), StoreError> {
    let affected = sql_query("UPDATE users SET is_active = ? WHERE user_id = ?;")
        .bind::<Bool, _>(is_active)
        .bind::<Text, _>(user_id)
        .execute(connection)?;

    if affected == 0 {
        return Err(StoreError::UserNotFound);
    }
    expect_affected(affected, 1, "update user activity")
}

/// Users tagged with `team_name`, ordered by identifier.
pub(super) fn team_members(
    connection: &mut SqliteConnection,
    team_name: &str,
) -> Result<Vec<User>, StoreError> {
    let rows: Vec<UserRow> = sql_query(
        "SELECT user_id, username, team_name, is_active \
         FROM users WHERE team_name = ? ORDER BY user_id;",
    )
    .bind::<Text, _>(team_name)
    .load(connection)?;

    Ok(rows.into_iter().map(User::from).collect())
}

pub(super) fn insert_pull_request(
    connection: &mut SqliteConnection,
    request: &NewPullRequest,
    created_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    sql_query(
        "INSERT INTO pull_requests \
         (pull_request_id, pull_request_name, author_id, status, created_at) \
         VALUES (?, ?, ?, ?, ?);",
    )
    .bind::<Text, _>(request.id.as_str())
    .bind::<Text, _>(request.name.as_str())
    .bind::<Text, _>(request.author_id.as_str())
    .bind::<Text, _>(PullRequestStatus::Open.as_str())
    .bind::<BigInt, _>(created_at.timestamp_millis())
    .execute(connection)
    .map_err(|error| {
        if is_unique_violation(&error) {
            StoreError::PullRequestAlreadyExists
        } else {
            StoreError::from(error)
        }
    })
    .and_then(|affected| expect_affected(affected, 1, "insert pull request"))
}

pub(super) fn insert_reviewer(
    connection: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
) -> Result<(), StoreError> {
    let affected =
        sql_query("INSERT INTO pr_reviewers (pull_request_id, user_id) VALUES (?, ?);")
            .bind::<Text, _>(pull_request_id)
            .bind::<Text, _>(reviewer_id)
            .execute(connection)?;

    expect_affected(affected, 1, "insert reviewer")
}

/// Points the `(pull_request_id, old_reviewer_id)` edge at `new_reviewer_id`.
///
/// The edge keeps its row, so the replacement inherits the old reviewer's
/// position in the assignment order.
pub(super) fn replace_reviewer(
    connection: &mut SqliteConnection,
    pull_request_id: &str,
    old_reviewer_id: &str,
    new_reviewer_id: &str,
) -> Result<(), StoreError> {
    let affected = sql_query(
        "UPDATE pr_reviewers SET user_id = ? \
         WHERE pull_request_id = ? AND user_id = ?;",
    )
    .bind::<Text, _>(new_reviewer_id)
    .bind::<Text, _>(pull_request_id)
    .bind::<Text, _>(old_reviewer_id)
    .execute(connection)?;

    expect_affected(affected, 1, "replace reviewer")
}

pub(super) fn remove_reviewer(
    connection: &mut SqliteConnection,
    pull_request_id: &str,
    reviewer_id: &str,
) -> Result<(), StoreError> {
    let affected = sql_query("DELETE FROM pr_reviewers WHERE pull_request_id = ? AND user_id = ?;")
        .bind::<Text, _>(pull_request_id)
        .bind::<Text, _>(reviewer_id)
        .execute(connection)?;

    expect_affected(affected, 1, "remove reviewer")
}

pub(super) fn mark_merged(
    connection: &mut SqliteConnection,
    pull_request_id: &str,
    merged_at: DateTime<Utc>,
) -> Result<(), StoreError> {
    let affected = sql_query(
        "UPDATE pull_requests SET status = ?, merged_at = ? \
         WHERE pull_request_id = ? AND status = ?;",
    )
    .bind::<Text, _>(PullRequestStatus::Merged.as_str())
    .bind::<BigInt, _>(merged_at.timestamp_millis())
    .bind::<Text, _>(pull_request_id)
    .bind::<Text, _>(PullRequestStatus::Open.as_str())
    .execute(connection)?;

    expect_affected(affected, 1, "merge pull request")
}

fn find_pull_request(
    connection: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Option<PullRequest>, StoreError> {
    let row: Option<PullRequestRow> = sql_query(
        "SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at \
         FROM pull_requests WHERE pull_request_id = ? LIMIT 1;",
    )
    .bind::<Text, _>(pull_request_id)
    .get_result(connection)
    .optional()?;

    row.map(PullRequest::try_from)
        .transpose()
        .map_err(StoreError::from)
}

/// Reviewer identifiers of a pull request in assignment order.
fn reviewers_of(
    connection: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<Vec<String>, StoreError> {
    let rows: Vec<ReviewerRow> =
        sql_query("SELECT user_id FROM pr_reviewers WHERE pull_request_id = ? ORDER BY rowid;")
            .bind::<Text, _>(pull_request_id)
            .load(connection)?;

    Ok(rows.into_iter().map(|row| row.user_id).collect())
}

pub(super) fn load_pull_request(
    connection: &mut SqliteConnection,
    pull_request_id: &str,
) -> Result<PullRequestWithReviewers, StoreError> {
    let pull_request =
        find_pull_request(connection, pull_request_id)?.ok_or(StoreError::PullRequestNotFound)?;
    let assigned_reviewers = reviewers_of(connection, pull_request_id)?;

    Ok(PullRequestWithReviewers {
        pull_request,
        assigned_reviewers,
    })
}

/// Pull requests on which `user_id` is a reviewer, newest first.
pub(super) fn pull_requests_reviewed_by(
    connection: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<PullRequest>, StoreError> {
    let rows: Vec<PullRequestRow> = sql_query(
        "SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status, \
                pr.created_at, pr.merged_at \
         FROM pull_requests pr \
         JOIN pr_reviewers r ON r.pull_request_id = pr.pull_request_id \
         WHERE r.user_id = ? \
         ORDER BY pr.created_at DESC, pr.pull_request_id;",
    )
    .bind::<Text, _>(user_id)
    .load(connection)?;

    rows.into_iter()
        .map(|row| PullRequest::try_from(row).map_err(StoreError::from))
        .collect()
}

/// Raw counters behind [`crate::review::model::TeamStats`].
#[derive(Debug, QueryableByName)]
pub(super) struct TeamCountsRow {
    #[diesel(sql_type = BigInt)]
    pub(super) active_users: i64,
    #[diesel(sql_type = BigInt)]
    pub(super) inactive_users: i64,
    #[diesel(sql_type = BigInt)]
    pub(super) open_pull_requests: i64,
    #[diesel(sql_type = BigInt)]
    pub(super) merged_pull_requests: i64,
}

pub(super) fn team_counts(
    connection: &mut SqliteConnection,
    team_name: &str,
) -> Result<TeamCountsRow, StoreError> {
    let row = sql_query(
        "SELECT \
           (SELECT COUNT(*) FROM users WHERE team_name = ?1 AND is_active = 1) \
             AS active_users, \
           (SELECT COUNT(*) FROM users WHERE team_name = ?1 AND is_active = 0) \
             AS inactive_users, \
           (SELECT COUNT(*) FROM pull_requests pr JOIN users u ON u.user_id = pr.author_id \
             WHERE u.team_name = ?1 AND pr.status = 'OPEN') AS open_pull_requests, \
           (SELECT COUNT(*) FROM pull_requests pr JOIN users u ON u.user_id = pr.author_id \
             WHERE u.team_name = ?1 AND pr.status = 'MERGED') AS merged_pull_requests;",
    )
    .bind::<Text, _>(team_name)
    .get_result(connection)?;

    Ok(row)
}
