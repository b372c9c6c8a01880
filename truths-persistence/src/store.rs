use async_trait::async_trait;
use rand::seq::SliceRandom;
use sea_orm::DatabaseConnection;
use truths_core::{GameStore, Opponent, StoreError, StoreResult, validate_statement_texts};
use truths_types::{Guess, Statement, User};

use crate::repositories::{GuessRepository, StatementRepository, UserRepository};

/// [`GameStore`] backed by the SQL schema in the `migration` crate.
#[derive(Clone)]
pub struct DatabaseStore {
    users: UserRepository,
    statements: StatementRepository,
    guesses: GuessRepository,
}

impl DatabaseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: UserRepository::new(db.clone()),
            statements: StatementRepository::new(db.clone()),
            guesses: GuessRepository::new(db),
        }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn guesses(&self) -> &GuessRepository {
        &self.guesses
    }

    async fn require_user(&self, user_id: &str) -> StoreResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| StoreError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }
}

#[async_trait]
impl GameStore for DatabaseStore {
    async fn upsert_user(&self, identity: &str, display_name: &str) -> StoreResult<User> {
        Ok(self.users.upsert_user(identity, display_name).await?)
    }

    async fn create_statements(
        &self,
        user_id: &str,
        truth1: &str,
        truth2: &str,
        lie: &str,
    ) -> StoreResult<Vec<Statement>> {
        validate_statement_texts(&[truth1, truth2, lie])?;
        self.require_user(user_id).await?;

        Ok(self
            .statements
            .create_set(user_id, truth1, truth2, lie)
            .await?)
    }

    async fn find_opponent_with_statements(
        &self,
        excluding_user_id: &str,
    ) -> StoreResult<Option<Opponent>> {
        let owners = self.statements.find_eligible_owners(excluding_user_id).await?;
        let Some(owner) = owners.choose(&mut rand::thread_rng()) else {
            return Ok(None);
        };

        let Some(user) = self.users.find_by_id(owner).await? else {
            return Ok(None);
        };
        let statements = self.statements.latest_set(owner).await?;

        Ok(Some(Opponent { user, statements }))
    }

    async fn record_guess(&self, user_id: &str, statement_id: &str) -> StoreResult<Guess> {
        self.require_user(user_id).await?;

        self.guesses
            .record_guess(user_id, statement_id)
            .await?
            .ok_or_else(|| StoreError::StatementNotFound {
                statement_id: statement_id.to_string(),
            })
    }

    async fn top_users(&self, limit: u64) -> StoreResult<Vec<User>> {
        let leaderboard = self.users.get_leaderboard(limit).await?;
        Ok(leaderboard.into_iter().map(|entry| entry.user).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use futures_util::future::join_all;
    use migration::{Migrator, MigratorTrait};
    use std::sync::Arc;

    async fn setup_test_store() -> DatabaseStore {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        DatabaseStore::new(db)
    }

    #[tokio::test]
    async fn test_opponent_needs_three_statements() {
        let store = setup_test_store().await;
        store.upsert_user("1", "guesser").await.unwrap();
        store.upsert_user("2", "author").await.unwrap();

        assert_eq!(store.find_opponent_with_statements("1").await.unwrap(), None);

        store.create_statements("2", "a", "b", "c").await.unwrap();
        let opponent = store.find_opponent_with_statements("1").await.unwrap().unwrap();
        assert_eq!(opponent.user.username, "author");
        assert_eq!(opponent.statements.len(), 3);
        assert!(opponent.statements.iter().all(|s| s.user_id == "2"));
    }

    #[tokio::test]
    async fn test_create_statements_validation() {
        let store = setup_test_store().await;

        let missing = store.create_statements("404", "a", "b", "c").await;
        assert!(matches!(missing, Err(StoreError::UserNotFound { .. })));

        store.upsert_user("1", "guesser").await.unwrap();
        let blank = store.create_statements("1", "a", "", "c").await;
        assert!(matches!(blank, Err(StoreError::InvalidStatements { .. })));
        assert_eq!(store.find_opponent_with_statements("2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_record_guess_errors() {
        let store = setup_test_store().await;
        store.upsert_user("2", "author").await.unwrap();
        let set = store.create_statements("2", "a", "b", "c").await.unwrap();

        let unknown_user = store.record_guess("404", &set[2].id).await;
        assert!(matches!(unknown_user, Err(StoreError::UserNotFound { .. })));

        store.upsert_user("1", "guesser").await.unwrap();
        let unknown_statement = store.record_guess("1", "missing").await;
        assert!(matches!(unknown_statement, Err(StoreError::StatementNotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_correct_guesses_all_count() {
        let store = Arc::new(setup_test_store().await);
        store.upsert_user("1", "guesser").await.unwrap();
        store.upsert_user("2", "author").await.unwrap();
        let set = store.create_statements("2", "a", "b", "c").await.unwrap();
        let lie_id = set[2].id.clone();

        let guesses = (0..10).map(|_| {
            let store = store.clone();
            let lie_id = lie_id.clone();
            async move { store.record_guess("1", &lie_id).await }
        });

        for result in join_all(guesses).await {
            assert!(result.unwrap().is_correct);
        }

        let user = store.users().find_by_id("1").await.unwrap().unwrap();
        assert_eq!(user.total_points, 1000);
        assert_eq!(store.guesses().find_by_user("1").await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_top_users() {
        let store = setup_test_store().await;
        store.upsert_user("2", "author").await.unwrap();
        store.upsert_user("1", "guesser").await.unwrap();
        let set = store.create_statements("2", "a", "b", "c").await.unwrap();
        store.record_guess("1", &set[2].id).await.unwrap();

        let top = store.top_users(10).await.unwrap();
        let names: Vec<&str> = top.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["guesser", "author"]);
        assert_eq!(top[0].total_points, 100);

        assert_eq!(store.top_users(1).await.unwrap().len(), 1);
    }
}
