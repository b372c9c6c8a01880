use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::seq::IteratorRandom;
use truths_types::{Guess, STATEMENTS_PER_SET, Statement, User};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// A user eligible to be guessed against, with one full statement set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opponent {
    pub user: User,
    pub statements: Vec<Statement>,
}

/// Persistence consumed by the engine and the presenter.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Creates the user on first sight, otherwise refreshes the username.
    async fn upsert_user(&self, identity: &str, display_name: &str) -> StoreResult<User>;

    /// Stores the first two texts as truths and the third as the lie.
    async fn create_statements(
        &self,
        user_id: &str,
        truth1: &str,
        truth2: &str,
        lie: &str,
    ) -> StoreResult<Vec<Statement>>;

    /// Picks a random user other than `excluding_user_id` who owns at least
    /// three statements and returns their most recent set.
    async fn find_opponent_with_statements(
        &self,
        excluding_user_id: &str,
    ) -> StoreResult<Option<Opponent>>;

    /// Records a guess and, when it hits the lie, atomically adds the points
    /// to the guesser's total.
    async fn record_guess(&self, user_id: &str, statement_id: &str) -> StoreResult<Guess>;

    /// Users ordered by points descending, ties broken by id.
    async fn top_users(&self, limit: u64) -> StoreResult<Vec<User>>;
}

/// Rejects statement sets with blank entries.
pub fn validate_statement_texts(texts: &[&str]) -> StoreResult<()> {
    if texts.len() != STATEMENTS_PER_SET {
        return Err(StoreError::InvalidStatements {
            reason: format!("expected {} statements, got {}", STATEMENTS_PER_SET, texts.len()),
        });
    }
    if let Some(position) = texts.iter().position(|text| text.trim().is_empty()) {
        return Err(StoreError::InvalidStatements {
            reason: format!("statement {} is empty", position + 1),
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct StoredStatement {
    statement: Statement,
    set: u64,
}

#[derive(Debug, Default)]
struct MemoryInner {
    users: BTreeMap<String, User>,
    statements: Vec<StoredStatement>,
    guesses: Vec<Guess>,
    next_set: u64,
}

/// Process-local store used by tests and by the server's memory mode.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, MemoryInner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("memory store lock poisoned")))
    }

    pub fn statements_for(&self, user_id: &str) -> Vec<Statement> {
        self.lock()
            .map(|inner| {
                inner
                    .statements
                    .iter()
                    .filter(|stored| stored.statement.user_id == user_id)
                    .map(|stored| stored.statement.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn guesses_for(&self, user_id: &str) -> Vec<Guess> {
        self.lock()
            .map(|inner| {
                inner
                    .guesses
                    .iter()
                    .filter(|guess| guess.user_id == user_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find_user(&self, user_id: &str) -> Option<User> {
        self.lock().ok()?.users.get(user_id).cloned()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn upsert_user(&self, identity: &str, display_name: &str) -> StoreResult<User> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .entry(identity.to_string())
            .and_modify(|user| user.username = display_name.to_string())
            .or_insert_with(|| User::new(identity, display_name));
        Ok(user.clone())
    }

    async fn create_statements(
        &self,
        user_id: &str,
        truth1: &str,
        truth2: &str,
        lie: &str,
    ) -> StoreResult<Vec<Statement>> {
        validate_statement_texts(&[truth1, truth2, lie])?;

        let mut inner = self.lock()?;
        if !inner.users.contains_key(user_id) {
            return Err(StoreError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }

        if inner.statements.iter().any(|stored| stored.statement.user_id == user_id) {
            tracing::warn!("User {} already has statements; the new set replaces them", user_id);
        }

        let set = inner.next_set;
        inner.next_set += 1;

        let created: Vec<Statement> = [(truth1, false), (truth2, false), (lie, true)]
            .into_iter()
            .map(|(text, is_lie)| Statement {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                text: text.to_string(),
                is_lie,
            })
            .collect();

        inner.statements.extend(created.iter().cloned().map(|statement| StoredStatement {
            statement,
            set,
        }));

        Ok(created)
    }

    async fn find_opponent_with_statements(
        &self,
        excluding_user_id: &str,
    ) -> StoreResult<Option<Opponent>> {
        let inner = self.lock()?;

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for stored in &inner.statements {
            *counts.entry(stored.statement.user_id.as_str()).or_default() += 1;
        }

        let chosen = counts
            .into_iter()
            .filter(|(user_id, count)| *user_id != excluding_user_id && *count >= STATEMENTS_PER_SET)
            .map(|(user_id, _)| user_id)
            .choose(&mut rand::thread_rng());

        let Some(user_id) = chosen else {
            return Ok(None);
        };

        let Some(user) = inner.users.get(user_id).cloned() else {
            return Ok(None);
        };

        let latest_set = inner
            .statements
            .iter()
            .filter(|stored| stored.statement.user_id == user_id)
            .map(|stored| stored.set)
            .max();

        let statements = inner
            .statements
            .iter()
            .filter(|stored| stored.statement.user_id == user_id && Some(stored.set) == latest_set)
            .map(|stored| stored.statement.clone())
            .collect();

        Ok(Some(Opponent { user, statements }))
    }

    async fn record_guess(&self, user_id: &str, statement_id: &str) -> StoreResult<Guess> {
        let mut inner = self.lock()?;

        let is_correct = inner
            .statements
            .iter()
            .find(|stored| stored.statement.id == statement_id)
            .map(|stored| stored.statement.is_lie)
            .ok_or_else(|| StoreError::StatementNotFound {
                statement_id: statement_id.to_string(),
            })?;

        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        let guess = Guess {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            statement_id: statement_id.to_string(),
            is_correct,
            points_earned: Guess::points_for(is_correct),
        };

        user.total_points += guess.points_earned;
        inner.guesses.push(guess.clone());

        Ok(guess)
    }

    async fn top_users(&self, limit: u64) -> StoreResult<Vec<User>> {
        let inner = self.lock()?;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| b.total_points.cmp(&a.total_points).then_with(|| a.id.cmp(&b.id)));
        users.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn store_with_opponent() -> (MemoryStore, Vec<Statement>) {
        let store = MemoryStore::new();
        store.upsert_user("1", "guesser").await.unwrap();
        store.upsert_user("2", "opponent").await.unwrap();
        let statements = store
            .create_statements("2", "I climbed Fuji", "I speak Welsh", "I own a tiger")
            .await
            .unwrap();
        (store, statements)
    }

    #[tokio::test]
    async fn test_upsert_refreshes_username() {
        let store = MemoryStore::new();
        store.upsert_user("1", "old").await.unwrap();
        let user = store.upsert_user("1", "new").await.unwrap();

        assert_eq!(user.username, "new");
        assert_eq!(store.top_users(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_statements_marks_third_as_lie() {
        let (_store, statements) = store_with_opponent().await;

        let flags: Vec<bool> = statements.iter().map(|s| s.is_lie).collect();
        assert_eq!(flags, vec![false, false, true]);
        assert_eq!(statements[2].text, "I own a tiger");
    }

    #[tokio::test]
    async fn test_create_statements_rejects_blank_text() {
        let store = MemoryStore::new();
        store.upsert_user("1", "guesser").await.unwrap();

        let result = store.create_statements("1", "a", "  ", "c").await;
        assert!(matches!(result, Err(StoreError::InvalidStatements { .. })));
        assert!(store.statements_for("1").is_empty());
    }

    #[tokio::test]
    async fn test_opponent_excludes_self_and_incomplete_users() {
        let store = MemoryStore::new();
        store.upsert_user("1", "guesser").await.unwrap();
        store.create_statements("1", "a", "b", "c").await.unwrap();

        assert_eq!(store.find_opponent_with_statements("1").await.unwrap(), None);

        store.upsert_user("2", "nobody").await.unwrap();
        assert_eq!(store.find_opponent_with_statements("1").await.unwrap(), None);

        let opponent = store.find_opponent_with_statements("2").await.unwrap().unwrap();
        assert_eq!(opponent.user.id, "1");
        assert_eq!(opponent.statements.len(), 3);
    }

    #[tokio::test]
    async fn test_opponent_uses_latest_statement_set() {
        let (store, _) = store_with_opponent().await;
        let second = store
            .create_statements("2", "New truth", "Another truth", "New lie")
            .await
            .unwrap();

        let opponent = store.find_opponent_with_statements("1").await.unwrap().unwrap();
        assert_eq!(opponent.statements, second);
    }

    #[tokio::test]
    async fn test_record_guess_scores_only_the_lie() {
        let (store, statements) = store_with_opponent().await;

        let miss = store.record_guess("1", &statements[0].id).await.unwrap();
        assert!(!miss.is_correct);
        assert_eq!(miss.points_earned, 0);
        assert_eq!(store.find_user("1").unwrap().total_points, 0);

        let hit = store.record_guess("1", &statements[2].id).await.unwrap();
        assert!(hit.is_correct);
        assert_eq!(hit.points_earned, 100);
        assert_eq!(store.find_user("1").unwrap().total_points, 100);
        assert_eq!(store.guesses_for("1").len(), 2);
    }

    #[tokio::test]
    async fn test_record_guess_unknown_statement() {
        let (store, _) = store_with_opponent().await;
        let result = store.record_guess("1", "missing").await;
        assert!(matches!(result, Err(StoreError::StatementNotFound { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_correct_guesses_are_not_lost() {
        let (store, statements) = store_with_opponent().await;
        let store = Arc::new(store);
        let lie_id = statements[2].id.clone();

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                let lie_id = lie_id.clone();
                tokio::spawn(async move { store.record_guess("1", &lie_id).await })
            })
            .collect();

        for handle in futures_util::future::join_all(handles).await {
            handle.unwrap().unwrap();
        }

        assert_eq!(store.find_user("1").unwrap().total_points, 2000);
    }

    #[tokio::test]
    async fn test_top_users_order_and_limit() {
        let (store, statements) = store_with_opponent().await;
        store.upsert_user("3", "third").await.unwrap();
        store.record_guess("3", &statements[2].id).await.unwrap();
        store.record_guess("3", &statements[2].id).await.unwrap();
        store.record_guess("1", &statements[2].id).await.unwrap();

        let top = store.top_users(2).await.unwrap();
        let ids: Vec<&str> = top.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
    }
}
