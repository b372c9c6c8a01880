use anyhow::Result;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue::Set, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect,
};

use crate::entities::{prelude::*, users};
use truths_types::User;

#[derive(Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LeaderboardEntry {
    pub user: User,
    pub rank: u32,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub(crate) fn model_to_user(model: users::Model) -> User {
        User {
            id: model.id,
            username: model.username,
            total_points: model.total_points,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user_model = Users::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(user_model.map(Self::model_to_user))
    }

    /// Inserts the user, or refreshes the username of an existing one.
    /// Points are never touched here.
    pub async fn upsert_user(&self, id: &str, username: &str) -> Result<User> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();

        let user_model = users::ActiveModel {
            id: Set(id.to_string()),
            username: Set(username.to_string()),
            total_points: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Users::insert(user_model)
            .on_conflict(
                OnConflict::column(users::Column::Id)
                    .update_columns([users::Column::Username, users::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        let user = Users::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve upserted user {}", id))?;

        Ok(Self::model_to_user(user))
    }

    /// Highest totals first; equal totals are ordered by id.
    pub async fn get_leaderboard(&self, limit: u64) -> Result<Vec<LeaderboardEntry>> {
        let users = Users::find()
            .order_by_desc(users::Column::TotalPoints)
            .order_by_asc(users::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;

        let leaderboard = users
            .into_iter()
            .enumerate()
            .map(|(index, model)| LeaderboardEntry {
                user: Self::model_to_user(model),
                rank: (index + 1) as u32,
            })
            .collect();

        Ok(leaderboard)
    }
}
