use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{guesses, prelude::*, users};
use truths_types::Guess;

#[derive(Clone)]
pub struct GuessRepository {
    db: DatabaseConnection,
}

impl GuessRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_guess(model: guesses::Model) -> Guess {
        Guess {
            id: model.id,
            user_id: model.user_id,
            statement_id: model.statement_id,
            is_correct: model.is_correct,
            points_earned: model.points_earned,
        }
    }

    /// Stores the guess and credits the points in one transaction.
    ///
    /// Correctness comes from the stored statement. The total is bumped with
    /// `total_points = total_points + n` so concurrent guesses cannot overwrite
    /// each other. Returns `None` when the statement does not exist.
    pub async fn record_guess(&self, user_id: &str, statement_id: &str) -> Result<Option<Guess>> {
        let txn = self.db.begin().await?;

        let Some(statement) = Statements::find_by_id(statement_id.to_string())
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(None);
        };

        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let guess = Guess {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            statement_id: statement.id,
            is_correct: statement.is_lie,
            points_earned: Guess::points_for(statement.is_lie),
        };

        let guess_model = guesses::ActiveModel {
            id: Set(guess.id.clone()),
            user_id: Set(guess.user_id.clone()),
            statement_id: Set(guess.statement_id.clone()),
            is_correct: Set(guess.is_correct),
            points_earned: Set(guess.points_earned),
            created_at: Set(now),
        };
        Guesses::insert(guess_model).exec(&txn).await?;

        if guess.points_earned > 0 {
            Users::update_many()
                .col_expr(
                    users::Column::TotalPoints,
                    Expr::col(users::Column::TotalPoints).add(guess.points_earned),
                )
                .col_expr(users::Column::UpdatedAt, Expr::value(now))
                .filter(users::Column::Id.eq(user_id))
                .exec(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(Some(guess))
    }

    pub async fn find_by_user(&self, user_id: &str) -> Result<Vec<Guess>> {
        let models = Guesses::find()
            .filter(guesses::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Self::model_to_guess).collect())
    }
}
