use anyhow::Result;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use crate::entities::{prelude::*, statements};
use truths_types::{STATEMENTS_PER_SET, Statement};

#[derive(Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
}

impl StatementRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_statement(model: statements::Model) -> Statement {
        Statement {
            id: model.id,
            user_id: model.user_id,
            text: model.text,
            is_lie: model.is_lie,
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Statement>> {
        let model = Statements::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(model.map(Self::model_to_statement))
    }

    /// Appends a new set for `user_id`: the two truths, then the lie.
    /// Earlier sets stay in place so past guesses keep their statement.
    pub async fn create_set(
        &self,
        user_id: &str,
        truth1: &str,
        truth2: &str,
        lie: &str,
    ) -> Result<Vec<Statement>> {
        let txn = self.db.begin().await?;

        let previous = Statements::find()
            .filter(statements::Column::UserId.eq(user_id))
            .order_by_desc(statements::Column::SetNumber)
            .one(&txn)
            .await?;

        let set_number = match previous {
            Some(model) => {
                warn!(
                    "User {} already has statements; set {} replaces set {}",
                    user_id,
                    model.set_number + 1,
                    model.set_number
                );
                model.set_number + 1
            }
            None => 1,
        };

        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let created: Vec<Statement> = [(truth1, false), (truth2, false), (lie, true)]
            .into_iter()
            .map(|(text, is_lie)| Statement {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                text: text.to_string(),
                is_lie,
            })
            .collect();

        let models = created.iter().map(|statement| statements::ActiveModel {
            id: Set(statement.id.clone()),
            user_id: Set(statement.user_id.clone()),
            text: Set(statement.text.clone()),
            is_lie: Set(statement.is_lie),
            set_number: Set(set_number),
            created_at: Set(now),
        });

        Statements::insert_many(models).exec(&txn).await?;
        txn.commit().await?;

        Ok(created)
    }

    /// Owners of at least one full set, other than `excluding_user_id`.
    pub async fn find_eligible_owners(&self, excluding_user_id: &str) -> Result<Vec<String>> {
        let owners = Statements::find()
            .select_only()
            .column(statements::Column::UserId)
            .filter(statements::Column::UserId.ne(excluding_user_id))
            .group_by(statements::Column::UserId)
            .having(
                Expr::expr(Func::count(Expr::col(statements::Column::Id)))
                    .gte(STATEMENTS_PER_SET as i32),
            )
            .into_tuple::<String>()
            .all(&self.db)
            .await?;

        Ok(owners)
    }

    /// The highest-numbered set owned by `user_id`, empty if they have none.
    pub async fn latest_set(&self, user_id: &str) -> Result<Vec<Statement>> {
        let Some(latest) = Statements::find()
            .filter(statements::Column::UserId.eq(user_id))
            .order_by_desc(statements::Column::SetNumber)
            .one(&self.db)
            .await?
        else {
            return Ok(Vec::new());
        };

        let models = Statements::find()
            .filter(statements::Column::UserId.eq(user_id))
            .filter(statements::Column::SetNumber.eq(latest.set_number))
            .order_by_asc(statements::Column::IsLie)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Self::model_to_statement).collect())
    }
}
