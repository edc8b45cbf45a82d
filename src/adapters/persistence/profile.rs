use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscriptions::ProfileRepo,
    domain::entities::{profile::Profile, subscription::PlanType},
};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        email: row.get("email"),
        subscription_type: row.get("subscription_type"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ProfileRepo for PostgresPersistence {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(
            "SELECT id, email, subscription_type, updated_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn set_subscription_type(&self, user_id: Uuid, plan: PlanType) -> AppResult<()> {
        sqlx::query(
            "UPDATE profiles SET subscription_type = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(user_id)
        .bind(plan)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
