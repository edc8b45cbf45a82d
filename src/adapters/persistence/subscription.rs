use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscriptions::{NewSubscription, SubscriptionRepo},
    domain::entities::subscription::Subscription,
};

fn row_to_subscription(row: &sqlx::postgres::PgRow) -> Subscription {
    Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_type: row.get("plan_type"),
        status: row.get("status"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        trial_end_date: row.get("trial_end_date"),
        gateway_payment_id: row.get("gateway_payment_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, plan_type, status, start_date, end_date, trial_end_date,
    gateway_payment_id, created_at, updated_at
"#;

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn create(&self, input: &NewSubscription) -> AppResult<Subscription> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscriptions
                (id, user_id, plan_type, status, start_date, end_date, trial_end_date, gateway_payment_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(input.user_id)
        .bind(input.plan_type)
        .bind(input.status)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.trial_end_date)
        .bind(&input.gateway_payment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(&row))
    }

    async fn latest_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn exists_for_user(&self, user_id: Uuid) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(count > 0)
    }

    async fn activate_trial(
        &self,
        user_id: Uuid,
        gateway_payment_id: &str,
        end_date: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>> {
        // The status predicate makes the flip conditional: if nothing is in
        // trial anymore, no row comes back and the caller appends instead.
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                status = 'active',
                gateway_payment_id = $2,
                end_date = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = (
                SELECT id FROM subscriptions
                WHERE user_id = $1 AND status = 'trial'
                ORDER BY created_at DESC
                LIMIT 1
            )
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(gateway_payment_id)
        .bind(end_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }

    async fn cancel(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscriptions SET
                status = 'canceled',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_subscription))
    }
}
