use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::payments::CheckoutSessionRepo,
    domain::entities::checkout_session::CheckoutSession,
};

fn row_to_session(row: &sqlx::postgres::PgRow) -> CheckoutSession {
    CheckoutSession {
        id: row.get("id"),
        token: row.get("token"),
        user_id: row.get("user_id"),
        gateway_payment_id: row.get("gateway_payment_id"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl CheckoutSessionRepo for PostgresPersistence {
    async fn create(&self, session: &CheckoutSession) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO checkout_sessions
                (id, token, user_id, gateway_payment_id, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.id)
        .bind(&session.token)
        .bind(session.user_id)
        .bind(&session.gateway_payment_id)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn get_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CheckoutSession>> {
        let row = sqlx::query(
            r#"
            SELECT id, token, user_id, gateway_payment_id, expires_at, created_at
            FROM checkout_sessions
            WHERE token = $1 AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_session))
    }
}
