use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::payments::{NewPayment, PaymentRecorded, PaymentRepo},
    domain::entities::payment::Payment,
};

fn row_to_payment(row: &sqlx::postgres::PgRow) -> Payment {
    Payment {
        id: row.get("id"),
        user_id: row.get("user_id"),
        amount: row.get("amount"),
        currency: row.get("currency"),
        status: row.get("status"),
        gateway_payment_id: row.get("gateway_payment_id"),
        promo_code: row.get("promo_code"),
        discount_amount: row.get("discount_amount"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, amount, currency, status, gateway_payment_id, promo_code,
    discount_amount, created_at, updated_at
"#;

#[async_trait]
impl PaymentRepo for PostgresPersistence {
    async fn insert_pending(&self, input: &NewPayment) -> AppResult<Payment> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO payments
                (id, user_id, amount, currency, status, gateway_payment_id, promo_code, discount_amount)
            VALUES ($1, $2, $3, $4, 'pending', $5, $6, $7)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(input.user_id)
        .bind(input.amount)
        .bind(&input.currency)
        .bind(&input.gateway_payment_id)
        .bind(&input.promo_code)
        .bind(input.discount_amount)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_payment(&row))
    }

    async fn mark_succeeded(
        &self,
        gateway_payment_id: &str,
        user_id: Uuid,
        amount: f64,
        promo_code: Option<&str>,
    ) -> AppResult<PaymentRecorded> {
        // Single statement doing the whole idempotency decision. The unique
        // index on gateway_payment_id funnels concurrent deliveries into the
        // conflict arm, and the WHERE clause stops a second delivery from
        // updating a row that is already succeeded. One row back means this
        // delivery won; no row means someone else already recorded it.
        let row = sqlx::query(
            r#"
            INSERT INTO payments
                (id, user_id, amount, currency, status, gateway_payment_id, promo_code)
            VALUES ($1, $2, $3, 'RUB', 'succeeded', $4, $5)
            ON CONFLICT (gateway_payment_id) DO UPDATE SET
                status = 'succeeded',
                updated_at = CURRENT_TIMESTAMP
            WHERE payments.status <> 'succeeded'
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(amount)
        .bind(gateway_payment_id)
        .bind(promo_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(match row {
            Some(_) => PaymentRecorded::Recorded,
            None => PaymentRecorded::AlreadyRecorded,
        })
    }

    async fn mark_failed(&self, gateway_payment_id: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE payments SET
                status = 'failed',
                updated_at = CURRENT_TIMESTAMP
            WHERE gateway_payment_id = $1 AND status <> 'succeeded'
            "#,
        )
        .bind(gateway_payment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn get_by_gateway_id(&self, gateway_payment_id: &str) -> AppResult<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM payments WHERE gateway_payment_id = $1",
            SELECT_COLS
        ))
        .bind(gateway_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_payment))
    }
}
