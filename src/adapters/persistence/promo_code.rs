use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::promo_codes::{NewPromoCode, PromoCodeRepo},
    domain::entities::promo_code::PromoCode,
};

fn row_to_promo_code(row: &sqlx::postgres::PgRow) -> PromoCode {
    PromoCode {
        id: row.get("id"),
        code: row.get("code"),
        discount_type: row.get("discount_type"),
        discount_value: row.get("discount_value"),
        max_uses: row.get("max_uses"),
        current_uses: row.get("current_uses"),
        expires_at: row.get("expires_at"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, code, discount_type, discount_value, max_uses, current_uses,
    expires_at, is_active, created_at, updated_at
"#;

#[async_trait]
impl PromoCodeRepo for PostgresPersistence {
    async fn get_active_by_code(&self, code: &str) -> AppResult<Option<PromoCode>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM promo_codes WHERE code = $1 AND is_active = true",
            SELECT_COLS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_promo_code))
    }

    async fn increment_usage(&self, code: &str) -> AppResult<bool> {
        // All redemption conditions sit inside the UPDATE predicate, so two
        // concurrent redemptions of a nearly-exhausted code serialize on the
        // row lock and only as many as the cap allows get rows_affected = 1.
        let result = sqlx::query(
            r#"
            UPDATE promo_codes SET
                current_uses = current_uses + 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE code = $1
              AND is_active = true
              AND (expires_at IS NULL OR expires_at > CURRENT_TIMESTAMP)
              AND (max_uses IS NULL OR current_uses < max_uses)
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn create(&self, input: &NewPromoCode) -> AppResult<PromoCode> {
        let id = Uuid::new_v4();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO promo_codes
                (id, code, discount_type, discount_value, max_uses, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(&input.code)
        .bind(input.discount_type)
        .bind(input.discount_value)
        .bind(input.max_uses)
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_promo_code(&row))
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE promo_codes SET is_active = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self) -> AppResult<Vec<PromoCode>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM promo_codes ORDER BY created_at DESC",
            SELECT_COLS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_promo_code).collect())
    }
}
