//! `PaymentGatewayPort` implementation backed by YooKassa.

use async_trait::async_trait;

use crate::{
    app_error::AppResult,
    application::ports::payment_gateway::{
        CreatePaymentParams, PaymentGatewayPort, PaymentIntent, PaymentIntentStatus,
    },
    infra::yookassa_client::{YookassaClient, YookassaPayment},
};

pub struct YookassaPaymentAdapter {
    client: YookassaClient,
    currency: String,
}

impl YookassaPaymentAdapter {
    pub fn new(client: YookassaClient, currency: String) -> Self {
        Self { client, currency }
    }
}

fn to_intent(payment: YookassaPayment) -> PaymentIntent {
    PaymentIntent {
        id: payment.id,
        status: PaymentIntentStatus::from_gateway(&payment.status),
        amount: payment.amount.value,
        currency: payment.amount.currency,
        confirmation_url: payment.confirmation.and_then(|c| c.confirmation_url),
        paid: payment.paid,
        metadata: payment.metadata,
        created_at: payment.created_at,
    }
}

#[async_trait]
impl PaymentGatewayPort for YookassaPaymentAdapter {
    async fn create_payment(&self, params: &CreatePaymentParams) -> AppResult<PaymentIntent> {
        let payment = self
            .client
            .create_payment(
                params.amount,
                &self.currency,
                &params.description,
                &params.return_url,
                &params.metadata,
            )
            .await?;
        Ok(to_intent(payment))
    }

    async fn get_payment(&self, payment_id: &str) -> AppResult<PaymentIntent> {
        let payment = self.client.get_payment(payment_id).await?;
        Ok(to_intent(payment))
    }

    async fn cancel_payment(&self, payment_id: &str) -> AppResult<PaymentIntent> {
        let payment = self.client.cancel_payment(payment_id).await?;
        Ok(to_intent(payment))
    }
}
