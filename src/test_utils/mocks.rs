//! In-memory repo and port implementations. Each mirrors the conditional
//! semantics of its Postgres counterpart closely enough for the use-case
//! tests to exercise the same branches.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            notifications::SubscriptionNotifier,
            payment_gateway::{
                CreatePaymentParams, PaymentGatewayPort, PaymentIntent, PaymentIntentStatus,
            },
        },
        use_cases::{
            payments::{CheckoutSessionRepo, NewPayment, PaymentRecorded, PaymentRepo},
            promo_codes::{NewPromoCode, PromoCodeRepo},
            subscriptions::{NewSubscription, ProfileRepo, SubscriptionRepo},
        },
    },
    domain::entities::{
        checkout_session::CheckoutSession,
        payment::{Payment, PaymentStatus},
        profile::Profile,
        promo_code::PromoCode,
        subscription::{PlanType, Subscription, SubscriptionStatus},
    },
};

fn storage_error() -> AppError {
    AppError::Database("simulated storage failure".to_string())
}

// ============================================================================
// Subscriptions
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    rows: Mutex<Vec<Subscription>>,
    fail_next_write: AtomicBool,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, subscription: Subscription) {
        self.rows.lock().unwrap().push(subscription);
    }

    pub fn row_count(&self, user_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    /// Make the next mutating call fail once.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.fail_next_write.swap(false, Ordering::SeqCst)
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn create(&self, input: &NewSubscription) -> AppResult<Subscription> {
        if self.take_failure() {
            return Err(storage_error());
        }
        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            plan_type: input.plan_type,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            trial_end_date: input.trial_end_date,
            gateway_payment_id: input.gateway_payment_id.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.rows.lock().unwrap().push(subscription.clone());
        Ok(subscription)
    }

    async fn latest_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn exists_for_user(&self, user_id: Uuid) -> AppResult<bool> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|s| s.user_id == user_id))
    }

    async fn activate_trial(
        &self,
        user_id: Uuid,
        gateway_payment_id: &str,
        end_date: DateTime<Utc>,
    ) -> AppResult<Option<Subscription>> {
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows
            .iter_mut()
            .rev()
            .find(|s| s.user_id == user_id && s.status == SubscriptionStatus::Trial)
        else {
            return Ok(None);
        };
        if self.take_failure() {
            return Err(storage_error());
        }
        row.status = SubscriptionStatus::Active;
        row.gateway_payment_id = Some(gateway_payment_id.to_string());
        row.end_date = Some(end_date);
        row.updated_at = Some(Utc::now());
        Ok(Some(row.clone()))
    }

    async fn cancel(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        if self.take_failure() {
            return Err(storage_error());
        }
        let mut rows = self.rows.lock().unwrap();
        let Some(row) = rows.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        row.status = SubscriptionStatus::Canceled;
        row.updated_at = Some(Utc::now());
        Ok(Some(row.clone()))
    }
}

// ============================================================================
// Profiles
// ============================================================================

#[derive(Default)]
pub struct InMemoryProfileRepo {
    profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl InMemoryProfileRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: Profile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }

    pub fn subscription_type(&self, user_id: Uuid) -> Option<PlanType> {
        self.profiles
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|p| p.subscription_type)
    }
}

#[async_trait]
impl ProfileRepo for InMemoryProfileRepo {
    async fn get_by_id(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }

    async fn set_subscription_type(&self, user_id: Uuid, plan: PlanType) -> AppResult<()> {
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(&user_id) {
            profile.subscription_type = plan;
            profile.updated_at = Some(Utc::now());
        }
        Ok(())
    }
}

// ============================================================================
// Promo codes
// ============================================================================

#[derive(Default)]
pub struct InMemoryPromoCodeRepo {
    codes: Mutex<HashMap<String, PromoCode>>,
    fail_all: AtomicBool,
}

impl InMemoryPromoCodeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_codes(codes: Vec<PromoCode>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.codes.lock().unwrap();
            for code in codes {
                map.insert(code.code.clone(), code);
            }
        }
        repo
    }

    /// Make every repo call fail from now on.
    pub fn fail_lookups(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    pub fn current_uses(&self, code: &str) -> Option<i32> {
        self.codes
            .lock()
            .unwrap()
            .get(code)
            .map(|c| c.current_uses)
    }

    fn check_failure(&self) -> AppResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            Err(storage_error())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PromoCodeRepo for InMemoryPromoCodeRepo {
    async fn get_active_by_code(&self, code: &str) -> AppResult<Option<PromoCode>> {
        self.check_failure()?;
        Ok(self
            .codes
            .lock()
            .unwrap()
            .get(code)
            .filter(|c| c.is_active)
            .cloned())
    }

    async fn increment_usage(&self, code: &str) -> AppResult<bool> {
        self.check_failure()?;
        let mut codes = self.codes.lock().unwrap();
        let Some(promo) = codes.get_mut(code) else {
            return Ok(false);
        };
        let redeemable = promo.is_active
            && !promo.is_expired(Utc::now())
            && promo.max_uses.is_none_or(|max| promo.current_uses < max);
        if !redeemable {
            return Ok(false);
        }
        promo.current_uses += 1;
        promo.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn create(&self, input: &NewPromoCode) -> AppResult<PromoCode> {
        self.check_failure()?;
        let now = Utc::now();
        let promo = PromoCode {
            id: Uuid::new_v4(),
            code: input.code.clone(),
            discount_type: input.discount_type,
            discount_value: input.discount_value,
            max_uses: input.max_uses,
            current_uses: 0,
            expires_at: input.expires_at,
            is_active: true,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.codes
            .lock()
            .unwrap()
            .insert(promo.code.clone(), promo.clone());
        Ok(promo)
    }

    async fn set_active(&self, id: Uuid, is_active: bool) -> AppResult<bool> {
        self.check_failure()?;
        let mut codes = self.codes.lock().unwrap();
        let Some(promo) = codes.values_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        promo.is_active = is_active;
        promo.updated_at = Some(Utc::now());
        Ok(true)
    }

    async fn list_all(&self) -> AppResult<Vec<PromoCode>> {
        self.check_failure()?;
        Ok(self.codes.lock().unwrap().values().cloned().collect())
    }
}

// ============================================================================
// Payments
// ============================================================================

#[derive(Default)]
pub struct InMemoryPaymentRepo {
    rows: Mutex<HashMap<String, Payment>>,
    fail_next_insert: AtomicBool,
}

impl InMemoryPaymentRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn fail_next_insert(&self) {
        self.fail_next_insert.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentRepo for InMemoryPaymentRepo {
    async fn insert_pending(&self, input: &NewPayment) -> AppResult<Payment> {
        if self.fail_next_insert.swap(false, Ordering::SeqCst) {
            return Err(storage_error());
        }
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            amount: input.amount,
            currency: input.currency.clone(),
            status: PaymentStatus::Pending,
            gateway_payment_id: input.gateway_payment_id.clone(),
            promo_code: input.promo_code.clone(),
            discount_amount: input.discount_amount,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.rows
            .lock()
            .unwrap()
            .insert(payment.gateway_payment_id.clone(), payment.clone());
        Ok(payment)
    }

    async fn mark_succeeded(
        &self,
        gateway_payment_id: &str,
        user_id: Uuid,
        amount: f64,
        promo_code: Option<&str>,
    ) -> AppResult<PaymentRecorded> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(gateway_payment_id) {
            Some(existing) if existing.status == PaymentStatus::Succeeded => {
                Ok(PaymentRecorded::AlreadyRecorded)
            }
            Some(existing) => {
                existing.status = PaymentStatus::Succeeded;
                existing.updated_at = Some(Utc::now());
                Ok(PaymentRecorded::Recorded)
            }
            None => {
                let now = Utc::now();
                rows.insert(
                    gateway_payment_id.to_string(),
                    Payment {
                        id: Uuid::new_v4(),
                        user_id,
                        amount,
                        currency: "RUB".to_string(),
                        status: PaymentStatus::Succeeded,
                        gateway_payment_id: gateway_payment_id.to_string(),
                        promo_code: promo_code.map(str::to_string),
                        discount_amount: 0.0,
                        created_at: Some(now),
                        updated_at: Some(now),
                    },
                );
                Ok(PaymentRecorded::Recorded)
            }
        }
    }

    async fn mark_failed(&self, gateway_payment_id: &str) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(payment) = rows.get_mut(gateway_payment_id)
            && payment.status != PaymentStatus::Succeeded
        {
            payment.status = PaymentStatus::Failed;
            payment.updated_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn get_by_gateway_id(&self, gateway_payment_id: &str) -> AppResult<Option<Payment>> {
        Ok(self.rows.lock().unwrap().get(gateway_payment_id).cloned())
    }
}

// ============================================================================
// Checkout sessions
// ============================================================================

#[derive(Default)]
pub struct InMemoryCheckoutSessionRepo {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
}

impl InMemoryCheckoutSessionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_expired(&self, session: CheckoutSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session);
    }
}

#[async_trait]
impl CheckoutSessionRepo for InMemoryCheckoutSessionRepo {
    async fn create(&self, session: &CheckoutSession) -> AppResult<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CheckoutSession>> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(token)
            .filter(|s| s.expires_at > now)
            .cloned())
    }
}

// ============================================================================
// Payment gateway
// ============================================================================

pub struct MockPaymentGateway {
    payments: Mutex<HashMap<String, PaymentIntent>>,
    created: Mutex<Vec<CreatePaymentParams>>,
    canceled: Mutex<Vec<String>>,
    get_calls: AtomicUsize,
    fail_next_create: AtomicBool,
    fail_next_get: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            payments: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
            canceled: Mutex::new(Vec::new()),
            get_calls: AtomicUsize::new(0),
            fail_next_create: AtomicBool::new(false),
            fail_next_get: AtomicBool::new(false),
        }
    }

    pub fn insert_payment(&self, intent: PaymentIntent) {
        self.payments
            .lock()
            .unwrap()
            .insert(intent.id.clone(), intent);
    }

    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_get(&self) {
        self.fail_next_get.store(true, Ordering::SeqCst);
    }

    pub fn last_create_params(&self) -> Option<CreatePaymentParams> {
        self.created.lock().unwrap().last().cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn get_count(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn canceled_ids(&self) -> Vec<String> {
        self.canceled.lock().unwrap().clone()
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGatewayPort for MockPaymentGateway {
    async fn create_payment(&self, params: &CreatePaymentParams) -> AppResult<PaymentIntent> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(AppError::Gateway {
                status: 500,
                body: "simulated gateway failure".to_string(),
            });
        }

        let id = format!("pay_mock_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            id: id.clone(),
            status: PaymentIntentStatus::Pending,
            amount: format!("{:.2}", params.amount),
            currency: "RUB".to_string(),
            confirmation_url: Some(format!("https://gateway.example/confirm/{id}")),
            paid: false,
            metadata: params.metadata.clone(),
            created_at: Some(Utc::now()),
        };
        self.payments
            .lock()
            .unwrap()
            .insert(id.clone(), intent.clone());
        self.created.lock().unwrap().push(params.clone());
        Ok(intent)
    }

    async fn get_payment(&self, payment_id: &str) -> AppResult<PaymentIntent> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_get.swap(false, Ordering::SeqCst) {
            return Err(AppError::GatewayUnavailable(
                "simulated gateway outage".to_string(),
            ));
        }
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or(AppError::Gateway {
                status: 404,
                body: "payment not found".to_string(),
            })
    }

    async fn cancel_payment(&self, payment_id: &str) -> AppResult<PaymentIntent> {
        let mut payments = self.payments.lock().unwrap();
        let Some(intent) = payments.get_mut(payment_id) else {
            return Err(AppError::Gateway {
                status: 404,
                body: "payment not found".to_string(),
            });
        };
        intent.status = PaymentIntentStatus::Canceled;
        self.canceled.lock().unwrap().push(payment_id.to_string());
        Ok(intent.clone())
    }
}

// ============================================================================
// Notifier
// ============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    trial_started: AtomicUsize,
    activated: AtomicUsize,
    canceled: AtomicUsize,
    fail_all: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    pub fn trial_started_count(&self) -> usize {
        self.trial_started.load(Ordering::SeqCst)
    }

    pub fn activated_count(&self) -> usize {
        self.activated.load(Ordering::SeqCst)
    }

    pub fn canceled_count(&self) -> usize {
        self.canceled.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> AppResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            Err(AppError::Internal("simulated email failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SubscriptionNotifier for RecordingNotifier {
    async fn trial_started(&self, _email: &str, _trial_end: DateTime<Utc>) -> AppResult<()> {
        self.check_failure()?;
        self.trial_started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscription_activated(&self, _email: &str, _amount: f64) -> AppResult<()> {
        self.check_failure()?;
        self.activated.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscription_canceled(
        &self,
        _email: &str,
        _end_date: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        self.check_failure()?;
        self.canceled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
