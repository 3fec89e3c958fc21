//! Payment journal. Every payment insert or delete is applied to the owning
//! order's paid amount and balance in the same transaction.

use super::in_transaction;
use super::metrics::{PAYMENTS_TOTAL, PAYMENT_AMOUNT_TOTAL};
use super::orders::settle;
use crate::error::WorkshopError;
use crate::models::{NewPayment, Payment, WorkOrder};
use crate::store::{DocumentStore, StoreTransaction};
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::retry::RetryConfig;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct PaymentJournal<S: DocumentStore> {
    store: Arc<S>,
    retry: RetryConfig,
}

fn validate_payment(input: &NewPayment) -> Result<(), WorkshopError> {
    if input.amount <= Decimal::ZERO {
        return Err(WorkshopError::validation(format!(
            "Payment amount must be positive, got {}",
            input.amount
        )));
    }
    if input.installments == Some(0) {
        return Err(WorkshopError::validation(
            "Installments must be at least 1",
        ));
    }
    if input.surcharge_pct.is_some_and(|pct| pct < Decimal::ZERO) {
        return Err(WorkshopError::validation(
            "Payment surcharge must not be negative",
        ));
    }
    Ok(())
}

impl<S: DocumentStore> PaymentJournal<S> {
    pub fn new(store: Arc<S>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Record a payment and apply it to the order's balance.
    #[instrument(skip(self, input), fields(order_id = %input.order_id, amount = %input.amount))]
    pub async fn register_payment(&self, input: NewPayment) -> Result<Payment, WorkshopError> {
        validate_payment(&input)?;

        let (payment, order) =
            in_transaction(&self.retry, "register_payment", || self.register_once(&input))
                .await?;

        PAYMENTS_TOTAL
            .with_label_values(&[payment.method.as_str()])
            .inc();
        if let Some(amount) = payment.amount.to_f64() {
            PAYMENT_AMOUNT_TOTAL
                .with_label_values(&[payment.currency.as_str()])
                .inc_by(amount);
        }
        info!(
            payment_id = %payment.id,
            order_code = %order.code,
            paid_to_date = %order.paid_to_date,
            balance = %order.balance,
            pay_status = %order.pay_status,
            "Payment registered"
        );

        Ok(payment)
    }

    /// Payments of an order, oldest first.
    pub async fn list_payments(&self, order_id: Uuid) -> Result<Vec<Payment>, WorkshopError> {
        self.store.list_payments(order_id).await
    }

    /// Remove a payment and reverse its effect on the order.
    #[instrument(skip(self), fields(payment_id = %payment_id, order_id = %order_id))]
    pub async fn delete_payment(
        &self,
        payment_id: Uuid,
        order_id: Uuid,
    ) -> Result<WorkOrder, WorkshopError> {
        let (payment, order) = in_transaction(&self.retry, "delete_payment", || {
            self.delete_once(payment_id, order_id)
        })
        .await?;

        info!(
            amount = %payment.amount,
            paid_to_date = %order.paid_to_date,
            balance = %order.balance,
            pay_status = %order.pay_status,
            "Payment deleted"
        );

        Ok(order)
    }

    async fn register_once(
        &self,
        input: &NewPayment,
    ) -> Result<(Payment, WorkOrder), WorkshopError> {
        let mut tx = self.store.begin().await?;
        let mut order = tx
            .order(input.order_id)
            .await?
            .ok_or_else(|| WorkshopError::not_found("Order", input.order_id))?;

        if input.currency != order.currency {
            return Err(WorkshopError::validation(format!(
                "Payment currency {} does not match order currency {}",
                input.currency, order.currency
            )));
        }

        let payment = Payment {
            id: Uuid::new_v4(),
            order_id: order.id,
            quote_id: Some(order.quote_id),
            amount: input.amount,
            currency: input.currency.clone(),
            method: input.method,
            installments: input.installments,
            surcharge_pct: input.surcharge_pct,
            external_reference: input.external_reference.clone(),
            receipt_type: input.receipt_type,
            receipt_number: input.receipt_number.clone(),
            created_utc: Utc::now(),
        };
        tx.insert_payment(&payment).await?;

        order.paid_to_date += payment.amount;
        let (balance, pay_status) = settle(order.final_total, order.paid_to_date);
        order.balance = balance;
        order.pay_status = pay_status;
        tx.save_order(&order).await?;

        tx.commit().await?;
        Ok((payment, order))
    }

    async fn delete_once(
        &self,
        payment_id: Uuid,
        order_id: Uuid,
    ) -> Result<(Payment, WorkOrder), WorkshopError> {
        let mut tx = self.store.begin().await?;
        let payment = tx
            .payment(payment_id)
            .await?
            .ok_or_else(|| WorkshopError::not_found("Payment", payment_id))?;
        if payment.order_id != order_id {
            return Err(WorkshopError::validation(format!(
                "Payment {} does not belong to order {}",
                payment_id, order_id
            )));
        }
        let mut order = tx
            .order(order_id)
            .await?
            .ok_or_else(|| WorkshopError::not_found("Order", order_id))?;

        order.paid_to_date = (order.paid_to_date - payment.amount).max(Decimal::ZERO);
        let (balance, pay_status) = settle(order.final_total, order.paid_to_date);
        order.balance = balance;
        order.pay_status = pay_status;

        tx.delete_payment(payment_id).await?;
        tx.save_order(&order).await?;
        tx.commit().await?;
        Ok((payment, order))
    }
}
