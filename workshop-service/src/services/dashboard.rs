//! Workshop-wide counts and money totals for the dashboard.

use super::calculator::round2;
use crate::error::WorkshopError;
use crate::models::{QuoteStatus, WorkStatus};
use crate::store::{DocumentStore, PageCursor, MAX_PAGE_SIZE};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{debug, instrument};

/// Aggregates over every quote and work order.
///
/// Money totals add amounts as stored, regardless of currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub quotes_total: u64,
    pub quotes_accepted: u64,
    /// Percentage of quotes accepted, one decimal place.
    pub acceptance_rate: Decimal,
    pub orders_total: u64,
    /// Orders pending or in progress.
    pub orders_active: u64,
    pub orders_completed: u64,
    /// Percentage of orders completed, one decimal place.
    pub completion_rate: Decimal,
    pub total_paid: Decimal,
    pub total_outstanding: Decimal,
}

fn rate(part: u64, whole: u64) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Walk all quotes and orders page by page and total them.
#[instrument(skip(store))]
pub async fn dashboard<S: DocumentStore>(store: &S) -> Result<DashboardStats, WorkshopError> {
    let mut stats = DashboardStats::default();

    let mut after = None;
    loop {
        let quotes = store.list_quotes(MAX_PAGE_SIZE, after).await?;
        stats.quotes_total += quotes.len() as u64;
        stats.quotes_accepted += quotes
            .iter()
            .filter(|q| q.status == QuoteStatus::Accepted)
            .count() as u64;

        if quotes.len() < MAX_PAGE_SIZE as usize {
            break;
        }
        after = quotes.last().map(|q| PageCursor::new(q.created_utc, q.id));
    }

    let mut total_paid = Decimal::ZERO;
    let mut total_outstanding = Decimal::ZERO;
    let mut after = None;
    loop {
        let orders = store.list_orders(MAX_PAGE_SIZE, after).await?;
        for order in &orders {
            stats.orders_total += 1;
            match order.status {
                WorkStatus::Pending | WorkStatus::InProgress => stats.orders_active += 1,
                WorkStatus::Completed => stats.orders_completed += 1,
                _ => {}
            }
            total_paid += order.paid_to_date;
            total_outstanding += order.balance;
        }

        if orders.len() < MAX_PAGE_SIZE as usize {
            break;
        }
        after = orders.last().map(|o| PageCursor::new(o.created_utc, o.id));
    }

    stats.acceptance_rate = rate(stats.quotes_accepted, stats.quotes_total);
    stats.completion_rate = rate(stats.orders_completed, stats.orders_total);
    stats.total_paid = round2(total_paid);
    stats.total_outstanding = round2(total_outstanding);

    debug!(
        quotes = stats.quotes_total,
        orders = stats.orders_total,
        "Dashboard computed"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rate_is_a_rounded_percentage() {
        assert_eq!(rate(2, 3), dec!(66.7));
        assert_eq!(rate(1, 2), dec!(50.0));
        assert_eq!(rate(0, 0), Decimal::ZERO);
    }
}
