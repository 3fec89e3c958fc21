//! Quote pricing.
//!
//! All arithmetic is exact decimal arithmetic. Nothing here rounds except
//! [`round2`], which callers apply at presentation and balance boundaries.

use crate::models::{LineItem, PricingOptions};
use rust_decimal::{Decimal, RoundingStrategy};

/// Aggregate amounts of a priced document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub rebate: Decimal,
    pub surcharge: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

fn percent_of(amount: Decimal, pct: Option<Decimal>) -> Decimal {
    amount * pct.unwrap_or(Decimal::ZERO) / Decimal::ONE_HUNDRED
}

/// `(unit - discount) * max(quantity, 1)`, where the unit is `hours *
/// hourly_rate` when both are present and non-zero, else the unit price.
pub fn line_total(item: &LineItem) -> Decimal {
    let unit = match (item.hours, item.hourly_rate) {
        (Some(hours), Some(rate)) if item.is_hourly() => hours * rate,
        _ => item.unit_price,
    };
    let discount = percent_of(unit, item.discount_pct);
    (unit - discount) * Decimal::from(item.quantity.max(1))
}

pub fn subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(line_total).sum()
}

/// Apply rebate, then card surcharge, then tax, each on the running amount.
pub fn totals(items: &[LineItem], pricing: &PricingOptions) -> Totals {
    let subtotal = subtotal(items);
    let rebate = percent_of(subtotal, pricing.rebate_pct);
    let after_rebate = subtotal - rebate;
    let surcharge = percent_of(after_rebate, pricing.surcharge_pct);
    let base = after_rebate + surcharge;
    let tax = percent_of(base, pricing.tax_pct);

    Totals {
        subtotal,
        rebate,
        surcharge,
        tax,
        total: base + tax,
    }
}

/// Round a money amount to 2 decimals, halves away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;
    use rust_decimal_macros::dec;

    #[test]
    fn hourly_line_applies_discount_before_quantity() {
        let item = LineItem::new(ItemKind::Repair, "Board repair", 1, dec!(0))
            .with_hours(dec!(2), dec!(50))
            .with_discount(dec!(10));
        assert_eq!(line_total(&item), dec!(90));
    }

    #[test]
    fn unit_priced_line_multiplies_quantity() {
        let item = LineItem::new(ItemKind::Product, "SSD 480GB", 3, dec!(200));
        assert_eq!(line_total(&item), dec!(600));
    }

    #[test]
    fn unit_price_is_fallback_when_hours_missing() {
        let mut item = LineItem::new(ItemKind::Service, "Cleaning", 2, dec!(35));
        item.hourly_rate = Some(dec!(80));
        assert_eq!(line_total(&item), dec!(70));
    }

    #[test]
    fn zero_quantity_counts_as_one() {
        let item = LineItem::new(ItemKind::Service, "Diagnosis", 0, dec!(15));
        assert_eq!(line_total(&item), dec!(15));
    }

    #[test]
    fn totals_apply_rebate_surcharge_then_tax() {
        let items = vec![
            LineItem::new(ItemKind::Product, "Screen", 1, dec!(600)),
            LineItem::new(ItemKind::Repair, "Labor", 1, dec!(0)).with_hours(dec!(4), dec!(100)),
        ];
        let pricing = PricingOptions {
            rebate_pct: Some(dec!(10)),
            surcharge_pct: Some(dec!(5)),
            tax_pct: Some(dec!(21)),
        };

        let totals = totals(&items, &pricing);

        assert_eq!(totals.subtotal, dec!(1000));
        assert_eq!(totals.rebate, dec!(100));
        assert_eq!(totals.surcharge, dec!(45));
        assert_eq!(totals.tax, dec!(198.45));
        assert_eq!(totals.total, dec!(1143.45));
    }

    #[test]
    fn totals_without_options_equal_subtotal() {
        let items = vec![LineItem::new(ItemKind::Service, "Backup", 1, dec!(49.99))];
        let totals = totals(&items, &PricingOptions::default());
        assert_eq!(totals.total, dec!(49.99));
        assert_eq!(totals.tax, Decimal::ZERO);
    }

    #[test]
    fn round2_rounds_halves_away_from_zero() {
        assert_eq!(round2(dec!(10.005)), dec!(10.01));
        assert_eq!(round2(dec!(-10.005)), dec!(-10.01));
        assert_eq!(round2(dec!(3.14159)), dec!(3.14));
    }
}
