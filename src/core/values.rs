use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::types::*;

impl NfseValues {
    /// Derive the NFSe `valores` block from the DPS amounts.
    ///
    /// - `vBC` = service − unconditional discount − deduction − benefit (never negative)
    /// - `vISSQN` = `vBC` × `pAliq` / 100, only for taxable operations
    /// - `vTotalRet` = withheld ISS + federal withholdings + withheld PIS/COFINS
    /// - `vLiq` = service − discounts − `vTotalRet`
    ///
    /// Percent-derived amounts that overflow `Decimal` are left out (`None`);
    /// sums saturate. The writer then drops anything above 1e15.
    pub fn compute(dps: &Dps) -> Self {
        let values = &dps.values;
        let service = values.service.amount;
        let (unconditional, conditional) = values
            .discounts
            .as_ref()
            .map(|d| {
                (
                    d.unconditional.unwrap_or(Decimal::ZERO),
                    d.conditional.unwrap_or(Decimal::ZERO),
                )
            })
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));

        let deduction_amount = values.deduction.as_ref().and_then(|d| match d.percentage {
            Some(p) => percent_of(service, p, "vCalcDR"),
            None => d.amount,
        });

        let before_benefit = service
            .saturating_sub(unconditional)
            .saturating_sub(deduction_amount.unwrap_or(Decimal::ZERO));
        let municipal = &values.taxation.municipal;
        let benefit_amount = municipal.benefit.as_ref().and_then(|bm| match bm.reduction_amount {
            Some(amount) => Some(amount),
            None => bm
                .reduction_percentage
                .and_then(|p| percent_of(before_benefit, p, "vCalcBM")),
        });

        let base = before_benefit
            .saturating_sub(benefit_amount.unwrap_or(Decimal::ZERO))
            .max(Decimal::ZERO);

        let taxable = municipal.situation == IssqnSituation::Taxable;
        let applied_rate = municipal.rate.filter(|_| taxable);
        let iss_amount = applied_rate.and_then(|rate| percent_of(base, rate, "vISSQN"));

        let mut total_withheld = Decimal::ZERO;
        if municipal.withholding.is_some_and(|w| w.is_withheld()) {
            total_withheld = total_withheld.saturating_add(iss_amount.unwrap_or(Decimal::ZERO));
        }
        if let Some(federal) = &values.taxation.federal {
            for amount in [federal.withheld_cp, federal.withheld_irrf, federal.withheld_csll] {
                total_withheld = total_withheld.saturating_add(amount.unwrap_or(Decimal::ZERO));
            }
            if let Some(pc) = &federal.pis_cofins {
                if pc.withholding == Some(1) {
                    for amount in [pc.pis_amount, pc.cofins_amount] {
                        total_withheld =
                            total_withheld.saturating_add(amount.unwrap_or(Decimal::ZERO));
                    }
                }
            }
        }

        Self {
            deduction_amount,
            benefit_amount,
            base,
            applied_rate,
            iss_amount,
            total_withheld,
            net_amount: service
                .saturating_sub(unconditional)
                .saturating_sub(conditional)
                .saturating_sub(total_withheld),
        }
    }
}

/// `value × rate / 100`, rounded half-up to cents. `None` on overflow.
fn percent_of(value: Decimal, rate: Decimal, tag: &str) -> Option<Decimal> {
    let result = value
        .checked_mul(rate)
        .and_then(|v| v.checked_div(dec!(100)))
        .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero));
    if result.is_none() {
        tracing::warn!(tag, %value, %rate, "percentage overflows, amount omitted");
    }
    result
}
