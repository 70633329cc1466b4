//! Financial Kernel: NPV, BCR, payback, the agriculture cash-flow
//! generator, the multi-year CBA/carbon time series, and green-bond
//! annuity layering (spec.md §4.4).

use serde::{Deserialize, Serialize};

/// `NPV = sum(CF_t / (1+r)^t)` for `t = 0..cash_flows.len()`. Linear in
/// each cash-flow entry (P4); strictly decreasing in `r` for any series
/// with cash flows beyond year 0 whose discounted value is positive.
pub fn npv(cash_flows: &[f64], discount_rate: f64) -> f64 {
    cash_flows
        .iter()
        .enumerate()
        .map(|(t, cf)| cf / (1.0 + discount_rate).powi(t as i32))
        .sum()
}

/// Benefit-cost ratio: `PV(positive flows) / PV(|negative flows|)`. `None`
/// when there are no discounted costs to divide by.
pub fn bcr(cash_flows: &[f64], discount_rate: f64) -> Option<f64> {
    let mut pv_benefits = 0.0;
    let mut pv_costs = 0.0;
    for (t, cf) in cash_flows.iter().enumerate() {
        let discounted = cf / (1.0 + discount_rate).powi(t as i32);
        if discounted >= 0.0 {
            pv_benefits += discounted;
        } else {
            pv_costs += -discounted;
        }
    }
    if pv_costs == 0.0 {
        None
    } else {
        Some(pv_benefits / pv_costs)
    }
}

/// Linear-interpolated payback period (in years), or `None` if the
/// cumulative cash flow never crosses zero.
pub fn payback_period(cash_flows: &[f64]) -> Option<f64> {
    let mut cumulative = 0.0;
    let mut prev_cumulative = 0.0;
    for (t, cf) in cash_flows.iter().enumerate() {
        prev_cumulative = cumulative;
        cumulative += cf;
        if t > 0 && prev_cumulative < 0.0 && cumulative >= 0.0 {
            let frac = -prev_cumulative / (cumulative - prev_cumulative);
            return Some((t - 1) as f64 + frac);
        }
    }
    None
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialResult {
    pub npv_usd: f64,
    pub bcr: Option<f64>,
    pub payback_years: Option<f64>,
    pub cumulative_cash_flow: Vec<f64>,
    pub incremental_cash_flow: Vec<f64>,
    pub assumptions: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgricultureCashFlowInputs {
    pub capex: f64,
    pub opex: f64,
    pub standard_yield_tons_per_ha: f64,
    pub resilient_yield_tons_per_ha: f64,
    pub yield_benefit_pct: f64,
    pub price_per_ton: f64,
    pub analysis_years: u32,
    pub discount_rate: f64,
}

impl Default for AgricultureCashFlowInputs {
    fn default() -> Self {
        AgricultureCashFlowInputs {
            capex: 2000.0,
            opex: 425.0,
            standard_yield_tons_per_ha: 4.5,
            resilient_yield_tons_per_ha: 5.8,
            yield_benefit_pct: 0.30,
            price_per_ton: 4800.0,
            analysis_years: 10,
            discount_rate: 0.10,
        }
    }
}

/// Agriculture cash-flow series: `cf[0] = -capex`, `cf[t] = (resilient *
/// (1+benefit) - standard) * price - opex` for `t in 1..=N`.
pub fn agriculture_cash_flows(inputs: &AgricultureCashFlowInputs) -> Vec<f64> {
    let mut flows = Vec::with_capacity(inputs.analysis_years as usize + 1);
    flows.push(-inputs.capex);
    let avoided_loss_tons = inputs.resilient_yield_tons_per_ha * (1.0 + inputs.yield_benefit_pct)
        - inputs.standard_yield_tons_per_ha;
    let annual_cf = avoided_loss_tons * inputs.price_per_ton - inputs.opex;
    for _ in 1..=inputs.analysis_years {
        flows.push(annual_cf);
    }
    flows
}

/// Run NPV/BCR/payback over an arbitrary cash-flow vector, assembling a
/// [`FinancialResult`].
pub fn evaluate_cash_flows(
    cash_flows: &[f64],
    discount_rate: f64,
    assumptions: impl Serialize,
) -> FinancialResult {
    let mut cumulative_cash_flow = Vec::with_capacity(cash_flows.len());
    let mut running = 0.0;
    for cf in cash_flows {
        running += cf;
        cumulative_cash_flow.push(running);
    }
    FinancialResult {
        npv_usd: npv(cash_flows, discount_rate),
        bcr: bcr(cash_flows, discount_rate),
        payback_years: payback_period(cash_flows),
        cumulative_cash_flow,
        incremental_cash_flow: cash_flows.to_vec(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
    }
}

// ---------------------------------------------------------------------------
// CBA / carbon time series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CbaInputs {
    pub years: u32,
    pub discount_rate: f64,
    pub baseline_annual_damage_usd: f64,
    pub full_insurance_premium_usd: f64,
    pub adaptation_opex_usd: f64,
    pub residual_damage_usd: f64,
    pub reduced_insurance_premium_usd: f64,
    pub carbon_revenue_usd: f64,
    pub total_discounted_investment_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CbaYear {
    pub year_index: u32,
    pub baseline_discounted_cost_usd: f64,
    pub adaptation_discounted_cost_usd: f64,
    pub net_benefit_usd: f64,
    pub cumulative_net_benefit_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CbaTimeSeries {
    pub years: Vec<CbaYear>,
    pub breakeven_year: Option<u32>,
    pub total_roi_pct: f64,
    pub final_net_benefit_usd: f64,
}

/// Two parallel discounted streams — (baseline damage + full insurance) vs
/// (OPEX + residual damage + reduced insurance - carbon revenue) — compared
/// year by year; the first crossing year is breakeven.
pub fn calculate_cba_time_series(inputs: &CbaInputs) -> CbaTimeSeries {
    let mut years = Vec::with_capacity(inputs.years as usize);
    let mut cumulative = 0.0;
    let mut breakeven_year = None;

    for t in 1..=inputs.years {
        let discount_factor = (1.0 + inputs.discount_rate).powi(t as i32);
        let baseline_cost = (inputs.baseline_annual_damage_usd + inputs.full_insurance_premium_usd)
            / discount_factor;
        let adaptation_cost = (inputs.adaptation_opex_usd + inputs.residual_damage_usd
            + inputs.reduced_insurance_premium_usd
            - inputs.carbon_revenue_usd)
            / discount_factor;
        let net_benefit = baseline_cost - adaptation_cost;
        let prev_cumulative = cumulative;
        cumulative += net_benefit;

        if breakeven_year.is_none() && prev_cumulative < 0.0 && cumulative >= 0.0 {
            breakeven_year = Some(t);
        }

        years.push(CbaYear {
            year_index: t,
            baseline_discounted_cost_usd: baseline_cost,
            adaptation_discounted_cost_usd: adaptation_cost,
            net_benefit_usd: net_benefit,
            cumulative_net_benefit_usd: cumulative,
        });
    }

    let final_net_benefit = years.last().map(|y| y.cumulative_net_benefit_usd).unwrap_or(0.0);
    let total_roi_pct = if inputs.total_discounted_investment_usd != 0.0 {
        final_net_benefit / inputs.total_discounted_investment_usd * 100.0
    } else {
        0.0
    };

    CbaTimeSeries {
        years,
        breakeven_year,
        total_roi_pct,
        final_net_benefit_usd: final_net_benefit,
    }
}

// ---------------------------------------------------------------------------
// Green-bond annuity layering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreenBondReport {
    pub standard_annual_payment_usd: f64,
    pub greenium_annual_payment_usd: f64,
    pub annual_savings_usd: f64,
    pub lifetime_savings_usd: f64,
}

/// Annuity payment `P = principal * r / (1 - (1+r)^-n)`.
pub fn annuity_payment(principal: f64, rate: f64, years: u32) -> f64 {
    if rate == 0.0 {
        return principal / years as f64;
    }
    principal * rate / (1.0 - (1.0 + rate).powi(-(years as i32)))
}

/// Compares a standard-rate annuity against a greenium-discounted rate.
pub fn calculate_green_bond_savings(
    principal: f64,
    standard_rate: f64,
    greenium_bps: f64,
    years: u32,
) -> GreenBondReport {
    let greenium_rate = (standard_rate - greenium_bps / 10_000.0).max(0.0);
    let standard_payment = annuity_payment(principal, standard_rate, years);
    let greenium_payment = annuity_payment(principal, greenium_rate, years);
    let annual_savings = standard_payment - greenium_payment;
    GreenBondReport {
        standard_annual_payment_usd: standard_payment,
        greenium_annual_payment_usd: greenium_payment,
        annual_savings_usd: annual_savings,
        lifetime_savings_usd: annual_savings * years as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn npv_is_monotone_decreasing_in_discount_rate() {
        let flows = vec![-1000.0, 300.0, 300.0, 300.0, 300.0];
        let low = npv(&flows, 0.05);
        let high = npv(&flows, 0.20);
        assert!(high < low);
    }

    #[test]
    fn npv_is_linear_in_cash_flow_entries() {
        let base = vec![-1000.0, 400.0, 400.0];
        let doubled: Vec<f64> = base.iter().map(|c| c * 2.0).collect();
        assert!((npv(&doubled, 0.1) - npv(&base, 0.1) * 2.0).abs() < 1e-9);
    }

    #[test]
    fn payback_interpolates_within_crossing_year() {
        let flows = vec![-1000.0, 400.0, 400.0, 400.0];
        let payback = payback_period(&flows).unwrap();
        assert!((payback - 2.5).abs() < 1e-9);
    }

    #[test]
    fn payback_none_when_never_recovered() {
        let flows = vec![-1000.0, 10.0, 10.0];
        assert!(payback_period(&flows).is_none());
    }

    #[test]
    fn maize_drought_scenario_matches_spec_defaults() {
        let inputs = AgricultureCashFlowInputs::default();
        let flows = agriculture_cash_flows(&inputs);
        assert_eq!(flows.len(), 11);
        assert_eq!(flows[0], -2000.0);
        let result = evaluate_cash_flows(&flows, inputs.discount_rate, &inputs);
        assert!(result.npv_usd.is_finite());
    }

    #[test]
    fn cba_breakeven_detected_when_cumulative_crosses_zero() {
        let inputs = CbaInputs {
            years: 10,
            discount_rate: 0.05,
            baseline_annual_damage_usd: 50_000.0,
            full_insurance_premium_usd: 10_000.0,
            adaptation_opex_usd: 15_000.0,
            residual_damage_usd: 5_000.0,
            reduced_insurance_premium_usd: 3_000.0,
            carbon_revenue_usd: 2_000.0,
            total_discounted_investment_usd: 100_000.0,
        };
        let series = calculate_cba_time_series(&inputs);
        assert_eq!(series.years.len(), 10);
        assert!(series.breakeven_year.is_some());
    }

    #[test]
    fn r2_cba_round_trip_via_json_preserves_numbers() {
        let inputs = CbaInputs {
            years: 5,
            discount_rate: 0.08,
            baseline_annual_damage_usd: 20_000.0,
            full_insurance_premium_usd: 4_000.0,
            adaptation_opex_usd: 6_000.0,
            residual_damage_usd: 2_000.0,
            reduced_insurance_premium_usd: 1_000.0,
            carbon_revenue_usd: 500.0,
            total_discounted_investment_usd: 40_000.0,
        };
        let series = calculate_cba_time_series(&inputs);
        let json = serde_json::to_string(&series).unwrap();
        let reloaded: CbaTimeSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(series.breakeven_year, reloaded.breakeven_year);
        assert_eq!(series.total_roi_pct, reloaded.total_roi_pct);
        assert_eq!(series.final_net_benefit_usd, reloaded.final_net_benefit_usd);
    }

    #[test]
    fn greenium_never_exceeds_standard_payment() {
        let report = calculate_green_bond_savings(1_000_000.0, 0.06, 50.0, 10);
        assert!(report.greenium_annual_payment_usd <= report.standard_annual_payment_usd);
        assert!(report.lifetime_savings_usd >= 0.0);
    }
}
