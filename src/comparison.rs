//! Side-by-side comparison of two prediction panels.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::model::PredictionResult;
use crate::panel::PredictionPanel;
use crate::reference_data::ReferenceData;
use crate::service::PredictionService;

/// Which of the two compared scenarios.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    pub fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Winner of one metric and the absolute gap between the two sides.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PairwiseOutcome {
    pub winner: Side,
    pub magnitude: f64,
}

impl PairwiseOutcome {
    /// `A` wins only when `a_wins` holds; ties and anything else go to `B`.
    fn decide(a_wins: bool, a: f64, b: f64) -> Self {
        Self {
            winner: if a_wins { Side::A } else { Side::B },
            magnitude: (a - b).abs(),
        }
    }
}

/// Derived metrics once both sides hold a prediction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ComparisonSummary {
    /// Strictly greater `roi_percentage`.
    pub roi: PairwiseOutcome,
    /// Strictly greater `predicted_income`.
    pub income: PairwiseOutcome,
    /// Strictly lower `total_loan_amount`.
    pub cost: PairwiseOutcome,
}

impl ComparisonSummary {
    pub fn between(a: &PredictionResult, b: &PredictionResult) -> Self {
        let roi_diff = a.roi_percentage - b.roi_percentage;
        let income_diff = a.predicted_income - b.predicted_income;
        let cost_diff = a.total_loan_amount - b.total_loan_amount;
        Self {
            roi: PairwiseOutcome::decide(roi_diff > 0.0, a.roi_percentage, b.roi_percentage),
            income: PairwiseOutcome::decide(
                income_diff > 0.0,
                a.predicted_income,
                b.predicted_income,
            ),
            cost: PairwiseOutcome::decide(
                cost_diff < 0.0,
                a.total_loan_amount,
                b.total_loan_amount,
            ),
        }
    }
}

/// Owns panels A and B. The panels never share state; the coordinator only
/// reads their results to build a [`ComparisonSummary`].
pub struct ComparisonCoordinator {
    a: PredictionPanel,
    b: PredictionPanel,
}

impl ComparisonCoordinator {
    pub fn new(service: Arc<dyn PredictionService>, reference: Arc<ReferenceData>) -> Self {
        Self {
            a: PredictionPanel::new(Side::A.label(), Arc::clone(&service), Arc::clone(&reference)),
            b: PredictionPanel::new(Side::B.label(), service, reference),
        }
    }

    pub fn panel(&self, side: Side) -> &PredictionPanel {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    pub fn panel_mut(&mut self, side: Side) -> &mut PredictionPanel {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    /// Comparison of the two held predictions, if both exist.
    pub fn get_comparison(&self) -> Option<ComparisonSummary> {
        let a = self.a.prediction()?;
        let b = self.b.prediction()?;
        Some(ComparisonSummary::between(a, b))
    }

    /// Submit both panels; their requests run concurrently.
    ///
    /// Returns whether each side actually issued a request.
    pub fn submit_both(&mut self) -> (bool, bool) {
        (self.a.submit_prediction(), self.b.submit_prediction())
    }

    pub fn poll(&mut self) -> bool {
        let a = self.a.poll();
        let b = self.b.poll();
        a || b
    }

    pub fn is_busy(&self) -> bool {
        self.a.is_busy() || self.b.is_busy()
    }

    pub fn wait_until_idle(&mut self) {
        self.a.wait_until_idle();
        self.b.wait_until_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(roi: f64, income: f64, loan: f64) -> PredictionResult {
        PredictionResult {
            predicted_income: income,
            range_low: income * 0.8,
            range_high: income * 1.2,
            annual_cost: loan / 4.0,
            total_loan_amount: loan,
            monthly_payment: loan / 80.0,
            total_interest_paid: loan * 0.6,
            roi_percentage: roi,
            years_to_break_even: Some(5.0),
        }
    }

    #[test]
    fn a_wins_every_metric() {
        let summary =
            ComparisonSummary::between(&result(12.0, 60000.0, 40000.0), &result(8.0, 55000.0, 50000.0));
        assert_eq!(summary.roi, PairwiseOutcome { winner: Side::A, magnitude: 4.0 });
        assert_eq!(summary.income, PairwiseOutcome { winner: Side::A, magnitude: 5000.0 });
        assert_eq!(summary.cost, PairwiseOutcome { winner: Side::A, magnitude: 10000.0 });
    }

    #[test]
    fn b_wins_when_strictly_better() {
        let summary =
            ComparisonSummary::between(&result(-2.5, 41000.0, 90000.0), &result(3.5, 47000.0, 30000.0));
        assert_eq!(summary.roi.winner, Side::B);
        assert_eq!(summary.roi.magnitude, 6.0);
        assert_eq!(summary.income.winner, Side::B);
        assert_eq!(summary.cost.winner, Side::B);
        assert_eq!(summary.cost.magnitude, 60000.0);
    }

    #[test]
    fn ties_resolve_to_b() {
        let summary =
            ComparisonSummary::between(&result(9.0, 50000.0, 20000.0), &result(9.0, 50000.0, 20000.0));
        for outcome in [summary.roi, summary.income, summary.cost] {
            assert_eq!(outcome.winner, Side::B);
            assert_eq!(outcome.magnitude, 0.0);
        }
    }
}
