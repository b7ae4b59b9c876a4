//! Projects simple and compound yield for a staking position.
//!
//! Everything here is a pure function of its inputs: no store, no clock, no
//! network. The same request always yields a bit-identical result.

use strum::{Display, EnumIter};

/// Days in the year used to turn a duration into a fraction of a year.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// The breakdown never samples beyond one year.
const MAX_SAMPLED_DAYS: u32 = 365;

/// Target number of strides in the breakdown series.
const BREAKDOWN_STRIDES: u32 = 30;

/// How often rewards are notionally reinvested.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum CompoundFrequency {
    /// 365 periods per year
    #[default]
    Daily,
    /// 52 periods per year
    Weekly,
    /// 12 periods per year
    Monthly,
}

impl CompoundFrequency {
    /// Compounding periods per year
    pub fn periods_per_year(&self) -> f64 {
        match self {
            CompoundFrequency::Daily => 365.0,
            CompoundFrequency::Weekly => 52.0,
            CompoundFrequency::Monthly => 12.0,
        }
    }
}

/// Calculator input. `principal` is a decimal token amount, not base units.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionRequest {
    /// amount being staked
    pub principal: f64,
    /// annual percentage rate, `20.0` meaning 20%
    pub apr_percent: f64,
    /// length of the projection
    pub duration_days: u32,
    /// reinvestment frequency for the compound curve
    pub compound_frequency: CompoundFrequency,
    /// whether the compound figures are the headline ones
    pub compound_mode: bool,
}

/// One sample of both curves, expressed as position value (principal + reward).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownPoint {
    /// days since the start of the projection
    pub day_offset: u32,
    /// value under simple interest
    pub simple_value: f64,
    /// value under compound interest
    pub compound_value: f64,
}

/// Result of [`project`]. Built fresh for every input change.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionResult {
    /// reward without reinvestment
    pub simple_reward: f64,
    /// simple reward relative to principal, in percent
    #[serde(rename = "simpleROIPercent")]
    pub simple_roi_percent: f64,
    /// reward with reinvestment at the selected frequency
    pub compound_reward: f64,
    /// compound reward relative to principal, in percent
    #[serde(rename = "compoundROIPercent")]
    pub compound_roi_percent: f64,
    /// principal plus compound reward
    pub total_with_compound: f64,
    /// compound reward minus simple reward
    pub difference: f64,
    /// sampled curve points, ordered by day
    pub breakdown: Vec<BreakdownPoint>,
    compound_mode: bool,
}

impl ProjectionResult {
    /// The defined result for a zero or negative principal or APR.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Reward the view should lead with, depending on the compounding toggle.
    pub fn headline_reward(&self) -> f64 {
        if self.compound_mode {
            self.compound_reward
        } else {
            self.simple_reward
        }
    }

    /// ROI the view should lead with, depending on the compounding toggle.
    pub fn headline_roi_percent(&self) -> f64 {
        if self.compound_mode {
            self.compound_roi_percent
        } else {
            self.simple_roi_percent
        }
    }
}

/// Project rewards for `request`.
pub fn project(request: &ProjectionRequest) -> ProjectionResult {
    let ProjectionRequest {
        principal,
        apr_percent,
        duration_days,
        compound_frequency,
        compound_mode,
    } = *request;

    let positive = |value: f64| value.is_finite() && value > 0.0;
    if !positive(principal) || !positive(apr_percent) {
        return ProjectionResult::zero();
    }

    let apr = apr_percent / 100.0;
    let periods_per_year = compound_frequency.periods_per_year();
    let years = f64::from(duration_days) / DAYS_PER_YEAR;

    let simple_reward = simple_reward(principal, apr, years);
    let compound_reward = compound_reward(principal, apr, periods_per_year, years);

    ProjectionResult {
        simple_reward,
        simple_roi_percent: simple_reward / principal * 100.0,
        compound_reward,
        compound_roi_percent: compound_reward / principal * 100.0,
        total_with_compound: principal + compound_reward,
        difference: compound_reward - simple_reward,
        breakdown: breakdown(principal, apr, periods_per_year, duration_days),
        compound_mode,
    }
}

fn simple_reward(principal: f64, apr: f64, years: f64) -> f64 {
    principal * apr * years
}

// Before a full period has elapsed nothing has been reinvested yet, so the
// compound curve follows the simple one. At exactly one period both agree.
fn compound_reward(principal: f64, apr: f64, periods_per_year: f64, years: f64) -> f64 {
    let periods = periods_per_year * years;
    if periods <= 1.0 {
        return simple_reward(principal, apr, years);
    }
    principal * ((1.0 + apr / periods_per_year).powf(periods) - 1.0)
}

fn breakdown(
    principal: f64,
    apr: f64,
    periods_per_year: f64,
    duration_days: u32,
) -> Vec<BreakdownPoint> {
    let sampled_days = duration_days.min(MAX_SAMPLED_DAYS);
    let stride = (sampled_days / BREAKDOWN_STRIDES).max(1);

    (0..=sampled_days)
        .step_by(stride as usize)
        .map(|day| {
            let years = f64::from(day) / DAYS_PER_YEAR;
            BreakdownPoint {
                day_offset: day,
                simple_value: principal + simple_reward(principal, apr, years),
                compound_value: principal + compound_reward(principal, apr, periods_per_year, years),
            }
        })
        .collect()
}
