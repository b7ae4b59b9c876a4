use tracing::debug;

use crate::projection::{project, CompoundFrequency, ProjectionRequest, ProjectionResult};
use crate::{base_units_to_decimal, parse_token_amount, CoreResult, PoolParameters, UserPosition};

const DEFAULT_DURATION_DAYS: u32 = 365;

/// Inputs of the "what would I earn" calculator together with the pool and
/// position snapshots they are read against.
///
/// The state is owned by whoever drives the view and handed to the
/// projection engine by value. Nothing in here is shared or global.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatorState {
    pool: Option<PoolParameters>,
    position: Option<UserPosition>,
    principal: f64,
    apr_override: Option<f64>,
    duration_days: u32,
    compound_frequency: CompoundFrequency,
    compound_mode: bool,
}

impl Default for CalculatorState {
    fn default() -> Self {
        Self {
            pool: None,
            position: None,
            principal: 0.0,
            apr_override: None,
            duration_days: DEFAULT_DURATION_DAYS,
            compound_frequency: CompoundFrequency::default(),
            compound_mode: false,
        }
    }
}

impl CalculatorState {
    /// Replace the pool snapshot with a fresh one from the read-cache.
    pub fn set_pool(&mut self, pool: PoolParameters) {
        self.pool = Some(pool);
    }

    /// Replace the position snapshot with a fresh one from the read-cache.
    pub fn set_position(&mut self, position: UserPosition) {
        self.position = Some(position);
    }

    /// Latest pool snapshot, if any arrived yet
    pub fn pool(&self) -> Option<&PoolParameters> {
        self.pool.as_ref()
    }

    /// Latest position snapshot, if any arrived yet
    pub fn position(&self) -> Option<&UserPosition> {
        self.position.as_ref()
    }

    /// Set the principal as a decimal token amount.
    pub fn set_principal(&mut self, principal: f64) {
        self.principal = principal;
    }

    /// Set the principal from user input, validated against the pool's
    /// decimals (18 when no pool is known yet).
    pub fn set_principal_input(&mut self, input: &str) -> CoreResult<()> {
        let decimals = self.decimals();
        let amount = parse_token_amount(input, decimals)?;
        self.principal = base_units_to_decimal(amount, decimals);
        Ok(())
    }

    /// Project the amount already staked instead of a hypothetical one.
    /// Returns false, leaving the principal untouched, without a position.
    pub fn use_staked_principal(&mut self) -> bool {
        let Some(position) = &self.position else {
            return false;
        };
        self.principal = base_units_to_decimal(position.staked_amount, self.decimals());
        true
    }

    /// Explicit APR, or `None` to fall back to the pool's emission rate.
    pub fn set_apr_percent(&mut self, apr_percent: Option<f64>) {
        self.apr_override = apr_percent;
    }

    /// Projection length in days
    pub fn set_duration_days(&mut self, duration_days: u32) {
        self.duration_days = duration_days;
    }

    /// Reinvestment frequency of the compound curve
    pub fn set_compound_frequency(&mut self, frequency: CompoundFrequency) {
        self.compound_frequency = frequency;
    }

    /// Whether compound figures are the headline ones
    pub fn set_compound_mode(&mut self, compound_mode: bool) {
        self.compound_mode = compound_mode;
    }

    /// APR used for the projection: the explicit one when set, otherwise the
    /// one implied by the pool, otherwise zero.
    pub fn apr_percent(&self) -> f64 {
        if let Some(apr) = self.apr_override {
            return apr;
        }
        match self.pool.as_ref().and_then(PoolParameters::estimated_apr_percent) {
            Some(apr) => apr,
            None => {
                debug!("No APR available yet, projecting a zero yield");
                0.0
            }
        }
    }

    /// Snapshot of the current inputs as an engine request.
    pub fn request(&self) -> ProjectionRequest {
        ProjectionRequest {
            principal: self.principal,
            apr_percent: self.apr_percent(),
            duration_days: self.duration_days,
            compound_frequency: self.compound_frequency,
            compound_mode: self.compound_mode,
        }
    }

    /// Run the projection engine over the current inputs.
    pub fn project(&self) -> ProjectionResult {
        project(&self.request())
    }

    fn decimals(&self) -> u8 {
        self.pool.as_ref().map(|pool| pool.decimals).unwrap_or(18)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreError, U256};

    fn pool() -> PoolParameters {
        PoolParameters {
            total_staked: U256::from(1_000_000_000u64),
            // 20% of the stake per year, rounded down to whole units per second
            reward_rate_per_unit_time: U256::from(6u64),
            decimals: 6,
            ..Default::default()
        }
    }

    #[test]
    fn explicit_apr_wins_over_pool_estimate() {
        let mut state = CalculatorState::default();
        state.set_pool(pool());
        state.set_apr_percent(Some(20.0));
        assert_eq!(state.apr_percent(), 20.0);

        state.set_apr_percent(None);
        let estimated = pool().estimated_apr_percent().unwrap();
        assert_eq!(state.apr_percent(), estimated);
    }

    #[test]
    fn no_pool_and_no_apr_projects_zero() {
        let mut state = CalculatorState::default();
        state.set_principal(100.0);
        assert_eq!(state.project(), ProjectionResult::zero());
    }

    #[test]
    fn principal_input_uses_pool_decimals() {
        let mut state = CalculatorState::default();
        state.set_pool(pool());
        state.set_principal_input("12.5").unwrap();
        assert_eq!(state.request().principal, 12.5);

        let err = state.set_principal_input("0.0000001").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
        assert_eq!(state.request().principal, 12.5);
    }

    #[test]
    fn staked_amount_can_seed_the_principal() {
        let mut state = CalculatorState::default();
        assert!(!state.use_staked_principal());

        state.set_pool(pool());
        state.set_position(UserPosition {
            staked_amount: U256::from(250_000_000u64),
            ..Default::default()
        });
        assert!(state.use_staked_principal());
        assert_eq!(state.request().principal, 250.0);
    }

    #[test]
    fn request_reflects_every_input() {
        let mut state = CalculatorState::default();
        state.set_principal(100.0);
        state.set_apr_percent(Some(20.0));
        state.set_duration_days(90);
        state.set_compound_frequency(CompoundFrequency::Monthly);
        state.set_compound_mode(true);

        assert_eq!(
            state.request(),
            ProjectionRequest {
                principal: 100.0,
                apr_percent: 20.0,
                duration_days: 90,
                compound_frequency: CompoundFrequency::Monthly,
                compound_mode: true,
            }
        );
        let result = state.project();
        assert_eq!(result, project(&state.request()));
        assert_eq!(result.headline_reward(), result.compound_reward);
    }
}
