//! Engine configuration with documented constants
//!
//! Scheduling values consumed by whatever drives the decision pipeline.
//! The scoring stages never read these; they are passed to the
//! commander and the runner explicitly.

/// Configuration for the surrounding scheduler
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // === TIME BUDGET ===
    /// Soft wall-clock budget for one decision cycle (milliseconds)
    ///
    /// `AiCommander::dispatch` stops offering fallback candidates once a
    /// dispatch has run past this budget.
    pub decision_budget_ms: u64,

    /// Attempts a driver makes before passing the turn
    ///
    /// A retry happens when a dispatched action leaves the state unchanged
    /// (the rule engine refused it). `AiCommander::dispatch` tries at most
    /// this many ranked candidates before giving up.
    pub max_retries: u32,

    // === FEINTS ===
    /// Turns that must pass after a feint before another is allowed
    pub feint_cooldown: u32,

    // === DIAGNOSTICS ===
    /// How many candidates the decision info lists before and after reranking
    pub candidate_view_limit: usize,

    /// Maximum distinct rejection reasons kept per decision
    pub rejection_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decision_budget_ms: 1200,
            max_retries: 6,
            feint_cooldown: 2,
            candidate_view_limit: 5,
            rejection_limit: 8,
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.decision_budget_ms == 0 {
            return Err("decision_budget_ms must be positive".into());
        }

        if self.candidate_view_limit == 0 || self.rejection_limit == 0 {
            return Err(format!(
                "diagnostic limits must be positive (candidates {}, rejections {})",
                self.candidate_view_limit, self.rejection_limit
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = EngineConfig {
            decision_budget_ms: 0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
