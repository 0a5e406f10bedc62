//! Simulated business outcomes.
//!
//! The demo endpoints branch on random outcomes. The choice is behind a
//! trait so tests and replayable demos can pin it.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::ScenarioConfig;

/// Outcome of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    InvalidPassword,
    UserNotFound,
    AccountLocked,
}

impl LoginOutcome {
    pub const ALL: [LoginOutcome; 4] = [
        LoginOutcome::Success,
        LoginOutcome::InvalidPassword,
        LoginOutcome::UserNotFound,
        LoginOutcome::AccountLocked,
    ];
}

/// Outcome of a data processing request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessingOutcome {
    pub succeeded: bool,
    pub duration: Duration,
    pub records_processed: u32,
}

/// A simulated system condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemCondition {
    pub kind: &'static str,
    pub message: &'static str,
}

pub const SYSTEM_ERRORS: [SystemCondition; 4] = [
    SystemCondition {
        kind: "database_connection_failed",
        message: "Database connection timeout",
    },
    SystemCondition {
        kind: "memory_limit_exceeded",
        message: "Memory usage exceeded 90%",
    },
    SystemCondition {
        kind: "external_service_unavailable",
        message: "External API service unreachable",
    },
    SystemCondition {
        kind: "disk_space_low",
        message: "Disk space below 5%",
    },
];

pub const SYSTEM_WARNINGS: [SystemCondition; 4] = [
    SystemCondition {
        kind: "high_cpu_usage",
        message: "CPU usage above 80%",
    },
    SystemCondition {
        kind: "slow_response_time",
        message: "Response time above 2 seconds",
    },
    SystemCondition {
        kind: "cache_miss_rate_high",
        message: "Cache miss rate above 50%",
    },
    SystemCondition {
        kind: "connection_pool_low",
        message: "Connection pool usage above 85%",
    },
];

/// Decides simulated outcomes for the demo endpoints.
pub trait ScenarioPicker: Send + Sync {
    fn login(&self) -> LoginOutcome;
    fn processing(&self) -> ProcessingOutcome;
    fn system_error(&self) -> SystemCondition;
    fn system_warning(&self) -> SystemCondition;
}

/// Random outcomes with the configured failure rate and timing.
#[derive(Debug, Clone)]
pub struct RandomScenarios {
    config: ScenarioConfig,
}

impl RandomScenarios {
    pub fn new(config: ScenarioConfig) -> Self {
        Self { config }
    }
}

impl ScenarioPicker for RandomScenarios {
    fn login(&self) -> LoginOutcome {
        *LoginOutcome::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&LoginOutcome::Success)
    }

    fn processing(&self) -> ProcessingOutcome {
        let mut rng = rand::thread_rng();
        let (min, max) = (self.config.processing_min_ms, self.config.processing_max_ms);
        let millis = if min < max { rng.gen_range(min..=max) } else { min };
        ProcessingOutcome {
            succeeded: !rng.gen_bool(self.config.processing_failure_rate.clamp(0.0, 1.0)),
            duration: Duration::from_millis(millis),
            records_processed: rng.gen_range(1..=1000),
        }
    }

    fn system_error(&self) -> SystemCondition {
        *SYSTEM_ERRORS
            .choose(&mut rand::thread_rng())
            .unwrap_or(&SYSTEM_ERRORS[0])
    }

    fn system_warning(&self) -> SystemCondition {
        *SYSTEM_WARNINGS
            .choose(&mut rand::thread_rng())
            .unwrap_or(&SYSTEM_WARNINGS[0])
    }
}

/// Always picks the same outcomes. For tests and replayable demos.
#[derive(Debug, Clone)]
pub struct FixedScenarios {
    pub login: LoginOutcome,
    pub processing: ProcessingOutcome,
    pub system_error: SystemCondition,
    pub system_warning: SystemCondition,
}

impl Default for FixedScenarios {
    fn default() -> Self {
        Self {
            login: LoginOutcome::Success,
            processing: ProcessingOutcome {
                succeeded: true,
                duration: Duration::ZERO,
                records_processed: 42,
            },
            system_error: SYSTEM_ERRORS[0],
            system_warning: SYSTEM_WARNINGS[0],
        }
    }
}

impl ScenarioPicker for FixedScenarios {
    fn login(&self) -> LoginOutcome {
        self.login
    }

    fn processing(&self) -> ProcessingOutcome {
        self.processing
    }

    fn system_error(&self) -> SystemCondition {
        self.system_error
    }

    fn system_warning(&self) -> SystemCondition {
        self.system_warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_processing_respects_config() {
        let picker = RandomScenarios::new(ScenarioConfig {
            processing_failure_rate: 1.0,
            processing_min_ms: 5,
            processing_max_ms: 10,
        });
        for _ in 0..50 {
            let outcome = picker.processing();
            assert!(!outcome.succeeded);
            assert!(outcome.duration >= Duration::from_millis(5));
            assert!(outcome.duration <= Duration::from_millis(10));
            assert!((1..=1000).contains(&outcome.records_processed));
        }
    }

    #[test]
    fn test_random_picks_come_from_tables() {
        let picker = RandomScenarios::new(ScenarioConfig::default());
        for _ in 0..20 {
            assert!(LoginOutcome::ALL.contains(&picker.login()));
            assert!(SYSTEM_ERRORS.contains(&picker.system_error()));
            assert!(SYSTEM_WARNINGS.contains(&picker.system_warning()));
        }
    }
}
