use failsafe::{backoff, failure_policy, Config};
use std::time::Duration;

/// Circuit breaker type guarding calls to the scoring service.
pub type ScoringCircuitBreaker =
    failsafe::StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates a circuit breaker for scoring-service calls so an unreachable
/// backend fails fast instead of stalling every region on its timeout.
///
/// # Configuration
///
/// - **Failure threshold**: `consecutive_failures` in a row trigger OPEN state.
/// - **Backoff**: Exponential backoff from 10s to 60s before attempting recovery.
///
/// # States
///
/// - **CLOSED**: Normal operation, requests pass through.
/// - **OPEN**: Too many failures, requests are rejected and surface as `Unavailable`.
/// - **HALF_OPEN**: Testing if service recovered.
pub fn create_scoring_circuit_breaker(consecutive_failures: u32) -> ScoringCircuitBreaker {
    let backoff_strategy = backoff::exponential(
        Duration::from_secs(10), // Initial delay
        Duration::from_secs(60), // Maximum delay
    );

    let failure_policy = failure_policy::consecutive_failures(consecutive_failures, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
