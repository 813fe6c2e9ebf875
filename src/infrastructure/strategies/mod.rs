//! Renewal strategy implementations.
//!
//! One strategy per auth mechanism. `build_strategy_map` wires each
//! configured service to the strategy its mechanism calls for, sharing
//! instances across services.

pub mod helper;
pub mod interactive_browser;
pub mod programmatic_login;
pub mod silent_exchange;

pub use helper::HelperProcessStrategy;
pub use interactive_browser::InteractiveBrowserStrategy;
pub use programmatic_login::ProgrammaticLoginStrategy;
pub use silent_exchange::SilentExchangeStrategy;

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{AuthMechanism, OrchestratorConfig, ServiceDefinition};
use crate::domain::ports::RefreshStrategy;

/// Resolve every configured service to its renewal strategy.
///
/// Silent-exchange services without a token endpoint fall back to their
/// helper command.
pub fn build_strategy_map(
    services: &[ServiceDefinition],
    orchestrator: &OrchestratorConfig,
) -> Result<HashMap<String, Arc<dyn RefreshStrategy>>> {
    let attempt_timeout = Duration::from_secs(orchestrator.attempt_timeout_secs);

    let silent: Arc<dyn RefreshStrategy> = Arc::new(SilentExchangeStrategy::new(attempt_timeout)?);
    let silent_helper: Arc<dyn RefreshStrategy> = Arc::new(HelperProcessStrategy::new(
        AuthMechanism::SilentExchange,
        attempt_timeout,
    ));
    let login: Arc<dyn RefreshStrategy> =
        Arc::new(ProgrammaticLoginStrategy::new(attempt_timeout));
    let browser: Arc<dyn RefreshStrategy> = Arc::new(InteractiveBrowserStrategy::new(
        attempt_timeout,
        orchestrator.unattended,
    ));

    let mut map = HashMap::new();
    for service in services {
        let strategy = match service.mechanism {
            AuthMechanism::SilentExchange if service.token_endpoint.is_some() => {
                Arc::clone(&silent)
            }
            AuthMechanism::SilentExchange => Arc::clone(&silent_helper),
            AuthMechanism::ProgrammaticLogin => Arc::clone(&login),
            AuthMechanism::InteractiveBrowser => Arc::clone(&browser),
        };
        map.insert(service.id.clone(), strategy);
    }

    Ok(map)
}
