//! Ties validation, detection and the selected backend together.

use log::{error, info, warn};

use crate::{
    backend::{BackendKind, detect::detect},
    config::{ConfigRequest, HostPaths, NetworkConfig},
    error::StaticIpError,
    helper::command::CommandRunner,
};

/// A validated configuration and the backend that will carry it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub config: NetworkConfig,
    pub backend: BackendKind,
}

impl Plan {
    /// Set when the chosen backend leaves nothing behind for the next boot.
    pub fn reboot_warning(&self) -> Option<&'static str> {
        (!self.backend.is_persistent()).then_some(
            "No persistent network manager detected, applying a temporary iproute2 configuration",
        )
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.config)?;
        write!(f, "  Backend   : {}", self.backend)
    }
}

pub struct Orchestrator<'a> {
    paths: &'a HostPaths,
    runner: &'a dyn CommandRunner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(paths: &'a HostPaths, runner: &'a dyn CommandRunner) -> Self {
        Orchestrator { paths, runner }
    }

    /// Validates `request`, then picks a backend unless one was forced.
    ///
    /// Nothing on the host is inspected when validation fails.
    pub fn plan(
        &self,
        request: &ConfigRequest,
        forced: Option<BackendKind>,
    ) -> Result<Plan, StaticIpError> {
        let config = request.validate()?;
        let backend = match forced {
            Some(backend) => {
                info!(target: "staticip::orchestrator::plan", "-- Backend forced to {backend}");
                backend
            }
            None => detect(self.paths, self.runner),
        };
        Ok(Plan { config, backend })
    }

    pub fn apply(&self, plan: &Plan) -> Result<(), StaticIpError> {
        if let Some(message) = plan.reboot_warning() {
            warn!(target: "staticip::orchestrator::apply", "{message}");
        }
        info!(target: "staticip::orchestrator::apply", "-- Applying {} to {} via {}", plan.config.cidr(), plan.config.interface(), plan.backend);
        plan.backend
            .apply(&plan.config, self.paths, self.runner)
            .inspect_err(|err| {
                error!(target: "staticip::orchestrator::apply", "{} backend failed: {err}", plan.backend);
            })
    }

    /// Plans, hands the plan to `report` and applies it.
    pub fn configure(
        &self,
        request: &ConfigRequest,
        forced: Option<BackendKind>,
        report: impl FnOnce(&Plan),
    ) -> Result<Plan, StaticIpError> {
        let plan = self.plan(request, forced)?;
        report(&plan);
        self.apply(&plan)?;
        Ok(plan)
    }
}
