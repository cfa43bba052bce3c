//! Fluent builder for constructing a [`CampaignRunner`].

use cf_core::SimRng;
use cf_mobility::Stepper;
use cf_schedule::{ScheduleSource, SpawnQueue};
use cf_spatial::{ModeSelector, RouteOracle, RouteOracleClient, WeightedModes};

use crate::{
    CampaignConfig, CampaignRunner, CongestionMonitor, ReroutingController, RunContext, SimError, SimResult,
    SpawnScheduler,
};

/// Fluent builder for [`CampaignRunner<Src, O, S>`].
///
/// # Required inputs
///
/// - [`CampaignConfig`] (validated by `build`)
/// - `Src: ScheduleSource` (e.g. [`cf_schedule::CsvScheduleSource`])
/// - `O: RouteOracle` (e.g. [`cf_spatial::DijkstraOracle`])
/// - `S: Stepper` (e.g. [`cf_mobility::WalkStepper`])
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                                   |
/// |-----------------------|-------------------------------------------|
/// | `.mode_selector(s)`   | `WeightedModes` from `config.mode_weights` |
///
/// # Example
///
/// ```rust,ignore
/// let mut runner = CampaignBuilder::new(config, source, DijkstraOracle::new(net.clone()), stepper)
///     .build()?;
/// runner.run(&mut NoopObserver)?;
/// ```
pub struct CampaignBuilder<Src, O, S> {
    config:   CampaignConfig,
    source:   Src,
    oracle:   O,
    stepper:  S,
    selector: Option<Box<dyn ModeSelector>>,
}

impl<Src, O, S> CampaignBuilder<Src, O, S>
where
    Src: ScheduleSource,
    O: RouteOracle,
    S: Stepper,
{
    pub fn new(config: CampaignConfig, source: Src, oracle: O, stepper: S) -> Self {
        Self { config, source, oracle, stepper, selector: None }
    }

    /// Replace the weighted random mode choice, e.g. with a
    /// [`cf_spatial::ScriptedModes`] in tests.
    pub fn mode_selector(mut self, selector: Box<dyn ModeSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Validate the configuration and return a ready-to-run runner.  No
    /// schedule is loaded and no stepper session is opened yet.
    pub fn build(self) -> SimResult<CampaignRunner<Src, O, S>> {
        self.config.validate()?;
        if self.stepper.is_open() {
            return Err(SimError::SessionFault("stepper session already open".into()));
        }

        let selector = match self.selector {
            Some(s) => s,
            None => Box::new(
                WeightedModes::new(self.config.mode_weights).map_err(|e| SimError::Config(e.to_string()))?,
            ),
        };
        let client = RouteOracleClient::new(self.oracle, selector, self.config.client);

        Ok(CampaignRunner {
            scheduler: SpawnScheduler::new(&self.config),
            monitor:   CongestionMonitor::new(&self.config),
            rerouter:  ReroutingController::new(&self.config),
            ctx:       RunContext::new(),
            clock:     self.config.run.make_clock(),
            rng:       SimRng::new(self.config.run.seed),
            loaded:    None,
            queue:     SpawnQueue::new(),
            buildings: Vec::new(),
            runs_done: 0,
            source:    self.source,
            stepper:   self.stepper,
            client,
            config:    self.config,
        })
    }
}
