//! The `CampaignRunner`: day types × repetitions, one stepper session each.

use cf_core::{SimClock, SimRng, Tick};
use cf_mobility::Stepper;
use cf_schedule::{Building, DayType, ScheduleSource, SpawnQueue};
use cf_spatial::{ClientStats, RouteOracle, RouteOracleClient};

use crate::{
    CampaignConfig, CongestionMonitor, ReroutingController, RunContext, RunEnd, RunLabel, RunObserver,
    ShortBatch, SimResult, SpawnScheduler,
};

// ── Reports ───────────────────────────────────────────────────────────────────

/// What one run did.  Handed to [`RunObserver::on_run_end`] and collected
/// into the [`CampaignReport`].
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub label:           RunLabel,
    /// `None` when the run aborted.
    pub end:             Option<RunEnd>,
    /// First tick that was not simulated.
    pub end_tick:        Tick,
    pub injected:        u64,
    pub skipped:         u64,
    /// Entities the stepper stopped reporting.
    pub finished:        u64,
    pub reroutes:        u64,
    pub snapshots:       u64,
    /// Size of the congested set when the run ended.
    pub congested_lanes: usize,
    pub short_batches:   Vec<ShortBatch>,
    pub client:          ClientStats,
    /// The error that ended the run early.
    pub aborted:         Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CampaignReport {
    pub runs: Vec<RunSummary>,
}

impl CampaignReport {
    pub fn total_injected(&self) -> u64 {
        self.runs.iter().map(|r| r.injected).sum()
    }

    pub fn total_reroutes(&self) -> u64 {
        self.runs.iter().map(|r| r.reroutes).sum()
    }

    /// Runs with at least one short batch.
    pub fn runs_with_short_batches(&self) -> impl Iterator<Item = &RunSummary> {
        self.runs.iter().filter(|r| !r.short_batches.is_empty())
    }
}

// ── CampaignRunner ────────────────────────────────────────────────────────────

/// Drives every run of a campaign in sequence.
///
/// Create via [`CampaignBuilder`][crate::CampaignBuilder].
pub struct CampaignRunner<Src, O, S> {
    pub(crate) config:    CampaignConfig,
    pub(crate) source:    Src,
    pub(crate) client:    RouteOracleClient<O>,
    pub(crate) stepper:   S,
    pub(crate) scheduler: SpawnScheduler,
    pub(crate) monitor:   CongestionMonitor,
    pub(crate) rerouter:  ReroutingController,
    /// Per-run state, reset before every run.
    pub(crate) ctx:       RunContext,
    pub(crate) clock:     SimClock,
    /// Root RNG; each run forks a child from it.
    pub(crate) rng:       SimRng,
    /// Day type whose schedule is in `queue` / `buildings`.
    pub(crate) loaded:    Option<DayType>,
    pub(crate) queue:     SpawnQueue,
    pub(crate) buildings: Vec<Building>,
    pub(crate) runs_done: u64,
}

impl<Src, O, S> CampaignRunner<Src, O, S>
where
    Src: ScheduleSource,
    O: RouteOracle,
    S: Stepper,
{
    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn stepper(&self) -> &S {
        &self.stepper
    }

    pub fn stepper_mut(&mut self) -> &mut S {
        &mut self.stepper
    }

    pub fn client(&self) -> &RouteOracleClient<O> {
        &self.client
    }

    pub fn loaded_day_type(&self) -> Option<DayType> {
        self.loaded
    }

    pub fn queue(&self) -> &SpawnQueue {
        &self.queue
    }

    /// Forget all per-run state, the loaded schedule and the RNG position,
    /// as if the runner had just been built.  The snapping cache is kept.
    pub fn reset(&mut self) {
        self.ctx.reset();
        self.clock = self.config.run.make_clock();
        self.rng = SimRng::new(self.config.run.seed);
        self.loaded = None;
        self.queue = SpawnQueue::new();
        self.buildings.clear();
        self.runs_done = 0;
        self.client.reset_stats();
    }

    /// Run every configured day type `runs_per_day_type` times.
    ///
    /// Stops at the first failed run and returns its error; that run's
    /// partial statistics have already reached `observer`.
    pub fn run<Obs: RunObserver + ?Sized>(&mut self, observer: &mut Obs) -> SimResult<CampaignReport> {
        let day_types = self.config.day_types.clone();
        let runs = self.config.runs_per_day_type;
        tracing::info!(day_types = day_types.len(), runs_per_day_type = runs, "campaign started");

        let mut report = CampaignReport::default();
        for day_type in day_types {
            for run_number in 1..=runs {
                report.runs.push(self.run_day(day_type, run_number, observer)?);
            }
        }
        tracing::info!(
            runs = report.runs.len(),
            injected = report.total_injected(),
            reroutes = report.total_reroutes(),
            "campaign finished"
        );
        Ok(report)
    }

    /// Run one repetition of `day_type`.
    ///
    /// The schedule is reloaded only when `day_type` differs from the last
    /// run's.  Whatever happens inside the run, the stepper session is
    /// closed and `on_run_end` is called before returning.
    #[tracing::instrument(skip(self, observer))]
    pub fn run_day<Obs: RunObserver + ?Sized>(
        &mut self,
        day_type:   DayType,
        run_number: u32,
        observer:   &mut Obs,
    ) -> SimResult<RunSummary> {
        let label = RunLabel { day_type, run_number };
        self.ctx.reset();
        self.client.reset_stats();
        self.clock = self.config.run.make_clock();

        if let Err(e) = self.load_schedule(day_type) {
            tracing::error!(error = %e, "schedule load failed, run aborted");
            return Err(e);
        }

        let mut rng = self.rng.child(self.runs_done);
        self.runs_done += 1;

        self.stepper.open()?;
        self.monitor.prepare(&self.stepper);
        observer.on_run_start(&label);
        tracing::info!(
            events = self.queue.len(),
            pedestrians = self.queue.total_occupancy(),
            "run started"
        );

        let outcome = self.simulate(&label, &mut rng, observer);
        let closed = self.stepper.close();

        let summary = self.summarize(label, &outcome);
        observer.on_run_end(&label, &summary);

        match (outcome, closed) {
            (Err(e), _) => {
                tracing::error!(error = %e, tick = %summary.end_tick, "run aborted");
                Err(e)
            }
            (Ok(_), Err(e)) => {
                tracing::error!(error = %e, "stepper session did not close cleanly");
                Err(e.into())
            }
            (Ok(end), Ok(())) => {
                tracing::info!(
                    ?end,
                    end_tick = %summary.end_tick,
                    injected = summary.injected,
                    skipped = summary.skipped,
                    reroutes = summary.reroutes,
                    short_batches = summary.short_batches.len(),
                    "run finished"
                );
                Ok(summary)
            }
        }
    }

    fn load_schedule(&mut self, day_type: DayType) -> SimResult<()> {
        if self.loaded == Some(day_type) {
            return Ok(());
        }
        self.loaded = None;
        let events = self.source.events_for(day_type)?;
        let buildings = self.source.buildings()?;
        self.queue = SpawnQueue::from_events(events);
        self.buildings = buildings;
        self.loaded = Some(day_type);
        tracing::debug!(
            %day_type,
            keys = self.queue.len(),
            departure_times = self.queue.time_count(),
            buildings = self.buildings.len(),
            "schedule loaded"
        );
        Ok(())
    }

    fn summarize(&self, label: RunLabel, outcome: &SimResult<RunEnd>) -> RunSummary {
        let ctx = &self.ctx;
        RunSummary {
            label,
            end:             outcome.as_ref().ok().copied(),
            end_tick:        self.clock.current_tick,
            injected:        ctx.injected(),
            skipped:         ctx.skipped(),
            finished:        ctx.finished(),
            reroutes:        ctx.reroutes(),
            snapshots:       ctx.stats.samples(),
            congested_lanes: ctx.congested.len(),
            short_batches:   ctx.short_batches().to_vec(),
            client:          self.client.stats(),
            aborted:         outcome.as_ref().err().map(|e| e.to_string()),
        }
    }
}
