//! `cf-sim` — the entity-lifecycle scheduling and congestion-feedback engine.
//!
//! # Tick loop
//!
//! ```text
//! for day_type in config.day_types:
//!   for run in 1..=config.runs_per_day_type:
//!     reset RunContext; reload schedule if day_type changed; open session
//!     for tick in 0..horizon (or until drained):
//!       ① Spawn   — SpawnScheduler injects the events due at this time of day
//!       ② Step    — stepper.advance()
//!       on sampling ticks:
//!       ③ Sample  — CongestionMonitor updates lane densities / congested set
//!       ④ Reroute — ReroutingController moves entities off congested lanes
//!       ⑤ Record  — StatsAggregator emits a RunStatsSnapshot
//!     close session; flush the run's records
//! ```
//!
//! The engine only sees its collaborators through traits:
//! [`cf_schedule::ScheduleSource`], [`cf_spatial::RouteOracle`] and
//! [`cf_mobility::Stepper`].
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`config`]      | `CampaignConfig`, `CongestionPolicy`                       |
//! | [`context`]     | `RunContext`, `PedestrianEntity`, `LifecycleState`         |
//! | [`spawner`]     | `SpawnScheduler`, `BatchResult`, `SpawnOutcome`            |
//! | [`congestion`]  | `CongestionMonitor`, `CongestedLaneSet`, `LaneLengthTable` |
//! | [`reroute`]     | `ReroutingController`                                      |
//! | [`telemetry`]   | `EntityTelemetry`, `collect_telemetry`                     |
//! | [`stats`]       | `StatsAggregator`, `RunStatsSnapshot`                      |
//! | [`run`]         | the per-run tick loop, `RunEnd`                            |
//! | [`campaign`]    | `CampaignRunner`, `RunSummary`, `CampaignReport`           |
//! | [`builder`]     | `CampaignBuilder`                                          |
//! | [`observer`]    | `RunObserver`, `NoopObserver`, `RunLabel`                  |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                  |
//! |-----------|---------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for per-sample lane counting. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use cf_sim::{CampaignBuilder, CampaignConfig, NoopObserver};
//!
//! let mut runner = CampaignBuilder::new(CampaignConfig::default(), source, oracle, stepper)
//!     .build()?;
//! let report = runner.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod campaign;
pub mod config;
pub mod congestion;
pub mod context;
pub mod error;
pub mod observer;
pub mod reroute;
pub mod run;
pub mod spawner;
pub mod stats;
pub mod telemetry;


pub use builder::CampaignBuilder;
pub use campaign::{CampaignReport, CampaignRunner, RunSummary};
pub use config::{CampaignConfig, CongestionPolicy};
pub use congestion::{
    CongestedLaneSet, CongestionMonitor, CongestionReport, LaneDensitySample, LaneLengthTable,
};
pub use context::{LifecycleState, PedestrianEntity, RunContext};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, RunLabel, RunObserver};
pub use reroute::{RerouteDecision, RerouteReport, ReroutingController};
pub use run::RunEnd;
pub use spawner::{BatchResult, ShortBatch, SkipReason, SpawnInputs, SpawnOutcome, SpawnScheduler};
pub use stats::{FinishedEntity, RunStatsSnapshot, StatsAggregator, TrackedEntity};
pub use telemetry::{EntityTelemetry, collect_telemetry};
