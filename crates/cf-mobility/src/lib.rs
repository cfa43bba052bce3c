//! `cf-mobility` — the stepper boundary and an in-process walking stepper.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`stepper`] | `Stepper` trait, `InjectCommand`                              |
//! | [`state`]   | `WalkState`, `WalkPhase` — per-pedestrian walking state       |
//! | [`store`]   | `WalkStore` — sparse `BTreeMap<EntityId, WalkState>`          |
//! | [`engine`]  | `WalkStepper` — density-slowed walking over a `WalkNetwork`   |
//! | [`error`]   | `StepperError`, `StepperResult<T>`                            |
//!
//! The engine in `cf-sim` is generic over [`Stepper`]; `WalkStepper` lets a
//! campaign run without an external microsimulator.

pub mod engine;
pub mod error;
pub mod state;
pub mod stepper;
pub mod store;


pub use engine::{WalkConfig, WalkStepper, walking_speed_multiplier};
pub use error::{StepperError, StepperResult};
pub use state::{WalkPhase, WalkState};
pub use stepper::{InjectCommand, Stepper};
pub use store::WalkStore;
