//! Tonechain Engine - real-time effects chain hosting
//!
//! Runs an ordered chain of up to eight effects on mono audio blocks
//! delivered by a hardware callback, while control threads change
//! parameters, bypass flags and the chain itself.
//!
//! ## Architecture
//!
//! ```text
//!  control threads                         audio callback
//!  ───────────────                         ──────────────
//!  ChainController ──validate──▶ UpdateQueue ──drain ≤ N──▶ Engine::on_block
//!       │  mirror of the chain     (bounded,                 │
//!       │  (targets, bypass,        fail-fast)               ▼
//!       │   node handles)                       live ChainSnapshot (ArcSwap)
//!       └──── retire list (shared), freed once unreachable ◀┘
//! ```
//!
//! - **[`EffectNode`]**: one effect with its parameter ramps, bypass
//!   crossfade and DSP memory.
//! - **[`ChainSnapshot`]**: an immutable ordered list of nodes, tagged with a
//!   generation. Topology changes build a new one off the audio thread.
//!   Removed nodes fade out before the settled chain takes over.
//! - **[`UpdateMessage`]**: parameter change, bypass toggle or topology swap.
//! - **[`Engine`]**: drains updates, processes the block, reports underruns.
//! - **[`ChainController`]**: validation, editing, export/import, lifecycle.
//!
//! The audio context never allocates, frees, blocks or logs. It reports
//! through counters ([`EngineStatus`]) and [`EngineEvent`]s.
//!
//! ## Example
//!
//! ```rust
//! use tonechain_effects::EffectType;
//! use tonechain_engine::{Engine, EngineConfig, OfflineDriver};
//!
//! let (engine, controller) = Engine::new(EngineConfig::default()).unwrap();
//! let boost = controller.add_effect(EffectType::Boost).unwrap().unwrap();
//! controller.enqueue_parameter_change(boost, "gain_db", 6.0).unwrap();
//! controller.start().unwrap();
//!
//! let mut driver = OfflineDriver::new(engine);
//! let output = driver.render(&vec![0.1; 4800]);
//! assert!(output[4799] > 0.19);
//!
//! let saved = controller.export_state();
//! assert_eq!(saved.nodes[0].param("gain_db"), Some(6.0));
//! ```

pub mod clock;
pub mod config;
pub mod controller;
pub mod description;
pub mod driver;
pub mod edit;
pub mod engine;
pub mod error;
pub mod event;
pub mod gesture;
pub mod message;
pub mod node;
pub mod queue;
mod shared;
pub mod snapshot;
pub mod state;

pub use clock::{BlockClock, FixedClock, MonotonicClock};
pub use config::EngineConfig;
pub use controller::ChainController;
pub use description::{ChainDescription, NodeDescription, validate_parameter};
pub use driver::OfflineDriver;
pub use edit::TopologyEdit;
pub use engine::Engine;
pub use error::ControlError;
pub use event::{EngineEvent, FaultReason, log_events};
pub use gesture::{GesturePhase, ReorderGesture};
pub use message::UpdateMessage;
pub use node::{EffectNode, NodeId};
pub use queue::{PushError, UpdateReceiver, UpdateSender, update_queue};
pub use shared::EngineStatus;
pub use snapshot::{ChainSnapshot, MAX_CHAIN_LEN};
pub use state::EngineState;
