//! The audio-side effects engine.
//!
//! [`Engine`] is driven by the audio I/O driver through
//! [`on_block`](Engine::on_block), once per hardware period. Each callback:
//!
//! 1. Checks the lifecycle state and the agreed sample rate.
//! 2. Drains at most `drain_limit` update messages, in arrival order.
//! 3. Runs the block through every active node of the live snapshot,
//!    in `block_size` chunks, sanitizing after each node.
//! 4. Compares the elapsed time against the block deadline and reports
//!    underruns.
//!
//! Nothing here allocates, frees, blocks or logs. Retired snapshots are
//! still referenced by the controller, so dropping them here only
//! decrements a reference count.

use std::sync::Arc;

use crossbeam_channel::bounded;
use tonechain_core::{ProcessContext, sanitize_block};

use crate::clock::{BlockClock, MonotonicClock};
use crate::config::EngineConfig;
use crate::controller::ChainController;
use crate::description::ChainDescription;
use crate::error::ControlError;
use crate::event::{EngineEvent, FaultReason};
use crate::message::UpdateMessage;
use crate::node::NodeRun;
use crate::queue::{UpdateReceiver, update_queue};
use crate::shared::{Counters, EngineShared};
use crate::snapshot::ChainSnapshot;
use crate::state::EngineState;

/// Real-time effects chain engine.
///
/// Created together with its [`ChainController`]; the engine moves to the
/// audio callback, the controller stays with the control threads.
///
/// # Example
///
/// ```rust
/// use tonechain_effects::EffectType;
/// use tonechain_engine::{ChainDescription, Engine, EngineConfig, NodeDescription};
///
/// let chain = ChainDescription::new()
///     .with_node(NodeDescription::new(EffectType::Boost).with_param("gain_db", 6.0));
/// let (mut engine, controller) = Engine::with_chain(EngineConfig::default(), &chain).unwrap();
/// controller.start().unwrap();
///
/// let input = vec![0.1f32; 256];
/// let mut output = vec![0.0f32; 256];
/// engine.on_block(&input, &mut output, 48000);
/// assert!(output[255] > 0.19);
/// ```
pub struct Engine {
    shared: Arc<EngineShared>,
    updates: UpdateReceiver,
    current: Arc<ChainSnapshot>,
    config: EngineConfig,
    ctx: ProcessContext,
    clock: Box<dyn BlockClock>,
    block_index: u64,
}

impl Engine {
    /// Engine with an empty chain.
    pub fn new(config: EngineConfig) -> Result<(Self, ChainController), ControlError> {
        Self::with_chain(config, &ChainDescription::default())
    }

    /// Engine whose chain starts as `chain`.
    ///
    /// Initial nodes start at their described parameters without ramping or
    /// fading in.
    pub fn with_chain(
        config: EngineConfig,
        chain: &ChainDescription,
    ) -> Result<(Self, ChainController), ControlError> {
        config.validate()?;
        chain.validate()?;

        let (entries, snapshot) = ChainController::initial_chain(chain, &config)?;
        let snapshot = Arc::new(snapshot);
        let (event_tx, event_rx) = bounded(config.event_capacity);
        let shared = Arc::new(EngineShared::new(Arc::clone(&snapshot), event_tx));
        let (update_tx, update_rx) = update_queue(config.queue_capacity);

        let controller = ChainController::new(
            Arc::clone(&shared),
            update_tx,
            event_rx,
            config.clone(),
            entries,
            snapshot.generation(),
        );

        tracing::info!(
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            nodes = snapshot.len(),
            latency_ms = config.theoretical_latency_ms(),
            "engine created"
        );

        let engine = Self {
            ctx: ProcessContext::new(config.sample_rate_hz()).with_tempo(config.tempo_bpm),
            shared,
            updates: update_rx,
            current: snapshot,
            config,
            clock: Box::new(MonotonicClock::new()),
            block_index: 0,
        };
        Ok((engine, controller))
    }

    /// Replace the block timer.
    pub fn with_clock(mut self, clock: impl BlockClock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.shared.state.load()
    }

    /// Generation of the chain being processed.
    pub fn generation(&self) -> u64 {
        self.current.generation()
    }

    /// Number of nodes in the live chain, not counting removed nodes still
    /// fading out.
    pub fn chain_len(&self) -> usize {
        self.current.len() - self.current.outgoing().len()
    }

    /// Removed nodes still fading out.
    pub fn fading_nodes(&self) -> usize {
        self.current.outgoing().len()
    }

    /// Callbacks processed so far.
    pub fn block_index(&self) -> u64 {
        self.block_index
    }

    /// Process one hardware period.
    ///
    /// `input` and `output` are mono. When their lengths differ only the
    /// common prefix is processed and the rest of `output` is silenced.
    /// Outside the `Running` state the output is silence.
    pub fn on_block(&mut self, input: &[f32], output: &mut [f32], sample_rate: u32) {
        if !self.prepare(sample_rate) {
            output.fill(0.0);
            return;
        }

        let len = input.len().min(output.len());
        output[len..].fill(0.0);
        if len == 0 {
            return;
        }

        self.clock.begin();
        self.drain_updates();

        let block = &mut output[..len];
        block.copy_from_slice(&input[..len]);
        let replaced = sanitize_block(block);
        if replaced > 0 {
            Counters::bump(&self.shared.counters.sanitized, replaced as u64);
        }

        for chunk in block.chunks_mut(self.config.block_size) {
            self.process_chunk(chunk);
        }
        self.settle();

        self.finish_block(len);
    }

    /// Advance the lifecycle for this callback. Returns `true` to process.
    fn prepare(&self, sample_rate: u32) -> bool {
        match self.shared.state.load() {
            EngineState::Running => {}
            EngineState::Starting => {
                if self
                    .shared
                    .transition(EngineState::Starting, EngineState::Running)
                    .is_err()
                {
                    return false;
                }
            }
            EngineState::Draining => {
                let _ = self
                    .shared
                    .transition(EngineState::Draining, EngineState::Stopped);
                return false;
            }
            EngineState::Stopped | EngineState::Faulted => return false,
        }

        if sample_rate != self.config.sample_rate {
            self.shared.fault(FaultReason::FormatChanged);
            return false;
        }
        true
    }

    fn drain_updates(&mut self) {
        let mut swapped = false;
        for _ in 0..self.config.drain_limit {
            let Some(message) = self.updates.pop() else {
                break;
            };
            let applied = match message {
                UpdateMessage::ParameterChange {
                    node_id,
                    index,
                    target,
                    ..
                } => self
                    .current
                    .node(node_id)
                    .is_some_and(|node| node.set_parameter_target(index, target)),
                UpdateMessage::BypassToggle { node_id, bypassed } => self
                    .current
                    .node(node_id)
                    .is_some_and(|node| node.set_bypassed(bypassed)),
                UpdateMessage::TopologySwap { snapshot } => {
                    if snapshot.generation() > self.current.generation() {
                        for node in snapshot.outgoing() {
                            node.set_bypassed(true);
                        }
                        self.current = snapshot;
                        swapped = true;
                        true
                    } else {
                        false
                    }
                }
            };
            if !applied {
                Counters::bump(&self.shared.counters.ignored_updates, 1);
            }
        }
        if swapped {
            self.shared.live.store(Arc::clone(&self.current));
        }
    }

    /// Move to the settled chain once every outgoing node is silent.
    fn settle(&mut self) {
        let Some(settled) = self.current.settled() else {
            return;
        };
        if !self.current.outgoing().iter().all(|node| node.is_faded_out()) {
            return;
        }
        let settled = Arc::clone(settled);
        self.current = settled;
        self.shared.live.store(Arc::clone(&self.current));
    }

    fn process_chunk(&self, chunk: &mut [f32]) {
        for node in self.current.nodes() {
            if node.process(chunk, &self.ctx) == NodeRun::Skipped {
                continue;
            }
            let replaced = sanitize_block(chunk);
            if replaced > 0 {
                node.reset_dsp();
                Counters::bump(&self.shared.counters.sanitized, replaced as u64);
                self.shared.emit(EngineEvent::SignalSanitized {
                    block_index: self.block_index,
                    node_id: node.id(),
                });
            }
        }
    }

    fn finish_block(&mut self, len: usize) {
        let elapsed = self.clock.elapsed();
        let deadline = self.config.period_for(len);
        let counters = &self.shared.counters;

        counters.set_load(elapsed.as_secs_f32() / deadline.as_secs_f32());
        Counters::bump(&counters.blocks, 1);
        if elapsed > deadline {
            Counters::bump(&counters.underruns, 1);
            self.shared.emit(EngineEvent::Underrun {
                block_index: self.block_index,
            });
        }
        self.block_index += 1;
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state())
            .field("generation", &self.current.generation())
            .field("nodes", &self.current.len())
            .field("block_index", &self.block_index)
            .finish_non_exhaustive()
    }
}
