//! Offline driver.
//!
//! Stands in for a hardware callback: feeds a whole buffer through the
//! engine one callback at a time. Used for rendering, tests and benchmarks.

use crate::engine::Engine;

/// Drives an [`Engine`] over in-memory buffers.
#[derive(Debug)]
pub struct OfflineDriver {
    engine: Engine,
    callback_size: usize,
}

impl OfflineDriver {
    /// Driver calling back with the engine's block size.
    pub fn new(engine: Engine) -> Self {
        let callback_size = engine.config().block_size;
        Self {
            engine,
            callback_size,
        }
    }

    /// Use a different callback size, e.g. to mimic a driver whose period
    /// is not the engine's block size.
    pub fn with_callback_size(mut self, callback_size: usize) -> Self {
        self.callback_size = callback_size.max(1);
        self
    }

    /// Samples per callback.
    pub fn callback_size(&self) -> usize {
        self.callback_size
    }

    /// Render `input` and return the processed signal.
    pub fn render(&mut self, input: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0; input.len()];
        self.render_into(input, &mut output);
        output
    }

    /// Render `input` into `output`. Extra output samples are silenced.
    pub fn render_into(&mut self, input: &[f32], output: &mut [f32]) {
        let sample_rate = self.engine.config().sample_rate;
        let len = input.len().min(output.len());
        output[len..].fill(0.0);
        for (inp, out) in input[..len]
            .chunks(self.callback_size)
            .zip(output[..len].chunks_mut(self.callback_size))
        {
            self.engine.on_block(inp, out, sample_rate);
        }
    }

    /// Render `samples` of silence, e.g. to let tails ring out.
    pub fn render_silence(&mut self, samples: usize) -> Vec<f32> {
        self.render(&vec![0.0; samples])
    }

    /// The driven engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The driven engine, mutably.
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Take the engine back.
    pub fn into_engine(self) -> Engine {
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::EngineConfig;
    use std::time::Duration;

    #[test]
    fn render_runs_one_callback_per_period() {
        let (engine, controller) = Engine::new(EngineConfig::default()).unwrap();
        controller.start().unwrap();
        let mut driver = OfflineDriver::new(engine.with_clock(FixedClock::new(Duration::ZERO)));

        let out = driver.render(&vec![0.5; 1000]);
        assert_eq!(out.len(), 1000);
        assert!(out.iter().all(|&s| s == 0.5));
        // 256 + 256 + 256 + 232
        assert_eq!(driver.engine().block_index(), 4);
    }

    #[test]
    fn custom_callback_size() {
        let (engine, controller) = Engine::new(EngineConfig::default()).unwrap();
        controller.start().unwrap();
        let mut driver = OfflineDriver::new(engine).with_callback_size(100);
        driver.render_silence(1000);
        assert_eq!(driver.callback_size(), 100);
        assert_eq!(driver.into_engine().block_index(), 10);
    }

    #[test]
    fn short_output_is_filled_only_to_input() {
        let (engine, controller) = Engine::new(EngineConfig::default()).unwrap();
        controller.start().unwrap();
        let mut driver = OfflineDriver::new(engine);
        let mut out = vec![1.0; 300];
        driver.render_into(&[0.25; 200], &mut out);
        assert!(out[..200].iter().all(|&s| s == 0.25));
        assert!(out[200..].iter().all(|&s| s == 0.0));
    }
}
