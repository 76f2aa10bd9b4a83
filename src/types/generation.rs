//! Generation Configuration
//!
//! Flat per-inference settings handed to a text-generation runtime. A fresh
//! value is constructed for every predict call; nothing here is shared or
//! mutated across requests.

use serde::{Deserialize, Serialize};

/// Sampling and decoding settings for one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature (0.0 = deterministic)
    pub temperature: f32,
    /// Keep only the k most likely tokens at each step
    pub top_k: u32,
    /// Nucleus sampling probability mass
    pub top_p: f32,
    /// Penalty applied to already-generated tokens
    pub repetition_penalty: f32,
    /// Upper bound on generated tokens
    pub max_new_tokens: u32,
    /// RNG seed for reproducible sampling
    pub seed: u64,
    /// Reset model state (cache) before generating
    pub reset: bool,
    /// Stream tokens as they are produced
    pub stream: bool,
    /// Worker threads for the runtime
    pub threads: usize,
    /// Stop sequences terminating generation
    pub stop: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            top_k: 50,
            top_p: 0.9,
            repetition_penalty: 1.0,
            max_new_tokens: 512,
            seed: 42,
            reset: true,
            stream: true,
            threads: default_threads(),
            stop: Vec::new(),
        }
    }
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| (n.get() / 6).max(1))
        .unwrap_or(1)
}

impl GenerationConfig {
    /// Check that sampling parameters are within acceptable ranges.
    pub fn validate(&self) -> crate::types::Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(crate::types::TrussError::config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(crate::types::TrussError::config(format!(
                "top_p must be between 0.0 and 1.0, got {}",
                self.top_p
            )));
        }
        if self.max_new_tokens == 0 {
            return Err(crate::types::TrussError::config(
                "max_new_tokens must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
