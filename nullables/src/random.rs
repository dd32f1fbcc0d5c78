//! Nullable random: deterministic randomness.

use std::sync::Mutex;

use whistle_crypto::blake2b_256_multi;
use whistle_vrf::{RandomOutput, VrfError, VrfProvider};

/// A deterministic VRF provider for testing.
///
/// Returns pre-configured values in order, or (with [`NullRandom::seeded`]) a
/// value derived from the context so repeated calls with the same context agree.
pub struct NullRandom {
    mode: Mode,
}

enum Mode {
    Sequence {
        outputs: Vec<[u8; 32]>,
        index: Mutex<usize>,
    },
    Seeded([u8; 32]),
    Unavailable,
}

impl NullRandom {
    /// Create with a sequence of deterministic random values.
    pub fn new(outputs: Vec<[u8; 32]>) -> Self {
        Self {
            mode: Mode::Sequence {
                outputs,
                index: Mutex::new(0),
            },
        }
    }

    /// Create with a single value that will be returned for every call.
    pub fn constant(value: [u8; 32]) -> Self {
        Self::new(vec![value])
    }

    /// Output is `blake2b(seed || context)`.
    pub fn seeded(seed: [u8; 32]) -> Self {
        Self {
            mode: Mode::Seeded(seed),
        }
    }

    /// Every call fails with [`VrfError::Unavailable`].
    pub fn unavailable() -> Self {
        Self {
            mode: Mode::Unavailable,
        }
    }
}

impl VrfProvider for NullRandom {
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError> {
        match &self.mode {
            Mode::Sequence { outputs, index } => {
                if outputs.is_empty() {
                    return Err(VrfError::Unavailable("no outputs configured".into()));
                }
                let mut idx = index.lock().unwrap_or_else(|e| e.into_inner());
                let current = *idx % outputs.len();
                *idx += 1;
                Ok(RandomOutput {
                    value: outputs[current],
                    proof: Vec::new(),
                    round: current as u64,
                })
            }
            Mode::Seeded(seed) => Ok(RandomOutput {
                value: blake2b_256_multi(&[seed, context]),
                proof: Vec::new(),
                round: 0,
            }),
            Mode::Unavailable => Err(VrfError::Unavailable("null-random switched off".into())),
        }
    }

    fn verify(&self, _context: &[u8], _output: &RandomOutput) -> Result<bool, VrfError> {
        Ok(true) // Always valid in test mode
    }

    fn name(&self) -> &str {
        "null-random"
    }
}
