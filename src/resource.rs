// ResourceArc wrapper for the streaming tokenizer
//
// Lets tokenizer state persist across NIF calls. The Mutex serializes BEAM
// processes that share one resource; chunks must still arrive in stream order.

use crate::core::Dialect;
use crate::strategy::Tokenizer;
use rustler::{Error, NifResult, ResourceArc};
use std::sync::{Mutex, MutexGuard};

/// Wrapper for Tokenizer that can be stored in a ResourceArc
pub struct TokenizerResource {
    inner: Mutex<Tokenizer>,
}

impl TokenizerResource {
    pub fn new() -> Self {
        Self::with_dialect(Dialect::default())
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        TokenizerResource {
            inner: Mutex::new(Tokenizer::with_dialect(dialect)),
        }
    }

    /// Lock the tokenizer. A poisoned lock means an earlier call panicked
    /// mid-chunk, so the state is no longer trustworthy.
    pub fn lock(&self) -> NifResult<MutexGuard<'_, Tokenizer>> {
        self.inner
            .lock()
            .map_err(|_| Error::RaiseAtom("tokenizer_poisoned"))
    }
}

impl Default for TokenizerResource {
    fn default() -> Self {
        Self::new()
    }
}

/// Type alias for the ResourceArc
pub type TokenizerRef = ResourceArc<TokenizerResource>;
