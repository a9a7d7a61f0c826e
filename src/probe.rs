//! Trying mutually exclusive decode variants of the same signature.
//!
//! Some engines share a signature but lay out their control words in two
//! incompatible ways, and nothing in the header says which one an entry
//! uses. [`probe`] runs the candidates in preference order and keeps the
//! first result that a named plausibility check accepts.
//!
//! Which candidate won is returned to the caller as a [`VariantState`]. The
//! caller stores it with the archive it came from and passes it back in for
//! the next entry, so entries of the same archive hit the right variant on
//! the first try without any process-wide state.

use log::{debug, trace, warn};

use crate::error::{DecodeError, Result};

/// Index of the variant to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VariantState {
    preferred: usize,
}

impl VariantState {
    #[must_use]
    pub const fn new(preferred: usize) -> Self {
        Self { preferred }
    }

    #[must_use]
    pub const fn preferred(self) -> usize {
        self.preferred
    }
}

/// One decode interpretation.
pub struct Candidate<'f, T> {
    pub name: &'static str,
    pub decode: &'f dyn Fn(&[u8]) -> Result<T>,
}

impl<T> core::fmt::Debug for Candidate<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Candidate").field("name", &self.name).finish()
    }
}

/// The accepted result of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probed<T> {
    pub value: T,
    /// Preference to pass into the next call for the same archive.
    pub state: VariantState,
    pub name: &'static str,
}

/// Named acceptance checks for probed decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Plausibility {
    /// The decode consumed exactly the declared input length.
    #[default]
    ExactConsumption,
    /// The decode stopped no more than this many bytes short of the declared
    /// input length (and never past it).
    EndedWithin(usize),
    /// Any decode that finished without an error is accepted.
    ///
    /// Permissive on purpose: the row-prediction codecs this matches only
    /// ever checked that decoding did not fail.
    Loose,
}

impl Plausibility {
    /// Whether a decode that consumed `consumed` of `declared` input bytes passes.
    #[must_use]
    pub const fn accepts(self, consumed: usize, declared: usize) -> bool {
        match self {
            Self::ExactConsumption => consumed == declared,
            Self::EndedWithin(slack) => consumed <= declared && declared - consumed <= slack,
            Self::Loose => true,
        }
    }
}

/// Runs `candidates` against `input`, preferred index first, then the rest
/// in order, and returns the first result `plausible` accepts.
///
/// A candidate that fails with an error counts as implausible; its error is
/// logged and dropped. Only when every candidate is rejected does the call
/// fail, with `NoPlausibleVariant`.
pub fn probe<T>(
    input: &[u8],
    candidates: &[Candidate<'_, T>],
    state: VariantState,
    plausible: impl Fn(&T) -> bool,
) -> Result<Probed<T>> {
    if candidates.is_empty() {
        return Err(DecodeError::InvalidParameters("no decode variants to probe"));
    }

    let first = if state.preferred < candidates.len() {
        state.preferred
    } else {
        0
    };
    let order = core::iter::once(first).chain((0..candidates.len()).filter(|&i| i != first));

    for idx in order {
        let candidate = &candidates[idx];
        trace!("probing variant {} ({})", idx, candidate.name);
        match (candidate.decode)(input).and_then(|value| {
            if plausible(&value) {
                Ok(value)
            } else {
                Err(DecodeError::ImplausibleResult)
            }
        }) {
            Ok(value) => {
                debug!("variant {} ({}) accepted", idx, candidate.name);
                return Ok(Probed {
                    value,
                    state: VariantState::new(idx),
                    name: candidate.name,
                });
            }
            Err(e) => debug!("variant {} ({}) rejected: {}", idx, candidate.name, e),
        }
    }

    warn!("all {} decode variants rejected", candidates.len());
    Err(DecodeError::NoPlausibleVariant {
        tried: candidates.len(),
    })
}
