use std::sync::Arc;

use flashloop_core::limits::{AccountLimitTier, Limits, DEFAULT_TIERS};
use flashloop_core::looping_math::{LeverageFormula, PositionMath};
use flashloop_jupiter::{RetryPolicy, TokioSleeper};

use crate::tiered_search::SizeTieredQuoteSearch;

/// Limits, tiers and retry settings injected into every calculation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
  pub limits: Limits,
  pub tiers: Vec<AccountLimitTier>,
  pub retry: RetryPolicy,
}

impl Default for EngineConfig {
  fn default() -> Self {
    EngineConfig {
      limits: Limits::default(),
      tiers: DEFAULT_TIERS.to_vec(),
      retry: RetryPolicy::default(),
    }
  }
}

/// Entry point for the looping and collateral-repay calculations.
///
/// Holds no per-call state; concurrent calls share only the collaborators.
pub struct Flashloop<Q, A, S = TokioSleeper> {
  pub(crate) gateway: Q,
  pub(crate) assembler: A,
  pub(crate) sleeper: S,
  pub(crate) config: EngineConfig,
  pub(crate) position_math: Arc<dyn PositionMath>,
}

impl<Q, A> Flashloop<Q, A> {
  #[must_use]
  pub fn new(gateway: Q, assembler: A) -> Self {
    Flashloop {
      gateway,
      assembler,
      sleeper: TokioSleeper,
      config: EngineConfig::default(),
      position_math: Arc::new(LeverageFormula),
    }
  }
}

impl<Q, A, S> Flashloop<Q, A, S> {
  #[must_use]
  pub fn with_sleeper<T>(self, sleeper: T) -> Flashloop<Q, A, T> {
    Flashloop {
      gateway: self.gateway,
      assembler: self.assembler,
      sleeper,
      config: self.config,
      position_math: self.position_math,
    }
  }

  #[must_use]
  pub fn with_config(mut self, config: EngineConfig) -> Self {
    self.config = config;
    self
  }

  /// Replaces the default notional leverage formula with the protocol's.
  #[must_use]
  pub fn with_position_math(mut self, position_math: Arc<dyn PositionMath>) -> Self {
    self.position_math = position_math;
    self
  }

  #[must_use]
  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub(crate) fn search(&self) -> SizeTieredQuoteSearch<'_, Q, A, S> {
    SizeTieredQuoteSearch {
      gateway: &self.gateway,
      assembler: &self.assembler,
      sleeper: &self.sleeper,
      retry: self.config.retry,
      tiers: &self.config.tiers,
    }
  }
}
