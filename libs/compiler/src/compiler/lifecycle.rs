use std::fmt;

/// Lifecycle of one execution context. Terminal states are `Completed` and `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
  Uninitialized,
  Evaluating,
  Ready,
  Invoking,
  Completed,
  Failed,
}

impl EngineState {
  pub fn is_terminal(self) -> bool {
    matches!(self, EngineState::Completed | EngineState::Failed)
  }

  fn permits(self, next: EngineState) -> bool {
    use EngineState::*;
    matches!(
      (self, next),
      (Uninitialized, Evaluating)
        | (Evaluating, Ready)
        | (Evaluating, Failed)
        | (Ready, Invoking)
        | (Invoking, Completed)
        | (Invoking, Failed)
    )
  }
}

/// What the engine was doing when it stopped; used in error reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
  Evaluating,
  Initializing,
  Invoking,
}

impl fmt::Display for EnginePhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      EnginePhase::Evaluating => "evaluating",
      EnginePhase::Initializing => "initializing",
      EnginePhase::Invoking => "invoking",
    };
    f.write_str(label)
  }
}

/// Forward-only state tracker. Each instance is used for exactly one invocation.
#[derive(Debug)]
pub(crate) struct Lifecycle {
  state: EngineState,
}

impl Lifecycle {
  pub(crate) fn new() -> Self {
    Self {
      state: EngineState::Uninitialized,
    }
  }

  pub(crate) fn state(&self) -> EngineState {
    self.state
  }

  /// Move to `next`. Refuses transitions outside the lifecycle graph and leaves the
  /// state untouched in that case.
  pub(crate) fn advance(&mut self, next: EngineState) -> bool {
    if !self.state.permits(next) {
      log::warn!("refused engine transition {:?} -> {:?}", self.state, next);
      return false;
    }
    log::trace!("engine {:?} -> {:?}", self.state, next);
    self.state = next;
    true
  }

  /// Mark the context failed from whichever non-terminal state it is in.
  pub(crate) fn fail(&mut self) {
    if !self.state.is_terminal() {
      log::trace!("engine {:?} -> Failed", self.state);
      self.state = EngineState::Failed;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn happy_path_reaches_completed() {
    let mut lifecycle = Lifecycle::new();
    for next in [
      EngineState::Evaluating,
      EngineState::Ready,
      EngineState::Invoking,
      EngineState::Completed,
    ] {
      assert!(lifecycle.advance(next), "transition to {next:?}");
    }
    assert!(lifecycle.state().is_terminal());
  }

  #[test]
  fn invoking_requires_ready() {
    let mut lifecycle = Lifecycle::new();
    assert!(!lifecycle.advance(EngineState::Invoking));
    assert!(lifecycle.advance(EngineState::Evaluating));
    assert!(!lifecycle.advance(EngineState::Invoking));
    assert_eq!(lifecycle.state(), EngineState::Evaluating);
  }

  #[test]
  fn terminal_states_are_final() {
    let mut lifecycle = Lifecycle::new();
    lifecycle.advance(EngineState::Evaluating);
    lifecycle.fail();
    assert_eq!(lifecycle.state(), EngineState::Failed);
    assert!(!lifecycle.advance(EngineState::Ready));
    assert!(!lifecycle.advance(EngineState::Evaluating));
    lifecycle.fail();
    assert_eq!(lifecycle.state(), EngineState::Failed);
  }

  #[test]
  fn uninitialized_context_can_fail_directly() {
    let mut lifecycle = Lifecycle::new();
    lifecycle.fail();
    assert_eq!(lifecycle.state(), EngineState::Failed);
  }
}
