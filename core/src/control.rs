// baattak-flow/src/control.rs

/// What a handler wants the flow to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
  Continue,
  /// Halt the run. No further handlers or steps execute.
  Stop,
}

/// How a complete run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
  Completed,
  Stopped,
}
