use padspy_frame::{transitions, ButtonState};
use tracing::info;

/// Receives decoded states on the render side.
///
/// `apply` runs inside the pump tick, so it must not block. Applying the
/// same state twice must look the same as applying it once.
pub trait StateConsumer {
    fn apply(&mut self, state: ButtonState);
}

impl<F: FnMut(ButtonState)> StateConsumer for F {
    fn apply(&mut self, state: ButtonState) {
        self(state)
    }
}

/// Remembers the most recently applied state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatestState {
    current: Option<ButtonState>,
}

impl LatestState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last applied state, or `None` before the first one.
    pub fn get(&self) -> Option<ButtonState> {
        self.current
    }
}

impl StateConsumer for LatestState {
    fn apply(&mut self, state: ButtonState) {
        self.current = Some(state);
    }
}

/// Logs every press and release edge, then forwards the state.
#[derive(Debug)]
pub struct TransitionLog<C> {
    inner: C,
    last: ButtonState,
}

impl<C: StateConsumer> TransitionLog<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            last: ButtonState::RELEASED,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: StateConsumer> StateConsumer for TransitionLog<C> {
    fn apply(&mut self, state: ButtonState) {
        for edge in transitions(self.last, state) {
            info!(
                button = edge.button.name(),
                pressed = edge.pressed,
                state = state.bits(),
                "button {}",
                if edge.pressed { "pressed" } else { "released" }
            );
        }
        self.last = state;
        self.inner.apply(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_state_is_idempotent() {
        let mut once = LatestState::new();
        once.apply(ButtonState::from_bits(0x09));

        let mut twice = LatestState::new();
        twice.apply(ButtonState::from_bits(0x09));
        twice.apply(ButtonState::from_bits(0x09));

        assert_eq!(once, twice);
        assert_eq!(twice.get(), Some(ButtonState::from_bits(0x09)));
    }

    #[test]
    fn latest_state_starts_empty() {
        assert_eq!(LatestState::new().get(), None);
    }

    #[test]
    fn closures_are_consumers() {
        let mut seen = Vec::new();
        {
            let mut consumer = |state: ButtonState| seen.push(state.bits());
            consumer.apply(ButtonState::from_bits(1));
            consumer.apply(ButtonState::from_bits(2));
        }
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn transition_log_forwards_every_state() {
        let mut log = TransitionLog::new(Recorded::default());
        log.apply(ButtonState::from_bits(0x01));
        log.apply(ButtonState::from_bits(0x01));
        log.apply(ButtonState::from_bits(0x00));

        assert_eq!(log.into_inner().0, vec![0x01, 0x01, 0x00]);
    }

    #[derive(Default)]
    struct Recorded(Vec<u8>);

    impl StateConsumer for Recorded {
        fn apply(&mut self, state: ButtonState) {
            self.0.push(state.bits());
        }
    }
}
