use crate::error::AlgorithmError;

/// Lifecycle state of an algorithm.
///
/// Transitions: `start` Created→Running, `stop` Running→Stopped (anytime
/// only), `resume` Stopped→Running, `kill` {Running, Stopped}→Killed. Every
/// other transition fails with [`AlgorithmError::InvalidState`], including
/// `kill` on an already-killed algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    Created,
    Running,
    Stopped,
    Killed,
}

impl LifecycleState {
    /// Checks that `op` may run in this state.
    pub fn ensure(self, op: &'static str, allowed: &[LifecycleState]) -> Result<(), AlgorithmError> {
        if allowed.contains(&self) {
            Ok(())
        } else {
            Err(AlgorithmError::InvalidState { op, state: self })
        }
    }
}

/// Setup/teardown contributed by one layer of a composed algorithm.
pub trait LifecycleHooks: Send {
    fn initialize(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The hook layers of a composed algorithm, outermost first.
///
/// `initialize_all` runs outer→inner so resources acquired by an enclosing
/// generic stage exist before a specialized layer's setup; `cleanup_all`
/// runs inner→outer so they are released only after specialized teardown.
#[derive(Default)]
pub struct HookStack {
    hooks: Vec<Box<dyn LifecycleHooks>>,
}

impl HookStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a layer inside every layer pushed before it.
    pub fn push(&mut self, hook: impl LifecycleHooks + 'static) -> &mut Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs all initialize hooks, outermost first, stopping at the first
    /// failure.
    pub fn initialize_all(&mut self) -> anyhow::Result<()> {
        for hook in self.hooks.iter_mut() {
            hook.initialize()?;
        }
        Ok(())
    }

    /// Runs all cleanup hooks, innermost first. Failures are logged and do
    /// not abort the remaining hooks.
    pub fn cleanup_all(&mut self) {
        for hook in self.hooks.iter_mut().rev() {
            if let Err(error) = hook.cleanup() {
                log::error!("Cleanup hook failed: {error}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};

    #[rstest]
    #[case(LifecycleState::Created, "start", &[LifecycleState::Created], true)]
    #[case(LifecycleState::Running, "start", &[LifecycleState::Created], false)]
    #[case(LifecycleState::Running, "kill", &[LifecycleState::Running, LifecycleState::Stopped], true)]
    #[case(LifecycleState::Killed, "kill", &[LifecycleState::Running, LifecycleState::Stopped], false)]
    fn transition_table(
        #[case] state: LifecycleState,
        #[case] op: &'static str,
        #[case] allowed: &[LifecycleState],
        #[case] ok: bool,
    ) {
        let result = state.ensure(op, allowed);
        assert_eq!(result.is_ok(), ok);
        if !ok {
            assert!(matches!(
                result,
                Err(AlgorithmError::InvalidState { op: o, state: s }) if o == op && s == state
            ));
        }
    }

    #[test]
    fn state_displays_snake_case() {
        assert_eq!(LifecycleState::Created.to_string(), "created");
        assert_eq!("killed".parse::<LifecycleState>().unwrap(), LifecycleState::Killed);
    }

    struct Recorder {
        name: &'static str,
        trace: Arc<Mutex<Vec<String>>>,
    }

    impl LifecycleHooks for Recorder {
        fn initialize(&mut self) -> anyhow::Result<()> {
            self.trace.lock().unwrap().push(format!("init:{}", self.name));
            Ok(())
        }

        fn cleanup(&mut self) -> anyhow::Result<()> {
            self.trace.lock().unwrap().push(format!("clean:{}", self.name));
            Ok(())
        }
    }

    #[test]
    fn hooks_run_outer_to_inner_and_back() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut stack = HookStack::new();
        stack.push(Recorder {
            name: "outer",
            trace: trace.clone(),
        });
        stack.push(Recorder {
            name: "inner",
            trace: trace.clone(),
        });

        stack.initialize_all().unwrap();
        stack.cleanup_all();

        let trace = trace.lock().unwrap();
        assert_eq!(
            *trace,
            vec!["init:outer", "init:inner", "clean:inner", "clean:outer"]
        );
    }

    #[test]
    fn cleanup_failure_does_not_abort_remaining_hooks() {
        struct Failing;

        impl LifecycleHooks for Failing {
            fn cleanup(&mut self) -> anyhow::Result<()> {
                anyhow::bail!("teardown failed")
            }
        }

        let trace = Arc::new(Mutex::new(Vec::new()));
        let mut stack = HookStack::new();
        stack.push(Recorder {
            name: "outer",
            trace: trace.clone(),
        });
        stack.push(Failing);

        stack.cleanup_all();
        assert_eq!(*trace.lock().unwrap(), vec!["clean:outer"]);
    }
}
