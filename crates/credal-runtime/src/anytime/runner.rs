use std::sync::Mutex;
use std::thread::JoinHandle;

use crossbeam::channel::{Receiver, Sender, TryRecvError, bounded, unbounded};

use crate::error::{AlgorithmError, StepError};
use crate::lifecycle::LifecycleState;

/// A steppable algorithm hosted on a dedicated worker thread.
///
/// `run_step` performs one discrete unit of work; `handle` answers one
/// service request of the algorithm's category. The runner guarantees the
/// two are never invoked concurrently, so `handle` always observes a
/// consistent post-step state.
pub trait AnytimeAlgorithm: Send + 'static {
    type Service: Send + 'static;
    type Response: Send + 'static;

    /// Runs once on `start`, before the first step.
    fn initialize(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// One discrete unit of work. A failed step is skipped: the error is
    /// logged, shared state stays as the last successful step left it, and
    /// stepping continues.
    fn run_step(&mut self) -> Result<(), StepError>;

    /// Maps one service request to its response.
    fn handle(&mut self, service: Self::Service) -> Result<Self::Response, AlgorithmError>;

    /// Runs on the worker thread as it shuts down.
    fn cleanup(&mut self) {}
}

pub(crate) enum Directive<S, R> {
    Service {
        service: S,
        reply: Sender<Result<R, AlgorithmError>>,
    },
    Stop,
    Resume,
    Kill {
        done: Sender<()>,
    },
}

struct Shared<W: AnytimeAlgorithm> {
    algorithm: Option<W>,
    directives: Option<Sender<Directive<W::Service, W::Response>>>,
    join: Option<JoinHandle<()>>,
    state: LifecycleState,
}

/// Hosts an [`AnytimeAlgorithm`] on its own worker thread and drives the
/// lifecycle state machine from the calling side.
///
/// All caller↔worker traffic flows over one directive channel; each query
/// carries its own bounded reply channel and blocks until the matching
/// response arrives. The worker drains at most one directive between steps,
/// so a response to query Q reflects every step completed strictly before Q
/// was dequeued. Queries take `&self` and may come from several caller
/// threads at once; the directive channel serializes them.
///
/// Kill semantics: directives are only observed between steps, so an
/// in-flight step always finishes first. `kill` blocks on a worker
/// acknowledgement sent after cleanup; once it returns, no further step
/// runs and no further response is produced. Queries still in flight at
/// that moment fail with [`AlgorithmError::Killed`].
pub struct AnytimeRunner<W: AnytimeAlgorithm> {
    shared: Mutex<Shared<W>>,
}

impl<W: AnytimeAlgorithm> AnytimeRunner<W> {
    pub fn new(algorithm: W) -> Self {
        Self {
            shared: Mutex::new(Shared {
                algorithm: Some(algorithm),
                directives: None,
                join: None,
                state: LifecycleState::Created,
            }),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.lock().unwrap().state
    }

    pub fn start(&self) -> Result<(), AlgorithmError> {
        let mut shared = self.shared.lock().unwrap();
        shared.state.ensure("start", &[LifecycleState::Created])?;
        let mut algorithm = shared
            .algorithm
            .take()
            .ok_or_else(|| AlgorithmError::Unexpected("algorithm already consumed".to_string()))?;
        if let Err(error) = algorithm.initialize() {
            shared.algorithm = Some(algorithm);
            return Err(AlgorithmError::InitFailed(error));
        }

        let (tx, rx) = unbounded();
        shared.join = Some(std::thread::spawn(move || worker_loop(algorithm, rx)));
        shared.directives = Some(tx);
        shared.state = LifecycleState::Running;
        log::debug!("Anytime worker launched");
        Ok(())
    }

    pub fn stop(&self) -> Result<(), AlgorithmError> {
        let mut shared = self.shared.lock().unwrap();
        shared.state.ensure("stop", &[LifecycleState::Running])?;
        Self::send(&shared, Directive::Stop)?;
        shared.state = LifecycleState::Stopped;
        Ok(())
    }

    pub fn resume(&self) -> Result<(), AlgorithmError> {
        let mut shared = self.shared.lock().unwrap();
        shared.state.ensure("resume", &[LifecycleState::Stopped])?;
        Self::send(&shared, Directive::Resume)?;
        shared.state = LifecycleState::Running;
        Ok(())
    }

    pub fn kill(&self) -> Result<(), AlgorithmError> {
        let mut shared = self.shared.lock().unwrap();
        shared
            .state
            .ensure("kill", &[LifecycleState::Running, LifecycleState::Stopped])?;
        let (done_tx, done_rx) = bounded(1);
        Self::send(&shared, Directive::Kill { done: done_tx })?;
        shared.state = LifecycleState::Killed;
        shared.directives = None;
        let join = shared.join.take();
        drop(shared);

        let _ = done_rx.recv();
        if let Some(join) = join {
            if join.join().is_err() {
                log::error!("Anytime worker panicked during shutdown");
            }
        }
        log::debug!("Anytime worker terminated");
        Ok(())
    }

    /// Sends one service request and blocks until its response.
    ///
    /// Valid while Running or Stopped; a stopped worker still answers
    /// against the state of its last completed step.
    pub fn call(&self, service: W::Service) -> Result<W::Response, AlgorithmError> {
        let directives = {
            let shared = self.shared.lock().unwrap();
            match shared.state {
                LifecycleState::Running | LifecycleState::Stopped => {}
                LifecycleState::Killed => return Err(AlgorithmError::Killed),
                state => return Err(AlgorithmError::InvalidState { op: "query", state }),
            }
            shared
                .directives
                .clone()
                .ok_or(AlgorithmError::Killed)?
        };

        let (reply_tx, reply_rx) = bounded(1);
        if directives
            .send(Directive::Service {
                service,
                reply: reply_tx,
            })
            .is_err()
        {
            return Err(self.disconnect_error());
        }
        match reply_rx.recv() {
            Ok(result) => result,
            // A dropped reply sender means the worker shut down under us.
            Err(_) => Err(self.disconnect_error()),
        }
    }

    fn send(
        shared: &Shared<W>,
        directive: Directive<W::Service, W::Response>,
    ) -> Result<(), AlgorithmError> {
        shared
            .directives
            .as_ref()
            .ok_or_else(|| AlgorithmError::Unexpected("worker not launched".to_string()))?
            .send(directive)
            .map_err(|_| {
                AlgorithmError::WorkerPanicked("directive channel disconnected".to_string())
            })
    }

    fn disconnect_error(&self) -> AlgorithmError {
        match self.shared.lock().unwrap().state {
            LifecycleState::Killed => AlgorithmError::Killed,
            _ => AlgorithmError::WorkerPanicked("worker hung up mid-query".to_string()),
        }
    }
}

impl<W: AnytimeAlgorithm> Drop for AnytimeRunner<W> {
    fn drop(&mut self) {
        let shared = self.shared.get_mut().unwrap();
        if let Some(directives) = shared.directives.take() {
            let (done_tx, done_rx) = bounded(1);
            if directives.send(Directive::Kill { done: done_tx }).is_ok() {
                let _ = done_rx.recv();
            }
        }
        if let Some(join) = shared.join.take() {
            let _ = join.join();
        }
    }
}

pub(crate) fn worker_loop<W: AnytimeAlgorithm>(
    mut algorithm: W,
    directives: Receiver<Directive<W::Service, W::Response>>,
) {
    let mut running = true;
    let ack = loop {
        if running {
            // One directive or one step per pass; never both, never
            // concurrently.
            match directives.try_recv() {
                Ok(Directive::Service { service, reply }) => {
                    let _ = reply.send(algorithm.handle(service));
                }
                Ok(Directive::Stop) => running = false,
                Ok(Directive::Resume) => {}
                Ok(Directive::Kill { done }) => break Some(done),
                Err(TryRecvError::Empty) => {
                    if let Err(error) = algorithm.run_step() {
                        log::warn!("Anytime step failed; skipping: {error}");
                    }
                }
                Err(TryRecvError::Disconnected) => break None,
            }
        } else {
            match directives.recv() {
                Ok(Directive::Service { service, reply }) => {
                    let _ = reply.send(algorithm.handle(service));
                }
                Ok(Directive::Resume) => running = true,
                Ok(Directive::Stop) => {}
                Ok(Directive::Kill { done }) => break Some(done),
                Err(_) => break None,
            }
        }
    };

    algorithm.cleanup();

    // Orphan whatever raced the kill; no stale responses.
    while let Ok(directive) = directives.try_recv() {
        if let Directive::Service { reply, .. } = directive {
            let _ = reply.send(Err(AlgorithmError::Killed));
        }
    }
    if let Some(done) = ack {
        let _ = done.send(());
    }
}
