//! Core station abstraction and runner.

use crate::pipeline::error::{ErrorReporter, StationError};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use std::marker::PhantomData;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// A processing station.
///
/// Each station receives input, processes it, and produces output. Stations
/// run in their own threads and are connected by channels, so a slow station
/// (e.g. one that blocks on a synthesis engine) never stalls the others.
pub trait Station: Send + 'static {
    /// The input type this station receives.
    type Input: Send + 'static;
    /// The output type this station produces.
    type Output: Send + 'static;

    /// Processes a single input item.
    ///
    /// Returns:
    /// - `Ok(Some(output))` - Successfully processed and produced output
    /// - `Ok(None)` - Successfully processed but no output
    /// - `Err(StationError)` - Processing failed
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError>;

    /// Returns the name of this station for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called when the station is shutting down.
    fn shutdown(&mut self) {}
}

/// Outcome of a bounded wait for a station thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The thread finished and was joined.
    Joined,
    /// The thread panicked.
    Panicked(String),
    /// The thread was still running at the deadline and has been detached.
    Detached,
}

/// Runs a station in a dedicated thread.
pub struct StationRunner<S: Station> {
    /// Handle to the spawned thread.
    handle: JoinHandle<()>,
    /// Name of the station (cached for error reporting).
    station_name: &'static str,
    /// Phantom data to mark the station type.
    _phantom: PhantomData<S>,
}

impl<S: Station> StationRunner<S> {
    /// Spawns a new station in a dedicated thread.
    ///
    /// The station runs until `input_rx` is disconnected, a fatal error is
    /// reported, or `output_tx` has no receiver left. Output is offered with
    /// `try_send`: when the output queue is full the item is dropped and the
    /// station keeps going, so an unread consumer never stalls it.
    pub fn spawn(
        mut station: S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) -> std::io::Result<Self> {
        let station_name = station.name();

        let handle = thread::Builder::new()
            .name(station_name.to_string())
            .spawn(move || {
                Self::run_station(&mut station, input_rx, output_tx, error_reporter);
            })?;

        Ok(Self {
            handle,
            station_name,
            _phantom: PhantomData,
        })
    }

    /// Main processing loop for the station.
    fn run_station(
        station: &mut S,
        input_rx: Receiver<S::Input>,
        output_tx: Sender<S::Output>,
        error_reporter: Arc<dyn ErrorReporter>,
    ) {
        let station_name = station.name();
        let mut dropped: u64 = 0;

        while let Ok(input) = input_rx.recv() {
            match station.process(input) {
                Ok(Some(output)) => match output_tx.try_send(output) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        dropped += 1;
                        debug!(station = station_name, dropped, "Output queue full, dropping");
                    }
                    Err(TrySendError::Disconnected(_)) => {
                        debug!(station = station_name, "Output channel closed");
                        break;
                    }
                },
                Ok(None) => {}
                Err(err @ StationError::Recoverable(_)) => {
                    error_reporter.report(station_name, &err);
                }
                Err(err @ StationError::Fatal(_)) => {
                    error_reporter.report(station_name, &err);
                    break;
                }
            }
        }

        station.shutdown();
        debug!(station = station_name, "Station stopped");
    }

    /// Waits up to `timeout` for the station thread, then detaches it.
    ///
    /// A station blocked inside a long engine call cannot be interrupted; it
    /// is left to finish on its own and its output is discarded by the caller.
    pub fn join_timeout(self, timeout: Duration) -> JoinOutcome {
        let handle = self.handle;
        let deadline = Instant::now() + timeout;
        let poll_interval = Duration::from_millis(10);
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                return JoinOutcome::Detached;
            }
            thread::sleep(poll_interval);
        }

        match handle.join() {
            Ok(()) => JoinOutcome::Joined,
            Err(panic_info) => {
                let msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                JoinOutcome::Panicked(msg)
            }
        }
    }

    /// Returns the name of the station.
    pub fn name(&self) -> &'static str {
        self.station_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Joins incoming words into a growing sentence
    struct SentenceStation {
        sentence: Vec<String>,
        shutdown_called: Arc<AtomicBool>,
    }

    impl Station for SentenceStation {
        type Input = String;
        type Output = String;

        fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError> {
            self.sentence.push(input);
            Ok(Some(self.sentence.join(" ")))
        }

        fn name(&self) -> &'static str {
            "Sentence"
        }

        fn shutdown(&mut self) {
            self.shutdown_called.store(true, Ordering::SeqCst);
        }
    }

    // Only forwards committed text (ending with '.')
    struct CommittedOnlyStation;

    impl Station for CommittedOnlyStation {
        type Input = String;
        type Output = String;

        fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError> {
            Ok(input.ends_with('.').then_some(input))
        }

        fn name(&self) -> &'static str {
            "CommittedOnly"
        }
    }

    // Fails recoverably on empty input, fatally on "stop"
    struct PickyStation;

    impl Station for PickyStation {
        type Input = String;
        type Output = usize;

        fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, StationError> {
            match input.as_str() {
                "" => Err(StationError::Recoverable("empty input".to_string())),
                "stop" => Err(StationError::Fatal("stop requested".to_string())),
                text => Ok(Some(text.len())),
            }
        }

        fn name(&self) -> &'static str {
            "Picky"
        }
    }

    // Blocks for a fixed time per input, like a slow engine call
    struct SlowStation(Duration);

    impl Station for SlowStation {
        type Input = ();
        type Output = ();

        fn process(&mut self, _input: ()) -> Result<Option<()>, StationError> {
            thread::sleep(self.0);
            Ok(Some(()))
        }

        fn name(&self) -> &'static str {
            "Slow"
        }
    }

    #[derive(Default)]
    struct MockReporter {
        errors: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl ErrorReporter for MockReporter {
        fn report(&self, station: &str, error: &StationError) {
            let mut errors = self.errors.lock().unwrap();
            errors.push((station.to_string(), error.to_string()));
        }
    }

    fn assert_joined<S: Station>(runner: StationRunner<S>) {
        assert_eq!(
            runner.join_timeout(Duration::from_secs(2)),
            JoinOutcome::Joined
        );
    }

    #[test]
    fn test_station_runner_basic_processing() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let station = SentenceStation {
            sentence: Vec::new(),
            shutdown_called: shutdown_flag.clone(),
        };
        let runner =
            StationRunner::spawn(station, input_rx, output_tx, Arc::new(MockReporter::default()))
                .unwrap();
        assert_eq!(runner.name(), "Sentence");

        for word in ["Hello", "big", "world"] {
            input_tx.send(word.to_string()).unwrap();
        }
        drop(input_tx);

        let outputs: Vec<String> = output_rx.iter().collect();
        assert_eq!(outputs, vec!["Hello", "Hello big", "Hello big world"]);

        assert_joined(runner);
        assert!(shutdown_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_station_runner_filtering() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);

        let runner = StationRunner::spawn(
            CommittedOnlyStation,
            input_rx,
            output_tx,
            Arc::new(MockReporter::default()),
        )
        .unwrap();

        for text in ["Hel", "Hello.", "Wor", "World."] {
            input_tx.send(text.to_string()).unwrap();
        }
        drop(input_tx);

        let outputs: Vec<String> = output_rx.iter().collect();
        assert_eq!(outputs, vec!["Hello.", "World."]);
        assert_joined(runner);
    }

    #[test]
    fn test_station_runner_recoverable_errors_continue() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);
        let reporter = Arc::new(MockReporter::default());
        let errors = reporter.errors.clone();

        let runner = StationRunner::spawn(PickyStation, input_rx, output_tx, reporter).unwrap();

        for text in ["ab", "", "abcd", ""] {
            input_tx.send(text.to_string()).unwrap();
        }
        drop(input_tx);

        let outputs: Vec<usize> = output_rx.iter().collect();
        assert_eq!(outputs, vec![2, 4]);

        let reported = errors.lock().unwrap();
        assert_eq!(reported.len(), 2);
        assert_eq!(reported[0].0, "Picky");
        assert!(reported[0].1.contains("empty input"));

        assert_joined(runner);
    }

    #[test]
    fn test_station_runner_fatal_error_stops_station() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);
        let reporter = Arc::new(MockReporter::default());
        let errors = reporter.errors.clone();

        let runner = StationRunner::spawn(PickyStation, input_rx, output_tx, reporter).unwrap();

        input_tx.send("a".to_string()).unwrap();
        input_tx.send("stop".to_string()).unwrap();
        input_tx.send("never".to_string()).unwrap();

        assert_joined(runner);
        let outputs: Vec<usize> = output_rx.try_iter().collect();
        assert_eq!(outputs, vec![1]);
        assert!(errors.lock().unwrap()[0].1.starts_with("Fatal error"));
    }

    #[test]
    fn test_station_runner_output_channel_closed() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(10);
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let station = SentenceStation {
            sentence: Vec::new(),
            shutdown_called: shutdown_flag.clone(),
        };
        let runner =
            StationRunner::spawn(station, input_rx, output_tx, Arc::new(MockReporter::default()))
                .unwrap();

        drop(output_rx);
        input_tx.send("orphan".to_string()).unwrap();

        assert_joined(runner);
        assert!(shutdown_flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_join_timeout_joins_finished_station() {
        let (input_tx, input_rx) = bounded::<()>(1);
        let (output_tx, _output_rx) = bounded(1);
        let runner = StationRunner::spawn(
            SlowStation(Duration::from_millis(1)),
            input_rx,
            output_tx,
            Arc::new(MockReporter::default()),
        )
        .unwrap();
        drop(input_tx);

        assert_eq!(
            runner.join_timeout(Duration::from_secs(2)),
            JoinOutcome::Joined
        );
    }

    #[test]
    fn test_join_timeout_detaches_busy_station() {
        let (input_tx, input_rx) = bounded(1);
        let (output_tx, _output_rx) = bounded(1);
        let runner = StationRunner::spawn(
            SlowStation(Duration::from_millis(500)),
            input_rx,
            output_tx,
            Arc::new(MockReporter::default()),
        )
        .unwrap();
        input_tx.send(()).unwrap();
        drop(input_tx);
        thread::sleep(Duration::from_millis(20));

        assert_eq!(
            runner.join_timeout(Duration::from_millis(20)),
            JoinOutcome::Detached
        );
    }

    #[test]
    fn test_full_output_queue_drops_instead_of_blocking() {
        let (input_tx, input_rx) = bounded(10);
        let (output_tx, output_rx) = bounded(1);
        let shutdown_flag = Arc::new(AtomicBool::new(false));

        let station = SentenceStation {
            sentence: Vec::new(),
            shutdown_called: shutdown_flag.clone(),
        };
        let runner = StationRunner::spawn(
            station,
            input_rx,
            output_tx,
            Arc::new(MockReporter::default()),
        )
        .unwrap();

        // Nobody reads the output while the inputs are processed
        for word in ["one", "two", "three", "four"] {
            input_tx.send(word.to_string()).unwrap();
        }
        drop(input_tx);

        assert_joined(runner);
        assert!(shutdown_flag.load(Ordering::SeqCst));
        let outputs: Vec<String> = output_rx.try_iter().collect();
        assert_eq!(outputs, vec!["one"]);
    }
}
