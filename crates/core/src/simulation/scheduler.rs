//! Real-time driver: two independent tickers on their own threads
//!
//! The fire schedule and the agent schedule each run on a dedicated thread
//! woken by a `crossbeam_channel::tick`. Stopping drops the shared stop
//! sender, which disconnects the stop channel both threads select on; each
//! finishes the tick it is running, if any, and exits before `stop` returns.

use super::world::World;
use crossbeam_channel::{select, tick, Receiver, Sender};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Work run by one ticker thread
type TickerBody = Box<dyn FnOnce() + Send>;

/// Handle to the running tick threads
pub(crate) struct Scheduler {
    stop_tx: Option<Sender<()>>,
    threads: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn both tick threads for `world`
    ///
    /// Either both schedules run or neither does: if a thread cannot be
    /// spawned, any thread already started is stopped and joined.
    pub(crate) fn start(world: &Arc<World>) -> io::Result<Self> {
        Self::start_with(world, |name, body| {
            thread::Builder::new().name(name.to_owned()).spawn(body)
        })
    }

    fn start_with<F>(world: &Arc<World>, spawn: F) -> io::Result<Self>
    where
        F: Fn(&str, TickerBody) -> io::Result<JoinHandle<()>>,
    {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let config = world.config();
        let fire_interval = Duration::from_millis(config.fire_tick_interval_ms.max(1));
        let agent_interval = Duration::from_millis(config.agent_tick_interval_ms.max(1));

        let tickers: [(&str, Duration, fn(&World)); 2] = [
            ("fire-tick", fire_interval, |w: &World| {
                w.fire_tick();
            }),
            ("agent-tick", agent_interval, World::agent_tick),
        ];

        let mut scheduler = Self {
            stop_tx: Some(stop_tx),
            threads: Vec::with_capacity(tickers.len()),
        };
        for (name, interval, body) in tickers {
            let ticker = ticker_body(name, interval, stop_rx.clone(), Arc::clone(world), body);
            match spawn(name, ticker) {
                Ok(handle) => scheduler.threads.push(handle),
                Err(err) => {
                    error!("Failed to spawn {} thread: {}", name, err);
                    scheduler.stop();
                    return Err(err);
                }
            }
        }

        info!(
            "Scheduler started: fire every {:?}, agents every {:?}",
            fire_interval, agent_interval
        );
        Ok(scheduler)
    }

    /// Halt both schedules, waiting for in-flight ticks to complete
    pub(crate) fn stop(mut self) {
        drop(self.stop_tx.take());
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                warn!("A tick thread panicked before shutdown");
            }
        }
        info!("Scheduler stopped");
    }
}

fn ticker_body(
    name: &str,
    interval: Duration,
    stop_rx: Receiver<()>,
    world: Arc<World>,
    body: fn(&World),
) -> TickerBody {
    let ticker = tick(interval);
    let label = name.to_owned();
    Box::new(move || loop {
        select! {
            recv(stop_rx) -> _ => {
                debug!("{} thread exiting", label);
                break;
            }
            recv(ticker) -> _ => body(&world),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn world() -> Arc<World> {
        let config = SimulationConfig {
            fire_tick_interval_ms: 2,
            agent_tick_interval_ms: 2,
            ..SimulationConfig::default()
        };
        Arc::new(World::new(config))
    }

    #[test]
    fn test_both_schedules_tick() {
        let world = world();
        let scheduler = Scheduler::start(&world).unwrap();
        assert_eq!(scheduler.threads.len(), 2);
        thread::sleep(Duration::from_millis(50));
        scheduler.stop();
        assert!(world.fire_ticks() > 0);
        assert!(world.agent_ticks() > 0);
    }

    #[test]
    fn test_spawn_failure_stops_started_schedule() {
        let world = world();
        let result = Scheduler::start_with(&world, |name, body| {
            if name == "agent-tick" {
                return Err(io::Error::other("thread limit reached"));
            }
            thread::Builder::new().name(name.to_owned()).spawn(body)
        });
        assert!(result.is_err());

        // The fire thread was joined, so its count no longer moves
        let fire_ticks = world.fire_ticks();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(world.fire_ticks(), fire_ticks);
        assert_eq!(world.agent_ticks(), 0);
    }
}
