//! The clock poller samples the wall clock at a fixed cadence and hands each
//! sample on. It keeps no alarm logic of its own.

use std::{
    io,
    sync::mpsc::{self, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{Local, NaiveDateTime};

/// Alarms are minute granular, one sample a second can't miss one.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

#[must_use]
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[derive(Debug)]
pub struct ClockPoller {
    stop: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl ClockPoller {
    /// Calls `on_tick` right away and then once every `interval` until
    /// cancelled or until `on_tick` returns `false`.
    ///
    /// # Errors
    /// Fails if the thread can't be spawned.
    pub fn spawn_with<C, F>(interval: Duration, now: C, mut on_tick: F) -> io::Result<Self>
    where
        C: Fn() -> NaiveDateTime + Send + 'static,
        F: FnMut(NaiveDateTime) -> bool + Send + 'static,
    {
        let (stop, stopped) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("clock-poller".to_string())
            .spawn(move || loop {
                if !on_tick(now()) {
                    log::debug!("nobody is listening for ticks, poller exiting");
                    break;
                }
                match stopped.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
        })
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Stops ticking and waits for the poller thread to finish.
    pub fn cancel(&mut self) {
        if let Some(stop) = self.stop.take() {
            // the thread may already be gone
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("clock poller panicked");
            }
        }
    }
}

impl Drop for ClockPoller {
    fn drop(&mut self) {
        self.cancel();
    }
}
