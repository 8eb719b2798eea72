use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;

use crate::db::models::{NewFast, TimerPatch};
use crate::{log_error, log_info, log_warn};

use super::{TimerApi, TimerState, TimerStatus};

const ENABLE_LOGS: bool = true;

pub type AlertFn = Arc<dyn Fn(&str) + Send + Sync>;
pub type FastRecordedFn = Arc<dyn Fn(NewFast) + Send + Sync>;
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub display: String,
}

impl TimerSnapshot {
    fn of(state: &TimerState) -> Self {
        Self {
            display: state.display(),
            state: state.clone(),
        }
    }
}

struct Ticker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Ticker {
    fn stop(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

/// Drives one user's live timer against a [`TimerApi`].
///
/// Every mutation goes to the backend first. Local state changes only after
/// the backend acknowledges; on failure the error is logged, handed to the
/// alert callback and returned, and local state is left as it was.
pub struct LiveTimer<A: TimerApi> {
    api: Arc<A>,
    user_id: String,
    state: Arc<Mutex<TimerState>>,
    // serializes user actions so two clicks cannot interleave their backend calls
    actions: Mutex<()>,
    ticker: std::sync::Mutex<Option<Ticker>>,
    tick_interval: Duration,
    snapshots: Arc<watch::Sender<TimerSnapshot>>,
    on_alert: AlertFn,
    on_fast: FastRecordedFn,
    clock: Clock,
}

impl<A: TimerApi> LiveTimer<A> {
    pub fn new(api: Arc<A>, user_id: impl Into<String>) -> Self {
        let (snapshots, _) = watch::channel(TimerSnapshot::of(&TimerState::new()));
        Self {
            api,
            user_id: user_id.into(),
            state: Arc::new(Mutex::new(TimerState::new())),
            actions: Mutex::new(()),
            ticker: std::sync::Mutex::new(None),
            tick_interval: Duration::from_secs(1),
            snapshots: Arc::new(snapshots),
            on_alert: Arc::new(|_: &str| {}),
            on_fast: Arc::new(|_: NewFast| {}),
            clock: Arc::new(Utc::now),
        }
    }

    /// Called with a user-facing message whenever an action fails.
    pub fn with_alert(mut self, on_alert: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_alert = Arc::new(on_alert);
        self
    }

    /// Called with the finished fast after a successful stop.
    pub fn with_fast_recorder(
        mut self,
        on_fast: impl Fn(NewFast) + Send + Sync + 'static,
    ) -> Self {
        self.on_fast = Arc::new(on_fast);
        self
    }

    pub fn with_clock(
        mut self,
        clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static,
    ) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        let mut guard = self.state.lock().await;
        guard.sync_elapsed((self.clock)());
        TimerSnapshot::of(&guard)
    }

    /// Loads the persisted timer and resumes ticking if it is running.
    pub async fn mount(&self) -> Result<TimerSnapshot> {
        let _action = self.actions.lock().await;

        let remote = match self.api.get_timer(&self.user_id).await {
            Ok(remote) => remote,
            Err(err) => return Err(self.report("load timer", err)),
        };

        self.cancel_ticker();
        let now = (self.clock)();
        let snapshot = {
            let mut state = self.state.lock().await;
            *state = match &remote {
                Some(timer) => TimerState::from_timer(timer, now),
                None => TimerState::new(),
            };
            TimerSnapshot::of(&state)
        };

        if let Some(start) = snapshot.state.start_time {
            log_info!(
                "Restored {:?} timer for {} started at {}",
                snapshot.state.status,
                self.user_id,
                start
            );
        }
        self.publish(snapshot.clone());
        if snapshot.state.status == TimerStatus::Running {
            self.spawn_ticker();
        }
        Ok(snapshot)
    }

    pub async fn start(&self, notes: &str) -> Result<TimerSnapshot> {
        let _action = self.actions.lock().await;

        if self.state.lock().await.is_active() {
            return Err(self.report("start fast", anyhow!("a fast is already in progress")));
        }

        let now = (self.clock)();
        let timer = match self.api.start_timer(&self.user_id, now, notes).await {
            Ok(timer) => timer,
            Err(err) => return Err(self.report("start fast", err)),
        };

        self.cancel_ticker();
        let snapshot = {
            let mut state = self.state.lock().await;
            *state = TimerState::from_timer(&timer, (self.clock)());
            TimerSnapshot::of(&state)
        };
        log_info!("Started fast for {} at {}", self.user_id, timer.start_time);

        self.publish(snapshot.clone());
        if snapshot.state.status == TimerStatus::Running {
            self.spawn_ticker();
        }
        Ok(snapshot)
    }

    pub async fn pause(&self) -> Result<TimerSnapshot> {
        let _action = self.actions.lock().await;

        if self.state.lock().await.status != TimerStatus::Running {
            return Err(self.report("pause fast", anyhow!("the timer is not running")));
        }

        let now = (self.clock)();
        let patch = TimerPatch {
            is_paused: Some(true),
            paused_at: Some(now),
            ..Default::default()
        };
        self.apply_remote("pause fast", patch).await
    }

    pub async fn resume(&self) -> Result<TimerSnapshot> {
        let _action = self.actions.lock().await;

        let now = (self.clock)();
        let Some(start_time) = self.state.lock().await.resumed_start(now) else {
            return Err(self.report("resume fast", anyhow!("the timer is not paused")));
        };

        let patch = TimerPatch {
            is_paused: Some(false),
            start_time: Some(start_time),
            ..Default::default()
        };
        self.apply_remote("resume fast", patch).await
    }

    pub async fn update_notes(&self, notes: &str) -> Result<TimerSnapshot> {
        let _action = self.actions.lock().await;

        if !self.state.lock().await.is_active() {
            return Err(self.report("save notes", anyhow!("no fast in progress")));
        }

        let patch = TimerPatch {
            notes: Some(notes.to_string()),
            ..Default::default()
        };
        self.apply_remote("save notes", patch).await
    }

    /// Deletes the backend timer and hands the finished fast to the recorder.
    /// Returns `None` if the fast had no positive duration and was dropped.
    pub async fn stop(&self) -> Result<Option<NewFast>> {
        let _action = self.actions.lock().await;

        if !self.state.lock().await.is_active() {
            return Err(self.report("stop fast", anyhow!("no fast in progress")));
        }

        if let Err(err) = self.api.delete_timer(&self.user_id).await {
            return Err(self.report("stop fast", err));
        }

        self.cancel_ticker();
        let now = (self.clock)();
        let (fast, snapshot) = {
            let mut state = self.state.lock().await;
            let fast = state.finish(now);
            state.reset();
            (fast, TimerSnapshot::of(&state))
        };
        self.publish(snapshot);

        match &fast {
            Some(fast) => {
                log_info!(
                    "Stopped fast for {} after {}s",
                    self.user_id,
                    fast.duration_seconds()
                );
                (self.on_fast)(fast.clone());
            }
            None => log_warn!("Stopped empty fast for {}; nothing recorded", self.user_id),
        }

        Ok(fast)
    }

    /// Tears down the display ticker. The backend timer is untouched.
    pub fn unmount(&self) {
        self.cancel_ticker();
    }

    async fn apply_remote(&self, action: &str, patch: TimerPatch) -> Result<TimerSnapshot> {
        let timer = match self.api.update_timer(&self.user_id, &patch).await {
            Ok(timer) => timer,
            Err(err) => return Err(self.report(action, err)),
        };

        self.cancel_ticker();
        let snapshot = {
            let mut state = self.state.lock().await;
            *state = TimerState::from_timer(&timer, (self.clock)());
            TimerSnapshot::of(&state)
        };

        self.publish(snapshot.clone());
        if snapshot.state.status == TimerStatus::Running {
            self.spawn_ticker();
        }
        Ok(snapshot)
    }

    fn report(&self, action: &str, err: anyhow::Error) -> anyhow::Error {
        log_error!("Failed to {} for {}: {:#}", action, self.user_id, err);
        (self.on_alert)(&format!("Failed to {action}: {err}"));
        err
    }

    fn publish(&self, snapshot: TimerSnapshot) {
        self.snapshots.send_replace(snapshot);
    }

    fn spawn_ticker(&self) {
        let mut ticker_guard = match self.ticker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = ticker_guard.take() {
            previous.stop();
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let state = self.state.clone();
        let snapshots = self.snapshots.clone();
        let clock = self.clock.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {}
                }

                let snapshot = {
                    let mut guard = state.lock().await;
                    if cancelled.is_cancelled() || guard.status != TimerStatus::Running {
                        break;
                    }
                    guard.sync_elapsed(clock());
                    TimerSnapshot::of(&guard)
                };
                snapshots.send_replace(snapshot);
            }
        });

        *ticker_guard = Some(Ticker { token, handle });
    }

    fn cancel_ticker(&self) {
        let mut ticker_guard = match self.ticker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(ticker) = ticker_guard.take() {
            ticker.stop();
        }
    }
}

impl<A: TimerApi> Drop for LiveTimer<A> {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}
