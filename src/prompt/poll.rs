use std::time::Duration;

use serde::Deserialize;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::RequestError;
use super::client::PromptClient;

/// Body the backend sends once generation is complete.
pub const END_SENTINEL: &str = "END";

/// `[poll]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub warmup_secs: u64,
    pub stall_after_secs: u64,
    pub max_duration_secs: Option<u64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            warmup_secs: 8,
            stall_after_secs: 60,
            max_duration_secs: None,
        }
    }
}

impl PollSettings {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.interval_ms.max(1)),
            warmup: Duration::from_secs(self.warmup_secs),
            stall_after: Duration::from_secs(self.stall_after_secs),
            max_duration: self.max_duration_secs.map(Duration::from_secs),
        }
    }
}

/// Timing rules for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// No poll is issued before this much time has passed since submit.
    pub warmup: Duration,
    /// After this long, an empty or one-character body ends the loop.
    pub stall_after: Duration,
    pub max_duration: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollSettings::default().policy()
    }
}

/// What to do with one poll response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    Finished,
    Stalled,
    Update(String),
}

pub fn judge_poll(body: String, elapsed: Duration, policy: &PollPolicy) -> PollVerdict {
    if body == END_SENTINEL {
        PollVerdict::Finished
    } else if elapsed > policy.stall_after && body.chars().count() <= 1 {
        PollVerdict::Stalled
    } else {
        PollVerdict::Update(body)
    }
}

/// Why a poll loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Finished,
    Stalled,
    TimedOut,
    Canceled,
}

impl PollOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            PollOutcome::Finished => "finished",
            PollOutcome::Stalled => "stalled",
            PollOutcome::TimedOut => "timed_out",
            PollOutcome::Canceled => "canceled",
        }
    }
}

/// Intermediate results reported while the loop runs.
#[derive(Debug)]
pub enum PollEvent {
    Update(String),
    Failed(RequestError),
}

/// Poll `client` every `policy.interval` until the backend signals the end,
/// the stall rule fires, the hard cap passes or `cancel` trips. Requests run
/// one at a time; a tick that lands while a request is in flight is delayed.
pub async fn run_poll_loop<C, F>(
    client: &C,
    policy: &PollPolicy,
    started: Instant,
    cancel: &CancellationToken,
    mut on_event: F,
) -> PollOutcome
where
    C: PromptClient,
    F: FnMut(PollEvent),
{
    let mut ticker = tokio::time::interval(policy.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Canceled,
            _ = ticker.tick() => {}
        }

        let elapsed = started.elapsed();
        if policy.max_duration.is_some_and(|max| elapsed >= max) {
            return PollOutcome::TimedOut;
        }
        if elapsed < policy.warmup {
            continue;
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Canceled,
            result = client.poll() => result,
        };
        match result {
            Ok(body) => match judge_poll(body, elapsed, policy) {
                PollVerdict::Finished => return PollOutcome::Finished,
                PollVerdict::Stalled => return PollOutcome::Stalled,
                PollVerdict::Update(body) => on_event(PollEvent::Update(body)),
            },
            Err(err) => on_event(PollEvent::Failed(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::client::scripted::ScriptedClient;

    #[test]
    fn end_sentinel_finishes() {
        let policy = PollPolicy::default();
        assert_eq!(
            judge_poll("END".into(), Duration::from_secs(9), &policy),
            PollVerdict::Finished
        );
    }

    #[test]
    fn short_body_only_stalls_after_cutoff() {
        let policy = PollPolicy::default();
        assert_eq!(
            judge_poll("x".into(), Duration::from_secs(30), &policy),
            PollVerdict::Update("x".into())
        );
        assert_eq!(
            judge_poll("x".into(), Duration::from_secs(61), &policy),
            PollVerdict::Stalled
        );
        assert_eq!(
            judge_poll("xy".into(), Duration::from_secs(61), &policy),
            PollVerdict::Update("xy".into())
        );
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn no_poll_before_warmup_then_end_stops() {
        let client = ScriptedClient::default();
        client.queue_poll(Ok("partial".into()));
        client.queue_poll(Ok("END".into()));
        let cancel = CancellationToken::new();
        let started = Instant::now();
        let mut updates = Vec::new();

        let outcome = run_poll_loop(
            &client,
            &PollPolicy::default(),
            started,
            &cancel,
            |event| {
                if let PollEvent::Update(body) = event {
                    updates.push(body);
                }
            },
        )
        .await;

        assert_eq!(outcome, PollOutcome::Finished);
        assert_eq!(updates, vec!["partial".to_string()]);
        assert_eq!(client.polls(), 2);
        assert!(started.elapsed() >= Duration::from_secs(8));
        assert!(started.elapsed() < Duration::from_secs(9));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn failures_keep_polling() {
        let client = ScriptedClient::default();
        client.queue_poll(Err(RequestError::Status {
            status: 502,
            body: String::new(),
        }));
        client.queue_poll(Ok("END".into()));
        let cancel = CancellationToken::new();
        let mut failures = 0;

        let outcome = run_poll_loop(
            &client,
            &PollPolicy::default(),
            Instant::now(),
            &cancel,
            |event| {
                if matches!(event, PollEvent::Failed(_)) {
                    failures += 1;
                }
            },
        )
        .await;

        assert_eq!(outcome, PollOutcome::Finished);
        assert_eq!(failures, 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn empty_body_after_cutoff_stalls() {
        let client = ScriptedClient::default();
        let policy = PollPolicy {
            warmup: Duration::from_secs(61),
            ..PollPolicy::default()
        };
        client.queue_poll(Ok(String::new()));
        let cancel = CancellationToken::new();
        let mut updates = 0;

        let outcome =
            run_poll_loop(&client, &policy, Instant::now(), &cancel, |_| updates += 1).await;

        assert_eq!(outcome, PollOutcome::Stalled);
        assert_eq!(updates, 0);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn hard_cap_times_out() {
        let client = ScriptedClient::default();
        let policy = PollPolicy {
            max_duration: Some(Duration::from_secs(10)),
            ..PollPolicy::default()
        };
        let cancel = CancellationToken::new();

        let outcome = run_poll_loop(&client, &policy, Instant::now(), &cancel, |_| {}).await;

        assert_eq!(outcome, PollOutcome::TimedOut);
        // 100 ms ticks between 8 s and 10 s.
        assert!((19..=21).contains(&client.polls()), "{}", client.polls());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_stops_the_loop() {
        let client = ScriptedClient::default();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let outcome = run_poll_loop(
            &client,
            &PollPolicy::default(),
            Instant::now(),
            &cancel,
            |_| {},
        )
        .await;

        assert_eq!(outcome, PollOutcome::Canceled);
        assert_eq!(client.polls(), 0);
    }
}
