use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::RequestError;
use super::client::PromptClient;
use super::encode::PromptRequest;
use super::poll::{PollEvent, PollOutcome, PollPolicy, run_poll_loop};

/// How a submission gets its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitMode {
    /// The submit response body is the answer.
    #[default]
    Single,
    /// Fire the submit, then poll the status endpoint for the answer.
    Polling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// How a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEnd {
    /// Single-mode response arrived.
    Answered,
    /// Single-mode submit failed.
    Failed,
    Poll(PollOutcome),
}

#[derive(Debug)]
pub enum JobEvent {
    /// Replace the output pane with this text.
    Output(String),
    /// A request failed. Polling jobs keep going.
    Failed(RequestError),
    Done(JobEnd),
}

#[derive(Debug)]
pub struct JobUpdate {
    pub job: JobId,
    pub event: JobEvent,
}

struct ActiveJob {
    id: JobId,
    cancel: CancellationToken,
}

/// Owns the single live prompt job. Starting a job cancels the previous one
/// and updates from anything but the live job are discarded on receipt.
pub struct RequestCycle<C> {
    client: Arc<C>,
    mode: SubmitMode,
    policy: PollPolicy,
    handle: Handle,
    tx: UnboundedSender<JobUpdate>,
    rx: UnboundedReceiver<JobUpdate>,
    next_id: u64,
    active: Option<ActiveJob>,
}

impl<C: PromptClient> RequestCycle<C> {
    pub fn new(client: C, mode: SubmitMode, policy: PollPolicy, handle: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            client: Arc::new(client),
            mode,
            policy,
            handle,
            tx,
            rx,
            next_id: 0,
            active: None,
        }
    }

    pub fn mode(&self) -> SubmitMode {
        self.mode
    }

    pub fn active_job(&self) -> Option<JobId> {
        self.active.as_ref().map(|job| job.id)
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Spawn a job for `request`, canceling whatever was running.
    pub fn start(&mut self, request: PromptRequest) -> JobId {
        self.cancel();
        self.next_id += 1;
        let id = JobId(self.next_id);
        let cancel = CancellationToken::new();

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let token = cancel.clone();
        match self.mode {
            SubmitMode::Single => {
                self.handle
                    .spawn(single_job(client, request, id, tx, token));
            }
            SubmitMode::Polling => {
                let policy = self.policy;
                self.handle
                    .spawn(polling_job(client, request, policy, id, tx, token));
            }
        }

        self.active = Some(ActiveJob { id, cancel });
        id
    }

    /// Cancel the live job, if any. Returns its id.
    pub fn cancel(&mut self) -> Option<JobId> {
        let job = self.active.take()?;
        job.cancel.cancel();
        Some(job.id)
    }

    /// Updates received so far for the live job, in order.
    pub fn drain(&mut self) -> Vec<JobUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = self.rx.try_recv() {
            if let Some(update) = self.accept(update) {
                updates.push(update);
            }
        }
        updates
    }

    /// Wait for the next update belonging to the live job.
    pub async fn recv(&mut self) -> Option<JobUpdate> {
        while let Some(update) = self.rx.recv().await {
            if let Some(update) = self.accept(update) {
                return Some(update);
            }
        }
        None
    }

    fn accept(&mut self, update: JobUpdate) -> Option<JobUpdate> {
        if self.active_job() != Some(update.job) {
            return None;
        }
        if matches!(update.event, JobEvent::Done(_)) {
            self.active = None;
        }
        Some(update)
    }
}

impl<C> Drop for RequestCycle<C> {
    fn drop(&mut self) {
        if let Some(job) = self.active.take() {
            job.cancel.cancel();
        }
    }
}

fn send(tx: &UnboundedSender<JobUpdate>, job: JobId, event: JobEvent) {
    // The receiver only goes away when the cycle is dropped, which also
    // cancels the job.
    let _ = tx.send(JobUpdate { job, event });
}

async fn single_job<C: PromptClient>(
    client: Arc<C>,
    request: PromptRequest,
    job: JobId,
    tx: UnboundedSender<JobUpdate>,
    cancel: CancellationToken,
) {
    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        result = client.submit(&request) => result,
    };
    match result {
        Ok(body) => {
            send(&tx, job, JobEvent::Output(body));
            send(&tx, job, JobEvent::Done(JobEnd::Answered));
        }
        Err(err) => {
            send(&tx, job, JobEvent::Failed(err));
            send(&tx, job, JobEvent::Done(JobEnd::Failed));
        }
    }
}

async fn polling_job<C: PromptClient>(
    client: Arc<C>,
    request: PromptRequest,
    policy: PollPolicy,
    job: JobId,
    tx: UnboundedSender<JobUpdate>,
    cancel: CancellationToken,
) {
    let started = Instant::now();

    let submit_cancel = cancel.child_token();
    let submit = {
        let client = Arc::clone(&client);
        let tx = tx.clone();
        let token = submit_cancel.clone();
        async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                result = client.submit(&request) => {
                    if let Err(err) = result {
                        send(&tx, job, JobEvent::Failed(err));
                    }
                }
            }
        }
    };
    tokio::spawn(submit);

    let outcome = run_poll_loop(client.as_ref(), &policy, started, &cancel, |event| {
        let event = match event {
            PollEvent::Update(body) => JobEvent::Output(body),
            PollEvent::Failed(err) => JobEvent::Failed(err),
        };
        send(&tx, job, event);
    })
    .await;

    submit_cancel.cancel();
    if outcome != PollOutcome::Canceled {
        send(&tx, job, JobEvent::Done(JobEnd::Poll(outcome)));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::prompt::client::scripted::ScriptedClient;
    use crate::prompt::encode::PromptMode;

    fn request(code: &str) -> PromptRequest {
        PromptRequest {
            code: code.into(),
            context: String::new(),
            mode: PromptMode::Code,
        }
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn single_mode_delivers_the_response() {
        let client = ScriptedClient::replying("def f(): pass");
        let mut cycle = RequestCycle::new(
            client.clone(),
            SubmitMode::Single,
            PollPolicy::default(),
            Handle::current(),
        );
        let job = cycle.start(request("f"));
        assert!(cycle.is_busy());

        let first = cycle.recv().await.unwrap();
        assert_eq!(first.job, job);
        assert!(matches!(first.event, JobEvent::Output(ref body) if body == "def f(): pass"));
        let done = cycle.recv().await.unwrap();
        assert!(matches!(done.event, JobEvent::Done(JobEnd::Answered)));
        assert!(!cycle.is_busy());
        assert_eq!(client.submitted.lock().unwrap()[0].code, "f");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn end_leaves_output_untouched() {
        let client = ScriptedClient::default();
        client.queue_poll(Ok("END".into()));
        let mut cycle = RequestCycle::new(
            client,
            SubmitMode::Polling,
            PollPolicy::default(),
            Handle::current(),
        );
        cycle.start(request("x"));

        let update = cycle.recv().await.unwrap();
        assert!(matches!(
            update.event,
            JobEvent::Done(JobEnd::Poll(PollOutcome::Finished))
        ));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn new_submission_supersedes_old_job() {
        let client = ScriptedClient::default();
        let mut cycle = RequestCycle::new(
            client,
            SubmitMode::Polling,
            PollPolicy::default(),
            Handle::current(),
        );
        let first = cycle.start(request("one"));
        tokio::time::sleep(Duration::from_millis(8_500)).await;

        let second = cycle.start(request("two"));
        assert_ne!(first, second);
        // Everything the first job queued is now stale.
        assert!(cycle.drain().is_empty());

        let update = cycle.recv().await.unwrap();
        assert_eq!(update.job, second);
        assert!(matches!(update.event, JobEvent::Output(ref body) if body == "working"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn cancel_clears_the_live_job() {
        let client = ScriptedClient::default();
        let mut cycle = RequestCycle::new(
            client.clone(),
            SubmitMode::Polling,
            PollPolicy::default(),
            Handle::current(),
        );
        let job = cycle.start(request("x"));
        assert_eq!(cycle.cancel(), Some(job));
        assert_eq!(cycle.active_job(), None);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(cycle.drain().is_empty());
        assert_eq!(client.polls(), 0);
    }
}
