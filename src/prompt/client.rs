use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use super::RequestError;
use super::encode::PromptRequest;

/// Where the backend lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    pub base_url: String,
    pub submit_path: String,
    pub poll_path: String,
    /// Per-request timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            submit_path: "/save_files".into(),
            poll_path: "/poll".into(),
            timeout_secs: 0,
        }
    }
}

impl EndpointSettings {
    pub fn submit_url(&self) -> String {
        join_url(&self.base_url, &self.submit_path)
    }

    pub fn poll_url(&self) -> String {
        join_url(&self.base_url, &self.poll_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Transport used by the request cycle.
pub trait PromptClient: Send + Sync + 'static {
    /// Post one submission and return the response body.
    fn submit(
        &self,
        request: &PromptRequest,
    ) -> impl Future<Output = Result<String, RequestError>> + Send;

    /// Fetch the current status body.
    fn poll(&self) -> impl Future<Output = Result<String, RequestError>> + Send;
}

/// `reqwest`-backed client speaking the form/plain-text protocol.
#[derive(Debug, Clone)]
pub struct HttpPromptClient {
    http: reqwest::Client,
    submit_url: String,
    poll_url: String,
}

impl HttpPromptClient {
    pub fn new(settings: &EndpointSettings) -> Result<Self, RequestError> {
        let mut builder = reqwest::Client::builder();
        if settings.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        }
        let http = builder.build()?;
        let submit_url = settings.submit_url();
        reqwest::Url::parse(&submit_url)
            .map_err(|err| RequestError::InvalidEndpoint(format!("{submit_url}: {err}")))?;
        Ok(Self {
            http,
            submit_url,
            poll_url: settings.poll_url(),
        })
    }

    async fn read_body(response: reqwest::Response) -> Result<String, RequestError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

impl PromptClient for HttpPromptClient {
    async fn submit(&self, request: &PromptRequest) -> Result<String, RequestError> {
        let response = self
            .http
            .post(&self.submit_url)
            .form(&request.form_fields()[..])
            .send()
            .await?;
        Self::read_body(response).await
    }

    async fn poll(&self) -> Result<String, RequestError> {
        let response = self.http.get(&self.poll_url).send().await?;
        Self::read_body(response).await
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// In-process client returning queued poll bodies; submissions echo
    /// `submit_reply` and are recorded.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedClient {
        pub submit_reply: Arc<Mutex<Option<Result<String, RequestError>>>>,
        pub poll_replies: Arc<Mutex<VecDeque<Result<String, RequestError>>>>,
        pub submitted: Arc<Mutex<Vec<PromptRequest>>>,
        pub poll_count: Arc<Mutex<usize>>,
    }

    impl ScriptedClient {
        pub fn replying(reply: &str) -> Self {
            let client = Self::default();
            *client.submit_reply.lock().unwrap() = Some(Ok(reply.to_string()));
            client
        }

        pub fn queue_poll(&self, reply: Result<String, RequestError>) {
            self.poll_replies.lock().unwrap().push_back(reply);
        }

        pub fn polls(&self) -> usize {
            *self.poll_count.lock().unwrap()
        }
    }

    impl PromptClient for ScriptedClient {
        async fn submit(&self, request: &PromptRequest) -> Result<String, RequestError> {
            self.submitted.lock().unwrap().push(request.clone());
            self.submit_reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Ok(String::new()))
        }

        async fn poll(&self) -> Result<String, RequestError> {
            *self.poll_count.lock().unwrap() += 1;
            self.poll_replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("working".to_string()))
        }
    }
}
