//! Client side of the timer API.
//!
//! [`TimerApi`] is the seam the live timer talks through. [`HttpTimerApi`]
//! implements it against the backend routes in [`crate::api`].

use std::future::Future;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Url};

use crate::db::models::{FastInfo, NewFast, StartTimer, Timer, TimerPatch};

pub trait TimerApi: Send + Sync + 'static {
    fn get_timer(&self, user_id: &str) -> impl Future<Output = Result<Option<Timer>>> + Send;

    fn start_timer(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        notes: &str,
    ) -> impl Future<Output = Result<Timer>> + Send;

    fn update_timer(
        &self,
        user_id: &str,
        patch: &TimerPatch,
    ) -> impl Future<Output = Result<Timer>> + Send;

    fn delete_timer(&self, user_id: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Clone)]
pub struct HttpTimerApi {
    client: Client,
    base_url: Url,
}

impl HttpTimerApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid API base url '{base_url}'"))?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("API base url '{base_url}' cannot carry a path"));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("API base url cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        Ok(self.client.request(method, self.url(segments)?))
    }

    pub async fn list_fasts(&self, user_id: &str) -> Result<Vec<FastInfo>> {
        let response = self
            .request(Method::GET, &["api", "fasts", user_id])?
            .send()
            .await
            .context("failed to reach fast history API")?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    /// Appends a fast to the user's history.
    pub async fn record_fast(&self, user_id: &str, fast: &NewFast) -> Result<FastInfo> {
        let response = self
            .request(Method::POST, &["api", "fasts", user_id])?
            .json(fast)
            .send()
            .await
            .context("failed to reach fast history API")?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

impl TimerApi for HttpTimerApi {
    async fn get_timer(&self, user_id: &str) -> Result<Option<Timer>> {
        let response = self
            .request(Method::GET, &["api", "timer", user_id])?
            .send()
            .await
            .context("failed to reach timer API")?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn start_timer(
        &self,
        user_id: &str,
        start_time: DateTime<Utc>,
        notes: &str,
    ) -> Result<Timer> {
        let body = StartTimer {
            start_time,
            notes: notes.to_string(),
        };
        let response = self
            .request(Method::POST, &["api", "timer", user_id])?
            .json(&body)
            .send()
            .await
            .context("failed to reach timer API")?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn update_timer(&self, user_id: &str, patch: &TimerPatch) -> Result<Timer> {
        let response = self
            .request(Method::PATCH, &["api", "timer", user_id])?
            .json(patch)
            .send()
            .await
            .context("failed to reach timer API")?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn delete_timer(&self, user_id: &str) -> Result<()> {
        self.request(Method::DELETE, &["api", "timer", user_id])?
            .send()
            .await
            .context("failed to reach timer API")?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_escaped_paths() {
        let api = HttpTimerApi::new("http://localhost:3001/").unwrap();
        let url = api.url(&["api", "timer", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/timer/a%20b%2Fc");
    }

    #[test]
    fn keeps_base_path_prefix() {
        let api = HttpTimerApi::new("http://example.com/fastlog").unwrap();
        let url = api.url(&["api", "fasts", "alice"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/fastlog/api/fasts/alice");
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(HttpTimerApi::new("not a url").is_err());
        assert!(HttpTimerApi::new("mailto:someone@example.com").is_err());
    }
}
