//! The meal plan requester: one operation, one piece of state.
//!
//! `generate_meal_plan` moves the state to loading, issues a single request,
//! and stores the outcome. Observers subscribe to a watch channel and
//! re-render on every transition.
//!
//! Overlapping triggers are not guarded against. Each resolution overwrites
//! the state, so the request that resolves last wins.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::{BackendError, HttpBackend, MealPlanBackend};
use crate::config::{ClientConfig, UserId};
use crate::outcome::MealPlanOutcome;
use crate::state::RequestState;

pub struct MealPlanRequester {
    user_id: UserId,
    backend: Arc<dyn MealPlanBackend>,
    state: watch::Sender<RequestState>,
}

impl MealPlanRequester {
    pub fn new(user_id: UserId, backend: Arc<dyn MealPlanBackend>) -> Self {
        let (state, _) = watch::channel(RequestState::idle());
        Self {
            user_id,
            backend,
            state,
        }
    }

    /// Build a requester talking HTTP to the configured server.
    pub fn from_config(config: &ClientConfig) -> Result<Self, BackendError> {
        let backend = HttpBackend::from_config(config)?;
        Ok(Self::new(config.user_id.clone(), Arc::new(backend)))
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn backend(&self) -> &Arc<dyn MealPlanBackend> {
        &self.backend
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    /// Receive a notification on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Run one request to completion and return its outcome.
    ///
    /// The state is loading from the moment this is first polled until the
    /// request resolves.
    pub async fn generate_meal_plan(&self) -> MealPlanOutcome {
        self.begin();
        self.complete().await
    }

    /// Start a request without waiting for it.
    ///
    /// The state is loading by the time this returns; the request itself
    /// resolves on a spawned task. Must be called within a tokio runtime.
    pub fn trigger(self: &Arc<Self>) -> JoinHandle<MealPlanOutcome> {
        self.begin();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.complete().await })
    }

    fn begin(&self) {
        tracing::debug!(user_id = %self.user_id, "meal plan request started");
        self.state.send_replace(RequestState::loading());
    }

    async fn complete(&self) -> MealPlanOutcome {
        let outcome = MealPlanOutcome::from(self.backend.generate(&self.user_id).await);
        match &outcome {
            MealPlanOutcome::Success { text } => {
                tracing::debug!(user_id = %self.user_id, bytes = text.len(), "meal plan received");
            }
            MealPlanOutcome::Failure { message } => {
                tracing::warn!(user_id = %self.user_id, error = %message, "meal plan request failed");
            }
        }
        self.state.send_replace(RequestState::resolved(&outcome));
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::oneshot;

    use super::*;
    use crate::backend::{HealthStatus, MealPlanHistory};
    use crate::state::RequestStatus;

    /// Backend that answers `generate` from a script. Entries that carry a
    /// gate wait for it before answering.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Scripted>>,
    }

    struct Scripted {
        gate: Option<oneshot::Receiver<()>>,
        reply: Result<Value, BackendError>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
            })
        }
    }

    fn now(reply: Result<Value, BackendError>) -> Scripted {
        Scripted { gate: None, reply }
    }

    fn gated(reply: Result<Value, BackendError>) -> (Scripted, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (
            Scripted {
                gate: Some(rx),
                reply,
            },
            tx,
        )
    }

    #[async_trait]
    impl MealPlanBackend for ScriptedBackend {
        async fn generate(&self, _user_id: &UserId) -> Result<Value, BackendError> {
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted reply left");
            if let Some(gate) = next.gate {
                let _ = gate.await;
            }
            next.reply
        }

        async fn history(&self, _user_id: &UserId, _limit: u32) -> Result<MealPlanHistory, BackendError> {
            unimplemented!("not used by the requester")
        }

        async fn health(&self) -> Result<HealthStatus, BackendError> {
            unimplemented!("not used by the requester")
        }
    }

    fn requester(backend: Arc<ScriptedBackend>) -> Arc<MealPlanRequester> {
        Arc::new(MealPlanRequester::new(UserId::new("Hassan").unwrap(), backend))
    }

    #[test]
    fn starts_idle() {
        let r = requester(ScriptedBackend::new(vec![]));
        assert_eq!(r.state(), RequestState::idle());
    }

    #[tokio::test]
    async fn trigger_is_loading_before_resolution() {
        let (reply, release) = gated(Ok(json!({"meal_plan": "X"})));
        let r = requester(ScriptedBackend::new(vec![reply]));

        let handle = r.trigger();
        assert_eq!(r.state().status(), RequestStatus::Loading);
        assert_eq!(r.state().result_text(), None);

        release.send(()).unwrap();
        let outcome = handle.await.unwrap();
        assert_eq!(outcome.text(), "X");
        assert_eq!(r.state().status(), RequestStatus::Succeeded);
        assert_eq!(r.state().result_text(), Some("X"));
    }

    #[tokio::test]
    async fn payload_without_meal_plan_is_shown_pretty() {
        let r = requester(ScriptedBackend::new(vec![now(Ok(json!({"foo": 1})))]));
        r.generate_meal_plan().await;
        assert_eq!(r.state().status(), RequestStatus::Succeeded);
        assert_eq!(r.state().result_text(), Some("{\n  \"foo\": 1\n}"));
    }

    #[tokio::test]
    async fn backend_error_fails_with_message() {
        let r = requester(ScriptedBackend::new(vec![now(Err(BackendError::Transport {
            url: "http://localhost:1/".to_owned(),
            message: "connection refused".to_owned(),
        }))]));
        let outcome = r.generate_meal_plan().await;
        assert!(!outcome.is_success());
        assert_eq!(r.state().status(), RequestStatus::Failed);
        assert!(r.state().result_text().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn retrigger_clears_previous_result() {
        let (second, release) = gated(Ok(json!({"meal_plan": "second"})));
        let r = requester(ScriptedBackend::new(vec![
            now(Ok(json!({"meal_plan": "first"}))),
            second,
        ]));

        r.generate_meal_plan().await;
        assert_eq!(r.state().result_text(), Some("first"));

        let handle = r.trigger();
        assert_eq!(r.state(), RequestState::loading());

        release.send(()).unwrap();
        handle.await.unwrap();
        assert_eq!(r.state().result_text(), Some("second"));
    }

    #[tokio::test]
    async fn last_resolution_wins() {
        let (slow, release_slow) = gated(Ok(json!({"meal_plan": "slow"})));
        let (fast, release_fast) = gated(Ok(json!({"meal_plan": "fast"})));
        let r = requester(ScriptedBackend::new(vec![slow, fast]));

        let first = r.trigger();
        tokio::task::yield_now().await;
        let second = r.trigger();
        tokio::task::yield_now().await;

        release_fast.send(()).unwrap();
        second.await.unwrap();
        assert_eq!(r.state().result_text(), Some("fast"));

        release_slow.send(()).unwrap();
        first.await.unwrap();
        assert_eq!(r.state().result_text(), Some("slow"));
        assert_eq!(r.state().status(), RequestStatus::Succeeded);
    }

    #[tokio::test]
    async fn subscribers_see_each_transition() {
        let (reply, release) = gated(Ok(json!({"meal_plan": "X"})));
        let r = requester(ScriptedBackend::new(vec![reply]));
        let mut rx = r.subscribe();
        assert_eq!(rx.borrow_and_update().status(), RequestStatus::Idle);

        let handle = r.trigger();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status(), RequestStatus::Loading);

        release.send(()).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().status(), RequestStatus::Succeeded);
        handle.await.unwrap();
    }
}
