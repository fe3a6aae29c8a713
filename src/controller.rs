//! Error-as-state request driver for UI layers.
//!
//! [`ApiController::execute`] never returns an error: failures are published
//! as [`RequestState::Failure`] and the call resolves to `None`. At most one
//! call is owned by a controller at a time; starting a new one, calling
//! [`ApiController::cancel`] or dropping the controller abandons the previous
//! call, whether it is waiting on the network or on a backoff timer.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use tokio::sync::{oneshot, watch};

use crate::{ApiClient, AppError, RequestOptions, RequestState, Status};

/// The call currently allowed to publish state.
#[derive(Default)]
struct Ownership {
    generation: u64,
    /// Dropping or firing this sender cancels the owning call.
    cancel: Option<oneshot::Sender<()>>,
}

pub struct ApiController<T> {
    client: ApiClient,
    state: watch::Sender<RequestState<T>>,
    owner: Mutex<Ownership>,
}

impl<T: fmt::Debug> fmt::Debug for ApiController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiController")
            .field("client", &self.client)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl<T> ApiController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    pub fn new(client: ApiClient) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            client,
            state,
            owner: Mutex::new(Ownership::default()),
        }
    }

    /// Requests `endpoint`, publishing `Loading` and then `Success` or `Failure`.
    ///
    /// Returns the decoded data, or `None` when the request failed or was
    /// cancelled. A cache hit publishes `Success` directly.
    pub async fn execute(&self, endpoint: &str, options: RequestOptions) -> Option<T> {
        let (generation, cancelled) = self.begin();
        let _guard = CallGuard {
            controller: self,
            generation,
        };

        let run = self.client.run::<T, _>(endpoint, &options, || {
            self.publish(generation, RequestState::Loading);
        });

        let result = tokio::select! {
            biased;
            _ = cancelled => {
                #[cfg(feature = "tracing")]
                tracing::debug!(endpoint, "request cancelled");
                return None;
            }
            result = run => result,
        };

        match result {
            Ok(data) => {
                self.finish(generation, RequestState::Success { data: data.clone() });
                Some(data)
            }
            Err(error) => {
                self.finish(generation, RequestState::Failure { error });
                None
            }
        }
    }

    /// Abandons the in-flight call, if any, and returns to `Idle`.
    pub fn cancel(&self) {
        let mut owner = self.lock_owner();
        owner.generation = owner.generation.wrapping_add(1);
        owner.cancel.take();
        self.state.send_replace(RequestState::Idle);
    }

    /// Returns to `Idle` without touching an in-flight call.
    pub fn reset(&self) {
        let _owner = self.lock_owner();
        self.state.send_replace(RequestState::Idle);
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data().cloned()
    }

    pub fn error(&self) -> Option<AppError> {
        self.state.borrow().error().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn has_error(&self) -> bool {
        self.state.borrow().has_error()
    }

    /// Receiver notified on every published state.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Takes ownership for a new call, cancelling the previous one.
    fn begin(&self) -> (u64, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let mut owner = self.lock_owner();
        owner.generation = owner.generation.wrapping_add(1);
        owner.cancel = Some(tx);
        (owner.generation, rx)
    }

    fn publish(&self, generation: u64, state: RequestState<T>) {
        let owner = self.lock_owner();
        if owner.generation == generation {
            self.state.send_replace(state);
        }
    }

    /// Publishes the terminal state and releases ownership.
    fn finish(&self, generation: u64, state: RequestState<T>) {
        let mut owner = self.lock_owner();
        if owner.generation == generation {
            owner.cancel = None;
            self.state.send_replace(state);
        }
    }

    /// Releases ownership of a call whose future was dropped before settling.
    ///
    /// No-op once the call finished, was cancelled or was superseded.
    fn abandon(&self, generation: u64) {
        let mut owner = self.lock_owner();
        if owner.generation == generation && owner.cancel.is_some() {
            owner.generation = owner.generation.wrapping_add(1);
            owner.cancel = None;
            self.state.send_replace(RequestState::Idle);
        }
    }

    fn lock_owner(&self) -> MutexGuard<'_, Ownership> {
        self.owner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets the controller to `Idle` when an `execute` future is dropped mid-call.
struct CallGuard<'a, T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    controller: &'a ApiController<T>,
    generation: u64,
}

impl<T> Drop for CallGuard<'_, T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        self.controller.abandon(self.generation);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::{ApiClient, RequestState, Status};

    #[test]
    fn starts_idle() {
        let controller = ApiClient::new("http://api.local").controller::<Value>();
        assert_eq!(controller.status(), Status::Idle);
        assert_eq!(controller.state(), RequestState::Idle);
        assert!(!controller.is_loading() && !controller.has_error());
        assert!(controller.data().is_none() && controller.error().is_none());
    }

    #[test]
    fn cancel_and_reset_without_call_stay_idle() {
        let controller = ApiClient::new("http://api.local").controller::<Value>();
        let mut rx = controller.subscribe();
        controller.cancel();
        controller.reset();
        assert_eq!(controller.status(), Status::Idle);
        assert!(rx.has_changed().expect("sender is alive"));
        assert_eq!(*rx.borrow_and_update(), RequestState::Idle);
    }

    #[test]
    fn debug_includes_state() {
        let controller = ApiClient::new("http://api.local").controller::<u32>();
        assert!(format!("{controller:?}").contains("Idle"));
    }
}
