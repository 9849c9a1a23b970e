//! Application context shared by a dashboard session.

use crate::auth::{AuthApi, AuthStore, HttpAuthClient};
use dashkit_engine::{Store, SubscriptionId};
use std::future::Future;

/// Auth state plus an app-wide busy flag.
pub struct AppContext<A = HttpAuthClient> {
    auth: AuthStore<A>,
    busy: Store<bool>,
}

impl<A: AuthApi> AppContext<A> {
    pub fn new(auth: AuthStore<A>) -> Self {
        Self {
            auth,
            busy: Store::new(false),
        }
    }

    pub fn auth(&self) -> &AuthStore<A> {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthStore<A> {
        &mut self.auth
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.state()
    }

    /// Set the busy flag. Subscribers hear only actual changes.
    pub fn set_busy(&mut self, busy: bool) {
        if *self.busy.state() != busy {
            self.busy.replace(busy);
        }
    }

    pub fn subscribe_busy(&mut self, listener: impl FnMut(&bool) + Send + 'static) -> SubscriptionId {
        self.busy.subscribe(listener)
    }

    /// Run `task` with the busy flag raised.
    pub async fn busy_while<F: Future>(&mut self, task: F) -> F::Output {
        self.set_busy(true);
        let output = task.await;
        self.set_busy(false);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::User;
    use crate::error::{Result, SessionError};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct Offline;

    #[async_trait]
    impl AuthApi for Offline {
        async fn current_user(&self) -> Result<User> {
            Err(SessionError::Status {
                status: 503,
                url: "offline".into(),
            })
        }

        async fn logout(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn busy_flag_wraps_task() {
        let mut app = AppContext::new(AuthStore::new(Offline));
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        app.subscribe_busy(move |b| sink.lock().unwrap().push(*b));

        let value = app.busy_while(async { 42 }).await;
        assert_eq!(value, 42);
        assert!(!app.is_busy());

        app.set_busy(false);
        assert_eq!(*changes.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn auth_is_reachable() {
        let mut app = AppContext::new(AuthStore::new(Offline));
        app.auth_mut().fetch_current_user().await;
        assert!(app.auth().state().error.is_some());
    }
}
