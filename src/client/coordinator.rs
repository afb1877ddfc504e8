use super::error::ClientError;
use super::redirect::LoginRedirect;
use super::session::SessionStore;
use super::transport::{ApiRequest, ApiResponse, HttpTransport};
use crate::domain_model::AccessToken;
use crate::logger::*;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;

pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

type Reply = oneshot::Sender<Result<ApiResponse, ClientError>>;

struct Waiter {
    request: ApiRequest,
    reply: Reply,
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<Waiter>,
}

#[derive(Deserialize)]
struct RefreshBody {
    token: AccessToken,
}

/// Single-flight access token refresh.
///
/// The first intercepted 401 starts a refresh episode; every 401 that arrives
/// while it runs queues behind it. On success the queue is replayed in arrival
/// order with the new token. On failure every queued call is rejected, the
/// session is cleared and the user is sent to login once. A replayed call is
/// never queued again.
///
/// Episodes run on their own task so a caller dropping its future cannot
/// strand the queue.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionStore>,
    redirect: Arc<dyn LoginRedirect>,
    refresh_timeout: Duration,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        session: Arc<SessionStore>,
        redirect: Arc<dyn LoginRedirect>,
        refresh_timeout: Duration,
    ) -> Self {
        RefreshCoordinator {
            inner: Arc::new(Inner {
                transport,
                session,
                redirect,
                refresh_timeout,
                state: Mutex::new(RefreshState::default()),
            }),
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.inner.transport
    }

    /// Calls parked on the current refresh episode.
    pub fn waiting(&self) -> usize {
        self.inner.lock().waiters.len()
    }

    pub fn refresh_in_flight(&self) -> bool {
        self.inner.lock().in_flight
    }

    /// Send `request` with the current access token, recovering from one
    /// expired-token rejection when the request is intercepted.
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ClientError> {
        let sent_with = self.inner.session.get();
        let response = self.inner.transport.send(&request, sent_with.as_ref()).await?;

        if !response.is_unauthorized() || !request.intercept || request.is_refresh() {
            return Ok(response);
        }

        match self.inner.recover(request, sent_with.as_ref()) {
            Recovery::Queued(reply) => {
                // a dropped sender means the episode task died without answering
                reply.await.unwrap_or(Err(ClientError::SessionExpired))
            }
            Recovery::AlreadyRefreshed(request, token) => self.inner.replay(&request, &token).await,
            Recovery::SessionEnded => Err(ClientError::SessionExpired),
        }
    }
}

/// What to do with a request whose 401 has just arrived.
enum Recovery {
    Queued(oneshot::Receiver<Result<ApiResponse, ClientError>>),
    /// An episode finished after this request went out; retry with its token.
    AlreadyRefreshed(ApiRequest, AccessToken),
    /// An episode failed (or the user logged out) after this request went out.
    SessionEnded,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn recover(self: &Arc<Self>, request: ApiRequest, sent_with: Option<&AccessToken>) -> Recovery {
        let (reply, rx) = oneshot::channel();
        {
            let mut state = self.lock();
            if !state.in_flight {
                // the session only changes outside an episode through login or logout
                match self.session.get() {
                    Some(current) if Some(&current) != sent_with => {
                        return Recovery::AlreadyRefreshed(request, current);
                    }
                    None if sent_with.is_some() => return Recovery::SessionEnded,
                    _ => {}
                }
            }
            state.waiters.push_back(Waiter { request, reply });
            if std::mem::replace(&mut state.in_flight, true) {
                return Recovery::Queued(rx);
            }
        }

        let episode = EpisodeGuard {
            inner: self.clone(),
            finished: false,
        };
        tokio::spawn(episode.run());
        Recovery::Queued(rx)
    }

    /// Pop the next waiter, ending the episode atomically when none remain.
    fn next_waiter(&self) -> Option<Waiter> {
        let mut state = self.lock();
        let next = state.waiters.pop_front();
        if next.is_none() {
            state.in_flight = false;
        }
        next
    }

    async fn refresh(&self) -> Result<AccessToken, ClientError> {
        let request = ApiRequest::refresh();
        let call = self.transport.send(&request, None);
        let response = tokio::time::timeout(self.refresh_timeout, call)
            .await
            .map_err(|_| ClientError::RefreshTimedOut)??;
        let body: RefreshBody = response.into_result()?;
        Ok(body.token)
    }

    /// Resend once with `token`, bounded by the refresh timeout so one hung
    /// replay cannot hold the queue.
    async fn replay(&self, request: &ApiRequest, token: &AccessToken) -> Result<ApiResponse, ClientError> {
        let call = self.transport.send(request, Some(token));
        let response = tokio::time::timeout(self.refresh_timeout, call)
            .await
            .map_err(|_| ClientError::ReplayTimedOut)??;
        if response.is_unauthorized() {
            return Err(ClientError::Unauthorized(response.message()));
        }
        Ok(response)
    }
}

/// Owns one refresh episode. Dropping it mid-run (panic, runtime shutdown)
/// still releases the queue so later calls can start a fresh episode.
struct EpisodeGuard {
    inner: Arc<Inner>,
    finished: bool,
}

impl EpisodeGuard {
    async fn run(mut self) {
        let inner = self.inner.clone();
        debug!("access token rejected, refreshing");

        match inner.refresh().await {
            Ok(token) => {
                info!("access token refreshed");
                inner.session.set(token.clone()).await;
                while let Some(waiter) = inner.next_waiter() {
                    let outcome = inner.replay(&waiter.request, &token).await;
                    let _ = waiter.reply.send(outcome);
                }
            }
            Err(e) => {
                warn!("token refresh failed, ending session: {}", e);
                let rejected = std::mem::take(&mut inner.lock().waiters);
                for waiter in rejected {
                    let _ = waiter.reply.send(Err(ClientError::SessionExpired));
                }
                inner.session.clear().await;
                inner.redirect.redirect_to_login();
                while let Some(waiter) = inner.next_waiter() {
                    let _ = waiter.reply.send(Err(ClientError::SessionExpired));
                }
            }
        }
        // in_flight was released by next_waiter; a newer episode may own it now
        self.finished = true;
    }
}

impl Drop for EpisodeGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut state = self.inner.lock();
        if state.in_flight {
            state.in_flight = false;
            state.waiters.clear();
        }
    }
}
