//! Keyed dispatch with one-shot and time-bounded registrations.
//!
//! A [`Router`] maps keys to handlers. Routes can fire once, expire after a
//! deadline (running an expiry hook), or stay until unregistered:
//!
//! ```rust,ignore
//! let router: Router<Context, i64, Message> = Router::new();
//!
//! // wait for the next message in a chat, for up to a minute
//! router.insert(
//!     chat_id,
//!     Route::new(|ctx, msg: Message| async move { /* ... */ })
//!         .once()
//!         .timeout(Duration::from_secs(60))
//!         .on_expire(|ctx, chat_id| async move { Ok(()) }),
//! );
//!
//! router.route(&ctx, &chat_id, message).await;
//! ```
//!
//! The table sits behind one mutex; handlers and hooks always run outside it.

use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use tgbot_core::BoxError;

use crate::context::RouteContext;

/// A route handler.
pub type RouteFn<C, P, R> = Arc<dyn Fn(C, P) -> BoxFuture<'static, R> + Send + Sync>;

/// Runs with the route's key when a route expires unused.
pub type ExpireFn<C, K> =
    Arc<dyn Fn(C, K) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;

// ============================================================================
// Route
// ============================================================================

/// One registration.
pub struct Route<C, K, P, R = ()> {
    handler: RouteFn<C, P, R>,
    name: String,
    once: bool,
    deadline: Option<Instant>,
    on_expire: Option<ExpireFn<C, K>>,
}

impl<C, K, P, R> Route<C, K, P, R>
where
    C: 'static,
    K: 'static,
    P: 'static,
    R: 'static,
{
    /// A persistent route named after the handler's type.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(C, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |ctx, payload| -> BoxFuture<'static, R> {
                Box::pin(handler(ctx, payload))
            }),
            name: short_type_name::<F>(),
            once: false,
            deadline: None,
            on_expire: None,
        }
    }

    /// Name appended to the context path when the route runs.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Removes the route the first time it matches.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Expires the route `timeout` from now.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline(Instant::now() + timeout)
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Runs `hook` when the route expires without matching.
    ///
    /// Hooks run on their own task; an error is logged and dropped.
    pub fn on_expire<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(C, K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.on_expire = Some(Arc::new(
            move |ctx, key| -> BoxFuture<'static, Result<(), BoxError>> { Box::pin(hook(ctx, key)) },
        ));
        self
    }

    pub fn is_once(&self) -> bool {
        self.once
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }
}

impl<C, K, P, R> Clone for Route<C, K, P, R> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            name: self.name.clone(),
            once: self.once,
            deadline: self.deadline,
            on_expire: self.on_expire.clone(),
        }
    }
}

impl<C, K, P, R> fmt::Debug for Route<C, K, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("once", &self.once)
            .field("deadline", &self.deadline)
            .field("on_expire", &self.on_expire.is_some())
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Keyed handler table, generic over context `C`, key `K`, payload `P` and
/// handler output `R`.
pub struct Router<C, K, P, R = ()> {
    table: Mutex<HashMap<K, Route<C, K, P, R>>>,
}

impl<C, K, P, R> Default for Router<C, K, P, R> {
    fn default() -> Self {
        Self {
            table: Mutex::new(HashMap::new()),
        }
    }
}

impl<C, K, P, R> Router<C, K, P, R>
where
    C: RouteContext,
    K: Eq + Hash + Clone + fmt::Debug + Send + 'static,
    P: Send + 'static,
    R: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent handler for `key`, replacing any existing one.
    pub fn register<F, Fut>(&self, key: K, handler: F) -> bool
    where
        F: Fn(C, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.insert(key, Route::new(handler))
    }

    /// Registers a handler that is removed the first time it matches.
    pub fn register_once<F, Fut>(&self, key: K, handler: F) -> bool
    where
        F: Fn(C, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        self.insert(key, Route::new(handler).once())
    }

    /// Inserts `route` for `key`.
    ///
    /// A route whose deadline has already passed is rejected and `false`
    /// returned.
    pub fn insert(&self, key: K, route: Route<C, K, P, R>) -> bool {
        if route.deadline.is_some_and(|deadline| deadline < Instant::now()) {
            debug!(?key, route = %route.name, "rejected route with a past deadline");
            return false;
        }
        self.table.lock().insert(key, route);
        true
    }

    /// Removes the route for `key`, returning `true` if there was one.
    pub fn unregister(&self, key: &K) -> bool {
        self.table.lock().remove(key).is_some()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.table.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Routes `payload` to the handler registered for `key`.
    ///
    /// Expired routes are swept first. Returns `None` if no live route
    /// matched; otherwise the handler's output.
    pub async fn route(&self, ctx: &C, key: &K, payload: P) -> Option<R> {
        let (route, expired) = {
            let mut table = self.table.lock();
            let expired = Self::take_expired(&mut table, Instant::now());
            let route = match table.get(key).map(|route| route.once) {
                Some(true) => table.remove(key),
                Some(false) => table.get(key).cloned(),
                None => None,
            };
            (route, expired)
        };

        Self::run_expiry_hooks(ctx, expired);

        let Some(route) = route else {
            trace!(?key, "no route");
            return None;
        };
        debug!(?key, route = %route.name, once = route.once, "routing");
        Some((route.handler)(ctx.named(&route.name), payload).await)
    }

    /// Removes expired routes and runs their hooks without routing anything.
    pub fn sweep(&self, ctx: &C) -> usize {
        let expired = Self::take_expired(&mut self.table.lock(), Instant::now());
        let count = expired.len();
        Self::run_expiry_hooks(ctx, expired);
        count
    }

    fn take_expired(
        table: &mut HashMap<K, Route<C, K, P, R>>,
        now: Instant,
    ) -> Vec<(K, Route<C, K, P, R>)> {
        let keys: Vec<K> = table
            .iter()
            .filter(|(_, route)| route.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        keys.into_iter()
            .filter_map(|key| table.remove_entry(&key))
            .collect()
    }

    fn run_expiry_hooks(ctx: &C, expired: Vec<(K, Route<C, K, P, R>)>) {
        for (key, route) in expired {
            debug!(?key, route = %route.name, "route expired");
            let Some(hook) = route.on_expire else {
                continue;
            };
            let ctx = ctx.named(&route.name);
            tokio::spawn(async move {
                let label = format!("{key:?}");
                if let Err(err) = hook(ctx, key).await {
                    warn!(key = %label, error = %err, "expiry hook failed");
                }
            });
        }
    }
}

impl<C, K: fmt::Debug, P, R> fmt::Debug for Router<C, K, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.lock();
        f.debug_struct("Router")
            .field("keys", &table.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// `my_crate::handlers::on_start` → `on_start`; closures keep their parent.
pub(crate) fn short_type_name<T>() -> String {
    let full = type_name::<T>();
    let trimmed = full.strip_suffix("::{{closure}}").unwrap_or(full);
    trimmed.rsplit("::").next().unwrap_or(trimmed).to_string()
}
