//! Turns a text position into navigable call-hierarchy edges.
//!
//! [`DependencyResolver::resolve`] starts resolving the call-hierarchy root in
//! the background and hands back a [`DependencyHandle`]. Each call on the handle
//! waits for that root, bounded by the resolve timeout, and then asks the
//! provider for one direction of edges under its own cancellation scope.

use codecanvas_core::{DependencyDirection, DocumentRef, SymbolDependency, TextPosition};
use codecanvas_events::{Event, EventBus};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub mod convert;
pub mod provider;

pub use convert::DependencyConverter;
pub use provider::{
    CallHierarchyItem, CallHierarchyProvider, IncomingCall, OutgoingCall, StringTextModel,
    SymbolProvider, TextModel, TextModelSource,
};

/// How long a call waits for the root and for the provider's edge list.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Call hierarchy provider failed: {0}")]
    Provider(String),
    #[error("Resolution cancelled")]
    Cancelled,
    #[error("Text model unavailable: {0}")]
    ModelUnavailable(String),
}

type CallFuture<T> = Pin<Box<dyn Future<Output = Result<Vec<T>, ResolveError>> + Send>>;

#[derive(Debug, Clone)]
enum RootState {
    Pending,
    Ready(Option<CallHierarchyItem>),
    Failed(ResolveError),
}

pub struct DependencyResolver {
    provider: Arc<dyn CallHierarchyProvider>,
    timeout: Duration,
    events: Option<EventBus>,
}

impl DependencyResolver {
    pub fn new(provider: Arc<dyn CallHierarchyProvider>) -> Self {
        Self {
            provider,
            timeout: DEFAULT_RESOLVE_TIMEOUT,
            events: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Starts resolving the call-hierarchy root at `position`.
    ///
    /// Must be called from within a Tokio runtime. Root creation runs under a
    /// cancellation token owned by the returned handle and is abandoned when the
    /// handle is dropped.
    pub fn resolve(&self, document: DocumentRef, position: TextPosition) -> DependencyHandle {
        let (tx, rx) = watch::channel(RootState::Pending);
        let root_cancel = CancellationToken::new();

        let provider = Arc::clone(&self.provider);
        let cancel = root_cancel.clone();
        tokio::spawn(async move {
            let state = tokio::select! {
                _ = cancel.cancelled() => RootState::Failed(ResolveError::Cancelled),
                result = provider.create_root(&document, position, cancel.clone()) => match result {
                    Ok(root) => RootState::Ready(root),
                    Err(err) => {
                        tracing::warn!("Call hierarchy root for {} failed: {}", document.uri, err);
                        RootState::Failed(err)
                    }
                },
            };
            let _ = tx.send(state);
        });

        DependencyHandle {
            provider: Arc::clone(&self.provider),
            root: rx,
            root_cancel,
            timeout: self.timeout,
            events: self.events.clone(),
        }
    }
}

/// Lazily resolves edges around one call-hierarchy root.
pub struct DependencyHandle {
    provider: Arc<dyn CallHierarchyProvider>,
    root: watch::Receiver<RootState>,
    root_cancel: CancellationToken,
    timeout: Duration,
    events: Option<EventBus>,
}

impl DependencyHandle {
    /// A fresh cancellation scope for one call. Cancelling it leaves the root
    /// and every other scope alone.
    pub fn new_scope(&self) -> CancellationToken {
        self.root_cancel.child_token()
    }

    /// Waits for the root, giving up with `Ok(None)` after the timeout.
    pub async fn root(&self) -> Result<Option<CallHierarchyItem>, ResolveError> {
        let mut rx = self.root.clone();
        let waited = tokio::time::timeout(self.timeout, async {
            rx.wait_for(|state| !matches!(state, RootState::Pending))
                .await
                .map(|state| state.clone())
        })
        .await;

        match waited {
            Ok(Ok(RootState::Ready(root))) => Ok(root),
            Ok(Ok(RootState::Failed(err))) => Err(err),
            // Sender dropped without a value: the task was torn down.
            Ok(Ok(RootState::Pending)) | Ok(Err(_)) => Ok(None),
            Err(_) => {
                tracing::warn!(
                    "Call hierarchy root not available after {:?}; continuing without it",
                    self.timeout
                );
                Ok(None)
            }
        }
    }

    pub async fn get_incoming_calls(
        &self,
        scope: CancellationToken,
    ) -> Result<Vec<IncomingCall>, ResolveError> {
        let calls = self
            .run_scoped(DependencyDirection::Incoming, scope, |provider, root, cancel| {
                Box::pin(async move { provider.resolve_incoming_calls(&root, cancel).await })
            })
            .await?;
        self.report(DependencyDirection::Incoming, calls.as_ref().map(Vec::len));
        Ok(calls.unwrap_or_default())
    }

    pub async fn get_outgoing_calls(
        &self,
        scope: CancellationToken,
    ) -> Result<Vec<OutgoingCall>, ResolveError> {
        let calls = self
            .run_scoped(DependencyDirection::Outgoing, scope, |provider, root, cancel| {
                Box::pin(async move { provider.resolve_outgoing_calls(&root, cancel).await })
            })
            .await?;
        self.report(DependencyDirection::Outgoing, calls.as_ref().map(Vec::len));
        Ok(calls.unwrap_or_default())
    }

    /// Resolves one direction and converts it into deduplicated dependencies.
    pub async fn dependencies(
        &self,
        direction: DependencyDirection,
        converter: &DependencyConverter,
    ) -> Result<Vec<SymbolDependency>, ResolveError> {
        match direction {
            DependencyDirection::None => Ok(Vec::new()),
            DependencyDirection::Incoming => {
                let calls = self.get_incoming_calls(self.new_scope()).await?;
                Ok(converter.convert_incoming(calls).await)
            }
            DependencyDirection::Outgoing => {
                let calls = self.get_outgoing_calls(self.new_scope()).await?;
                Ok(converter.convert_outgoing(calls).await)
            }
        }
    }

    /// Returns `Ok(None)` when no edge list could be had: no symbol at the
    /// position, or the root or the edge list timed out.
    async fn run_scoped<T, F>(
        &self,
        direction: DependencyDirection,
        scope: CancellationToken,
        call: F,
    ) -> Result<Option<Vec<T>>, ResolveError>
    where
        F: FnOnce(
            Arc<dyn CallHierarchyProvider>,
            CallHierarchyItem,
            CancellationToken,
        ) -> CallFuture<T>,
    {
        let work = async {
            let root = match self.root().await {
                Ok(Some(root)) => root,
                Ok(None) => return Ok(None),
                Err(err) => return Err(err),
            };
            let provider = Arc::clone(&self.provider);
            match tokio::time::timeout(self.timeout, call(provider, root, scope.clone())).await {
                Ok(result) => result.map(Some),
                Err(_) => {
                    tracing::warn!("{:?} calls not available after {:?}", direction, self.timeout);
                    Ok(None)
                }
            }
        };

        tokio::select! {
            _ = scope.cancelled() => Err(ResolveError::Cancelled),
            result = work => result,
        }
    }

    fn report(&self, direction: DependencyDirection, count: Option<usize>) {
        if let Some(count) = count {
            tracing::debug!("Resolved {} {:?} calls", count, direction);
        }
        let Some(events) = &self.events else {
            return;
        };
        events.publish(match count {
            Some(count) => Event::DependenciesResolved { direction, count },
            None => Event::DependenciesUnavailable { direction },
        });
    }
}

impl Drop for DependencyHandle {
    fn drop(&mut self) {
        self.root_cancel.cancel();
    }
}
