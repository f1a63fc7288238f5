use std::future::Future;
use std::pin::Pin;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use layers::MapLayer;
use layers::charts::ChartPanel;
use streaming::{DataSource, LoadRequest, RequestId, SourceError};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::binder::{RenderBinder, RenderFrame};
use crate::controls::ControlEvent;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type Completion = (RequestId, Result<String, SourceError>);

/// Async event loop around a [`RenderBinder`].
///
/// Loads run concurrently; their results and control events are handled one
/// at a time on the task that owns the viewer, so selection state is never
/// shared.
pub struct Viewer<S, L, P> {
    source: S,
    binder: RenderBinder<L, P>,
    loads: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl<S: DataSource, L: MapLayer, P: ChartPanel> Viewer<S, L, P> {
    pub fn new(source: S, binder: RenderBinder<L, P>) -> Self {
        Self {
            source,
            binder,
            loads: FuturesUnordered::new(),
        }
    }

    pub fn binder(&self) -> &RenderBinder<L, P> {
        &self.binder
    }

    pub fn into_binder(self) -> RenderBinder<L, P> {
        self.binder
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.binder.last_frame()
    }

    pub fn pending(&self) -> usize {
        self.loads.len()
    }

    /// Issues the loads for the initial selection.
    pub fn start(&mut self) {
        let loads = self.binder.start();
        self.spawn(loads);
    }

    /// Applies one control event. Loads it triggers start in the background.
    pub fn dispatch(&mut self, event: &ControlEvent) {
        let loads = self.binder.handle(event);
        self.spawn(loads);
    }

    /// Waits until every load issued so far has completed.
    pub async fn settle(&mut self) {
        while let Some((id, result)) = self.loads.next().await {
            self.binder.complete(id, result);
        }
    }

    /// Runs until the control channel closes, then drains outstanding loads.
    ///
    /// Binder events are forwarded to the log as they happen, so the returned
    /// binder's event log is empty.
    pub async fn run(mut self, mut controls: mpsc::Receiver<ControlEvent>) -> RenderBinder<L, P> {
        self.start();
        self.forward_events();
        loop {
            tokio::select! {
                event = controls.recv() => match event {
                    Some(event) => self.dispatch(&event),
                    None => break,
                },
                Some((id, result)) = self.loads.next(), if !self.loads.is_empty() => {
                    self.binder.complete(id, result);
                }
            }
            self.forward_events();
        }
        debug!("control channel closed, {} load(s) outstanding", self.loads.len());
        self.settle().await;
        self.forward_events();
        info!("viewer stopped");
        self.binder
    }

    fn forward_events(&mut self) {
        for event in self.binder.drain_events() {
            debug!("pass {}: {:?} {}", event.pass, event.kind, event.message);
        }
    }

    fn spawn(&mut self, loads: Vec<LoadRequest>) {
        for req in loads {
            let source = self.source.clone();
            self.loads.push(Box::pin(async move {
                let result = source.fetch(&req.path).await;
                (req.id, result)
            }));
        }
    }
}
