//! Async driver for the [`Converter`].
//!
//! A single spawned task owns the converter and multiplexes three event
//! sources: input changes, the quiescence deadline, and the one in-flight
//! request. Any input change clears the deadline and cancels the request
//! before the converter sees it, so at most one timer and one request exist.

use super::converter::{Converter, ConverterView, Effect, Input, Ticket};
use super::currency::{ConversionRequest, LatestRates, RateService};
use super::error::ServiceError;
use anyhow::{Result, anyhow};
use futures::FutureExt;
use futures::future::{BoxFuture, OptionFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct Scheduled {
    deadline: Instant,
    ticket: Ticket,
    request: ConversionRequest,
}

struct InFlight {
    ticket: Ticket,
    request: ConversionRequest,
    token: CancellationToken,
    response: BoxFuture<'static, Result<LatestRates, ServiceError>>,
}

impl InFlight {
    fn cancel(self) {
        debug!(ticket = ?self.ticket, "Cancelling in-flight conversion");
        self.token.cancel();
    }
}

pub struct ConverterSession {
    inputs: mpsc::UnboundedSender<Input>,
    view: watch::Receiver<ConverterView>,
    /// Parent of every request token; fired on drop.
    teardown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConverterSession {
    /// Spawns the driver task. Must be called inside a tokio runtime.
    pub fn spawn(service: Arc<dyn RateService>, converter: Converter, debounce: Duration) -> Self {
        let (inputs, input_rx) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(converter.view().clone());
        let teardown = CancellationToken::new();
        let task = tokio::spawn(drive(
            service,
            converter,
            debounce,
            teardown.clone(),
            input_rx,
            view_tx,
        ));
        ConverterSession {
            inputs,
            view,
            teardown,
            task: Some(task),
        }
    }

    pub fn send(&self, input: Input) -> Result<()> {
        self.inputs
            .send(input)
            .map_err(|_| anyhow!("Converter session has stopped"))
    }

    /// Latest published state.
    pub fn view(&self) -> ConverterView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConverterView> {
        self.view.clone()
    }

    /// Stops the driver, cancelling any pending timer or request.
    pub async fn shutdown(mut self) {
        let (closed, _) = mpsc::unbounded_channel();
        self.inputs = closed;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ConverterSession {
    fn drop(&mut self) {
        self.teardown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn drive(
    service: Arc<dyn RateService>,
    mut converter: Converter,
    debounce: Duration,
    teardown: CancellationToken,
    mut inputs: mpsc::UnboundedReceiver<Input>,
    view: watch::Sender<ConverterView>,
) {
    let mut scheduled: Option<Scheduled> = None;
    let mut in_flight: Option<InFlight> = None;

    loop {
        let deadline = scheduled.as_ref().map(|s| s.deadline);

        tokio::select! {
            input = inputs.recv() => {
                let Some(input) = input else { break };
                scheduled = None;
                if let Some(request) = in_flight.take() {
                    request.cancel();
                }
                if let Effect::Schedule(ticket, request) = converter.apply(input) {
                    debug!(?ticket, ?request, "Scheduling conversion");
                    scheduled = Some(Scheduled {
                        deadline: Instant::now() + debounce,
                        ticket,
                        request,
                    });
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(Scheduled { ticket, request, .. }) = scheduled.take() {
                    if converter.begin(ticket) {
                        in_flight = Some(issue(&service, &teardown, ticket, request));
                    }
                }
            }
            outcome = OptionFuture::from(in_flight.as_mut().map(|f| &mut f.response)), if in_flight.is_some() => {
                if let (Some(outcome), Some(finished)) = (outcome, in_flight.take()) {
                    converter.finish(finished.ticket, &finished.request, outcome);
                }
            }
        }

        view.send_replace(converter.view().clone());
    }

    if let Some(request) = in_flight.take() {
        request.cancel();
    }
    debug!("Converter session stopped");
}

fn issue(
    service: &Arc<dyn RateService>,
    teardown: &CancellationToken,
    ticket: Ticket,
    request: ConversionRequest,
) -> InFlight {
    debug!(?ticket, ?request, "Issuing conversion request");
    let token = teardown.child_token();
    let response = {
        let service = Arc::clone(service);
        let request = request.clone();
        let token = token.clone();
        async move { service.convert(&request, &token).await }.boxed()
    };
    InFlight {
        ticket,
        request,
        token,
        response,
    }
}
