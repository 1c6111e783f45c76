//! Conversion controller state machine.
//!
//! [`Converter`] holds the form inputs and the derived result. It performs no
//! I/O: each input change returns an [`Effect`] telling the driver whether a
//! network request should be scheduled, and completions are fed back through
//! [`Converter::finish`]. Every input change advances a ticket, so a completion
//! carrying an older ticket is ignored.

use super::amount::parse_amount;
use super::currency::{Conversion, ConversionRequest, LatestRates};
use super::error::{ConvertError, ServiceError};
use tracing::debug;

/// Identifies the input state a scheduled request was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Amount(String),
    From(String),
    To(String),
    Swap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The state is final for these inputs; nothing to request.
    Settled,
    /// Wait for the quiescence window, then request this conversion.
    Schedule(Ticket, ConversionRequest),
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverterView {
    pub amount: String,
    pub from: String,
    pub to: String,
    pub result: Option<Conversion>,
    pub error: Option<ConvertError>,
    pub loading: bool,
}

#[derive(Debug)]
pub struct Converter {
    view: ConverterView,
    ticket: Ticket,
}

impl Converter {
    pub fn new(from: &str, to: &str) -> Self {
        Converter {
            view: ConverterView {
                from: from.to_string(),
                to: to.to_string(),
                ..ConverterView::default()
            },
            ticket: Ticket(0),
        }
    }

    pub fn view(&self) -> &ConverterView {
        &self.view
    }

    pub fn apply(&mut self, input: Input) -> Effect {
        match input {
            Input::Amount(text) => self.set_amount(text),
            Input::From(code) => self.set_from(code),
            Input::To(code) => self.set_to(code),
            Input::Swap => self.swap(),
        }
    }

    pub fn set_amount(&mut self, text: impl Into<String>) -> Effect {
        self.view.amount = text.into();
        self.recompute()
    }

    pub fn set_from(&mut self, code: impl Into<String>) -> Effect {
        self.view.from = code.into();
        self.recompute()
    }

    pub fn set_to(&mut self, code: impl Into<String>) -> Effect {
        self.view.to = code.into();
        self.recompute()
    }

    pub fn swap(&mut self) -> Effect {
        std::mem::swap(&mut self.view.from, &mut self.view.to);
        self.recompute()
    }

    fn recompute(&mut self) -> Effect {
        self.ticket = Ticket(self.ticket.0 + 1);
        self.view.result = None;
        self.view.error = None;
        self.view.loading = false;

        let amount = match parse_amount(&self.view.amount) {
            Ok(Some(amount)) => amount,
            Ok(None) => return Effect::Settled,
            Err(e) => {
                self.view.error = Some(e);
                return Effect::Settled;
            }
        };

        if self.view.from.is_empty() || self.view.to.is_empty() {
            self.view.error = Some(ConvertError::MissingSelection);
            return Effect::Settled;
        }

        if self.view.from == self.view.to {
            self.view.result = Some(Conversion {
                amount,
                currency: self.view.to.clone(),
                rate: 1.0,
                date: None,
            });
            return Effect::Settled;
        }

        Effect::Schedule(
            self.ticket,
            ConversionRequest {
                amount,
                from: self.view.from.clone(),
                to: self.view.to.clone(),
            },
        )
    }

    /// Marks the request for `ticket` as issued. Returns false for a stale ticket.
    pub fn begin(&mut self, ticket: Ticket) -> bool {
        if ticket != self.ticket {
            return false;
        }
        self.view.loading = true;
        true
    }

    /// Applies the outcome of the request issued for `ticket`.
    pub fn finish(
        &mut self,
        ticket: Ticket,
        request: &ConversionRequest,
        outcome: Result<LatestRates, ServiceError>,
    ) {
        if ticket != self.ticket {
            debug!(?ticket, current = ?self.ticket, "Ignoring stale conversion result");
            return;
        }

        match outcome {
            Err(e) if e.is_cancelled() => {
                debug!("Conversion cancelled");
            }
            Err(e) => {
                debug!(error = %e, "Conversion request failed");
                self.view.loading = false;
                self.view.error = Some(ConvertError::ConversionRequest);
            }
            Ok(latest) => {
                self.view.loading = false;
                match latest.rates.get(&request.to) {
                    Some(&converted) => {
                        self.view.result = Some(Conversion {
                            amount: converted,
                            currency: request.to.clone(),
                            rate: converted / request.amount,
                            date: latest.date,
                        });
                    }
                    None => {
                        debug!(to = %request.to, "Response did not contain target rate");
                        self.view.error = Some(ConvertError::ConversionRequest);
                    }
                }
            }
        }
    }
}
