//! Reactive binding engine.
//!
//! Each output region is bound to the inputs it reads ([`RULES`]). When an
//! input changes, every dependent rule is re-evaluated on its own tokio task
//! against a snapshot of the inputs taken at dispatch time. A result is
//! committed only if no newer recomputation was issued for the same region in
//! the meantime, so the region always reflects the latest trigger, whatever
//! order the scoring service answers in.

use crate::models::Fetched;
use crate::render::{render, Node, Payload};
use crate::scoring_client::ScoringApi;
use crate::view_model::{Action, Event, Input, Inputs, Region, Snapshot, Ticket, ViewModel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

/// Binds an output region to the inputs that re-evaluate it.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub region: Region,
    pub inputs: &'static [Input],
}

pub const RULES: [Rule; 5] = [
    Rule {
        region: Region::ClientInfo,
        inputs: &[Input::SelectedCustomer],
    },
    Rule {
        region: Region::Prediction,
        inputs: &[Input::SelectedCustomer, Input::Trigger(Action::Predict)],
    },
    Rule {
        region: Region::LocalInterpretation,
        inputs: &[
            Input::SelectedCustomer,
            Input::Trigger(Action::LocalInterpretation),
        ],
    },
    Rule {
        region: Region::GlobalInterpretation,
        inputs: &[Input::Trigger(Action::GlobalInterpretation)],
    },
    Rule {
        region: Region::Drift,
        inputs: &[Input::Trigger(Action::Drift)],
    },
];

/// Regions whose rule depends on `input`, in rule-table order.
pub fn affected_regions(input: Input) -> Vec<Region> {
    RULES
        .iter()
        .filter(|rule| rule.inputs.contains(&input))
        .map(|rule| rule.region)
        .collect()
}

/// Result of evaluating one rule.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Leave the region exactly as it is.
    NoChange,
    /// Clear the region.
    RenderEmpty,
    Render(Payload),
}

/// Evaluates the rule for `region` against `inputs`.
///
/// Guards run before any remote call: an unselected customer or an
/// untriggered action never reaches the scoring service.
pub async fn evaluate(region: Region, inputs: &Inputs, api: &dyn ScoringApi) -> Update {
    let counters = &inputs.counters;

    match region {
        Region::ClientInfo => {
            let Some(id) = &inputs.selected else {
                return Update::RenderEmpty;
            };
            Update::Render(match api.fetch_profile(id).await {
                Fetched::Found(profile) => Payload::Profile {
                    id: id.clone(),
                    profile,
                },
                Fetched::NotFound => Payload::NoRecord { id: id.clone() },
                Fetched::Unavailable => Payload::ServiceUnavailable,
            })
        }
        Region::Prediction => {
            let Some(id) = &inputs.selected else {
                return Update::RenderEmpty;
            };
            if !counters.predict.is_triggered() {
                return Update::RenderEmpty;
            }
            Update::Render(match api.fetch_prediction(id).await {
                Fetched::Found(result) => Payload::Prediction {
                    id: id.clone(),
                    result,
                },
                Fetched::NotFound => Payload::NoRecord { id: id.clone() },
                Fetched::Unavailable => Payload::ServiceUnavailable,
            })
        }
        Region::LocalInterpretation => {
            if !counters.local_interpretation.is_triggered() {
                return Update::NoChange;
            }
            // No URL is ever built for an empty selection.
            match &inputs.selected {
                Some(id) => Update::Render(Payload::Redirect(api.local_interpretation_link(id))),
                None => Update::RenderEmpty,
            }
        }
        Region::GlobalInterpretation => {
            if !counters.global_interpretation.is_triggered() {
                return Update::RenderEmpty;
            }
            Update::Render(match api.fetch_global_interpretation().await {
                Fetched::Found(image) => Payload::GlobalImage(image),
                Fetched::NotFound | Fetched::Unavailable => Payload::GlobalUnavailable,
            })
        }
        Region::Drift => {
            if !counters.drift.is_triggered() {
                return Update::NoChange;
            }
            Update::Render(Payload::DriftLink(api.drift_link()))
        }
    }
}

fn lock(view: &Mutex<ViewModel>) -> MutexGuard<'_, ViewModel> {
    view.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns one dashboard session's view model and drives its rules.
#[derive(Clone)]
pub struct BindingEngine {
    api: Arc<dyn ScoringApi>,
    view: Arc<Mutex<ViewModel>>,
}

impl BindingEngine {
    pub fn new(api: Arc<dyn ScoringApi>) -> Self {
        Self {
            api,
            view: Arc::new(Mutex::new(ViewModel::new())),
        }
    }

    /// Initial evaluation of every rule with default inputs.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        let (inputs, issued) = {
            let mut view = lock(&self.view);
            let issued: Vec<(Region, Ticket)> = Region::ALL
                .iter()
                .map(|&region| (region, view.issue(region)))
                .collect();
            (view.inputs().clone(), issued)
        };
        self.spawn_all(inputs, issued)
    }

    /// Applies `event` and issues a recomputation for every dependent region.
    ///
    /// Returns the handles of the issued recomputations; an event that does
    /// not change any input issues nothing.
    pub fn dispatch(&self, event: &Event) -> Vec<JoinHandle<()>> {
        let (inputs, issued) = {
            let mut view = lock(&self.view);
            let Some(input) = view.apply(event) else {
                tracing::debug!("Event {:?} changed no input", event);
                return Vec::new();
            };
            let issued: Vec<(Region, Ticket)> = affected_regions(input)
                .into_iter()
                .map(|region| (region, view.issue(region)))
                .collect();
            (view.inputs().clone(), issued)
        };
        tracing::debug!(
            "Event {:?} issued recomputation of {:?}",
            event,
            issued.iter().map(|(region, _)| region.dom_id()).collect::<Vec<_>>()
        );
        self.spawn_all(inputs, issued)
    }

    pub fn snapshot(&self) -> Snapshot {
        lock(&self.view).snapshot()
    }

    fn spawn_all(&self, inputs: Inputs, issued: Vec<(Region, Ticket)>) -> Vec<JoinHandle<()>> {
        issued
            .into_iter()
            .map(|(region, ticket)| self.spawn(region, ticket, inputs.clone()))
            .collect()
    }

    fn spawn(&self, region: Region, ticket: Ticket, inputs: Inputs) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let view = Arc::clone(&self.view);

        tokio::spawn(async move {
            let content = match evaluate(region, &inputs, api.as_ref()).await {
                Update::NoChange => return,
                Update::RenderEmpty => Node::Empty,
                Update::Render(payload) => render(&payload),
            };

            let committed = lock(&view).commit(region, ticket, content);
            if committed {
                tracing::debug!("Committed {} ({:?})", region.dom_id(), ticket);
            } else {
                tracing::debug!("Discarded stale result for {} ({:?})", region.dom_id(), ticket);
            }
        })
    }
}

/// Waits for issued recomputations to finish.
pub async fn settle(handles: Vec<JoinHandle<()>>) {
    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!("Recomputation task failed: {}", e);
        }
    }
}
