//! UI-observable dashboard state: inputs, trigger counters, and the last
//! committed content of every output region.

use crate::models::CustomerId;
use crate::render::Node;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An actionable control on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Predict,
    LocalInterpretation,
    GlobalInterpretation,
    Drift,
}

/// An input signal rules can depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    SelectedCustomer,
    Trigger(Action),
}

/// An output region of the page. Serialized as its DOM id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Region {
    #[serde(rename = "client-info")]
    ClientInfo,
    #[serde(rename = "client-prediction")]
    Prediction,
    #[serde(rename = "local-graph")]
    LocalInterpretation,
    #[serde(rename = "global-graph")]
    GlobalInterpretation,
    #[serde(rename = "drift-analysis")]
    Drift,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::ClientInfo,
        Region::Prediction,
        Region::LocalInterpretation,
        Region::GlobalInterpretation,
        Region::Drift,
    ];

    pub fn dom_id(self) -> &'static str {
        match self {
            Region::ClientInfo => "client-info",
            Region::Prediction => "client-prediction",
            Region::LocalInterpretation => "local-graph",
            Region::GlobalInterpretation => "global-graph",
            Region::Drift => "drift-analysis",
        }
    }

    fn index(self) -> usize {
        match self {
            Region::ClientInfo => 0,
            Region::Prediction => 1,
            Region::LocalInterpretation => 2,
            Region::GlobalInterpretation => 3,
            Region::Drift => 4,
        }
    }
}

/// Number of times an action control was activated.
///
/// `0` is the untriggered sentinel: the action has never been requested in
/// this session and its region stays blank. Every press moves the counter
/// forward by one, so each press is observed as an input change even when
/// nothing else moved. Counters only go back to zero with a new session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TriggerCounter(u64);

impl TriggerCounter {
    pub fn count(self) -> u64 {
        self.0
    }

    pub fn is_triggered(self) -> bool {
        self.0 >= 1
    }

    fn press(&mut self) {
        self.0 = self.0.saturating_add(1);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub predict: TriggerCounter,
    pub local_interpretation: TriggerCounter,
    pub global_interpretation: TriggerCounter,
    pub drift: TriggerCounter,
}

impl Counters {
    pub fn get(&self, action: Action) -> TriggerCounter {
        match action {
            Action::Predict => self.predict,
            Action::LocalInterpretation => self.local_interpretation,
            Action::GlobalInterpretation => self.global_interpretation,
            Action::Drift => self.drift,
        }
    }

    fn get_mut(&mut self, action: Action) -> &mut TriggerCounter {
        match action {
            Action::Predict => &mut self.predict,
            Action::LocalInterpretation => &mut self.local_interpretation,
            Action::GlobalInterpretation => &mut self.global_interpretation,
            Action::Drift => &mut self.drift,
        }
    }
}

/// Current input values, cloned into every issued recomputation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inputs {
    pub selected: Option<CustomerId>,
    pub counters: Counters,
}

/// A user interaction posted by the page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Select {
        #[serde(default)]
        customer_id: Option<CustomerId>,
    },
    Press {
        action: Action,
    },
}

/// Sequence number taken when a recomputation for a region is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
struct RegionSlot {
    content: Node,
    revision: u64,
    issued: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl Default for RegionSlot {
    fn default() -> Self {
        Self {
            content: Node::Empty,
            revision: 0,
            issued: 0,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionView {
    pub region: Region,
    pub revision: u64,
    pub html: String,
    pub redirect: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub selected: Option<CustomerId>,
    pub counters: Counters,
    pub regions: Vec<RegionView>,
}

impl Snapshot {
    pub fn region(&self, region: Region) -> Option<&RegionView> {
        self.regions.iter().find(|view| view.region == region)
    }
}

#[derive(Debug, Default)]
pub struct ViewModel {
    inputs: Inputs,
    slots: [RegionSlot; 5],
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// Applies an interaction and reports which input changed, if any.
    /// Re-selecting the current customer is not a change.
    pub fn apply(&mut self, event: &Event) -> Option<Input> {
        match event {
            Event::Select { customer_id } => {
                if self.inputs.selected == *customer_id {
                    return None;
                }
                self.inputs.selected = customer_id.clone();
                Some(Input::SelectedCustomer)
            }
            Event::Press { action } => {
                self.inputs.counters.get_mut(*action).press();
                Some(Input::Trigger(*action))
            }
        }
    }

    /// Issues a new ticket for `region`, superseding every earlier one.
    pub fn issue(&mut self, region: Region) -> Ticket {
        let slot = &mut self.slots[region.index()];
        slot.issued += 1;
        Ticket(slot.issued)
    }

    pub fn is_current(&self, region: Region, ticket: Ticket) -> bool {
        self.slots[region.index()].issued == ticket.0
    }

    /// Stores `content` if `ticket` is still the latest issued for the region.
    /// Returns whether the region was written.
    pub fn commit(&mut self, region: Region, ticket: Ticket, content: Node) -> bool {
        if !self.is_current(region, ticket) {
            return false;
        }
        let slot = &mut self.slots[region.index()];
        slot.content = content;
        slot.revision += 1;
        slot.updated_at = Some(Utc::now());
        true
    }

    #[cfg(test)]
    fn content(&self, region: Region) -> &Node {
        &self.slots[region.index()].content
    }

    #[cfg(test)]
    fn revision(&self, region: Region) -> u64 {
        self.slots[region.index()].revision
    }

    pub fn snapshot(&self) -> Snapshot {
        let regions = Region::ALL
            .iter()
            .map(|&region| {
                let slot = &self.slots[region.index()];
                RegionView {
                    region,
                    revision: slot.revision,
                    html: slot.content.to_html(),
                    redirect: slot.content.redirect_target().map(str::to_string),
                    updated_at: slot.updated_at,
                }
            })
            .collect();

        Snapshot {
            selected: self.inputs.selected.clone(),
            counters: self.inputs.counters,
            regions,
        }
    }
}
