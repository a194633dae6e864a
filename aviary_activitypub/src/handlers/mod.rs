pub mod accept;
pub mod activity;
mod announce;
mod block;
mod create;
mod delete;
mod flag;
mod follow;
mod like;
mod reject;
mod undo;
mod update;

use aviary_config::{Config, Instance};
use aviary_fetch::{agent::FederationAgent, fetch::ObjectCache};

use super::agent::build_federation_agent;
use super::errors::HandlerError;
use super::queues::DeliveryJobTracker;
use super::side_effects::SideEffect;
use super::state::FederationState;

/// Shared context for activity handlers.
/// Side effects are collected here and dispatched after the
/// pipeline transaction commits.
pub struct HandlerContext<'a> {
    pub config: &'a Config,
    pub state: &'a FederationState,
    instance: Instance,
    effects: Vec<SideEffect>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(config: &'a Config, state: &'a FederationState) -> Self {
        Self {
            config,
            state,
            instance: config.instance(),
            effects: vec![],
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn agent(&self) -> FederationAgent {
        build_federation_agent(&self.instance)
    }

    pub fn object_cache(&self) -> &ObjectCache {
        &self.state.object_cache
    }

    pub fn delivery_tracker(&self) -> &DeliveryJobTracker {
        &self.state.delivery_tracker
    }

    pub fn push_effect(&mut self, effect: SideEffect) {
        self.effects.push(effect);
    }

    pub fn take_effects(&mut self) -> Vec<SideEffect> {
        std::mem::take(&mut self.effects)
    }
}

// Handlers return a short description of the accepted activity,
// or None if it has been ignored
pub type Descriptor = &'static str;
pub type HandlerResult = Result<Option<Descriptor>, HandlerError>;
