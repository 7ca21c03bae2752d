//! Encounter controller - tagged actions, echo suppression, adoption
//!
//! The controller holds the local truth for one fight. Locally-issued
//! actions are tagged with a fresh action id held in a single pending slot;
//! the slot is written before the mutating call is issued, so the echo
//! comparison resolves correctly regardless of arrival timing. The slot
//! survives the synchronous response and is cleared when the echo arrives,
//! when a newer action replaces it, on synchronous failure, or on reset.
//!
//! A second action issued before the first echo arrives replaces the slot;
//! the first echo, if delayed past that point, is classified as foreign and
//! applied normally. Accepted race, kept for parity with the single-slot
//! design.

use std::collections::HashMap;

use skirmish_core::{
    ActionId, CharacterId, Fight, Schtick, SchtickId, SkirmishError, SkirmishResult, Weapon,
    WeaponId,
};

use crate::EncounterApi;

/// Controller state, per encounter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ActionInFlight,
}

/// How one inbound fight broadcast was classified
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Adoption {
    /// Foreign snapshot adopted as the new local truth
    Adopted,
    /// Echo of the local pending action, discarded
    EchoSuppressed,
    /// Different fight, or no fight loaded; not applied
    Ignored,
}

/// The combat-session controller
pub struct EncounterController<A> {
    api: A,
    fight: Option<Fight>,
    /// Single-slot pending local action (see module docs)
    pending: Option<ActionId>,
    in_flight: bool,
    weapons: HashMap<WeaponId, Weapon>,
    schticks: HashMap<SchtickId, Schtick>,
}

impl<A: EncounterApi> EncounterController<A> {
    pub fn new(api: A) -> Self {
        EncounterController {
            api,
            fight: None,
            pending: None,
            in_flight: false,
            weapons: HashMap::new(),
            schticks: HashMap::new(),
        }
    }

    pub fn fight(&self) -> Option<&Fight> {
        self.fight.as_ref()
    }

    pub fn pending_action(&self) -> Option<ActionId> {
        self.pending
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight {
            Phase::ActionInFlight
        } else {
            Phase::Idle
        }
    }

    pub fn weapons(&self) -> &HashMap<WeaponId, Weapon> {
        &self.weapons
    }

    pub fn schticks(&self) -> &HashMap<SchtickId, Schtick> {
        &self.schticks
    }

    /// Install the initial snapshot (server-rendered or client-fetched) and
    /// populate reference data from it.
    pub async fn load(&mut self, fight: Fight) -> SkirmishResult<()> {
        self.adopt(fight);
        self.refresh_reference_data().await
    }

    /// Drop everything when the session view unmounts or the fight id
    /// changes: snapshot, pending slot, and derived reference data.
    pub fn reset(&mut self) {
        self.fight = None;
        self.pending = None;
        self.in_flight = false;
        self.weapons.clear();
        self.schticks.clear();
    }

    /// Apply a shot-cost action for one character.
    ///
    /// Without a current snapshot this is a logged no-op. On synchronous
    /// success the returned snapshot replaces the local one whole; on
    /// failure the error is returned as a recoverable state and the pending
    /// slot is cleared.
    pub async fn spend_shots(&mut self, actor: CharacterId, shot_cost: u32) -> SkirmishResult<()> {
        let Some(fight_id) = self.fight.as_ref().map(|f| f.id) else {
            tracing::error!(?actor, shot_cost, "shot-cost action with no active fight");
            return Ok(());
        };

        let action = ActionId::generate();
        // Written before the call is issued so even an early echo resolves.
        self.pending = Some(action);
        self.in_flight = true;

        let result = self.api.act(fight_id, actor, shot_cost, action).await;
        self.in_flight = false;

        match result {
            Ok(snapshot) => {
                self.adopt(snapshot);
                self.refresh_reference_data().await
            }
            Err(e) => {
                self.pending = None;
                tracing::warn!(fight = %fight_id, error = %e, "shot-cost action failed");
                Err(e)
            }
        }
    }

    /// Classify one broadcast fight snapshot. An echo of the pending local
    /// action is discarded (the synchronous response already applied it);
    /// anything else for the current fight is adopted unconditionally.
    ///
    /// Adoption here does not refresh reference data; use `apply_update`
    /// for the full path.
    pub fn handle_update(&mut self, incoming: Fight) -> Adoption {
        let Some(current) = &self.fight else {
            tracing::debug!(fight = %incoming.id, "broadcast for unloaded fight ignored");
            return Adoption::Ignored;
        };
        if current.id != incoming.id {
            tracing::debug!(
                current = %current.id,
                incoming = %incoming.id,
                "broadcast for another fight ignored"
            );
            return Adoption::Ignored;
        }

        if self.pending.is_some() && incoming.action_id == self.pending {
            tracing::debug!(fight = %incoming.id, "suppressed echo of local action");
            self.pending = None;
            return Adoption::EchoSuppressed;
        }

        self.adopt(incoming);
        Adoption::Adopted
    }

    /// `handle_update` plus the reference-data refresh the adoption path
    /// requires.
    pub async fn apply_update(&mut self, incoming: Fight) -> SkirmishResult<Adoption> {
        let adoption = self.handle_update(incoming);
        if adoption == Adoption::Adopted {
            self.refresh_reference_data().await?;
        }
        Ok(adoption)
    }

    /// Recompute the weapon and schtick id sets from the current snapshot
    /// and replace the reference maps. An empty set clears its map without
    /// a fetch. A fetch failure is logged and surfaced as a recoverable
    /// error; the already-adopted snapshot is never rolled back.
    pub async fn refresh_reference_data(&mut self) -> SkirmishResult<()> {
        let ids = match &self.fight {
            Some(fight) => fight.reference_ids(),
            None => {
                self.weapons.clear();
                self.schticks.clear();
                return Ok(());
            }
        };

        let mut first_err: Option<SkirmishError> = None;

        if ids.weapons.is_empty() {
            self.weapons.clear();
        } else {
            let wanted: Vec<WeaponId> = ids.weapons.iter().copied().collect();
            match self.api.weapons(&wanted).await {
                Ok(list) => {
                    self.weapons = list.into_iter().map(|w| (w.id, w)).collect();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "weapon batch fetch failed");
                    first_err = Some(SkirmishError::ReferenceFetch(e.to_string()));
                }
            }
        }

        if ids.schticks.is_empty() {
            self.schticks.clear();
        } else {
            let wanted: Vec<SchtickId> = ids.schticks.iter().copied().collect();
            match self.api.schticks(&wanted).await {
                Ok(list) => {
                    self.schticks = list.into_iter().map(|s| (s.id, s)).collect();
                }
                Err(e) => {
                    tracing::warn!(error = %e, "schtick batch fetch failed");
                    if first_err.is_none() {
                        first_err = Some(SkirmishError::ReferenceFetch(e.to_string()));
                    }
                }
            }
        }

        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    /// Whole-object replacement; never a field-by-field merge.
    fn adopt(&mut self, fight: Fight) {
        self.fight = Some(fight);
    }
}
