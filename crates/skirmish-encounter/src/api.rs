//! Encounter API seam - the remote surface the reconciler mutates through

use skirmish_core::{
    ActionId, CharacterId, Fight, FightId, Schtick, SchtickId, SkirmishResult, Weapon, WeaponId,
};

/// Remote operations the encounter controller needs. The `act` call is the
/// tagged mutation; its synchronous result is the authoritative snapshot.
#[allow(async_fn_in_trait)]
pub trait EncounterApi {
    /// Apply a shot-cost action for one character and return the new
    /// authoritative fight snapshot. The action id tags the mutation so its
    /// broadcast echo can be recognized.
    async fn act(
        &self,
        fight: FightId,
        actor: CharacterId,
        shot_cost: u32,
        action: ActionId,
    ) -> SkirmishResult<Fight>;

    /// Batch-fetch weapons by id.
    async fn weapons(&self, ids: &[WeaponId]) -> SkirmishResult<Vec<Weapon>>;

    /// Batch-fetch schticks by id.
    async fn schticks(&self, ids: &[SchtickId]) -> SkirmishResult<Vec<Schtick>>;
}
