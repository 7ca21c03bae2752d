//! Encounter model - the authoritative combat-session snapshot
//!
//! A `Fight` is an ordered sequence of shot slots, each holding the
//! characters currently acting on that shot. Adoption of a new snapshot is
//! always whole-object replacement, never a field-by-field merge.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{ActionId, CampaignId, CharacterId, FightId, SchtickId, WeaponId};

/// A participant actor in a fight
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    /// Wound-induced penalty applied to the character's rolls
    #[serde(default)]
    pub impairments: u32,
    /// Offensive reference entities carried by this character
    #[serde(default)]
    pub weapon_ids: Vec<WeaponId>,
    /// Special-ability reference entities known by this character
    #[serde(default)]
    pub schtick_ids: Vec<SchtickId>,
}

/// One slot in the shot order
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShotSlot {
    /// Shot number; higher shots act first
    pub shot: i32,
    /// Characters currently on this shot
    pub characters: Vec<Character>,
}

/// The authoritative combat-session snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fight {
    pub id: FightId,
    pub campaign_id: CampaignId,
    pub name: String,
    /// Combat sequence number, bumped when the shot counter wraps
    #[serde(default)]
    pub sequence: u32,
    /// Identifier of the tagged mutation that produced this snapshot,
    /// present when the snapshot arrived as a broadcast echo candidate
    #[serde(default)]
    pub action_id: Option<ActionId>,
    /// Shot order, highest shot first
    #[serde(default)]
    pub shot_order: Vec<ShotSlot>,
}

/// Deduplicated reference-entity ids derived from a fight's actor set
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceIds {
    pub weapons: BTreeSet<WeaponId>,
    pub schticks: BTreeSet<SchtickId>,
}

impl ReferenceIds {
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty() && self.schticks.is_empty()
    }
}

impl Fight {
    /// Collect the deduplicated weapon and schtick id sets across every
    /// character in every shot slot.
    pub fn reference_ids(&self) -> ReferenceIds {
        let mut ids = ReferenceIds::default();
        for slot in &self.shot_order {
            for character in &slot.characters {
                ids.weapons.extend(character.weapon_ids.iter().copied());
                ids.schticks.extend(character.schtick_ids.iter().copied());
            }
        }
        ids
    }

    /// The current shot: the highest shot number that still has actors.
    pub fn current_shot(&self) -> Option<i32> {
        self.shot_order
            .iter()
            .filter(|slot| !slot.characters.is_empty())
            .map(|slot| slot.shot)
            .max()
    }

    /// Characters in the order they act: highest shot first, and within a
    /// slot the less impaired character goes first. Ties keep the slot's
    /// own order.
    pub fn acting_order(&self) -> Vec<(i32, &Character)> {
        let mut slots: Vec<&ShotSlot> = self
            .shot_order
            .iter()
            .filter(|slot| !slot.characters.is_empty())
            .collect();
        slots.sort_by(|a, b| b.shot.cmp(&a.shot));

        let mut order = Vec::new();
        for slot in slots {
            let mut actors: Vec<&Character> = slot.characters.iter().collect();
            actors.sort_by_key(|c| c.impairments);
            order.extend(actors.into_iter().map(|c| (slot.shot, c)));
        }
        order
    }

    /// The character up next: first in acting order on the current shot.
    pub fn next_actor(&self) -> Option<&Character> {
        self.acting_order().first().map(|&(_, c)| c)
    }

    /// Iterate all characters across the shot order.
    pub fn characters(&self) -> impl Iterator<Item = &Character> {
        self.shot_order.iter().flat_map(|slot| slot.characters.iter())
    }

    /// Find a character by id anywhere in the shot order.
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters().find(|c| c.id == id)
    }
}

/// Offensive reference entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: WeaponId,
    pub name: String,
    #[serde(default)]
    pub damage: u32,
    #[serde(default)]
    pub concealment: Option<u32>,
    #[serde(default)]
    pub reload_value: Option<u32>,
}

/// Special-ability reference entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schtick {
    pub id: SchtickId,
    pub name: String,
    #[serde(default)]
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn character(id: u64, weapons: &[u64], schticks: &[u64]) -> Character {
        Character {
            id: CharacterId::new(id),
            name: format!("char-{id}"),
            impairments: 0,
            weapon_ids: weapons.iter().map(|w| WeaponId::new(*w)).collect(),
            schtick_ids: schticks.iter().map(|s| SchtickId::new(*s)).collect(),
        }
    }

    fn fight(slots: Vec<ShotSlot>) -> Fight {
        Fight {
            id: FightId::new(1),
            campaign_id: CampaignId::new(1),
            name: "test".into(),
            sequence: 1,
            action_id: None,
            shot_order: slots,
        }
    }

    #[test]
    fn test_reference_ids_deduplicated() {
        let f = fight(vec![
            ShotSlot {
                shot: 12,
                characters: vec![character(1, &[10, 11], &[20])],
            },
            ShotSlot {
                shot: 9,
                characters: vec![character(2, &[11], &[20, 21])],
            },
        ]);

        let ids = f.reference_ids();
        assert_eq!(ids.weapons.len(), 2);
        assert_eq!(ids.schticks.len(), 2);
    }

    #[test]
    fn test_reference_ids_stable_across_recompute() {
        let f = fight(vec![ShotSlot {
            shot: 10,
            characters: vec![character(1, &[5, 6], &[])],
        }]);

        assert_eq!(f.reference_ids(), f.reference_ids());
    }

    #[test]
    fn test_current_shot_skips_empty_slots() {
        let f = fight(vec![
            ShotSlot {
                shot: 15,
                characters: vec![],
            },
            ShotSlot {
                shot: 12,
                characters: vec![character(1, &[], &[])],
            },
            ShotSlot {
                shot: 6,
                characters: vec![character(2, &[], &[])],
            },
        ]);

        assert_eq!(f.current_shot(), Some(12));
    }

    #[test]
    fn test_acting_order_highest_shot_first() {
        let f = fight(vec![
            ShotSlot {
                shot: 6,
                characters: vec![character(3, &[], &[])],
            },
            ShotSlot {
                shot: 15,
                characters: vec![],
            },
            ShotSlot {
                shot: 12,
                characters: vec![character(1, &[], &[])],
            },
        ]);

        let ids: Vec<CharacterId> = f.acting_order().iter().map(|(_, c)| c.id).collect();
        assert_eq!(ids, vec![CharacterId::new(1), CharacterId::new(3)]);
        assert_eq!(f.next_actor().map(|c| c.id), Some(CharacterId::new(1)));
    }

    #[test]
    fn test_acting_order_less_impaired_goes_first() {
        let mut wounded = character(1, &[], &[]);
        wounded.impairments = 2;
        let fresh = character(2, &[], &[]);

        let f = fight(vec![ShotSlot {
            shot: 10,
            characters: vec![wounded, fresh],
        }]);

        let order = f.acting_order();
        assert_eq!(order[0].1.id, CharacterId::new(2));
        assert_eq!(order[1].1.id, CharacterId::new(1));
        assert_eq!(f.next_actor().map(|c| c.id), Some(CharacterId::new(2)));
    }

    #[test]
    fn test_fight_json_roundtrip_with_action_id() {
        let mut f = fight(vec![]);
        f.action_id = Some(ActionId::new(0xABCD));

        let json = serde_json::to_value(&f).unwrap();
        let back: Fight = serde_json::from_value(json).unwrap();
        assert_eq!(back, f);
    }
}
