use serde::{Deserialize, Serialize};

use super::state::{ActionCard, BattleState, CardId, Faction, GameEvent};

/// 行动卡效果。即时部分在出牌时结算，持续部分在效果账本中生效。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum EffectKind {
    /// 调整某阵营全部在场卡牌的血量；减少时最低为 0。
    HpDelta { faction: Faction, amount: i32 },
    /// 抵挡对方阵营的下一次攻击，并为本方血量最高的卡牌加血。
    Shield {
        protects: Faction,
        #[serde(default)]
        strongest_boost: i32,
    },
    DoubleDamage { faction: Faction },
    /// 按百分比削减该阵营对脑力值的治疗量（向下取整）。
    HealingReduction { faction: Faction, percent: u8 },
    BrainHealthDelta { amount: i32 },
    /// 把该阵营血量最高的卡牌直接送入墓地。
    Removal { faction: Faction },
}

impl EffectKind {
    /// 是否需要留在账本中持续生效。
    pub fn is_persistent(&self) -> bool {
        matches!(
            self,
            EffectKind::Shield { .. }
                | EffectKind::DoubleDamage { .. }
                | EffectKind::HealingReduction { .. }
        )
    }

    pub fn apply(&self, ctx: &EffectContext, state: &mut BattleState) -> EffectResolution {
        let mut events = Vec::new();
        match self {
            EffectKind::HpDelta { faction, amount } => {
                for card in state.cards_of_mut(*faction) {
                    let before = card.hp;
                    card.hp = if *amount >= 0 {
                        card.hp.saturating_add(*amount)
                    } else {
                        card.hp.saturating_add(*amount).max(0)
                    };
                    events.push(GameEvent::CardHpAdjusted {
                        card_id: card.id.clone(),
                        delta: card.hp.saturating_sub(before),
                        hp: card.hp,
                    });
                }
            }
            EffectKind::Shield {
                protects,
                strongest_boost,
            } => {
                if *strongest_boost != 0 {
                    if let Some(card_id) = state.strongest_card_id(*protects) {
                        if let Some(card) = state.find_card_mut(&card_id) {
                            card.hp = card.hp.saturating_add(*strongest_boost);
                            events.push(GameEvent::CardHpAdjusted {
                                card_id,
                                delta: *strongest_boost,
                                hp: card.hp,
                            });
                        }
                    }
                }
            }
            EffectKind::BrainHealthDelta { amount } => {
                events.push(state.adjust_brain_health(*amount));
            }
            EffectKind::Removal { faction } => {
                if let Some(card) = state
                    .strongest_card_id(*faction)
                    .and_then(|card_id| state.take_card(&card_id))
                {
                    events.push(state.bury(card));
                }
            }
            EffectKind::DoubleDamage { .. } | EffectKind::HealingReduction { .. } => {}
        }

        tracing::debug!(
            source = %ctx.source_card_id,
            faction = ?ctx.faction,
            effect = ?self,
            changes = events.len(),
            "applied action effect"
        );
        EffectResolution { events }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectContext {
    pub source_card_id: CardId,
    pub faction: Faction,
}

impl EffectContext {
    pub fn new(source_card_id: impl Into<CardId>, faction: Faction) -> Self {
        Self {
            source_card_id: source_card_id.into(),
            faction,
        }
    }
}

#[derive(Default, Debug, Clone)]
pub struct EffectResolution {
    pub events: Vec<GameEvent>,
}

impl EffectResolution {
    pub fn extend(&mut self, mut other: EffectResolution) {
        self.events.append(&mut other.events);
    }
}

/// 本回合最近一次行动的类型。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Attack,
    Action,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveEffect {
    pub kind: String,
    pub turns_remaining: u8,
    pub source_card_id: CardId,
    pub description: String,
    pub effects: Vec<EffectKind>,
}

impl ActiveEffect {
    /// 只有持续回合数大于 0 的行动卡才会进入账本。
    pub fn from_action_card(card: &ActionCard) -> Option<Self> {
        if card.duration == 0 {
            return None;
        }
        Some(Self {
            kind: card.id.clone(),
            turns_remaining: card.duration,
            source_card_id: card.id.clone(),
            description: card.effect_text.clone(),
            effects: card.effects.clone(),
        })
    }

    pub fn shields(&self, faction: Faction) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, EffectKind::Shield { protects, .. } if *protects == faction))
    }

    pub fn doubles_damage_for(&self, faction: Faction) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, EffectKind::DoubleDamage { faction: f } if *f == faction))
    }

    pub fn healing_reduction_for(&self, faction: Faction) -> Option<u8> {
        self.effects.iter().find_map(|effect| match effect {
            EffectKind::HealingReduction { faction: f, percent } if *f == faction => Some(*percent),
            _ => None,
        })
    }

    fn grants_shield(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, EffectKind::Shield { .. }))
    }

    fn grants_double_damage(&self) -> bool {
        self.effects
            .iter()
            .any(|effect| matches!(effect, EffectKind::DoubleDamage { .. }))
    }
}

/// 效果账本：当前生效的持续效果以及由其推导出的标记。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectLedger {
    #[serde(default)]
    pub effects: Vec<ActiveEffect>,
    #[serde(default)]
    pub shield_active: bool,
    #[serde(default)]
    pub double_damage_active: bool,
    #[serde(default)]
    pub last_action: Option<ActionKind>,
}

impl EffectLedger {
    /// 同类效果只保留一条，新效果替换旧效果。返回被替换的条目。
    pub fn insert(&mut self, effect: ActiveEffect) -> Option<ActiveEffect> {
        let replaced = self
            .effects
            .iter()
            .position(|existing| existing.kind == effect.kind)
            .map(|pos| self.effects.remove(pos));
        self.effects.push(effect);
        self.recompute_flags();
        replaced
    }

    /// 所有效果剩余回合数减一，返回已过期的条目。
    pub fn tick(&mut self) -> Vec<ActiveEffect> {
        let (expired, active): (Vec<ActiveEffect>, Vec<ActiveEffect>) = std::mem::take(&mut self.effects)
            .into_iter()
            .map(|mut effect| {
                effect.turns_remaining = effect.turns_remaining.saturating_sub(1);
                effect
            })
            .partition(|effect| effect.turns_remaining == 0);
        self.effects = active;
        self.recompute_flags();
        expired
    }

    /// 若有护盾保护 `attacker` 的对手，则消耗该护盾条目。
    pub fn consume_shield_against(&mut self, attacker: Faction) -> Option<ActiveEffect> {
        let pos = self
            .effects
            .iter()
            .position(|effect| effect.shields(attacker.opponent()))?;
        let consumed = self.effects.remove(pos);
        self.recompute_flags();
        Some(consumed)
    }

    pub fn damage_multiplier(&self, faction: Faction) -> i32 {
        if self
            .effects
            .iter()
            .any(|effect| effect.doubles_damage_for(faction))
        {
            2
        } else {
            1
        }
    }

    pub fn healing_reduction(&self, faction: Faction) -> Option<u8> {
        self.effects
            .iter()
            .filter_map(|effect| effect.healing_reduction_for(faction))
            .max()
    }

    pub fn find(&self, kind: &str) -> Option<&ActiveEffect> {
        self.effects.iter().find(|effect| effect.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn recompute_flags(&mut self) {
        self.shield_active = self.effects.iter().any(ActiveEffect::grants_shield);
        self.double_damage_active = self.effects.iter().any(ActiveEffect::grants_double_damage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::mode::GameMode;
    use crate::game::state::{Attack, BattleCard};

    fn entry(kind: &str, turns: u8, effects: Vec<EffectKind>) -> ActiveEffect {
        ActiveEffect {
            kind: kind.to_string(),
            turns_remaining: turns,
            source_card_id: kind.to_string(),
            description: format!("{kind} effect"),
            effects,
        }
    }

    fn card(id: &str, faction: Faction, hp: i32) -> BattleCard {
        BattleCard::new(
            id,
            faction,
            id,
            hp,
            Attack::new("One", 10, ""),
            Attack::new("Two", 20, ""),
        )
    }

    fn state() -> BattleState {
        BattleState::new(
            GameMode::TrickyTech,
            &GameMode::TrickyTech.variant(),
            vec![card("dt1", Faction::Attacker, 70), card("dt2", Faction::Attacker, 10)],
            vec![card("hh1", Faction::Defender, 90), card("hh2", Faction::Defender, 85)],
            Vec::new(),
        )
    }

    #[test]
    fn insert_replaces_same_kind() {
        let mut ledger = EffectLedger::default();
        ledger.insert(entry("storm", 2, vec![EffectKind::DoubleDamage { faction: Faction::Attacker }]));
        let replaced = ledger.insert(entry("storm", 2, Vec::new()));

        assert!(replaced.is_some());
        assert_eq!(ledger.len(), 1);
        assert!(
            !ledger.double_damage_active,
            "flag follows the entry that replaced the doubler"
        );
    }

    #[test]
    fn tick_decrements_then_expires() {
        let mut ledger = EffectLedger::default();
        ledger.insert(entry("long", 3, Vec::new()));
        ledger.insert(entry(
            "short",
            1,
            vec![EffectKind::DoubleDamage {
                faction: Faction::Attacker,
            }],
        ));
        assert!(ledger.double_damage_active);

        let expired = ledger.tick();

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].kind, "short");
        assert_eq!(ledger.find("long").map(|e| e.turns_remaining), Some(2));
        assert!(!ledger.double_damage_active);
    }

    #[test]
    fn shield_is_consumed_only_by_the_opposing_faction() {
        let mut ledger = EffectLedger::default();
        ledger.insert(entry(
            "friend-support",
            1,
            vec![EffectKind::Shield {
                protects: Faction::Defender,
                strongest_boost: 30,
            }],
        ));
        assert!(ledger.shield_active);

        assert!(ledger.consume_shield_against(Faction::Defender).is_none());
        assert!(ledger.consume_shield_against(Faction::Attacker).is_some());
        assert!(!ledger.shield_active);
        assert!(ledger.is_empty());
    }

    #[test]
    fn modifiers_are_scoped_to_their_faction() {
        let mut ledger = EffectLedger::default();
        ledger.insert(entry(
            "mixed",
            2,
            vec![
                EffectKind::DoubleDamage {
                    faction: Faction::Attacker,
                },
                EffectKind::HealingReduction {
                    faction: Faction::Defender,
                    percent: 50,
                },
            ],
        ));
        assert_eq!(ledger.damage_multiplier(Faction::Attacker), 2);
        assert_eq!(ledger.damage_multiplier(Faction::Defender), 1);
        assert_eq!(ledger.healing_reduction(Faction::Defender), Some(50));
        assert_eq!(ledger.healing_reduction(Faction::Attacker), None);
    }

    #[test]
    fn hp_delta_floors_reductions_at_zero() {
        let mut state = state();
        let ctx = EffectContext::new("phone-policy", Faction::Defender);

        let resolution = EffectKind::HpDelta {
            faction: Faction::Attacker,
            amount: -20,
        }
        .apply(&ctx, &mut state);

        assert_eq!(resolution.events.len(), 2);
        let hp: Vec<i32> = state.attacker_hand.iter().map(|card| card.hp).collect();
        assert_eq!(hp, vec![50, 0]);
        assert_eq!(state.defender_hand[0].hp, 90, "other faction untouched");
    }

    #[test]
    fn shield_boosts_the_strongest_card() {
        let mut state = state();
        let ctx = EffectContext::new("flow-hobby", Faction::Defender);

        EffectKind::Shield {
            protects: Faction::Defender,
            strongest_boost: 30,
        }
        .apply(&ctx, &mut state);

        assert_eq!(state.defender_hand[0].hp, 120);
        assert_eq!(state.defender_hand[1].hp, 85);
    }

    #[test]
    fn removal_buries_the_strongest_card() {
        let mut state = state();
        let ctx = EffectContext::new("purge", Faction::Defender);

        let resolution = EffectKind::Removal {
            faction: Faction::Attacker,
        }
        .apply(&ctx, &mut state);

        assert_eq!(state.attacker_hand.len(), 1);
        assert_eq!(state.graveyard.len(), 1);
        assert_eq!(state.graveyard[0].id(), "dt1");
        assert!(matches!(
            resolution.events.as_slice(),
            [GameEvent::CardDefeated { .. }]
        ));
    }

    #[test]
    fn brain_health_delta_is_clamped() {
        let mut state = state();
        let ctx = EffectContext::new("boost", Faction::Defender);
        EffectKind::BrainHealthDelta { amount: 150 }.apply(&ctx, &mut state);
        assert_eq!(state.brain_health, 100);
    }

    #[test]
    fn only_modifiers_persist() {
        assert!(EffectKind::DoubleDamage {
            faction: Faction::Attacker
        }
        .is_persistent());
        assert!(!EffectKind::HpDelta {
            faction: Faction::Attacker,
            amount: 5
        }
        .is_persistent());
    }
}
