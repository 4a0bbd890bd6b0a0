use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    effects::{ActionKind, ActiveEffect, EffectContext, EffectKind, EffectResolution},
    mode::RuleVariant,
    state::{
        AttackSlot, BattleState, CardId, Faction, GameEvent, GraveyardEntry, IntegrityError,
        SpecialEffect, Target, TargetingRequest, Victory,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayCardAction {
    pub source_card_id: CardId,
    pub attack_index: u8,
    pub target: Target,
    #[serde(default)]
    pub target_card_id: Option<CardId>,
}

impl PlayCardAction {
    pub fn at_brain_health(source_card_id: impl Into<CardId>, attack_index: u8) -> Self {
        Self {
            source_card_id: source_card_id.into(),
            attack_index,
            target: Target::BrainHealth,
            target_card_id: None,
        }
    }

    pub fn at_card(
        source_card_id: impl Into<CardId>,
        attack_index: u8,
        target_card_id: impl Into<CardId>,
    ) -> Self {
        Self {
            source_card_id: source_card_id.into(),
            attack_index,
            target: Target::Card,
            target_card_id: Some(target_card_id.into()),
        }
    }
}

/// 指令被拒绝的原因。被拒绝的指令不会修改状态。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("card {card_id} is not playable by the current team")]
    CardNotFound { card_id: CardId },
    #[error("attack index {index} is not 1 or 2")]
    InvalidAttackIndex { index: u8 },
    #[error("attack {attack_index} of {card_id} has reached its usage limit")]
    AttackUsageExhausted { card_id: CardId, attack_index: u8 },
    #[error("an action card was already played this turn")]
    ActionAlreadyTaken,
    #[error("card target requires a target card id")]
    MissingTarget,
    #[error("target card {card_id} is not in play")]
    TargetNotFound { card_id: CardId },
    #[error("cards cannot be targeted on the first turn")]
    FirstTurnTargeting,
    #[error("action card {card_id} is not in the action pool")]
    ActionCardNotFound { card_id: CardId },
    #[error("action card {card_id} belongs to the {faction:?} team")]
    WrongTeam { card_id: CardId, faction: Faction },
    #[error("no targeting request is pending")]
    NoPendingTargeting,
    #[error("{card_id} is not a valid target for the pending attack")]
    InvalidTarget { card_id: CardId },
    #[error("state integrity violated: {error}")]
    IntegrityViolation { error: IntegrityError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResolution {
    pub state: BattleState,
    pub events: Vec<GameEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub victory: Option<Victory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected: Option<RuleError>,
}

impl RuleResolution {
    pub fn new(state: BattleState, events: Vec<GameEvent>) -> Self {
        let victory = state.evaluate_victory();
        Self {
            state,
            events,
            victory,
            rejected: None,
        }
    }

    pub fn rejected(state: BattleState, error: RuleError) -> Self {
        let victory = state.evaluate_victory();
        Self {
            state,
            events: Vec::new(),
            victory,
            rejected: Some(error),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected.is_some()
    }
}

/// 校验通过的出招来源。
struct ResolvedAttack {
    faction: Faction,
    slot: AttackSlot,
    damage: i32,
    special_effect: Option<SpecialEffect>,
}

/// 回合引擎：对 `BattleState` 的唯一修改入口。
///
/// 每条指令先做完整性检查，再校验全部前置条件，最后才修改状态；
/// 因此返回 `Err` 时状态保持原样。
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    variant: RuleVariant,
}

impl RuleEngine {
    pub fn new(variant: RuleVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> &RuleVariant {
        &self.variant
    }

    fn ensure_integrity(state: &BattleState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })
    }

    fn ensure_no_action_taken(state: &BattleState) -> Result<(), RuleError> {
        if state.ledger.last_action == Some(ActionKind::Action) {
            return Err(RuleError::ActionAlreadyTaken);
        }
        Ok(())
    }

    fn resolve_attack(
        &self,
        state: &BattleState,
        source_card_id: &str,
        attack_index: u8,
    ) -> Result<ResolvedAttack, RuleError> {
        let card = state
            .find_card(source_card_id)
            .filter(|card| card.faction == state.current_team)
            .ok_or_else(|| RuleError::CardNotFound {
                card_id: source_card_id.to_string(),
            })?;
        let slot = AttackSlot::from_index(attack_index)
            .ok_or(RuleError::InvalidAttackIndex { index: attack_index })?;

        if let Some(cap) = self.variant.attack_usage_cap {
            if card.attack_usage.get(slot) >= cap {
                return Err(RuleError::AttackUsageExhausted {
                    card_id: card.id.clone(),
                    attack_index,
                });
            }
        }
        Self::ensure_no_action_taken(state)?;

        Ok(ResolvedAttack {
            faction: card.faction,
            slot,
            damage: card.attack(slot).damage,
            special_effect: card.special_effect.clone(),
        })
    }

    fn compute_damage(state: &BattleState, attack: &ResolvedAttack, target_card_id: Option<&str>) -> i32 {
        let mut damage = attack
            .damage
            .saturating_mul(state.ledger.damage_multiplier(attack.faction));
        if target_card_id.is_none() {
            if let Some(percent) = state.ledger.healing_reduction(attack.faction) {
                let kept = i64::from(100 - percent.min(100));
                // 结果的绝对值不会超过原伤害，收窄回 i32 不会截断。
                damage = (i64::from(damage) * kept / 100) as i32;
            }
        }
        if let Some(special) = &attack.special_effect {
            if target_card_id == Some(special.target_card_id.as_str()) {
                damage = damage.saturating_add(special.amount);
            }
        }
        damage
    }

    fn count_usage(&self, state: &mut BattleState, card_id: &str, slot: AttackSlot) -> Option<GameEvent> {
        let card = state.find_card_mut(card_id)?;
        card.attack_usage.bump(slot);
        match self.variant.attack_usage_cap {
            Some(cap) if card.attack_usage.both_reached(cap) => {
                card.attack_usage.reset();
                Some(GameEvent::AttackUsageRefreshed {
                    card_id: card.id.clone(),
                })
            }
            _ => None,
        }
    }

    fn damage_card(state: &mut BattleState, card_id: &str, damage: i32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let defeated = match state.find_card_mut(card_id) {
            Some(card) => {
                let amount = damage.saturating_abs();
                card.hp = card.hp.saturating_sub(amount).max(0);
                events.push(GameEvent::CardDamaged {
                    card_id: card.id.clone(),
                    amount,
                    hp: card.hp,
                });
                card.is_defeated()
            }
            None => false,
        };
        if defeated {
            if let Some(card) = state.take_card(card_id) {
                events.push(state.bury(card));
            }
        }
        events
    }

    fn end_turn(state: &mut BattleState, action: Option<ActionKind>) -> GameEvent {
        state.is_first_turn = false;
        state.ledger.last_action = action;
        state.pending_targeting = None;
        state.turn += 1;
        state.pass_turn()
    }

    fn commit(state: &mut BattleState, events: Vec<GameEvent>) -> Vec<GameEvent> {
        for event in &events {
            state.record_event(event.clone());
        }
        events
    }

    pub fn play_card(
        &self,
        state: &mut BattleState,
        action: PlayCardAction,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        let attack = self.resolve_attack(state, &action.source_card_id, action.attack_index)?;

        let target_card_id = match action.target {
            Target::BrainHealth => None,
            Target::Card => {
                let card_id = action.target_card_id.clone().ok_or(RuleError::MissingTarget)?;
                if state.find_card(&card_id).is_none() {
                    return Err(RuleError::TargetNotFound { card_id });
                }
                if state.is_first_turn {
                    return Err(RuleError::FirstTurnTargeting);
                }
                Some(card_id)
            }
        };

        let mut events = Vec::new();
        if let Some(shield) = state.ledger.consume_shield_against(attack.faction) {
            tracing::debug!(card = %action.source_card_id, shield = %shield.kind, "attack blocked");
            events.push(GameEvent::AttackBlocked {
                faction: attack.faction,
                card_id: action.source_card_id.clone(),
                shield_kind: shield.kind,
            });
        } else {
            let damage = Self::compute_damage(state, &attack, target_card_id.as_deref());
            events.push(GameEvent::CardPlayed {
                faction: attack.faction,
                card_id: action.source_card_id.clone(),
                attack_index: attack.slot.index(),
                target: action.target,
                target_card_id: target_card_id.clone(),
                damage,
            });
            events.extend(self.count_usage(state, &action.source_card_id, attack.slot));

            match &target_card_id {
                None => {
                    let delta = match attack.faction {
                        Faction::Attacker => damage.saturating_neg(),
                        Faction::Defender => damage,
                    };
                    events.push(state.adjust_brain_health(delta));
                    events.extend(state.move_to_arena(&action.source_card_id));
                }
                Some(target) => events.extend(Self::damage_card(state, target, damage)),
            }

            if self.variant.sweep_after_attack {
                events.extend(state.sweep_arena(attack.faction));
            }
        }

        events.push(Self::end_turn(state, Some(ActionKind::Attack)));
        tracing::debug!(
            card = %action.source_card_id,
            attack = action.attack_index,
            brain_health = state.brain_health,
            "card played"
        );
        Ok(Self::commit(state, events))
    }

    pub fn play_action_card(
        &self,
        state: &mut BattleState,
        action_card_id: &str,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        let index = state
            .action_pool
            .iter()
            .position(|card| card.id == action_card_id)
            .ok_or_else(|| RuleError::ActionCardNotFound {
                card_id: action_card_id.to_string(),
            })?;
        let faction = state.action_pool[index].faction;
        if faction != state.current_team {
            return Err(RuleError::WrongTeam {
                card_id: action_card_id.to_string(),
                faction,
            });
        }
        Self::ensure_no_action_taken(state)?;

        let card = state.action_pool.remove(index);
        let mut events = vec![GameEvent::ActionCardPlayed {
            faction,
            card_id: card.id.clone(),
        }];
        events.extend(state.clear_arena());

        let ctx = EffectContext::new(card.id.clone(), faction);
        let mut resolution = EffectResolution::default();
        for effect in &card.effects {
            resolution.extend(effect.apply(&ctx, state));
        }
        events.append(&mut resolution.events);
        events.extend(state.sweep_defeated());

        match ActiveEffect::from_action_card(&card) {
            Some(active) => {
                let kind = active.kind.clone();
                let turns_remaining = active.turns_remaining;
                let replaced = state.ledger.insert(active).is_some();
                tracing::debug!(%kind, turns_remaining, replaced, "effect activated");
                events.push(GameEvent::EffectActivated {
                    kind,
                    turns_remaining,
                    replaced,
                });
            }
            None if card.effects.iter().any(EffectKind::is_persistent) => {
                tracing::warn!(card = %card.id, "persistent effect on a zero-duration card is ignored");
            }
            None => {}
        }

        state.graveyard.push(GraveyardEntry::Action { card });
        events.push(Self::end_turn(state, Some(ActionKind::Action)));
        tracing::debug!(card = %action_card_id, "action card played");
        Ok(Self::commit(state, events))
    }

    /// 回合维护：效果剩余回合数减一并移除到期效果，允许新的一方行动。
    pub fn process_turn_effects(&self, state: &mut BattleState) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        let events: Vec<GameEvent> = state
            .ledger
            .tick()
            .into_iter()
            .map(|effect| {
                tracing::debug!(kind = %effect.kind, "effect expired");
                GameEvent::EffectExpired { kind: effect.kind }
            })
            .collect();
        state.ledger.last_action = None;
        Ok(Self::commit(state, events))
    }

    pub fn force_clear_battle_arena(&self, state: &mut BattleState) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        let events = state.clear_arena().into_iter().collect();
        Ok(Self::commit(state, events))
    }

    /// 选中出招卡牌并进入瞄准模式，候选目标为对方阵营的全部在场卡牌。
    pub fn begin_targeting(
        &self,
        state: &mut BattleState,
        source_card_id: &str,
        attack_index: u8,
    ) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        let attack = self.resolve_attack(state, source_card_id, attack_index)?;
        if state.is_first_turn {
            return Err(RuleError::FirstTurnTargeting);
        }

        let candidates: Vec<CardId> = state
            .cards_of(attack.faction.opponent())
            .map(|card| card.id.clone())
            .collect();
        state.pending_targeting = Some(TargetingRequest {
            source_card_id: source_card_id.to_string(),
            attack_index,
            candidates: candidates.clone(),
        });
        let events = vec![GameEvent::TargetingStarted {
            source_card_id: source_card_id.to_string(),
            attack_index,
            candidates,
        }];
        Ok(Self::commit(state, events))
    }

    pub fn resolve_targeting(
        &self,
        state: &mut BattleState,
        target_card_id: &str,
    ) -> Result<Vec<GameEvent>, RuleError> {
        let request = state
            .pending_targeting
            .clone()
            .ok_or(RuleError::NoPendingTargeting)?;
        if !request.candidates.iter().any(|id| id == target_card_id) {
            return Err(RuleError::InvalidTarget {
                card_id: target_card_id.to_string(),
            });
        }
        self.play_card(
            state,
            PlayCardAction::at_card(request.source_card_id, request.attack_index, target_card_id),
        )
    }

    pub fn cancel_targeting(&self, state: &mut BattleState) -> Result<Vec<GameEvent>, RuleError> {
        let request = state
            .pending_targeting
            .take()
            .ok_or(RuleError::NoPendingTargeting)?;
        let events = vec![GameEvent::TargetingCancelled {
            source_card_id: request.source_card_id,
        }];
        Ok(Self::commit(state, events))
    }

    /// 直接把一张参战卡牌送入墓地，不结束回合。
    pub fn remove_card(&self, state: &mut BattleState, card_id: &str) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        let card = state.take_card(card_id).ok_or_else(|| RuleError::CardNotFound {
            card_id: card_id.to_string(),
        })?;
        if state
            .pending_targeting
            .as_ref()
            .is_some_and(|request| request.source_card_id == card_id)
        {
            state.pending_targeting = None;
        }
        let events = vec![state.bury(card)];
        Ok(Self::commit(state, events))
    }

    /// 放弃本回合：收回本方竞技场卡牌并交给对方行动。
    pub fn switch_teams(&self, state: &mut BattleState) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_integrity(state)?;
        let mut events: Vec<GameEvent> = state.sweep_arena(state.current_team).into_iter().collect();
        state.ledger.last_action = None;
        state.pending_targeting = None;
        state.turn += 1;
        events.push(state.pass_turn());
        Ok(Self::commit(state, events))
    }

    /// 计时器每秒调用一次；只返回事件，不写入事件日志。
    pub fn update_timer(&self, state: &mut BattleState) -> Vec<GameEvent> {
        state.time_remaining = state.time_remaining.saturating_sub(1);
        vec![GameEvent::TimerTicked {
            time_remaining: state.time_remaining,
        }]
    }

    pub fn check_victory(state: &BattleState) -> Option<Victory> {
        state.evaluate_victory()
    }
}
