use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::effects::{EffectKind, EffectLedger};
use super::mode::{GameMode, RuleVariant};

/// 卡牌的稳定标识（例如 `tt1`、`late-night-scroll`）。
pub type CardId = String;

/// 对战双方。进攻方降低脑力值，防守方提升脑力值。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Attacker,
    Defender,
}

impl Faction {
    pub fn opponent(self) -> Self {
        match self {
            Faction::Attacker => Faction::Defender,
            Faction::Defender => Faction::Attacker,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Target {
    BrainHealth,
    Card,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackSlot {
    First,
    Second,
}

impl AttackSlot {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(AttackSlot::First),
            2 => Some(AttackSlot::Second),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            AttackSlot::First => 1,
            AttackSlot::Second => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attack {
    pub name: String,
    pub damage: i32,
    pub description: String,
}

impl Attack {
    pub fn new(name: impl Into<String>, damage: i32, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            damage,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttackUsage {
    pub attack1: u8,
    pub attack2: u8,
}

impl AttackUsage {
    pub fn get(&self, slot: AttackSlot) -> u8 {
        match slot {
            AttackSlot::First => self.attack1,
            AttackSlot::Second => self.attack2,
        }
    }

    pub fn bump(&mut self, slot: AttackSlot) {
        match slot {
            AttackSlot::First => self.attack1 = self.attack1.saturating_add(1),
            AttackSlot::Second => self.attack2 = self.attack2.saturating_add(1),
        }
    }

    pub fn both_reached(&self, cap: u8) -> bool {
        self.attack1 >= cap && self.attack2 >= cap
    }

    pub fn reset(&mut self) {
        *self = AttackUsage::default();
    }
}

/// 针对特定卡牌的额外伤害。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialEffect {
    pub target_card_id: CardId,
    pub amount: i32,
}

/// 参战卡牌。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleCard {
    pub id: CardId,
    pub faction: Faction,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub hp: i32,
    pub attack1: Attack,
    pub attack2: Attack,
    #[serde(default)]
    pub attack_usage: AttackUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_effect: Option<SpecialEffect>,
    /// 已经出过招并被收回手牌，即位于活动区。
    #[serde(default)]
    pub deployed: bool,
}

impl BattleCard {
    pub fn new(
        id: impl Into<CardId>,
        faction: Faction,
        name: impl Into<String>,
        hp: i32,
        attack1: Attack,
        attack2: Attack,
    ) -> Self {
        Self {
            id: id.into(),
            faction,
            name: name.into(),
            description: String::new(),
            hp,
            attack1,
            attack2,
            attack_usage: AttackUsage::default(),
            special_effect: None,
            deployed: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_special_effect(mut self, target_card_id: impl Into<CardId>, amount: i32) -> Self {
        self.special_effect = Some(SpecialEffect {
            target_card_id: target_card_id.into(),
            amount,
        });
        self
    }

    pub fn attack(&self, slot: AttackSlot) -> &Attack {
        match slot {
            AttackSlot::First => &self.attack1,
            AttackSlot::Second => &self.attack2,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.hp <= 0
    }
}

/// 行动卡（法术）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionCard {
    pub id: CardId,
    pub name: String,
    pub effect_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub faction: Faction,
    #[serde(default)]
    pub image: String,
    /// 持续回合数，0 表示只有即时效果。
    #[serde(default)]
    pub duration: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<EffectKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GraveyardEntry {
    Battle { card: BattleCard },
    Action { card: ActionCard },
}

impl GraveyardEntry {
    pub fn id(&self) -> &str {
        match self {
            GraveyardEntry::Battle { card } => &card.id,
            GraveyardEntry::Action { card } => &card.id,
        }
    }
}

/// 进入瞄准模式后等待前端选择的目标请求。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetingRequest {
    pub source_card_id: CardId,
    pub attack_index: u8,
    pub candidates: Vec<CardId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    CardPlayed {
        faction: Faction,
        card_id: CardId,
        attack_index: u8,
        target: Target,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_card_id: Option<CardId>,
        damage: i32,
    },
    AttackBlocked {
        faction: Faction,
        card_id: CardId,
        shield_kind: String,
    },
    AttackUsageRefreshed {
        card_id: CardId,
    },
    BrainHealthChanged {
        delta: i32,
        brain_health: i32,
    },
    CardDamaged {
        card_id: CardId,
        amount: i32,
        hp: i32,
    },
    CardHpAdjusted {
        card_id: CardId,
        delta: i32,
        hp: i32,
    },
    CardDefeated {
        faction: Faction,
        card_id: CardId,
    },
    CardMovedToArena {
        card_id: CardId,
    },
    CardsSwept {
        faction: Faction,
        returned: Vec<CardId>,
        buried: Vec<CardId>,
    },
    ArenaCleared {
        returned: Vec<CardId>,
    },
    ActionCardPlayed {
        faction: Faction,
        card_id: CardId,
    },
    EffectActivated {
        kind: String,
        turns_remaining: u8,
        replaced: bool,
    },
    EffectExpired {
        kind: String,
    },
    TurnPassed {
        from: Faction,
        to: Faction,
    },
    TimerTicked {
        time_remaining: u32,
    },
    TargetingStarted {
        source_card_id: CardId,
        attack_index: u8,
        candidates: Vec<CardId>,
    },
    TargetingCancelled {
        source_card_id: CardId,
    },
    GameReset {
        mode: GameMode,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("card {card_id} exists in more than one zone")]
    DuplicateCardId { card_id: CardId },
    #[error("brain health {value} is out of range")]
    BrainHealthOutOfRange { value: i32 },
    #[error("card {card_id} sits in the opposing hand")]
    CardInWrongHand { card_id: CardId },
    #[error("defeated card {card_id} is still in play")]
    DeadCardInPlay { card_id: CardId },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum VictoryReason {
    BrainHealthLimit,
    TimeExpired,
    DeckExhausted { loser: Faction },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Victory {
    pub winner: Faction,
    pub reason: VictoryReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CardLocation {
    Hand(Faction, usize),
    Arena(usize),
}

fn default_brain_health_limit() -> i32 {
    100
}

/// 对战整体状态。各区域之间的卡牌按值移动，同一张卡只会出现在一个区域。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleState {
    pub mode: GameMode,
    pub brain_health: i32,
    #[serde(default = "default_brain_health_limit")]
    pub brain_health_limit: i32,
    pub current_team: Faction,
    pub time_remaining: u32,
    #[serde(default)]
    pub attacker_hand: Vec<BattleCard>,
    #[serde(default)]
    pub defender_hand: Vec<BattleCard>,
    #[serde(default)]
    pub arena: Vec<BattleCard>,
    #[serde(default)]
    pub graveyard: Vec<GraveyardEntry>,
    #[serde(default)]
    pub action_pool: Vec<ActionCard>,
    pub is_first_turn: bool,
    #[serde(default)]
    pub ledger: EffectLedger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_targeting: Option<TargetingRequest>,
    #[serde(default)]
    pub turn: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_log: Vec<GameEvent>,
}

impl BattleState {
    pub fn new(
        mode: GameMode,
        variant: &RuleVariant,
        attacker_hand: Vec<BattleCard>,
        defender_hand: Vec<BattleCard>,
        action_pool: Vec<ActionCard>,
    ) -> Self {
        Self {
            mode,
            brain_health: 0,
            brain_health_limit: variant.brain_health_limit,
            current_team: Faction::Attacker,
            time_remaining: variant.time_limit_secs,
            attacker_hand,
            defender_hand,
            arena: Vec::new(),
            graveyard: Vec::new(),
            action_pool,
            is_first_turn: true,
            ledger: EffectLedger::default(),
            pending_targeting: None,
            turn: 0,
            event_log: Vec::new(),
        }
    }

    /// 按卡牌目录洗牌发牌，生成一局新的对战。
    pub fn deal<R: Rng + ?Sized>(mode: GameMode, variant: &RuleVariant, rng: &mut R) -> Self {
        let catalog = mode.catalog();
        let mut attackers = catalog.battle_cards_of(Faction::Attacker);
        let mut defenders = catalog.battle_cards_of(Faction::Defender);
        let mut actions = catalog.action_cards.clone();
        attackers.shuffle(rng);
        defenders.shuffle(rng);
        actions.shuffle(rng);
        Self::new(mode, variant, attackers, defenders, actions)
    }

    pub fn record_event(&mut self, event: GameEvent) {
        self.event_log.push(event);
    }

    pub fn hand(&self, faction: Faction) -> &Vec<BattleCard> {
        match faction {
            Faction::Attacker => &self.attacker_hand,
            Faction::Defender => &self.defender_hand,
        }
    }

    pub fn hand_mut(&mut self, faction: Faction) -> &mut Vec<BattleCard> {
        match faction {
            Faction::Attacker => &mut self.attacker_hand,
            Faction::Defender => &mut self.defender_hand,
        }
    }

    /// 尚未出过招的手牌。
    pub fn reserve(&self, faction: Faction) -> impl Iterator<Item = &BattleCard> {
        self.hand(faction).iter().filter(|card| !card.deployed)
    }

    /// 活动区：出过招但仍存活的卡牌。
    pub fn active_area(&self, faction: Faction) -> impl Iterator<Item = &BattleCard> {
        self.hand(faction).iter().filter(|card| card.deployed)
    }

    pub fn arena_of(&self, faction: Faction) -> impl Iterator<Item = &BattleCard> {
        self.arena.iter().filter(move |card| card.faction == faction)
    }

    /// 某阵营仍在场上的全部卡牌（手牌 + 竞技场）。
    pub fn cards_of(&self, faction: Faction) -> impl Iterator<Item = &BattleCard> {
        self.hand(faction).iter().chain(self.arena_of(faction))
    }

    pub fn cards_of_mut(&mut self, faction: Faction) -> impl Iterator<Item = &mut BattleCard> {
        let (hand, arena) = match faction {
            Faction::Attacker => (&mut self.attacker_hand, &mut self.arena),
            Faction::Defender => (&mut self.defender_hand, &mut self.arena),
        };
        hand.iter_mut()
            .chain(arena.iter_mut().filter(move |card| card.faction == faction))
    }

    /// 血量最高的卡牌，同血量时取先出现的一张。
    pub fn strongest_card_id(&self, faction: Faction) -> Option<CardId> {
        let mut strongest: Option<&BattleCard> = None;
        for card in self.cards_of(faction) {
            if strongest.map_or(true, |best| card.hp > best.hp) {
                strongest = Some(card);
            }
        }
        strongest.map(|card| card.id.clone())
    }

    fn locate(&self, card_id: &str) -> Option<CardLocation> {
        if let Some(pos) = self.arena.iter().position(|card| card.id == card_id) {
            return Some(CardLocation::Arena(pos));
        }
        for faction in [Faction::Attacker, Faction::Defender] {
            if let Some(pos) = self.hand(faction).iter().position(|card| card.id == card_id) {
                return Some(CardLocation::Hand(faction, pos));
            }
        }
        None
    }

    pub fn find_card(&self, card_id: &str) -> Option<&BattleCard> {
        match self.locate(card_id)? {
            CardLocation::Arena(pos) => self.arena.get(pos),
            CardLocation::Hand(faction, pos) => self.hand(faction).get(pos),
        }
    }

    pub fn find_card_mut(&mut self, card_id: &str) -> Option<&mut BattleCard> {
        match self.locate(card_id)? {
            CardLocation::Arena(pos) => self.arena.get_mut(pos),
            CardLocation::Hand(faction, pos) => self.hand_mut(faction).get_mut(pos),
        }
    }

    pub fn is_in_arena(&self, card_id: &str) -> bool {
        self.arena.iter().any(|card| card.id == card_id)
    }

    /// 从所在区域取出卡牌。
    pub fn take_card(&mut self, card_id: &str) -> Option<BattleCard> {
        match self.locate(card_id)? {
            CardLocation::Arena(pos) => Some(self.arena.remove(pos)),
            CardLocation::Hand(faction, pos) => Some(self.hand_mut(faction).remove(pos)),
        }
    }

    /// 把手牌中的卡牌放入竞技场；已在竞技场则不动。
    pub fn move_to_arena(&mut self, card_id: &str) -> Option<GameEvent> {
        match self.locate(card_id)? {
            CardLocation::Arena(_) => None,
            CardLocation::Hand(faction, pos) => {
                let card = self.hand_mut(faction).remove(pos);
                self.arena.push(card);
                Some(GameEvent::CardMovedToArena {
                    card_id: card_id.to_string(),
                })
            }
        }
    }

    pub fn bury(&mut self, card: BattleCard) -> GameEvent {
        let event = GameEvent::CardDefeated {
            faction: card.faction,
            card_id: card.id.clone(),
        };
        self.graveyard.push(GraveyardEntry::Battle { card });
        event
    }

    /// 把所有血量归零的卡牌送入墓地。
    pub fn sweep_defeated(&mut self) -> Vec<GameEvent> {
        let defeated: Vec<CardId> = self
            .attacker_hand
            .iter()
            .chain(self.defender_hand.iter())
            .chain(self.arena.iter())
            .filter(|card| card.is_defeated())
            .map(|card| card.id.clone())
            .collect();

        let mut events = Vec::new();
        for card_id in defeated {
            if let Some(card) = self.take_card(&card_id) {
                events.push(self.bury(card));
            }
        }
        events
    }

    /// 收回本方竞技场卡牌：存活的回到活动区，阵亡的进入墓地。
    pub fn sweep_arena(&mut self, faction: Faction) -> Option<GameEvent> {
        let (swept, remaining): (Vec<BattleCard>, Vec<BattleCard>) = std::mem::take(&mut self.arena)
            .into_iter()
            .partition(|card| card.faction == faction);
        self.arena = remaining;
        if swept.is_empty() {
            return None;
        }

        let mut returned = Vec::new();
        let mut buried = Vec::new();
        for mut card in swept {
            if card.is_defeated() {
                buried.push(card.id.clone());
                self.graveyard.push(GraveyardEntry::Battle { card });
            } else {
                card.deployed = true;
                returned.push(card.id.clone());
                self.hand_mut(faction).push(card);
            }
        }
        Some(GameEvent::CardsSwept {
            faction,
            returned,
            buried,
        })
    }

    /// 清空竞技场，卡牌各自回到所属阵营的手牌。
    pub fn clear_arena(&mut self) -> Option<GameEvent> {
        if self.arena.is_empty() {
            return None;
        }
        let mut returned = Vec::with_capacity(self.arena.len());
        for card in std::mem::take(&mut self.arena) {
            returned.push(card.id.clone());
            self.hand_mut(card.faction).push(card);
        }
        Some(GameEvent::ArenaCleared { returned })
    }

    pub fn adjust_brain_health(&mut self, delta: i32) -> GameEvent {
        let limit = self.brain_health_limit;
        self.brain_health = self.brain_health.saturating_add(delta).clamp(-limit, limit);
        GameEvent::BrainHealthChanged {
            delta,
            brain_health: self.brain_health,
        }
    }

    pub fn pass_turn(&mut self) -> GameEvent {
        let from = self.current_team;
        self.current_team = from.opponent();
        GameEvent::TurnPassed {
            from,
            to: self.current_team,
        }
    }

    pub fn battle_card_ids(&self) -> Vec<CardId> {
        let graveyard = self.graveyard.iter().filter_map(|entry| match entry {
            GraveyardEntry::Battle { card } => Some(&card.id),
            GraveyardEntry::Action { .. } => None,
        });
        self.attacker_hand
            .iter()
            .chain(self.defender_hand.iter())
            .chain(self.arena.iter())
            .map(|card| &card.id)
            .chain(graveyard)
            .cloned()
            .collect()
    }

    /// 胜负判定，纯函数，不修改状态。
    pub fn evaluate_victory(&self) -> Option<Victory> {
        let limit = self.brain_health_limit;
        if self.brain_health <= -limit {
            return Some(Victory {
                winner: Faction::Attacker,
                reason: VictoryReason::BrainHealthLimit,
            });
        }
        if self.brain_health >= limit {
            return Some(Victory {
                winner: Faction::Defender,
                reason: VictoryReason::BrainHealthLimit,
            });
        }

        if self.time_remaining == 0 {
            let winner = match self.current_team {
                Faction::Attacker if self.brain_health < 0 => Faction::Attacker,
                Faction::Attacker => Faction::Defender,
                Faction::Defender if self.brain_health > 0 => Faction::Defender,
                Faction::Defender => Faction::Attacker,
            };
            return Some(Victory {
                winner,
                reason: VictoryReason::TimeExpired,
            });
        }

        for loser in [Faction::Attacker, Faction::Defender] {
            if self.cards_of(loser).next().is_none() {
                return Some(Victory {
                    winner: loser.opponent(),
                    reason: VictoryReason::DeckExhausted { loser },
                });
            }
        }

        None
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let limit = self.brain_health_limit;
        if self.brain_health < -limit || self.brain_health > limit {
            return Err(IntegrityError::BrainHealthOutOfRange {
                value: self.brain_health,
            });
        }

        for faction in [Faction::Attacker, Faction::Defender] {
            if let Some(card) = self.hand(faction).iter().find(|card| card.faction != faction) {
                return Err(IntegrityError::CardInWrongHand {
                    card_id: card.id.clone(),
                });
            }
        }

        if let Some(card) = self
            .attacker_hand
            .iter()
            .chain(self.defender_hand.iter())
            .chain(self.arena.iter())
            .find(|card| card.is_defeated())
        {
            return Err(IntegrityError::DeadCardInPlay {
                card_id: card.id.clone(),
            });
        }

        let mut seen = HashSet::new();
        for card_id in self.battle_card_ids() {
            if !seen.insert(card_id.clone()) {
                return Err(IntegrityError::DuplicateCardId { card_id });
            }
        }
        for card in &self.action_pool {
            if !seen.insert(card.id.clone()) {
                return Err(IntegrityError::DuplicateCardId {
                    card_id: card.id.clone(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn card(id: &str, faction: Faction, hp: i32) -> BattleCard {
        BattleCard::new(
            id,
            faction,
            id.to_uppercase(),
            hp,
            Attack::new("Jab", 10, "light"),
            Attack::new("Hook", 20, "heavy"),
        )
    }

    fn state_with(attackers: Vec<BattleCard>, defenders: Vec<BattleCard>) -> BattleState {
        BattleState::new(
            GameMode::Classic,
            &GameMode::Classic.variant(),
            attackers,
            defenders,
            Vec::new(),
        )
    }

    #[test]
    fn deal_splits_catalog_by_faction() {
        let mut rng = SmallRng::seed_from_u64(11);
        let state = BattleState::deal(GameMode::Classic, &GameMode::Classic.variant(), &mut rng);
        assert_eq!(state.attacker_hand.len(), 7);
        assert_eq!(state.defender_hand.len(), 7);
        assert_eq!(state.action_pool.len(), 4);
        assert!(state
            .attacker_hand
            .iter()
            .all(|card| card.faction == Faction::Attacker));
        assert!(state.is_first_turn);
        assert_eq!(state.brain_health, 0);
        assert_eq!(state.time_remaining, 600);
        state.integrity_check().expect("fresh deal should be consistent");
    }

    #[test]
    fn sweep_arena_returns_survivors_and_buries_the_rest() {
        let mut state = state_with(vec![card("a1", Faction::Attacker, 30)], Vec::new());
        let mut dead = card("a2", Faction::Attacker, 30);
        dead.hp = 0;
        state.arena.push(dead);
        state.arena.push(card("d1", Faction::Defender, 40));
        state.move_to_arena("a1").expect("a1 should move");

        let event = state
            .sweep_arena(Faction::Attacker)
            .expect("attacker cards were in the arena");

        assert_eq!(
            event,
            GameEvent::CardsSwept {
                faction: Faction::Attacker,
                returned: vec!["a1".to_string()],
                buried: vec!["a2".to_string()],
            }
        );
        assert_eq!(state.arena.len(), 1, "defender card stays in the arena");
        assert_eq!(state.active_area(Faction::Attacker).count(), 1);
        assert_eq!(state.reserve(Faction::Attacker).count(), 0);
        assert_eq!(state.graveyard.len(), 1);
    }

    #[test]
    fn clear_arena_returns_every_card_without_burying() {
        let mut state = state_with(
            vec![card("a1", Faction::Attacker, 30)],
            vec![card("d1", Faction::Defender, 40)],
        );
        state.move_to_arena("a1");
        state.move_to_arena("d1");

        state.clear_arena().expect("arena was not empty");

        assert!(state.arena.is_empty());
        assert_eq!(state.attacker_hand.len(), 1);
        assert_eq!(state.defender_hand.len(), 1);
        assert!(state.graveyard.is_empty());
        assert!(state.clear_arena().is_none());
    }

    #[test]
    fn strongest_card_prefers_first_on_ties() {
        let state = state_with(
            Vec::new(),
            vec![
                card("d1", Faction::Defender, 80),
                card("d2", Faction::Defender, 95),
                card("d3", Faction::Defender, 95),
            ],
        );
        assert_eq!(state.strongest_card_id(Faction::Defender).as_deref(), Some("d2"));
        assert_eq!(state.strongest_card_id(Faction::Attacker), None);
    }

    #[test]
    fn brain_health_limit_decides_winner() {
        let mut state = state_with(
            vec![card("a1", Faction::Attacker, 30)],
            vec![card("d1", Faction::Defender, 40)],
        );
        assert_eq!(state.evaluate_victory(), None);

        state.adjust_brain_health(-250);
        assert_eq!(state.brain_health, -100);
        assert_eq!(
            state.evaluate_victory(),
            Some(Victory {
                winner: Faction::Attacker,
                reason: VictoryReason::BrainHealthLimit
            })
        );

        state.adjust_brain_health(300);
        assert_eq!(state.brain_health, 100);
        assert_eq!(
            state.evaluate_victory().map(|victory| victory.winner),
            Some(Faction::Defender)
        );
    }

    #[test]
    fn brain_health_saturates_on_extreme_deltas() {
        let mut state = state_with(
            vec![card("a1", Faction::Attacker, 30)],
            vec![card("d1", Faction::Defender, 40)],
        );
        state.brain_health = 1;

        let event = state.adjust_brain_health(i32::MAX);
        assert_eq!(state.brain_health, 100);
        assert_eq!(
            event,
            GameEvent::BrainHealthChanged {
                delta: i32::MAX,
                brain_health: 100
            }
        );

        state.brain_health = -1;
        state.adjust_brain_health(i32::MIN);
        assert_eq!(state.brain_health, -100);
    }

    #[test]
    fn timer_expiry_tie_break_depends_on_current_team() {
        let mut state = state_with(
            vec![card("a1", Faction::Attacker, 30)],
            vec![card("d1", Faction::Defender, 40)],
        );
        state.time_remaining = 0;

        state.current_team = Faction::Attacker;
        state.brain_health = 0;
        assert_eq!(state.evaluate_victory().map(|v| v.winner), Some(Faction::Defender));
        state.brain_health = -1;
        assert_eq!(state.evaluate_victory().map(|v| v.winner), Some(Faction::Attacker));

        state.current_team = Faction::Defender;
        state.brain_health = 0;
        assert_eq!(state.evaluate_victory().map(|v| v.winner), Some(Faction::Attacker));
        state.brain_health = 1;
        assert_eq!(
            state.evaluate_victory(),
            Some(Victory {
                winner: Faction::Defender,
                reason: VictoryReason::TimeExpired
            })
        );
    }

    #[test]
    fn empty_defender_side_hands_win_to_attackers() {
        let mut state = state_with(vec![card("a1", Faction::Attacker, 30)], Vec::new());
        state.move_to_arena("a1");
        assert_eq!(
            state.evaluate_victory(),
            Some(Victory {
                winner: Faction::Attacker,
                reason: VictoryReason::DeckExhausted {
                    loser: Faction::Defender
                }
            })
        );
    }

    #[test]
    fn integrity_check_flags_duplicates_and_misplaced_cards() {
        let mut state = state_with(vec![card("a1", Faction::Attacker, 30)], Vec::new());
        state.arena.push(card("a1", Faction::Attacker, 30));
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::DuplicateCardId {
                card_id: "a1".into()
            })
        );

        let state = state_with(vec![card("d1", Faction::Defender, 30)], Vec::new());
        assert_eq!(
            state.integrity_check(),
            Err(IntegrityError::CardInWrongHand {
                card_id: "d1".into()
            })
        );

        let mut state = state_with(vec![card("a1", Faction::Attacker, 30)], Vec::new());
        state.brain_health = 101;
        assert!(matches!(
            state.integrity_check(),
            Err(IntegrityError::BrainHealthOutOfRange { value: 101 })
        ));
    }

    #[test]
    fn integrity_errors_read_as_sentences() {
        let error = IntegrityError::DuplicateCardId {
            card_id: "a1".into(),
        };
        assert_eq!(error.to_string(), "card a1 exists in more than one zone");
        assert_eq!(
            IntegrityError::BrainHealthOutOfRange { value: -101 }.to_string(),
            "brain health -101 is out of range"
        );
        let source: &dyn std::error::Error = &error;
        assert!(source.source().is_none());
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut rng = SmallRng::seed_from_u64(3);
        let state = BattleState::deal(GameMode::TrickyTech, &GameMode::TrickyTech.variant(), &mut rng);
        let json = serde_json::to_string(&state).expect("state should serialize");
        let back: BattleState = serde_json::from_str(&json).expect("state should deserialize");
        assert_eq!(back, state);
    }
}
