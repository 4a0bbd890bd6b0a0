use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::{
    mode::{GameMode, RuleOverrides, RuleVariant},
    rules::{PlayCardAction, RuleEngine, RuleError, RuleResolution},
    state::{BattleState, GameEvent, Victory},
};

/// 单个模式的一局对战：持有状态、规则引擎与洗牌用的随机数发生器。
pub struct BattleSession {
    mode: GameMode,
    engine: RuleEngine,
    state: BattleState,
    rng: SmallRng,
}

impl BattleSession {
    pub fn new(mode: GameMode) -> Self {
        Self::build(mode, mode.variant(), SmallRng::from_entropy())
    }

    pub fn with_seed(mode: GameMode, seed: u64) -> Self {
        Self::build(mode, mode.variant(), SmallRng::seed_from_u64(seed))
    }

    pub fn with_overrides(mode: GameMode, overrides: &RuleOverrides) -> Self {
        let variant = overrides.apply(mode.variant());
        let rng = match overrides.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self::build(mode, variant, rng)
    }

    fn build(mode: GameMode, variant: RuleVariant, mut rng: SmallRng) -> Self {
        let state = BattleState::deal(mode, &variant, &mut rng);
        tracing::debug!(%mode, ?variant, "battle session created");
        Self {
            mode,
            engine: RuleEngine::new(variant),
            state,
            rng,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn variant(&self) -> &RuleVariant {
        self.engine.variant()
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// 用外部快照替换当前状态，快照需通过完整性检查且属于同一模式。
    pub fn replace_state(&mut self, state: BattleState) -> Result<(), RuleError> {
        state
            .integrity_check()
            .map_err(|error| RuleError::IntegrityViolation { error })?;
        if state.mode != self.mode {
            tracing::warn!(expected = %self.mode, actual = %state.mode, "snapshot from another mode");
        }
        self.state = state;
        Ok(())
    }

    pub fn play_card(&mut self, action: PlayCardAction) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.play_card(&mut self.state, action)
    }

    pub fn play_action_card(&mut self, action_card_id: &str) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.play_action_card(&mut self.state, action_card_id)
    }

    pub fn process_turn_effects(&mut self) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.process_turn_effects(&mut self.state)
    }

    pub fn force_clear_battle_arena(&mut self) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.force_clear_battle_arena(&mut self.state)
    }

    pub fn begin_targeting(
        &mut self,
        source_card_id: &str,
        attack_index: u8,
    ) -> Result<Vec<GameEvent>, RuleError> {
        self.engine
            .begin_targeting(&mut self.state, source_card_id, attack_index)
    }

    pub fn resolve_targeting(&mut self, target_card_id: &str) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.resolve_targeting(&mut self.state, target_card_id)
    }

    pub fn cancel_targeting(&mut self) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.cancel_targeting(&mut self.state)
    }

    pub fn remove_card(&mut self, card_id: &str) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.remove_card(&mut self.state, card_id)
    }

    pub fn switch_teams(&mut self) -> Result<Vec<GameEvent>, RuleError> {
        self.engine.switch_teams(&mut self.state)
    }

    pub fn update_timer(&mut self) -> Vec<GameEvent> {
        self.engine.update_timer(&mut self.state)
    }

    /// 重新洗牌发牌，回到开局状态。
    pub fn reset_game(&mut self) -> Vec<GameEvent> {
        self.state = BattleState::deal(self.mode, self.engine.variant(), &mut self.rng);
        let event = GameEvent::GameReset { mode: self.mode };
        self.state.record_event(event.clone());
        tracing::debug!(mode = %self.mode, "game reset");
        vec![event]
    }

    pub fn victory(&self) -> Option<Victory> {
        RuleEngine::check_victory(&self.state)
    }

    pub fn resolve(&self, result: Result<Vec<GameEvent>, RuleError>) -> RuleResolution {
        match result {
            Ok(events) => RuleResolution::new(self.state.clone(), events),
            Err(error) => {
                tracing::debug!(%error, "command rejected");
                RuleResolution::rejected(self.state.clone(), error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::effects::ActionKind;
    use crate::game::state::{Faction, VictoryReason};

    fn first_card(session: &BattleSession, faction: Faction) -> (String, i32) {
        let card = session
            .state()
            .hand(faction)
            .first()
            .expect("dealt hand should not be empty");
        (card.id.clone(), card.attack1.damage)
    }

    #[test]
    fn seeded_sessions_deal_identically() {
        let one = BattleSession::with_seed(GameMode::Classic, 42);
        let two = BattleSession::with_seed(GameMode::Classic, 42);
        assert_eq!(one.state(), two.state());
        assert_eq!(one.state().attacker_hand.len(), 7);
        assert_eq!(one.state().defender_hand.len(), 7);
    }

    #[test]
    fn first_attack_on_brain_health() {
        let mut session = BattleSession::with_seed(GameMode::TrickyTech, 5);
        let (card_id, damage) = first_card(&session, Faction::Attacker);

        session
            .play_card(PlayCardAction::at_brain_health(card_id.clone(), 1))
            .expect("opening attack should be accepted");

        let state = session.state();
        assert_eq!(state.brain_health, -damage);
        assert!(state.is_in_arena(&card_id));
        assert_eq!(state.current_team, Faction::Defender);
        assert_eq!(state.ledger.last_action, Some(ActionKind::Attack));
        assert_eq!(session.victory(), None);
    }

    #[test]
    fn reset_restores_a_fresh_shuffled_game() {
        let mut session = BattleSession::with_seed(GameMode::Classic, 9);
        let (attacker, _) = first_card(&session, Faction::Attacker);
        session
            .play_card(PlayCardAction::at_brain_health(attacker, 2))
            .expect("attack should be accepted");
        session
            .play_action_card("rest-recharge")
            .expect("defender action should be accepted");
        let (defender, _) = first_card(&session, Faction::Defender);
        session.remove_card(&defender).expect("card should be removable");
        session.update_timer();

        let events = session.reset_game();

        let state = session.state();
        assert_eq!(events, vec![GameEvent::GameReset { mode: GameMode::Classic }]);
        assert_eq!(state.brain_health, 0);
        assert!(state.arena.is_empty());
        assert!(state.graveyard.is_empty());
        assert!(state.ledger.is_empty());
        assert_eq!(state.attacker_hand.len(), 7);
        assert_eq!(state.defender_hand.len(), 7);
        assert_eq!(state.action_pool.len(), 4);
        assert!(state.is_first_turn);
        assert_eq!(state.current_team, Faction::Attacker);
        assert_eq!(state.time_remaining, 600);
        assert_eq!(state.event_log.len(), 1);
    }

    #[test]
    fn overrides_shape_the_variant_and_timer() {
        let overrides = RuleOverrides {
            time_limit_secs: Some(2),
            unlimited_attacks: Some(true),
            seed: Some(1),
            ..RuleOverrides::default()
        };
        let mut session = BattleSession::with_overrides(GameMode::Classic, &overrides);
        assert_eq!(session.variant().attack_usage_cap, None);
        assert_eq!(session.state().time_remaining, 2);

        session.update_timer();
        session.update_timer();
        session.update_timer();

        assert_eq!(session.state().time_remaining, 0);
        assert_eq!(
            session.victory().map(|victory| victory.reason),
            Some(VictoryReason::TimeExpired)
        );
    }

    #[test]
    fn rejected_commands_resolve_with_reason_and_unchanged_state() {
        let mut session = BattleSession::with_seed(GameMode::Classic, 3);
        let before = session.state().clone();

        let result = session.play_action_card("friend-support");
        let resolution = session.resolve(result);

        assert!(resolution.is_rejected());
        assert!(matches!(resolution.rejected, Some(RuleError::WrongTeam { .. })));
        assert!(resolution.events.is_empty());
        assert_eq!(resolution.state, before);
    }

    #[test]
    fn replace_state_rejects_corrupted_snapshots() {
        let mut session = BattleSession::with_seed(GameMode::TrickyTech, 8);
        let mut snapshot = session.state().clone();
        snapshot.brain_health = -101;

        assert!(matches!(
            session.replace_state(snapshot),
            Err(RuleError::IntegrityViolation { .. })
        ));

        let mut snapshot = session.state().clone();
        snapshot.brain_health = -40;
        session
            .replace_state(snapshot)
            .expect("consistent snapshot should be accepted");
        assert_eq!(session.state().brain_health, -40);
    }
}
