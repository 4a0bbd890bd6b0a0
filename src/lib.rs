pub mod game;
#[cfg(feature = "console_log")]
pub mod logging;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;

pub use game::{
    ActionCard, ActionKind, ActiveEffect, Attack, AttackSlot, AttackUsage, BattleCard,
    BattleSession, BattleState, CardCatalog, CardId, ConfigError, EffectContext, EffectKind,
    EffectLedger, EffectResolution, Faction, GameEvent, GameMode, GraveyardEntry, IntegrityError,
    MatchingPair, PlayCardAction, RuleEngine, RuleError, RuleOverrides, RuleResolution,
    RuleVariant, SpecialEffect, Target, TargetingRequest, Victory, VictoryReason,
};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
    init_logging();
}

fn to_js_error<E: serde::Serialize + std::fmt::Display>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|_| JsValue::from_str(&error.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn make_resolution_json(resolution: RuleResolution) -> Result<String, JsValue> {
    serde_json::to_string(&resolution).map_err(serde_to_js_error)
}

fn parse_mode(mode: &str) -> Result<GameMode, JsValue> {
    GameMode::from_str(mode).map_err(to_js_error)
}

fn parse_target(target: &str) -> Result<Target, JsValue> {
    serde_json::from_value(serde_json::Value::String(target.to_string())).map_err(serde_to_js_error)
}

/// 浏览器端的对战引擎。指令被拒绝时不抛异常，而是返回带 `rejected` 字段的结果。
#[wasm_bindgen]
pub struct BattleEngine {
    session: BattleSession,
}

#[wasm_bindgen]
impl BattleEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(mode: &str, config_json: Option<String>) -> Result<BattleEngine, JsValue> {
        let mode = parse_mode(mode)?;
        let overrides = match config_json {
            Some(json) => RuleOverrides::from_json(&json).map_err(to_js_error)?,
            None => RuleOverrides::default(),
        };
        Ok(BattleEngine {
            session: BattleSession::with_overrides(mode, &overrides),
        })
    }

    pub fn mode(&self) -> String {
        self.session.mode().to_string()
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.session.state()).map_err(serde_to_js_error)
    }

    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: BattleState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        self.session.replace_state(state).map_err(to_js_error)
    }

    fn respond(&self, result: Result<Vec<GameEvent>, RuleError>) -> Result<String, JsValue> {
        if let Err(error) = &result {
            web_sys::console::warn_1(&format!("[{}] 指令被拒绝: {error}", self.session.mode()).into());
        }
        make_resolution_json(self.session.resolve(result))
    }

    pub fn play_card_json(&mut self, action_json: &str) -> Result<String, JsValue> {
        let action: PlayCardAction = serde_json::from_str(action_json).map_err(serde_to_js_error)?;
        let result = self.session.play_card(action);
        self.respond(result)
    }

    pub fn play_card(
        &mut self,
        source_card_id: &str,
        attack_index: u8,
        target: &str,
        target_card_id: Option<String>,
    ) -> Result<String, JsValue> {
        let action = PlayCardAction {
            source_card_id: source_card_id.to_string(),
            attack_index,
            target: parse_target(target)?,
            target_card_id,
        };
        let result = self.session.play_card(action);
        self.respond(result)
    }

    pub fn play_action_card(&mut self, action_card_id: &str) -> Result<String, JsValue> {
        let result = self.session.play_action_card(action_card_id);
        self.respond(result)
    }

    pub fn process_turn_effects(&mut self) -> Result<String, JsValue> {
        let result = self.session.process_turn_effects();
        self.respond(result)
    }

    pub fn force_clear_battle_arena(&mut self) -> Result<String, JsValue> {
        let result = self.session.force_clear_battle_arena();
        self.respond(result)
    }

    pub fn begin_targeting(&mut self, source_card_id: &str, attack_index: u8) -> Result<String, JsValue> {
        let result = self.session.begin_targeting(source_card_id, attack_index);
        self.respond(result)
    }

    pub fn resolve_targeting(&mut self, target_card_id: &str) -> Result<String, JsValue> {
        let result = self.session.resolve_targeting(target_card_id);
        self.respond(result)
    }

    pub fn cancel_targeting(&mut self) -> Result<String, JsValue> {
        let result = self.session.cancel_targeting();
        self.respond(result)
    }

    pub fn remove_card(&mut self, card_id: &str) -> Result<String, JsValue> {
        let result = self.session.remove_card(card_id);
        self.respond(result)
    }

    pub fn switch_teams(&mut self) -> Result<String, JsValue> {
        let result = self.session.switch_teams();
        self.respond(result)
    }

    pub fn update_timer(&mut self) -> Result<String, JsValue> {
        let events = self.session.update_timer();
        self.respond(Ok(events))
    }

    pub fn reset_game(&mut self) -> Result<String, JsValue> {
        let events = self.session.reset_game();
        self.respond(Ok(events))
    }

    pub fn check_victory(&self) -> Result<JsValue, JsValue> {
        to_value(&self.session.victory()).map_err(JsValue::from)
    }
}

/// 按模式洗牌发牌，返回一局新的对战状态。
#[wasm_bindgen(js_name = "createBattleState")]
pub fn create_battle_state(mode: &str) -> Result<JsValue, JsValue> {
    let mode = parse_mode(mode)?;
    let state = BattleState::deal(mode, &mode.variant(), &mut SmallRng::from_entropy());
    to_value(&state).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "checkVictory")]
pub fn check_victory(state: JsValue) -> Result<JsValue, JsValue> {
    let state: BattleState = from_value(state).map_err(JsValue::from)?;
    let outcome = RuleEngine::check_victory(&state);
    to_value(&outcome).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: BattleState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))?;
    Ok(())
}

/// 返回指定模式的卡牌目录，供前端渲染卡面。
#[wasm_bindgen(js_name = "catalog")]
pub fn catalog(mode: &str) -> Result<JsValue, JsValue> {
    let mode = parse_mode(mode)?;
    to_value(mode.catalog()).map_err(JsValue::from)
}

fn parse_faction(faction: &str) -> Result<Faction, JsValue> {
    serde_json::from_value(serde_json::Value::String(faction.to_string())).map_err(serde_to_js_error)
}

#[wasm_bindgen(js_name = "teamLabel")]
pub fn team_label(mode: &str, faction: &str) -> Result<String, JsValue> {
    let mode = parse_mode(mode)?;
    Ok(mode.team_label(parse_faction(faction)?).to_string())
}

#[wasm_bindgen(js_name = "cardTypeLabel")]
pub fn card_type_label(mode: &str, faction: &str) -> Result<String, JsValue> {
    let mode = parse_mode(mode)?;
    Ok(mode.card_type_label(parse_faction(faction)?).to_string())
}

#[cfg(feature = "console_error_panic_hook")]
fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
fn set_panic_hook() {}

#[cfg(feature = "console_log")]
fn init_logging() {
    let level = if cfg!(debug_assertions) {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    logging::init(level);
}

#[cfg(not(feature = "console_log"))]
fn init_logging() {}
