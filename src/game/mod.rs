//! 对战核心逻辑模块（卡牌目录、状态、效果账本、回合引擎）。

pub mod catalog;
pub mod effects;
pub mod mode;
pub mod rules;
pub mod session;
pub mod state;

pub use catalog::{CardCatalog, MatchingPair};
pub use effects::{
    ActionKind,
    ActiveEffect,
    EffectContext,
    EffectKind,
    EffectLedger,
    EffectResolution,
};
pub use mode::{ConfigError, GameMode, RuleOverrides, RuleVariant};
pub use rules::{PlayCardAction, RuleEngine, RuleError, RuleResolution};
pub use session::BattleSession;
pub use state::{
    ActionCard,
    Attack,
    AttackSlot,
    AttackUsage,
    BattleCard,
    BattleState,
    CardId,
    Faction,
    GameEvent,
    GraveyardEntry,
    IntegrityError,
    SpecialEffect,
    Target,
    TargetingRequest,
    Victory,
    VictoryReason,
};
