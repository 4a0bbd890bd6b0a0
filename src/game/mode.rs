//! 游戏模式与规则变体配置。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{self, CardCatalog};
use super::state::Faction;

const DEFAULT_TIME_LIMIT_SECS: u32 = 600;
const DEFAULT_BRAIN_HEALTH_LIMIT: i32 = 100;
const CLASSIC_ATTACK_USAGE_CAP: u8 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GameMode {
    Classic,
    TrickyTech,
}

impl FromStr for GameMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" | "brain-battle" => Ok(GameMode::Classic),
            "tricky-tech" | "tricky" | "trickytech" => Ok(GameMode::TrickyTech),
            other => Err(ConfigError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GameMode::Classic => "classic",
            GameMode::TrickyTech => "tricky-tech",
        })
    }
}

impl GameMode {
    pub fn variant(self) -> RuleVariant {
        match self {
            GameMode::Classic => RuleVariant {
                attack_usage_cap: Some(CLASSIC_ATTACK_USAGE_CAP),
                sweep_after_attack: true,
                time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
                brain_health_limit: DEFAULT_BRAIN_HEALTH_LIMIT,
            },
            GameMode::TrickyTech => RuleVariant {
                attack_usage_cap: None,
                sweep_after_attack: false,
                time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
                brain_health_limit: DEFAULT_BRAIN_HEALTH_LIMIT,
            },
        }
    }

    pub fn catalog(self) -> &'static CardCatalog {
        match self {
            GameMode::Classic => &*catalog::CLASSIC,
            GameMode::TrickyTech => &*catalog::TRICKY_TECH,
        }
    }

    /// 阵营在界面上的队伍名称。
    pub fn team_label(self, faction: Faction) -> &'static str {
        match (self, faction) {
            (GameMode::Classic, Faction::Attacker) => "thought-trappers",
            (GameMode::Classic, Faction::Defender) => "thought-defenders",
            (GameMode::TrickyTech, Faction::Attacker) => "design-tricks",
            (GameMode::TrickyTech, Faction::Defender) => "healthy-habits",
        }
    }

    pub fn card_type_label(self, faction: Faction) -> &'static str {
        match (self, faction) {
            (GameMode::Classic, Faction::Attacker) => "thinking-trap",
            (GameMode::Classic, Faction::Defender) => "alternative-thought",
            (GameMode::TrickyTech, Faction::Attacker) => "design-trick",
            (GameMode::TrickyTech, Faction::Defender) => "healthy-habit",
        }
    }
}

/// 同一套回合引擎在不同模式下的数值差异。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleVariant {
    /// 每个招式的使用上限；两个招式都达到上限时一起清零。`None` 表示不限次数。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_usage_cap: Option<u8>,
    /// 出招后是否把本方竞技场卡牌收回到活动区。
    pub sweep_after_attack: bool,
    pub time_limit_secs: u32,
    pub brain_health_limit: i32,
}

impl Default for RuleVariant {
    fn default() -> Self {
        GameMode::Classic.variant()
    }
}

/// 前端传入的可选配置，覆盖模式默认值。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleOverrides {
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    #[serde(default)]
    pub attack_usage_cap: Option<u8>,
    #[serde(default)]
    pub unlimited_attacks: Option<bool>,
    #[serde(default)]
    pub sweep_after_attack: Option<bool>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl RuleOverrides {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    pub fn apply(&self, mut variant: RuleVariant) -> RuleVariant {
        if let Some(secs) = self.time_limit_secs {
            variant.time_limit_secs = secs;
        }
        if let Some(cap) = self.attack_usage_cap {
            variant.attack_usage_cap = Some(cap.max(1));
        }
        if self.unlimited_attacks == Some(true) {
            variant.attack_usage_cap = None;
        }
        if let Some(sweep) = self.sweep_after_attack {
            variant.sweep_after_attack = sweep;
        }
        variant
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type")]
pub enum ConfigError {
    #[error("unknown game mode `{mode}`")]
    UnknownMode { mode: String },
    #[error("invalid configuration: {message}")]
    Parse { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_aliases() {
        assert_eq!("classic".parse::<GameMode>(), Ok(GameMode::Classic));
        assert_eq!("Tricky".parse::<GameMode>(), Ok(GameMode::TrickyTech));
        assert_eq!("tricky-tech".parse::<GameMode>(), Ok(GameMode::TrickyTech));
        assert!(matches!(
            "poker".parse::<GameMode>(),
            Err(ConfigError::UnknownMode { .. })
        ));
    }

    #[test]
    fn variants_differ_in_cap_and_sweep() {
        let classic = GameMode::Classic.variant();
        let tricky = GameMode::TrickyTech.variant();
        assert_eq!(classic.attack_usage_cap, Some(2));
        assert!(classic.sweep_after_attack);
        assert_eq!(tricky.attack_usage_cap, None);
        assert!(!tricky.sweep_after_attack);
        assert_eq!(classic.time_limit_secs, 600);
    }

    #[test]
    fn overrides_apply_on_top_of_mode_defaults() {
        let overrides = RuleOverrides::from_json(
            r#"{"time_limit_secs": 90, "unlimited_attacks": true, "seed": 7}"#,
        )
        .expect("overrides should parse");
        let variant = overrides.apply(GameMode::Classic.variant());
        assert_eq!(variant.time_limit_secs, 90);
        assert_eq!(variant.attack_usage_cap, None);
        assert!(variant.sweep_after_attack, "untouched fields keep mode defaults");
        assert_eq!(overrides.seed, Some(7));
    }

    #[test]
    fn malformed_overrides_are_reported() {
        let err = RuleOverrides::from_json("{not json").expect_err("should fail to parse");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn labels_follow_the_mode() {
        assert_eq!(GameMode::Classic.team_label(Faction::Attacker), "thought-trappers");
        assert_eq!(GameMode::TrickyTech.team_label(Faction::Defender), "healthy-habits");
        assert_eq!(GameMode::TrickyTech.card_type_label(Faction::Attacker), "design-trick");
        assert_eq!(GameMode::TrickyTech.to_string(), "tricky-tech");
    }
}
