//! 两种模式的卡牌目录（纯数据）。

use once_cell::sync::Lazy;
use serde::Serialize;

use super::effects::EffectKind;
use super::mode::GameMode;
use super::state::{ActionCard, Attack, BattleCard, Faction};

/// tricky-tech 中“习惯 ↔ 设计陷阱”的配对表，仅供展示，规则不读取。
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MatchingPair {
    pub habit: String,
    pub trick: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardCatalog {
    pub mode: GameMode,
    pub battle_cards: Vec<BattleCard>,
    pub action_cards: Vec<ActionCard>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matching_pairs: Vec<MatchingPair>,
}

impl CardCatalog {
    pub fn battle_cards_of(&self, faction: Faction) -> Vec<BattleCard> {
        self.battle_cards
            .iter()
            .filter(|card| card.faction == faction)
            .cloned()
            .collect()
    }
}

fn fighter(
    id: &str,
    faction: Faction,
    name: &str,
    hp: i32,
    first: (&str, i32, &str),
    second: (&str, i32, &str),
) -> BattleCard {
    BattleCard::new(
        id,
        faction,
        name,
        hp,
        Attack::new(first.0, first.1, first.2),
        Attack::new(second.0, second.1, second.2),
    )
}

/// `image` 为相对前端 `assets/` 目录的卡面路径。
fn action(
    id: &str,
    name: &str,
    image: &str,
    faction: Faction,
    duration: u8,
    effect_text: &str,
    effects: Vec<EffectKind>,
) -> ActionCard {
    ActionCard {
        id: id.to_string(),
        name: name.to_string(),
        effect_text: effect_text.to_string(),
        description: String::new(),
        faction,
        image: image.to_string(),
        duration,
        effects,
    }
}

pub static CLASSIC: Lazy<CardCatalog> = Lazy::new(|| {
    use Faction::{Attacker, Defender};

    let battle_cards = vec![
        fighter(
            "tt1",
            Attacker,
            "All-or-Nothing",
            70,
            ("Black and White", 30, "Makes you see things as all good or all bad with no middle ground."),
            ("Never/Always Blast", 50, "Uses words like 'never' or 'always' to make problems seem bigger."),
        ),
        fighter(
            "tt2",
            Attacker,
            "Labeler",
            70,
            ("Bad Name Tag", 25, "Puts a mean label on yourself instead of just on your mistake."),
            ("Failure Flurry", 45, "Makes you think one bad grade means you're bad at everything."),
        ),
        fighter(
            "tt3",
            Attacker,
            "Mind Reader",
            65,
            ("Friend Guesser", 30, "Makes you think you know why your friend isn't talking to you."),
            ("Thought Reader", 40, "Assumes others are thinking bad things about you without asking them."),
        ),
        fighter(
            "tt4",
            Attacker,
            "Negative Filter",
            75,
            ("Good Stuff Eraser", 25, "Makes all the nice comments disappear from your mind."),
            ("Bad Comment Focus", 45, "Zooms in on one mean comment and ignores ten nice ones."),
        ),
        fighter(
            "tt5",
            Attacker,
            "Should Monster",
            65,
            ("Should-a, Would-a, Could-a", 35, "Drops 'should' and 'shouldn't' words that make you feel bad."),
            ("Perfect Student", 50, "Makes you think you should never make mistakes on homework."),
        ),
        fighter(
            "tt6",
            Attacker,
            "Personalizer",
            60,
            ("My Fault Magnet", 30, "Pulls blame toward you for things you didn't do."),
            ("Mood Blamer", 40, "Makes you think your friend's bad mood is because of you."),
        ),
        fighter(
            "tt7",
            Attacker,
            "Fortune Teller",
            70,
            ("Test Disaster", 35, "Makes you sure you'll fail tomorrow's test before taking it."),
            ("Future Fail", 55, "Convinces you that bad things will definitely happen at school."),
        ),
        fighter(
            "at1",
            Defender,
            "Middle Path Finder",
            90,
            ("Gray Area Reveal", 45, "Shows that most things aren't all good or all bad."),
            ("Sometimes Perspective", 65, "Replaces 'always' and 'never' with 'sometimes' to see things more clearly."),
        ),
        fighter(
            "at2",
            Defender,
            "Growth Mindset",
            85,
            ("Second Chance", 50, "Turns mistakes into chances to learn and grow."),
            ("More Than Mistakes", 70, "Reminds you that not being good at something YET doesn't define who you are."),
        ),
        fighter(
            "at3",
            Defender,
            "Fact Checker",
            85,
            ("Curious Question", 45, "Asks what's really happening instead of jumping to conclusions."),
            ("Evidence Collection", 65, "Gathers facts before deciding what others are thinking."),
        ),
        fighter(
            "at4",
            Defender,
            "Balanced Viewer",
            90,
            ("Full Picture", 45, "Helps you see both the good and challenging parts of a situation."),
            ("Positive Spotlight", 70, "Shines light on the good things that negative filters try to hide."),
        ),
        fighter(
            "at5",
            Defender,
            "Flexible Thinker",
            95,
            ("Preference Shift", 55, "Changes rigid 'shoulds' into gentler preferences and goals."),
            ("Effort Champion", 75, "Celebrates trying hard and making progress instead of demanding perfection."),
        ),
        fighter(
            "at6",
            Defender,
            "Reality Checker",
            80,
            ("Other Explanations", 50, "Finds different reasons why things might be happening."),
            ("Not About Me", 65, "Remembers that most things aren't personal or about you at all."),
        ),
        fighter(
            "at7",
            Defender,
            "Possibility Explorer",
            100,
            ("Maybe Maker", 60, "Replaces 'definitely will happen' with 'maybe' to open up new possibilities."),
            ("Future Path", 80, "Discovers multiple possible futures instead of just one negative one."),
        ),
    ];

    let action_cards = vec![
        action(
            "rest-recharge",
            "Rest & Recharge",
            "cards/rest-recharge.webp",
            Defender,
            3,
            "Reduces all Thinking Traps HP by 20 and increases all Alternative Thoughts HP by 10. Effect continues for 3 turns.",
            vec![
                EffectKind::HpDelta { faction: Attacker, amount: -20 },
                EffectKind::HpDelta { faction: Defender, amount: 10 },
            ],
        ),
        action(
            "friend-support",
            "Friend Support",
            "cards/friend-support.webp",
            Defender,
            1,
            "Activates a shield to block the next attack and boosts your strongest Alternative Thought by 30 HP.",
            vec![EffectKind::Shield { protects: Defender, strongest_boost: 30 }],
        ),
        action(
            "social-media-storm",
            "Social Media Storm",
            "cards/social-media-storm.webp",
            Attacker,
            2,
            "Increases all Thinking Traps HP by 25, enables double damage for 2 turns, and reduces all Alternative Thoughts HP by 15.",
            vec![
                EffectKind::HpDelta { faction: Attacker, amount: 25 },
                EffectKind::HpDelta { faction: Defender, amount: -15 },
                EffectKind::DoubleDamage { faction: Attacker },
            ],
        ),
        action(
            "distraction-overload",
            "Distraction Overload",
            "cards/distraction-overload.webp",
            Attacker,
            2,
            "Reduces all Alternative Thoughts HP by 20 and halves their healing for 2 turns.",
            vec![
                EffectKind::HpDelta { faction: Defender, amount: -20 },
                EffectKind::HealingReduction { faction: Defender, percent: 50 },
            ],
        ),
    ];

    CardCatalog {
        mode: GameMode::Classic,
        battle_cards,
        action_cards,
        matching_pairs: Vec::new(),
    }
});

pub static TRICKY_TECH: Lazy<CardCatalog> = Lazy::new(|| {
    use Faction::{Attacker, Defender};

    let battle_cards = vec![
        fighter(
            "dt1",
            Attacker,
            "Infinite Scroll",
            70,
            ("Endless Feed", 30, "Makes you scroll endlessly through social media content"),
            ("Just One More", 50, "Convinces you to scroll \"just one more minute\" repeatedly"),
        )
        .with_description("Makes you scroll endlessly through social media content"),
        fighter(
            "dt2",
            Attacker,
            "Notifier",
            65,
            ("Buzz Blast", 25, "Interrupts your focus with constant notifications"),
            ("FOMO Strike", 45, "Fear of missing out makes you keep checking notifications"),
        )
        .with_description("Bombards you with endless notifications to break focus"),
        fighter(
            "dt3",
            Attacker,
            "Autoplayer",
            75,
            ("Next Episode", 35, "Automatically starts the next video before you can decide"),
            ("Binge Mode", 55, "Makes you watch entire seasons in one sitting"),
        )
        .with_description("Automatically plays the next video to keep you watching"),
        fighter(
            "dt4",
            Attacker,
            "Engagement",
            80,
            ("Like Addiction", 30, "Makes you crave likes and social validation"),
            ("Comment Chaos", 50, "Pulls you into endless comment arguments and drama"),
        )
        .with_description("Uses likes and comments to keep you engaged and scrolling"),
        fighter(
            "hh1",
            Defender,
            "Touch Grass",
            90,
            ("Nature Break", 45, "Reconnects you with the real world outside"),
            ("Fresh Air", 65, "Clears your mind with outdoor activities"),
        )
        .with_description("Reminds you to take breaks and go outside for fresh air"),
        fighter(
            "hh2",
            Defender,
            "Time Limit",
            85,
            ("App Timer", 40, "Sets healthy boundaries on app usage"),
            ("Digital Sunset", 60, "Helps you wind down before bedtime"),
        )
        .with_description("Helps you set and stick to healthy screen time limits"),
        fighter(
            "hh3",
            Defender,
            "Silence",
            80,
            ("Do Not Disturb", 35, "Blocks distracting notifications during focus time"),
            ("Focus Mode", 55, "Creates periods of uninterrupted focus"),
        )
        .with_description("Helps you manage notifications and reduce distractions"),
        fighter(
            "hh4",
            Defender,
            "Mindful Moment",
            95,
            ("Deep Breath", 50, "Takes a moment to center yourself and be present"),
            ("Meditation", 70, "Practices mindfulness to resist digital distractions"),
        )
        .with_description("Promotes mindful and intentional technology use"),
    ];

    let mut late_night_scroll = action(
        "late-night-scroll",
        "Late Night Scroll",
        "cards/tricky-tech/AC - Late Night Scroll.webp",
        Attacker,
        2,
        "Increases all Design Tricks HP by 25, enables double damage for 2 turns, and reduces all Healthy Habits HP by 15.",
        vec![
            EffectKind::HpDelta { faction: Attacker, amount: 25 },
            EffectKind::DoubleDamage { faction: Attacker },
            EffectKind::HpDelta { faction: Defender, amount: -15 },
        ],
    );
    late_night_scroll.description =
        "Late night scrolling makes design tricks more powerful as your brain gets tired".into();

    let mut mini_game_distractor = action(
        "mini-game-distractor",
        "Mini-Game Distractor",
        "cards/tricky-tech/AC - Mini-Game Distractor.webp",
        Attacker,
        2,
        "Reduces all Healthy Habits HP by 20 and halves their healing for 2 turns.",
        vec![
            EffectKind::HpDelta { faction: Defender, amount: -20 },
            EffectKind::HealingReduction { faction: Defender, percent: 50 },
        ],
    );
    mini_game_distractor.description =
        "Small games within apps can distract you from your healthy tech habits".into();

    // 全体加血之后护盾再为最强的一张追加同样的数值。
    let mut flow_hobby = action(
        "flow-hobby",
        "Flow Hobby",
        "cards/tricky-tech/AC - Flow Hobby.webp",
        Defender,
        1,
        "Activates a shield to block the next attack and boosts your strongest Healthy Habit by 30 HP.",
        vec![
            EffectKind::HpDelta { faction: Defender, amount: 30 },
            EffectKind::Shield { protects: Defender, strongest_boost: 30 },
        ],
    );
    flow_hobby.description =
        "Getting absorbed in a non-tech hobby helps strengthen your healthy habits".into();

    let mut phone_policy = action(
        "phone-policy",
        "Phone Policy",
        "cards/tricky-tech/AC - Phone Policy.webp",
        Defender,
        3,
        "Reduces all Design Tricks HP by 20 and increases all Healthy Habits HP by 10. Effect continues for 3 turns.",
        vec![
            EffectKind::HpDelta { faction: Attacker, amount: -20 },
            EffectKind::HpDelta { faction: Defender, amount: 10 },
        ],
    );
    phone_policy.description = "Clear rules about device usage help weaken design tricks".into();

    let matching_pairs = [
        ("Touch Grass", "Infinity Scroller"),
        ("Time Limiter", "Autoplayer"),
        ("Silencer", "Notifier"),
        ("Mindful Moment", "Engagementer"),
    ]
    .into_iter()
    .map(|(habit, trick)| MatchingPair {
        habit: habit.to_string(),
        trick: trick.to_string(),
    })
    .collect();

    CardCatalog {
        mode: GameMode::TrickyTech,
        battle_cards,
        action_cards: vec![late_night_scroll, mini_game_distractor, flow_hobby, phone_policy],
        matching_pairs,
    }
});
