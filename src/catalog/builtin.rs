// Built-in sound list (the game's SFX, ambience and music assets)

use super::{Category, SoundDefinition};

struct CategorySeed {
    id: &'static str,
    display_name: &'static str,
    icon: &'static str,
    /// Directory under the resource root
    folder: &'static str,
    sounds: &'static [(&'static str, &'static str, f64)],
}

const SEEDS: &[CategorySeed] = &[
    CategorySeed {
        id: "ui",
        display_name: "Interface",
        icon: "🖱",
        folder: "sfx/ui",
        sounds: &[
            ("ui_click", "Click", 0.1),
            ("ui_hover", "Hover", 0.1),
            ("ui_confirm", "Confirm", 0.1),
            ("ui_cancel", "Cancel", 0.15),
            ("ui_deny", "Deny", 0.2),
            ("ui_open", "Open Panel", 0.15),
            ("ui_close", "Close Panel", 0.15),
            ("ui_tab", "Tab Switch", 0.1),
            ("ui_scroll", "Scroll Tick", 0.1),
            ("ui_notification", "Notification", 0.25),
        ],
    },
    CategorySeed {
        id: "weapons",
        display_name: "Weapons",
        icon: "🔫",
        folder: "sfx/weapons",
        sounds: &[
            ("laser_fire", "Laser Fire", 0.12),
            ("laser_heavy_fire", "Heavy Laser", 0.25),
            ("laser_hit", "Laser Hit", 0.1),
            ("missile_launch", "Missile Launch", 0.5),
            ("missile_explode", "Missile Explosion", 0.5),
            ("railgun_charge", "Railgun Charge", 0.8),
            ("railgun_fire", "Railgun Fire", 0.3),
        ],
    },
    CategorySeed {
        id: "explosions",
        display_name: "Explosions",
        icon: "💥",
        folder: "sfx/explosions",
        sounds: &[
            ("explosion_small", "Small Explosion", 0.3),
            ("explosion_medium", "Medium Explosion", 0.5),
            ("explosion_large", "Large Explosion", 0.8),
            ("ship_explode", "Ship Destroyed", 1.2),
        ],
    },
    CategorySeed {
        id: "ship",
        display_name: "Ship",
        icon: "🚀",
        folder: "sfx/ship",
        sounds: &[
            ("engine_idle", "Engine Idle", 2.0),
            ("engine_thrust", "Engine Thrust", 1.0),
            ("engine_boost", "Engine Boost", 0.4),
            ("ship_damage", "Hull Damage", 0.3),
            ("shield_hit", "Shield Hit", 0.1),
            ("shield_down", "Shield Down", 0.4),
            ("shield_recharge", "Shield Recharge", 0.5),
        ],
    },
    CategorySeed {
        id: "loot",
        display_name: "Loot",
        icon: "💎",
        folder: "sfx/loot",
        sounds: &[
            ("loot_common", "Common Pickup", 0.2),
            ("loot_uncommon", "Uncommon Pickup", 0.25),
            ("loot_rare", "Rare Pickup", 0.35),
            ("loot_epic", "Epic Pickup", 0.45),
            ("loot_legendary", "Legendary Pickup", 0.6),
        ],
    },
    CategorySeed {
        id: "alerts",
        display_name: "Alerts",
        icon: "⚠",
        folder: "sfx/alerts",
        sounds: &[
            ("alert_warning", "Warning", 0.5),
            ("alert_critical", "Critical", 0.4),
            ("alert_timer", "Timer", 0.15),
            ("countdown_beep", "Countdown Beep", 0.1),
            ("countdown_final", "Countdown Final", 0.3),
        ],
    },
    CategorySeed {
        id: "achievements",
        display_name: "Achievements",
        icon: "🏆",
        folder: "sfx/achievements",
        sounds: &[
            ("achievement_unlock", "Achievement Unlocked", 0.6),
            ("level_up", "Level Up", 0.5),
            ("money_gain", "Money Gain", 0.13),
        ],
    },
    CategorySeed {
        id: "docking",
        display_name: "Docking",
        icon: "⚓",
        folder: "sfx/docking",
        sounds: &[
            ("dock_approach", "Approach", 1.7),
            ("dock_clamp", "Clamp", 0.4),
            ("dock_seal", "Seal", 0.5),
            ("undock", "Undock", 0.6),
        ],
    },
    CategorySeed {
        id: "boarding",
        display_name: "Boarding",
        icon: "🚪",
        folder: "sfx/boarding",
        sounds: &[
            ("door_open", "Door Open", 0.3),
            ("door_close", "Door Close", 0.3),
        ],
    },
    CategorySeed {
        id: "ambient",
        display_name: "Ambience",
        icon: "🌌",
        folder: "ambient",
        sounds: &[
            ("space_hum", "Space Hum", 10.0),
            ("ship_ambience", "Ship Ambience", 10.0),
            ("station_bustle", "Station Bustle", 10.0),
            ("engine_rumble", "Engine Rumble", 10.0),
            ("ventilation", "Ventilation", 10.0),
            ("computer_hum", "Computer Hum", 10.0),
            ("radio_static", "Radio Static", 5.0),
        ],
    },
    CategorySeed {
        id: "music",
        display_name: "Music",
        icon: "🎵",
        folder: "music",
        sounds: &[
            ("main_theme", "Main Theme", 60.0),
            ("space_exploration", "Space Exploration", 90.0),
            ("combat_light", "Combat (Light)", 60.0),
            ("combat_intense", "Combat (Intense)", 60.0),
            ("boarding_tension", "Boarding Tension", 60.0),
            ("victory", "Victory", 15.0),
            ("defeat", "Defeat", 10.0),
        ],
    },
];

/// Build the built-in category list
pub fn categories() -> Vec<Category> {
    SEEDS
        .iter()
        .map(|seed| Category {
            id: seed.id.to_string(),
            display_name: seed.display_name.to_string(),
            icon: seed.icon.to_string(),
            sounds: seed
                .sounds
                .iter()
                .map(|&(id, display_name, nominal_duration)| SoundDefinition {
                    id: id.to_string(),
                    display_name: display_name.to_string(),
                    category: seed.id.to_string(),
                    relative_path: format!("{}/{}.wav", seed.folder, id),
                    nominal_duration,
                })
                .collect(),
        })
        .collect()
}
