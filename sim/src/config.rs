//! Tuning and content tables.
//!
//! `SimConfig` holds kernel tuning. `ContentDb` holds the read-only game
//! content (weapons, enemies, bosses, levels, upgrades, the player) keyed by
//! string id. Loading content is the one place where a failure aborts:
//! everything at runtime degrades to a logged warning instead.

use crate::stats::StatModifier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid content json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{owner} references unknown {kind} '{id}'")]
    MissingReference {
        owner: String,
        kind: &'static str,
        id: String,
    },
}

/// Visible play area, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
}

impl PlayArea {
    /// Whether the point lies inside the play area.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.contains_with_margin(x, y, 0.0)
    }

    /// Whether the point lies inside the play area grown by `margin`.
    pub fn contains_with_margin(&self, x: f32, y: f32, margin: f32) -> bool {
        x >= -margin && x <= self.width + margin && y >= -margin && y <= self.height + margin
    }
}

/// Hard upper bounds on live entities per category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationCaps {
    pub enemies: usize,
    pub projectiles: usize,
    pub particles: usize,
}

impl Default for PopulationCaps {
    fn default() -> Self {
        Self {
            enemies: 200,
            projectiles: 600,
            particles: 400,
        }
    }
}

/// Kernel tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed timestep in seconds (1/60 = 60 Hz).
    pub fixed_timestep: f32,
    pub play_area: PlayArea,
    /// Base distance outside the play area before an entity is culled.
    pub cull_margin: f32,
    /// Extra margin for off-screen enemies: seconds of travel at current speed.
    pub cull_lookahead: f32,
    pub caps: PopulationCaps,
    /// Damage used when an attacker has no projectile data.
    pub fallback_contact_damage: f32,
    /// Seconds of invulnerability after the player is hit.
    pub player_invulnerability: f32,
    pub pickup_radius: f32,
    /// Seconds between victory and the level being marked complete.
    pub exit_delay: f32,
    pub xp_base: f32,
    pub xp_growth: f32,
    /// Presentation slots created up front.
    pub slot_prewarm: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            play_area: PlayArea {
                width: 960.0,
                height: 540.0,
            },
            cull_margin: 64.0,
            cull_lookahead: 1.5,
            caps: PopulationCaps::default(),
            fallback_contact_damage: 10.0,
            player_invulnerability: 0.75,
            pickup_radius: 40.0,
            exit_delay: 2.0,
            xp_base: 10.0,
            xp_growth: 1.5,
            slot_prewarm: 64,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// XP needed to go from `level` to `level + 1`.
    pub fn xp_to_next(&self, level: u32) -> f32 {
        self.xp_base * self.xp_growth.powi(level.saturating_sub(1) as i32)
    }
}

// ============================================================================
// CONTENT DEFINITIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomingDef {
    pub turn_rate: f32,
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponDef {
    /// Seconds between shots before stat scaling.
    pub fire_interval: f32,
    pub projectile_speed: f32,
    pub damage: f32,
    pub pierce: u32,
    pub chain: u32,
    /// Projectiles per shot, fanned across `spread_angle` radians.
    pub spread: u32,
    pub spread_angle: f32,
    pub lifetime: f32,
    pub radius: f32,
    pub sprite: String,
    pub homing: Option<HomingDef>,
}

impl Default for WeaponDef {
    fn default() -> Self {
        Self {
            fire_interval: 0.25,
            projectile_speed: 480.0,
            damage: 10.0,
            pierce: 0,
            chain: 0,
            spread: 1,
            spread_angle: 0.0,
            lifetime: 3.0,
            radius: 4.0,
            sprite: "bullet".to_string(),
            homing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyDef {
    pub health: f32,
    pub speed: f32,
    pub radius: f32,
    pub xp: f32,
    pub behavior: String,
    pub params: serde_json::Value,
    pub weapon: Option<String>,
    pub sprite: String,
}

impl Default for EnemyDef {
    fn default() -> Self {
        Self {
            health: 30.0,
            speed: 80.0,
            radius: 12.0,
            xp: 1.0,
            behavior: "straight".to_string(),
            params: serde_json::Value::Null,
            weapon: None,
            sprite: "enemy".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerDef {
    pub health: f32,
    pub speed: f32,
    pub radius: f32,
    pub weapon: String,
    pub sprite: String,
}

impl Default for PlayerDef {
    fn default() -> Self {
        Self {
            health: 100.0,
            speed: 220.0,
            radius: 10.0,
            weapon: "blaster".to_string(),
            sprite: "player".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveDef {
    /// Seconds after level start.
    pub at: f32,
    pub enemy: String,
    #[serde(default = "one")]
    pub count: u32,
    /// Look `enemy` up in the boss table instead.
    #[serde(default)]
    pub boss: bool,
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub spacing: f32,
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    #[serde(default)]
    pub waves: Vec<WaveDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    #[serde(default)]
    pub name: String,
    pub modifiers: Vec<StatModifier>,
}

/// Read-only content tables keyed by id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentDb {
    pub player: PlayerDef,
    pub weapons: HashMap<String, WeaponDef>,
    pub enemies: HashMap<String, EnemyDef>,
    pub bosses: HashMap<String, EnemyDef>,
    pub levels: HashMap<String, LevelDef>,
    pub upgrades: HashMap<String, UpgradeDef>,
}

impl ContentDb {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let db: ContentDb = serde_json::from_str(json)?;
        db.validate()?;
        Ok(db)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            weapons = db.weapons.len(),
            enemies = db.enemies.len(),
            levels = db.levels.len(),
            "content loaded"
        );
        Ok(db)
    }

    /// Check cross-table references so broken content fails at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = |owner: String, kind: &'static str, id: &str| ConfigError::MissingReference {
            owner,
            kind,
            id: id.to_string(),
        };

        if !self.weapons.contains_key(&self.player.weapon) {
            return Err(missing("player".into(), "weapon", &self.player.weapon));
        }
        for (id, enemy) in self.enemies.iter().chain(self.bosses.iter()) {
            if let Some(weapon) = &enemy.weapon {
                if !self.weapons.contains_key(weapon) {
                    return Err(missing(format!("enemy '{id}'"), "weapon", weapon));
                }
            }
        }
        for (id, level) in &self.levels {
            for wave in &level.waves {
                let table = if wave.boss { &self.bosses } else { &self.enemies };
                if !table.contains_key(&wave.enemy) {
                    let kind = if wave.boss { "boss" } else { "enemy" };
                    return Err(missing(format!("level '{id}'"), kind, &wave.enemy));
                }
            }
        }
        Ok(())
    }

    /// Look up a weapon definition.
    pub fn weapon(&self, id: &str) -> Option<&WeaponDef> {
        self.weapons.get(id)
    }

    /// Look up an enemy definition.
    pub fn enemy(&self, id: &str) -> Option<&EnemyDef> {
        self.enemies.get(id)
    }

    /// Look up a boss definition.
    pub fn boss(&self, id: &str) -> Option<&EnemyDef> {
        self.bosses.get(id)
    }

    /// Look up a level definition.
    pub fn level(&self, id: &str) -> Option<&LevelDef> {
        self.levels.get(id)
    }

    /// Look up an upgrade definition.
    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrades.get(id)
    }

    /// Small built-in content set used by the demo and tests.
    pub fn builtin() -> Self {
        let mut db = ContentDb::default();
        db.weapons.insert("blaster".into(), WeaponDef::default());
        db.weapons.insert(
            "lance".into(),
            WeaponDef {
                fire_interval: 0.6,
                projectile_speed: 600.0,
                damage: 25.0,
                pierce: 2,
                sprite: "lance".into(),
                ..WeaponDef::default()
            },
        );
        db.weapons.insert(
            "spitter".into(),
            WeaponDef {
                fire_interval: 1.5,
                projectile_speed: 200.0,
                damage: 8.0,
                sprite: "enemy_bullet".into(),
                ..WeaponDef::default()
            },
        );
        db.enemies.insert("drone".into(), EnemyDef::default());
        db.enemies.insert(
            "weaver".into(),
            EnemyDef {
                health: 60.0,
                behavior: "sine".into(),
                params: serde_json::json!({ "amplitude": 60.0, "frequency": 1.5 }),
                weapon: Some("spitter".into()),
                xp: 3.0,
                sprite: "weaver".into(),
                ..EnemyDef::default()
            },
        );
        db.bosses.insert(
            "warden".into(),
            EnemyDef {
                health: 800.0,
                speed: 40.0,
                radius: 48.0,
                xp: 50.0,
                behavior: "chase".into(),
                weapon: Some("spitter".into()),
                sprite: "warden".into(),
                ..EnemyDef::default()
            },
        );
        db.levels.insert(
            "level_1".into(),
            LevelDef {
                waves: vec![
                    WaveDef {
                        at: 0.0,
                        enemy: "drone".into(),
                        count: 5,
                        boss: false,
                        x: 1000.0,
                        y: 100.0,
                        spacing: 60.0,
                    },
                    WaveDef {
                        at: 4.0,
                        enemy: "weaver".into(),
                        count: 3,
                        boss: false,
                        x: 1000.0,
                        y: 200.0,
                        spacing: 80.0,
                    },
                    WaveDef {
                        at: 10.0,
                        enemy: "warden".into(),
                        count: 1,
                        boss: true,
                        x: 1000.0,
                        y: 270.0,
                        spacing: 0.0,
                    },
                ],
            },
        );
        db.upgrades.insert(
            "overclock".into(),
            UpgradeDef {
                name: "Overclock".into(),
                modifiers: vec![StatModifier::multiply(crate::stats::stat::FIRE_RATE, 1.25)],
            },
        );
        db.upgrades.insert(
            "plating".into(),
            UpgradeDef {
                name: "Plating".into(),
                modifiers: vec![StatModifier::add(crate::stats::stat::MAX_HEALTH, 25.0)],
            },
        );
        db
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_content_is_valid() {
        assert!(ContentDb::builtin().validate().is_ok());
    }

    #[test]
    fn test_missing_weapon_reference_is_fatal() {
        let json = r#"{
            "player": { "weapon": "nope" },
            "weapons": { "blaster": {} }
        }"#;
        let err = ContentDb::from_json_str(json).unwrap_err();
        assert!(matches!(err, ConfigError::MissingReference { kind: "weapon", .. }));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "weapons": { "blaster": { "damage": 3.0 } },
            "levels": { "l": { "waves": [ { "at": 1.0, "enemy": "e" } ] } },
            "enemies": { "e": { "health": 5.0 } }
        }"#;
        let db = ContentDb::from_json_str(json).unwrap();
        assert_eq!(db.weapon("blaster").unwrap().damage, 3.0);
        assert_eq!(db.weapon("blaster").unwrap().spread, 1);
        assert_eq!(db.level("l").unwrap().waves[0].count, 1);
        assert_eq!(db.enemy("e").unwrap().speed, 80.0);
    }

    #[test]
    fn test_load_reports_io_errors() {
        let err = ContentDb::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_sim_config_from_partial_json() {
        let cfg = SimConfig::from_json_str(r#"{ "caps": { "enemies": 30, "projectiles": 10, "particles": 5 } }"#).unwrap();
        assert_eq!(cfg.caps.enemies, 30);
        assert_eq!(cfg.cull_margin, 64.0);
    }

    #[test]
    fn test_xp_curve() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.xp_to_next(1), 10.0);
        assert_eq!(cfg.xp_to_next(2), 15.0);
    }

    #[test]
    fn test_play_area_margin() {
        let area = PlayArea { width: 100.0, height: 50.0 };
        assert!(area.contains(0.0, 50.0));
        assert!(!area.contains(-1.0, 10.0));
        assert!(area.contains_with_margin(-10.0, 10.0, 10.0));
    }
}
