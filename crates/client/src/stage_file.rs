//! JSON stage descriptions.
use std::path::Path;

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use battle_core::{ActorData, CombatRole, SkillData, TargetSpec};
use stage_runtime::{PartyData, StageData};

/// A party and the stage it fights, as loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageFile {
    #[serde(default)]
    pub name: String,
    pub party: Vec<ActorData>,
    pub enemies: Vec<ActorData>,
}

impl StageFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading stage file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing stage file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(raw)?;
        ensure!(!file.party.is_empty(), "stage file has an empty party");
        ensure!(!file.enemies.is_empty(), "stage file has no enemies");
        Ok(file)
    }

    /// Built-in encounter used when no file is given.
    pub fn demo() -> Self {
        let slash = SkillData::new("slash", TargetSpec::front_enemies(), 12);
        let volley = SkillData::new("volley", TargetSpec::random_enemies(), 5);
        let mend = SkillData::new("mend", TargetSpec::all_allies(), -6);
        let bite = SkillData::new("bite", TargetSpec::front_enemies(), 7);
        let spit = SkillData::new("spit", TargetSpec::back_enemies(), 4);

        Self {
            name: "goblin warren".into(),
            party: vec![
                ActorData::new("knight", CombatRole::Defensive, 9, 60)
                    .with_skill(slash.clone()),
                ActorData::new("ranger", CombatRole::Offensive, 14, 35)
                    .with_skill(volley)
                    .with_skill(slash),
                ActorData::new("cleric", CombatRole::Default, 11, 40).with_skill(mend),
            ],
            enemies: vec![
                ActorData::new("goblin", CombatRole::Offensive, 12, 25).with_skill(bite.clone()),
                ActorData::new("goblin", CombatRole::Offensive, 12, 25).with_skill(bite.clone()),
                ActorData::new("shaman", CombatRole::Default, 10, 20).with_skill(spit),
                ActorData::new("brute", CombatRole::Defensive, 7, 50).with_skill(bite),
            ],
        }
    }

    pub fn into_parts(self) -> (PartyData, StageData) {
        (
            PartyData::Fresh(self.party),
            StageData {
                name: self.name,
                enemies: self.enemies,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sides_are_rejected() {
        let err = StageFile::from_json(r#"{ "party": [], "enemies": [] }"#).unwrap_err();
        assert!(err.to_string().contains("empty party"));
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let file = StageFile::from_json(
            r#"{
                "party": [{ "name": "hero", "speed": 10, "max_hp": 30 }],
                "enemies": [{ "name": "rat", "speed": 5, "max_hp": 5 }]
            }"#,
        )
        .unwrap();

        assert!(file.name.is_empty());
        assert_eq!(file.party[0].role, CombatRole::Default);
        let (party, stage) = file.into_parts();
        assert!(matches!(party, PartyData::Fresh(ref members) if members.len() == 1));
        assert_eq!(stage.enemies[0].name, "rat");
    }
}
