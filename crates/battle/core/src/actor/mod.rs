//! Actor records shared by the queue, the fields and the timeline.
//!
//! Actors live in a [`Roster`] arena and are addressed by a stable [`ActorId`].
//! Everything else in the stage holds ids only, so moving an actor between the
//! hand and a field never aliases the underlying record.

mod roster;
mod slot;

use std::fmt;

pub use roster::Roster;
pub use slot::StageActor;

use crate::targeting::TargetSpec;

/// Stable arena index of an actor registered in a [`Roster`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which side of the encounter an actor fights for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    /// The side this side fights against.
    pub const fn opposing(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Combatant role used to classify front/back rank.
///
/// Defensive actors hold the front line; Default and Offensive actors share a
/// rank behind them.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CombatRole {
    #[default]
    Default,
    Offensive,
    Defensive,
}

impl CombatRole {
    /// Sort rank inside a field: Defensive actors are ordered after the rest.
    pub const fn sort_rank(self) -> u8 {
        match self {
            CombatRole::Default | CombatRole::Offensive => 0,
            CombatRole::Defensive => 1,
        }
    }
}

/// A skill an actor can use on its turn.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillData {
    pub name: String,
    pub target: TargetSpec,
    /// Damage dealt to each target (negative values heal).
    pub power: i32,
}

impl SkillData {
    pub fn new(name: impl Into<String>, target: TargetSpec, power: i32) -> Self {
        Self {
            name: name.into(),
            target,
            power,
        }
    }
}

/// Static data describing an actor, as supplied by stage or party data.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorData {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: CombatRole,
    pub speed: i32,
    pub max_hp: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub skills: Vec<SkillData>,
}

impl ActorData {
    pub fn new(name: impl Into<String>, role: CombatRole, speed: i32, max_hp: i32) -> Self {
        Self {
            name: name.into(),
            role,
            speed,
            max_hp,
            skills: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_skill(mut self, skill: SkillData) -> Self {
        self.skills.push(skill);
        self
    }
}

/// Live stats; speed feeds the action time and may change between queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorStats {
    pub speed: i32,
    pub hp: i32,
    pub max_hp: i32,
}

impl ActorStats {
    pub fn from_data(data: &ActorData) -> Self {
        Self {
            speed: data.speed,
            hp: data.max_hp,
            max_hp: data.max_hp,
        }
    }

    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// An actor registered for the encounter.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorState {
    pub id: ActorId,
    pub side: Side,
    pub data: ActorData,
    pub stats: ActorStats,
    pub disposed: bool,
}

impl ActorState {
    pub fn is_alive(&self) -> bool {
        !self.disposed && self.stats.is_alive()
    }
}
