//! Skill target resolution.
//!
//! A [`TargetSpec`] combines *who* may be hit ([`TargetMask`]) with *where*
//! they must stand ([`PositionMask`]). [`TargetResolver::find_targets`]
//! snapshots the relevant fields into pooled buffers and returns a lazy
//! [`Targets`] iterator over them, so fields may change while the caller is
//! still consuming targets.
//!
//! Resolution order:
//! 1. the caster, when the mask has `SELF` or is empty (empty means self only)
//! 2. allies from the caster's field
//! 3. enemies from the opposing field
//!
//! Each field section is filtered by position independently. A section whose
//! filter rejects every occupant falls back to the whole snapshot, so a skill
//! never whiffs because one rank happens to be empty.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::actor::{ActorId, Side};
use crate::field::{ActorField, FieldTarget, Position};

bitflags::bitflags! {
    /// Which groups a skill may target.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TargetMask: u8 {
        const SELF  = 1 << 0;
        const ALLY  = 1 << 1;
        const ENEMY = 1 << 2;
    }
}

bitflags::bitflags! {
    /// Rank filter and ordering for field sections.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PositionMask: u8 {
        /// Front rank only (unless `BACKWARD` is also set).
        const FORWARD  = 1 << 0;
        /// Back rank only (unless `FORWARD` is also set).
        const BACKWARD = 1 << 1;
        /// Shuffle each section before filtering.
        const RANDOM   = 1 << 2;
    }
}

/// Target description attached to a skill.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetSpec {
    pub target: TargetMask,
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: PositionMask,
}

impl TargetSpec {
    pub const fn new(target: TargetMask, position: PositionMask) -> Self {
        Self { target, position }
    }

    /// Caster only.
    pub const fn self_only() -> Self {
        Self::new(TargetMask::SELF, PositionMask::empty())
    }

    /// Front-rank enemies, falling back to every enemy.
    pub const fn front_enemies() -> Self {
        Self::new(TargetMask::ENEMY, PositionMask::FORWARD)
    }

    /// Back-rank enemies, falling back to every enemy.
    pub const fn back_enemies() -> Self {
        Self::new(TargetMask::ENEMY, PositionMask::BACKWARD)
    }

    pub const fn all_enemies() -> Self {
        Self::new(TargetMask::ENEMY, PositionMask::empty())
    }

    pub const fn random_enemies() -> Self {
        Self::new(TargetMask::ENEMY, PositionMask::RANDOM)
    }

    pub const fn all_allies() -> Self {
        Self::new(TargetMask::ALLY, PositionMask::empty())
    }
}

/// Read access to both fields of a stage.
pub trait FieldView {
    fn field(&self, side: Side) -> &ActorField;

    /// Side the actor currently fights for, if it is on a field.
    fn side_of(&self, actor: ActorId) -> Option<Side>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PositionFilter {
    forward: bool,
    backward: bool,
}

impl PositionFilter {
    fn new(mask: PositionMask) -> Self {
        Self {
            forward: mask.contains(PositionMask::FORWARD),
            backward: mask.contains(PositionMask::BACKWARD),
        }
    }

    fn accepts(self, position: Position) -> bool {
        match (self.forward, self.backward) {
            (true, false) => position.is_front(),
            (false, true) => !position.is_front(),
            _ => true,
        }
    }
}

/// Resolves skill targets, reusing its snapshot buffers between calls.
#[derive(Debug, Default)]
pub struct TargetResolver {
    ally_buf: Vec<FieldTarget>,
    enemy_buf: Vec<FieldTarget>,
}

impl TargetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves targets with a fresh random seed; random order is not
    /// reproducible across calls.
    pub fn find_targets<V>(&mut self, caster: ActorId, spec: TargetSpec, view: &V) -> Targets<'_>
    where
        V: FieldView + ?Sized,
    {
        self.find_targets_seeded(caster, spec, view, rand::random())
    }

    /// Resolves targets with an explicit shuffle seed.
    pub fn find_targets_seeded<V>(
        &mut self,
        caster: ActorId,
        spec: TargetSpec,
        view: &V,
        seed: u64,
    ) -> Targets<'_>
    where
        V: FieldView + ?Sized,
    {
        self.ally_buf.clear();
        self.enemy_buf.clear();

        let mask = spec.target;
        let filter = PositionFilter::new(spec.position);
        let caster_target = (mask.is_empty() || mask.contains(TargetMask::SELF)).then_some(caster);

        if let Some(side) = view.side_of(caster).filter(|_| !mask.is_empty()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let random = spec.position.contains(PositionMask::RANDOM);

            if mask.contains(TargetMask::ALLY) {
                snapshot(view.field(side), &mut self.ally_buf, random.then_some(&mut rng));
            }
            if mask.contains(TargetMask::ENEMY) {
                snapshot(
                    view.field(side.opposing()),
                    &mut self.enemy_buf,
                    random.then_some(&mut rng),
                );
            }
        }

        Targets {
            caster: caster_target,
            ally: Section::new(&self.ally_buf, filter),
            enemy: Section::new(&self.enemy_buf, filter),
        }
    }
}

fn snapshot(field: &ActorField, buf: &mut Vec<FieldTarget>, rng: Option<&mut StdRng>) {
    field.copy_to_with_target_priority(buf);
    if let Some(rng) = rng {
        buf.shuffle(rng);
    }
}

/// One field's worth of candidates with lazy fallback.
#[derive(Clone, Debug)]
struct Section<'a> {
    rows: &'a [FieldTarget],
    filter: PositionFilter,
    cursor: usize,
    matched: bool,
    fallback: bool,
}

impl<'a> Section<'a> {
    fn new(rows: &'a [FieldTarget], filter: PositionFilter) -> Self {
        Self {
            rows,
            filter,
            cursor: 0,
            matched: false,
            fallback: false,
        }
    }
}

impl Iterator for Section<'_> {
    type Item = ActorId;

    fn next(&mut self) -> Option<ActorId> {
        if !self.fallback {
            while let Some(row) = self.rows.get(self.cursor) {
                self.cursor += 1;
                if self.filter.accepts(row.position) {
                    self.matched = true;
                    return Some(row.actor);
                }
            }

            if self.matched || self.rows.is_empty() {
                return None;
            }
            self.fallback = true;
            self.cursor = 0;
        }

        let row = self.rows.get(self.cursor)?;
        self.cursor += 1;
        Some(row.actor)
    }
}

/// Lazy sequence of resolved targets.
#[derive(Clone, Debug)]
pub struct Targets<'a> {
    caster: Option<ActorId>,
    ally: Section<'a>,
    enemy: Section<'a>,
}

impl Iterator for Targets<'_> {
    type Item = ActorId;

    fn next(&mut self) -> Option<ActorId> {
        if let Some(caster) = self.caster.take() {
            return Some(caster);
        }
        self.ally.next().or_else(|| self.enemy.next())
    }
}
