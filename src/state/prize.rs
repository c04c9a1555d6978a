//! Prize pools and their draw-limit buckets.
//!
//! Every mutator here is a synchronous, local transformation. Nothing reaches
//! the remote until the operator saves through the prize service.

use indexmap::IndexMap;
use thiserror::Error;

/// Sub-limit on how many units of a prize may be drawn in one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationBucket {
    /// Position-derived identifier (`"0"`, `"1"`, ...).
    pub id: String,
    /// Units drawable in this pass.
    pub draw_count: u32,
    /// Units already drawn from this pass.
    pub used_count: u32,
}

impl AllocationBucket {
    /// Fresh bucket with nothing consumed.
    pub fn new(id: impl Into<String>, draw_count: u32) -> Self {
        Self {
            id: id.into(),
            draw_count,
            used_count: 0,
        }
    }
}

/// Staged allocation of a prize across drawing passes.
///
/// The bucket draw counts are expected to add up to the number of eligible
/// participants for the prize. That is a convention, never checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationSpec {
    /// Whether the prize is drawn in bucketed passes.
    pub enabled: bool,
    /// Passes in draw order.
    pub buckets: Vec<AllocationBucket>,
}

impl Default for AllocationSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            buckets: Vec::new(),
        }
    }
}

impl AllocationSpec {
    /// Sum of draw counts over all buckets.
    pub fn total_draws(&self) -> u64 {
        self.buckets.iter().map(|b| u64::from(b.draw_count)).sum()
    }

    fn single(draw_count: u32) -> Vec<AllocationBucket> {
        vec![AllocationBucket::new("0", draw_count)]
    }
}

/// Local view of one prize pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrizeConfig {
    /// Remote prize identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Position in the remote listing.
    pub sort_order: i32,
    /// Every participant may draw this prize, winners included.
    pub eligible_for_all: bool,
    /// Units in the pool.
    pub total_count: u32,
    /// Units already awarded; never above `total_count`.
    pub used_count: u32,
    /// Image URL, empty when unset.
    pub image: String,
    /// Free-form description.
    pub description: String,
    /// The pool is drawn out.
    pub exhausted: bool,
    /// Draw-limit buckets for this prize.
    pub allocation: AllocationSpec,
}

impl PrizeConfig {
    /// Enter configuration for this prize: consumption is reset and, unless
    /// the prize already carries a multi-bucket allocation, a single bucket
    /// covering the whole pool is seeded.
    pub fn begin_configuration(&mut self) {
        self.used_count = 0;
        self.exhausted = false;
        if self.allocation.buckets.len() > 1 {
            return;
        }
        self.allocation = AllocationSpec {
            enabled: true,
            buckets: AllocationSpec::single(self.total_count),
        };
    }

    /// Flip the drawn-out flag. Buckets are always cleared, so applying this
    /// twice restores `exhausted` and `used_count` but not the allocation.
    pub fn toggle_exhausted(&mut self) {
        self.used_count = if self.exhausted { 0 } else { self.total_count };
        self.allocation.buckets.clear();
        self.exhausted = !self.exhausted;
    }

    /// Replace the allocation with one bucket of `count` draws and restart
    /// consumption tracking. `total_count` is left as is.
    pub fn set_eligible_count(&mut self, count: u32) {
        self.allocation.buckets = AllocationSpec::single(count);
        self.used_count = if self.exhausted { self.total_count } else { 0 };
    }

    /// Replace the bucket list as given, consumption untouched.
    pub fn replace_buckets(&mut self, buckets: Vec<AllocationBucket>) {
        self.allocation.buckets = buckets;
    }

    /// Apply operator-edited descriptive fields. Lowering the pool below the
    /// used count pulls the used count down with it.
    pub fn apply_edit(&mut self, edit: PrizeEdit) {
        if let Some(name) = edit.name {
            self.name = name;
        }
        if let Some(sort_order) = edit.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(eligible_for_all) = edit.eligible_for_all {
            self.eligible_for_all = eligible_for_all;
        }
        if let Some(total_count) = edit.total_count {
            self.total_count = total_count;
            self.used_count = self.used_count.min(total_count);
        }
        if let Some(image) = edit.image {
            self.image = image;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
    }

    /// Units still available in the pool.
    pub fn remaining(&self) -> u32 {
        self.total_count.saturating_sub(self.used_count)
    }
}

/// Operator edits to the descriptive fields of a prize; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrizeEdit {
    /// New display name.
    pub name: Option<String>,
    /// New listing position.
    pub sort_order: Option<i32>,
    /// New eligibility flag.
    pub eligible_for_all: Option<bool>,
    /// New pool size.
    pub total_count: Option<u32>,
    /// New image URL.
    pub image: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Failure of a board mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The prize id is not cached.
    #[error("prize `{0}` is not in the local cache")]
    UnknownPrize(i64),
    /// A selection-only operation ran outside selection mode.
    #[error("no prize is being configured")]
    NothingSelected,
}

/// Cached prize collection for the current scope, in remote order, plus the
/// prize currently opened for allocation editing.
#[derive(Debug, Clone, Default)]
pub struct PrizeBoard {
    prizes: IndexMap<i64, PrizeConfig>,
    selected: Option<i64>,
}

impl PrizeBoard {
    /// Empty board, nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached prize and leave selection mode.
    pub fn reset(&mut self) {
        self.prizes.clear();
        self.selected = None;
    }

    /// Swap in a freshly adapted collection, discarding the previous one entirely.
    ///
    /// Selection survives only if the selected prize still exists.
    pub fn replace_all(&mut self, prizes: Vec<PrizeConfig>) {
        self.prizes = prizes.into_iter().map(|p| (p.id, p)).collect();
        if self.selected.is_some_and(|id| !self.prizes.contains_key(&id)) {
            self.selected = None;
        }
    }

    /// Cached prize by id.
    pub fn get(&self, id: i64) -> Option<&PrizeConfig> {
        self.prizes.get(&id)
    }

    /// Prizes in remote order.
    pub fn iter(&self) -> impl Iterator<Item = &PrizeConfig> {
        self.prizes.values()
    }

    /// Owned copy of every prize, in order.
    pub fn to_vec(&self) -> Vec<PrizeConfig> {
        self.prizes.values().cloned().collect()
    }

    /// Prize ids in remote order.
    pub fn ids(&self) -> Vec<i64> {
        self.prizes.keys().copied().collect()
    }

    /// Number of cached prizes.
    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    /// Whether no prize is cached.
    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    /// Prize currently opened for allocation editing.
    pub fn selected(&self) -> Option<&PrizeConfig> {
        self.selected.and_then(|id| self.prizes.get(&id))
    }

    /// Open `id` for allocation editing, see [`PrizeConfig::begin_configuration`].
    pub fn select_prize(&mut self, id: i64) -> Result<&PrizeConfig, AllocationError> {
        let prize = self
            .prizes
            .get_mut(&id)
            .ok_or(AllocationError::UnknownPrize(id))?;
        prize.begin_configuration();
        self.selected = Some(id);
        Ok(prize)
    }

    /// Flip the drawn-out flag of `id`, see [`PrizeConfig::toggle_exhausted`].
    pub fn toggle_exhausted(&mut self, id: i64) -> Result<&PrizeConfig, AllocationError> {
        let prize = self.prize_mut(id)?;
        prize.toggle_exhausted();
        Ok(prize)
    }

    /// Collapse the allocation of `id` to one bucket of `count` draws.
    pub fn set_eligible_count(
        &mut self,
        id: i64,
        count: u32,
    ) -> Result<&PrizeConfig, AllocationError> {
        let prize = self.prize_mut(id)?;
        prize.set_eligible_count(count);
        Ok(prize)
    }

    /// Store the operator-finalised buckets on `id` and leave selection mode.
    pub fn commit_buckets(
        &mut self,
        id: i64,
        buckets: Vec<AllocationBucket>,
    ) -> Result<&PrizeConfig, AllocationError> {
        if !self.prizes.contains_key(&id) {
            return Err(AllocationError::UnknownPrize(id));
        }
        self.selected = None;
        let prize = self.prize_mut(id)?;
        prize.replace_buckets(buckets);
        Ok(prize)
    }

    /// [`commit_buckets`](Self::commit_buckets) on whichever prize is selected.
    pub fn commit_selected(
        &mut self,
        buckets: Vec<AllocationBucket>,
    ) -> Result<&PrizeConfig, AllocationError> {
        let id = self.selected.ok_or(AllocationError::NothingSelected)?;
        self.commit_buckets(id, buckets)
    }

    /// Leave selection mode without touching any prize.
    pub fn cancel_selection(&mut self) {
        self.selected = None;
    }

    /// Apply descriptive edits to `id`.
    pub fn edit_prize(&mut self, id: i64, edit: PrizeEdit) -> Result<&PrizeConfig, AllocationError> {
        let prize = self.prize_mut(id)?;
        prize.apply_edit(edit);
        Ok(prize)
    }

    fn prize_mut(&mut self, id: i64) -> Result<&mut PrizeConfig, AllocationError> {
        self.prizes
            .get_mut(&id)
            .ok_or(AllocationError::UnknownPrize(id))
    }
}
