use std::fmt;
use rand::Rng;
use nohash_hasher::IntMap;
use ff_energy::EnergyModel;

use crate::LoopStructure;
use crate::PairReactionSet;
use crate::RateModel;
use crate::partial_sum::PartialSumIndex;
use crate::EngineError;

/// One elementary kinetic move. `Add` nucleates or extends a helix;
/// `Retract`/`OpenInternal` both break a pair but are rated
/// differently depending on whether the pair sat at a helix's edge
/// (exposed to a real loop) or strictly inside an unbroken stack
/// (`deltag_hr` vs `deltag_hi`); `Diffuse`/`Morph` atomically replace an
/// existing pair with a shifted one without ever passing through an
/// unpaired intermediate (`deltag_hd`, `deltag_hm`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reaction {
    Add {
        i: u16,
        j: u16,
        delta_e: i32,
        rate: f64,
    },
    Retract {
        i: u16,
        j: u16,
        delta_e: i32,
        rate: f64,
    },
    OpenInternal {
        i: u16,
        j: u16,
        delta_e: i32,
        rate: f64,
    },
    Diffuse {
        i: u16,
        j: u16,
        i_new: u16,
        j_new: u16,
        delta_e: i32,
        rate: f64,
    },
    Morph {
        i: u16,
        j: u16,
        i_new: u16,
        j_new: u16,
        delta_e: i32,
        rate: f64,
    },
}

impl Reaction {
    /// `l_chord` is the loop-local chord length the new pair nucleates
    /// across (0 signals helix extension, no closure penalty); see
    /// [`RateModel::add_rate`].
    pub fn new_add<K: RateModel>(model: &K, i: u16, j: u16, delta_e: i32, l_chord: u16) -> Self {
        let rate = model.add_rate(l_chord as usize, delta_e);
        Reaction::Add { i, j, delta_e, rate }
    }

    pub fn new_retract<K: RateModel>(model: &K, i: u16, j: u16, delta_e: i32) -> Self {
        let rate = model.retract_rate(delta_e);
        Reaction::Retract { i, j, delta_e, rate }
    }

    pub fn new_open_internal<K: RateModel>(model: &K, i: u16, j: u16, delta_e: i32) -> Self {
        let rate = model.open_internal_rate(delta_e);
        Reaction::OpenInternal { i, j, delta_e, rate }
    }

    pub fn new_diffuse<K: RateModel>(model: &K, i: u16, j: u16, i_new: u16, j_new: u16, delta_e: i32) -> Self {
        let rate = model.diffuse_rate(delta_e);
        Reaction::Diffuse { i, j, i_new, j_new, delta_e, rate }
    }

    pub fn new_morph<K: RateModel>(model: &K, i: u16, j: u16, i_new: u16, j_new: u16, delta_e: i32) -> Self {
        let rate = model.morph_rate(delta_e);
        Reaction::Morph { i, j, i_new, j_new, delta_e, rate }
    }

    /// The existing pair this reaction keys off of: the pair being
    /// formed for `Add`, or the pair being broken/shifted for every
    /// other variant.
    pub fn ij(&self) -> (u16, u16) {
        match self {
            Reaction::Add { i, j, .. }
            | Reaction::Retract { i, j, .. }
            | Reaction::OpenInternal { i, j, .. }
            | Reaction::Diffuse { i, j, .. }
            | Reaction::Morph { i, j, .. } => (*i, *j),
        }
    }

    /// For `Diffuse`/`Morph`, the pair this move replaces `ij()` with.
    pub fn shift_target(&self) -> Option<(u16, u16)> {
        match self {
            Reaction::Diffuse { i_new, j_new, .. } | Reaction::Morph { i_new, j_new, .. } => {
                Some((*i_new, *j_new))
            }
            _ => None,
        }
    }

    pub fn rate(&self) -> f64 {
        match self {
            Reaction::Add { rate, .. }
            | Reaction::Retract { rate, .. }
            | Reaction::OpenInternal { rate, .. }
            | Reaction::Diffuse { rate, .. }
            | Reaction::Morph { rate, .. } => *rate,
        }
    }

    pub fn delta_e(&self) -> i32 {
        match self {
            Reaction::Add { delta_e, .. }
            | Reaction::Retract { delta_e, .. }
            | Reaction::OpenInternal { delta_e, .. }
            | Reaction::Diffuse { delta_e, .. }
            | Reaction::Morph { delta_e, .. } => *delta_e,
        }
    }
}

fn slot_rate(rxns: &[Reaction]) -> f64 {
    rxns.iter().map(Reaction::rate).sum()
}

/// Logarithmic output-time ladder: frames are emitted every `dt`, and
/// `dt` grows ten-fold after ten frames, so early fast dynamics are
/// sampled densely while a long trajectory doesn't produce an
/// unbounded number of frames.
#[derive(Debug, Clone)]
pub struct FrameLadder {
    next_output: f64,
    dt: f64,
    frames_at_current_dt: u32,
}

impl FrameLadder {
    pub fn new() -> Self {
        Self {
            next_output: 0.0,
            dt: 1e-2,
            frames_at_current_dt: 0,
        }
    }

    /// All ladder times in `(previous call's horizon, t]`, in order,
    /// advancing the ladder state past each one returned.
    pub fn frames_up_to(&mut self, t: f64) -> Vec<f64> {
        let mut out = Vec::new();
        while self.next_output <= t {
            out.push(self.next_output);
            self.next_output += self.dt;
            self.frames_at_current_dt += 1;
            if self.frames_at_current_dt >= 10 {
                self.dt *= 10.0;
                self.frames_at_current_dt = 0;
            }
        }
        out
    }
}

impl Default for FrameLadder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct LoopStructureSSA<'a, M: EnergyModel, K: RateModel> {
    loopstructure: LoopStructure<'a, M>,
    ratemodel: &'a K,
    tree: PartialSumIndex,
    /// Candidate helix-extension/nucleation (Add) reactions, keyed by
    /// the loop they originate in.
    add_rxns: IntMap<usize, Vec<Reaction>>,
    /// Candidate Retract/OpenInternal/Diffuse/Morph reactions for every
    /// existing pair, keyed by the *outer* loop of the pair they act on.
    del_rxns: IntMap<usize, Vec<Reaction>>,
    /// Which loop currently owns the reactions for pair `i`, so they can
    /// be found and removed again without a linear scan.
    pair_owner: IntMap<u16, usize>,
}

impl<'a, M, K> fmt::Debug for LoopStructureSSA<'a, M, K>
where
    M: EnergyModel,
    K: RateModel + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopStructureSSA")
            .field("ratemodel", &self.ratemodel)
            .field("loopstructure", &format!("{}", self.loopstructure))
            .field("flux", &self.tree.total())
            .finish()
    }
}

impl<'a, M: EnergyModel, K: RateModel> From<(LoopStructure<'a, M>, &'a K)>
    for LoopStructureSSA<'a, M, K>
{
    fn from((loopstructure, ratemodel): (LoopStructure<'a, M>, &'a K)) -> Self {
        let mut ssa = Self {
            loopstructure,
            ratemodel,
            tree: PartialSumIndex::new(0),
            add_rxns: IntMap::default(),
            del_rxns: IntMap::default(),
            pair_owner: IntMap::default(),
        };

        let add_neighbors: Vec<(usize, Vec<(u16, u16, i32, u16)>)> = ssa
            .loopstructure
            .get_add_neighbors_per_loop()
            .iter()
            .map(|(lli, v)| (*lli, v.clone()))
            .collect();
        for (lli, neighbors) in add_neighbors {
            ssa.set_add_reactions(lli, neighbors);
        }

        for (i, j, rxns) in ssa.loopstructure.get_del_neighbors() {
            ssa.set_pair_reaction(i, j, rxns);
        }

        ssa
    }
}

impl<'a, M: EnergyModel, K: RateModel> LoopStructureSSA<'a, M, K> {
    pub fn current_structure(&self) -> String {
        format!("{}", self.loopstructure)
    }

    pub fn total_flux(&self) -> f64 {
        self.tree.total()
    }

    /// Recompute the total rate by a full linear scan over every
    /// candidate reaction, bypassing the partial-sum tree entirely. Used
    /// to check the tree against its own bookkeeping after a firing;
    /// never called on the hot path.
    pub fn total_rate_via_linear_scan(&self) -> f64 {
        let add_total: f64 = self.add_rxns.values().map(|v| slot_rate(v)).sum();
        let del_total: f64 = self.del_rxns.values().map(|v| slot_rate(v)).sum();
        add_total + del_total
    }

    fn slot_total(&self, lli: usize) -> f64 {
        let add = self.add_rxns.get(&lli).map(|v| slot_rate(v)).unwrap_or(0.0);
        let del = self.del_rxns.get(&lli).map(|v| slot_rate(v)).unwrap_or(0.0);
        add + del
    }

    fn sync_slot(&mut self, lli: usize) {
        let total = self.slot_total(lli);
        if total > 0.0 {
            self.tree.set(lli, total);
        } else {
            self.tree.remove(lli);
        }
    }

    fn set_add_reactions(&mut self, lli: usize, neighbors: Vec<(u16, u16, i32, u16)>) {
        if neighbors.is_empty() {
            self.add_rxns.remove(&lli);
        } else {
            let rxns = neighbors
                .into_iter()
                .map(|(i, j, delta, l_chord)| Reaction::new_add(self.ratemodel, i, j, delta, l_chord))
                .collect();
            self.add_rxns.insert(lli, rxns);
        }
        self.sync_slot(lli);
    }

    fn clear_add_reactions(&mut self, lli: usize) {
        self.add_rxns.remove(&lli);
        self.sync_slot(lli);
    }

    /// Install every reaction a single existing pair `(i, j)` offers:
    /// breaking it (as a retraction or an internal opening, depending on
    /// `rxns.is_internal`), and any valid diffusion/morph shift.
    fn set_pair_reaction(&mut self, i: u16, j: u16, rxns: PairReactionSet) {
        let owner = *self
            .loopstructure
            .loop_lookup()
            .get(&i)
            .expect("loop_lookup entry for i");

        if let Some(&old_owner) = self.pair_owner.get(&i) {
            if let Some(v) = self.del_rxns.get_mut(&old_owner) {
                v.retain(|r| r.ij().0 != i);
            }
            if old_owner != owner {
                self.sync_slot(old_owner);
            }
        }

        let mut new_rxns = Vec::with_capacity(2 + rxns.diffusion.len());
        new_rxns.push(if rxns.is_internal {
            Reaction::new_open_internal(self.ratemodel, i, j, rxns.retract_delta)
        } else {
            Reaction::new_retract(self.ratemodel, i, j, rxns.retract_delta)
        });
        for (i_new, j_new, delta) in rxns.diffusion {
            new_rxns.push(Reaction::new_diffuse(self.ratemodel, i, j, i_new, j_new, delta));
        }
        if let Some((i_new, j_new, delta)) = rxns.morph {
            new_rxns.push(Reaction::new_morph(self.ratemodel, i, j, i_new, j_new, delta));
        }

        self.del_rxns.entry(owner).or_default().extend(new_rxns);
        self.pair_owner.insert(i, owner);
        self.sync_slot(owner);
    }

    fn remove_pair_reaction(&mut self, i: u16) {
        if let Some(owner) = self.pair_owner.remove(&i) {
            if let Some(v) = self.del_rxns.get_mut(&owner) {
                v.retain(|r| r.ij().0 != i);
            }
            self.sync_slot(owner);
        }
    }

    fn select_within_loop<R: Rng + ?Sized>(&self, lli: usize, rng: &mut R) -> Option<Reaction> {
        let total = self.slot_total(lli);
        if total <= 0.0 {
            return None;
        }
        let mut target = total * rng.random::<f64>();
        if let Some(v) = self.add_rxns.get(&lli) {
            for r in v {
                let rate = r.rate();
                if target <= rate {
                    return Some(*r);
                }
                target -= rate;
            }
        }
        if let Some(v) = self.del_rxns.get(&lli) {
            for r in v {
                let rate = r.rate();
                if target <= rate {
                    return Some(*r);
                }
                target -= rate;
            }
        }
        None
    }

    /// Run the exact-event stochastic simulation up to `t_max`, calling
    /// `callback(time, total_flux, &loopstructure)` once per output-ladder
    /// frame. `callback` returning `false` stops the simulation early.
    pub fn simulate<R, F>(
        &mut self,
        rng: &mut R,
        t_max: f64,
        callback: F,
    ) -> Result<(), EngineError>
    where
        R: Rng + ?Sized,
        F: FnMut(f64, f64, &LoopStructure<'a, M>) -> bool,
    {
        self.simulate_to_target(rng, t_max, None, callback)
    }

    /// As [`Self::simulate`], but additionally checked against `target` (a
    /// dot-bracket string) right after every reaction fires, independent of
    /// the output-ladder frame schedule. A match emits one final frame at
    /// the current time and stops the trajectory, matching the
    /// `fld_stop` early-termination configuration field.
    pub fn simulate_to_target<R, F>(
        &mut self,
        rng: &mut R,
        t_max: f64,
        target: Option<&str>,
        mut callback: F,
    ) -> Result<(), EngineError>
    where
        R: Rng + ?Sized,
        F: FnMut(f64, f64, &LoopStructure<'a, M>) -> bool,
    {
        let mut t = 0.0;
        let mut ladder = FrameLadder::new();

        loop {
            let total = self.tree.total();
            if total <= 0.0 {
                return Ok(());
            }

            let tinc = -rng.random::<f64>().ln() / total;
            let t_next = t + tinc;
            let horizon = t_next.min(t_max);
            for frame in ladder.frames_up_to(horizon) {
                if !callback(frame, total, &self.loopstructure) {
                    return Ok(());
                }
            }
            if t_next >= t_max {
                return Ok(());
            }
            t = t_next;

            let sample = total * rng.random::<f64>();
            let lli = self.tree.find(sample).ok_or_else(|| {
                EngineError::InternalInvariantViolated(
                    "partial-sum tree selected no loop despite positive total flux".to_string(),
                )
            })?;
            let rxn = self.select_within_loop(lli, rng).ok_or_else(|| {
                EngineError::InternalInvariantViolated(format!(
                    "loop {lli} selected by partial-sum tree holds no reactions"
                ))
            })?;

            match rxn {
                Reaction::Add { i, j, .. } => {
                    let ((oid, outer_neighbors), (iid, inner_neighbors), pair_changes) =
                        self.loopstructure.apply_add_move(i, j);
                    self.set_add_reactions(oid, outer_neighbors);
                    self.set_add_reactions(iid, inner_neighbors);
                    for (pi, pj, rxns) in pair_changes {
                        self.set_pair_reaction(pi, pj, rxns);
                    }
                }
                Reaction::Retract { i, j, .. } | Reaction::OpenInternal { i, j, .. } => {
                    let freed = *self
                        .loopstructure
                        .loop_lookup()
                        .get(&j)
                        .expect("loop_lookup entry for j");
                    self.remove_pair_reaction(i);
                    let ((oid, neighbors), pair_changes) = self.loopstructure.apply_del_move(i, j);
                    self.clear_add_reactions(freed);
                    self.set_add_reactions(oid, neighbors);
                    for (pi, pj, rxns) in pair_changes {
                        self.set_pair_reaction(pi, pj, rxns);
                    }
                }
                Reaction::Diffuse { i, j, i_new, j_new, .. }
                | Reaction::Morph { i, j, i_new, j_new, .. } => {
                    self.remove_pair_reaction(i);
                    let ((oid, outer_neighbors), (iid, inner_neighbors), pair_changes) =
                        self.loopstructure.apply_shift_move(i, j, i_new, j_new);
                    self.set_add_reactions(oid, outer_neighbors);
                    self.set_add_reactions(iid, inner_neighbors);
                    for (pi, pj, rxns) in pair_changes {
                        self.set_pair_reaction(pi, pj, rxns);
                    }
                }
            }

            if let Some(want) = target {
                if self.loopstructure.to_string() == want {
                    let total_after = self.tree.total();
                    callback(t, total_after, &self.loopstructure);
                    return Ok(());
                }
            }
        }
    }
}
