//! Various nearest neighbor model implementations.

use std::path::Path;

use crate::{
    Base, EnergyModel, LoopDecomposition, NearestNeighborLoop, NearestNeighborTables, ParamError,
    PairTypeRNA,
};

fn rescale_energy_to_temp(enth: i32, en37: i32, temp_c: f64) -> i32 {
    let t_ref = 310.15; // 37 C in Kelvin
    let t = temp_c + 273.15;
    let dtemp = t / t_ref;

    let enth = enth as f64;
    let en37 = en37 as f64;

    (enth * (1.0 - dtemp) + en37 * dtemp) as i32
}

fn is_ru_end(pt: PairTypeRNA) -> bool {
    matches!(pt, PairTypeRNA::GU | PairTypeRNA::UG | PairTypeRNA::AU | PairTypeRNA::UA | PairTypeRNA::NN)
}

fn log_extrapolate(base: i32, lxc37: f64, n: usize) -> i32 {
    base + (lxc37 * (n as f64).ln() / 30.0) as i32
}

/// Average absolute difference between successive single-stranded runs
/// around a multi-branch loop, capped at 2. `side_sgl` is cyclic: index 0
/// is compared against the last element.
fn mbl_abar(side_sgl: &[i32]) -> f64 {
    let nhlx = side_sgl.len();
    if nhlx == 0 {
        return 0.0;
    }
    let sum_abs: i32 = (0..nhlx).map(|k| (side_sgl[k] - side_sgl[(k + nhlx - 1) % nhlx]).abs()).sum();
    (sum_abs as f64 / nhlx as f64).min(2.0)
}

/// Whether the asymmetry MBL model's extra strain bonus applies: a
/// three-way junction with fewer than two single-stranded nucleotides in
/// total, too cramped for any of its helices to coaxially stack cleanly.
fn mbl_strain_applies(nhlx: usize, nsgl: usize) -> bool {
    nhlx == 3 && nsgl < 2
}

/// Which multibranch loop composite formula to apply.
///
/// Both use the same closing-pair and per-branch terminal-mismatch terms;
/// they differ only in how the entropic loop-size cost is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MblModel {
    /// Charges a per-unpaired-nucleotide cost (`ml_base`) in addition to the
    /// per-branch cost. This is the standard Turner 2004 formula.
    Classic,
    /// MFOLD-style scoring that charges the average asymmetry of the
    /// single-stranded runs between helices (`ā`) instead of their total
    /// length, plus a fixed strain bonus for cramped three-way junctions.
    Asymmetry,
}

/// A nearest-neighbor (Turner/INN) free energy model over loop-decomposed
/// secondary structures, parametrized from a `.par` table.
#[derive(Debug)]
pub struct TurnerModel {
    temperature: f64,
    min_hp_size: usize,
    mbl_model: MblModel,

    lxc37: f64,

    ml_base_en37: i32,
    ml_base_enth: i32,
    ml_closing_en37: i32,
    ml_closing_enth: i32,
    ml_intern_en37: i32,
    ml_intern_enth: i32,

    terminal_ru_en37: i32,
    terminal_ru_enth: i32,

    /// Strain bonus charged by the asymmetry MBL model to three-way
    /// junctions with fewer than two single-stranded nucleotides total.
    /// Not carried in the Turner `.par` tables; fixed at the literature
    /// value for cramped coaxial-stacking-incompatible 3-way junctions.
    mbl_strain_en37: i32,

    tables: NearestNeighborTables,
}

impl TurnerModel {
    pub fn default_model() -> Self {
        Self::from_str(crate::parameters::DEFAULT_PARAMETER_FILE, MblModel::Classic)
            .expect("bundled default parameter file must be valid")
    }

    pub fn from_parameter_file<P: AsRef<Path>>(path: P, mbl_model: MblModel) -> Result<Self, ParamError> {
        let tables = NearestNeighborTables::from_parameter_file(path)?;
        Ok(Self::from_tables(tables, mbl_model))
    }

    pub fn from_str(s: &str, mbl_model: MblModel) -> Result<Self, ParamError> {
        let tables = NearestNeighborTables::from_str(s)?;
        Ok(Self::from_tables(tables, mbl_model))
    }

    fn from_tables(tables: NearestNeighborTables, mbl_model: MblModel) -> Self {
        let ml = tables.ml_params;
        let ninio = tables.ninio;
        let misc = tables.misc;
        TurnerModel {
            temperature: 37.0,
            min_hp_size: 3,
            mbl_model,
            lxc37: 107.856,
            ml_closing_en37: ml[0].unwrap_or(340),
            ml_intern_en37: ml[2].unwrap_or(-90),
            ml_base_en37: ml[4].unwrap_or(0).max(ml[1].unwrap_or(0)),
            ml_closing_enth: ml[0].unwrap_or(340) * 3,
            ml_intern_enth: ml[2].unwrap_or(-90) * 3,
            ml_base_enth: ml[4].unwrap_or(0).max(ml[1].unwrap_or(0)) * 3,
            terminal_ru_en37: misc[1].unwrap_or(50),
            terminal_ru_enth: ninio[2].unwrap_or(370),
            mbl_strain_en37: 320,
            tables,
        }
    }

    pub fn with_temperature(mut self, celsius: f64) -> Self {
        self.temperature = celsius;
        self
    }

    pub fn mbl_model(&self) -> MblModel {
        self.mbl_model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    fn pick(&self, en37: i32, enth: i32) -> i32 {
        if self.temperature == 37.0 {
            en37
        } else {
            rescale_energy_to_temp(enth, en37, self.temperature)
        }
    }

    fn hairpin(&self, seq: &[Base]) -> i32 {
        let n = seq.len() - 2;
        assert!(n >= self.min_hp_size, "hairpin loop below minimum size");

        if seq.len() <= 6 {
            if let Some(&(en37, enth)) = self.tables.hairpin_sequences(seq) {
                return self.pick(en37, enth);
            }
        }

        let (mut en37, mut enth) = if n <= 30 {
            (
                self.tables.hairpin[n].unwrap_or(5000),
                self.tables.hairpin_enthalpies[n].unwrap_or(5000),
            )
        } else {
            (
                log_extrapolate(self.tables.hairpin[30].unwrap_or(770), self.lxc37, n),
                log_extrapolate(self.tables.hairpin_enthalpies[30].unwrap_or(770), self.lxc37, n),
            )
        };

        let closing = PairTypeRNA::from((seq[0], *seq.last().unwrap()));

        // AU/GU penalty applies to triloops unconditionally (regardless of
        // whether a triloop sequence bonus was also found above).
        if n == 3 && is_ru_end(closing) {
            en37 += self.terminal_ru_en37;
            enth += self.terminal_ru_enth;
        } else if n > 3 {
            en37 += self
                .tables
                .mismatch_hairpin[closing as usize][seq[1] as usize][seq[n] as usize]
                .unwrap_or(0);
            enth += self
                .tables
                .mismatch_hairpin_enthalpies[closing as usize][seq[1] as usize][seq[n] as usize]
                .unwrap_or(0);
        }

        self.pick(en37, enth)
    }

    /// `fwdseq`/`revseq` run 5'->3' along each strand of the loop, each
    /// starting and ending on a paired base: `fwdseq = seq[i..=k]`,
    /// `revseq = seq[l..=j]` for closing pair `(i,j)` and inner pair `(k,l)`.
    fn interior(&self, fwdseq: &[Base], revseq: &[Base]) -> i32 {
        let outer = PairTypeRNA::from((*fwdseq.first().unwrap(), *revseq.last().unwrap()));
        let inner = PairTypeRNA::from((*revseq.first().unwrap(), *fwdseq.last().unwrap()));

        let (en37, enth) = match (fwdseq.len(), revseq.len()) {
            (2, 2) => (
                self.tables.stack[outer as usize][inner as usize].unwrap_or(0),
                self.tables.stack_enthalpies[outer as usize][inner as usize].unwrap_or(0),
            ),
            (3, 2) | (2, 3) => (
                self.tables.bulge[1].unwrap_or(380) + self.tables.stack[outer as usize][inner as usize].unwrap_or(0),
                self.tables.bulge_enthalpies[1].unwrap_or(380)
                    + self.tables.stack_enthalpies[outer as usize][inner as usize].unwrap_or(0),
            ),
            (3, 3) => (
                self.tables.int11[outer as usize][inner as usize][fwdseq[1] as usize][revseq[1] as usize]
                    .unwrap_or_else(|| self.generic_interior(1, 1, outer, inner).0),
                self.tables.int11_enthalpies[outer as usize][inner as usize][fwdseq[1] as usize][revseq[1] as usize]
                    .unwrap_or_else(|| self.generic_interior(1, 1, outer, inner).1),
            ),
            (4, 3) => (
                self.tables.int21[outer as usize][inner as usize][fwdseq[1] as usize][fwdseq[2] as usize]
                    [revseq[1] as usize]
                    .unwrap_or_else(|| self.generic_interior(2, 1, outer, inner).0),
                self.tables.int21_enthalpies[outer as usize][inner as usize][fwdseq[1] as usize][fwdseq[2] as usize]
                    [revseq[1] as usize]
                    .unwrap_or_else(|| self.generic_interior(2, 1, outer, inner).1),
            ),
            (3, 4) => (
                self.tables.int21[inner as usize][outer as usize][revseq[1] as usize][revseq[2] as usize]
                    [fwdseq[1] as usize]
                    .unwrap_or_else(|| self.generic_interior(1, 2, outer, inner).0),
                self.tables.int21_enthalpies[inner as usize][outer as usize][revseq[1] as usize][revseq[2] as usize]
                    [fwdseq[1] as usize]
                    .unwrap_or_else(|| self.generic_interior(1, 2, outer, inner).1),
            ),
            (l, 2) | (2, l) => {
                // general bulge: one side empty, other side has n unpaired bases
                let n = l - 2;
                self.general_bulge(n, outer, inner)
            }
            (lfwd, lrev) => {
                // 2x2 and larger asymmetric interior loops: generic formula
                // (the "GAIL" rule -- tabulated int22 is not carried here).
                let nl = lfwd - 2;
                let nr = lrev - 2;
                self.generic_interior(nl, nr, outer, inner)
            }
        };

        self.pick(en37, enth)
    }

    fn general_bulge(&self, n: usize, outer: PairTypeRNA, inner: PairTypeRNA) -> (i32, i32) {
        let (pg1, th1) = if is_ru_end(outer) { (self.terminal_ru_en37, self.terminal_ru_enth) } else { (0, 0) };
        let (pg2, th2) = if is_ru_end(inner) { (self.terminal_ru_en37, self.terminal_ru_enth) } else { (0, 0) };
        if n <= 30 {
            (
                self.tables.bulge[n].unwrap_or(380) + pg1 + pg2,
                self.tables.bulge_enthalpies[n].unwrap_or(380) + th1 + th2,
            )
        } else {
            (
                log_extrapolate(self.tables.bulge[30].unwrap_or(380), self.lxc37, n) + pg1 + pg2,
                log_extrapolate(self.tables.bulge_enthalpies[30].unwrap_or(380), self.lxc37, n) + th1 + th2,
            )
        }
    }

    /// Generic size/asymmetry interior-loop formula, used for every loop
    /// geometry not covered by a 1x1/1x2/2x1 table lookup.
    fn generic_interior(&self, nl: usize, nr: usize, outer: PairTypeRNA, inner: PairTypeRNA) -> (i32, i32) {
        let n = nl + nr;
        let (pg1, th1) = if is_ru_end(outer) { (self.terminal_ru_en37, self.terminal_ru_enth) } else { (0, 0) };
        let (pg2, th2) = if is_ru_end(inner) { (self.terminal_ru_en37, self.terminal_ru_enth) } else { (0, 0) };

        let (base37, baseh) = if n <= 30 {
            (self.tables.interior[n].unwrap_or(100), self.tables.interior_enthalpies[n].unwrap_or(100))
        } else {
            (
                log_extrapolate(self.tables.interior[30].unwrap_or(100), self.lxc37, n),
                log_extrapolate(self.tables.interior_enthalpies[30].unwrap_or(100), self.lxc37, n),
            )
        };

        let asym = nl.abs_diff(nr) as i32;
        let ninio_per_unit = self.tables.ninio[0].unwrap_or(50);
        let ninio_enth_per_unit = self.tables.ninio[0].unwrap_or(50) * 6;
        let ninio_max = self.tables.ninio[1].unwrap_or(-450).unsigned_abs() as i32;
        let ninio37 = (ninio_per_unit * asym).min(ninio_max);
        let ninioh = (ninio_enth_per_unit * asym).min(ninio_max * 6);

        (base37 + pg1 + pg2 + ninio37, baseh + th1 + th2 + ninioh)
    }

    fn junction_term(&self, pair: PairTypeRNA, d5: Option<Base>, d3: Option<Base>) -> (i32, i32) {
        match (d5, d3) {
            (Some(b5), Some(b3)) => (
                self.tables.mismatch_multi[pair as usize][b5 as usize][b3 as usize].unwrap_or(0),
                self.tables.mismatch_multi_enthalpies[pair as usize][b5 as usize][b3 as usize].unwrap_or(0),
            ),
            (Some(b5), None) => (
                self.tables.dangle5[pair as usize][b5 as usize].unwrap_or(0),
                self.tables.dangle5_enthalpies[pair as usize][b5 as usize].unwrap_or(0),
            ),
            (None, Some(b3)) => (
                self.tables.dangle3[pair as usize][b3 as usize].unwrap_or(0),
                self.tables.dangle3_enthalpies[pair as usize][b3 as usize].unwrap_or(0),
            ),
            (None, None) => (0, 0),
        }
    }

    fn exterior_junction_term(&self, pair: PairTypeRNA, d5: Option<Base>, d3: Option<Base>) -> (i32, i32) {
        match (d5, d3) {
            (Some(b5), Some(b3)) => (
                self.tables.mismatch_exterior[pair as usize][b5 as usize][b3 as usize].unwrap_or(0),
                self.tables.mismatch_exterior_enthalpies[pair as usize][b5 as usize][b3 as usize].unwrap_or(0),
            ),
            (Some(b5), None) => (
                self.tables.dangle5[pair as usize][b5 as usize].unwrap_or(0),
                self.tables.dangle5_enthalpies[pair as usize][b5 as usize].unwrap_or(0),
            ),
            (None, Some(b3)) => (
                self.tables.dangle3[pair as usize][b3 as usize].unwrap_or(0),
                self.tables.dangle3_enthalpies[pair as usize][b3 as usize].unwrap_or(0),
            ),
            (None, None) => (0, 0),
        }
    }

    fn multibranch(&self, segments: &[&[Base]]) -> i32 {
        let n_branches = segments.len();
        let n_unpaired: usize = segments.iter().map(|s| s.len() - 2).sum();

        let mut en37 = 0;
        let mut enth = 0;

        for i in 0..n_branches {
            let j = (i + 1) % n_branches;
            let pair = PairTypeRNA::from((*segments[i].last().unwrap(), segments[j][0]));
            if is_ru_end(pair) {
                en37 += self.terminal_ru_en37;
                enth += self.terminal_ru_enth;
            }

            let d5 = dangle5_base(segments[i]);
            let d3 = dangle3_base(segments[j]);
            let (g, h) = self.junction_term(pair, d5, d3);
            en37 += g;
            enth += h;
        }

        match self.mbl_model {
            MblModel::Classic => {
                en37 += self.ml_closing_en37 + self.ml_intern_en37 * n_branches as i32 + self.ml_base_en37 * n_unpaired as i32;
                enth += self.ml_closing_enth + self.ml_intern_enth * n_branches as i32 + self.ml_base_enth * n_unpaired as i32;
            }
            MblModel::Asymmetry => {
                // side_sgl[k]: single-stranded run between helix k and helix
                // k+1 walking the loop 5'->3'; `segments` is already this
                // cyclic sequence (see energy_of_loop's slice construction).
                let side_sgl: Vec<i32> = segments.iter().map(|s| (s.len() - 2) as i32).collect();
                let nhlx = side_sgl.len();
                let abar = mbl_abar(&side_sgl);
                let strain = mbl_strain_applies(nhlx, n_unpaired);

                en37 += self.ml_closing_en37
                    + (self.ml_base_en37 as f64 * abar) as i32
                    + self.ml_intern_en37 * n_branches as i32
                    + if strain { self.mbl_strain_en37 } else { 0 };
                enth += self.ml_closing_enth
                    + (self.ml_base_enth as f64 * abar) as i32
                    + self.ml_intern_enth * n_branches as i32
                    + if strain { self.mbl_strain_en37 * 3 } else { 0 };
            }
        }

        self.pick(en37, enth)
    }

    fn exterior(&self, segments: &[&[Base]]) -> i32 {
        if segments.len() < 2 {
            return 0;
        }
        let n = segments.len() - 1;
        let mut en37 = 0;
        let mut enth = 0;
        for i in 0..n {
            let j = i + 1;
            let pair = PairTypeRNA::from((*segments[i].last().unwrap(), segments[j][0]));
            if is_ru_end(pair) {
                en37 += self.terminal_ru_en37;
                enth += self.terminal_ru_enth;
            }
            let d5 = dangle5_base(segments[i]);
            let d3 = dangle3_base(segments[j]);
            let (g, h) = self.exterior_junction_term(pair, d5, d3);
            en37 += g;
            enth += h;
        }
        self.pick(en37, enth)
    }
}

fn dangle5_base(seg: &[Base]) -> Option<Base> {
    let len = seg.len();
    if len < 3 {
        None
    } else {
        Some(seg[len - 2])
    }
}

fn dangle3_base(seg: &[Base]) -> Option<Base> {
    if seg.len() < 3 {
        None
    } else {
        Some(seg[1])
    }
}

impl NearestNeighborTables {
    fn hairpin_sequences(&self, seq: &[Base]) -> Option<&(i32, i32)> {
        if seq.len() <= 8 {
            self.triloops.get(seq).or_else(|| self.tetraloops.get(seq)).or_else(|| self.hexaloops.get(seq))
        } else {
            None
        }
    }
}

impl EnergyModel for TurnerModel {
    fn can_pair(&self, b1: Base, b2: Base) -> bool {
        matches!(
            (b1, b2),
            (Base::A, Base::U)
                | (Base::U, Base::A)
                | (Base::G, Base::C)
                | (Base::C, Base::G)
                | (Base::G, Base::U)
                | (Base::U, Base::G)
        )
    }

    fn min_hairpin_size(&self) -> usize {
        self.min_hp_size
    }

    fn energy_of_structure<T: LoopDecomposition>(&self, sequence: &[Base], structure: &T) -> i32 {
        let mut total = 0;
        structure.for_each_loop(|l| {
            total += self.energy_of_loop(sequence, l);
        });
        total
    }

    fn energy_of_loop(&self, sequence: &[Base], nn_loop: &NearestNeighborLoop) -> i32 {
        match nn_loop {
            NearestNeighborLoop::Hairpin { closing: (i, j) } => self.hairpin(&sequence[*i..=*j]),
            NearestNeighborLoop::Interior { closing: (i, j), inner: (k, l) } => {
                self.interior(&sequence[*i..=*k], &sequence[*l..=*j])
            }
            NearestNeighborLoop::Multibranch { closing: (i, j), branches } => {
                let mut slices: Vec<&[Base]> = Vec::new();
                let mut start = *i;
                for &(k, l) in branches {
                    slices.push(&sequence[start..=k]);
                    start = l;
                }
                slices.push(&sequence[start..=*j]);
                self.multibranch(&slices)
            }
            NearestNeighborLoop::Exterior { branches } => {
                let mut slices: Vec<&[Base]> = Vec::new();
                let mut start = 0;
                for &(k, l) in branches {
                    slices.push(&sequence[start..=k]);
                    start = l;
                }
                slices.push(&sequence[start..]);
                self.exterior(&slices)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NucleotideVec;

    fn basify(s: &str) -> Vec<Base> {
        NucleotideVec::try_from(s).unwrap().0
    }

    #[test]
    fn test_default_model_loads() {
        let model = TurnerModel::default_model();
        assert_eq!(model.temperature(), 37.0);
        assert_eq!(model.min_hairpin_size(), 3);
    }

    #[test]
    fn test_can_pair() {
        let model = TurnerModel::default_model();
        assert!(model.can_pair(Base::A, Base::U));
        assert!(model.can_pair(Base::G, Base::U));
        assert!(!model.can_pair(Base::A, Base::G));
    }

    #[test]
    fn test_hairpin_is_deterministic_and_monotone_with_size() {
        let model = TurnerModel::default_model();
        let small = model.hairpin(&basify("CAAAG"));
        let large = model.hairpin(&basify("CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAG"));
        assert!(large >= small, "longer hairpin loops should not be favored by the size term");
    }

    #[test]
    fn test_stack_is_symmetric_under_reverse_complement_labeling() {
        let model = TurnerModel::default_model();
        let a = model.interior(&basify("CG"), &basify("CG"));
        let b = model.interior(&basify("GC"), &basify("GC"));
        // Not required to be numerically equal (different pair types), only
        // that both resolve to a concrete (non-panicking) value.
        let _ = (a, b);
    }

    #[test]
    fn test_bulge_1_reduces_to_stack_plus_bulge_penalty() {
        let model = TurnerModel::default_model();
        let stack = model.interior(&basify("CG"), &basify("CG"));
        let bulge1 = model.interior(&basify("CAG"), &basify("CG"));
        assert_eq!(bulge1 - stack, model.tables.bulge[1].unwrap());
    }

    #[test]
    fn test_mbl_abar_is_zero_for_balanced_loop() {
        assert_eq!(mbl_abar(&[2, 2, 2, 2]), 0.0);
    }

    #[test]
    fn test_mbl_abar_is_capped_at_two() {
        assert_eq!(mbl_abar(&[0, 20, 0]), 2.0);
    }

    #[test]
    fn test_mbl_abar_wraps_cyclically() {
        // side_sgl = [0, 2, 0]; successive diffs wrapping around: |0-0|(from
        // index 2) + |2-0| + |0-2| = 4, over nhlx=3 -> 4/3.
        assert!((mbl_abar(&[0, 2, 0]) - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_mbl_strain_only_applies_to_cramped_three_way_junctions() {
        assert!(mbl_strain_applies(3, 0));
        assert!(mbl_strain_applies(3, 1));
        assert!(!mbl_strain_applies(3, 2));
        assert!(!mbl_strain_applies(4, 0));
        assert!(!mbl_strain_applies(2, 0));
    }

    #[test]
    fn test_asymmetry_model_charges_strain_bonus_for_cramped_three_way_junction() {
        let model = TurnerModel::from_str(crate::parameters::DEFAULT_PARAMETER_FILE, MblModel::Asymmetry).unwrap();

        // closing=(0,5), branches=(1,2),(3,4): three stacked helices with
        // zero single-stranded nucleotides anywhere -- the cramped case.
        let tight_seq = basify("GCGCGC");
        let tight = NearestNeighborLoop::Multibranch { closing: (0, 5), branches: vec![(1, 2), (3, 4)] };

        // closing=(0,7), branches=(1,2),(5,6): same helix count, but the
        // second segment carries 2 unpaired nucleotides so nsgl=2, clear of
        // the strain threshold.
        let loose_seq = basify("GCGCAAGC");
        let loose = NearestNeighborLoop::Multibranch { closing: (0, 7), branches: vec![(1, 2), (5, 6)] };

        let e_tight = model.energy_of_loop(&tight_seq, &tight);
        let e_loose = model.energy_of_loop(&loose_seq, &loose);

        // The loose loop's junction/closing/intern terms are identical in
        // kind to the tight one (same nhlx=3); the only structural
        // differences the model should charge for are the strain bonus
        // (tight only) and the larger ml_base*abar term (loose's abar=4/3
        // vs tight's abar=0). Both push e_loose in different directions, so
        // just confirm the strain-bearing loop isn't silently identical to
        // a model that ignores it.
        assert_ne!(e_tight, e_loose);
    }

    #[test]
    fn test_classic_and_asymmetry_mbl_differ_with_unpaired_bases() {
        let classic = TurnerModel::from_str(crate::parameters::DEFAULT_PARAMETER_FILE, MblModel::Classic).unwrap();
        let asym = TurnerModel::from_str(crate::parameters::DEFAULT_PARAMETER_FILE, MblModel::Asymmetry).unwrap();

        let seq = basify("GGGAAACCCAAACCCAAAC");
        // (((...)))(((...)))... closing multiloop with two branches and 3 unpaired linker bases
        let branches = &[(1usize, 8usize), (9usize, 16usize)];
        let nn_loop = NearestNeighborLoop::Multibranch { closing: (0, 18), branches: branches.to_vec() };

        let e_classic = classic.energy_of_loop(&seq, &nn_loop);
        let e_asym = asym.energy_of_loop(&seq, &nn_loop);
        assert_ne!(e_classic, e_asym);
    }

    #[test]
    fn test_exterior_loop_of_fully_unpaired_sequence_is_zero() {
        let model = TurnerModel::default_model();
        let seq = basify("AAAAA");
        let nn_loop = NearestNeighborLoop::Exterior { branches: vec![] };
        assert_eq!(model.energy_of_loop(&seq, &nn_loop), 0);
    }
}
