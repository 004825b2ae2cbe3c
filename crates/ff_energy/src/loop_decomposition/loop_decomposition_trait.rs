
use ff_structure::PairTable;
use crate::NearestNeighborLoop;

pub trait LoopDecomposition {
    fn for_each_loop<F: FnMut(&NearestNeighborLoop)>(&self, f: F);

    fn loops(&self) -> Vec<NearestNeighborLoop> {
        let mut out = Vec::new();
        self.for_each_loop(|l| out.push(l.clone()));
        out
    }

    fn loop_enclosed_by(&self, closing: Option<(usize, usize)>) -> NearestNeighborLoop;

    fn get_enclosing_pair(&self, i: usize, j: usize) -> Option<(usize, usize)>;
}

impl LoopDecomposition for PairTable {
    fn for_each_loop<F: FnMut(&NearestNeighborLoop)>(&self, mut f: F) {
        fn recurse<F: FnMut(&NearestNeighborLoop)>(
            pt: &PairTable,
            closing: Option<(usize, usize)>,
            f: &mut F,
        ) {
            let mut branches = Vec::new();

            let (mut p, j) = if let Some((i, j)) = closing {
                (i + 1, j)
            } else {
                (0, pt.len())
            };

            while p < j {
                if let Some(q) = pt[p] {
                    debug_assert!(q > p);
                    branches.push((p, q));
                    recurse(pt, Some((p, q)), f);
                    p = q + 1;
                } else {
                    p += 1;
                }
            }
            f(&NearestNeighborLoop::classify(closing, branches));
        }
        recurse(self, None, &mut f);
    }

    fn loop_enclosed_by(&self, closing: Option<(usize, usize)>
    ) -> NearestNeighborLoop {
        let mut branches = Vec::new();

        let (mut p, j) = if let Some((i, j)) = closing {
            (i + 1, j)
        } else {
            (0, self.len())
        };

        while p < j {
            if let Some(q) = self[p] {
                debug_assert!(q > p);
                branches.push((p, q));
                p = q + 1;
            } else {
                p += 1;
            }
        }
        NearestNeighborLoop::classify(closing, branches)
    }

    fn get_enclosing_pair(&self, i: usize, j: usize) -> Option<(usize, usize)> {
        for q in j..self.len() {
            if let Some(p) = self[q] {
                if p < i {
                    return Some((p, q));
                }
            }
        }
        None
    }
}
