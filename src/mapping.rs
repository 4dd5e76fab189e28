use feanor_math::matrix::OwnedMatrix;
use feanor_math::ring::*;

use crate::field::{PolyOf, ScalarRing};

/// Encode/decode tables between an extension R[X]/G and every slot
///
/// Only `SlotRing::map_to_slots` builds one. `forward_maps[i]` is the image of
/// the root of G in slot i, so a value α(x) of R[X]/G lands in slot i as
/// α(forward_maps[i]) mod F_i. `backward_maps[i]` is a deg G × ord_p matrix
/// taking the coefficient vector of a slot residue back to the coefficients
/// of α.
pub struct SlotMapping<R: ScalarRing> {
    g: PolyOf<R>,
    deg_g: usize,
    forward_maps: Vec<PolyOf<R>>,
    backward_maps: Vec<OwnedMatrix<El<R>>>,
}

impl<R: ScalarRing> SlotMapping<R> {
    pub(crate) fn new(
        g: PolyOf<R>,
        deg_g: usize,
        forward_maps: Vec<PolyOf<R>>,
        backward_maps: Vec<OwnedMatrix<El<R>>>,
    ) -> Self {
        Self {
            g,
            deg_g,
            forward_maps,
            backward_maps,
        }
    }

    /// The monic extension generator G
    pub fn g(&self) -> &PolyOf<R> {
        &self.g
    }

    pub fn deg_g(&self) -> usize {
        self.deg_g
    }

    pub fn forward_maps(&self) -> &[PolyOf<R>] {
        &self.forward_maps
    }

    pub fn backward_maps(&self) -> &[OwnedMatrix<El<R>>] {
        &self.backward_maps
    }
}
