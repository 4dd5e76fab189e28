pub mod arith;
pub mod error;
pub mod factorization;
pub mod field;
pub mod group;
pub mod mapping;
pub mod params;
pub mod slot_ring;
pub mod variant;


pub use error::{Result, SlotAlgebraError};
pub use field::{ExtRing, Gf2, PolyOf, PolyRingOf, RepresentationTag, ScalarRing};
pub use group::{Generator, GroupStructure};
pub use mapping::SlotMapping;
pub use params::AlgebraParams;
pub use slot_ring::{MappingOf, SlotRing};
pub use variant::{RingVariant, VariantMapping};

/// Builds the slot algebra for (m, p, r) with every table ready for use.
/// The returned ring can be shared across threads without further setup.
pub fn setup_slot_algebra(m: u64, p: u64, r: u32) -> Result<RingVariant> {
    let params = AlgebraParams::new(m, p, r)?;
    let ring = params.build_ring()?;

    // Build the memoized CRT and mask tables up front
    ring.prepare();
    Ok(ring)
}
