pub const MAX_FACILITIES: usize = 10_000;
pub const MAX_FACILITY_ID_LEN: usize = 256;
/// Sub-bookings per compound request. Each one is a distinct facility.
pub const MAX_COMPOUND_SIZE: usize = 64;
