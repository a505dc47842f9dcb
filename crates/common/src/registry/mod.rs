//! Owner-scoped registry records
//!
//! Every owner has exactly one record, at an address derived from a domain tag
//! and their public key. Records are created and replaced through signed
//! instructions that the [`RegistryProgram`] validates against the account
//! currently stored at that address.

mod address;
mod instruction;
mod program;
mod record;

pub use address::{
    create_program_address, derive, find_program_address, is_on_curve, AddressError,
    DerivedAddress, ProgramId, RegistryAddress, ADDRESS_SIZE, MAX_SEEDS, MAX_SEED_LEN,
};
pub use instruction::{Instruction, SignedInstruction};
pub use program::{RegistryProgram, RejectReason, Transition};
pub use record::{discriminator, Account, Record, RecordError, Slot, MAX_URI_LEN};

/// Domain tag records are derived under unless configured otherwise
pub const DEFAULT_DOMAIN_TAG: &str = "user";
