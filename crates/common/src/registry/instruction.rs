use crate::crypto::{IntegrityDigest, PublicKey, SecretKey, Signature};

use super::address::{ProgramId, RegistryAddress};

const SIGNING_DOMAIN: &[u8] = b"sealpoint-registry-ix/v1";

/// Operation requested of the registry program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Create the owner's record, or replace it in full
    Upsert {
        data_hash: IntegrityDigest,
        uri: String,
    },
    /// Remove the owner's record
    Close,
}

impl Instruction {
    fn tag(&self) -> u8 {
        match self {
            Instruction::Upsert { .. } => 0,
            Instruction::Close => 1,
        }
    }
}

/// An instruction bound to a program, address and revision, signed by its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInstruction {
    pub program_id: ProgramId,
    pub address: RegistryAddress,
    pub owner: PublicKey,
    /// Revision the signer last observed; `None` expects no record
    pub expected_revision: Option<u64>,
    pub instruction: Instruction,
    pub signature: Signature,
}

impl SignedInstruction {
    pub fn sign(
        secret: &SecretKey,
        program_id: ProgramId,
        address: RegistryAddress,
        expected_revision: Option<u64>,
        instruction: Instruction,
    ) -> Self {
        let owner = secret.public();
        let message =
            signing_message(&program_id, &address, &owner, expected_revision, &instruction);
        let signature = secret.sign(&message);
        Self {
            program_id,
            address,
            owner,
            expected_revision,
            instruction,
            signature,
        }
    }

    /// Whether `signature` is the owner's signature over every other field.
    pub fn verify(&self) -> bool {
        let message = signing_message(
            &self.program_id,
            &self.address,
            &self.owner,
            self.expected_revision,
            &self.instruction,
        );
        self.owner.verify(&message, &self.signature).is_ok()
    }
}

fn signing_message(
    program_id: &ProgramId,
    address: &RegistryAddress,
    owner: &PublicKey,
    expected_revision: Option<u64>,
    instruction: &Instruction,
) -> Vec<u8> {
    let mut msg = Vec::with_capacity(SIGNING_DOMAIN.len() + 32 * 4 + 16);
    msg.extend_from_slice(SIGNING_DOMAIN);
    msg.extend_from_slice(program_id.as_bytes());
    msg.extend_from_slice(address.as_bytes());
    msg.extend_from_slice(owner.as_bytes());
    match expected_revision {
        None => msg.push(0),
        Some(revision) => {
            msg.push(1);
            msg.extend_from_slice(&revision.to_le_bytes());
        }
    }
    msg.push(instruction.tag());
    if let Instruction::Upsert { data_hash, uri } = instruction {
        msg.extend_from_slice(data_hash.as_bytes());
        msg.extend_from_slice(&(uri.len() as u32).to_le_bytes());
        msg.extend_from_slice(uri.as_bytes());
    }
    msg
}
