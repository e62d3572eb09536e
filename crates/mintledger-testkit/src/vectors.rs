//! Golden test vectors for deterministic verification.
//!
//! Account address derivation and operation signing must produce identical
//! bytes across all implementations. Signatures are deterministic Ed25519.

use mintledger_core::{
    canonical_operation_bytes, derive_address, AccountAddress, Keypair, MintAddress, Operation,
    Principal,
};

/// A golden account-address vector.
#[derive(Debug, Clone)]
pub struct AddressVector {
    pub name: &'static str,
    pub namespace: &'static [u8],
    pub owner: [u8; 32],
    pub mint: [u8; 32],
    /// Expected account address (hex).
    pub expected_address: &'static str,
}

/// A golden signed-operation vector.
#[derive(Debug, Clone)]
pub struct OperationVector {
    pub name: &'static str,
    /// Seed for deterministic key generation.
    pub signer_seed: [u8; 32],
    pub operation: Operation,
    /// Expected signer public key (hex).
    pub expected_signer: &'static str,
    /// Expected canonical operation bytes (hex).
    pub expected_canonical: &'static str,
    /// Expected signature over `SIGN_DOMAIN || canonical` (hex).
    pub expected_signature: &'static str,
}

/// Get all address derivation vectors.
pub fn address_vectors() -> Vec<AddressVector> {
    vec![
        AddressVector {
            name: "token namespace",
            namespace: b"token",
            owner: [0x01; 32],
            mint: [0x02; 32],
            expected_address: "8efd93b8af3aa9e13ed7b0fccbcce4bd024fa328173c044217a7251404f50690",
        },
        AddressVector {
            name: "owner and mint swapped",
            namespace: b"token",
            owner: [0x02; 32],
            mint: [0x01; 32],
            expected_address: "783bbb293abdda10a1a08e5e688208df37f892e3a1f03d61378f2b1fbd33692b",
        },
        AddressVector {
            name: "custom namespace",
            namespace: b"vault",
            owner: [0x01; 32],
            mint: [0x02; 32],
            expected_address: "a029687d2b8cf807a97191a4efad0a1b06d0157c4b7fb0cfdbf72a16e6746b41",
        },
        AddressVector {
            name: "empty namespace, zero keys",
            namespace: b"",
            owner: [0x00; 32],
            mint: [0x00; 32],
            expected_address: "4ccbf8755486a691942c0528b49e31501a2fe93c5b2c8e3615db0f7bafefcf4d",
        },
    ]
}

/// Get all signed-operation vectors.
pub fn operation_vectors() -> Vec<OperationVector> {
    vec![
        OperationVector {
            name: "initialize with 9 decimals",
            signer_seed: [0x42; 32],
            operation: Operation::Initialize {
                mint: MintAddress([0x11; 32]),
                decimals: 9,
            },
            expected_signer: "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12",
            expected_canonical: "a300000158201111111111111111111111111111111111111111111111111111111111111111\
                                 0709",
            expected_signature: "7526b9408438b4dd0ea061ca1940c439fb4d7e27a7c2d861521b6f911c804faf\
                                 178e60add4edc550f30e68b110a16d340c9c5188ee8032a3cfddd519348f900c",
        },
        OperationVector {
            name: "issue 1000",
            signer_seed: [0x42; 32],
            operation: Operation::Issue {
                mint: MintAddress([0x11; 32]),
                account: AccountAddress([0x22; 32]),
                amount: 1000,
            },
            expected_signer: "2152f8d19b791d24453242e15f2eab6cb7cffa7b6a5ed30097960e069881db12",
            expected_canonical: "a400020158201111111111111111111111111111111111111111111111111111111111111111\
                                 0258202222222222222222222222222222222222222222222222222222222222222222\
                                 061903e8",
            expected_signature: "609cf0f93eea0370dfa44e596c02ab0cea787ba21043da5dbb769c41b7d01197\
                                 b7dce3a3947fa5894abad1e39f2bafeb41c9e958e46f1121aabae7b94818b705",
        },
        OperationVector {
            name: "transfer 300",
            signer_seed: [0x01; 32],
            operation: Operation::Transfer {
                from: AccountAddress([0x22; 32]),
                to: AccountAddress([0x33; 32]),
                amount: 300,
            },
            expected_signer: "8a88e3dd7409f195fd52db2d3cba5d72ca6709bf1d94121bf3748801b40f6f5c",
            expected_canonical: "a400030358202222222222222222222222222222222222222222222222222222222222222222\
                                 0458203333333333333333333333333333333333333333333333333333333333333333\
                                 0619012c",
            expected_signature: "73e4d628b062e10f2028f7bc60a4db24ec54bb488ca4f4844c4a8ff303ccd4e4\
                                 09f966fb67d1156f968067649938aeb17514a6d4c54d1c2ce912e5c68ac38501",
        },
    ]
}

/// Derive the address for an address vector.
pub fn address_from_vector(vector: &AddressVector) -> AccountAddress {
    derive_address(
        vector.namespace,
        &Principal(vector.owner),
        &MintAddress(vector.mint),
    )
}

/// Verify all golden vectors.
///
/// Returns `(name, matches, computed)` per check. An empty expected value
/// always matches, so new vectors can be added before their outputs are known.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    let mut results = Vec::new();

    for v in address_vectors() {
        let hex = address_from_vector(&v).to_hex();
        let matches = v.expected_address.is_empty() || hex == v.expected_address;
        results.push((format!("address: {}", v.name), matches, hex));
    }

    for v in operation_vectors() {
        let keypair = Keypair::from_seed(&v.signer_seed);
        let signer = keypair.principal().to_hex();
        let canonical = hex::encode(canonical_operation_bytes(&v.operation));
        let signature = keypair.sign(&v.operation.signing_message()).to_hex();

        for (field, computed, expected) in [
            ("signer", signer, v.expected_signer),
            ("canonical", canonical, v.expected_canonical),
            ("signature", signature, v.expected_signature),
        ] {
            let matches = expected.is_empty() || computed == expected;
            results.push((format!("{} {}", v.name, field), matches, computed));
        }
    }

    results
}
