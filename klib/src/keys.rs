use bitcoin_hashes::{hash160, sha256d, Hash};
use k256::{
    elliptic_curve::{ops::MulByGenerator, sec1::ToEncodedPoint},
    NonZeroScalar, ProjectivePoint,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

// mainnet version bytes
const ADDRESS_VERSION: u8 = 0x00;
const WIF_VERSION: u8 = 0x80;
// appended to WIF payloads for keys whose address uses the compressed pubkey
const WIF_COMPRESSED_FLAG: u8 = 0x01;

#[derive(Clone)]
pub struct PrivateKey {
    scalar: NonZeroScalar,
}

impl PrivateKey {
    /// Draws a fresh key from the OS entropy source. Out-of-range draws are
    /// rejected and redrawn; only a dead entropy source is an error.
    pub fn generate() -> Result<Self> {
        let mut rng = OsRng;
        loop {
            let mut bytes = [0u8; 32];
            rng.try_fill_bytes(&mut bytes)
                .map_err(|e| Error::Crypto(format!("entropy source unavailable: {e}")))?;

            let scalar: Option<NonZeroScalar> = NonZeroScalar::from_repr(bytes.into()).into();
            if let Some(scalar) = scalar {
                return Ok(Self { scalar });
            }
        }
    }

    pub fn public_key(&self) -> PublicKey {
        let point = ProjectivePoint::mul_by_generator(&self.scalar);

        PublicKey { point }
    }

    pub fn as_secret_bytes(&self) -> Box<[u8]> {
        self.scalar.to_bytes().as_slice().into()
    }

    /// Wallet import format of the secret, carrying the compressed-pubkey flag
    /// to match the address encoding used by [`PublicKey::address`].
    pub fn to_wif(&self) -> String {
        let mut payload = vec![WIF_VERSION];
        payload.extend_from_slice(&self.as_secret_bytes());
        payload.push(WIF_COMPRESSED_FLAG);

        base58check(&payload)
    }
}

pub struct PublicKey {
    point: ProjectivePoint,
}

impl PublicKey {
    pub fn as_compressed_bytes(&self) -> Box<[u8]> {
        let encoded = self.point.to_encoded_point(true).clone();
        encoded.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_compressed_bytes())
    }

    /// Legacy pay-to-pubkey-hash address. Deterministic: the same public key
    /// always encodes to the same address.
    pub fn address(&self) -> String {
        let pubkey_hash = hash160::Hash::hash(&self.as_compressed_bytes()).to_byte_array();

        let mut payload = vec![ADDRESS_VERSION];
        payload.extend_from_slice(&pubkey_hash);

        base58check(&payload)
    }
}

fn base58check(payload: &[u8]) -> String {
    let checksum = sha256d::Hash::hash(payload).to_byte_array();

    let mut data = payload.to_vec();
    data.extend_from_slice(&checksum[..4]);

    bs58::encode(data).into_string()
}
