//! Identity types for assets, upload transactions and upstream hosts.
//!
//! Assets are content-addressed by a 128-bit id. Uploads that do not know
//! their final id yet are keyed by a transaction id; the asset id is derived
//! from the transaction id and the session secret so both sides agree on it
//! without a round trip.

use std::fmt;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content-addressed asset identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    /// The null id. Never refers to a real asset.
    pub const NULL: Self = Self(Uuid::nil());

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Builds an id from a raw 128-bit value. Handy for fixtures.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Generates a fresh random id.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns true for the null id.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    /// Underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Upload transaction identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generates a fresh random transaction id.
    #[must_use]
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives the asset id the upstream will commit this transaction under.
    ///
    /// Deterministic in `(self, session)`.
    #[must_use]
    pub fn make_asset_id(&self, session: &Uuid) -> AssetId {
        AssetId(Uuid::new_v5(&self.0, session.as_bytes()))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Asset content category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Compressed texture.
    Texture,
    /// Compressed audio clip.
    Sound,
    /// Calling card.
    CallingCard,
    /// Location bookmark.
    Landmark,
    /// Wearable clothing layer.
    Clothing,
    /// Serialized object.
    Object,
    /// Text notecard.
    Notecard,
    /// Script source.
    LslText,
    /// Compiled script.
    LslBytecode,
    /// Body part layer.
    BodyPart,
    /// Uncompressed audio.
    SoundWav,
    /// Animation keyframes.
    Animation,
    /// Gesture definition.
    Gesture,
    /// Region simulator state.
    Simstate,
    /// Mesh geometry.
    Mesh,
    /// Surface material.
    Material,
}

impl AssetType {
    /// Short lowercase name used in logs and metrics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Texture => "texture",
            Self::Sound => "sound",
            Self::CallingCard => "callcard",
            Self::Landmark => "landmark",
            Self::Clothing => "clothing",
            Self::Object => "object",
            Self::Notecard => "notecard",
            Self::LslText => "lsltext",
            Self::LslBytecode => "lslbyte",
            Self::BodyPart => "bodypart",
            Self::SoundWav => "snd_wav",
            Self::Animation => "animatn",
            Self::Gesture => "gesture",
            Self::Simstate => "simstate",
            Self::Mesh => "mesh",
            Self::Material => "material",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Address of the upstream asset service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host(SocketAddr);

impl Host {
    /// Wraps a socket address.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// Socket address of this host.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.0
    }

    /// A host with port zero or an unspecified address cannot be reached.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.0.port() != 0 && !self.0.ip().is_unspecified()
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_derivation_is_stable() {
        let tid = TransactionId::from_uuid(Uuid::from_u128(7));
        let session = Uuid::from_u128(99);

        assert_eq!(tid.make_asset_id(&session), tid.make_asset_id(&session));
        assert_ne!(
            tid.make_asset_id(&session),
            tid.make_asset_id(&Uuid::from_u128(100))
        );
    }

    #[test]
    fn test_null_asset_id() {
        assert!(AssetId::NULL.is_null());
        assert!(!AssetId::from_u128(1).is_null());
    }

    #[test]
    fn test_host_validity() {
        let good: SocketAddr = "10.0.0.1:12043".parse().expect("addr");
        let no_port: SocketAddr = "10.0.0.1:0".parse().expect("addr");
        let unspecified: SocketAddr = "0.0.0.0:12043".parse().expect("addr");

        assert!(Host::new(good).is_ok());
        assert!(!Host::new(no_port).is_ok());
        assert!(!Host::new(unspecified).is_ok());
    }
}
