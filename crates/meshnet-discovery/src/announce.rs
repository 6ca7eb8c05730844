//! Signed discovery announcements
//!
//! When a node is created or updated, its profile can be announced to
//! the rest of the mesh. The announcement payload is the serialized
//! profile; the signature comes from the opaque [`Signer`] capability,
//! so key handling stays outside this stack.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meshnet_core::{DiscoveryError, NodeName, NodeProfile, Signer};

/// A signed node-profile announcement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub node: NodeName,
    /// Serialized profile bytes (what was signed)
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
    pub announced_at: DateTime<Utc>,
}

/// Build and sign an announcement for a profile
pub fn announce(
    profile: &NodeProfile,
    signer: &dyn Signer,
) -> Result<Announcement, DiscoveryError> {
    let payload = serde_json::to_vec(profile)
        .map_err(|e| DiscoveryError::AnnouncementFailed(e.to_string()))?;
    let signature = signer.sign(&payload);
    Ok(Announcement {
        node: profile.name.clone(),
        payload,
        signature,
        announced_at: Utc::now(),
    })
}

/// Check an announcement against the signer that produced it
pub fn verify_announcement(announcement: &Announcement, signer: &dyn Signer) -> bool {
    signer.verify(&announcement.payload, &announcement.signature)
}
