//! Payloads pushed to a remote mirror.
//!
//! A message carries either a whole record (`group_key` is `None`) or one
//! group. Framing, retries and compression belong to the transport.

use serde::{Deserialize, Serialize};
use trinket_types::{CapabilityRecord, Digest, GroupRecord, OwnerId};

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub owner: OwnerId,
    /// `None` for a full record, the group key for a partial.
    pub group_key: Option<String>,
    /// MessagePack-encoded [`CapabilityRecord`] or [`GroupRecord`].
    pub payload: Vec<u8>,
}

/// Decoded message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPayload {
    Full(CapabilityRecord),
    Group(GroupRecord),
}

impl SyncMessage {
    pub fn full(owner: OwnerId, record: &CapabilityRecord) -> SyncResult<Self> {
        Ok(Self {
            owner,
            group_key: None,
            payload: record.encode()?,
        })
    }

    pub fn partial(owner: OwnerId, record: &GroupRecord) -> SyncResult<Self> {
        Ok(Self {
            owner,
            group_key: Some(record.key.clone()),
            payload: record.encode()?,
        })
    }

    pub fn is_full(&self) -> bool {
        self.group_key.is_none()
    }

    pub fn digest(&self) -> Digest {
        Digest::of(&self.payload)
    }

    /// Decodes the payload and checks it against the envelope.
    pub fn decode(&self) -> SyncResult<SyncPayload> {
        match &self.group_key {
            None => Ok(SyncPayload::Full(CapabilityRecord::decode(&self.payload)?)),
            Some(key) => {
                let record = GroupRecord::decode(&self.payload)?;
                if &record.key != key {
                    return Err(SyncError::Protocol(format!(
                        "envelope says `{}` but payload holds `{}`",
                        key, record.key
                    )));
                }
                Ok(SyncPayload::Group(record))
            }
        }
    }
}
