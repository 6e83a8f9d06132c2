//! Status taxonomy: numeric codes and human-readable strings for broker-returned
//! per-(topic, partition) errors and client-side failures.

use std::fmt;

/// A per-(topic, partition) wire error code, as returned inside a produce or metadata
/// response. `OK` (`0`) is success; every other value names a specific failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WireError {
    Ok,
    OffsetOutOfRange,
    InvalidMessage,
    UnknownTopicOrPartition,
    InvalidMessageSize,
    LeaderNotAvailable,
    NotLeaderForPartition,
    RequestTimedOut,
    BrokerNotAvailable,
    ReplicaNotAvailable,
    MessageSizeTooLarge,
    StaleControllerEpoch,
    OffsetMetadataTooLarge,
    Unknown(i16),
}

impl WireError {
    /// Errors that retrying cannot fix: the message itself is the problem.
    pub fn is_fatal_to_message(self) -> bool {
        matches!(
            self,
            Self::MessageSizeTooLarge | Self::InvalidMessage | Self::InvalidMessageSize
        )
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn code(self) -> i16 {
        self.into()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::OffsetOutOfRange => "OFFSET_OUT_OF_RANGE",
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::UnknownTopicOrPartition => "UNKNOWN_TOPIC_OR_PARTITION",
            Self::InvalidMessageSize => "INVALID_MESSAGE_SIZE",
            Self::LeaderNotAvailable => "LEADER_NOT_AVAILABLE",
            Self::NotLeaderForPartition => "NOT_LEADER_FOR_PARTITION",
            Self::RequestTimedOut => "REQUEST_TIMED_OUT",
            Self::BrokerNotAvailable => "BROKER_NOT_AVAILABLE",
            Self::ReplicaNotAvailable => "REPLICA_NOT_AVAILABLE",
            Self::MessageSizeTooLarge => "MESSAGE_SIZE_TOO_LARGE",
            Self::StaleControllerEpoch => "STALE_CONTROLLER_EPOCH",
            Self::OffsetMetadataTooLarge => "OFFSET_METADATA_TOO_LARGE",
            Self::Unknown(_) => "UNKNOWN",
        }
    }
}

impl From<i16> for WireError {
    fn from(code: i16) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::OffsetOutOfRange,
            2 => Self::InvalidMessage,
            3 => Self::UnknownTopicOrPartition,
            4 => Self::InvalidMessageSize,
            5 => Self::LeaderNotAvailable,
            6 => Self::NotLeaderForPartition,
            7 => Self::RequestTimedOut,
            8 => Self::BrokerNotAvailable,
            9 => Self::ReplicaNotAvailable,
            10 => Self::MessageSizeTooLarge,
            11 => Self::StaleControllerEpoch,
            12 => Self::OffsetMetadataTooLarge,
            other => Self::Unknown(other),
        }
    }
}

impl From<WireError> for i16 {
    fn from(err: WireError) -> Self {
        match err {
            WireError::Ok => 0,
            WireError::OffsetOutOfRange => 1,
            WireError::InvalidMessage => 2,
            WireError::UnknownTopicOrPartition => 3,
            WireError::InvalidMessageSize => 4,
            WireError::LeaderNotAvailable => 5,
            WireError::NotLeaderForPartition => 6,
            WireError::RequestTimedOut => 7,
            WireError::BrokerNotAvailable => 8,
            WireError::ReplicaNotAvailable => 9,
            WireError::MessageSizeTooLarge => 10,
            WireError::StaleControllerEpoch => 11,
            WireError::OffsetMetadataTooLarge => 12,
            WireError::Unknown(code) => code,
        }
    }
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse-grained client-side outcome surfaced by [`crate::Producer::status`]. Carries less
/// detail than `Error` on purpose: it is the summary, not the diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    ProducerError,
    CoordinationInitError,
    BrokerInitError,
    TopicsInitError,
    PartitionsInitError,
    MetadataError,
    RetryExhausted,
    Unknown,
}

impl StatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ProducerError => "PRODUCER_ERROR",
            Self::CoordinationInitError => "COORDINATION_INIT_ERROR",
            Self::BrokerInitError => "BROKER_INIT_ERROR",
            Self::TopicsInitError => "TOPICS_INIT_ERROR",
            Self::PartitionsInitError => "PARTITIONS_INIT_ERROR",
            Self::MetadataError => "METADATA_ERROR",
            Self::RetryExhausted => "RETRY_EXHAUSTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_error_roundtrip_known_codes() {
        for code in 0..=12i16 {
            let err = WireError::from(code);
            assert_eq!(i16::from(err), code);
            assert_ne!(err.as_str(), "UNKNOWN");
        }
    }

    #[test]
    fn test_unknown_code_roundtrips() {
        let err = WireError::from(999);
        assert_eq!(i16::from(err), 999);
        assert_eq!(err.as_str(), "UNKNOWN");
    }

    #[test]
    fn test_fatal_to_message_set() {
        assert!(WireError::MessageSizeTooLarge.is_fatal_to_message());
        assert!(WireError::InvalidMessage.is_fatal_to_message());
        assert!(WireError::InvalidMessageSize.is_fatal_to_message());
        assert!(!WireError::NotLeaderForPartition.is_fatal_to_message());
        assert!(!WireError::Ok.is_fatal_to_message());
    }

    #[test]
    fn test_status_code_display() {
        assert_eq!(StatusCode::MetadataError.to_string(), "METADATA_ERROR");
    }
}
