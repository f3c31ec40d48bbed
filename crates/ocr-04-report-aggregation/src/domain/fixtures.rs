//! Committee and observation builders shared by the unit tests.

use ocr_01_numeric_codec::{BigInt, NumericCodec};
use ocr_02_observation_signing::{
    AttributedSignedObservation, ObservationSigner, OffchainKeypair, SignedObservation,
};
use ocr_03_committee_registry::{CommitteeConfig, OracleIdentity, ProtocolTimings};
use shared_types::{Observation, OracleId, Query, ReportTimestamp};
use std::sync::Arc;

pub(crate) struct Fixture {
    pub keys: Vec<OffchainKeypair>,
    pub committee: Arc<CommitteeConfig>,
}

impl Fixture {
    pub fn new(n: u8, f: u8) -> Self {
        let keys: Vec<_> = (0..n).map(|_| OffchainKeypair::generate()).collect();
        let oracles = keys
            .iter()
            .enumerate()
            .map(|(i, k)| OracleIdentity {
                offchain_public_key: k.public_key(),
                onchain_signer: [i as u8; 20],
                transmitter: [0x80 | i as u8; 20],
                peer_id: format!("peer-{i}"),
            })
            .collect();
        let committee =
            CommitteeConfig::new(1, [0xCC; 20], 1, oracles, f, ProtocolTimings::default())
                .unwrap();
        Self {
            keys,
            committee: Arc::new(committee),
        }
    }

    pub fn ts(&self, round: u8) -> ReportTimestamp {
        ReportTimestamp::new(self.committee.digest, 1, round)
    }

    pub fn raw(
        &self,
        ts: &ReportTimestamp,
        observer: u8,
        observation: Observation,
    ) -> AttributedSignedObservation {
        let signed = SignedObservation::sign(
            ts,
            &Query::default(),
            observation,
            &self.keys[observer as usize],
        )
        .unwrap();
        AttributedSignedObservation::new(signed, OracleId(observer))
    }

    pub fn observe(
        &self,
        ts: &ReportTimestamp,
        observer: u8,
        value: i64,
    ) -> AttributedSignedObservation {
        let bytes = NumericCodec::default().encode(&BigInt::from(value)).unwrap();
        self.raw(ts, observer, Observation(bytes))
    }
}
