//! # OCR Protocol Benchmarks
//!
//! | Area | Operation | Target |
//! |------|-----------|--------|
//! | Numeric codec | encode + decode one value | < 5µs |
//! | Aggregation | verify and median 31 observations | < 5ms |
//! | Attestation | verify 2f+1 report signatures | < 10ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ocr_01_numeric_codec::{BigInt, NumericCodec};
use ocr_02_observation_signing::{
    AttributedSignedObservation, CancellationFlag, ObservationSigner, OffchainKeypair,
    OnchainKeypair, ReportSigner, SignedObservation, VerificationPool,
};
use ocr_03_committee_registry::{CommitteeConfig, OracleIdentity, ProtocolTimings};
use ocr_04_report_aggregation::MedianPlugin;
use ocr_05_attestation::{AttestedReport, ReportSignature};
use rand::Rng;
use shared_types::{Observation, OracleId, Query, ReportTimestamp};
use std::time::Duration;

struct Committee {
    offchain: Vec<OffchainKeypair>,
    onchain: Vec<OnchainKeypair>,
    config: CommitteeConfig,
}

fn committee(n: usize) -> Committee {
    let offchain: Vec<_> = (0..n).map(|_| OffchainKeypair::generate()).collect();
    let onchain: Vec<_> = (0..n).map(|_| OnchainKeypair::generate()).collect();
    let oracles = offchain
        .iter()
        .zip(&onchain)
        .enumerate()
        .map(|(i, (off, on))| OracleIdentity {
            offchain_public_key: off.public_key(),
            onchain_signer: on.signer_address(),
            transmitter: [i as u8; 20],
            peer_id: format!("bench-{i}"),
        })
        .collect();
    let f = ((n - 1) / 3) as u8;
    let config =
        CommitteeConfig::new(1, [0xBE; 20], 1, oracles, f, ProtocolTimings::default()).unwrap();
    Committee {
        offchain,
        onchain,
        config,
    }
}

fn signed_observations(
    c: &Committee,
    ts: &ReportTimestamp,
    codec: &NumericCodec,
) -> Vec<AttributedSignedObservation> {
    let mut rng = rand::thread_rng();
    c.offchain
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let value = BigInt::from(rng.gen_range(-1_000_000i64..1_000_000));
            let observation = Observation(codec.encode(&value).unwrap());
            let signed = SignedObservation::sign(ts, &Query::default(), observation, key).unwrap();
            AttributedSignedObservation::new(signed, OracleId(i as u8))
        })
        .collect()
}

// ============================================================================
// Numeric codec
// ============================================================================

fn bench_numeric_codec(c: &mut Criterion) {
    let codec = NumericCodec::default();
    let value = BigInt::from(-123_456_789_012i64);

    c.bench_function("numeric_codec_roundtrip", |b| {
        b.iter(|| {
            let bytes = codec.encode(black_box(&value)).unwrap();
            black_box(codec.decode(&bytes).unwrap())
        })
    });
}

// ============================================================================
// Aggregation
// ============================================================================

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("median_aggregation");
    group.measurement_time(Duration::from_secs(10));

    let plugin = MedianPlugin::default();
    let pool = VerificationPool::with_default_threads().unwrap();
    for n in [4usize, 16, 31] {
        let members = committee(n);
        let ts = ReportTimestamp::new(members.config.digest, 1, 1);
        let observations = signed_observations(&members, &ts, plugin.codec());

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("verify_and_median", n), &n, |b, _| {
            b.iter(|| {
                plugin
                    .aggregate(
                        &ts,
                        &Query::default(),
                        black_box(&observations),
                        &members.config,
                        &pool,
                        &CancellationFlag::new(),
                    )
                    .unwrap()
            })
        });
    }
    group.finish();
}

// ============================================================================
// Attestation
// ============================================================================

fn bench_attestation_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("attestation");

    let plugin = MedianPlugin::default();
    let pool = VerificationPool::with_default_threads().unwrap();
    for n in [4usize, 31] {
        let members = committee(n);
        let ts = ReportTimestamp::new(members.config.digest, 1, 1);
        let observations = signed_observations(&members, &ts, plugin.codec());
        let report = plugin
            .aggregate(
                &ts,
                &Query::default(),
                &observations,
                &members.config,
                &pool,
                &CancellationFlag::new(),
            )
            .unwrap();
        let digest = report.digest();
        let signatures = members
            .onchain
            .iter()
            .take(members.config.quorum())
            .enumerate()
            .map(|(i, key)| ReportSignature {
                signer: OracleId(i as u8),
                signature: key.sign_report(&digest).unwrap(),
            })
            .collect();
        let attested = AttestedReport { report, signatures };

        group.bench_with_input(BenchmarkId::new("verify_quorum", n), &n, |b, _| {
            b.iter(|| black_box(&attested).verify(&members.config).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_numeric_codec,
    bench_aggregation,
    bench_attestation_verify
);
criterion_main!(benches);
