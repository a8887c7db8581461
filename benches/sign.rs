use criterion::{criterion_group, criterion_main, Criterion};

use rand::rngs::OsRng;

use threshold_beacon::parameters::ThresholdParameters;
use threshold_beacon::proposer::RandomBeaconProposer;
use threshold_beacon::sign::{
    beacon_message, public_key_share, verify_aggregate_signature, KeyShare, SignatureShare,
};
use threshold_beacon::testing::{keypair, Bn254Keccak};
use threshold_beacon::utils::{Scalar, G1, G2};

type C = Bn254Keccak;

const N: usize = 21;
const T: u32 = 11;

struct Epoch {
    secrets: Vec<Scalar<C>>,
    columns: Vec<Vec<G1<C>>>,
    commitment_rows: Vec<Vec<G2<C>>>,
}

/// Run both DKG phases locally for the whole committee.
fn run_dkg() -> Epoch {
    let mut rng = OsRng;
    let mut secrets = Vec::new();
    let mut group = Vec::new();
    for _ in 0..N {
        let (sk, pk) = keypair::<C>(&mut rng);
        secrets.push(sk);
        group.push(pk);
    }
    let params = ThresholdParameters::new(N as u32, T);

    let mut commitment_rows = Vec::new();
    let mut share_rows = Vec::new();
    for i in 0..N {
        let mut proposer =
            RandomBeaconProposer::<C>::new(1, i as u32, secrets[i], group.clone(), params)
                .unwrap();
        commitment_rows.push(proposer.generate_dkg1(OsRng).unwrap().commitments);
        share_rows.push(proposer.generate_dkg2(OsRng).unwrap().encrypted_shares);
    }

    let columns = (0..N)
        .map(|i| share_rows.iter().map(|row| row[i]).collect())
        .collect();

    Epoch {
        secrets,
        columns,
        commitment_rows,
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let epoch = run_dkg();
    let message = beacon_message::<C>(2, &[7u8; 32]);

    c.bench_function("key share aggregation (n=21)", |b| {
        b.iter(|| KeyShare::<C>::aggregate(&epoch.secrets[0], &epoch.columns[0], T).unwrap());
    });

    let key_share = KeyShare::<C>::aggregate(&epoch.secrets[0], &epoch.columns[0], T).unwrap();
    c.bench_function("signature share generation", |b| {
        b.iter(|| key_share.sign(message.as_ref()));
    });

    let signature_shares: Vec<SignatureShare<C>> = (0..N)
        .map(|i| {
            KeyShare::<C>::aggregate(&epoch.secrets[i], &epoch.columns[i], T)
                .unwrap()
                .sign(message.as_ref())
        })
        .collect();
    let public_shares: Vec<G2<C>> = (0..N)
        .map(|i| public_key_share::<C>(&epoch.commitment_rows, i).unwrap())
        .collect();

    c.bench_function("aggregate signature verification (n=21)", |b| {
        b.iter(|| {
            verify_aggregate_signature::<C>(
                &signature_shares,
                &public_shares,
                message.as_ref(),
                T,
            )
            .unwrap()
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
