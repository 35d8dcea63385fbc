#![cfg(test)]

// Property tests for ArrayHash kept inside the crate so they can reach
// cursor internals and swap strategies freely.

use crate::array_hash::ArrayHash;
use crate::growth::{GrowthPolicy, PrimeGrowth};
use crate::hash::{BytewiseEq, DefaultHashBuilder};
use hashbrown::HashSet;
use proptest::prelude::*;
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize),
    Erase(usize),
    EraseFirst,
    Find(usize),
    Contains(Vec<u8>),
    Rehash(usize),
    Reserve(usize),
    ShrinkToFit,
    Clear,
    Iterate,
}

// Keys may be empty and may contain zero bytes.
fn arb_key() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        proptest::collection::vec(any::<u8>(), 0..6),
        "[a-z]{0,5}".prop_map(String::into_bytes),
    ]
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<OpI>)> {
    proptest::collection::vec(arb_key(), 1..=10).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => idx.clone().prop_map(OpI::Insert),
            2 => idx.clone().prop_map(OpI::Erase),
            1 => Just(OpI::EraseFirst),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![contains_pool, arb_key()].prop_map(OpI::Contains),
            1 => (0usize..64).prop_map(OpI::Rehash),
            1 => (0usize..64).prop_map(OpI::Reserve),
            1 => Just(OpI::ShrinkToFit),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_state_machine<S, G>(
    mut sut: ArrayHash<S, BytewiseEq, u16, G>,
    pool: &[Vec<u8>],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
    G: GrowthPolicy,
{
    let mut model: HashSet<Vec<u8>> = HashSet::new();

    for op in ops {
        match op {
            OpI::Insert(i) => {
                let k = &pool[i];
                let (c, inserted) = sut.insert(k).expect("small keys always fit");
                prop_assert_eq!(inserted, model.insert(k.clone()));
                prop_assert_eq!(sut.key_at(c), Some(&k[..]));
            }
            OpI::Erase(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.erase(k), model.remove(k) as usize);
            }
            OpI::EraseFirst => {
                if !sut.is_empty() {
                    let c = sut.begin();
                    let k = sut.key_at(c).expect("begin names an entry").to_vec();
                    let next = sut.erase_at(c);
                    prop_assert!(model.remove(&k));
                    prop_assert_eq!(sut.is_empty(), next == sut.end());
                }
            }
            OpI::Find(i) => {
                let k = &pool[i];
                let found = sut.find(k);
                prop_assert_eq!(found.is_some(), model.contains(k));
                if let Some(c) = found {
                    prop_assert_eq!(sut.key_at(c), Some(&k[..]));
                }
            }
            OpI::Contains(k) => {
                prop_assert_eq!(sut.contains(&k), model.contains(&k));
                prop_assert_eq!(sut.count(&k), model.contains(&k) as usize);
            }
            OpI::Rehash(n) => {
                sut.rehash(n).expect("small rehash succeeds");
                prop_assert!(sut.bucket_count() >= n.max(1));
            }
            OpI::Reserve(n) => {
                sut.reserve(n).expect("small reserve succeeds");
            }
            OpI::ShrinkToFit => sut.shrink_to_fit(),
            OpI::Clear => {
                let buckets = sut.bucket_count();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), buckets);
            }
            OpI::Iterate => {
                let s_keys: HashSet<Vec<u8>> = sut.iter().map(|e| e.key().to_vec()).collect();
                prop_assert_eq!(&s_keys, &model);
                prop_assert_eq!(sut.iter().count(), model.len());

                let mut steps = 0;
                let mut c = sut.begin();
                while c != sut.end() {
                    steps += 1;
                    c = sut.advance(c);
                }
                prop_assert_eq!(steps, model.len());
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
        for k in pool {
            prop_assert_eq!(sut.contains(k), model.contains(k));
        }
    }
    Ok(())
}

// Property: State-machine equivalence against hashbrown::HashSet.
// Invariants exercised across random operation sequences:
// - Insert reports novelty exactly when the model does; the cursor names the key.
// - `erase`/`erase_at` remove exactly one model key.
// - `find`/`contains`/`count` parity for pool and arbitrary keys.
// - Iteration and cursor walks visit each live key exactly once.
// - `len` parity and the load-factor bound hold after every op.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ArrayHash = ArrayHash::with_hasher(DefaultHashBuilder::default());
        run_state_machine(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same invariants with every key in bucket 0. Exercises in-bucket
// scanning, mid-buffer removal and rehash of one long bucket.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: ArrayHash<ConstBuildHasher> = ArrayHash::with_hasher(ConstBuildHasher);
        run_state_machine(sut, &pool, ops)?;
    }
}

// Property: Same invariants under modulo indexing over the prime table.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_prime_growth((pool, ops) in arb_scenario()) {
        let sut: ArrayHash<DefaultHashBuilder, BytewiseEq, u16, PrimeGrowth> =
            ArrayHash::with_hasher(DefaultHashBuilder::default());
        run_state_machine(sut, &pool, ops)?;
    }
}
