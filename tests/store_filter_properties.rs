// Randomized checks of store ordering, update idempotence and filter purity

mod common;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use chatline::filter::{self, CategoryFilter};
use chatline::models::{Message, MessageId, MessageType};
use chatline::store::MessageStore;
use common::{setup_logging, text};

const ROUNDS: usize = 200;

fn random_message(rng: &mut StdRng, id: i64) -> Message {
    let mut msg = text(id, &format!("message {}", id));
    msg.kind = MessageType::ALL[rng.gen_range(0..MessageType::ALL.len())];
    msg.is_favorite = rng.gen_bool(0.3);
    msg
}

fn random_store(rng: &mut StdRng) -> MessageStore {
    let len = rng.gen_range(0..30);
    let start = rng.gen_range(-50..50);
    MessageStore::from_messages((0..len).map(|i| random_message(rng, start + i)).collect())
}

fn is_ascending(store: &MessageStore) -> bool {
    let ids: Vec<&MessageId> = store.iter().map(|m| &m.id).collect();
    ids.windows(2).all(|w| w[0] < w[1])
}

fn numeric(id: &MessageId) -> i64 {
    match id {
        MessageId::Number(n) => *n,
        MessageId::Text(_) => unreachable!("tests only use numeric ids"),
    }
}

#[test]
fn test_operations_keep_store_ascending() {
    setup_logging();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..ROUNDS {
        let mut store = random_store(&mut rng);
        assert!(is_ascending(&store));

        for _ in 0..20 {
            match rng.gen_range(0..4) {
                // New message from the push channel
                0 => {
                    let next = store.newest().map(|m| numeric(&m.id) + 1).unwrap_or(0);
                    let id = next + rng.gen_range(0..3);
                    store.append(random_message(&mut rng, id));
                }
                // Older page
                1 => {
                    let oldest = store.oldest_id().map(numeric).unwrap_or(0);
                    let len = rng.gen_range(0..5);
                    let page: Vec<Message> = (0..len)
                        .map(|i| random_message(&mut rng, oldest - len + i))
                        .collect();
                    store.prepend(page);
                }
                // Update of an existing or unknown record
                2 => {
                    let id = if !store.is_empty() && rng.gen_bool(0.8) {
                        numeric(&store.as_slice()[rng.gen_range(0..store.len())].id)
                    } else {
                        1_000_000
                    };
                    store.replace_by_id(random_message(&mut rng, id));
                }
                // Resync or search results
                _ => {
                    let replacement = random_store(&mut rng);
                    store.reset(replacement.as_slice().to_vec());
                }
            }
            assert!(is_ascending(&store), "store lost ordering: {:?}", store);
        }
    }
}

#[test]
fn test_replace_by_id_is_idempotent() {
    setup_logging();
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..ROUNDS {
        let store = random_store(&mut rng);
        if store.is_empty() {
            continue;
        }
        let target = store.as_slice()[rng.gen_range(0..store.len())].id.clone();
        let mut update = random_message(&mut rng, numeric(&target));
        update.content = "edited".to_string();

        let mut once = store.clone();
        assert!(once.replace_by_id(update.clone()));

        let mut twice = once.clone();
        assert!(twice.replace_by_id(update.clone()));

        assert_eq!(once.as_slice(), twice.as_slice());
        assert_eq!(once.len(), store.len());
        assert_eq!(once.find(&target), Some(&update));
    }
}

#[test]
fn test_filter_is_an_ordered_subsequence() {
    setup_logging();
    let mut rng = StdRng::seed_from_u64(23);

    let mut tags = vec![CategoryFilter::All, CategoryFilter::Favorites];
    tags.extend(MessageType::ALL.iter().map(|t| CategoryFilter::Type(*t)));

    for _ in 0..ROUNDS {
        let store = random_store(&mut rng);

        for tag in &tags {
            let expected: Vec<&Message> = store
                .as_slice()
                .iter()
                .filter(|m| match tag {
                    CategoryFilter::All => true,
                    CategoryFilter::Favorites => m.is_favorite,
                    CategoryFilter::Type(kind) => m.kind == *kind,
                })
                .collect();

            let first = filter::filter(&store, tag);
            let second = filter::filter(&store, tag);
            assert_eq!(first, expected, "filter {} mismatch", tag);
            assert_eq!(first, second);
        }

        // The store is left untouched
        assert!(is_ascending(&store));
    }
}
