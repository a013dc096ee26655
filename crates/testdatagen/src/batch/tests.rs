use super::*;
use crate::{codec::decode, time::FixedDate};
use std::collections::HashSet;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn config(seed: u64) -> BatchConfig {
    BatchConfig {
        max_workers: 4,
        seed: Some(seed),
        ..BatchConfig::default()
    }
}

fn generator(seed: u64) -> BatchGenerator<FixedDate, Synthetic> {
    BatchGenerator::with_sources(config(seed), FixedDate(today()), Synthetic)
}

#[derive(Clone)]
struct Repeating(&'static str);

impl PersonAttributeProvider for Repeating {
    fn raw_identity_number(&mut self) -> Option<String> {
        Some(self.0.to_owned())
    }
}

#[test]
fn partition_sums_to_count() {
    assert_eq!(partition(10, 3), vec![4, 3, 3]);
    assert_eq!(partition(9, 3), vec![3, 3, 3]);
    assert_eq!(partition(2, 4), vec![1, 1, 0, 0]);
    assert_eq!(partition(7, 0), vec![7]);
    for count in [1, 99, 100, 101, 2_500, 25_000] {
        for workers in 1..=16 {
            let parts = partition(count, workers);
            assert_eq!(parts.len(), workers);
            assert_eq!(parts.iter().sum::<usize>(), count);
            let max = parts.iter().max().unwrap();
            let min = parts.iter().min().unwrap();
            assert!(max - min <= 1);
        }
    }
}

#[test]
fn worker_count_follows_batch_size_hint() {
    assert_eq!(worker_count(1, 100, 8), 1);
    assert_eq!(worker_count(99, 100, 8), 1);
    assert_eq!(worker_count(500, 100, 8), 5);
    assert_eq!(worker_count(25_000, 100, 8), 8);
    assert_eq!(worker_count(500, 0, 8), 8);
    assert_eq!(worker_count(500, 100, 0), 1);
}

#[test]
fn batch_is_unique_and_inside_window() {
    let window = BirthYearWindow::new(1950, 2005);
    let batch = generator(1).generate(500, window).unwrap();

    assert_eq!(batch.len(), 500);
    assert_eq!(batch.workers(), 4);
    assert_eq!(batch.today(), today());
    assert!(batch.attempts() >= 500);

    let mut seen = HashSet::new();
    for entry in batch.iter() {
        assert!(window.contains(entry.id.birth_year()), "{entry:?}");
        assert!(seen.insert(entry.formatted.short.clone()), "duplicate {entry:?}");
        assert_eq!(entry.formatted.long[2..8], entry.formatted.short[..6]);
        assert_eq!(entry.formatted.long[..4], entry.id.birth_year().to_string());
    }
}

#[test]
fn entries_round_trip_through_decode() {
    let window = BirthYearWindow::new(1950, 2005);
    let batch = generator(2).generate(200, window).unwrap();
    for entry in batch {
        let decoded = decode(&entry.formatted.long, None, today()).unwrap();
        assert_eq!(decoded, entry.id);
        let short = decode(&entry.formatted.short, None, today()).unwrap();
        assert_eq!(short, entry.id);
    }
}

#[test]
fn seeded_batches_are_reproducible() {
    let window = BirthYearWindow::new(1960, 1990);
    let first = generator(42).generate(300, window).unwrap();
    let second = generator(42).generate(300, window).unwrap();
    let other = generator(43).generate(300, window).unwrap();

    let shorts = |batch: &BatchResult| -> Vec<String> {
        batch.iter().map(|e| e.formatted.short.clone()).collect()
    };
    assert_eq!(shorts(&first), shorts(&second));
    assert_ne!(shorts(&first), shorts(&other));
}

#[test]
fn single_worker_when_count_below_hint() {
    let batch = generator(3)
        .generate(42, BirthYearWindow::new(1950, 2005))
        .unwrap();
    assert_eq!(batch.len(), 42);
    assert_eq!(batch.workers(), 1);
}

#[test]
fn zero_count_is_rejected() {
    assert!(matches!(
        generator(4).generate(0, BirthYearWindow::new(1950, 2005)),
        Err(Error::InvalidRequest { .. })
    ));
}

#[test]
fn unrepresentable_window_fails_fast() {
    let window = BirthYearWindow::new(2030, 2031);
    assert_eq!(
        generator(5).generate(10, window).unwrap_err(),
        Error::RangeExhausted {
            window,
            attempts: 0
        }
    );
}

#[test]
fn narrow_window_still_fills_with_distinct_serials() {
    // One birth year has 365 * 1000 distinct numbers, plenty for 1000.
    let window = BirthYearWindow::from_ages(40, 40, today());
    let batch = generator(6).generate(1_000, window).unwrap();
    assert_eq!(batch.len(), 1_000);
    assert!(batch.iter().all(|e| e.id.birth_year() == 1986));
}

#[test]
fn cross_worker_duplicates_are_topped_up() {
    // Today is the only representable day in the window, so every worker
    // draws from the same 1000 serials and collides with the others. The
    // merge drops the collisions and the sequential top-up refills them.
    let window = BirthYearWindow::new(2025, 2027);
    let generator = BatchGenerator::with_sources(
        config(7),
        FixedDate(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()),
        Synthetic,
    );
    let batch = generator.generate(900, window).unwrap();
    assert_eq!(batch.len(), 900);
    assert_eq!(batch.workers(), 4);
    assert!(batch.attempts() > 900);
    let unique: HashSet<_> = batch.iter().map(|e| &e.formatted.short).collect();
    assert_eq!(unique.len(), 900);
    assert!(batch.iter().all(|e| e.id.birth_year() == 2026));
}

#[test]
fn exhausted_space_reports_incomplete() {
    // Only one distinct number exists, so the second can never be produced.
    let generator = BatchGenerator::with_sources(
        config(8),
        FixedDate(today()),
        Repeating("811218-9876"),
    );
    match generator.generate(2, BirthYearWindow::new(1980, 1990)) {
        Err(Error::BatchIncomplete {
            requested,
            produced,
            attempts,
            ..
        }) => {
            assert_eq!(requested, 2);
            assert_eq!(produced, 1);
            assert_eq!(attempts, 2 * DEFAULT_ATTEMPTS_PER_ITEM);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn provider_outside_window_exhausts_range() {
    let generator = BatchGenerator::with_sources(
        config(9),
        FixedDate(today()),
        Repeating("500101-0007"),
    );
    let window = BirthYearWindow::new(1980, 1990);
    assert!(matches!(
        generator.generate(5, window),
        Err(Error::RangeExhausted { .. })
    ));
}

#[test]
fn malformed_provider_counts_failures() {
    let generator = BatchGenerator::with_sources(
        config(10),
        FixedDate(today()),
        Repeating("19xx-garbage"),
    );
    match generator.generate(300, BirthYearWindow::new(1950, 2005)) {
        Err(Error::BatchIncomplete {
            produced, failures, ..
        }) => {
            assert_eq!(produced, 0);
            assert!(failures >= 3);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn cancelled_token_stops_generation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(
        generator(11)
            .generate_with_cancel(1_000, BirthYearWindow::new(1950, 2005), &cancel)
            .unwrap_err(),
        Error::Cancelled
    );
}

#[test]
fn cancelling_a_running_batch_stops_workers() {
    // Every draw takes a millisecond, so the batch is still running when
    // the other thread cancels.
    #[derive(Clone)]
    struct Slow;

    impl PersonAttributeProvider for Slow {
        fn raw_identity_number(&mut self) -> Option<String> {
            std::thread::sleep(std::time::Duration::from_millis(1));
            None
        }
    }

    let generator = BatchGenerator::with_sources(config(12), FixedDate(today()), Slow);
    let cancel = CancellationToken::new();
    let result = std::thread::scope(|scope| {
        let canceller = cancel.clone();
        scope.spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            canceller.cancel();
        });
        generator.generate_with_cancel(10_000, BirthYearWindow::new(1950, 2005), &cancel)
    });
    assert_eq!(result.unwrap_err(), Error::Cancelled);
}

#[test]
fn generate_batch_uses_today() {
    let formatted = generate_batch(25, 1950, 2005).unwrap();
    assert_eq!(formatted.len(), 25);
    assert!(formatted.iter().all(|f| f.short.len() == 11 && f.long.len() == 12));
}
