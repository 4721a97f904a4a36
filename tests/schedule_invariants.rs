use pi_light::*;
use proptest::collection::vec;
use proptest::prelude::*;

fn arb_day() -> impl Strategy<Value = Day> {
    (0..Day::ALL.len()).prop_map(|index| Day::ALL[index])
}

/// Rules on `day` whose bounds fall inside `[0, horizon]`
fn arb_rule(day: impl Strategy<Value = Day>, horizon: u32) -> impl Strategy<Value = Rule> {
    (day, 0..horizon)
        .prop_flat_map(move |(day, start)| (Just(day), Just(start), start + 1..=horizon, any::<u8>()))
        .prop_map(|(day, start, stop, red)| {
            let color = Color::new(red, 0, 0, 1.0).unwrap();
            Rule::new(day, start, stop, color, color).unwrap()
        })
}

/// Small horizons force plenty of overlaps, the full day keeps real bounds covered
fn arb_horizon() -> impl Strategy<Value = u32> {
    prop_oneof![Just(20u32), Just(200u32), Just(MSEC_PER_DAY)]
}

fn assert_sorted_and_disjoint(scheduler: &Scheduler) {
    for (day, rules) in scheduler.iter() {
        for rule in rules {
            assert_eq!(rule.day(), day);
        }
        for pair in rules.windows(2) {
            assert!(
                pair[0].stop_time() < pair[1].start_time(),
                "{} overlaps or precedes {} on {}",
                pair[0],
                pair[1],
                day
            );
        }
    }
}

proptest! {
    #[test]
    fn insertions_keep_days_sorted_and_disjoint(
        rules in arb_horizon().prop_flat_map(|horizon| vec(arb_rule(arb_day(), horizon), 1..100))
    ) {
        let mut scheduler = Scheduler::new();
        for rule in rules {
            scheduler.add_rule(rule.clone());
            assert_sorted_and_disjoint(&scheduler);

            // The newest rule is always present unmodified
            prop_assert!(scheduler.rules(rule.day()).contains(&rule), "{} was altered", rule);
        }
    }

    #[test]
    fn removals_keep_days_sorted_and_disjoint(
        steps in vec((arb_rule(arb_day(), 1_000), any::<bool>(), any::<bool>()), 1..100)
    ) {
        let mut scheduler = Scheduler::new();

        for (rule, remove, by_hash) in steps {
            let day = rule.day();
            scheduler.add_rule(rule);

            if remove {
                let target = scheduler.rules(day)[0].clone();
                if by_hash {
                    prop_assert_eq!(
                        scheduler.remove_rule_by_hash(target.content_hash()).unwrap(),
                        target.clone()
                    );
                } else {
                    scheduler.remove_rule(&target).unwrap();
                }
                prop_assert!(!scheduler.rules(day).contains(&target));
            }
            assert_sorted_and_disjoint(&scheduler);
        }
    }

    #[test]
    fn overlapped_rule_keeps_only_its_remainder(
        existing in arb_rule(Just(Day::Thursday), 100),
        newer in arb_rule(Just(Day::Thursday), 100),
    ) {
        let mut scheduler = Scheduler::new();
        scheduler.add_rule(existing.clone());
        scheduler.add_rule(newer.clone());

        let (es, ee) = (existing.start_time(), existing.stop_time());
        let (ns, ne) = (newer.start_time(), newer.stop_time());

        let mut expected = vec![newer.clone()];
        if !existing.overlaps(&newer, None) {
            expected.push(existing.clone());
        } else {
            // Remainders of a single instant can't be rules and are dropped
            if es + 1 < ns {
                expected.push(existing.with_bounds(es, ns - 1).unwrap());
            }
            if ne + 1 < ee {
                expected.push(existing.with_bounds(ne + 1, ee).unwrap());
            }
        }
        expected.sort_by_key(Rule::start_time);

        prop_assert_eq!(scheduler.rules(Day::Thursday), expected.as_slice());
    }
}

#[test]
fn seed_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    let warm = Color::from_hex("#ffb060", 0.8).unwrap();

    let mut scheduler = Scheduler::new();
    for day in parse_days("weekdays").unwrap() {
        scheduler.add_rule(
            Rule::new(
                day,
                parse_time_of_day("6:30").unwrap(),
                parse_time_of_day("7:30").unwrap(),
                Color::default(),
                warm,
            )
            .unwrap(),
        );
    }

    save_rules(&path, &scheduler).unwrap();
    let loaded = load_rules(&path).unwrap();

    assert_eq!(loaded, scheduler);
    assert_eq!(loaded.len(), 5);
    assert!(loaded.rules(Day::Saturday).is_empty());
    assert_eq!(
        loaded.current_color(Day::Monday, parse_time_of_day("7:30").unwrap()),
        warm
    );
}

#[test]
fn missing_seed_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    assert!(matches!(
        load_rules(&dir.path().join("missing.json")),
        Err(Error::Io(_))
    ));
}

#[test]
fn broken_seed_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"Monday\": [").unwrap();

    assert!(load_rules_or_empty(&broken).is_empty());
    assert!(load_rules_or_empty(&dir.path().join("missing.json")).is_empty());
}

#[test]
fn seed_file_with_malformed_day_keeps_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    std::fs::write(
        &path,
        r#"{"Monday": {"start_time": 0, "stop_time": 10}, "Tuesday": [{"start_time": 10, "stop_time": 20}]}"#,
    )
    .unwrap();

    let scheduler = load_rules_or_empty(&path);
    assert_eq!(scheduler.len(), 1);
    assert_eq!(scheduler.rules(Day::Tuesday)[0].stop_time(), 20);
}
