//! Sub-pixel refinement checked against hand-computed fixture cases.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use stereobm::lowlevel::{refine_disparity, subpixel_delta, BestMatch};

#[derive(Debug, Deserialize)]
struct RefineCase {
    name: String,
    disparity: usize,
    cost: u32,
    prev: Option<u32>,
    next: Option<u32>,
    num_disparities: usize,
    expected: i16,
}

#[derive(Debug, Deserialize)]
struct DeltaCase {
    cost: u32,
    prev: u32,
    next: u32,
    expected: i32,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    cases: Vec<RefineCase>,
    deltas: Vec<DeltaCase>,
}

fn load_fixture() -> Fixture {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/subpixel_cases.json");
    let text = fs::read_to_string(&path).expect("Failed to read fixture");
    serde_json::from_str(&text).expect("Failed to parse fixture")
}

#[test]
fn refined_disparities_match_fixture() {
    let fixture = load_fixture();
    assert!(!fixture.cases.is_empty());
    for case in &fixture.cases {
        let best = BestMatch {
            disparity: case.disparity,
            cost: case.cost,
            prev_cost: case.prev,
            next_cost: case.next,
            ambiguous: false,
        };
        assert_eq!(
            refine_disparity(&best, case.num_disparities),
            case.expected,
            "case {}",
            case.name
        );
    }
}

#[test]
fn deltas_match_fixture() {
    for case in load_fixture().deltas {
        assert_eq!(
            subpixel_delta(case.cost, case.prev, case.next),
            case.expected,
            "{case:?}"
        );
    }
}

#[test]
fn refined_value_stays_within_half_pixel() {
    for c in [0u32, 5, 50] {
        for p in c..c + 40 {
            for n in c..c + 40 {
                let best = BestMatch {
                    disparity: 10,
                    cost: c,
                    prev_cost: Some(p),
                    next_cost: Some(n),
                    ambiguous: false,
                };
                let v = refine_disparity(&best, 32);
                assert!((152..=168).contains(&v), "c {c}, p {p}, n {n} -> {v}");
            }
        }
    }
}
