use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stereobm::{
    compute_disparity, ImageView, Passthrough, Prefilter, StereoConfig, StereoMatcher, FILTERED,
};

fn random_image(rng: &mut StdRng, width: usize, height: usize) -> Vec<u8> {
    (0..width * height).map(|_| rng.random_range(0..=62)).collect()
}

/// Right image seeing the left scene shifted by `shift` pixels.
fn shifted(left: &[u8], width: usize, shift: usize, fill: u8) -> Vec<u8> {
    left.chunks(width)
        .flat_map(|row| (0..width).map(move |x| row.get(x + shift).copied().unwrap_or(fill)))
        .collect()
}

fn is_border(cfg: &StereoConfig, width: usize, height: usize, x: usize, y: usize) -> bool {
    let half = cfg.half_window();
    y < half || y + half >= height || x < cfg.num_disparities - 1 + half || x + half >= width
}

fn round_half_away(num: i64, den: i64) -> i64 {
    let q = (2 * num.abs() + den) / (2 * den);
    if num < 0 {
        -q
    } else {
        q
    }
}

/// Direct evaluation of every window; only valid away from the border.
fn reference_pixel(
    cfg: &StereoConfig,
    left: &[u8],
    right: &[u8],
    width: usize,
    x: usize,
    y: usize,
) -> i16 {
    let half = cfg.half_window();
    let at = |img: &[u8], xx: usize, yy: usize| img[yy * width + xx] as i64;

    let mut texture = 0i64;
    for yy in y - half..=y + half {
        for xx in x - half..=x + half {
            texture += (at(left, xx, yy) - cfg.pre_filter_cap as i64).abs();
        }
    }
    if texture < cfg.texture_threshold as i64 {
        return FILTERED;
    }

    let costs: Vec<i64> = (0..cfg.num_disparities)
        .map(|d| {
            let mut sum = 0;
            for yy in y - half..=y + half {
                for xx in x - half..=x + half {
                    sum += (at(left, xx, yy) - at(right, xx - d, yy)).abs();
                }
            }
            sum
        })
        .collect();

    let mut best = 0;
    for d in 1..costs.len() {
        if costs[d] < costs[best] {
            best = d;
        }
    }
    let c = costs[best];
    if cfg.uniqueness_ratio > 0 {
        let limit = c + c * cfg.uniqueness_ratio as i64 / 100;
        let ambiguous = costs
            .iter()
            .enumerate()
            .any(|(d, &cost)| d.abs_diff(best) > 1 && cost <= limit);
        if ambiguous {
            return FILTERED;
        }
    }

    let last = cfg.num_disparities - 1;
    let mut p = if best > 0 { costs[best - 1] } else { costs[best + 1] };
    let mut n = if best < last { costs[best + 1] } else { costs[best - 1] };
    if best == 0 {
        p = n;
    }
    if best == last {
        n = p;
    }
    let denom = p + n - 2 * c + (p - n).abs();
    let delta = if denom > 0 {
        round_half_away(256 * (p - n), denom)
    } else {
        0
    };
    ((best as i64 * 256 + delta + 15) >> 4) as i16
}

fn run(cfg: StereoConfig, left: &[u8], right: &[u8], width: usize, height: usize) -> Vec<i16> {
    let l = ImageView::from_slice(left, width, height).unwrap();
    let r = ImageView::from_slice(right, width, height).unwrap();
    StereoMatcher::new(cfg, width, height)
        .unwrap()
        .compute(l, r)
        .unwrap()
        .into_vec()
}

#[test]
fn shift_by_three_is_recovered() {
    let (w, h) = (16, 16);
    let mut rng = StdRng::seed_from_u64(3);
    let left = random_image(&mut rng, w, h);
    let right = shifted(&left, w, 3, 31);
    let cfg = StereoConfig {
        window_size: 5,
        num_disparities: 8,
        lane_width: 4,
        texture_threshold: 0,
        uniqueness_ratio: 0,
        ..StereoConfig::default()
    };

    let out = run(cfg, &left, &right, w, h);
    for y in 0..h {
        for x in 0..w {
            let v = out[y * w + x];
            if is_border(&cfg, w, h, x, y) {
                assert_eq!(v, FILTERED, "border ({x}, {y})");
            } else {
                assert!((v - 48).abs() <= 8, "({x}, {y}) = {v}");
            }
        }
    }
}

#[test]
fn matches_direct_window_evaluation() {
    let mut rng = StdRng::seed_from_u64(11);
    for case in 0..6 {
        let (w, h) = (40, 14);
        let left = random_image(&mut rng, w, h);
        let shift = rng.random_range(0..16);
        let mut right = shifted(&left, w, shift, 31);
        for v in right.iter_mut() {
            if rng.random_bool(0.1) {
                *v = rng.random_range(0..=62);
            }
        }
        for lane_width in [1, 4, 8, 16] {
            let cfg = StereoConfig {
                window_size: if case % 2 == 0 { 5 } else { 7 },
                num_disparities: 16,
                lane_width,
                texture_threshold: 200,
                uniqueness_ratio: 10,
                ..StereoConfig::default()
            };
            let out = run(cfg, &left, &right, w, h);
            for y in 0..h {
                for x in 0..w {
                    let expected = if is_border(&cfg, w, h, x, y) {
                        FILTERED
                    } else {
                        reference_pixel(&cfg, &left, &right, w, x, y)
                    };
                    assert_eq!(
                        out[y * w + x],
                        expected,
                        "case {case}, lanes {lane_width}, ({x}, {y})"
                    );
                }
            }
        }
    }
}

#[test]
fn lane_width_does_not_change_output() {
    let (w, h) = (48, 20);
    let mut rng = StdRng::seed_from_u64(5);
    let left = random_image(&mut rng, w, h);
    let right = shifted(&left, w, 6, 31);
    let base = StereoConfig {
        window_size: 7,
        num_disparities: 24,
        lane_width: 24,
        texture_threshold: 50,
        uniqueness_ratio: 15,
        ..StereoConfig::default()
    };
    let reference = run(base, &left, &right, w, h);
    for lane_width in [1, 2, 3, 4, 6, 8, 12] {
        let cfg = StereoConfig { lane_width, ..base };
        assert_eq!(run(cfg, &left, &right, w, h), reference, "lanes {lane_width}");
    }
}

#[test]
fn output_is_deterministic() {
    let (w, h) = (32, 16);
    let mut rng = StdRng::seed_from_u64(9);
    let left = random_image(&mut rng, w, h);
    let right = random_image(&mut rng, w, h);
    let cfg = StereoConfig {
        window_size: 5,
        num_disparities: 8,
        lane_width: 4,
        ..StereoConfig::default()
    };
    let l = ImageView::from_slice(&left, w, h).unwrap();
    let r = ImageView::from_slice(&right, w, h).unwrap();
    let first = compute_disparity(l, r, &cfg).unwrap();
    let second = compute_disparity(l, r, &cfg).unwrap();
    assert_eq!(first, second);
}

#[test]
fn repeated_pattern_is_rejected_as_ambiguous() {
    // Period 4 makes disparities 1 and 5 equally good.
    let (w, h) = (32, 12);
    let pattern = [5u8, 60, 20, 45];
    let left: Vec<u8> = (0..w * h).map(|i| pattern[(i % w) % 4]).collect();
    let right = shifted(&left, w, 1, 31);
    let cfg = StereoConfig {
        window_size: 5,
        num_disparities: 8,
        lane_width: 4,
        texture_threshold: 0,
        uniqueness_ratio: 15,
        ..StereoConfig::default()
    };
    let out = run(cfg, &left, &right, w, h);
    assert!(out.iter().all(|&v| v == FILTERED));

    let relaxed = StereoConfig {
        uniqueness_ratio: 0,
        ..cfg
    };
    let out = run(relaxed, &left, &right, w, h);
    for y in 2..h - 2 {
        for x in 9..w - 2 {
            let v = out[y * w + x];
            assert!((v - 16).abs() <= 8, "({x}, {y}) = {v}");
        }
    }
}

#[test]
fn constant_region_is_filtered_after_prefilter() {
    let (w, h) = (40, 20);
    let flat = vec![128u8; w * h];
    let view = ImageView::from_slice(&flat, w, h).unwrap();
    let cfg = StereoConfig {
        window_size: 5,
        num_disparities: 16,
        lane_width: 8,
        texture_threshold: 1,
        ..StereoConfig::default()
    };
    let map = compute_disparity(view, view, &cfg).unwrap();
    assert_eq!(map.valid_count(), 0);
}

#[test]
fn passthrough_prefilter_feeds_matcher_unchanged() {
    let (w, h) = (24, 12);
    let mut rng = StdRng::seed_from_u64(21);
    let left = random_image(&mut rng, w, h);
    let right = shifted(&left, w, 2, 31);
    let cfg = StereoConfig {
        window_size: 5,
        num_disparities: 8,
        lane_width: 8,
        texture_threshold: 0,
        uniqueness_ratio: 0,
        ..StereoConfig::default()
    };
    let l = ImageView::from_slice(&left, w, h).unwrap();
    let r = ImageView::from_slice(&right, w, h).unwrap();
    let copy = Passthrough.apply(l).unwrap();
    assert_eq!(copy.data(), left.as_slice());

    let via_chain = stereobm::compute_disparity_with(&Passthrough, l, r, &cfg).unwrap();
    assert_eq!(via_chain.into_vec(), run(cfg, &left, &right, w, h));
}
