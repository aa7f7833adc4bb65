// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Properties of non-maximum suppression over generated candidate sets

use yolo_detection_node::vision::{
    iou,
    yolo::{non_max_suppression, Detection, DEFAULT_IOU_THRESHOLD},
    BoundingBox,
};

/// Small deterministic generator so failures are reproducible
struct Lcg(u64);

impl Lcg {
    fn next_f32(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f32) / (1u64 << 24) as f32
    }
}

fn candidates(seed: u64, count: usize) -> Vec<Detection> {
    let mut rng = Lcg(seed);
    (0..count)
        .map(|i| {
            let x = rng.next_f32() * 600.0;
            let y = rng.next_f32() * 600.0;
            let w = 10.0 + rng.next_f32() * 120.0;
            let h = 10.0 + rng.next_f32() * 120.0;
            Detection {
                bbox: BoundingBox::new(x, y, x + w, y + h),
                class_id: i % 80,
                label: format!("class_{}", i % 80),
                score: 0.5 + rng.next_f32() * 0.5,
            }
        })
        .collect()
}

#[test]
fn test_idempotence() {
    for seed in 1..20 {
        let input = candidates(seed, 150);
        let once = non_max_suppression(&input, DEFAULT_IOU_THRESHOLD);
        let twice = non_max_suppression(&once, DEFAULT_IOU_THRESHOLD);
        assert_eq!(once, twice, "seed {}", seed);
    }
}

#[test]
fn test_survivors_do_not_overlap() {
    for seed in 1..20 {
        let result = non_max_suppression(&candidates(seed, 200), DEFAULT_IOU_THRESHOLD);
        for (i, a) in result.iter().enumerate() {
            for b in &result[i + 1..] {
                assert!(iou(&a.bbox, &b.bbox) < DEFAULT_IOU_THRESHOLD);
            }
        }
    }
}

#[test]
fn test_output_is_sorted_subset() {
    let input = candidates(7, 100);
    let result = non_max_suppression(&input, DEFAULT_IOU_THRESHOLD);

    assert!(!result.is_empty());
    assert!(result.len() <= input.len());
    assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(result.iter().all(|d| input.contains(d)));

    // The best candidate always survives
    let best = input
        .iter()
        .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
        .unwrap();
    assert_eq!(&result[0], best);
}

#[test]
fn test_every_suppressed_box_overlaps_a_survivor() {
    let input = candidates(11, 120);
    let result = non_max_suppression(&input, DEFAULT_IOU_THRESHOLD);

    for candidate in input.iter().filter(|c| !result.contains(c)) {
        assert!(result
            .iter()
            .any(|kept| kept.score >= candidate.score
                && iou(&kept.bbox, &candidate.bbox) >= DEFAULT_IOU_THRESHOLD));
    }
}

#[test]
fn test_threshold_one_keeps_all_but_identical_boxes() {
    let input = candidates(3, 50);
    let result = non_max_suppression(&input, 1.0);
    assert_eq!(result.len(), input.len());
}
