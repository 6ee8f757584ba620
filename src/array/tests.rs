// Codec, window and edit tests for point arrays

use super::*;
use crate::error::PointArrayError;
use std::sync::Arc;
use ultraviolet::Vec2;

fn random_walk(seed: u64, n: usize, step: f32) -> Vec<f32> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut coords = Vec::with_capacity(n * 2);
    let (mut x, mut y) = (rng.f32() * 360.0 - 180.0, rng.f32() * 180.0 - 90.0);
    for _ in 0..n {
        coords.push(x);
        coords.push(y);
        x += (rng.f32() - 0.5) * step;
        y += (rng.f32() - 0.5) * step;
    }
    coords
}

fn assert_within_half_step(array: &CompressedArray, original: &[f32]) {
    let scale = array.scale();
    let tol = Vec2::new(scale.x * 0.5 + 1e-3, scale.y * 0.5 + 1e-3);
    assert_eq!(array.count() * 2, original.len());
    for (i, p) in array.points().enumerate() {
        let (ox, oy) = (original[2 * i], original[2 * i + 1]);
        assert!(
            (p.x - ox).abs() <= tol.x && (p.y - oy).abs() <= tol.y,
            "point {} decoded to ({}, {}), expected ({}, {}) within {:?}",
            i,
            p.x,
            p.y,
            ox,
            oy,
            tol
        );
    }
}

fn compressed(coords: &[f32]) -> PointArray {
    PointArray::Compressed(CompressedArray::from_coords(coords).unwrap())
}

#[cfg(test)]
mod codec {
    use super::*;

    #[test]
    fn random_walks_round_trip_within_half_step() {
        for seed in 0..8 {
            let coords = random_walk(seed, 200, 2.0 + seed as f32);
            let array = CompressedArray::from_coords(&coords).unwrap();
            assert_within_half_step(&array, &coords);
        }
    }

    #[test]
    fn first_point_is_the_anchor() {
        let coords = random_walk(42, 50, 5.0);
        let array = CompressedArray::from_coords(&coords).unwrap();
        assert_eq!(array.first_point(), Vec2::new(coords[0], coords[1]));
        assert_eq!(array.origin(), array.first_point());
        assert_eq!(&array.deltas()[..2], &[0, 0]);
    }

    #[test]
    fn count_is_half_the_range() {
        let coords = random_walk(3, 30, 1.0);
        let array = CompressedArray::new(&coords, 4, 24).unwrap();
        assert_eq!(array.count(), 10);
        assert_eq!(array.deltas().len(), 20);
        assert_eq!(array.first_point(), Vec2::new(coords[4], coords[5]));
        assert_within_half_step(&array, &coords[4..24]);
    }

    #[test]
    fn large_jump_forces_coarse_scale() {
        let coords = [0.0, 0.0, 1.0, 1.0, 2.0, 0.0, 100.0, 100.0];
        let array = CompressedArray::from_coords(&coords).unwrap();
        let scale = array.scale();
        assert!(scale.x >= 98.0 / 127.0 - 1e-6, "scale.x = {}", scale.x);
        assert!(scale.y >= 100.0 / 127.0 - 1e-6, "scale.y = {}", scale.y);
        assert_within_half_step(&array, &coords);
        assert!(array.deltas().iter().any(|&d| d == 127));
    }

    #[test]
    fn single_ordinate_is_invalid_range() {
        let err = CompressedArray::new(&[1.0, 2.0, 3.0], 0, 1).unwrap_err();
        assert!(matches!(err, PointArrayError::InvalidRange { lower: 0, upper: 1, .. }));
    }

    #[test]
    fn odd_and_out_of_buffer_ranges_are_invalid() {
        let coords = [0.0; 8];
        assert!(matches!(
            CompressedArray::new(&coords, 0, 5),
            Err(PointArrayError::InvalidRange { .. })
        ));
        assert!(matches!(
            CompressedArray::new(&coords, 2, 10),
            Err(PointArrayError::InvalidRange { .. })
        ));
        assert!(matches!(
            CompressedArray::new(&coords, 6, 4),
            Err(PointArrayError::InvalidRange { .. })
        ));
        assert!(matches!(
            CompressedArray::from_coords(&[]),
            Err(PointArrayError::InvalidRange { .. })
        ));
    }

    #[test]
    fn non_finite_ordinates_are_rejected() {
        let coords = [0.0, 0.0, f32::NAN, 1.0];
        assert!(matches!(
            CompressedArray::from_coords(&coords),
            Err(PointArrayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn spans_beyond_f32_range_fail_instead_of_decoding_nan() {
        let result = CompressedArray::from_coords(&[-3.0e38, 0.0, 3.0e38, 1.0]);
        assert!(
            matches!(result, Err(PointArrayError::ArithmeticOverflow { attempts: 0 })),
            "got {:?}",
            result
        );

        // Each step fits, but the distance from the anchor does not.
        let result = CompressedArray::from_coords(&[-3.0e38, 0.0, 0.0, 0.0, 3.0e38, 0.0]);
        assert!(
            matches!(result, Err(PointArrayError::ArithmeticOverflow { .. })),
            "got {:?}",
            result
        );
    }

    #[test]
    fn single_point_and_constant_axis_decode_exactly() {
        let single = CompressedArray::from_coords(&[12.5, -3.25]).unwrap();
        assert_eq!(single.count(), 1);
        assert_eq!(single.last_point(), Vec2::new(12.5, -3.25));

        let coords = [5.0, 0.0, 5.0, 1.0, 5.0, 3.0];
        let array = CompressedArray::from_coords(&coords).unwrap();
        assert_eq!(array.scale().x, 0.0);
        assert!(array.points().all(|p| p.x == 5.0));
        assert_within_half_step(&array, &coords);
    }

    #[test]
    fn last_point_matches_iteration() {
        let coords = random_walk(9, 64, 3.0);
        let array = CompressedArray::from_coords(&coords).unwrap();
        assert_eq!(Some(array.last_point()), array.points().last());
    }

    #[test]
    fn from_parts_checks_layout() {
        let origin = Vec2::new(1.0, 2.0);
        let scale = Vec2::new(0.5, 0.5);
        assert!(CompressedArray::from_parts(origin, scale, vec![0, 0, 3, -4]).is_ok());
        assert!(matches!(
            CompressedArray::from_parts(origin, scale, vec![1, 0, 3, -4]),
            Err(PointArrayError::InvalidArgument(_))
        ));
        assert!(matches!(
            CompressedArray::from_parts(origin, scale, vec![0, 0, 3]),
            Err(PointArrayError::InvalidRange { .. })
        ));
        assert!(matches!(
            CompressedArray::from_parts(origin, Vec2::new(f32::INFINITY, 1.0), vec![0, 0]),
            Err(PointArrayError::InvalidArgument(_))
        ));
    }

    #[test]
    fn compressed_arrays_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PointArray>();

        let array = Arc::new(compressed(&random_walk(5, 100, 2.0)));
        let expected = array.to_vec();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let array = Arc::clone(&array);
                std::thread::spawn(move || array.to_vec())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }
}

#[cfg(test)]
mod windows {
    use super::*;

    fn ten_points() -> Vec<f32> {
        (0..10).flat_map(|i| [i as f32 * 1.5, (i as f32).sin() * 10.0]).collect()
    }

    #[test]
    fn subarray_of_ten_points() {
        let coords = ten_points();
        let array = compressed(&coords);
        let window = array.subarray(3, 7).unwrap().unwrap();
        assert_eq!(window.count(), 4);
        assert!(matches!(window, PointArray::Window(_)));
        assert_eq!(window.lower(), 6);
        assert_eq!(window.upper(), 14);

        let scale = match &array {
            PointArray::Compressed(c) => c.scale(),
            _ => unreachable!(),
        };
        let first = window.first_point().unwrap();
        assert!((first.x - coords[6]).abs() <= scale.x * 0.5 + 1e-4);
        assert!((first.y - coords[7]).abs() <= scale.y * 0.5 + 1e-4);
        assert_eq!(first, array.point_at(3).unwrap());
        assert_eq!(window.last_point(), Some(array.point_at(6).unwrap()));
    }

    #[test]
    fn window_origin_is_prefix_sum() {
        let array = CompressedArray::from_coords(&ten_points()).unwrap();
        let sub = match PointArray::from(array.clone()).subarray(4, 9).unwrap() {
            Some(PointArray::Window(w)) => w,
            other => panic!("expected a window, got {:?}", other),
        };
        let (sx, sy) = array.deltas()[..8]
            .chunks_exact(2)
            .fold((0i32, 0i32), |(x, y), d| (x + d[0] as i32, y + d[1] as i32));
        let expected = Vec2::new(
            array.origin().x + array.scale().x * sx as f32,
            array.origin().y + array.scale().y * sy as f32,
        );
        assert_eq!(sub.origin(), expected);
        assert_eq!(sub.scale(), array.scale());
    }

    #[test]
    fn windows_share_the_parent_buffer() {
        let array = CompressedArray::from_coords(&random_walk(1, 40, 2.0)).unwrap();
        let parent = PointArray::from(array.clone());
        let child = parent.subarray(5, 30).unwrap().unwrap();
        let grandchild = child.subarray(2, 10).unwrap().unwrap();
        match (&child, &grandchild) {
            (PointArray::Window(c), PointArray::Window(g)) => {
                assert!(Arc::ptr_eq(c.buffer(), array.buffer()));
                assert!(Arc::ptr_eq(g.buffer(), array.buffer()));
            }
            other => panic!("expected windows, got {:?}", other),
        }
    }

    #[test]
    fn nested_windows_compose() {
        let array = compressed(&random_walk(11, 20, 4.0));
        let (a, b, c, d) = (2, 15, 3, 9);
        let nested = array.subarray(a, b).unwrap().unwrap().subarray(c, d).unwrap().unwrap();
        let direct = array.subarray(a + c, a + d).unwrap().unwrap();
        assert_eq!(nested.lower(), direct.lower());
        assert_eq!(nested.upper(), direct.upper());
        assert_eq!(nested.to_vec(), direct.to_vec());
    }

    #[test]
    fn nested_window_is_validated_against_its_own_extent() {
        let array = compressed(&random_walk(12, 20, 4.0));
        let window = array.subarray(2, 8).unwrap().unwrap();
        assert!(matches!(
            window.subarray(0, 7),
            Err(PointArrayError::IndexOutOfRange { index: 7, count: 6 })
        ));
    }

    #[test]
    fn empty_and_full_ranges() {
        let array = compressed(&random_walk(2, 12, 1.0));
        for k in 0..=array.count() {
            assert!(array.subarray(k, k).unwrap().is_none());
        }
        let full = array.subarray(0, 12).unwrap().unwrap();
        assert_eq!(full, array);
    }

    #[test]
    fn out_of_range_requests() {
        let array = compressed(&random_walk(2, 12, 1.0));
        assert!(matches!(array.subarray(0, 13), Err(PointArrayError::IndexOutOfRange { .. })));
        assert!(matches!(array.subarray(5, 4), Err(PointArrayError::IndexOutOfRange { .. })));
        assert!(matches!(array.point_at(12), Err(PointArrayError::IndexOutOfRange { .. })));
        assert!(matches!(array.points(13), Err(PointArrayError::IndexOutOfRange { .. })));
    }

    #[test]
    fn iterator_starts_mid_array() {
        let array = compressed(&random_walk(6, 16, 2.0));
        let tail: Vec<Vec2> = array.points(10).unwrap().collect();
        assert_eq!(tail.len(), 6);
        for (i, p) in tail.iter().enumerate() {
            assert_eq!(*p, array.point_at(10 + i).unwrap());
        }
        let it = array.points(16).unwrap();
        assert_eq!(it.len(), 0);
    }

    #[test]
    fn compact_copies_the_window() {
        let array = compressed(&random_walk(8, 30, 2.0));
        let window = match array.subarray(7, 21).unwrap() {
            Some(PointArray::Window(w)) => w,
            other => panic!("expected a window, got {:?}", other),
        };
        let standalone = window.compact();
        assert_eq!(&standalone.deltas()[..2], &[0, 0]);
        assert_eq!(standalone.count(), 14);
        let expected = PointArray::Window(window).to_vec();
        let actual = PointArray::Compressed(standalone).to_vec();
        for (e, a) in expected.iter().zip(actual.iter()) {
            assert!((e - a).abs() < 1e-3, "{} vs {}", e, a);
        }
    }
}

#[cfg(test)]
mod decimation {
    use super::*;

    #[test]
    fn dry_run_reports_exact_size() {
        let array = compressed(&random_walk(4, 10, 1.0));
        for n in 1..=11 {
            let size = array.to_float_array(None, 2, n).unwrap();
            assert_eq!(size, 2 + 2 * 10usize.div_ceil(n));
            let mut buf = vec![0.0; size];
            assert_eq!(array.to_float_array(Some(&mut buf[..]), 2, n).unwrap(), size);
        }
    }

    #[test]
    fn keeps_last_point_of_each_group() {
        let array = compressed(&random_walk(4, 10, 1.0));
        let mut buf = vec![f32::NAN; 8];
        array.to_float_array(Some(&mut buf[..]), 0, 3).unwrap();
        for (slot, index) in [2usize, 5, 8, 9].iter().enumerate() {
            let p = array.point_at(*index).unwrap();
            assert_eq!((buf[slot * 2], buf[slot * 2 + 1]), (p.x, p.y));
        }
    }

    #[test]
    fn decimation_of_one_copies_everything() {
        let coords = random_walk(10, 7, 1.0);
        let array = PointArray::Editable(DynamicArray::from_coords(coords.clone()).unwrap());
        let mut buf = vec![0.0; 14];
        array.to_float_array(Some(&mut buf[..]), 0, 1).unwrap();
        assert_eq!(buf, coords);
    }

    #[test]
    fn invalid_decimation_and_short_buffer() {
        let array = compressed(&random_walk(4, 10, 1.0));
        assert!(matches!(
            array.to_float_array(None, 0, 0),
            Err(PointArrayError::InvalidArgument(_))
        ));
        let mut buf = vec![0.0; 5];
        assert!(matches!(
            array.to_float_array(Some(&mut buf[..]), 0, 2),
            Err(PointArrayError::InvalidArgument(_))
        ));
    }
}

#[cfg(test)]
mod edits {
    use super::*;

    #[test]
    fn reverse_five_points() {
        let coords = random_walk(21, 5, 3.0);
        let array = compressed(&coords);
        let forward: Vec<Vec2> = array.points(0).unwrap().collect();
        let reversed = array.reverse();
        assert!(matches!(reversed, PointArray::Editable(_)));
        assert!(!reversed.is_compressed());
        let backward: Vec<Vec2> = reversed.points(0).unwrap().collect();
        let mut expected = forward.clone();
        expected.reverse();
        assert_eq!(backward, expected);

        let twice = reversed.reverse();
        assert_eq!(twice.points(0).unwrap().collect::<Vec<_>>(), forward);
    }

    #[test]
    fn insert_materialises_editable_copy() {
        let array = compressed(&[0.0, 0.0, 10.0, 0.0, 20.0, 0.0]);
        let merged = array
            .clone()
            .insert_at(1, &[1.0, 1.0, 2.0, 2.0], true)
            .unwrap();
        assert!(matches!(merged, PointArray::Editable(_)));
        let pts: Vec<Vec2> = merged.points(0).unwrap().collect();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[1], Vec2::new(2.0, 2.0));
        assert_eq!(pts[2], Vec2::new(1.0, 1.0));
        assert_eq!(pts[3], array.point_at(1).unwrap());
        // The source array is untouched.
        assert_eq!(array.count(), 3);
    }

    #[test]
    fn empty_insert_is_a_no_op() {
        let array = compressed(&random_walk(3, 6, 1.0));
        let same = array.clone().insert_at(2, &[], false).unwrap();
        assert_eq!(same, array);
        assert!(same.is_compressed());

        let none = PointArray::Editable(DynamicArray::new());
        assert_eq!(array.clone().insert_points(0, &none, true).unwrap(), array);
    }

    #[test]
    fn insert_validates_arguments() {
        let array = compressed(&random_walk(3, 6, 1.0));
        assert!(matches!(
            array.clone().insert_at(0, &[1.0, 2.0, 3.0], false),
            Err(PointArrayError::InvalidArgument(_))
        ));
        assert!(matches!(
            array.insert_at(7, &[1.0, 2.0], false),
            Err(PointArrayError::IndexOutOfRange { index: 7, count: 6 })
        ));
    }

    #[test]
    fn insert_points_appends_other_array() {
        let head = compressed(&[0.0, 0.0, 1.0, 0.0]);
        let tail = compressed(&[5.0, 5.0, 6.0, 6.0, 7.0, 7.0]);
        let joined = head.insert_points(2, &tail, false).unwrap();
        assert_eq!(joined.count(), 5);
        assert_eq!(joined.last_point(), tail.last_point());
    }

    #[test]
    fn get_final_recompresses_editable() {
        let coords = random_walk(30, 25, 2.0);
        let editable = PointArray::Editable(DynamicArray::from_coords(coords.clone()).unwrap());
        let frozen = editable.clone().get_final(true).unwrap();
        match &frozen {
            PointArray::Compressed(c) => assert_within_half_step(c, &coords),
            other => panic!("expected compressed, got {:?}", other),
        }
        let raw = editable.clone().get_final(false).unwrap();
        assert_eq!(raw, editable);

        assert!(matches!(
            PointArray::Editable(DynamicArray::new()).get_final(true).unwrap(),
            PointArray::Editable(_)
        ));
    }

    #[test]
    fn get_final_is_identity_for_compressed() {
        let array = compressed(&random_walk(31, 8, 2.0));
        assert_eq!(array.clone().get_final(false).unwrap(), array);
        let window = array.subarray(1, 4).unwrap().unwrap();
        assert_eq!(window.clone().get_final(true).unwrap(), window);
    }

    #[test]
    fn dynamic_reverse_keeps_pairs() {
        let mut d = DynamicArray::from_coords(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        d.reverse();
        assert_eq!(d.coords(), &[5.0, 6.0, 3.0, 4.0, 1.0, 2.0]);
        assert!(DynamicArray::from_coords(vec![1.0]).is_err());
    }

    #[test]
    fn bounds_cover_every_point() {
        let array = compressed(&random_walk(40, 50, 6.0));
        let bounds = array.bounds().unwrap();
        assert!(array.points(0).unwrap().all(|p| bounds.contains(p)));
        assert!(PointArray::Editable(DynamicArray::new()).bounds().is_none());
    }

    #[test]
    fn compressed_memory_is_smaller_than_raw() {
        let coords = random_walk(41, 500, 2.0);
        let packed = compressed(&coords);
        let raw = PointArray::Editable(DynamicArray::from_coords(coords).unwrap());
        assert!(packed.memory_usage() * 3 < raw.memory_usage());
    }

    #[test]
    fn window_is_charged_for_the_pinned_buffer() {
        let parent = compressed(&random_walk(43, 100, 2.0));
        let window = parent.subarray(10, 20).unwrap().unwrap();
        assert_eq!(window.memory_usage(), parent.memory_usage());

        let PointArray::Window(w) = &window else {
            panic!("expected a window, got {:?}", window);
        };
        let standalone = PointArray::Compressed(w.compact());
        assert!(standalone.memory_usage() < window.memory_usage());
    }
}
