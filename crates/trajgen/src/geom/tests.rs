use super::*;
use nalgebra::Vector3;
use proptest::prelude::*;

fn unit_box() -> CorridorBox {
    CorridorBox::from_bounds([(0.0, 1.0), (0.0, 1.0), (0.0, 1.0)])
}

#[test]
fn from_bounds_places_corners_and_center() {
    let b = CorridorBox::from_bounds([(-1.0, 2.0), (3.0, 5.0), (0.5, 1.5)]);
    assert_eq!(b.bounds, [(-1.0, 2.0), (3.0, 5.0), (0.5, 1.5)]);
    assert!((b.center - Vector3::new(0.5, 4.0, 1.0)).norm() < 1e-12);
    // corner 0 = (x_hi, y_lo, z_hi), corner 6 = (x_lo, y_hi, z_lo)
    assert_eq!(b.vertex.row(0).transpose(), Vector3::new(2.0, 3.0, 1.5));
    assert_eq!(b.vertex.row(6).transpose(), Vector3::new(-1.0, 5.0, 0.5));
    assert!(b.valid);
    assert_eq!(b.t, 0.0);
}

#[test]
fn from_vertices_roundtrips_bounds() {
    let src = CorridorBox::from_bounds([(0.0, 4.0), (-2.0, 2.0), (1.0, 3.0)]);
    let b = CorridorBox::from_vertices(src.vertex, src.center);
    assert_eq!(b.bounds, src.bounds);
}

#[test]
fn set_vertex_pads_by_half_resolution() {
    let src = unit_box();
    let mut b = CorridorBox::default();
    b.set_vertex(src.vertex, 0.2);
    for (lo, hi) in b.bounds {
        assert!((lo + 0.1).abs() < 1e-12);
        assert!((hi - 1.1).abs() < 1e-12);
    }
}

#[test]
fn axis_parsing_is_case_insensitive() {
    assert_eq!(Axis::try_from('X'), Ok(Axis::X));
    assert_eq!(Axis::try_from('y'), Ok(Axis::Y));
    assert_eq!(Axis::try_from('Z'), Ok(Axis::Z));
    assert_eq!(Axis::try_from('w'), Err(GeomError::UnknownAxis('w')));
}

#[test]
fn slice_rejects_unknown_axis() {
    let mut b = unit_box();
    assert!(matches!(
        b.slice_into_two('q', DEFAULT_OVERLAP),
        Err(GeomError::UnknownAxis('q'))
    ));
}

#[test]
fn slice_default_overlap_is_twenty_percent() {
    let mut b = CorridorBox::from_bounds([(0.0, 10.0), (0.0, 1.0), (0.0, 1.0)]);
    let (b1, b2) = b.slice_into_two('x', DEFAULT_OVERLAP).unwrap();
    assert!((b1[0].1 - 6.0).abs() < 1e-12);
    assert!((b2[0].0 - 4.0).abs() < 1e-12);
    assert_eq!(b1[1], b.bounds[1]);
    assert_eq!(b2[2], b.bounds[2]);
}

#[test]
fn split_halves_time() {
    let mut b = unit_box();
    b.t = 3.0;
    let (c1, c2) = b.split('z', 0.1).unwrap();
    assert_eq!(c1.t, 1.5);
    assert_eq!(c2.t, 1.5);
    assert!(CorridorBox::contains(&b, &c1));
    assert!(CorridorBox::contains(&b, &c2));
}

#[test]
fn contains_strictly_nested_is_one_way() {
    let outer = CorridorBox::from_bounds([(0.0, 4.0), (0.0, 4.0), (0.0, 4.0)]);
    let inner = CorridorBox::from_bounds([(1.0, 2.0), (1.0, 2.0), (1.0, 2.0)]);
    assert!(CorridorBox::contains(&outer, &inner));
    assert!(!CorridorBox::contains(&inner, &outer));
}

#[test]
fn contains_point_uses_bounds() {
    let b = unit_box();
    assert!(b.contains_point(&Vector3::new(0.5, 0.0, 1.0)));
    assert!(!b.contains_point(&Vector3::new(0.5, -0.1, 0.5)));
}

fn arb_bounds() -> impl Strategy<Value = Bounds3> {
    let pair = (-50.0f64..50.0, 0.01f64..20.0).prop_map(|(lo, len)| (lo, lo + len));
    prop::array::uniform3(pair)
}

proptest! {
    #[test]
    fn set_box_is_idempotent(bounds in arb_bounds()) {
        let mut b = CorridorBox::from_bounds(bounds);
        b.set_box();
        let once = b.bounds;
        b.set_box();
        prop_assert_eq!(once, b.bounds);
        prop_assert_eq!(once, bounds);
    }

    #[test]
    fn slice_covers_extent_with_expected_overlap(
        bounds in arb_bounds(),
        axis in prop::sample::select(vec!['x', 'y', 'z', 'X', 'Y', 'Z']),
        overlap in 0.0f64..0.45,
    ) {
        let mut b = CorridorBox::from_bounds(bounds);
        let i = Axis::try_from(axis).unwrap().index();
        let (lo, hi) = bounds[i];
        let (b1, b2) = b.slice_into_two(axis, overlap).unwrap();
        prop_assert_eq!(b1[i].0, lo);
        prop_assert_eq!(b2[i].1, hi);
        prop_assert!(b1[i].1 >= b2[i].0);
        let shared = b1[i].1 - b2[i].0;
        prop_assert!((shared - 2.0 * overlap * (hi - lo)).abs() < 1e-9 * (1.0 + hi - lo));
    }

    #[test]
    fn contains_is_reflexive(bounds in arb_bounds()) {
        let b = CorridorBox::from_bounds(bounds);
        prop_assert!(CorridorBox::contains(&b, &b));
    }
}
