use super::*;

#[test]
fn radius_0_is_single_unit_weight() {
    let k = GaussianKernel::new(0);
    assert_eq!(k.side(), 1);
    assert_eq!(k.to_matrix(), vec![1.0]);
    assert_eq!(k.quantize_q16(), vec![Q16_ONE]);
}

#[test]
fn matrix_weights_sum_to_one_for_many_radii() {
    for r in 0..=40 {
        let k = GaussianKernel::new(r);
        let m = k.to_matrix();
        assert_eq!(m.len(), (2 * r as usize + 1).pow(2));
        let sum: f64 = m.iter().sum();
        assert!((sum - 1.0).abs() <= 1e-6, "radius {r} sums to {sum}");
    }
}

#[test]
fn regeneration_is_stable() {
    let a = GaussianKernel::new(10);
    for _ in 0..5 {
        assert_eq!(GaussianKernel::new(10), a);
    }
    assert!((a.sigma() - 10.0 / 3.0).abs() < 1e-12);
}

#[test]
fn weights_are_symmetric_and_peak_at_center() {
    let k = GaussianKernel::new(3);
    let r = 3;
    for d in 1..=r {
        assert_eq!(k.weight(d, 0), k.weight(-d, 0));
        assert_eq!(k.weight(0, d), k.weight(d, 0));
        assert!(k.weight(0, 0) > k.weight(d, 0));
    }
}

#[test]
fn q16_taps_sum_exactly_to_one() {
    for r in [1u32, 2, 5, 10, 25] {
        let q = GaussianKernel::new(r).quantize_q16();
        assert_eq!(q.iter().sum::<u32>(), Q16_ONE);
    }
}

#[test]
fn explicit_sigma_must_be_positive() {
    assert!(GaussianKernel::with_sigma(3, 0.0).is_err());
    assert!(GaussianKernel::with_sigma(3, f64::NAN).is_err());
    assert!(GaussianKernel::with_sigma(0, 0.0).is_ok());
    let k = GaussianKernel::with_sigma(2, 1.2).unwrap();
    let sum: f64 = k.to_matrix().iter().sum();
    assert!((sum - 1.0).abs() <= 1e-6);
}

#[test]
fn weight_is_zero_outside_the_support() {
    let k = GaussianKernel::new(3);
    assert!(k.weight(3, -3) > 0.0);
    assert_eq!(k.weight(4, 0), 0.0);
    assert_eq!(k.weight(0, -4), 0.0);
    assert_eq!(k.weight(i32::MIN, i32::MAX), 0.0);
    assert_eq!(GaussianKernel::new(0).weight(0, 0), 1.0);
    assert_eq!(GaussianKernel::new(0).weight(1, 0), 0.0);
}
