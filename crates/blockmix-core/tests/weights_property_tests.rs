use blockmix_core::weights::{clamp_weight, even_weight, normalize};
use blockmix_core::ReplaceError;
use proptest::prelude::*;

fn weights() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(0u8..=100, 1..=10)
        .prop_filter("at least one non-zero weight", |ws| ws.iter().any(|&w| w > 0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn each_share_is_within_half_a_point(ws in weights()) {
        let total: i64 = ws.iter().map(|&w| w as i64).sum();
        let percents = normalize(&ws).expect("non-zero total");
        prop_assert_eq!(percents.len(), ws.len());
        for (&w, &p) in ws.iter().zip(&percents) {
            // |p - w*100/total| <= 1/2, scaled by 2*total
            let diff = (p as i64 * total - w as i64 * 100).abs();
            prop_assert!(diff * 2 <= total, "w={} p={} total={}", w, p, total);
        }
    }

    #[test]
    fn zero_weights_stay_zero(ws in weights()) {
        let percents = normalize(&ws).expect("non-zero total");
        for (&w, &p) in ws.iter().zip(&percents) {
            if w == 0 {
                prop_assert_eq!(p, 0);
            }
        }
    }

    #[test]
    fn scaling_every_weight_keeps_the_shares(ws in proptest::collection::vec(1u8..=25, 1..=10), k in 1u8..=4) {
        let scaled: Vec<u8> = ws.iter().map(|&w| w * k).collect();
        prop_assert_eq!(normalize(&ws).unwrap(), normalize(&scaled).unwrap());
    }

    #[test]
    fn clamp_stays_in_slider_range(raw in any::<i64>()) {
        let w = clamp_weight(raw);
        prop_assert!(w <= 100);
        if (0..=100).contains(&raw) {
            prop_assert_eq!(w as i64, raw);
        }
    }

    #[test]
    fn even_weights_never_exceed_100_in_total(count in 1usize..=10) {
        prop_assert!(even_weight(count) as usize * count <= 100);
    }
}

#[test]
fn zero_total_is_rejected() {
    assert_eq!(normalize(&[0; 10]), Err(ReplaceError::ZeroWeight));
}
