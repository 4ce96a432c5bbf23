//! LED 色相影子状态集成测试

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use thymio_sdk::driver::MockTransport;
use thymio_sdk::prelude::*;
use thymio_sdk::protocol::{Rgb, hue_to_rgb};

const WAIT: Duration = Duration::from_secs(2);

fn offline_thymio(transport: &MockTransport) -> Thymio {
    ThymioBuilder::new()
        .transport(Arc::new(transport.clone()))
        .auto_connect(false)
        .build()
        .unwrap()
}

#[test]
fn test_bottom_group_only_touches_bottom_leds() {
    let transport = MockTransport::new();
    let thymio = offline_thymio(&transport);
    let leds = thymio.leds();

    leds.set_hue(LedGroup::Top, 99).unwrap().wait_all_timeout(WAIT).unwrap();
    leds.change_hue(LedGroup::Bottom, 33)
        .unwrap()
        .wait_all_timeout(WAIT)
        .unwrap();
    assert_eq!(leds.hues(), [99, 33, 33]);

    let paths: Vec<_> = transport.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/nodes/thymio-II/V_leds_top/0/32/32",
            "/nodes/thymio-II/V_leds_bottom/0/32/32/0",
            "/nodes/thymio-II/V_leds_bottom/1/32/32/0"
        ]
    );
}

#[test]
fn test_clones_share_shadow_state() {
    let transport = MockTransport::new();
    let thymio = offline_thymio(&transport);
    let other = thymio.clone();

    thymio
        .leds()
        .set_hue(LedGroup::All, 150)
        .unwrap()
        .wait_all_timeout(WAIT)
        .unwrap();
    assert_eq!(other.leds().hues(), [150, 150, 150]);
}

#[test]
fn test_rgb_by_menu_name() {
    let transport = MockTransport::new();
    let thymio = offline_thymio(&transport);

    let acks = thymio
        .leds()
        .rgb(LedGroup::from_menu("bogus"), 1.0, 2.0, 3.0)
        .unwrap();
    assert_eq!(acks.len(), 3);
    acks.wait_all_timeout(WAIT).unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_change_hue_tracks_sum(start in -1000i64..1000, deltas in prop::collection::vec(-500i64..500, 1..4)) {
        let transport = MockTransport::new();
        let thymio = offline_thymio(&transport);
        let leds = thymio.leds();

        leds.set_hue(LedGroup::Top, start).unwrap().wait_all_timeout(WAIT).unwrap();
        let mut expected = start;
        for delta in &deltas {
            leds.change_hue(LedGroup::Top, *delta).unwrap().wait_all_timeout(WAIT).unwrap();
            expected += delta;
        }

        let hue = leds.hues()[0];
        prop_assert_eq!(i64::from(hue), expected.rem_euclid(198));
        prop_assert_eq!(leds.hues()[1], 0);

        let last = transport.requests().pop().unwrap();
        let rgb = hue_to_rgb(expected);
        let clamp = |v: i32| v.min(32);
        let expected_rgb = Rgb::new(clamp(rgb.r), clamp(rgb.g), clamp(rgb.b));
        prop_assert_eq!(
            last.path,
            format!(
                "/nodes/thymio-II/V_leds_top/{}/{}/{}",
                expected_rgb.r, expected_rgb.g, expected_rgb.b
            )
        );
    }
}
