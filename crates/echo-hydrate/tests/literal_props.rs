// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests for literal encoding.
#![allow(clippy::expect_used)]

use echo_hydrate::literal;
use echo_hydrate::JsString;
use proptest::prelude::*;

fn text(s: &str) -> String {
    let mut out = String::new();
    literal::text(&JsString::from(s), &mut out);
    out
}

fn number(n: f64) -> String {
    let mut out = String::new();
    literal::number(n, &mut out);
    out
}

proptest! {
    #[test]
    fn text_never_closes_a_script_element(s in ".*") {
        let out = text(&format!("{s}</script>"));
        prop_assert!(!out.contains("</"), "closing tag in {}", out);
        prop_assert!(!out.contains('<'), "raw '<' in {}", out);
        prop_assert!(!out.contains('\n'), "raw newline in {}", out);
        prop_assert!(!out.contains('\u{2028}'), "raw line separator in {}", out);
        prop_assert!(!out.contains('\u{2029}'), "raw paragraph separator in {}", out);
    }

    // JSON forbids raw C0 controls, which JS string literals allow.
    #[test]
    fn text_is_a_json_string(s in "[^\u{0}-\u{7}\u{b}\u{e}-\u{1f}]*") {
        let out = text(&s);
        let back: String = serde_json::from_str(&out).expect("valid JSON string literal");
        prop_assert_eq!(back, s);
    }

    #[test]
    fn finite_numbers_round_trip(n in any::<f64>().prop_filter("finite", |n| n.is_finite())) {
        let out = number(n);
        let back: f64 = out.parse().expect("parseable number");
        prop_assert_eq!(back.to_bits(), n.to_bits());
    }
}
