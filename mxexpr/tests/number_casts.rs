use mxexpr::prelude::*;
use rand::Rng;

#[test]
fn digest_round_trip_random_word_sized() {
    let mut rng = rand::rng();
    for _ in 0..64 {
        let raw: i64 = rng.random();
        let n = Number::from(raw);
        let (negative, bytes) = n.to_bytes_be().unwrap();
        assert_eq!(Number::from_bytes_be(negative, &bytes), n);
        assert_eq!(n.try_to_i64().unwrap(), raw);
    }
}

#[test]
fn digest_round_trip_wider_than_a_word() {
    let mut rng = rand::rng();
    for _ in 0..16 {
        // 24 random bytes is well past the i64 fast path.
        let bytes: Vec<u8> = (0..24).map(|_| rng.random()).collect();
        for negative in [false, true] {
            let n = Number::from_bytes_be(negative, &bytes);
            if n.is_zero() {
                continue;
            }
            assert!(n.try_to_i64().is_err());
            let (neg_out, bytes_out) = n.to_bytes_be().unwrap();
            assert_eq!(neg_out, negative);
            assert_eq!(Number::from_bytes_be(neg_out, &bytes_out), n);
        }
    }
}

#[test]
fn word_boundary_values() {
    for raw in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX - 1, i64::MAX] {
        let n = Number::from(raw);
        assert_eq!(n.try_to_i64().unwrap(), raw);
    }
    // One past the boundary must overflow into the digest path.
    let over = Number::from(i64::MAX) + Number::from(1);
    assert!(over.is_integer());
    assert!(over.try_to_i64().is_err());
    assert!(over.to_bytes_be().is_ok());
}

#[test]
fn conversions_are_strict_across_arms() {
    let int = Number::from(3);
    assert!(matches!(
        int.try_to_f64(),
        Err(ExprError::Unrepresentable { target: "f64" })
    ));
    assert!(int.try_to_complex().is_err());

    let float = Number::from_f64(1.5);
    assert!(float.try_to_i64().is_err());
    assert!(float.to_bytes_be().is_err());
    assert_eq!(float.try_to_f64().unwrap(), 1.5);

    let complex = Number::complex(1.0, -2.0);
    assert!(complex.try_to_f64().is_err());
    assert_eq!(complex.try_to_complex().unwrap(), (1.0, -2.0));
}

#[test]
fn integer_power_is_exact() {
    let n = Number::from(2).checked_pow(&Number::from(64)).unwrap();
    assert!(n.is_integer());
    let (negative, bytes) = n.to_bytes_be().unwrap();
    assert!(!negative);
    assert_eq!(bytes, [1, 0, 0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn negative_exponent_demotes_to_float() {
    let n = Number::from(2).checked_pow(&Number::from(-2)).unwrap();
    assert!(n.is_float());
    assert_eq!(n.try_to_f64().unwrap(), 0.25);
}

#[test]
fn complex_power_has_no_numeric_result() {
    assert!(
        Number::complex(0.0, 1.0)
            .checked_pow(&Number::from(2))
            .is_none()
    );
}

#[test]
fn bitwise_is_integer_only() {
    let a = Number::from(23);
    let b = Number::from(12);
    assert_eq!(a.bit_xor(&b).unwrap(), Number::from(23 ^ 12));
    assert_eq!(a.bit_and(&b).unwrap(), Number::from(23 & 12));
    assert_eq!(a.bit_or(&b).unwrap(), Number::from(23 | 12));
    assert!(a.bit_and(&Number::from_f64(1.0)).is_none());
}

#[test]
fn shifts_are_integer_only() {
    let one = Number::from(1);
    let wide = one.shift_left(&Number::from(70)).unwrap();
    assert!(wide.try_to_i64().is_err());
    assert_eq!(wide.shift_right(&Number::from(70)).unwrap(), one);

    assert_eq!(
        Number::from(23).shift_left(&Number::from(2)).unwrap(),
        Number::from(23 << 2)
    );
    // Arithmetic right shift rounds toward negative infinity.
    assert_eq!(
        Number::from(-5).shift_right(&Number::from(1)).unwrap(),
        Number::from(-3)
    );

    assert!(Number::from_f64(1.0).shift_left(&one).is_none());
    assert!(one.shift_left(&Number::from_f64(2.0)).is_none());
    assert!(one.shift_left(&Number::from(-1)).is_none());
}

#[test]
fn ordering_is_real_only() {
    assert!(Number::from(1) < Number::from(2));
    assert!(Number::from_f64(1.5) < Number::from(2));
    assert!(
        Number::complex(1.0, 1.0)
            .partial_cmp(&Number::from(1))
            .is_none()
    );
}

#[test]
fn complex_arithmetic() {
    let product = Number::complex(1.0, 2.0) * Number::complex(3.0, -1.0);
    assert_eq!(product.try_to_complex().unwrap(), (5.0, 5.0));

    let quotient = Number::complex(1.0, 0.0) / Number::complex(0.0, 1.0);
    assert_eq!(quotient.try_to_complex().unwrap(), (0.0, -1.0));
}
