//! `math.hash_random`: reproducible variation without RNG state.
//!
//! The seed's bytes (UTF-8 for strings, the little-endian IEEE-754 binary64
//! pattern for numbers) go through lookup3 `hashlittle2`; the two output
//! words are combined into a 53-bit mantissa giving `0 <= x < 1`. Ranged
//! forms map `x` onto an inclusive integer interval. Nothing global is
//! consulted, so the same seed always yields the same value.

use mlua::{Lua, MultiValue, Value};
use scripthost_hostapi::lookup3::hashlittle2;

/// Hash words used when no seed (or `nil`) is given.
pub const NIL_SEED_HASH: (u32, u32) = (0xBF42_B131, 0x2A40_F7F2);

const TWO_POW_26: f64 = 67_108_864.0;
const TWO_POW_53: f64 = 9_007_199_254_740_992.0;

/// A `hash_random` seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seed<'a> {
    Nil,
    Bytes(&'a [u8]),
    Number(f64),
}

/// Hash a seed into its two 32-bit words `(A, B)`.
pub fn seed_hash(seed: Seed<'_>) -> (u32, u32) {
    match seed {
        Seed::Nil => NIL_SEED_HASH,
        Seed::Bytes(bytes) => hashlittle2(bytes, 0, 0),
        Seed::Number(n) => hashlittle2(&n.to_le_bytes(), 0, 0),
    }
}

/// `x = ((A >> 5) * 2^26 + (B >> 6)) / 2^53`, so `0 <= x < 1`.
pub fn unit_value(hash_a: u32, hash_b: u32) -> f64 {
    let x = f64::from(hash_a >> 5) * TWO_POW_26 + f64::from(hash_b >> 6);
    x * (1.0 / TWO_POW_53)
}

/// Map `x` in `[0, 1)` onto the inclusive range `[m, n]`.
///
/// The sum is taken in `i128` and clamped, since the `f64` span rounds at
/// the `i64` extremes.
pub fn in_range(x: f64, m: i64, n: i64) -> i64 {
    let span = n as f64 - m as f64 + 1.0;
    let value = i128::from(m) + (x * span).floor() as i128;
    let (lo, hi) = (i128::from(m.min(n)), i128::from(m.max(n)));
    value.clamp(lo, hi) as i64
}

/// Unit value for a seed.
pub fn hash_value(seed: Seed<'_>) -> f64 {
    let (a, b) = seed_hash(seed);
    unit_value(a, b)
}

fn range_arg(lua: &Lua, value: Value, position: usize) -> mlua::Result<i64> {
    match value {
        Value::Integer(i) => Ok(i),
        other => match lua.coerce_number(other)? {
            Some(n) if n.is_finite() => Ok(n.trunc() as i64),
            _ => Err(mlua::Error::runtime(format!(
                "bad argument #{position} to 'hash_random' (number expected)"
            ))),
        },
    }
}

/// Guest entry point: `hash_random([seed [, m], n])`.
pub fn hash_random(lua: &Lua, args: MultiValue) -> mlua::Result<Value> {
    if args.len() > 3 {
        return Err(mlua::Error::runtime("unknown argument to hash_random"));
    }
    let mut args = args.into_iter();

    let x = match args.next().unwrap_or(Value::Nil) {
        Value::Nil => hash_value(Seed::Nil),
        Value::String(s) => hash_value(Seed::Bytes(&s.as_bytes())),
        Value::Integer(i) => hash_value(Seed::Number(i as f64)),
        Value::Number(n) => {
            if n.is_nan() {
                return Err(mlua::Error::runtime("hash_random: seed must not be NaN"));
            }
            hash_value(Seed::Number(n))
        }
        _ => {
            return Err(mlua::Error::runtime(
                "expected a string or a number for argument 1",
            ))
        }
    };

    let rest: Vec<Value> = args.collect();
    match rest.len() {
        0 => Ok(Value::Number(x)),
        1 => {
            let n = range_arg(lua, rest[0].clone(), 2)?;
            Ok(Value::Integer(in_range(x, 1, n)))
        }
        _ => {
            let m = range_arg(lua, rest[0].clone(), 2)?;
            let n = range_arg(lua, rest[1].clone(), 3)?;
            Ok(Value::Integer(in_range(x, m, n)))
        }
    }
}
