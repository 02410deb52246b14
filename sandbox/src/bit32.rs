//! `bit32` library for guests.
//!
//! Lua 5.4 replaced `bit32` with native operators, but mods written against
//! it still expect the table. Operands are reduced modulo 2^32 and results
//! are unsigned 32-bit integers.

use mlua::{Lua, Table, Variadic};

const ALL_ONES: u32 = u32::MAX;

fn to_u32(n: f64) -> u32 {
    (n.floor() as i64) as u32
}

fn shift_left(x: u32, disp: i64) -> u32 {
    let disp = disp.clamp(-64, 64);
    if disp < 0 {
        shift_right(x, -disp)
    } else if disp >= 32 {
        0
    } else {
        x << disp
    }
}

fn shift_right(x: u32, disp: i64) -> u32 {
    let disp = disp.clamp(-64, 64);
    if disp < 0 {
        shift_left(x, -disp)
    } else if disp >= 32 {
        0
    } else {
        x >> disp
    }
}

fn arith_shift(x: u32, disp: i64) -> u32 {
    if disp < 0 || x & 0x8000_0000 == 0 {
        return shift_right(x, disp);
    }
    if disp >= 32 {
        ALL_ONES
    } else {
        ((x as i32) >> disp) as u32
    }
}

// Range checks run on the floats so huge or NaN inputs never reach an
// integer conversion.
fn field_args(field: f64, width: Option<f64>) -> mlua::Result<(u32, u32)> {
    let field = field.floor();
    let width = width.map_or(1.0, f64::floor);
    if !(field >= 0.0) {
        return Err(mlua::Error::runtime("field cannot be negative"));
    }
    if !(width > 0.0) {
        return Err(mlua::Error::runtime("width must be positive"));
    }
    if field + width > 32.0 {
        return Err(mlua::Error::runtime("trying to access non-existent bits"));
    }
    Ok((field as u32, width as u32))
}

fn mask(width: u32) -> u32 {
    if width >= 32 {
        ALL_ONES
    } else {
        (1u32 << width) - 1
    }
}

/// Build the `bit32` table.
pub fn create_bit32_table(lua: &Lua) -> mlua::Result<Table> {
    let t = lua.create_table()?;

    t.set(
        "band",
        lua.create_function(|_, args: Variadic<f64>| {
            Ok(args.iter().fold(ALL_ONES, |acc, &n| acc & to_u32(n)))
        })?,
    )?;
    t.set(
        "bor",
        lua.create_function(|_, args: Variadic<f64>| {
            Ok(args.iter().fold(0, |acc, &n| acc | to_u32(n)))
        })?,
    )?;
    t.set(
        "bxor",
        lua.create_function(|_, args: Variadic<f64>| {
            Ok(args.iter().fold(0, |acc, &n| acc ^ to_u32(n)))
        })?,
    )?;
    t.set(
        "btest",
        lua.create_function(|_, args: Variadic<f64>| {
            Ok(args.iter().fold(ALL_ONES, |acc, &n| acc & to_u32(n)) != 0)
        })?,
    )?;
    t.set(
        "bnot",
        lua.create_function(|_, x: f64| Ok(!to_u32(x)))?,
    )?;
    t.set(
        "lshift",
        lua.create_function(|_, (x, disp): (f64, i64)| Ok(shift_left(to_u32(x), disp)))?,
    )?;
    t.set(
        "rshift",
        lua.create_function(|_, (x, disp): (f64, i64)| Ok(shift_right(to_u32(x), disp)))?,
    )?;
    t.set(
        "arshift",
        lua.create_function(|_, (x, disp): (f64, i64)| Ok(arith_shift(to_u32(x), disp)))?,
    )?;
    t.set(
        "lrotate",
        lua.create_function(|_, (x, disp): (f64, i64)| {
            Ok(to_u32(x).rotate_left(disp.rem_euclid(32) as u32))
        })?,
    )?;
    t.set(
        "rrotate",
        lua.create_function(|_, (x, disp): (f64, i64)| {
            Ok(to_u32(x).rotate_right(disp.rem_euclid(32) as u32))
        })?,
    )?;
    t.set(
        "extract",
        lua.create_function(|_, (n, field, width): (f64, f64, Option<f64>)| {
            let (field, width) = field_args(field, width)?;
            Ok((to_u32(n) >> field) & mask(width))
        })?,
    )?;
    t.set(
        "replace",
        lua.create_function(
            |_, (n, v, field, width): (f64, f64, f64, Option<f64>)| {
                let (field, width) = field_args(field, width)?;
                let m = mask(width);
                let n = to_u32(n) & !(m << field);
                Ok(n | ((to_u32(v) & m) << field))
            },
        )?,
    )?;

    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lua_with_bit32() -> Lua {
        let lua = Lua::new();
        let t = create_bit32_table(&lua).unwrap();
        lua.globals().set("bit32", t).unwrap();
        lua
    }

    fn eval_u(lua: &Lua, src: &str) -> i64 {
        lua.load(src).eval().unwrap()
    }

    #[test]
    fn test_logic_ops() {
        let lua = lua_with_bit32();
        assert_eq!(eval_u(&lua, "return bit32.band(0xF0, 0x3C)"), 0x30);
        assert_eq!(eval_u(&lua, "return bit32.bor(0xF0, 0x0F)"), 0xFF);
        assert_eq!(eval_u(&lua, "return bit32.bxor(0xFF, 0x0F)"), 0xF0);
        assert_eq!(eval_u(&lua, "return bit32.band()"), 0xFFFF_FFFF);
        assert_eq!(eval_u(&lua, "return bit32.bnot(0)"), 0xFFFF_FFFF);
        assert_eq!(eval_u(&lua, "return bit32.bnot(-1)"), 0);
        let t: bool = lua.load("return bit32.btest(6, 2)").eval().unwrap();
        assert!(t);
    }

    #[test]
    fn test_shifts() {
        let lua = lua_with_bit32();
        assert_eq!(eval_u(&lua, "return bit32.lshift(1, 4)"), 16);
        assert_eq!(eval_u(&lua, "return bit32.lshift(1, 32)"), 0);
        assert_eq!(eval_u(&lua, "return bit32.rshift(16, 4)"), 1);
        assert_eq!(eval_u(&lua, "return bit32.rshift(1, -4)"), 16);
        assert_eq!(eval_u(&lua, "return bit32.arshift(0x80000000, 4)"), 0xF800_0000);
        assert_eq!(eval_u(&lua, "return bit32.arshift(0x80000000, 40)"), 0xFFFF_FFFF);
        assert_eq!(eval_u(&lua, "return bit32.arshift(0x40, 4)"), 4);
        assert_eq!(eval_u(&lua, "return bit32.lrotate(0x80000001, 1)"), 3);
        assert_eq!(eval_u(&lua, "return bit32.rrotate(3, 1)"), 0x8000_0001);
    }

    #[test]
    fn test_fields() {
        let lua = lua_with_bit32();
        assert_eq!(eval_u(&lua, "return bit32.extract(0xABCD, 4, 8)"), 0xBC);
        assert_eq!(eval_u(&lua, "return bit32.extract(5, 2)"), 1);
        assert_eq!(eval_u(&lua, "return bit32.replace(0xABCD, 0x12, 4, 8)"), 0xA12D);
        assert!(lua.load("return bit32.extract(1, 30, 4)").exec().is_err());
        assert!(lua.load("return bit32.extract(1, -1)").exec().is_err());
    }

    #[test]
    fn test_extreme_displacements() {
        let lua = lua_with_bit32();
        assert_eq!(eval_u(&lua, "return bit32.lshift(1, math.mininteger)"), 0);
        assert_eq!(eval_u(&lua, "return bit32.rshift(1, math.mininteger)"), 0);
        assert_eq!(eval_u(&lua, "return bit32.lshift(1, math.maxinteger)"), 0);
        assert_eq!(eval_u(&lua, "return bit32.rshift(0x80000000, math.maxinteger)"), 0);
        assert_eq!(eval_u(&lua, "return bit32.arshift(0x80000000, math.mininteger)"), 0);
        assert_eq!(eval_u(&lua, "return bit32.arshift(0x80000000, math.maxinteger)"), 0xFFFF_FFFF);
    }

    #[test]
    fn test_extreme_fields_are_guest_errors() {
        let lua = lua_with_bit32();
        for src in [
            "return bit32.extract(1, 1, 2^63)",
            "return bit32.extract(1, 2^63)",
            "return bit32.extract(1, 0/0)",
            "return bit32.extract(1, 0, 0/0)",
            "return bit32.replace(1, 1, 1, 2^63)",
        ] {
            let err = lua.load(src).exec().unwrap_err().to_string();
            assert!(!err.contains("stack overflow"), "{src}: {err}");
        }
    }
}
