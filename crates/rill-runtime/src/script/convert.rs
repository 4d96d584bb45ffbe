//! Type conversions between Lua and JSON values.
//!
//! Produced elements and widget values cross the host boundary as
//! `serde_json::Value`, so scripts can emit arbitrary structured data
//! without the host knowing its shape.

use mlua::{Lua, Result as LuaResult, Value};

/// Converts a JSON value into a Lua value.
pub fn json_to_lua(lua: &Lua, value: &serde_json::Value) -> LuaResult<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Nil),
        serde_json::Value::Bool(b) => Ok(Value::Boolean(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Integer(i))
            } else {
                // Lossy for u64 above i64::MAX; acceptable for widget values.
                Ok(Value::Number(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_json::Value::String(s) => Ok(Value::String(lua.create_string(s)?)),
        serde_json::Value::Array(arr) => {
            let table = lua.create_table_with_capacity(arr.len(), 0)?;
            for (i, item) in arr.iter().enumerate() {
                table.raw_set(i + 1, json_to_lua(lua, item)?)?;
            }
            Ok(Value::Table(table))
        }
        serde_json::Value::Object(obj) => {
            let table = lua.create_table_with_capacity(0, obj.len())?;
            for (k, v) in obj {
                table.raw_set(k.as_str(), json_to_lua(lua, v)?)?;
            }
            Ok(Value::Table(table))
        }
    }
}

/// Converts a Lua value into JSON.
///
/// Tables with a positive raw length become arrays; other tables
/// become objects with string keys. Functions, userdata, and other
/// non-data values are rejected.
pub fn lua_to_json(value: Value) -> Result<serde_json::Value, mlua::Error> {
    match value {
        Value::Nil => Ok(serde_json::Value::Null),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(b)),
        Value::Integer(i) => Ok(serde_json::Value::Number(i.into())),
        Value::Number(n) => serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| mlua::Error::runtime("number is not finite")),
        Value::String(s) => Ok(serde_json::Value::String(s.to_str()?.to_string())),
        Value::Table(table) => {
            let len = table.raw_len();
            if len > 0 {
                let mut arr = Vec::with_capacity(len);
                for i in 1..=len {
                    let v: Value = table.raw_get(i)?;
                    arr.push(lua_to_json(v)?);
                }
                Ok(serde_json::Value::Array(arr))
            } else {
                let mut map = serde_json::Map::new();
                for pair in table.pairs::<String, Value>() {
                    let (k, v) = pair?;
                    map.insert(k, lua_to_json(v)?);
                }
                Ok(serde_json::Value::Object(map))
            }
        }
        other => Err(mlua::Error::runtime(format!(
            "unsupported type: {}",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let lua = Lua::new();
        for json in [
            serde_json::json!(null),
            serde_json::json!(true),
            serde_json::json!(42),
            serde_json::json!(2.5),
            serde_json::json!("hello"),
        ] {
            let lua_val = json_to_lua(&lua, &json).unwrap();
            assert_eq!(lua_to_json(lua_val).unwrap(), json);
        }
    }

    #[test]
    fn array_roundtrip() {
        let lua = Lua::new();
        let json = serde_json::json!([1, "two", [3]]);
        let lua_val = json_to_lua(&lua, &json).unwrap();
        assert_eq!(lua_to_json(lua_val).unwrap(), json);
    }

    #[test]
    fn object_roundtrip() {
        let lua = Lua::new();
        let json = serde_json::json!({"a": 1, "b": {"c": true}});
        let lua_val = json_to_lua(&lua, &json).unwrap();
        assert_eq!(lua_to_json(lua_val).unwrap(), json);
    }

    #[test]
    fn function_rejected() {
        let lua = Lua::new();
        let f: Value = lua.load("return function() end").eval().unwrap();
        let err = lua_to_json(f).unwrap_err();
        assert!(err.to_string().contains("unsupported type"));
    }

    #[test]
    fn non_finite_number_rejected() {
        let lua = Lua::new();
        for expr in ["return 0/0", "return 1/0", "return -1/0"] {
            let n: Value = lua.load(expr).eval().unwrap();
            let err = lua_to_json(n).unwrap_err();
            assert!(err.to_string().contains("not finite"), "{expr}: {err}");
        }
    }

    #[test]
    fn empty_table_is_object() {
        let lua = Lua::new();
        let t: Value = lua.load("return {}").eval().unwrap();
        assert_eq!(lua_to_json(t).unwrap(), serde_json::json!({}));
    }
}
