//! Adapters between the embedded script runtimes and the host [`Value`] model.
//!
//! Each runtime gets its own module exposing `to_value` (runtime → host) and
//! `from_value` (host → runtime). Runtime-native types stay inside these
//! modules; everything past them speaks [`Value`].
//!
//! | host       | Starlark                | Lua                       |
//! |------------|-------------------------|---------------------------|
//! | `String`   | `str`                   | string (valid UTF-8)      |
//! | `Bool`     | `bool`                  | boolean                   |
//! | `Int`      | `int` (arbitrary size)  | never produced            |
//! | `Float`    | `float`                 | every number              |
//! | `Bytes`    | `str` (lossy)           | string (invalid UTF-8)    |
//! | `List`     | `list`, `tuple`         | table with keys `1..n`    |
//! | `Map`      | `dict`                  | any other table           |
//!
//! [`Value`]: crate::value::Value

pub mod lua;
pub mod starlark;
