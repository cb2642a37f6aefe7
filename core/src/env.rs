// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Access to service configuration stored in environment variables.
//!
//! Services read all of their settings from variables named `<prefix>_<suffix>`, where the prefix
//! is chosen by `main` and the suffix identifies the setting.  Values are parsed with `FromStr`.

use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Result type for configuration errors, which are always fatal and only need a message.
type Result<T> = std::result::Result<T, String>;

/// Reads the raw variable `name`, treating an unset variable as `None`.
fn read_var(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(format!("Environment variable {} does not contain valid UTF-8", name))
        }
    }
}

/// Reads and parses the variable `<prefix>_<suffix>`.
fn parse_var<T>(prefix: &str, suffix: &str) -> Result<(String, Option<T>)>
where
    T: FromStr,
    T::Err: Display,
{
    let name = format!("{}_{}", prefix, suffix);
    let value = match read_var(&name)? {
        Some(raw) => match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                return Err(format!("Bad value '{}' in environment variable {}: {}", raw, name, e));
            }
        },
        None => None,
    };
    Ok((name, value))
}

/// Gets the required setting `<prefix>_<suffix>` as a `T`.
pub fn get_required_var<T>(prefix: &str, suffix: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match parse_var(prefix, suffix)? {
        (_, Some(value)) => Ok(value),
        (name, None) => Err(format!("Required environment variable {} is not set", name)),
    }
}

/// Gets the optional setting `<prefix>_<suffix>` as a `T`.
///
/// A variable that is set but cannot be parsed is an error, not a missing value.
pub fn get_optional_var<T>(prefix: &str, suffix: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    parse_var(prefix, suffix).map(|(_, value)| value)
}
