// Copyright (c) The difftest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::get_num_cpus;
use crate::errors::TestThreadsParseError;
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// The number of test cases to run simultaneously.
///
/// Each test case runs both pipelines one after the other, so this bounds the number of external
/// processes alive at any one time to roughly twice this value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TestThreads {
    /// A fixed number of test cases.
    Count(usize),

    /// As many test cases as there are logical CPUs.
    NumCpus,
}

impl TestThreads {
    /// Resolves this value into an actual count.
    pub fn compute(self) -> usize {
        match self {
            Self::Count(threads) => threads,
            Self::NumCpus => get_num_cpus(),
        }
    }

    /// A negative count is subtracted from the number of CPUs, but never goes below 1.
    fn from_signed(n: i64) -> Option<Self> {
        match n {
            0 => None,
            n if n < 0 => Some(Self::Count((get_num_cpus() as i64 + n).max(1) as usize)),
            n => Some(Self::Count(n as usize)),
        }
    }
}

impl FromStr for TestThreads {
    type Err = TestThreadsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "num-cpus" {
            return Ok(Self::NumCpus);
        }

        let n = s
            .parse::<i64>()
            .map_err(|e| TestThreadsParseError::new(format!("{s} ({e})")))?;
        Self::from_signed(n).ok_or_else(|| TestThreadsParseError::new("0 (must not be zero)"))
    }
}

impl fmt::Display for TestThreads {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(threads) => write!(f, "{threads}"),
            Self::NumCpus => write!(f, "num-cpus"),
        }
    }
}

impl<'de> Deserialize<'de> for TestThreads {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = TestThreads;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a non-zero integer or the string \"num-cpus\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v == "num-cpus" {
                    Ok(TestThreads::NumCpus)
                } else {
                    Err(serde::de::Error::invalid_value(
                        serde::de::Unexpected::Str(v),
                        &self,
                    ))
                }
            }

            // TOML integers are i64.
            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                TestThreads::from_signed(v).ok_or_else(|| {
                    serde::de::Error::invalid_value(serde::de::Unexpected::Signed(v), &self)
                })
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let signed = i64::try_from(v).map_err(|_| {
                    serde::de::Error::invalid_value(serde::de::Unexpected::Unsigned(v), &self)
                })?;
                self.visit_i64(signed)
            }
        }

        deserializer.deserialize_any(V)
    }
}
