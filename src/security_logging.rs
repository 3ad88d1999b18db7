//! Security event logging policy read from the environment.
//!
//! - `ROS_SECURITY_LOG_FILE`: file the builtin logging plugin writes to
//! - `ROS_SECURITY_LOG_PUBLISH`: `true` or `false`, whether events are
//!   published on the log topic
//! - `ROS_SECURITY_LOG_VERBOSITY`: `FATAL`, `ERROR`, `WARN`, `INFO` or
//!   `DEBUG`, case-insensitive
//!
//! Setting any of them enables the builtin logging plugin.

use std::{env, env::VarError, fmt, str::FromStr};

use tracing::debug;

use crate::error::ConfigError;

pub const ENV_LOG_FILE: &str = "ROS_SECURITY_LOG_FILE";
pub const ENV_LOG_PUBLISH: &str = "ROS_SECURITY_LOG_PUBLISH";
pub const ENV_LOG_VERBOSITY: &str = "ROS_SECURITY_LOG_VERBOSITY";

pub const PROPERTY_LOG_PLUGIN: &str = "dds.sec.log.plugin";
pub const PROPERTY_LOG_FILE: &str = "dds.sec.log.builtin.DDS_LogTopic.log_file";
pub const PROPERTY_LOG_PUBLISH: &str = "dds.sec.log.builtin.DDS_LogTopic.distribute";
pub const PROPERTY_LOG_VERBOSITY: &str = "dds.sec.log.builtin.DDS_LogTopic.logging_level";

pub const BUILTIN_LOG_PLUGIN: &str = "builtin.DDS_LogTopic";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LogVerbosity {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogVerbosity {
    /// Value of the `logging_level` property.
    pub fn property_value(self) -> &'static str {
        match self {
            LogVerbosity::Fatal => "EMERGENCY_LEVEL",
            LogVerbosity::Error => "ERROR_LEVEL",
            LogVerbosity::Warn => "WARNING_LEVEL",
            LogVerbosity::Info => "INFORMATIONAL_LEVEL",
            LogVerbosity::Debug => "DEBUG_LEVEL",
        }
    }
}

impl FromStr for LogVerbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FATAL" => Ok(LogVerbosity::Fatal),
            "ERROR" => Ok(LogVerbosity::Error),
            "WARN" => Ok(LogVerbosity::Warn),
            "INFO" => Ok(LogVerbosity::Info),
            "DEBUG" => Ok(LogVerbosity::Debug),
            _ => Err(ConfigError::InvalidValue {
                var: ENV_LOG_VERBOSITY,
                value: s.to_owned(),
                expected: "FATAL, ERROR, WARN, INFO, or DEBUG",
            }),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered name/value properties handed to the transport's security plugins.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PropertyPolicy {
    properties: Vec<Property>,
}

impl PropertyPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// Replaces the value of an existing property or appends a new one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let property = Property::new(name, value);
        match self.properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.value = property.value,
            None => self.properties.push(property),
        }
    }

    pub fn merge(&mut self, properties: impl IntoIterator<Item = Property>) {
        for p in properties {
            self.set(p.name, p.value);
        }
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Display for PropertyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for p in &self.properties {
            writeln!(f, "{}={}", p.name, p.value)?;
        }
        Ok(())
    }
}

/// Security logging settings parsed from the environment.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SecurityLoggingConfig {
    pub log_file: Option<String>,
    pub publish: Option<bool>,
    pub verbosity: Option<LogVerbosity>,
}

impl SecurityLoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name))
    }

    /// Reads the settings through `lookup`, which behaves like `env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let log_file = read_var(&lookup, ENV_LOG_FILE)?;
        let publish = read_var(&lookup, ENV_LOG_PUBLISH)?
            .map(|value| match value.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    var: ENV_LOG_PUBLISH,
                    value,
                    expected: "'true' or 'false'",
                }),
            })
            .transpose()?;
        let verbosity = read_var(&lookup, ENV_LOG_VERBOSITY)?
            .map(|value| value.parse::<LogVerbosity>())
            .transpose()?;

        Ok(Self {
            log_file,
            publish,
            verbosity,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.log_file.is_some() || self.publish.is_some() || self.verbosity.is_some()
    }

    /// Properties to merge into a participant's policy. Empty when nothing
    /// is configured.
    pub fn to_properties(&self) -> Vec<Property> {
        let mut properties = Vec::new();
        if let Some(file) = &self.log_file {
            properties.push(Property::new(PROPERTY_LOG_FILE, file.as_str()));
        }
        if let Some(publish) = self.publish {
            properties.push(Property::new(PROPERTY_LOG_PUBLISH, publish.to_string()));
        }
        if let Some(verbosity) = self.verbosity {
            properties.push(Property::new(
                PROPERTY_LOG_VERBOSITY,
                verbosity.property_value(),
            ));
        }
        if !properties.is_empty() {
            properties.push(Property::new(PROPERTY_LOG_PLUGIN, BUILTIN_LOG_PLUGIN));
        }
        properties
    }
}

fn read_var<F>(lookup: &F, var: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    match lookup(var) {
        Ok(value) if value.is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvAccess { var, source }),
    }
}

/// Applies the security logging settings from the process environment to
/// `policy`.
pub fn apply_security_logging_configuration(policy: &mut PropertyPolicy) -> Result<(), ConfigError> {
    apply_security_logging_configuration_with(policy, |name| env::var(name))
}

/// Like [`apply_security_logging_configuration`], reading variables through
/// `lookup`. `policy` is left untouched when any variable is invalid.
pub fn apply_security_logging_configuration_with<F>(
    policy: &mut PropertyPolicy,
    lookup: F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let config = SecurityLoggingConfig::from_lookup(lookup)?;
    let properties = config.to_properties();
    if !properties.is_empty() {
        debug!(count = properties.len(), "applying security logging properties");
    }
    policy.merge(properties);
    Ok(())
}
