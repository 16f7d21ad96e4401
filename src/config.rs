//! Generation options.

use alloc::string::ToString;
use core::fmt::{self, Display};
use core::str::FromStr;

use crate::errors::Error;

/// Where the `changed_by` value of a history row comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum UserSource {
    /// The database role running the statement.
    #[default]
    CurrentUser,
    /// The `app.current_user` session setting, falling back to the database
    /// role when it is unset or empty.
    Session,
}

impl UserSource {
    /// The SQL expression evaluated inside a trigger to identify the user.
    #[must_use]
    pub fn expression(self) -> &'static str {
        match self {
            UserSource::CurrentUser => "current_user",
            UserSource::Session => {
                "COALESCE(NULLIF(current_setting('app.current_user', true), ''), current_user)"
            }
        }
    }

    /// The name accepted by [`FromStr`].
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UserSource::CurrentUser => "current_user",
            UserSource::Session => "session",
        }
    }
}

impl Display for UserSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserSource {
    type Err = Error;

    /// Accepts exactly `current_user` or `session`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current_user" => Ok(UserSource::CurrentUser),
            "session" => Ok(UserSource::Session),
            other => Err(Error::InvalidUserSource(other.to_string())),
        }
    }
}

/// Options controlling the generated SQL.
///
/// Small and [`Copy`]: it is passed by value into every generation call.
///
/// # Example
///
/// ```rust
/// use sql_history::{Config, UserSource};
///
/// let config = Config::default()
///     .with_track_user(true)
///     .with_user_source(UserSource::Session);
/// assert!(config.track_user);
/// assert!(!config.point_in_time_examples);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Add a `changed_by` column and fill it from every trigger.
    pub track_user: bool,
    /// Source of the `changed_by` value; ignored unless `track_user` is set.
    pub user_source: UserSource,
    /// Append commented point-in-time query templates after each table.
    pub point_in_time_examples: bool,
}

impl Config {
    /// Enable or disable user tracking.
    #[must_use]
    pub fn with_track_user(mut self, track_user: bool) -> Self {
        self.track_user = track_user;
        self
    }

    /// Select the user source.
    #[must_use]
    pub fn with_user_source(mut self, user_source: UserSource) -> Self {
        self.user_source = user_source;
        self
    }

    /// Enable or disable the point-in-time query templates.
    #[must_use]
    pub fn with_point_in_time_examples(mut self, enabled: bool) -> Self {
        self.point_in_time_examples = enabled;
        self
    }

    /// The user expression to write into `changed_by`, if tracking is on.
    #[must_use]
    pub fn user_expression(self) -> Option<&'static str> {
        self.track_user.then(|| self.user_source.expression())
    }
}
