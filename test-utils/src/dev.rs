// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Test logging setup.

pub use dropshot::test_util::LogContext;
use dropshot::{ConfigLogging, ConfigLoggingIfExists, ConfigLoggingLevel};

/// Set up a [`dropshot::test_util::LogContext`] appropriate for a test
/// named `test_name`
///
/// The logfile is placed in a temporary directory and removed by
/// `LogContext::cleanup_successful`, so a failing test leaves its log
/// behind for inspection.
pub fn test_setup_log(test_name: &str) -> LogContext {
    let log_config = ConfigLogging::File {
        level: ConfigLoggingLevel::Trace,
        path: "UNUSED".into(),
        if_exists: ConfigLoggingIfExists::Fail,
    };

    LogContext::new(test_name, &log_config)
}
