//! Registry contract tests, run against every implementation
