//! Workspace-level integration tests for `bucket-arena`; see `tests/`.
