//! Tests for the connection registry
