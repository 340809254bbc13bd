//! Mock implementations of system components.
