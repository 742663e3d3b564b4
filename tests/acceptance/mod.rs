//! End-to-end behaviour of the clock workspace.

mod clock_properties_test;
mod command_flow_test;
mod common;
