//! Integration tests for the bet slip.

mod stub_settlement;
mod slip_flow;
